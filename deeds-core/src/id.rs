use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

/// Unix timestamp in seconds, as recorded by the ledger clock.
pub type Timestamp = u64;

// AccountKey identifies an authenticated caller of the ledger.
// It is a 32 byte long unique identifier, resembling a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKey([u8; 32]);

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as a hex string with a prefix of the first 6 bytes
        let prefix = hex::encode(&self.0[0..6]);
        write!(f, "acct:{}", prefix)
    }
}

impl Ord for AccountKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for AccountKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for AccountKey {
    fn default() -> Self {
        AccountKey([0; 32])
    }
}

impl Deref for AccountKey {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AccountKey {
    pub fn new(key: [u8; 32]) -> Self {
        AccountKey(key)
    }

    /// Create an AccountKey from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        AccountKey(bytes)
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// The zero/system key. Never owned by a caller.
    pub fn zero() -> Self {
        AccountKey([0; 32])
    }

    /// Check whether this is the zero/system key
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Derive an AccountKey deterministically from seed material
    pub fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"DEEDS_Account");

        for seed in seeds {
            hasher.update(seed);
        }

        AccountKey(hasher.finalize().into())
    }

    /// Create a unique AccountKey for testing
    pub fn unique_key_for_tests() -> Self {
        // Use current timestamp as basis for uniqueness
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("Time went backwards")
            .as_nanos()
            .to_le_bytes();

        Self::derive(&[timestamp.as_slice(), &[1, 2, 3, 4]])
    }
}

// RequestId identifies a property request in the ledger. Identifiers are
// assigned from a monotonically increasing sequence and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

impl RequestId {
    pub fn new(id: u64) -> Self {
        RequestId(id)
    }

    /// Get the raw numeric value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The identifier that follows this one in the sequence
    pub fn next(&self) -> Self {
        RequestId(self.0 + 1)
    }
}
