use crate::id::{AccountKey, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The role bound to an authentication key at registration
///
/// Roles are set exactly once and are immutable thereafter. Every guard in
/// the ledger matches on this enum exhaustively so an unrecognized role can
/// never fall through a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// No role assigned (unregistered keys resolve to this)
    Unset,
    /// Ordinary registered user: may submit requests, buy, and rent
    User,
    /// Government officer: verifies parcels and may reject requests
    GovtOfficer,
    /// Licensed surveyor: completes the survey step
    Surveyor,
    /// Registrar: mints approved requests and may reject
    Registrar,
    /// Platform administrator: may withdraw treasury funds
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Unset
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Unset => "unset",
            Role::User => "user",
            Role::GovtOfficer => "govt_officer",
            Role::Surveyor => "surveyor",
            Role::Registrar => "registrar",
            Role::Admin => "admin",
        };
        write!(f, "{}", name)
    }
}

impl Role {
    /// Whether registering under this role requires an out-of-band access secret
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::GovtOfficer | Role::Surveyor | Role::Registrar)
    }

    /// Whether this role may reject a pending request
    pub fn may_reject(&self) -> bool {
        matches!(self, Role::Registrar | Role::GovtOfficer)
    }
}

/// Identity record bound to an authentication key
///
/// One record per key, written once at registration and never updated or
/// deleted. `name` and `email` are display fields only and are never used
/// for authorization decisions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityRecord {
    /// The authentication key this record is bound to
    pub key: AccountKey,

    /// Display name
    pub name: String,

    /// Display email
    pub email: String,

    /// The role granted at registration, immutable
    pub role: Role,

    /// Opaque hash linking to the holder's off-chain legal identity
    pub identity_proof: String,

    /// When this record was created
    pub registered_at: Timestamp,
}

impl IdentityRecord {
    pub fn new(
        key: AccountKey,
        name: String,
        email: String,
        role: Role,
        identity_proof: String,
        registered_at: Timestamp,
    ) -> Self {
        Self {
            key,
            name,
            email,
            role,
            identity_proof,
            registered_at,
        }
    }
}

/// Resolves account keys to display names for read-side projections
///
/// Implemented by the ledger's identity registry; the history projection
/// consumes it without depending on the ledger itself.
pub trait NameResolver {
    /// Get the display name bound to a key, if the key is registered
    fn display_name(&self, key: &AccountKey) -> Option<String>;
}

impl NameResolver for std::collections::HashMap<AccountKey, String> {
    fn display_name(&self, key: &AccountKey) -> Option<String> {
        self.get(key).cloned()
    }
}
