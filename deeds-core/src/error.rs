use std::io;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the DEEDS ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The caller's role does not permit the attempted operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The operation is not permitted from the request's current status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The attached payment does not equal the required exact amount
    #[error("Insufficient payment: required {required}, got {provided}")]
    InsufficientPayment { required: u64, provided: u64 },

    /// The caller's key already has an identity record
    #[error("Key already registered")]
    AlreadyRegistered,

    /// The caller's key has no identity record
    #[error("Key not registered")]
    NotRegistered,

    /// A marketplace operation was attempted by a non-owner
    #[error("Caller is not the owner of {0}")]
    NotOwner(String),

    /// A marketplace operation was attempted on a record that is not minted
    #[error("Request {0} is not minted")]
    NotMinted(String),

    /// The record is not listed for sale
    #[error("Request {0} is not for sale")]
    NotForSale(String),

    /// The record is not listed for lease
    #[error("Request {0} is not for lease")]
    NotForLease(String),

    /// A lease attempt while an active lease exists
    #[error("Request {0} has an active lease")]
    AlreadyLeased(String),

    /// A privileged registration without the correct out-of-band credential
    #[error("Invalid access secret for role {0}")]
    InvalidAccessSecret(String),

    /// A second non-rejected request by the same submitter for the same parcel
    #[error("Duplicate request for parcel: {0}")]
    DuplicateRequest(String),

    /// Errors related to missing or invalid data
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO errors that occur when reading/writing journal files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Errors that occur during event journal operations
    #[error("Journal error: {0}")]
    Journal(String),

    /// Generic errors that don't fit in other categories
    #[error("Other error: {0}")]
    Other(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

// Additional From conversions for common error types

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<String> for LedgerError {
    fn from(err: String) -> Self {
        LedgerError::Other(err)
    }
}

impl From<&str> for LedgerError {
    fn from(err: &str) -> Self {
        LedgerError::Other(err.to_string())
    }
}
