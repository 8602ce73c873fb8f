pub mod error;
pub mod events;
pub mod id;
pub mod identity;
pub mod property;

// Re-export the main types for convenience
pub use error::LedgerError;
pub use events::LedgerEvent;
pub use id::{AccountKey, RequestId, Timestamp};
pub use identity::{IdentityRecord, NameResolver, Role};
pub use property::{PropertyRequest, PropertySubmission, RequestStatus, SaleStatus};
