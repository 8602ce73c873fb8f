pub mod clock;
pub mod config;
pub mod ledger;
pub mod treasury;

// Re-export the main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AccessSecrets, LedgerConfig};
pub use ledger::Ledger;
pub use treasury::Treasury;
