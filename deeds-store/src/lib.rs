pub mod journal;

// Re-export the main types for convenience
pub use journal::{EventJournal, FileEventJournal, MemoryEventJournal};
