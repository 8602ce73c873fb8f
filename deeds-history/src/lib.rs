pub mod projection;

// Re-export the main types for convenience
pub use projection::{
    fold_events, replay_journal, HistoryEntry, HistoryKind, HistoryProjection, PropertyHistory,
    UNKNOWN_PARTY,
};
