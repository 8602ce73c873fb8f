use deeds_core::error::LedgerError;
use deeds_core::events::LedgerEvent;
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Append-only journal of ledger events
///
/// The journal is the durable audit trail: the ledger appends every event
/// it emits, and the history projection rebuilds itself by iterating the
/// journal from the beginning.
pub trait EventJournal: Send + Sync {
    /// Append an event to the journal
    fn append(&self, event: &LedgerEvent) -> Result<(), LedgerError>;

    /// Get an iterator over all journaled events, oldest first
    fn iter_events(&self) -> Box<dyn Iterator<Item = Result<LedgerEvent, LedgerError>> + '_>;
}

/// A basic file-based journal implementation
///
/// Events are written as length-prefixed bincode records and flushed on
/// every append, so a replay after a crash sees every committed event.
pub struct FileEventJournal {
    /// Path to the journal file
    path: Arc<Mutex<PathBuf>>,

    /// File handle for writing
    file: Arc<Mutex<Option<BufWriter<File>>>>,
}

impl FileEventJournal {
    /// Create a new file-based journal
    pub fn new() -> Self {
        Self {
            path: Arc::new(Mutex::new(PathBuf::new())),
            file: Arc::new(Mutex::new(None)),
        }
    }

    /// Initialize the journal, creating or opening the file at `path`
    pub fn init(&self, path: &Path) -> Result<(), LedgerError> {
        let mut file_guard = self
            .file
            .lock()
            .map_err(|e| LedgerError::Journal(format!("Failed to acquire lock: {}", e)))?;

        // Create or open the journal file
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .map_err(|e| LedgerError::Journal(format!("Failed to open journal file: {}", e)))?;

        *file_guard = Some(BufWriter::new(file));

        let mut path_guard = self
            .path
            .lock()
            .map_err(|e| LedgerError::Journal(format!("Failed to acquire path lock: {}", e)))?;
        *path_guard = path.to_path_buf();

        Ok(())
    }

    /// Create a journal already initialized at `path`
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        let journal = Self::new();
        journal.init(path)?;
        Ok(journal)
    }
}

impl Default for FileEventJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl EventJournal for FileEventJournal {
    fn append(&self, event: &LedgerEvent) -> Result<(), LedgerError> {
        let mut file_guard = self
            .file
            .lock()
            .map_err(|e| LedgerError::Journal(format!("Failed to acquire lock: {}", e)))?;

        let file = file_guard
            .as_mut()
            .ok_or_else(|| LedgerError::Journal("Journal has not been initialized".to_string()))?;

        let serialized = bincode::serialize(event)?;

        // Write the entry length and data
        let entry_len = serialized.len() as u64;
        file.write_all(&entry_len.to_le_bytes())?;
        file.write_all(&serialized)?;
        file.flush()?;

        debug!("journaled event: {:?}", event);
        Ok(())
    }

    fn iter_events(&self) -> Box<dyn Iterator<Item = Result<LedgerEvent, LedgerError>> + '_> {
        let path_guard = match self.path.lock() {
            Ok(guard) => guard,
            Err(e) => {
                return Box::new(std::iter::once(Err(LedgerError::Journal(format!(
                    "Failed to acquire path lock: {}",
                    e
                )))))
            }
        };
        let path = path_guard.clone();
        drop(path_guard);

        // An unreadable journal is a broken audit trail, not an empty one
        match File::open(&path) {
            Ok(file) => Box::new(JournalIterator {
                reader: BufReader::new(file),
            }),
            Err(e) => Box::new(std::iter::once(Err(LedgerError::Journal(format!(
                "Failed to open journal file {}: {}",
                path.display(),
                e
            ))))),
        }
    }
}

/// Iterator over journal entries
struct JournalIterator {
    reader: BufReader<File>,
}

impl Iterator for JournalIterator {
    type Item = Result<LedgerEvent, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Read the entry length
        let mut len_buf = [0u8; 8];
        match self.reader.read_exact(&mut len_buf) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // End of file
                return None;
            }
            Err(e) => return Some(Err(LedgerError::Io(e))),
        }

        let entry_len = u64::from_le_bytes(len_buf) as usize;

        // Read the entry data
        let mut entry_buf = vec![0u8; entry_len];
        if let Err(e) = self.reader.read_exact(&mut entry_buf) {
            return Some(Err(LedgerError::Journal(format!(
                "Truncated journal entry: {}",
                e
            ))));
        }

        match bincode::deserialize(&entry_buf) {
            Ok(event) => Some(Ok(event)),
            Err(e) => Some(Err(LedgerError::Serialization(e.to_string()))),
        }
    }
}

/// In-memory journal for tests and ephemeral ledgers
pub struct MemoryEventJournal {
    events: Mutex<Vec<LedgerEvent>>,
}

impl MemoryEventJournal {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Number of journaled events
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryEventJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl EventJournal for MemoryEventJournal {
    fn append(&self, event: &LedgerEvent) -> Result<(), LedgerError> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| LedgerError::Journal(format!("Failed to acquire lock: {}", e)))?;
        events.push(event.clone());
        Ok(())
    }

    fn iter_events(&self) -> Box<dyn Iterator<Item = Result<LedgerEvent, LedgerError>> + '_> {
        let events = match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        };
        Box::new(events.into_iter().map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deeds_core::id::{AccountKey, RequestId};

    fn sample_events() -> Vec<LedgerEvent> {
        let requester = AccountKey::derive(&[b"submitter"]);
        let buyer = AccountKey::derive(&[b"buyer"]);
        let id = RequestId::new(1);
        vec![
            LedgerEvent::Submitted {
                id,
                requester,
                fee: 100,
                at: 10,
            },
            LedgerEvent::Minted { id, at: 20 },
            LedgerEvent::Sold {
                id,
                from: requester,
                to: buyer,
                amount: 5_000,
                at: 30,
            },
        ]
    }

    #[test]
    fn test_file_journal_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.journal");

        let journal = FileEventJournal::open(&path).expect("open journal");
        let events = sample_events();
        for event in &events {
            journal.append(event).expect("append");
        }

        let replayed: Vec<LedgerEvent> = journal
            .iter_events()
            .collect::<Result<Vec<_>, _>>()
            .expect("replay");
        assert_eq!(replayed, events);
    }

    #[test]
    fn test_file_journal_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.journal");

        let events = sample_events();
        {
            let journal = FileEventJournal::open(&path).expect("open journal");
            for event in &events {
                journal.append(event).expect("append");
            }
        }

        // A fresh handle over the same file replays everything
        let journal = FileEventJournal::open(&path).expect("reopen journal");
        let replayed: Vec<LedgerEvent> = journal
            .iter_events()
            .collect::<Result<Vec<_>, _>>()
            .expect("replay");
        assert_eq!(replayed, events);
    }

    #[test]
    fn test_uninitialized_file_journal_rejects_append() {
        let journal = FileEventJournal::new();
        let err = journal
            .append(&sample_events()[0])
            .expect_err("append should fail");
        assert!(matches!(err, LedgerError::Journal(_)));
    }

    #[test]
    fn test_missing_journal_file_fails_replay() {
        // Never initialized, so there is no file to read back
        let journal = FileEventJournal::new();
        let result: Result<Vec<LedgerEvent>, _> = journal.iter_events().collect();
        assert!(matches!(result, Err(LedgerError::Journal(_))));

        // A journal whose file disappeared is just as broken
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.journal");
        let journal = FileEventJournal::open(&path).expect("open journal");
        std::fs::remove_file(&path).expect("remove file");
        let result: Result<Vec<LedgerEvent>, _> = journal.iter_events().collect();
        assert!(matches!(result, Err(LedgerError::Journal(_))));
    }

    #[test]
    fn test_memory_journal_round_trip() {
        let journal = MemoryEventJournal::new();
        assert!(journal.is_empty());

        let events = sample_events();
        for event in &events {
            journal.append(event).expect("append");
        }
        assert_eq!(journal.len(), events.len());

        let replayed: Vec<LedgerEvent> = journal
            .iter_events()
            .collect::<Result<Vec<_>, _>>()
            .expect("replay");
        assert_eq!(replayed, events);
    }
}
