//! Journal - append-only JSON-lines persistence for store events

use super::events::StoreEvent;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Persistent event journal
pub struct Journal {
    /// Path to the journal file
    path: PathBuf,

    /// fsync after every append
    sync_on_append: bool,

    /// Events appended or loaded so far
    event_count: AtomicUsize,
}

impl Journal {
    /// Open a journal, creating its parent directory if needed
    ///
    /// Returns the journal together with the events already on disk.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, Vec<StoreEvent>)> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create journal directory {}", parent.display())
                })?;
            }
        }

        let events = Self::load_events(&path)?;
        Self::terminate_torn_tail(&path)?;
        log::info!("Loaded {} ledger events from {}", events.len(), path.display());

        let journal =
            Self { path, sync_on_append: false, event_count: AtomicUsize::new(events.len()) };
        Ok((journal, events))
    }

    pub fn with_sync_on_append(mut self, sync: bool) -> Self {
        self.sync_on_append = sync;
        self
    }

    /// Load events from disk, skipping lines that fail to parse
    fn load_events(path: &Path) -> Result<Vec<StoreEvent>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open journal {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<StoreEvent>(&line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    log::warn!("Failed to parse ledger event at line {}: {}", line_num + 1, e);
                }
            }
        }

        Ok(events)
    }

    /// Make sure the next append starts on a fresh line after a crash mid-write
    fn terminate_torn_tail(path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open journal {}", path.display()))?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(());
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            log::warn!("Journal {} ends with a partial line; terminating it", path.display());
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Append one event
    pub fn append(&self, event: &StoreEvent) -> std::io::Result<()> {
        log::debug!("Journal append: {}", event.event_type());

        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.write_line(&mut file, &line)?;
        if self.sync_on_append {
            file.sync_data()?;
        }

        self.event_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Write one full line; on failure the torn tail is terminated before returning
    fn write_line(&self, writer: &mut impl Write, line: &[u8]) -> std::io::Result<()> {
        let result = writer.write_all(line).and_then(|()| writer.flush());
        if let Err(e) = &result {
            log::error!("Journal append to {} failed: {}", self.path.display(), e);
            if let Err(repair) = Self::terminate_torn_tail(&self.path) {
                log::error!("Could not terminate torn line in {}: {:#}", self.path.display(), repair);
            }
        }
        result
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn event_count(&self) -> usize {
        self.event_count.load(Ordering::Relaxed)
    }

    /// Re-read every event from disk (for audit/debugging)
    pub fn all_events(&self) -> Result<Vec<StoreEvent>> {
        Self::load_events(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Policy;
    use tempfile::TempDir;

    #[test]
    fn test_journal_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ledger.jsonl");

        let (journal, events) = Journal::open(&path).unwrap();
        assert!(events.is_empty());

        journal.append(&StoreEvent::PolicySaved { policy: Policy::default() }).unwrap();
        journal
            .append(&StoreEvent::MemberRemoved { member_id: "m1".to_string() })
            .unwrap();
        assert_eq!(journal.event_count(), 2);

        let (reopened, events) = Journal::open(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type(), "member_removed");
        assert_eq!(reopened.event_count(), 2);
    }

    /// Writes half of the first buffer to the file, then fails
    struct HalfWriter {
        file: fs::File,
        written: bool,
    }

    impl Write for HalfWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            self.written = true;
            let half = buf.len() / 2;
            self.file.write_all(&buf[..half])?;
            Ok(half)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.file.flush()
        }
    }

    #[test]
    fn test_failed_append_does_not_swallow_the_next_event() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let (journal, _) = Journal::open(&path).unwrap();
        journal.append(&StoreEvent::MemberRemoved { member_id: "m1".to_string() }).unwrap();

        let line = serde_json::to_vec(&StoreEvent::MemberRemoved { member_id: "m2".to_string() }).unwrap();
        let file = OpenOptions::new().append(true).open(&path).unwrap();
        let mut writer = HalfWriter { file, written: false };
        assert!(journal.write_line(&mut writer, &line).is_err());

        journal.append(&StoreEvent::MemberRemoved { member_id: "m3".to_string() }).unwrap();

        let events = journal.all_events().unwrap();
        let removed: Vec<_> = events
            .iter()
            .map(|event| match event {
                StoreEvent::MemberRemoved { member_id } => member_id.as_str(),
                other => other.event_type(),
            })
            .collect();
        assert_eq!(removed, vec!["m1", "m3"]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let valid = serde_json::to_string(&StoreEvent::MemberRemoved { member_id: "m1".into() })
            .unwrap();
        fs::write(&path, format!("{}\nnot json\n\n{{\"type\":\"unknown\"}}\n", valid)).unwrap();

        let (_journal, events) = Journal::open(&path).unwrap();
        assert_eq!(events.len(), 1);
    }
}
