use crate::error::IngestError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Append-only record of content hashes already ingested.
///
/// Backed by a plain-text file, one lowercase hex hash per line. The file is
/// created lazily on first append. Appends are serialized behind a mutex so
/// concurrent uploads cannot interleave partial lines; `contains` followed by
/// `record` across two requests is still not transactional.
#[derive(Clone)]
pub struct HashLedger {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl HashLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails open to `false` when the ledger has never been created.
    pub async fn contains(&self, hash: &str) -> Result<bool, IngestError> {
        let _guard = self.lock.lock().await;

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(error) => return Err(self.ledger_error(error)),
        };

        Ok(content.lines().any(|line| line == hash))
    }

    /// Blindly appends; deduplication is the caller's responsibility.
    pub async fn record(&self, hash: &str) -> Result<(), IngestError> {
        let _guard = self.lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|error| self.ledger_error(error))?;

        writeln!(file, "{hash}").map_err(|error| self.ledger_error(error))?;
        Ok(())
    }

    fn ledger_error(&self, source: std::io::Error) -> IngestError {
        IngestError::Ledger {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HashLedger;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_ledger_contains_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let ledger = HashLedger::new(dir.path().join("hashes.txt"));
        assert!(!ledger.contains("abc123").await?);
        Ok(())
    }

    #[tokio::test]
    async fn recorded_hash_is_found() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let ledger = HashLedger::new(dir.path().join("hashes.txt"));

        ledger.record("abc123").await?;
        assert!(ledger.contains("abc123").await?);
        assert!(!ledger.contains("def456").await?);
        Ok(())
    }

    #[tokio::test]
    async fn appends_accumulate_one_hash_per_line() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("hashes.txt");
        let ledger = HashLedger::new(&path);

        ledger.record("first").await?;
        ledger.record("second").await?;

        let content = std::fs::read_to_string(&path)?;
        assert_eq!(content, "first\nsecond\n");
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_appends_are_not_deduplicated() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("hashes.txt");
        let ledger = HashLedger::new(&path);

        ledger.record("same").await?;
        ledger.record("same").await?;

        let content = std::fs::read_to_string(&path)?;
        assert_eq!(content.lines().count(), 2);
        Ok(())
    }
}
