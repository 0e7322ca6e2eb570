use super::LogRecord;
use chrono::Local;
use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum LogWriteError {
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Creates the log directory if it does not exist yet. Run once at startup.
pub fn init_log_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        info!(path = %dir.display(), "Created log directory");
    }
    Ok(())
}

/// Persists [`LogRecord`]s as pretty-printed JSON files named after the write time.
///
/// File names have microsecond resolution (`YYYY-MM-DD_HH-MM-SS-ffffff.json`)
/// and nothing else distinguishes them: two records written within the same
/// microsecond land on the same path and the later one wins.
#[derive(Debug, Clone)]
pub struct LogWriter {
    dir: PathBuf,
}

impl LogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn next_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S-%6f");
        self.dir.join(format!("{}.json", stamp))
    }

    fn encode(record: &LogRecord) -> Result<Vec<u8>, LogWriteError> {
        Ok(serde_json::to_vec_pretty(record)?)
    }

    pub async fn try_write(&self, record: &LogRecord) -> Result<PathBuf, LogWriteError> {
        let contents = Self::encode(record)?;
        let path = self.next_path();
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| LogWriteError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Writes the record, reporting failures to diagnostics instead of the caller.
    pub async fn write(&self, record: &LogRecord) {
        match self.try_write(record).await {
            Ok(path) => info!(path = %path.display(), "Log saved"),
            Err(e) => error!("Error saving log file: {}", e),
        }
    }

    /// Synchronous variant for contexts that cannot await, such as `Drop`.
    pub fn write_blocking(&self, record: &LogRecord) {
        let path = self.next_path();
        let result = Self::encode(record).and_then(|contents| {
            std::fs::write(&path, contents).map_err(|source| LogWriteError::Io {
                path: path.clone(),
                source,
            })
        });
        match result {
            Ok(()) => info!(path = %path.display(), "Log saved"),
            Err(e) => error!("Error saving log file: {}", e),
        }
    }
}
