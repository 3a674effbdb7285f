use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{OutcomeRecord, RecorderError};

/// CSV header written at the top of every new result log.
pub const HEADER: &str = "GroupName,Topic,GroupID,URL,PhotoStatus";

/// One account's append-only result log.
#[derive(Debug)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    /// Open (creating if needed) `<dir>/<stem>.csv`.
    ///
    /// The header is written only when the file is new or empty, so reruns
    /// keep appending below earlier results.
    pub async fn open(dir: &Path, stem: &str) -> Result<Self, RecorderError> {
        let path = dir.join(format!("{}.csv", stem));
        let io_err = |source| RecorderError::Io {
            path: path.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_err)?;

        let len = file.metadata().await.map_err(io_err)?.len();
        if len == 0 {
            file.write_all(format!("{}\n", HEADER).as_bytes())
                .await
                .map_err(io_err)?;
            file.flush().await.map_err(io_err)?;
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a CSV row.
    pub async fn append(&self, record: &OutcomeRecord) -> Result<(), RecorderError> {
        let io_err = |source| RecorderError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;

        let line = format!("{}\n", record.to_csv_row());
        file.write_all(line.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        debug!("Recorded outcome for {}", record.group_name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::GroupRequest;
    use crate::results::PhotoStatus;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let log = ResultLog::open(dir.path(), "main").await.unwrap();
        log.append(&OutcomeRecord::not_created(&GroupRequest::new("A", "t")))
            .await
            .unwrap();

        // Reopening must not repeat the header.
        let log = ResultLog::open(dir.path(), "main").await.unwrap();
        log.append(&OutcomeRecord::created(
            &GroupRequest::new("B", "t"),
            7,
            "https://vk.com/club7".to_string(),
            PhotoStatus::NoPhoto,
        ))
        .await
        .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            content,
            "GroupName,Topic,GroupID,URL,PhotoStatus\nA,t\nB,t,7,https://vk.com/club7,no-photo\n"
        );
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("results").join("today");
        let log = ResultLog::open(&nested, "acc").await.unwrap();
        assert!(log.path().exists());
        assert!(log.path().ends_with("acc.csv"));
    }
}
