use async_trait::async_trait;
use roster_engine::{PublishError, WhitelistEntry, WhitelistPublisher};
use std::path::PathBuf;

/// Publisher that writes the projected allow-list to a local path, e.g. a
/// directory served to the game servers by an external transport.
pub struct FilePublisher {
    path: PathBuf,
}

impl FilePublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl WhitelistPublisher for FilePublisher {
    async fn publish(&self, entries: &[WhitelistEntry]) -> Result<(), PublishError> {
        let payload =
            serde_json::to_vec_pretty(entries).map_err(|err| PublishError(err.to_string()))?;
        tokio::fs::write(&self.path, payload)
            .await
            .map_err(|err| PublishError(err.to_string()))?;
        tracing::debug!(path = %self.path.display(), entries = entries.len(), "whitelist published");
        Ok(())
    }
}

/// Publisher that drops the document; used when delivery is handled out of
/// band.
pub struct NullPublisher;

#[async_trait]
impl WhitelistPublisher for NullPublisher {
    async fn publish(&self, _entries: &[WhitelistEntry]) -> Result<(), PublishError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_publisher_writes_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whitelist.json");
        let publisher = FilePublisher::new(&path);

        let entries = vec![WhitelistEntry {
            uuid: "069a79f444e94726a5befca90e38aaf5".to_string(),
            name: "Steve".to_string(),
        }];
        publisher.publish(&entries).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<WhitelistEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, entries);
    }
}
