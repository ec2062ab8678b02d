use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::Context as _;

use crate::domain::repository::FileStorage;
use crate::error::MarketError;

/// Uploads on local disk under `root`, served read-only at `/uploads`.
#[derive(Clone)]
pub struct LocalFileStorage {
    pub root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys are relative paths made only of normal components.
    fn resolve(&self, key: &str) -> Result<PathBuf, MarketError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(MarketError::Internal(anyhow::anyhow!(
                "refusing storage key outside upload root: {key}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl FileStorage for LocalFileStorage {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), MarketError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create upload dir {}", parent.display()))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        tracing::debug!(key, size = bytes.len(), "upload stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), MarketError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("delete upload {}", path.display()))
                .into()),
        }
    }
}
