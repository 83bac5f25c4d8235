use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Content-addressed store for provider outputs.
///
/// Keys are SHA-256 digests of `(provider, model, input)`; values are the
/// raw output text, one file per digest. Entries are created on the first
/// successful invocation for a key and read-only thereafter; there is no
/// TTL or eviction. Concurrent writers race last-writer-wins, which is
/// acceptable since values for identical keys are intended to be identical.
pub struct InvocationCache {
    dir: PathBuf,
}

impl InvocationCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Deterministic digest for an invocation. Equal triples always yield
    /// equal digests.
    pub fn key(provider: &str, model_id: &str, input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(provider.as_bytes());
        hasher.update(b"-");
        hasher.update(model_id.as_bytes());
        hasher.update(b"-");
        hasher.update(input.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up a cached output. A corrupt or unreadable entry is an
    /// unconditional miss, never an error.
    pub async fn get(&self, digest: &str) -> Option<String> {
        let path = self.entry_path(digest);
        match tokio::fs::read_to_string(&path).await {
            Ok(output) => Some(output),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                log::warn!("Unreadable cache entry {}: {err}", path.display());
                None
            }
        }
    }

    /// Store an output under a digest, creating the cache directory on
    /// first use.
    pub async fn put(&self, digest: &str, output: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.entry_path(digest), output).await?;
        Ok(())
    }

    fn entry_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{digest}.txt"))
    }
}
