use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Persisted key-value configuration under the carve home directory.
///
/// The store is an external collaborator from the core's perspective:
/// plain JSON, string keys, read on every access. A corrupt file degrades
/// to an empty config with a warning rather than failing.
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    /// Open the store at `~/.carve`, creating its layout on first use.
    pub fn open() -> Result<Self> {
        let home = dirs::home_dir().context("Cannot determine home directory")?;
        Self::at(home.join(".carve"))
    }

    /// Open the store at an explicit root (used by tests).
    pub fn at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in ["tmp", "cache", "prompts"] {
            std::fs::create_dir_all(root.join(dir))
                .with_context(|| format!("Cannot create {} directory", root.join(dir).display()))?;
        }

        let config = root.join("config.json");
        if !config.exists() {
            std::fs::write(&config, "{}")
                .with_context(|| format!("Cannot initialize {}", config.display()))?;
        }

        Ok(Self { root })
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.root.join("prompts")
    }

    /// Generate a fresh path under the tmp directory.
    pub fn tmp_file(&self, extension: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        self.root
            .join("tmp")
            .join(format!("{stamp}-{}{extension}", std::process::id()))
    }

    pub fn load_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.read().get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("Config key {key} has an unexpected shape: {err}");
                None
            }
        }
    }

    pub fn load_key_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.load_key(key).unwrap_or(default)
    }

    pub fn set_key(&self, key: &str, value: impl Serialize) -> Result<()> {
        let mut config = self.read();
        if let Value::Object(map) = &mut config {
            map.insert(key.to_string(), serde_json::to_value(value)?);
        }
        let path = self.root.join("config.json");
        std::fs::write(&path, serde_json::to_string_pretty(&config)?)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(())
    }

    fn read(&self) -> Value {
        let path = self.root.join("config.json");
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                log::warn!("Corrupt config {}, using empty config: {err}", path.display());
                Value::Object(Default::default())
            }),
            Err(err) => {
                log::warn!("Cannot read {}, using empty config: {err}", path.display());
                Value::Object(Default::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn round_trips_keys() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::at(temp.path().join("carve")).unwrap();

        assert_eq!(store.load_key::<String>("default-provider"), None);
        store.set_key("default-provider", "anthropic").unwrap();
        assert_eq!(
            store.load_key::<String>("default-provider").as_deref(),
            Some("anthropic")
        );

        store.set_key("api-concurrency", 3).unwrap();
        assert_eq!(store.load_key_or("api-concurrency", 5), 3);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::at(temp.path().join("carve")).unwrap();

        assert_eq!(store.load_key_or("api-concurrency", 5), 5);
    }

    #[test]
    fn corrupt_config_degrades_to_empty() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("carve");
        let store = ConfigStore::at(&root).unwrap();
        std::fs::write(root.join("config.json"), "not json at all").unwrap();

        assert_eq!(store.load_key::<String>("anything"), None);
        // Writes still work, replacing the corrupt file.
        store.set_key("k", "v").unwrap();
        assert_eq!(store.load_key::<String>("k").as_deref(), Some("v"));
    }

    #[test]
    fn tmp_files_are_distinct_per_call() {
        let temp = tempdir().unwrap();
        let store = ConfigStore::at(temp.path().join("carve")).unwrap();

        let a = store.tmp_file(".md");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = store.tmp_file(".md");

        assert_ne!(a, b);
    }
}
