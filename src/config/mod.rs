use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: home.join(".nowplaying"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// System backend when available, otherwise log.
    #[default]
    Auto,
    System,
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    #[serde(default)]
    pub backend: Backend,
    /// MPRIS bus name suffix and display identity.
    #[serde(default = "default_identity")]
    pub identity: String,
}

fn default_identity() -> String {
    "nowplaying".to_string()
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            identity: default_identity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub auto_start: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self { auto_start: true }
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nowplaying")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.storage.path
    }

    pub fn artwork_dir(&self) -> PathBuf {
        self.storage.path.join("artwork")
    }

    pub fn socket_path(&self) -> PathBuf {
        self.storage.path.join("nowplaying.sock")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.storage.path.join("nowplaying.pid")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.data_dir()).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                self.data_dir().display()
            )
        })?;
        fs::create_dir_all(self.artwork_dir()).with_context(|| {
            format!(
                "Failed to create artwork directory: {}",
                self.artwork_dir().display()
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.publisher.backend, Backend::Auto);
        assert_eq!(config.publisher.identity, "nowplaying");
        assert!(config.daemon.auto_start);
    }

    #[test]
    fn test_parse_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[storage]\npath = \"/tmp/np\"\n\n[publisher]\nbackend = \"log\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.publisher.backend, Backend::Log);
        assert_eq!(config.publisher.identity, "nowplaying");
        assert_eq!(config.socket_path(), PathBuf::from("/tmp/np/nowplaying.sock"));
        assert_eq!(config.artwork_dir(), PathBuf::from("/tmp/np/artwork"));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[publisher]\nbackend = \"carrier-pigeon\"\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
