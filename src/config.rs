use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_IN_DIR: &str = "/tmp/bloom/in";
pub const DEFAULT_OUT_DIR: &str = "/tmp/bloom/out";
pub const DEFAULT_MEDIA_URL: &str = "/logs/";

/// Where the game runner drops results, where ingested logs are kept, and
/// the public prefix the kept logs are served under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomConfig {
    pub in_dir: PathBuf,
    pub out_dir: PathBuf,
    pub media_url: String,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            in_dir: PathBuf::from(DEFAULT_IN_DIR),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            media_url: DEFAULT_MEDIA_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    in_dir: Option<PathBuf>,
    #[serde(default)]
    out_dir: Option<PathBuf>,
    #[serde(default)]
    media_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub in_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
}

impl BloomConfig {
    /// Loads `path` when it exists and layers `overrides` on top. A missing
    /// file yields the built-in defaults.
    pub fn load(path: &Path, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let file = match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str::<ConfigFile>(&raw).map_err(|err| ConfigError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => ConfigFile::default(),
            Err(err) => return Err(ConfigError::Io(err)),
        };

        let defaults = BloomConfig::default();
        let config = BloomConfig {
            in_dir: overrides
                .in_dir
                .clone()
                .or(file.in_dir)
                .unwrap_or(defaults.in_dir),
            out_dir: overrides
                .out_dir
                .clone()
                .or(file.out_dir)
                .unwrap_or(defaults.out_dir),
            media_url: file.media_url.unwrap_or(defaults.media_url),
        };
        tracing::debug!(
            in_dir = %config.in_dir.display(),
            out_dir = %config.out_dir.display(),
            "configuration resolved"
        );
        Ok(config)
    }

    pub fn file_url(&self, file_name: &str) -> String {
        if self.media_url.ends_with('/') {
            format!("{}{}", self.media_url, file_name)
        } else {
            format!("{}/{}", self.media_url, file_name)
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {}", err),
            ConfigError::Parse { path, message } => {
                write!(f, "invalid config '{}': {}", path.display(), message)
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse { .. } => None,
        }
    }
}
