//! Optional TOML configuration file.
//!
//! Every key is optional; whatever is present fills in for a CLI flag or
//! environment variable the user did not set.
//!
//! ```toml
//! [bridge]
//! mode = "client"
//! local = "localhost:28080"
//! remote = "relay.example.com:443"
//! protocol = "wss"
//! dial_timeout_secs = 10
//! idle_timeout_secs = 300
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration file loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level file layout.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub bridge: BridgeSection,
}

/// The `[bridge]` table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BridgeSection {
    /// `"client"` or `"server"`.
    pub mode: Option<String>,
    pub local: Option<String>,
    pub remote: Option<String>,
    /// `"ws"` or `"wss"`.
    pub protocol: Option<String>,
    pub dial_timeout_secs: Option<u64>,
    /// `0` disables the idle deadline.
    pub idle_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_empty_section() {
        let cfg = FileConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, FileConfig::default());
    }

    #[test]
    fn test_full_bridge_section_parses() {
        // Arrange
        let text = r#"
            [bridge]
            mode = "client"
            local = "127.0.0.1:1080"
            remote = "relay.example.com:443"
            protocol = "ws"
            dial_timeout_secs = 3
            idle_timeout_secs = 0
        "#;

        // Act
        let cfg = FileConfig::from_toml_str(text).unwrap();

        // Assert
        let b = cfg.bridge;
        assert_eq!(b.mode.as_deref(), Some("client"));
        assert_eq!(b.local.as_deref(), Some("127.0.0.1:1080"));
        assert_eq!(b.remote.as_deref(), Some("relay.example.com:443"));
        assert_eq!(b.protocol.as_deref(), Some("ws"));
        assert_eq!(b.dial_timeout_secs, Some(3));
        assert_eq!(b.idle_timeout_secs, Some(0));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = FileConfig::from_toml_str("[bridge]\nlisten_port = 80\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = FileConfig::load(Path::new("/nonexistent/wsbridge.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
