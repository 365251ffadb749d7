use std::path::{Path, PathBuf};

use serde::Deserialize;
use sesman_repository::TemplateBackend;
use tracing::{debug, info};

/// Directory used for stored credentials when nothing else is configured.
const DEFAULT_STATE_DIR: &str = ".sesman";

/// Top-level configuration for the `sesman` console, loaded from a TOML file.
///
/// # Example
///
/// ```toml
/// backend = "object_store"
/// state_dir = "/var/lib/sesman"
/// endpoint_url = "http://localhost:4566"
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SesmanConfig {
    /// Where templates are stored.
    #[serde(default)]
    pub backend: TemplateBackend,
    /// Directory holding the credential and theme records.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// Custom AWS endpoint (e.g. `LocalStack`).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

/// Effective settings after command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: TemplateBackend,
    pub state_dir: PathBuf,
    pub endpoint_url: Option<String>,
}

impl SesmanConfig {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(toml::from_str("")?);
        }
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Apply command-line (or environment) overrides.
    pub fn resolve(
        self,
        state_dir: Option<PathBuf>,
        backend: Option<TemplateBackend>,
        endpoint_url: Option<String>,
    ) -> Settings {
        Settings {
            backend: backend.unwrap_or(self.backend),
            state_dir: state_dir
                .or(self.state_dir)
                .unwrap_or_else(default_state_dir),
            endpoint_url: endpoint_url.or(self.endpoint_url),
        }
    }
}

fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(DEFAULT_STATE_DIR),
        |home| PathBuf::from(home).join(DEFAULT_STATE_DIR),
    )
}
