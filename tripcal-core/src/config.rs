//! Global tripcal configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::defaults::{DefaultDataset, DefaultsSource};
use crate::error::{TripCalError, TripCalResult};
use crate::local::LocalStore;

static DEFAULT_DEFAULTS_SOURCE: &str = "events.json";
static DEFAULT_COLLECTION_PATH: &str = "events";

/// Markers left in credentials copied from the config template.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "YOUR_API_KEY_HERE",
    "YOUR_PROJECT_ID",
    "YOUR_SENDER_ID",
    "YOUR_APP_ID",
];

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tripcal"))
        .unwrap_or_else(|| PathBuf::from("~/.tripcal"))
}

fn default_defaults_source() -> String {
    DEFAULT_DEFAULTS_SOURCE.to_string()
}

fn default_collection_path() -> String {
    DEFAULT_COLLECTION_PATH.to_string()
}

/// Configuration at ~/.config/tripcal/config.toml, overridable through
/// `TRIPCAL_*` environment variables.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TripCalConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Path (relative to `data_dir`) or URL of the default itinerary.
    #[serde(default = "default_defaults_source")]
    pub defaults_source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

impl Default for TripCalConfig {
    fn default() -> Self {
        TripCalConfig {
            data_dir: default_data_dir(),
            defaults_source: default_defaults_source(),
            remote: None,
        }
    }
}

/// Realtime database credentials.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RemoteConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,

    /// Database secret or ID token appended as `?auth=` to every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Location of the collection inside the database.
    #[serde(default = "default_collection_path")]
    pub collection_path: String,
}

impl RemoteConfig {
    /// True when the credentials were never filled in. An empty value and a
    /// template placeholder mean the same thing.
    pub fn is_placeholder(&self) -> bool {
        if self.api_key.trim().is_empty() || self.database_url.trim().is_empty() {
            return true;
        }

        [
            &self.api_key,
            &self.auth_domain,
            &self.database_url,
            &self.project_id,
            &self.storage_bucket,
            &self.messaging_sender_id,
            &self.app_id,
        ]
        .iter()
        .any(|value| PLACEHOLDER_MARKERS.iter().any(|marker| value.contains(marker)))
    }
}

impl TripCalConfig {
    pub fn config_path() -> TripCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TripCalError::Config("Could not determine config directory".into()))?
            .join("tripcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load ~/.config/tripcal/config.toml, creating a commented-out template
    /// the first time.
    pub fn load() -> TripCalResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> TripCalResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("TRIPCAL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| TripCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| TripCalError::Config(e.to_string()))
    }

    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn local_store(&self) -> LocalStore {
        LocalStore::new(self.data_path().join("local_storage"))
    }

    pub fn default_dataset(&self) -> DefaultDataset {
        DefaultDataset::new(DefaultsSource::parse(&self.defaults_source, &self.data_path()))
    }

    /// Create a config file with all options commented out.
    pub fn create_default_config(path: &Path) -> TripCalResult<()> {
        let contents = format!(
            "\
# tripcal configuration

# Where local data lives:
# data_dir = \"{data_dir}\"

# Default itinerary, as a path relative to data_dir or an http(s) URL:
# defaults_source = \"{defaults}\"

# Realtime database for collaborative editing. Leave commented out (or keep
# the placeholder values) to work locally only.
# [remote]
# api_key = \"YOUR_API_KEY_HERE\"
# auth_domain = \"YOUR_PROJECT_ID.firebaseapp.com\"
# database_url = \"https://YOUR_PROJECT_ID-default-rtdb.firebaseio.com\"
# project_id = \"YOUR_PROJECT_ID\"
# storage_bucket = \"YOUR_PROJECT_ID.firebasestorage.app\"
# messaging_sender_id = \"YOUR_SENDER_ID\"
# app_id = \"YOUR_APP_ID\"
# collection_path = \"{collection}\"
",
            data_dir = default_data_dir().display(),
            defaults = DEFAULT_DEFAULTS_SOURCE,
            collection = DEFAULT_COLLECTION_PATH,
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TripCalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| TripCalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
