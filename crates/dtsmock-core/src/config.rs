//! Generator configuration (dtsmock.toml) parsing and types.

use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration structure for dtsmock.toml.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MockConfig {
    /// Prefix of every placeholder string, e.g. `'[PC Preview] unknown type'`.
    pub placeholder_tag: String,
    /// Shared declaration files searched for unimported type names, in order.
    pub shared_files: Vec<PathBuf>,
    /// Logical-name prefixes of module-less files that get a file-level factory.
    pub factory_prefixes: Vec<String>,
    /// Scoped-package marker stripped from file names.
    pub scoped_marker: String,
    /// File-name prefix of modules registered in the napi table.
    pub module_marker: String,
    /// Logical-name prefix of files registered in the system table.
    pub system_prefix: String,
    /// Logical-name prefix stripped from napi dispatch labels.
    pub reverse_domain_prefix: String,
    /// Directory names skipped while walking the API tree.
    pub exclude_dirs: Vec<String>,
    /// User additions to the built-in override table.
    pub overrides: OverridesConfig,
}

/// `[overrides]` section.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct OverridesConfig {
    /// Type name -> literal JS text.
    pub values: IndexMap<String, String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        let shared_files = [
            "common", "units", "common_ts_ets_api", "enums", "alert_dialog", "ability_component",
        ]
        .iter()
        .map(|name| PathBuf::from(format!("@internal/component/ets/{name}.d.ts")))
        .collect();

        Self {
            placeholder_tag: "[PC Preview]".to_string(),
            shared_files,
            factory_prefixes: vec!["ohos_".into(), "system_".into(), "webgl".into()],
            scoped_marker: "@".to_string(),
            module_marker: "@ohos".to_string(),
            system_prefix: "system_".to_string(),
            reverse_domain_prefix: "ohos_".to_string(),
            exclude_dirs: vec!["node_modules".into(), "@internal/component".into()],
            overrides: OverridesConfig::default(),
        }
    }
}

impl MockConfig {
    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from a file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from a file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Placeholder literal for an unknown value: `'[PC Preview] unknown <what>'`.
    pub fn placeholder(&self, what: &str) -> String {
        crate::naming::js_string(&format!("{} unknown {}", self.placeholder_tag, what))
    }

    pub fn is_system_file(&self, logical_name: &str) -> bool {
        logical_name.starts_with(&self.system_prefix)
    }

    pub fn has_factory_prefix(&self, logical_name: &str) -> bool {
        self.factory_prefixes
            .iter()
            .any(|prefix| logical_name.starts_with(prefix.as_str()))
    }
}
