use std::path::Path;

use revise_diff::DiffOptions;
use revise_export::ExportOptions;
use revise_import::ImportOptions;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings for every stage of the engine.
///
/// Every section is optional in TOML; missing keys take their defaults.
///
/// ```toml
/// [diff]
/// granularity = "sentence"
/// replacements = "delete_insert"
///
/// [import]
/// max_promotion_rounds = 8
///
/// [export]
/// collapse_spans = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub diff: DiffOptions,
    pub import: ImportOptions,
    pub export: ExportOptions,
}

impl EngineConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.import.max_promotion_rounds == 0 {
            return Err(ConfigError::Invalid(
                "import.max_promotion_rounds must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
