use std::path::PathBuf;

use thiserror::Error;

/// Errors loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("patch error: {0}")]
    Patch(#[from] revise_patch::PatchError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("document holds {0} diff spans where none were expected")]
    UnexpectedDiffs(usize),
}

pub type SdkResult<T> = Result<T, SdkError>;
