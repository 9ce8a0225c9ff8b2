use std::path::PathBuf;
use thiserror::Error;

/// Failures of the optional configuration loaders.
///
/// Admission checks never fail; only turning outside input into a
/// [`BucketConfig`](crate::BucketConfig) can.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
    #[error("cannot read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path:?} as JSON or YAML: {reason}")]
    Parse { path: PathBuf, reason: String },
}

impl ConfigError {
    /// Name of the offending environment variable, if the error came from one.
    pub fn var(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidValue { var, .. } => Some(var),
            ConfigError::Io { .. } | ConfigError::Parse { .. } => None,
        }
    }
}
