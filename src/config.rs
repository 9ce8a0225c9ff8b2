use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, path::Path};

use crate::errors::ConfigError;

pub const DEFAULT_INITIAL_TOKENS: i64 = 1000;
pub const DEFAULT_CAPACITY: i64 = 1000;
pub const DEFAULT_REFILL_RATE: f64 = 5.0;

const DEFAULT_ENV_PREFIX: &str = "RATEBUCKET";

/// Shape of a single token bucket.
///
/// A [`Pool`](crate::Pool) applies one of these to every bucket it creates, which is
/// why [`PoolConfig`] is the same type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    /// Tokens available right after construction. May be below `capacity`.
    pub initial_tokens: i64,
    /// Maximum tokens a bucket holds.
    pub capacity: i64,
    /// Tokens added per elapsed second.
    #[serde(alias = "rate")]
    pub refill_rate: f64,
}

pub type PoolConfig = BucketConfig;

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            initial_tokens: DEFAULT_INITIAL_TOKENS,
            capacity: DEFAULT_CAPACITY,
            refill_rate: DEFAULT_REFILL_RATE,
        }
    }
}

impl BucketConfig {
    /// Config from explicit values; no validation is applied.
    pub fn new(initial_tokens: i64, capacity: i64, refill_rate: f64) -> Self {
        Self {
            initial_tokens,
            capacity,
            refill_rate,
        }
    }

    /// Overrides the starting token count.
    pub fn with_initial_tokens(mut self, tokens: i64) -> Self {
        self.initial_tokens = tokens;
        self
    }

    /// Overrides the maximum token count.
    pub fn with_capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Overrides the refill rate in tokens per second.
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.refill_rate = rate;
        self
    }

    /// Reads `RATEBUCKET_INITIAL_TOKENS`, `RATEBUCKET_CAPACITY` and
    /// `RATEBUCKET_REFILL_RATE`, falling back to the defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        Self::from_env_prefixed(DEFAULT_ENV_PREFIX)
    }

    /// Like [`BucketConfig::from_env`], reading `<prefix>_INITIAL_TOKENS` and friends.
    pub fn from_env_prefixed(prefix: &str) -> Result<Self> {
        let defaults = Self::default();
        let initial_tokens =
            env_or(&format!("{prefix}_INITIAL_TOKENS"), defaults.initial_tokens)?;
        let capacity = env_or(&format!("{prefix}_CAPACITY"), defaults.capacity)?;
        let refill_rate = env_or(&format!("{prefix}_REFILL_RATE"), defaults.refill_rate)?;

        let cfg = Self {
            initial_tokens,
            capacity,
            refill_rate,
        };
        cfg.warn_if_degenerate();
        Ok(cfg)
    }

    /// Loads a JSON or YAML document. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
            .with_context(|| format!("read bucket config at {:?}", path))?;

        let cfg: Self = serde_json::from_str(&raw)
            .or_else(|_| serde_yaml::from_str(&raw))
            .map_err(|err| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })
            .with_context(|| "parse bucket config document")?;

        cfg.warn_if_degenerate();
        Ok(cfg)
    }

    // Degenerate values are accepted as-is; they only produce a bucket that never
    // admits or never refills.
    fn warn_if_degenerate(&self) {
        if self.capacity <= 0 {
            tracing::warn!(
                capacity = self.capacity,
                "bucket capacity is not positive; every request will be denied"
            );
        }
        if self.refill_rate <= 0.0 {
            tracing::warn!(
                refill_rate = self.refill_rate,
                "bucket refill rate is not positive; tokens will never replenish"
            );
        }
    }
}

fn env_or<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map_err(|err: T::Err| ConfigError::InvalidValue {
                    var: var.to_string(),
                    value: value.clone(),
                    reason: err.to_string(),
                })
        }
        _ => Ok(default),
    }
}
