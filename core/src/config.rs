//! config.rs
//!
//! Context configuration: defaults, host-derived profile, environment
//! overrides and JSON round-trip.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compression::{resolve, Codec};
use crate::constants::{env_vars, DEFAULT_LEVEL, MAX_LEVEL};
use crate::shuffle::ShuffleMode;
use crate::types::ChunkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub threads: usize,
    pub codec: Codec,
    pub shuffle: ShuffleMode,
    pub level: u8,
    /// Forced block size; `None` lets the level pick one.
    pub block_size: Option<usize>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            codec: Codec::default(),
            shuffle: ShuffleMode::default(),
            level: DEFAULT_LEVEL,
            block_size: None,
        }
    }
}

impl ContextConfig {
    /// Defaults for `codec`, at that backend's default level.
    pub fn for_codec(codec: Codec) -> Self {
        Self { codec, level: resolve(codec).default_level, ..Self::default() }
    }

    /// Defaults with one worker per core, leaving one core free.
    pub fn dynamic() -> Self {
        let threads = num_cpus::get().saturating_sub(1).max(1);
        Self { threads, ..Self::default() }
    }

    /// Defaults overlaid with the `SHUFFLEPACK_*` environment variables.
    pub fn from_env() -> Result<Self, ChunkError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ChunkError> {
        let mut cfg = Self::default();

        if let Some(v) = lookup(env_vars::NTHREADS) {
            cfg.threads = parse_number(env_vars::NTHREADS, &v)?;
        }
        if let Some(v) = lookup(env_vars::COMPRESSOR) {
            cfg.codec = Codec::from_name(v.trim())
                .ok_or_else(|| malformed(env_vars::COMPRESSOR, &v))?;
        }
        if let Some(v) = lookup(env_vars::SHUFFLE) {
            cfg.shuffle = ShuffleMode::from_name(v.trim())
                .ok_or_else(|| malformed(env_vars::SHUFFLE, &v))?;
        }
        match lookup(env_vars::CLEVEL) {
            Some(v) => cfg.level = parse_number(env_vars::CLEVEL, &v)?,
            None => cfg.level = resolve(cfg.codec).default_level,
        }
        if let Some(v) = lookup(env_vars::BLOCKSIZE) {
            cfg.block_size = Some(parse_number(env_vars::BLOCKSIZE, &v)?);
        }

        cfg.validate()?;
        log::debug!("config from environment: {:?}", cfg);
        Ok(cfg)
    }

    /// Parse a (possibly partial) JSON document. A missing `level` takes
    /// the chosen backend's default.
    pub fn from_json(json: &str) -> Result<Self, ChunkError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ChunkError::invalid(format!("config json: {}", e)))?;
        let explicit_level = value.get("level").is_some();
        let mut cfg: Self = serde_json::from_value(value)
            .map_err(|e| ChunkError::invalid(format!("config json: {}", e)))?;
        if !explicit_level {
            cfg.level = resolve(cfg.codec).default_level;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json(&self) -> Result<String, ChunkError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChunkError::invalid(format!("config json: {}", e)))
    }

    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.threads == 0 {
            return Err(ChunkError::invalid("thread count must be at least 1"));
        }
        if self.level > MAX_LEVEL {
            return Err(ChunkError::invalid(format!("level {} outside 0..={}", self.level, MAX_LEVEL)));
        }
        if self.block_size == Some(0) {
            return Err(ChunkError::invalid("forced block size must be non-zero"));
        }
        Ok(())
    }
}

fn malformed(key: &str, value: &str) -> ChunkError {
    ChunkError::invalid(format!("{}={:?} is not a valid value", key, value))
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ChunkError> {
    value.trim().parse().map_err(|_| malformed(key, value))
}
