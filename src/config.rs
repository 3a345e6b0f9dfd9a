//! Configuration for the transport, retry and debug recorder

use serde::{Deserialize, Serialize};
use log::debug;
use std::path::Path;

/// Standard fast model used when a request names none
pub const DEFAULT_MODEL: &str = "mistral-small-latest";

pub const ENV_MODEL: &str = "UNIFIED_AI_MODEL";
pub const ENV_API_BASE: &str = "UNIFIED_AI_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "UNIFIED_AI_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "UNIFIED_AI_MAX_RETRIES";

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// Provider name
    pub name: String
  , /// API base URL (if custom)
    pub api_base: Option<String>
  , /// Request timeout in seconds
    pub timeout_secs: Option<u64>
  , /// Enable detailed logging
    pub verbose: Option<bool>
  , /// Max tokens to generate
    pub max_tokens: Option<usize>
  , /// Temperature for sampling
    pub temperature: Option<f32>
}

impl Default for ProviderConfig
{   fn default() -> Self
    {   ProviderConfig
        {   name: "mistral".to_string()
          , api_base: None
          , timeout_secs: Some(60)
          , verbose: None
          , max_tokens: Some(2048)
          , temperature: Some(0.4)
        }
    }
}

/// Transport retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig
{   /// Enable automatic retries
    pub enabled: bool
  , /// Max retry attempts after the first call
    pub max_retries: usize
  , /// Backoff multiplier for retries
    pub backoff_multiplier: f32
  , /// Initial backoff duration in milliseconds
    pub initial_backoff_ms: u64
}

impl Default for RetryConfig
{   fn default() -> Self
    {   RetryConfig
        {   enabled: true
          , max_retries: 3
          , backoff_multiplier: 2.0
          , initial_backoff_ms: 100
        }
    }
}

/// Debug recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig
{   /// Runtime env var name prefixes copied into each event
    pub env_prefixes: Vec<String>
  , /// Key fragments whose values are masked
    pub redact_markers: Vec<String>
}

impl Default for DebugConfig
{   fn default() -> Self
    {   DebugConfig
        {   env_prefixes: vec![
              "UNIFIED_AI_".to_string()
            , "MISTRAL_".to_string()
            ]
          , redact_markers: vec![
              "KEY".to_string()
            , "SECRET".to_string()
            , "TOKEN".to_string()
            , "PASSWORD".to_string()
            ]
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig
{   /// Model used when the request has no override
    pub default_model: String
  , /// Transport configuration
    pub provider: ProviderConfig
  , /// Transport retry configuration
    pub retry: RetryConfig
  , /// Debug recorder configuration
    #[serde(default)]
    pub debug: DebugConfig
}

impl Default for AiConfig
{   fn default() -> Self
    {   AiConfig
        {   default_model: DEFAULT_MODEL.to_string()
          , provider: ProviderConfig::default()
          , retry: RetryConfig::default()
          , debug: DebugConfig::default()
        }
    }
}

impl AiConfig
{   /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path)
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(
              format!("{}: {}", path.display(), e)
            )
          })?;
        let config: AiConfig = serde_json::from_str(&text)
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(
              format!("{}: {}", path.display(), e)
            )
          })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   let mut config = AiConfig::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Overlay values from an env-like lookup
    pub fn apply_env<F>(&mut self, lookup: F)
      -> Result<(), crate::error::Error>
    where F: Fn(&str) -> Option<String>
    {   if let Some(model) = lookup(ENV_MODEL)
        {   debug!("Default model overridden: {}", model);
            self.default_model = model;
        }
        if let Some(base) = lookup(ENV_API_BASE)
        {   self.provider.api_base = Some(base);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS)
        {   let secs = raw.trim().parse::<u64>()
              .map_err(|_| {
                crate::error::Error::InvalidConfiguration(
                  format!("{} is not a number: {}", ENV_TIMEOUT_SECS, raw)
                )
              })?;
            self.provider.timeout_secs = Some(secs);
        }
        if let Some(raw) = lookup(ENV_MAX_RETRIES)
        {   let retries = raw.trim().parse::<usize>()
              .map_err(|_| {
                crate::error::Error::InvalidConfiguration(
                  format!("{} is not a number: {}", ENV_MAX_RETRIES, raw)
                )
              })?;
            self.retry.max_retries = retries;
        }
        self.validate()
    }

    /// Reject values the transport cannot use
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   if self.default_model.trim().is_empty()
        {   return Err(crate::error::Error::InvalidConfiguration(
              "default_model is empty".to_string()
            ));
        }
        if self.retry.backoff_multiplier < 1.0
        {   return Err(crate::error::Error::InvalidConfiguration(
              "retry.backoff_multiplier must be >= 1.0".to_string()
            ));
        }
        Ok(())
    }
}
