//! Configuration for the invoker, its transport and retry behavior

use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use log::debug;

pub const DEFAULT_MODEL_ID: &str = "amazon.titan-text-express-v1";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Where requests are sent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig
{   /// Bedrock model id
    pub model_id: String
  , /// AWS region (falls back to the environment when unset)
    pub region: Option<String>
  , /// Plain HTTP endpoint; when set, Bedrock is bypassed
    pub endpoint_url: Option<String>
  , /// Bearer token for the HTTP endpoint
    pub api_key: Option<String>
  , /// Request timeout in seconds (HTTP endpoint only)
    pub timeout_secs: Option<u64>
}

impl Default for EndpointConfig
{   fn default() -> Self
    {   EndpointConfig
        {   model_id: DEFAULT_MODEL_ID.to_string()
          , region: Some(DEFAULT_REGION.to_string())
          , endpoint_url: None
          , api_key: None
          , timeout_secs: None
        }
    }
}

/// Throttling retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig
{   /// Total calls allowed per request; 0 and 1 both mean no retry
    pub max_attempts: usize
  , /// Upper bound on a single backoff wait, in seconds
    pub backoff_cap_secs: u64
}

impl RetryConfig
{   pub fn backoff_cap(&self) -> Duration
    {   Duration::from_secs(self.backoff_cap_secs)
    }
}

impl Default for RetryConfig
{   fn default() -> Self
    {   RetryConfig
        {   max_attempts: 100
          , backoff_cap_secs: 60
        }
    }
}

/// Default generation parameters for requests built from prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig
{   pub max_tokens: u32
  , pub temperature: f32
  , pub top_p: f32
}

impl Default for GenerationConfig
{   fn default() -> Self
    {   GenerationConfig
        {   max_tokens: 512
          , temperature: 0.7
          , top_p: 0.9
        }
    }
}

impl GenerationConfig
{   /// Reject parameters the remote model would refuse
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   check_generation(self.max_tokens, self.temperature, self.top_p)
          .map_err(crate::error::Error::InvalidConfiguration)
    }
}

/// Shared range checks for configured and per-request parameters
pub(crate) fn check_generation(
  max_tokens: u32
, temperature: f32
, top_p: f32
) -> Result<(), String>
{   if max_tokens == 0
    {   return Err("max_tokens must be positive".to_string());
    }
    if !(0.0..=1.0).contains(&temperature)
    {   return Err(format!("temperature {} outside [0, 1]", temperature));
    }
    if !(top_p > 0.0 && top_p <= 1.0)
    {   return Err(format!("top_p {} outside (0, 1]", top_p));
    }
    Ok(())
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokerConfig
{   #[serde(default)]
    pub endpoint: EndpointConfig
  , #[serde(default)]
    pub retry: RetryConfig
  , #[serde(default)]
    pub generation: GenerationConfig
}

impl Default for InvokerConfig
{   fn default() -> Self
    {   InvokerConfig
        {   endpoint: EndpointConfig::default()
          , retry: RetryConfig::default()
          , generation: GenerationConfig::default()
        }
    }
}

impl InvokerConfig
{   /// Load configuration from a JSON file.
    ///
    /// Sections and keys missing from the file take their
    /// defaults. An empty `model_id` is replaced by the default
    /// model.
    pub fn from_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        let mut config: InvokerConfig = serde_json::from_str(&raw)?;
        if config.endpoint.model_id.is_empty()
        {   config.endpoint.model_id = DEFAULT_MODEL_ID.to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values the remote service or the retry loop
    /// cannot work with
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   use crate::error::Error::InvalidConfiguration;

        if self.retry.backoff_cap_secs == 0
        {   return Err(InvalidConfiguration(
              "backoff_cap_secs must be positive".to_string()
            ));
        }
        self.generation.validate()?;
        if self.endpoint.endpoint_url.is_none()
          && self.endpoint.model_id.is_empty()
        {   return Err(InvalidConfiguration(
              "model_id is required for Bedrock".to_string()
            ));
        }
        Ok(())
    }
}
