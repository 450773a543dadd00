//! Request and response types for text generation

use serde::{Deserialize, Serialize};

/// One prompt plus its generation parameters.
///
/// There is no mutating API: the `with_*` methods consume
/// the request and return a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest
{   /// The prompt text
    pub text: String
  , /// Max tokens to generate
    pub max_tokens: u32
  , /// Temperature for sampling
    pub temperature: f32
  , /// Nucleus sampling threshold
    pub top_p: f32
}

impl GenerationRequest
{   /// Create a request with the given prompt and
    /// default generation parameters
    pub fn new(text: impl Into<String>) -> Self
    {   let defaults = crate::config::GenerationConfig::default();
        GenerationRequest::from_config(text, &defaults)
    }

    /// Create a request using configured generation parameters
    pub fn from_config(
      text: impl Into<String>
    , generation: &crate::config::GenerationConfig
    ) -> Self
    {   GenerationRequest
        {   text: text.into()
          , max_tokens: generation.max_tokens
          , temperature: generation.temperature
          , top_p: generation.top_p
        }
    }

    pub fn with_max_tokens(self, max_tokens: u32) -> Self
    {   GenerationRequest { max_tokens, ..self }
    }

    pub fn with_temperature(self, temperature: f32) -> Self
    {   GenerationRequest { temperature, ..self }
    }

    pub fn with_top_p(self, top_p: f32) -> Self
    {   GenerationRequest { top_p, ..self }
    }

    /// Check generation parameters before anything goes out
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   crate::config::check_generation(
          self.max_tokens,
          self.temperature,
          self.top_p
        ).map_err(crate::error::Error::InvalidRequest)
    }
}

/// Generated text and the metadata returned with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse
{   /// Generated text
    pub text: String
  , /// Why generation stopped (e.g. "FINISH", "LENGTH")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_reason: Option<String>
  , /// Tokens in the prompt, as counted by the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_token_count: Option<u32>
  , /// Tokens generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_token_count: Option<u32>
}

/// Outcome of one batch item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchRecord
{   Completed(GenerationResponse)
  , Failed
    {   error: String
    }
}

impl BatchRecord
{   pub fn is_failed(&self) -> bool
    {   matches!(self, BatchRecord::Failed { .. })
    }
}

/// Prompt file layout: `{"input": ["...", "..."]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchInput
{   pub input: Vec<String>
}
