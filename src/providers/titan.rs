//! Amazon Titan text JSON bodies

use serde::{Deserialize, Serialize};
use log::{error, trace};

use crate::request::{GenerationRequest, GenerationResponse};

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanRequest
{   pub input_text: String
  , pub text_generation_config: TextGenerationConfig
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextGenerationConfig
{   pub max_token_count: u32
  , pub temperature: f32
  , pub top_p: f32
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanResponse
{   #[serde(default)]
    pub input_text_token_count: Option<u32>
  , pub results: Vec<TitanResult>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanResult
{   #[serde(default)]
    pub token_count: Option<u32>
  , pub output_text: String
  , #[serde(default)]
    pub completion_reason: Option<String>
}

impl From<&GenerationRequest> for TitanRequest
{   fn from(request: &GenerationRequest) -> Self
    {   TitanRequest
        {   input_text: request.text.clone()
          , text_generation_config: TextGenerationConfig
            {   max_token_count: request.max_tokens
              , temperature: request.temperature
              , top_p: request.top_p
            }
        }
    }
}

/// Serialize a request into a Titan body
pub fn encode(request: &GenerationRequest)
  -> Result<Vec<u8>, crate::error::Error>
{   let body = TitanRequest::from(request);
    trace!("Titan request: {:?}", body);
    Ok(serde_json::to_vec(&body)?)
}

/// Decode a Titan body, keeping the first result
pub fn decode(raw: &[u8])
  -> Result<GenerationResponse, crate::error::Error>
{   let response: TitanResponse
      = serde_json::from_slice(raw).map_err(|e| {
        error!("Parse error: {}", e);
        crate::error::Error::ParseError(e.to_string())
      })?;

    let input_token_count = response.input_text_token_count;
    response.results.into_iter().next()
      .map(|r| GenerationResponse
        {   text: r.output_text
          , completion_reason: r.completion_reason
          , input_token_count
          , output_token_count: r.token_count
        })
      .ok_or_else(|| {
        error!("No results in response");
        crate::error::Error::EmptyResponse
      })
}
