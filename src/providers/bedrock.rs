//! Amazon Bedrock runtime transport

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::config::Region;
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, SdkError};
use aws_sdk_bedrockruntime::operation::invoke_model::InvokeModelError;
use aws_sdk_bedrockruntime::primitives::Blob;
use log::{debug, error, trace};

/// Sends bodies to one Bedrock model through `InvokeModel`
#[derive(Debug, Clone)]
pub struct BedrockTransport
{   client: Client
  , model_id: String
}

impl BedrockTransport
{   /// Wrap an already-configured client
    pub fn new(client: Client, model_id: impl Into<String>) -> Self
    {   let model_id = model_id.into();
        debug!("Creating BedrockTransport for {}", model_id);
        BedrockTransport
        {   client
          , model_id
        }
    }

    /// Build a client from the ambient AWS configuration
    /// (environment, profile, instance role)
    pub async fn from_env(
      model_id: impl Into<String>
    , region: Option<String>
    ) -> Self
    {   let mut loader = aws_config::defaults(
          aws_config::BehaviorVersion::latest()
        );
        if let Some(region) = region
        {   debug!("Using region {}", region);
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;
        BedrockTransport::new(Client::new(&sdk_config), model_id)
    }

    pub fn model_id(&self) -> &str
    {   &self.model_id
    }
}

#[async_trait]
impl super::ModelTransport for BedrockTransport
{   async fn invoke(&self, body: Vec<u8>)
      -> Result<Vec<u8>, crate::error::Error>
    {   trace!("InvokeModel {} ({} bytes)", self.model_id, body.len());
        let output = self.client
          .invoke_model()
          .model_id(&self.model_id)
          .content_type("application/json")
          .accept("application/json")
          .body(Blob::new(body))
          .send()
          .await
          .map_err(classify_error)?;

        Ok(output.body().as_ref().to_vec())
    }
}

/// Map an SDK failure onto the throttled / other split
fn classify_error(err: SdkError<InvokeModelError>) -> crate::error::Error
{   if matches!(
      err,
      SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    )
    {   let msg = DisplayErrorContext(&err).to_string();
        error!("Bedrock transport error: {}", msg);
        return crate::error::Error::HttpError(msg);
    }

    let service_err = err.into_service_error();
    if service_err.is_throttling_exception()
    {   return crate::error::Error::RateLimited;
    }

    let msg = DisplayErrorContext(&service_err).to_string();
    error!("Bedrock API error: {}", msg);
    crate::error::Error::ApiError(msg)
}
