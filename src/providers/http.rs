//! Plain HTTP transport for endpoints that accept the Titan body

use std::time::Duration;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use log::{debug, error, trace};

const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// POSTs bodies to a fixed URL
#[derive(Debug, Clone)]
pub struct HttpTransport
{   url: String
  , api_key: Option<String>
  , http_client: reqwest::Client
}

impl HttpTransport
{   pub fn new(
      url: impl Into<String>
    , api_key: Option<String>
    , timeout: Option<Duration>
    ) -> Result<Self, crate::error::Error>
    {   let url = url.into();
        debug!("Creating HttpTransport for {}", url);
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout
        {   builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| {
          crate::error::Error::InvalidConfiguration(e.to_string())
        })?;
        Ok(HttpTransport
        {   url
          , api_key
          , http_client
        })
    }

    pub fn url(&self) -> &str
    {   &self.url
    }
}

/// True when the response signals rate limiting
pub fn is_throttled(status: StatusCode, headers: &HeaderMap) -> bool
{   if status == StatusCode::TOO_MANY_REQUESTS
    {   return true;
    }
    headers.get(ERROR_TYPE_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(|v| v.starts_with("ThrottlingException"))
      .unwrap_or(false)
}

#[async_trait]
impl super::ModelTransport for HttpTransport
{   async fn invoke(&self, body: Vec<u8>)
      -> Result<Vec<u8>, crate::error::Error>
    {   let mut request = self.http_client
          .post(&self.url)
          .header(CONTENT_TYPE, "application/json")
          .header(ACCEPT, "application/json")
          .body(body);
        if let Some(key) = &self.api_key
        {   request = request.bearer_auth(key);
        }

        let response = request
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        trace!("Endpoint response status: {}", status);

        if is_throttled(status, response.headers())
        {   return Err(crate::error::Error::RateLimited);
        }

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Endpoint error {}: {}", status, error_text);
            return Err(crate::error::Error::ApiError(
              format!("{}: {}", status, error_text)
            ));
        }

        let bytes = response.bytes().await.map_err(|e| {
          error!("Failed to read body: {}", e);
          crate::error::Error::HttpError(e.to_string())
        })?;
        Ok(bytes.to_vec())
    }
}
