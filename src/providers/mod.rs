//! Remote model transports and the wire codec they carry

pub mod bedrock;
pub mod http;
pub mod titan;

use std::sync::Arc;
use async_trait::async_trait;

pub use bedrock::BedrockTransport;
pub use http::HttpTransport;

/// One outbound call carrying an encoded request body.
///
/// Implementations must report a throttling signal as
/// `Error::RateLimited` and nothing else as that variant.
#[async_trait]
pub trait ModelTransport: Send + Sync
{   async fn invoke(&self, body: Vec<u8>)
      -> Result<Vec<u8>, crate::error::Error>;
}

#[async_trait]
impl<T> ModelTransport for Arc<T>
where
  T: ModelTransport + ?Sized
{   async fn invoke(&self, body: Vec<u8>)
      -> Result<Vec<u8>, crate::error::Error>
    {   (**self).invoke(body).await
    }
}

#[async_trait]
impl<T> ModelTransport for Box<T>
where
  T: ModelTransport + ?Sized
{   async fn invoke(&self, body: Vec<u8>)
      -> Result<Vec<u8>, crate::error::Error>
    {   (**self).invoke(body).await
    }
}
