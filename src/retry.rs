//! Throttling retry with capped exponential backoff

use std::time::Duration;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use log::{debug, trace, warn};

use crate::error::Error;
use crate::providers::ModelTransport;
use crate::request::{GenerationRequest, GenerationResponse};

/// Retry policy for throttled requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy
{   pub max_attempts: usize
  , pub backoff_cap: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_attempts: usize
    , backoff_cap: Duration
    ) -> Self
    {   RetryPolicy
        {   max_attempts
          , backoff_cap
        }
    }

    /// Number of calls a request may make. Zero is treated as one.
    pub fn effective_attempts(&self) -> usize
    {   self.max_attempts.max(1)
    }

    /// Wait before the call with zero-based index `attempt`:
    /// `min(2^attempt, cap)` seconds.
    pub fn backoff_for_attempt(
      &self
    , attempt: usize
    ) -> Duration
    {   let secs = u32::try_from(attempt)
          .ok()
          .and_then(|exp| 2u64.checked_pow(exp))
          .unwrap_or(u64::MAX);
        Duration::from_secs(secs).min(self.backoff_cap)
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   let config = crate::config::RetryConfig::default();
        RetryPolicy::from(&config)
    }
}

impl From<&crate::config::RetryConfig> for RetryPolicy
{   fn from(config: &crate::config::RetryConfig) -> Self
    {   RetryPolicy::new(config.max_attempts, config.backoff_cap())
    }
}

/// Suspends the caller between attempts
#[async_trait]
pub trait Delay: Send + Sync
{   async fn delay(&self, duration: Duration);
}

/// Real waiting on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay
{   async fn delay(&self, duration: Duration)
    {   tokio::time::sleep(duration).await;
    }
}

/// Performs one logical inference call, absorbing throttling
pub struct RetryingInvoker<T, D = TokioDelay>
{   transport: T
  , policy: RetryPolicy
  , delay: D
  , cancel: CancellationToken
}

impl<T> RetryingInvoker<T, TokioDelay>
where
  T: ModelTransport
{   pub fn new(transport: T, policy: RetryPolicy) -> Self
    {   RetryingInvoker::with_delay(transport, policy, TokioDelay)
    }
}

impl<T, D> RetryingInvoker<T, D>
where
  T: ModelTransport
, D: Delay
{   /// Create an invoker with an explicit delay implementation
    pub fn with_delay(
      transport: T
    , policy: RetryPolicy
    , delay: D
    ) -> Self
    {   debug!(
          "Creating invoker: max_attempts={}, backoff_cap={:?}",
          policy.max_attempts, policy.backoff_cap
        );
        RetryingInvoker
        {   transport
          , policy
          , delay
          , cancel: CancellationToken::new()
        }
    }

    /// Replace the cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self
    {   self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken
    {   self.cancel.clone()
    }

    pub fn policy(&self) -> &RetryPolicy
    {   &self.policy
    }

    pub fn transport(&self) -> &T
    {   &self.transport
    }

    /// Invoke the remote model once, retrying only on throttling.
    /// A request with out-of-range parameters fails without a call.
    pub async fn invoke(
      &self
    , request: &GenerationRequest
    ) -> Result<GenerationResponse, Error>
    {   request.validate()?;
        let body = crate::providers::titan::encode(request)?;
        let attempts = self.policy.effective_attempts();

        for attempt in 0..attempts
        {   if self.cancel.is_cancelled()
            {   debug!("Invocation cancelled before attempt {}", attempt);
                return Err(Error::Cancelled);
            }

            if attempt > 0
            {   let wait = self.policy.backoff_for_attempt(attempt);
                trace!("Backing off {:?} before attempt {}", wait, attempt);
                tokio::select!
                { _ = self.delay.delay(wait) => {}
                , _ = self.cancel.cancelled() => {
                    debug!("Invocation cancelled during backoff");
                    return Err(Error::Cancelled);
                  }
                }
            }

            match self.transport.invoke(body.clone()).await
            {   Ok(raw) => {
                  trace!("Attempt {} succeeded", attempt);
                  return crate::providers::titan::decode(&raw);
                }
              , Err(e) if e.is_throttling() => {
                  warn!(
                    "Throttled by remote service, retrying {}/{}",
                    attempt + 1, attempts
                  );
                }
              , Err(e) => {
                  debug!("Non-retryable failure on attempt {}: {}", attempt, e);
                  return Err(e);
                }
            }
        }

        Err(Error::RetriesExhausted { attempts })
    }

    /// Invoke each request in order, stopping at the first error
    pub async fn invoke_all(
      &self
    , requests: &[GenerationRequest]
    ) -> Result<Vec<GenerationResponse>, Error>
    {   debug!("Invoking {} requests sequentially", requests.len());
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests
        {   responses.push(self.invoke(request).await?);
        }
        Ok(responses)
    }
}
