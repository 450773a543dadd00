use std::fmt;

/// Error type for invoker operations.
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Remote service asked us to slow down
    RateLimited
  , /// Remote service returned a non-throttling error
    ApiError(String)
  , /// Transport-level failure (connect, TLS, timeout)
    HttpError(String)
  , /// Failed to encode or decode a body
    ParseError(String)
  , /// Response decoded but carried no generated text
    EmptyResponse
  , /// Still throttled after the last allowed attempt
    RetriesExhausted { attempts: usize }
  , /// Invocation stopped through its cancellation token
    Cancelled
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Generation parameters out of range; nothing was sent
    InvalidRequest(String)
  , /// Reading or writing a local file failed
    Io(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// True for the one failure the invoker retries.
    pub fn is_throttling(&self) -> bool
    {   matches!(self, Error::RateLimited)
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::RateLimited => {
              write!(f, "Request throttled by remote service")
            }
          , Error::ApiError(msg) => {
              write!(f, "API error: {}", msg)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::EmptyResponse => {
              write!(f, "API response contained no results")
            }
          , Error::RetriesExhausted { attempts } => {
              write!(f,
                "Max retries exceeded: still throttled after {} attempts",
                attempts
              )
            }
          , Error::Cancelled => {
              write!(f, "Invocation cancelled")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::InvalidRequest(msg) => {
              write!(f, "Invalid request: {}", msg)
            }
          , Error::Io(msg) => {
              write!(f, "I/O error: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::ParseError(e.to_string())
    }
}

impl From<std::io::Error> for Error
{   fn from(e: std::io::Error) -> Self
    {   Error::Io(e.to_string())
    }
}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
