pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod retry;
pub mod batch;
pub mod client;

pub use client::InvokerBackend;
pub use config::InvokerConfig;
pub use error::Error;
pub use providers::{BedrockTransport, HttpTransport, ModelTransport};
pub use request::{BatchRecord, GenerationRequest, GenerationResponse};
pub use retry::{Delay, RetryPolicy, RetryingInvoker, TokioDelay};

/*

bedrock-proxy: text generation against Bedrock Titan (or any HTTP
endpoint speaking the Titan body) that rides out throttling.

src/
├── lib.rs          # Backend channel types, re-exports
├── error.rs        # Error enum; RateLimited is the only retried case
├── config.rs       # Endpoint, retry and generation configuration
├── request.rs      # Request / response / batch record types
├── retry.rs        # RetryPolicy and RetryingInvoker
├── batch.rs        # Prompt files in, results file out
├── client.rs       # Spawned backend processing one command at a time
├── providers/
│   ├── mod.rs      # ModelTransport trait
│   ├── titan.rs    # Titan JSON codec
│   ├── bedrock.rs  # InvokeModel transport
│   └── http.rs     # reqwest transport
└── main.rs         # CLI

*/

/// BACKEND API INTERFACE:

// ===== SendPrompt =====

pub type SendPromptReply
  = Result<GenerationResponse, crate::error::Error>;
pub type SendPromptReplySender
  = tokio::sync::mpsc::UnboundedSender<SendPromptReply>;

pub struct SendPromptArgs
{   pub request: GenerationRequest
  , pub reply: SendPromptReplySender
}

// ===== RunBatch =====

pub type RunBatchReply
  = Result<Vec<BatchRecord>, crate::error::Error>;
pub type RunBatchReplySender
  = tokio::sync::mpsc::UnboundedSender<RunBatchReply>;

pub struct RunBatchArgs
{   pub prompts: Vec<String>
  , pub reply: RunBatchReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== InvokerCommand =====

/// Everything the backend can be asked to do. One channel
/// carries all of them so commands run in the order sent.
pub enum InvokerCommand
{   SendPrompt(SendPromptArgs)
  , RunBatch(RunBatchArgs)
  , KillProcess(KillProcessArgs)
}

// ===== InvokerHand (sender side) =====

pub struct InvokerHand
{   pub command_tx
      : tokio::sync::mpsc::UnboundedSender<InvokerCommand>
}

// ===== InvokerFoot (receiver side) =====

pub struct InvokerFoot
{   pub command_rx
      : tokio::sync::mpsc::UnboundedReceiver<InvokerCommand>
}
