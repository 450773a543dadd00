use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use log::{debug, error, info};

use crate::{InvokerCommand, InvokerFoot};
use crate::config::GenerationConfig;
use crate::providers::ModelTransport;
use crate::retry::{Delay, RetryingInvoker};

/// Public API for the invoker backend - owns the task
pub struct InvokerBackend
{   hand: crate::InvokerHand
  , cancel: CancellationToken
  , _task_handle: tokio::task::JoinHandle<()>
}

impl InvokerBackend
{   /// Create and spawn a new backend around `invoker`.
    /// Returns immediately - spawns background task
    pub fn new<T, D>(
      invoker: RetryingInvoker<T, D>
    , generation: GenerationConfig
    ) -> Self
    where
      T: ModelTransport + 'static
    , D: Delay + 'static
    {   debug!("Creating InvokerBackend with task ownership");

        let (command_tx, command_rx)
          = mpsc::unbounded_channel();

        let hand = crate::InvokerHand { command_tx };
        let foot = crate::InvokerFoot { command_rx };

        let cancel = invoker.cancellation_token();
        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, invoker, generation).await
        });

        InvokerBackend
        {   hand
          , cancel
          , _task_handle
        }
    }

    /// Queue one request - returns almost immediately
    pub fn send_prompt(
      &self
    , request: crate::GenerationRequest
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SendPromptReply>,
        crate::error::Error
      >
    {   debug!("send_prompt queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::SendPromptArgs
        {   request
          , reply: reply_tx
        };

        self.hand.command_tx
          .send(InvokerCommand::SendPrompt(cmd))
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Queue a batch of prompts - returns almost immediately
    pub fn run_batch(
      &self
    , prompts: Vec<String>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::RunBatchReply>,
        crate::error::Error
      >
    {   debug!("run_batch queuing {} prompts", prompts.len());
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::RunBatchArgs
        {   prompts
          , reply: reply_tx
        };

        self.hand.command_tx
          .send(InvokerCommand::RunBatch(cmd))
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::Other(
              "Backend disconnected".to_string()
            )
          })?;

        Ok(reply_rx)
    }

    /// Stop the in-flight request and every later one.
    /// Queued commands are answered with `Error::Cancelled`.
    pub fn cancel(&self)
    {   info!("Cancelling invoker backend");
        self.cancel.cancel();
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down InvokerBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.command_tx
          .send(InvokerCommand::KillProcess(cmd))
          .map_err(|_| {
            error!("Backend channel already closed");
            crate::error::Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend shutdown timeout");
            Err(crate::error::Error::Other(
              "Backend stopped without confirming shutdown".to_string()
            ))
        }
    }
}

/// Main backend event loop
///
/// Commands are taken first in, first out, and each is resolved
/// completely, including any backoff, before the next is received.
async fn run_backend_loop<T, D>(
  foot: crate::InvokerFoot
, invoker: RetryingInvoker<T, D>
, generation: GenerationConfig
)
where
  T: ModelTransport
, D: Delay
{   debug!("Starting InvokerBackend event loop");
    let InvokerFoot { mut command_rx } = foot;

    loop
    { match command_rx.recv().await
      {   Some(InvokerCommand::SendPrompt(cmd)) => {
            debug!("Processing SendPrompt");
            let result = invoker.invoke(&cmd.request).await;
            let _ = cmd.reply.send(result);
          }
        , Some(InvokerCommand::RunBatch(cmd)) => {
            debug!("Processing RunBatch of {}", cmd.prompts.len());
            let result = crate::batch::run_batch(
              &invoker,
              &cmd.prompts,
              &generation
            ).await;
            let _ = cmd.reply.send(result);
          }
        , Some(InvokerCommand::KillProcess(cmd)) => {
            debug!("Processing KillProcess");
            let _ = cmd.reply.send(Ok(()));
            info!("InvokerBackend shutting down");
            break;
          }
        , None => {
            debug!("Command channel closed");
            break;
          }
      }
    }
}
