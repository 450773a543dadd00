//! Sequential batch inference over a prompt file

use std::path::Path;
use log::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::error::Error;
use crate::providers::ModelTransport;
use crate::request::{BatchInput, BatchRecord, GenerationRequest};
use crate::retry::{Delay, RetryingInvoker};

/// Read prompts from `path`.
///
/// Accepts a single `{"input": [...]}` document, or JSON lines
/// with one such object per line; prompts keep file order.
pub fn read_inputs(path: impl AsRef<Path>) -> Result<Vec<String>, Error>
{   let path = path.as_ref();
    debug!("Reading input file: {}", path.display());
    let raw = std::fs::read_to_string(path)?;
    parse_inputs(&raw)
}

/// Parse prompt file contents; see [`read_inputs`]
pub fn parse_inputs(raw: &str) -> Result<Vec<String>, Error>
{   let doc_err = match serde_json::from_str::<BatchInput>(raw)
    {   Ok(doc) => return Ok(doc.input)
      , Err(e) => e
    };

    let mut prompts = Vec::new();
    for (n, line) in raw.lines().enumerate()
    {   let line = line.trim();
        if line.is_empty()
        {   continue;
        }
        let item: BatchInput = serde_json::from_str(line)
          .map_err(|e| Error::ParseError(format!(
            "not a JSON document ({}); not JSON lines (line {}: {})",
            doc_err, n + 1, e
          )))?;
        prompts.extend(item.input);
    }
    Ok(prompts)
}

/// Invoke every prompt in order.
///
/// A failed item becomes a [`BatchRecord::Failed`] and the batch
/// continues; cancellation aborts the whole batch.
pub async fn run_batch<T, D>(
  invoker: &RetryingInvoker<T, D>
, prompts: &[String]
, generation: &GenerationConfig
) -> Result<Vec<BatchRecord>, Error>
where
  T: ModelTransport
, D: Delay
{   let total = prompts.len();
    info!("Processing {} inputs", total);

    let mut records = Vec::with_capacity(total);
    for (i, prompt) in prompts.iter().enumerate()
    {   debug!("Processing input {}/{}", i + 1, total);
        let request = GenerationRequest::from_config(prompt.as_str(), generation);
        match invoker.invoke(&request).await
        {   Ok(response) => {
              records.push(BatchRecord::Completed(response));
            }
          , Err(Error::Cancelled) => {
              warn!("Batch cancelled at input {}/{}", i + 1, total);
              return Err(Error::Cancelled);
            }
          , Err(e) => {
              warn!("Error processing input {}: {}", i + 1, e);
              records.push(BatchRecord::Failed
              {   error: e.to_string()
              });
            }
        }
    }

    let failed = records.iter().filter(|r| r.is_failed()).count();
    info!("Batch finished: {} ok, {} failed", total - failed, failed);
    Ok(records)
}

/// Write records as a pretty JSON array
pub fn write_results(
  path: impl AsRef<Path>
, records: &[BatchRecord]
) -> Result<(), Error>
{   let path = path.as_ref();
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    info!("Results saved to {}", path.display());
    Ok(())
}
