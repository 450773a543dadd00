//! bedrock-proxy CLI: single prompts and prompt-file batches.

use std::path::PathBuf;
use std::time::Duration;
use clap::{Parser, Subcommand};
use log::{debug, info};

use bedrock_proxy::{
  BedrockTransport, GenerationRequest, HttpTransport, InvokerConfig,
  ModelTransport, RetryPolicy, RetryingInvoker,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "bedrock-proxy")]
#[command(about = "Text generation against Bedrock Titan with throttling backoff")]
#[command(version)]
struct Args
{   /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>

  , /// Send requests to this HTTP endpoint instead of Bedrock
    #[arg(long)]
    endpoint_url: Option<String>

  , /// Bedrock model id
    #[arg(long)]
    model_id: Option<String>

  , /// AWS region
    #[arg(long)]
    region: Option<String>

  , /// Calls allowed per request while throttled
    #[arg(long)]
    max_attempts: Option<usize>

  , #[command(subcommand)]
    command: Command
}

#[derive(Subcommand, Debug)]
enum Command
{   /// Generate text for one prompt and print it
    Invoke
    {   #[arg(short, long)]
        prompt: String
      , #[arg(long)]
        max_tokens: Option<u32>
      , #[arg(long)]
        temperature: Option<f32>
      , #[arg(long)]
        top_p: Option<f32>
    }
  , /// Run every prompt of an input file and save the results
    Batch
    {   #[arg(short, long)]
        input: PathBuf
      , #[arg(short, long, default_value = "inference_results.json")]
        output: PathBuf
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>>
{   env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    debug!("Effective configuration: {:?}", config);

    let transport = build_transport(&config).await?;
    let invoker = RetryingInvoker::new(
      transport,
      RetryPolicy::from(&config.retry)
    );

    match args.command
    {   Command::Invoke { prompt, .. } => {
          let request = GenerationRequest::from_config(
            prompt,
            &config.generation
          );
          let response = invoker.invoke(&request).await?;
          println!("{}", response.text);
        }
      , Command::Batch { input, output } => {
          let prompts = bedrock_proxy::batch::read_inputs(&input)?;
          let records = bedrock_proxy::batch::run_batch(
            &invoker,
            &prompts,
            &config.generation
          ).await?;
          bedrock_proxy::batch::write_results(&output, &records)?;
        }
    }

    Ok(())
}

/// File (or defaults), then command-line overrides
fn load_config(args: &Args)
  -> Result<InvokerConfig, bedrock_proxy::Error>
{   let mut config = match &args.config
    {   Some(path) => InvokerConfig::from_file(path)?
      , None => InvokerConfig::default()
    };

    if let Some(url) = &args.endpoint_url
    {   config.endpoint.endpoint_url = Some(url.clone());
    }
    if let Some(model_id) = &args.model_id
    {   config.endpoint.model_id = model_id.clone();
    }
    if let Some(region) = &args.region
    {   config.endpoint.region = Some(region.clone());
    }
    if let Some(max_attempts) = args.max_attempts
    {   config.retry.max_attempts = max_attempts;
    }
    if let Command::Invoke { max_tokens, temperature, top_p, .. }
      = &args.command
    {   let generation = &mut config.generation;
        if let Some(v) = max_tokens
        {   generation.max_tokens = *v;
        }
        if let Some(v) = temperature
        {   generation.temperature = *v;
        }
        if let Some(v) = top_p
        {   generation.top_p = *v;
        }
    }

    config.validate()?;
    Ok(config)
}

async fn build_transport(config: &InvokerConfig)
  -> Result<Box<dyn ModelTransport>, bedrock_proxy::Error>
{   let endpoint = &config.endpoint;
    match &endpoint.endpoint_url
    {   Some(url) => {
          info!("Using HTTP endpoint {}", url);
          let transport = HttpTransport::new(
            url.clone(),
            endpoint.api_key.clone(),
            endpoint.timeout_secs.map(Duration::from_secs)
          )?;
          Ok(Box::new(transport))
        }
      , None => {
          info!("Using Bedrock model {}", endpoint.model_id);
          let transport = BedrockTransport::from_env(
            endpoint.model_id.clone(),
            endpoint.region.clone()
          ).await;
          Ok(Box::new(transport))
        }
    }
}
