//! Run one prompt through the router and print the verdict together
//! with the recorded debug event.

use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use serde_json::{json, Value};

use unified_ai::providers::MistralClient;
use unified_ai::{
  AiConfig, DebugLog, EnvCapture, InMemoryDebugLog, Mode, PromptRequest,
  ToolContext, UnifiedAi,
};

#[derive(Debug, Parser)]
#[command(name = "ai-probe", about = "Send a prompt and validate the JSON reply")]
struct Args
{   /// Prompt text
    #[arg(long)]
    prompt: String
  , /// Feature mode tag (PA, Coach, Strategist, Alerts, Transcriber, Matcher, Utility)
    #[arg(long, default_value = "Utility")]
    mode: Mode
  , /// Model override
    #[arg(long)]
    model: Option<String>
  , /// Required response fields, comma separated
    #[arg(long, value_delimiter = ',')]
    require: Vec<String>
  , /// JSON config file
    #[arg(long)]
    config: Option<std::path::PathBuf>
  , /// Tool name recorded on the debug event
    #[arg(long, default_value = "ai-probe")]
    tool: String
  , #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    api_key: Option<String>
}

fn load_config(args: &Args) -> Result<AiConfig, unified_ai::Error>
{   match &args.config
    {   Some(path) => {
          let mut config = AiConfig::from_json_file(path)?;
          config.apply_env(|name| std::env::var(name).ok())?;
          Ok(config)
        }
      , None => AiConfig::from_env()
    }
}

#[tokio::main]
async fn main()
{   dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = match load_config(&args)
    {   Ok(config) => config
      , Err(e) => {
          error!("{}", e);
          std::process::exit(2);
        }
    };

    let client = MistralClient::new(args.api_key.clone(), &config);
    let log = Arc::new(InMemoryDebugLog::new(EnvCapture::new(&config.debug)));
    let ai = UnifiedAi::new(Arc::new(client), config)
      .with_debug_log(log.clone());

    let mut request = PromptRequest::new(
      args.mode
    , args.prompt.clone()
    , Value::Object(Default::default())
    )
      .required(args.require.iter().cloned());
    if let Some(model) = &args.model
    {   request = request.with_model(model.clone());
    }

    let context = ToolContext::new(args.tool.clone(), "ai-probe");
    let response = ai.request_recorded(request, &context).await;
    info!("Request finished ok={}", response.ok());

    let output = json!({
      "ok": response.ok(),
      "data": response.data(),
      "error": response.error(),
      "missingFields": response.verdict.missing_fields,
      "emptyFields": response.verdict.empty_fields,
      "rawText": response.raw_text,
      "events": log.list_newest_first(),
    });
    match serde_json::to_string_pretty(&output)
    {   Ok(text) => println!("{}", text)
      , Err(e) => error!("Could not render output: {}", e)
    }

    if !response.ok()
    {   std::process::exit(1);
    }
}
