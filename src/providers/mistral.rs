use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use log::{debug, trace, error, info};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;

const MISTRAL_API_BASE: &str
  = "https://api.mistral.ai/v1";

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MistralChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>
}

#[derive(Debug, Clone, Deserialize)]
pub struct MistralChatResponse
{   pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChatMessage
  , pub finish_reason: Option<String>
}

// ===== Mistral Client Actor =====

pub type GenerateReply = Result<String, crate::error::Error>;

/// Commands for MistralClient actor
pub enum MistralCommand
{   SendPrompt
    {   prompt: String
      , model: String
      , reply: mpsc::UnboundedSender<GenerateReply>
    }
  , SetApiKey
    {   model: Option<String>
      , key: String
      , reply: mpsc::UnboundedSender
        <Result<(), crate::error::Error>>
    }
  , Shutdown
}

/// Everything a single chat call needs. Shared by the spawned
/// per-request tasks so no call waits on another.
pub struct ChatSettings
{   http_client: reqwest::Client
  , api_base: String
  , max_tokens: Option<usize>
  , temperature: Option<f32>
  , retry: crate::retry::RetryPolicy
}

impl ChatSettings
{   pub fn new(config: &crate::config::AiConfig) -> Self
    {   let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.provider.timeout_secs
        {   builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()
          .unwrap_or_else(|e| {
            error!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
          });
        ChatSettings
        {   http_client
          , api_base: config.provider.api_base.clone()
              .unwrap_or_else(|| MISTRAL_API_BASE.to_string())
          , max_tokens: config.provider.max_tokens
          , temperature: config.provider.temperature
          , retry: crate::retry::RetryPolicy::from_config(
              &config.retry
            )
        }
    }

    /// One prompt, retried per policy
    pub async fn send_prompt(
      &self
    , prompt: &str
    , model: &str
    , api_key: &str
    ) -> Result<String, crate::error::Error>
    {   debug!("Handling send_prompt for: {}", model);
        self.retry
          .run(move || self.post_chat(prompt, model, api_key))
          .await
    }

    async fn post_chat(
      &self
    , prompt: &str
    , model: &str
    , api_key: &str
    ) -> Result<String, crate::error::Error>
    {   let request = MistralChatRequest
        {   model: model.to_string()
          , messages: vec![
              ChatMessage
              {   role: "user".to_string()
                , content: prompt.to_string()
              }
            ]
          , max_tokens: self.max_tokens
          , temperature: self.temperature
          , stream: Some(false)
        };

        trace!("Mistral request: {:?}", request);

        let response = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .header("Authorization", format!("Bearer {}", api_key))
          .header("Content-Type", "application/json")
          .json(&request)
          .send()
          .await
          .map_err(classify_send_error)?;

        let status = response.status();
        trace!("Mistral response status: {}", status);

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {   error!("Mistral rate limit hit");
            return Err(crate::error::Error::RateLimitExceeded);
        }

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Mistral API error: {}", error_text);
            return Err(crate::error::Error::ApiError(
              format!("Mistral error ({}): {}", status, error_text)
            ));
        }

        let chat_response: MistralChatResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            if e.is_timeout()
            {   crate::error::Error::Timeout
            } else
            {   crate::error::Error::ParseError(e.to_string())
            }
          })?;

        chat_response.choices.into_iter().next()
          .map(|c| c.message.content)
          .ok_or_else(|| {
            error!("No choices in response");
            crate::error::Error::NoChoicesInResponse
          })
    }
}

/// Map a send failure. Only timeouts and connect/request failures
/// come back as retryable variants.
fn classify_send_error(e: reqwest::Error) -> crate::error::Error
{   error!("HTTP error: {}", e);
    if e.is_timeout()
    {   crate::error::Error::Timeout
    } else if e.is_builder()
    {   crate::error::Error::InvalidConfiguration(e.to_string())
    } else if e.is_connect() || e.is_request()
    {   crate::error::Error::HttpError(e.to_string())
    } else
    {   crate::error::Error::ApiError(e.to_string())
    }
}

/// Mistral client state, owned by the actor task
pub struct MistralClientState
{   master_key: Option<String>
  , model_keys: HashMap<String, String>
  , chat: Arc<ChatSettings>
}

impl MistralClientState
{   pub fn new(
      master_key: Option<String>
    , config: &crate::config::AiConfig
    ) -> Self
    {   debug!("Creating MistralClientState");
        MistralClientState
        {   master_key
          , model_keys: HashMap::new()
          , chat: Arc::new(ChatSettings::new(config))
        }
    }

    fn get_api_key(&self, model: &str)
      -> Result<String, crate::error::Error>
    {   if let Some(key) = self.model_keys.get(model)
        {   debug!("Using model-specific key for: {}", model);
            return Ok(key.clone());
        }

        if let Some(key) = &self.master_key
        {   debug!(
              "Using master key for model: {}",
              model
            );
            return Ok(key.clone());
        }

        error!("No API key for model: {}", model);
        Err(crate::error::Error::MissingApiKey(
          format!("Mistral:{}", model)
        ))
    }

    fn set_api_key(&mut self, model: Option<String>, key: String)
    {   match model
        {   Some(model) => {
              debug!("Setting model key for: {}", model);
              self.model_keys.insert(model, key);
            }
          , None => {
              debug!("Setting master key");
              self.master_key = Some(key);
            }
        }
    }

    /// Resolve the key here, then run the call on its own task so the
    /// loop is free for the next command
    fn dispatch_prompt(
      &self
    , prompt: String
    , model: String
    , reply: mpsc::UnboundedSender<GenerateReply>
    )
    {   let api_key = match self.get_api_key(&model)
        {   Ok(key) => key
          , Err(e) => {
              let _ = reply.send(Err(e));
              return;
            }
        };
        let chat = self.chat.clone();
        tokio::spawn(async move {
          let result = chat
            .send_prompt(&prompt, &model, &api_key)
            .await;
          let _ = reply.send(result);
        });
    }
}

/// Public Mistral client interface
pub struct MistralClient
{   tx: mpsc::UnboundedSender<MistralCommand>
  , _task: tokio::task::JoinHandle<()>
}

impl MistralClient
{   /// Create and spawn a new Mistral client.
    /// Must be called inside a tokio runtime.
    pub fn new(
      api_key: Option<String>
    , config: &crate::config::AiConfig
    ) -> Self
    {   debug!("Creating MistralClient");
        let (cmd_tx, cmd_rx)
          = mpsc::unbounded_channel();
        let state = MistralClientState::new(api_key, config);

        let _task = tokio::spawn(async move {
          run_mistral_loop(cmd_rx, state).await;
        });

        MistralClient
        {   tx: cmd_tx
          , _task
        }
    }

    /// Queue a prompt - returns immediately
    pub fn send_prompt(
      &self
    , prompt: String
    , model: String
    , reply: mpsc::UnboundedSender<GenerateReply>
    ) -> Result<(), crate::error::Error>
    {   debug!("send_prompt queued for model: {}", model);

        self.tx.send(MistralCommand::SendPrompt {
          prompt,
          model,
          reply,
        }).map_err(|_| {
          error!("Mistral client disconnected");
          crate::error::Error::TransportClosed(
            "Mistral client disconnected".to_string()
          )
        })
    }

    /// Set the master key (`None`) or a per-model key, and wait
    /// for the actor to apply it
    pub async fn set_api_key(
      &self
    , model: Option<String>
    , key: String
    ) -> Result<(), crate::error::Error>
    {   debug!("set_api_key queued for model: {:?}", model);
        let (reply, mut reply_rx) = mpsc::unbounded_channel();

        self.tx.send(MistralCommand::SetApiKey {
          model,
          key,
          reply,
        }).map_err(|_| {
          error!("Mistral client disconnected");
          crate::error::Error::TransportClosed(
            "Mistral client disconnected".to_string()
          )
        })?;

        reply_rx.recv().await
          .unwrap_or_else(|| Err(crate::error::Error::TransportClosed(
            "Mistral client dropped reply".to_string()
          )))
    }

    /// Shutdown the client
    pub fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down MistralClient");
        self.tx.send(MistralCommand::Shutdown)
          .map_err(|_| {
            crate::error::Error::TransportClosed(
              "Client already shutdown".to_string()
            )
          })
    }
}

#[async_trait]
impl crate::transport::TextGenerator for MistralClient
{   async fn generate_text(
      &self
    , prompt: &str
    , model: &str
    ) -> Result<String, crate::error::Error>
    {   let (reply, mut reply_rx) = mpsc::unbounded_channel();
        self.send_prompt(prompt.to_string(), model.to_string(), reply)?;
        match reply_rx.recv().await
        {   Some(result) => result
          , None => {
              error!("Mistral client dropped reply");
              Err(crate::error::Error::TransportClosed(
                "Mistral client dropped reply".to_string()
              ))
            }
        }
    }
}

/// Main mistral event loop
async fn run_mistral_loop(
  mut cmd_rx: mpsc::UnboundedReceiver<MistralCommand>
, mut state: MistralClientState
)
{   debug!("Starting Mistral client loop");

    loop
    { match cmd_rx.recv().await
      {   Some(MistralCommand::SendPrompt {
            prompt, model, reply
          }) => {
            debug!("Processing SendPrompt");
            state.dispatch_prompt(prompt, model, reply);
          }
        , Some(MistralCommand::SetApiKey {
            model, key, reply
          }) => {
            debug!("Processing SetApiKey for: {:?}", model);
            state.set_api_key(model, key);
            let _ = reply.send(Ok(()));
          }
        , Some(MistralCommand::Shutdown) => {
            info!("Mistral client shutting down");
            break;
          }
        , None => {
            debug!("Command channel closed");
            break;
          }
      }
    }
}
