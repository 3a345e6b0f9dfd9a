//! Append-only log of AI interactions for the inspection panel.
//!
//! The log is an ordinary value: construct one `InMemoryDebugLog`, wrap
//! it in an `Arc`, and hand it to whatever needs to record or read.
//! Events are stored in insertion order and never modified; the only
//! removal is `clear`.

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::RwLock;
use uuid::Uuid;

const REDACTED: &str = "***";

/// Environment snapshot taken when the event was recorded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment
{   pub env_vars: BTreeMap<String, String>
}

/// One AI request's full lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugEvent
{   pub id: Uuid
  , pub tool_name: String
  , /// Epoch milliseconds
    pub timestamp: i64
  , pub prompt: String
  , pub model: String
  , pub request_payload: Value
  , pub raw_response: Option<Value>
  , pub cleaned_text: String
  , pub parsed_json: Option<Value>
  , pub missing_fields: Vec<String>
  , pub error: Option<String>
  , pub error_stack: Option<String>
  , pub location: String
  , pub environment: Environment
}

impl DebugEvent
{   pub fn new(
      tool_name: impl Into<String>
    , prompt: impl Into<String>
    , model: impl Into<String>
    ) -> Self
    {   let prompt = prompt.into();
        let model = model.into();
        let request_payload = json!({ "prompt": prompt, "model": model });
        DebugEvent
        {   id: Uuid::new_v4()
          , tool_name: tool_name.into()
          , timestamp: Utc::now().timestamp_millis()
          , request_payload
          , prompt
          , model
          , raw_response: None
          , cleaned_text: String::new()
          , parsed_json: None
          , missing_fields: vec![]
          , error: None
          , error_stack: None
          , location: String::new()
          , environment: Environment::default()
        }
    }

    /// Event for a finished router cycle
    pub fn from_analysis(
      context: &crate::request::ToolContext
    , model: &str
    , analysis: &crate::validate::AnalysisDebug
    ) -> Self
    {   let mut event = DebugEvent::new(
          context.tool_name.clone()
        , analysis.prompt.clone()
        , model
        );
        event.location = context.location.clone();
        event.raw_response = Some(Value::String(analysis.raw_text.clone()));
        event.cleaned_text = analysis.cleaned_text.clone();
        event.parsed_json = analysis.parsed_json.clone();
        event.missing_fields = analysis.missing_fields.clone();
        event.error = analysis.error.clone();
        event
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self
    {   self.location = location.into();
        self
    }

    pub fn with_request_payload(mut self, payload: Value) -> Self
    {   self.request_payload = payload;
        self
    }

    pub fn with_raw_response(mut self, raw: Value) -> Self
    {   self.raw_response = Some(raw);
        self
    }

    pub fn with_cleaned_text(mut self, text: impl Into<String>) -> Self
    {   self.cleaned_text = text.into();
        self
    }

    pub fn with_parsed_json(mut self, parsed: Value) -> Self
    {   self.parsed_json = Some(parsed);
        self
    }

    pub fn with_missing_fields(mut self, missing: Vec<String>) -> Self
    {   self.missing_fields = missing;
        self
    }

    pub fn with_error(
      mut self
    , error: impl Into<String>
    , stack: Option<String>
    ) -> Self
    {   self.error = Some(error.into());
        self.error_stack = stack;
        self
    }

    pub fn is_failure(&self) -> bool
    {   self.error.is_some() || !self.missing_fields.is_empty()
    }
}

pub type RuntimeEnvSource = Box<
  dyn Fn() -> Result<Vec<(String, String)>, crate::error::Error>
    + Send
    + Sync
>;

/// Reads the process environment, failing on non-UTF-8 entries
pub fn process_env()
  -> Result<Vec<(String, String)>, crate::error::Error>
{   std::env::vars_os()
      .map(|(k, v)| {
        match (k.into_string(), v.into_string())
        {   (Ok(k), Ok(v)) => Ok((k, v))
          , (Ok(k), Err(_)) => Err(crate::error::Error::RecorderCapture(
              format!("{} is not valid UTF-8", k)
            ))
          , (Err(k), _) => Err(crate::error::Error::RecorderCapture(
              format!("{} is not valid UTF-8", k.to_string_lossy())
            ))
        }
      })
      .collect()
}

/// Builds the `environment` snapshot of a debug event
pub struct EnvCapture
{   build_env: BTreeMap<String, String>
  , prefixes: Vec<String>
  , redact_markers: Vec<String>
  , runtime: RuntimeEnvSource
}

impl EnvCapture
{   pub fn new(config: &crate::config::DebugConfig) -> Self
    {   EnvCapture
        {   build_env: BTreeMap::new()
          , prefixes: config.env_prefixes.clone()
          , redact_markers: config.redact_markers.clone()
          , runtime: Box::new(process_env)
        }
    }

    /// Values fixed at build time, e.g. from `option_env!`
    pub fn with_build_env(mut self, build_env: BTreeMap<String, String>) -> Self
    {   self.build_env = build_env;
        self
    }

    pub fn with_runtime_source(mut self, runtime: RuntimeEnvSource) -> Self
    {   self.runtime = runtime;
        self
    }

    fn wanted(&self, key: &str) -> bool
    {   self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    fn redact(&self, key: &str, value: String) -> String
    {   let upper = key.to_ascii_uppercase();
        if self.redact_markers.iter().any(|m| upper.contains(m.as_str()))
        {   REDACTED.to_string()
        } else
        {   value
        }
    }

    /// Build-time values overlaid with matching runtime values
    pub fn capture(&self)
      -> Result<BTreeMap<String, String>, crate::error::Error>
    {   let mut merged = self.build_env.clone();
        for (key, value) in (self.runtime)()?
        {   if self.wanted(&key)
            {   merged.insert(key, value);
            }
        }
        Ok(merged
          .into_iter()
          .map(|(k, v)| {
            let v = self.redact(&k, v);
            (k, v)
          })
          .collect())
    }
}

impl Default for EnvCapture
{   fn default() -> Self
    {   EnvCapture::new(&crate::config::DebugConfig::default())
    }
}

/// Append/list/clear over a shared event log
pub trait DebugLog: Send + Sync
{   /// Append an event. Never fails.
    fn record(&self, event: DebugEvent);

    /// All events in insertion order
    fn list(&self) -> Vec<DebugEvent>;

    /// Drop every event
    fn clear(&self);

    /// Display order for the panel
    fn list_newest_first(&self) -> Vec<DebugEvent>
    {   let mut events = self.list();
        events.reverse();
        events
    }
}

/// Process-lifetime, unbounded in-memory log
pub struct InMemoryDebugLog
{   events: RwLock<Vec<DebugEvent>>
  , capture: EnvCapture
}

impl InMemoryDebugLog
{   pub fn new(capture: EnvCapture) -> Self
    {   InMemoryDebugLog
        {   events: RwLock::new(Vec::new())
          , capture
        }
    }

    pub fn len(&self) -> usize
    {   self.events.read()
          .unwrap_or_else(|p| p.into_inner())
          .len()
    }

    pub fn is_empty(&self) -> bool
    {   self.len() == 0
    }

    /// Most recently recorded event
    pub fn latest(&self) -> Option<DebugEvent>
    {   self.events.read()
          .unwrap_or_else(|p| p.into_inner())
          .last()
          .cloned()
    }
}

impl Default for InMemoryDebugLog
{   fn default() -> Self
    {   InMemoryDebugLog::new(EnvCapture::default())
    }
}

impl DebugLog for InMemoryDebugLog
{   fn record(&self, mut event: DebugEvent)
    {   if event.environment.env_vars.is_empty()
        {   match self.capture.capture()
            {   Ok(env_vars) => {
                  event.environment = Environment { env_vars };
                }
              , Err(e) => {
                  warn!(
                    "Recording {} without environment: {}",
                    event.tool_name, e
                  );
                }
            }
        }
        debug!("Recording debug event {} for {}", event.id, event.tool_name);
        self.events.write()
          .unwrap_or_else(|p| p.into_inner())
          .push(event);
    }

    fn list(&self) -> Vec<DebugEvent>
    {   self.events.read()
          .unwrap_or_else(|p| p.into_inner())
          .clone()
    }

    fn clear(&self)
    {   debug!("Clearing debug events");
        self.events.write()
          .unwrap_or_else(|p| p.into_inner())
          .clear();
    }
}
