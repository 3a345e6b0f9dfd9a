//! Unified AI request router.
//!
//! Every AI-backed feature goes through `UnifiedAi::request`, which runs
//! fetch → extract → validate strictly in sequence and always returns a
//! verdict. `Mode` travels with the request for logging only; all modes
//! share this one code path.

use std::sync::Arc;
use log::{debug, trace, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::debug_log::{DebugEvent, DebugLog};
use crate::request::{AiResponse, PromptRequest, ToolContext, UnifiedAiReply};
use crate::validate::{
  check_fields, validate, AnalysisDebug, ValidationVerdict,
};

/// Single entry point binding transport, extractor and validator
#[derive(Clone)]
pub struct UnifiedAi
{   generator: Arc<dyn crate::transport::TextGenerator>
  , config: crate::config::AiConfig
  , debug_log: Option<Arc<dyn DebugLog>>
}

impl UnifiedAi
{   pub fn new(
      generator: Arc<dyn crate::transport::TextGenerator>
    , config: crate::config::AiConfig
    ) -> Self
    {   debug!("Creating UnifiedAi with default model {}", config.default_model);
        UnifiedAi
        {   generator
          , config
          , debug_log: None
        }
    }

    /// Attach the shared log that `request_recorded` appends to
    pub fn with_debug_log(mut self, log: Arc<dyn DebugLog>) -> Self
    {   self.debug_log = Some(log);
        self
    }

    pub fn config(&self) -> &crate::config::AiConfig
    {   &self.config
    }

    pub fn debug_log(&self) -> Option<&Arc<dyn DebugLog>>
    {   self.debug_log.as_ref()
    }

    /// Run one request/response cycle. Never fails; every failure
    /// ends in a verdict with `ok = false`.
    pub async fn request<T>(&self, req: PromptRequest<T>) -> AiResponse<T>
    where T: DeserializeOwned
    {   let PromptRequest { mode, prompt, fallback, schema, model } = req;
        let model = model
          .unwrap_or_else(|| self.config.default_model.clone());
        debug!("AI request mode={} model={}", mode, model);

        let fetched = crate::fetch::fetch(
          self.generator.as_ref()
        , &prompt
        , &model
        ).await;
        trace!("Raw text for {}: {}", mode, fetched.raw_text);

        let (verdict, cleaned_text, parsed_json) = match &fetched.transport_error
        {   Some(transport_error) => {
              let report = check_fields(&Default::default(), &schema);
              let verdict = ValidationVerdict::failed(
                fallback
              , report
              , transport_error.clone()
              );
              (verdict, String::new(), None)
            }
          , None => match crate::extract::extract_object(&fetched.raw_text)
            {   Ok(extracted) => {
                  let verdict = validate(
                    &fetched.raw_text
                  , &extracted.object
                  , &schema
                  , fallback
                  , &prompt
                  );
                  ( verdict
                  , extracted.cleaned_text
                  , Some(Value::Object(extracted.object))
                  )
                }
              , Err(e) => {
                  let report = check_fields(&Default::default(), &schema);
                  let verdict = ValidationVerdict::failed(
                    fallback
                  , report
                  , e.to_string()
                  );
                  (verdict, fetched.raw_text.trim().to_string(), None)
                }
            }
        };

        if let Some(message) = &verdict.error_message
        {   warn!("AI request mode={} failed: {}", mode, message);
        }

        let debug = AnalysisDebug
        {   prompt
          , raw_text: fetched.raw_text.clone()
          , cleaned_text
          , parsed_json
          , missing_fields: verdict.missing_fields.clone()
          , empty_fields: verdict.empty_fields.clone()
          , error: verdict.error_message.clone()
        };

        AiResponse
        {   mode
          , model
          , raw_text: fetched.raw_text
          , transport_error: fetched.transport_error
          , verdict
          , debug
        }
    }

    /// `request`, then append a debug event for the call whether it
    /// passed or not. Without an attached log this is `request`.
    pub async fn request_recorded<T>(
      &self
    , req: PromptRequest<T>
    , context: &ToolContext
    ) -> AiResponse<T>
    where T: DeserializeOwned
    {   let response = self.request(req).await;
        if let Some(log) = &self.debug_log
        {   let mut event = DebugEvent::from_analysis(
              context
            , &response.model
            , &response.debug
            );
            event.request_payload = serde_json::json!({
              "mode": response.mode,
              "prompt": response.debug.prompt,
              "model": response.model,
            });
            log.record(event);
        }
        response
    }

    /// The `{ rawText, data, error? }` call with no required fields
    pub async fn call_unified_ai<T>(
      &self
    , mode: crate::Mode
    , prompt: impl Into<String>
    , fallback: T
    ) -> UnifiedAiReply<T>
    where T: DeserializeOwned
    {   self.request(PromptRequest::new(mode, prompt, fallback))
          .await
          .into_reply()
    }
}
