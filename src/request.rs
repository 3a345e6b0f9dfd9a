//! Unified request and response types

use serde::{Deserialize, Serialize};

/// One AI request as a feature issues it
#[derive(Debug, Clone)]
pub struct PromptRequest<T>
{   /// Which feature is asking
    pub mode: crate::Mode
  , /// The prompt text
    pub prompt: String
  , /// Value handed back whenever the response can't be trusted
    pub fallback: T
  , /// Fields the response must carry
    pub schema: crate::validate::ResponseSchema
  , /// Model override; the configured default is used otherwise
    pub model: Option<String>
}

impl<T> PromptRequest<T>
{   pub fn new(
      mode: crate::Mode
    , prompt: impl Into<String>
    , fallback: T
    ) -> Self
    {   PromptRequest
        {   mode
          , prompt: prompt.into()
          , fallback
          , schema: crate::validate::ResponseSchema::new()
          , model: None
        }
    }

    /// Require these fields with the default emptiness rule
    pub fn required<I, S>(mut self, names: I) -> Self
    where
      I: IntoIterator<Item = S>
    , S: Into<String>
    {   for name in names
        {   self.schema = self.schema.field(
              crate::validate::FieldRule::required(name)
            );
        }
        self
    }

    pub fn with_schema(
      mut self
    , schema: crate::validate::ResponseSchema
    ) -> Self
    {   self.schema = schema;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.model = Some(model.into());
        self
    }
}

/// Full outcome of one router cycle
#[derive(Debug, Clone, PartialEq)]
pub struct AiResponse<T>
{   pub mode: crate::Mode
  , pub model: String
  , /// Raw generator output, kept on success too
    pub raw_text: String
  , pub transport_error: Option<String>
  , pub verdict: crate::validate::ValidationVerdict<T>
  , pub debug: crate::validate::AnalysisDebug
}

impl<T> AiResponse<T>
{   pub fn ok(&self) -> bool
    {   self.verdict.ok
    }

    pub fn data(&self) -> &T
    {   &self.verdict.data
    }

    pub fn error(&self) -> Option<&str>
    {   self.verdict.error_message.as_deref()
    }

    pub fn into_reply(self) -> UnifiedAiReply<T>
    {   UnifiedAiReply
        {   raw_text: self.raw_text
          , data: self.verdict.data
          , error: self.verdict.error_message
        }
    }
}

/// The slim `{ rawText, data, error? }` shape features consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedAiReply<T>
{   pub raw_text: String
  , pub data: T
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

/// Where a recorded call came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext
{   pub tool_name: String
  , pub location: String
}

impl ToolContext
{   pub fn new(
      tool_name: impl Into<String>
    , location: impl Into<String>
    ) -> Self
    {   ToolContext
        {   tool_name: tool_name.into()
          , location: location.into()
        }
    }
}
