//! Best-effort JSON object extraction from free-text model output.
//!
//! Candidates are tried in a fixed order and the first one that parses to a
//! JSON object wins:
//!
//! 1. the interior of the first fenced code block, with an optional `json` tag,
//! 2. the whole trimmed text,
//! 3. the span from the first `{` to the last `}`.
//!
//! When the whole text already parses to an object, any fence found is
//! inside a string value, so the fenced candidate is dropped.
//!
//! Arrays and scalars are rejected even when they are valid JSON.

use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ExtractionError;

const FENCE: &str = "```";

/// Which candidate produced the object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource
{   Fenced
  , FullText
  , BraceSpan
}

/// A successfully located JSON object
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted
{   pub object: Map<String, Value>
  , pub source: CandidateSource
  , /// The candidate text that parsed
    pub cleaned_text: String
}

/// Outcome of `extract`. `data` is always a usable `T`: either the
/// parsed payload or the caller's fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult<T>
{   pub data: T
  , pub extraction_error: Option<ExtractionError>
  , pub source: Option<CandidateSource>
  , pub cleaned_text: String
  , /// The parsed object, kept even when it failed to become a `T`
    pub parsed: Option<Map<String, Value>>
}

impl<T> ExtractionResult<T>
{   pub fn is_ok(&self) -> bool
    {   self.extraction_error.is_none()
    }
}

/// Interior of the first fenced block, if the fence is closed
fn fenced_block(text: &str) -> Option<&str>
{   let start = text.find(FENCE)?;
    let after = &text[start + FENCE.len()..];

    // Skip an info string such as `json` when it sits alone on the
    // opening line.
    let body = match after.find('\n')
    {   Some(nl) if after[..nl].trim().chars()
          .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') => {
            &after[nl + 1..]
          }
      , _ => after
    };

    let end = body.find(FENCE)?;
    Some(body[..end].trim())
}

/// First `{` through last `}`
fn brace_span(text: &str) -> Option<&str>
{   let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start
    {   Some(&text[start..=end])
    } else
    {   None
    }
}

fn parses_to_object(text: &str) -> bool
{   matches!(serde_json::from_str::<Value>(text), Ok(Value::Object(_)))
}

fn candidates(trimmed: &str) -> Vec<(CandidateSource, &str)>
{   let mut out = Vec::with_capacity(3);
    if let Some(block) = fenced_block(trimmed)
    {   if parses_to_object(trimmed)
        {   trace!("Fence sits inside a JSON string; skipping fenced candidate");
        } else
        {   out.push((CandidateSource::Fenced, block));
        }
    }
    out.push((CandidateSource::FullText, trimmed));
    if let Some(span) = brace_span(trimmed)
    {   out.push((CandidateSource::BraceSpan, span));
    }
    out
}

/// Locate the first candidate that parses to a JSON object
pub fn extract_object(raw_text: &str)
  -> Result<Extracted, ExtractionError>
{   let trimmed = raw_text.trim();
    if trimmed.is_empty()
    {   debug!("Extraction skipped: empty response");
        return Err(ExtractionError::EmptyResponse);
    }

    for (source, text) in candidates(trimmed)
    {   match serde_json::from_str::<Value>(text)
        {   Ok(Value::Object(object)) => {
              debug!("Extracted JSON object from {:?} candidate", source);
              return Ok(Extracted
              {   object
                , source
                , cleaned_text: text.to_string()
              });
            }
          , Ok(other) => {
              trace!("{:?} candidate is not an object: {}", source, other);
            }
          , Err(e) => {
              trace!("{:?} candidate did not parse: {}", source, e);
            }
        }
    }

    debug!("No candidate parsed to a JSON object");
    Err(ExtractionError::Unparseable)
}

/// Extract and deserialize into `T`, falling back on any failure
pub fn extract<T>(raw_text: &str, fallback: T) -> ExtractionResult<T>
where T: DeserializeOwned
{   match extract_object(raw_text)
    {   Ok(extracted) => {
          let Extracted { object, source, cleaned_text } = extracted;
          match serde_json::from_value::<T>(Value::Object(object.clone()))
          {   Ok(data) => ExtractionResult
              {   data
                , extraction_error: None
                , source: Some(source)
                , cleaned_text
                , parsed: Some(object)
              }
            , Err(e) => {
                debug!("Parsed object does not fit target type: {}", e);
                ExtractionResult
                {   data: fallback
                  , extraction_error: Some(ExtractionError::ShapeMismatch)
                  , source: Some(source)
                  , cleaned_text
                  , parsed: Some(object)
                }
              }
          }
        }
      , Err(e) => ExtractionResult
        {   data: fallback
          , extraction_error: Some(e)
          , source: None
          , cleaned_text: raw_text.trim().to_string()
          , parsed: None
        }
    }
}
