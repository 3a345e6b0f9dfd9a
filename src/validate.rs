//! Required-field validation of extracted model output

use log::{debug, trace, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decides whether a present value counts as empty
pub type EmptinessPredicate = fn(&Value) -> bool;

/// Default emptiness rule: `null`, exactly `""`, or `[]`.
/// `0`, `false`, `{}` and whitespace strings are present.
pub fn is_blank(value: &Value) -> bool
{   match value
    {   Value::Null => true
      , Value::String(s) => s.is_empty()
      , Value::Array(items) => items.is_empty()
      , _ => false
    }
}

/// One required field and how to tell it is empty
#[derive(Debug, Clone)]
pub struct FieldRule
{   pub name: String
  , pub is_empty: EmptinessPredicate
}

impl FieldRule
{   pub fn required(name: impl Into<String>) -> Self
    {   FieldRule
        {   name: name.into()
          , is_empty: is_blank
        }
    }

    pub fn with_predicate(
      name: impl Into<String>
    , is_empty: EmptinessPredicate
    ) -> Self
    {   FieldRule
        {   name: name.into()
          , is_empty
        }
    }
}

/// Ordered set of required fields
#[derive(Debug, Clone, Default)]
pub struct ResponseSchema
{   fields: Vec<FieldRule>
}

impl ResponseSchema
{   /// No required fields; anything that extracts is accepted
    pub fn new() -> Self
    {   ResponseSchema::default()
    }

    /// Schema of default-rule fields, in the given order
    pub fn required<I, S>(names: I) -> Self
    where
      I: IntoIterator<Item = S>
    , S: Into<String>
    {   names.into_iter()
          .fold(ResponseSchema::new(), |schema, name| {
            schema.field(FieldRule::required(name))
          })
    }

    /// Append a rule; a name already present is ignored
    pub fn field(mut self, rule: FieldRule) -> Self
    {   if self.fields.iter().all(|f| f.name != rule.name)
        {   self.fields.push(rule);
        }
        self
    }

    pub fn fields(&self) -> &[FieldRule]
    {   &self.fields
    }

    pub fn field_names(&self) -> Vec<&str>
    {   self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool
    {   self.fields.is_empty()
    }
}

/// Per-field classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldStatus
{   Present
  , /// Key not in the object at all
    Absent
  , /// Key present but holds an empty/placeholder value
    Empty
}

pub fn field_status(
  object: &Map<String, Value>
, rule: &FieldRule
) -> FieldStatus
{   match object.get(&rule.name)
    {   None => FieldStatus::Absent
      , Some(value) if (rule.is_empty)(value) => FieldStatus::Empty
      , Some(_) => FieldStatus::Present
    }
}

/// Missing fields (absent or empty, both fail) plus the empty subset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport
{   pub missing: Vec<String>
  , pub empty: Vec<String>
}

impl FieldReport
{   pub fn is_complete(&self) -> bool
    {   self.missing.is_empty()
    }
}

pub fn check_fields(
  object: &Map<String, Value>
, schema: &ResponseSchema
) -> FieldReport
{   let mut report = FieldReport::default();
    for rule in schema.fields()
    {   match field_status(object, rule)
        {   FieldStatus::Present => {}
          , FieldStatus::Absent => {
              report.missing.push(rule.name.clone());
            }
          , FieldStatus::Empty => {
              report.missing.push(rule.name.clone());
              report.empty.push(rule.name.clone());
            }
        }
    }
    report
}

/// Result of validation. When `ok` is false, `data` is the fallback
/// and `error_message` says why.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationVerdict<T>
{   pub ok: bool
  , pub data: T
  , pub missing_fields: Vec<String>
  , pub empty_fields: Vec<String>
  , pub error_message: Option<String>
}

impl<T> ValidationVerdict<T>
{   /// Failed verdict carrying the fallback
    pub fn failed(
      fallback: T
    , report: FieldReport
    , error_message: String
    ) -> Self
    {   ValidationVerdict
        {   ok: false
          , data: fallback
          , missing_fields: report.missing
          , empty_fields: report.empty
          , error_message: Some(error_message)
        }
    }

    pub fn into_result(self) -> Result<T, crate::error::Error>
    {   if self.ok
        {   Ok(self.data)
        } else if !self.missing_fields.is_empty()
        {   Err(crate::error::Error::Validation
            {   missing: self.missing_fields
            })
        } else
        {   Err(crate::error::Error::Other(
              self.error_message.unwrap_or_default()
            ))
        }
    }
}

pub fn missing_fields_message(missing: &[String]) -> String
{   format!("Missing required fields: {}", missing.join(", "))
}

/// Check `parsed` against `schema` and convert it into `T`.
/// Pure; never fails, a failure is a verdict with `ok = false`.
pub fn validate<T>(
  raw_text: &str
, parsed: &Map<String, Value>
, schema: &ResponseSchema
, fallback: T
, prompt: &str
) -> ValidationVerdict<T>
where T: DeserializeOwned
{   trace!(
      "Validating {} chars of output for prompt of {} chars",
      raw_text.len(), prompt.len()
    );
    let report = check_fields(parsed, schema);

    if !report.is_complete()
    {   let message = missing_fields_message(&report.missing);
        debug!("{}", message);
        return ValidationVerdict::failed(fallback, report, message);
    }

    match serde_json::from_value::<T>(Value::Object(parsed.clone()))
    {   Ok(data) => ValidationVerdict
        {   ok: true
          , data
          , missing_fields: vec![]
          , empty_fields: vec![]
          , error_message: None
        }
      , Err(e) => {
          warn!("Response passed field check but not deserialization: {}", e);
          ValidationVerdict::failed(
            fallback
          , report
          , format!("Response did not match the expected shape: {}", e)
          )
        }
    }
}

/// Diagnostic payload for the debug panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDebug
{   pub prompt: String
  , pub raw_text: String
  , pub cleaned_text: String
  , pub parsed_json: Option<Value>
  , pub missing_fields: Vec<String>
  , pub empty_fields: Vec<String>
  , pub error: Option<String>
}

/// `validate` plus the debug payload
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis<T>
{   pub ok: bool
  , pub data: T
  , pub debug: AnalysisDebug
}

/// Validation entry point for callers that did their own extraction
pub fn analyse_ai_response<T>(
  raw_text: &str
, parsed: &Map<String, Value>
, schema: &ResponseSchema
, fallback: T
, prompt: &str
) -> Analysis<T>
where T: DeserializeOwned
{   let verdict = validate(raw_text, parsed, schema, fallback, prompt);
    let debug = AnalysisDebug
    {   prompt: prompt.to_string()
      , raw_text: raw_text.to_string()
      , cleaned_text: raw_text.trim().to_string()
      , parsed_json: Some(Value::Object(parsed.clone()))
      , missing_fields: verdict.missing_fields.clone()
      , empty_fields: verdict.empty_fields.clone()
      , error: verdict.error_message.clone()
    };
    Analysis
    {   ok: verdict.ok
      , data: verdict.data
      , debug
    }
}
