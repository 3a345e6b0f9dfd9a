//! Response contracts for the CRM's AI features.
//!
//! Each contract is a typed response, the fields the model must fill,
//! and the empty-shape fallback used when it doesn't. The fallback keeps
//! in-memory state well-typed; it is never meant to be persisted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::PromptRequest;
use crate::validate::ResponseSchema;
use crate::Mode;

pub trait AiContract: DeserializeOwned + Default
{   const MODE: Mode;
    const REQUIRED: &'static [&'static str];

    fn schema() -> ResponseSchema
    {   ResponseSchema::required(Self::REQUIRED.iter().copied())
    }

    fn fallback() -> Self
    {   Self::default()
    }

    /// Request for this contract with its schema and fallback filled in
    fn request(prompt: impl Into<String>) -> PromptRequest<Self>
    {   PromptRequest::new(Self::MODE, prompt, Self::fallback())
          .with_schema(Self::schema())
    }
}

/// Sales coaching report over a period's activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachReport
{   pub kpis: Map<String, Value>
  , pub key_insights: Vec<String>
  , pub strengths: Vec<String>
  , pub weaknesses: Vec<String>
  , pub recommended_actions: Vec<String>
}

impl AiContract for CoachReport
{   const MODE: Mode = Mode::Coach;
    const REQUIRED: &'static [&'static str] = &[
      "kpis"
    , "keyInsights"
    , "strengths"
    , "weaknesses"
    , "recommendedActions"
    ];
}

/// Contact lookup for a school
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails
{   pub contact_name: String
  , pub email: String
  , #[serde(default)]
    pub phone: Option<String>
  , #[serde(default)]
    pub role: Option<String>
}

impl AiContract for ContactDetails
{   const MODE: Mode = Mode::Utility;
    const REQUIRED: &'static [&'static str] = &["contactName", "email"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAlert
{   pub title: String
  , pub school: String
  , #[serde(default)]
    pub location: Option<String>
  , #[serde(default)]
    pub url: Option<String>
  , #[serde(default)]
    pub posted: Option<String>
}

/// Job-alert search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAlertResults
{   pub alerts: Vec<JobAlert>
}

impl AiContract for JobAlertResults
{   const MODE: Mode = Mode::Alerts;
    const REQUIRED: &'static [&'static str] = &["alerts"];
}

/// Drafted outbound email
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDraft
{   pub subject: String
  , pub body: String
}

impl AiContract for EmailDraft
{   const MODE: Mode = Mode::Pa;
    const REQUIRED: &'static [&'static str] = &["subject", "body"];
}

/// Call transcript summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSummary
{   pub summary: String
  , #[serde(default)]
    pub action_items: Vec<String>
}

impl AiContract for TranscriptSummary
{   const MODE: Mode = Mode::Transcriber;
    const REQUIRED: &'static [&'static str] = &["summary"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMatch
{   pub candidate_name: String
  , pub score: f64
  , #[serde(default)]
    pub reasons: Vec<String>
}

/// Candidates ranked against an opportunity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMatches
{   pub matches: Vec<CandidateMatch>
}

impl AiContract for CandidateMatches
{   const MODE: Mode = Mode::Matcher;
    const REQUIRED: &'static [&'static str] = &["matches"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead
{   pub school_name: String
  , pub reason: String
  , #[serde(default)]
    pub next_step: Option<String>
}

/// Lead-generation suggestions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadList
{   pub leads: Vec<Lead>
}

impl AiContract for LeadList
{   const MODE: Mode = Mode::Strategist;
    const REQUIRED: &'static [&'static str] = &["leads"];
}
