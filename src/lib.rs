pub mod error;
pub mod config;
pub mod transport;
pub mod providers;
pub mod retry;
pub mod fetch;
pub mod extract;
pub mod validate;
pub mod request;
pub mod router;
pub mod debug_log;
pub mod contracts;
use serde::{Deserialize, Serialize};

/*

unified_ai turns unreliable model output into results the CRM can
consume: every feature builds a prompt plus the fields it needs, and
gets back either validated data or its own fallback with a reason.

unified_ai/
├── src/
│   ├── lib.rs          # Re-exports and the Mode tag
│   ├── error.rs        # Error taxonomy
│   ├── config.rs       # Model, provider, retry and recorder settings
│   ├── transport.rs    # TextGenerator seam
│   ├── providers/      # Concrete transports (mistral)
│   ├── retry.rs        # Backoff for transport calls
│   ├── fetch.rs        # prompt -> raw text, failure as data
│   ├── extract.rs      # raw text -> JSON object
│   ├── validate.rs     # JSON object -> verdict
│   ├── request.rs      # Request/response shapes
│   ├── router.rs       # fetch -> extract -> validate
│   ├── debug_log.rs    # Append-only interaction log
│   ├── contracts.rs    # Per-feature response contracts
│   └── bin/ai-probe.rs # Operator CLI
└── tests/

*/

pub use error::{Error, ExtractionError};
pub use config::AiConfig;
pub use transport::TextGenerator;
pub use fetch::{fetch, RawTextResult};
pub use extract::{extract, extract_object, CandidateSource, ExtractionResult};
pub use validate::{
  analyse_ai_response, validate, FieldRule, ResponseSchema, ValidationVerdict,
};
pub use request::{AiResponse, PromptRequest, ToolContext, UnifiedAiReply};
pub use router::UnifiedAi;
pub use debug_log::{DebugEvent, DebugLog, EnvCapture, InMemoryDebugLog};

/// Which application feature issued a request.
/// Every mode currently takes the same path through the router;
/// the tag is carried for logs and debug events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub enum Mode
{   /// Personal assistant: drafting, lookups
    #[serde(rename = "PA")]
    Pa
  , /// Sales coaching reports
    Coach
  , /// Lead generation and planning
    Strategist
  , /// Job-alert search
    Alerts
  , /// Call transcript summaries
    Transcriber
  , /// Candidate/opportunity matching
    Matcher
  , /// Anything else
    Utility
}

impl Mode
{   pub const ALL: [Mode; 7] = [
      Mode::Pa
    , Mode::Coach
    , Mode::Strategist
    , Mode::Alerts
    , Mode::Transcriber
    , Mode::Matcher
    , Mode::Utility
    ];

    pub fn as_str(&self) -> &'static str
    {   match self
        {   Mode::Pa => "PA"
          , Mode::Coach => "Coach"
          , Mode::Strategist => "Strategist"
          , Mode::Alerts => "Alerts"
          , Mode::Transcriber => "Transcriber"
          , Mode::Matcher => "Matcher"
          , Mode::Utility => "Utility"
        }
    }
}

impl std::fmt::Display for Mode
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   Mode::ALL
          .into_iter()
          .find(|m| m.as_str().eq_ignore_ascii_case(s))
          .ok_or_else(|| {
            Error::InvalidConfiguration(format!("Unknown mode: {}", s))
          })
    }
}
