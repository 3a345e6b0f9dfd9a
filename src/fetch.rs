//! Raw response fetcher: one transport call, failure folded into data

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// What the transport produced.
/// `raw_text` is `""` whenever nothing came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTextResult
{   pub raw_text: String
  , pub transport_error: Option<String>
}

impl RawTextResult
{   pub fn is_ok(&self) -> bool
    {   self.transport_error.is_none()
    }
}

/// Call the generator once. Never fails; a transport error is
/// returned as `transport_error` with an empty `raw_text`.
pub async fn fetch<G>(
  generator: &G
, prompt: &str
, model: &str
) -> RawTextResult
where G: crate::transport::TextGenerator + ?Sized
{   debug!("Fetching raw text from model {}", model);
    match generator.generate_text(prompt, model).await
    {   Ok(raw_text) => RawTextResult
        {   raw_text
          , transport_error: None
        }
      , Err(e) => {
          warn!("Transport failed for model {}: {}", model, e);
          RawTextResult
          {   raw_text: String::new()
            , transport_error: Some(e.to_string())
          }
        }
    }
}
