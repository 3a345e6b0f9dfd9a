use thiserror::Error as ThisError;

/// Error type for every stage of the AI pipeline.
/// Implements Clone so it can be sent through reply channels
/// and stored inside results.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error
{   /// API key is missing for a provider/model
    #[error("Missing API key for: {0}")]
    MissingApiKey(String)
  , /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(String)
  , /// API returned an error response
    #[error("API error: {0}")]
    ApiError(String)
  , /// Failed to parse the provider's envelope
    #[error("Parse error: {0}")]
    ParseError(String)
  , /// No choices in API response
    #[error("API response contained no choices")]
    NoChoicesInResponse
  , /// Rate limit exceeded
    #[error("API rate limit exceeded")]
    RateLimitExceeded
  , /// Timeout error
    #[error("Request timed out")]
    Timeout
  , /// The transport actor is gone
    #[error("Transport disconnected: {0}")]
    TransportClosed(String)
  , /// Raw text could not be turned into a JSON object
    #[error("Extraction error: {0}")]
    Extraction(ExtractionError)
  , /// Parsed object lacks required fields
    #[error("Missing required fields: {}", .missing.join(", "))]
    Validation
    {   missing: Vec<String>
    }
  , /// Debug event environment snapshot could not be assembled
    #[error("Environment capture failed: {0}")]
    RecorderCapture(String)
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Generic error
    #[error("Error: {0}")]
    Other(String)
}

impl Error
{   /// Whether the transport may succeed if the call is repeated
    pub fn is_retryable(&self) -> bool
    {   matches!(
          self
        , Error::RateLimitExceeded
          | Error::Timeout
          | Error::HttpError(_)
        )
    }
}

/// Why the extractor fell back
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum ExtractionError
{   #[error("empty response")]
    EmptyResponse
  , #[error("failed to parse JSON")]
    Unparseable
  , /// Parsed to an object, but not one the target type accepts
    #[error("response did not match the expected shape")]
    ShapeMismatch
}

impl From<ExtractionError> for Error
{   fn from(e: ExtractionError) -> Self
    {   Error::Extraction(e)
    }
}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
