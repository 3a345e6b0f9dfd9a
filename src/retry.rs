//! Retry logic for transport calls

use std::future::Future;
use std::time::Duration;
use log::{debug, warn};

/// Retry policy for failed transport requests
#[derive(Debug, Clone)]
pub struct RetryPolicy
{   pub max_retries: usize
  , pub backoff_multiplier: f32
  , pub initial_backoff: Duration
}

impl RetryPolicy
{   /// Create a new retry policy
    pub fn new(
      max_retries: usize
    , backoff_multiplier: f32
    , initial_backoff_ms: u64
    ) -> Self
    {   RetryPolicy
        {   max_retries
          , backoff_multiplier
          , initial_backoff: Duration::from_millis(
              initial_backoff_ms
            )
        }
    }

    /// Policy from config; disabled config means a single attempt
    pub fn from_config(config: &crate::config::RetryConfig) -> Self
    {   let max_retries = if config.enabled
        {   config.max_retries
        } else
        {   0
        };
        RetryPolicy::new(
          max_retries
        , config.backoff_multiplier
        , config.initial_backoff_ms
        )
    }

    /// Calculate backoff duration for attempt number
    pub fn backoff_for_attempt(
      &self
    , attempt: usize
    ) -> Duration
    {   debug!("Calculating backoff for attempt {}", attempt);
        let multiplier 
          = self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(
          (self.initial_backoff.as_millis() as f32 
            * multiplier) as u64
        )
    }

    /// Run `op` until it succeeds, fails with a non-retryable
    /// error, or the retry budget is spent
    pub async fn run<T, F, Fut>(
      &self
    , mut op: F
    ) -> Result<T, crate::error::Error>
    where
      F: FnMut() -> Fut
    , Fut: Future<Output = Result<T, crate::error::Error>>
    {   let mut attempt = 0;
        loop
        {   match op().await
            {   Ok(value) => return Ok(value)
              , Err(e) if e.is_retryable() && attempt < self.max_retries => {
                  let wait = self.backoff_for_attempt(attempt);
                  warn!(
                    "Attempt {} failed ({}), retrying in {:?}",
                    attempt + 1, e, wait
                  );
                  tokio::time::sleep(wait).await;
                  attempt += 1;
                }
              , Err(e) => return Err(e)
            }
        }
    }
}

impl Default for RetryPolicy
{   fn default() -> Self
    {   RetryPolicy::new(3, 2.0, 100)
    }
}
