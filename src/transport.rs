//! The text generation seam the fetcher calls through

use async_trait::async_trait;
use std::sync::Arc;

/// Anything that can turn a prompt into raw model text.
/// Failures come back as `Err`; the fetcher folds them into data.
#[async_trait]
pub trait TextGenerator: Send + Sync
{   async fn generate_text(
      &self
    , prompt: &str
    , model: &str
    ) -> Result<String, crate::error::Error>;
}

#[async_trait]
impl<G> TextGenerator for Arc<G>
where G: TextGenerator + ?Sized
{   async fn generate_text(
      &self
    , prompt: &str
    , model: &str
    ) -> Result<String, crate::error::Error>
    {   (**self).generate_text(prompt, model).await
    }
}
