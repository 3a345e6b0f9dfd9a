//! Concrete text generation transports

pub mod mistral;

// Re-export for convenience
pub use mistral::MistralClient;
