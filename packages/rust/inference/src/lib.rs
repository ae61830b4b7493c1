//! Generation backend access for listing-rewriter.
//!
//! [`InferenceClient`] posts a prompt to a local Ollama-compatible endpoint and
//! assembles the streamed reply. The pipeline depends only on the
//! [`TextGenerator`] trait so it can be driven by scripted generators in tests.

mod client;
mod stream;

use listing_shared::Result;

pub use client::InferenceClient;
pub use stream::ResponseAccumulator;

/// Anything that turns a prompt into generated text.
///
/// Implementations return [`listing_shared::ListingError::Generation`] for
/// transport failures and for empty output alike.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
