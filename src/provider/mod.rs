//! Boundary with the generative-AI provider.

mod gemini;
mod mock;

pub use gemini::GeminiProvider;
pub use mock::{MockProvider, Scripted};

use async_trait::async_trait;

use crate::error::Error;
use crate::model::GroundingSource;
use crate::request::ProviderRequest;
use crate::stream::FragmentStream;

/// Complete answer to a non-streaming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }
}

/// Common interface for generative-AI backends.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Answer `request` in one piece.
    async fn generate(&self, request: &ProviderRequest) -> Result<Reply, Error>;

    /// Stream text fragments answering `request`.
    async fn stream(&self, request: &ProviderRequest) -> Result<FragmentStream, Error>;
}
