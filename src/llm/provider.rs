use async_trait::async_trait;

use super::types::GenerationRequest;
use crate::core::errors::ApiError;

/// Seam over the external generative model.
///
/// The provider is a black box: one request in, one generated text body out.
/// Transport failures and timeouts surface as `ApiError::SynthesisFailed`.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Run a single bounded completion call.
    async fn generate(&self, request: GenerationRequest) -> Result<String, ApiError>;
}
