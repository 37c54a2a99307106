//! Contracts of the external collaborators the assistant consults.

use std::future::Future;

use crate::ProviderError;

/// Source of the current exchange rates, in local units per USD.
pub trait RateProvider: Send + Sync {
    fn official_rate(&self) -> impl Future<Output = Result<f64, ProviderError>> + Send;

    fn parallel_rate(&self) -> impl Future<Output = Result<f64, ProviderError>> + Send;
}

/// Text generator answering open questions.
///
/// `context` is assembled by the engine from ledger figures and carries the
/// instructions the answer must follow; `prompt` is the user's question.
pub trait NarrativeComposer: Send + Sync {
    /// `false` when the composer was not configured and every call fails with
    /// [`ProviderError::Disabled`].
    fn is_enabled(&self) -> bool;

    fn generate(
        &self,
        prompt: &str,
        context: &str,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}
