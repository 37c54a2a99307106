//! HTTP implementations of the engine's provider contracts.
//!
//! - [`DolarApi`] reads the official and parallel rates.
//! - [`Composer`] answers open questions through Gemini, or refuses every
//!   call when no API key is configured.

use engine::ProviderError;

mod dolar_api;
mod gemini;

pub use dolar_api::DolarApi;
pub use gemini::{Composer, GeminiClient};

pub(crate) fn transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Transport(err.to_string())
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
