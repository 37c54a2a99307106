use std::time::Duration;

use engine::{NarrativeComposer, ProviderError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{join_url, transport};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Minimal client of Gemini's `generateContent` endpoint.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, joined; `None` when there is no text.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!text.is_empty()).then_some(text)
    }
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(timeout).build().map_err(transport)?;
        Ok(Self {
            http,
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_content(&self, text: &str) -> Result<String, ProviderError> {
        let url = join_url(
            &self.base_url,
            &format!("/v1beta/models/{}:generateContent", self.model),
        );
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!("body: {body}");
            return Err(ProviderError::Transport(format!("{} returned {status}", self.model)));
        }

        let response = resp.json::<GenerateResponse>().await.map_err(transport)?;
        response.text().ok_or(ProviderError::Unavailable)
    }
}

/// The narrative composer the bot runs with.
#[derive(Clone, Debug)]
pub enum Composer {
    Gemini(GeminiClient),
    /// No API key configured; every call fails with [`ProviderError::Disabled`].
    Disabled,
}

impl Composer {
    /// Gemini when `api_key` is present and not blank, [`Composer::Disabled`] otherwise.
    pub fn from_api_key(
        api_key: Option<&str>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        match api_key.map(str::trim).filter(|key| !key.is_empty()) {
            Some(key) => Ok(Self::Gemini(GeminiClient::new(key, model, timeout)?)),
            None => Ok(Self::Disabled),
        }
    }
}

impl NarrativeComposer for Composer {
    fn is_enabled(&self) -> bool {
        matches!(self, Self::Gemini(_))
    }

    async fn generate(&self, prompt: &str, context: &str) -> Result<String, ProviderError> {
        match self {
            Self::Gemini(client) => {
                client
                    .generate_content(&format!("{context}\n\nEl usuario pregunta: {prompt}"))
                    .await
            }
            Self::Disabled => Err(ProviderError::Disabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "El dolar oficial"}, {"text": "esta en 36,50 Bs."}], "role": "model"}},
                {"content": {"parts": [{"text": "ignorado"}]}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            response.text().as_deref(),
            Some("El dolar oficial esta en 36,50 Bs.")
        );
    }

    #[test]
    fn empty_response_has_no_text() {
        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(blocked.text(), None);
        let blank: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#)
                .unwrap();
        assert_eq!(blank.text(), None);
    }

    #[test]
    fn blank_key_disables_the_composer() {
        let timeout = Duration::from_secs(1);
        let composer = Composer::from_api_key(Some("  "), "gemini-2.5-flash", timeout).unwrap();
        assert!(!composer.is_enabled());
        let composer = Composer::from_api_key(None, "gemini-2.5-flash", timeout).unwrap();
        assert!(!composer.is_enabled());
    }

    #[tokio::test]
    async fn disabled_composer_refuses() {
        let result = Composer::Disabled.generate("hola", "").await;
        assert_eq!(result, Err(ProviderError::Disabled));
    }

    #[test]
    fn key_enables_the_composer() {
        let composer =
            Composer::from_api_key(Some("secret"), "gemini-2.5-flash", Duration::from_secs(1))
                .unwrap();
        assert!(composer.is_enabled());
        let Composer::Gemini(client) = composer else {
            panic!("expected gemini");
        };
        assert_eq!(client.model(), "gemini-2.5-flash");
    }
}
