use std::time::Duration;

use engine::{ProviderError, RateProvider};
use reqwest::Client;
use serde::Deserialize;

use crate::{join_url, transport};

const OFFICIAL_PATH: &str = "/v1/dolares/oficial";
const PARALLEL_PATH: &str = "/v1/dolares/paralelo";

/// Client of the DolarApi quotes service.
#[derive(Clone, Debug)]
pub struct DolarApi {
    http: Client,
    base_url: String,
}

/// Quote as published by the service. Only the prices are read.
#[derive(Debug, Default, Deserialize)]
struct Quote {
    promedio: Option<f64>,
    venta: Option<f64>,
    compra: Option<f64>,
}

impl Quote {
    /// First positive price among average, sell and buy.
    fn rate(&self) -> Option<f64> {
        [self.promedio, self.venta, self.compra]
            .into_iter()
            .flatten()
            .find(|v| v.is_finite() && *v > 0.0)
    }
}

impl DolarApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(timeout).build().map_err(transport)?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    async fn quote(&self, path: &str) -> Result<f64, ProviderError> {
        let url = join_url(&self.base_url, path);
        let resp = self.http.get(&url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            tracing::debug!("GET {url} returned {status}");
            return Err(ProviderError::Transport(format!("{url}: {status}")));
        }

        let quote = resp.json::<Quote>().await.map_err(transport)?;
        quote.rate().ok_or(ProviderError::Unavailable)
    }
}

impl RateProvider for DolarApi {
    async fn official_rate(&self) -> Result<f64, ProviderError> {
        self.quote(OFFICIAL_PATH).await
    }

    async fn parallel_rate(&self) -> Result<f64, ProviderError> {
        self.quote(PARALLEL_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(raw: &str) -> Quote {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn average_wins_when_present() {
        let raw = r#"{"fuente":"oficial","nombre":"Oficial","compra":36.1,"venta":36.9,"promedio":36.5,"fechaActualizacion":"2025-11-11T00:00:00.000Z"}"#;
        assert_eq!(quote(raw).rate(), Some(36.5));
    }

    #[test]
    fn falls_back_to_sell_then_buy() {
        assert_eq!(quote(r#"{"promedio":0,"venta":40.2,"compra":39.8}"#).rate(), Some(40.2));
        assert_eq!(quote(r#"{"promedio":null,"compra":39.8}"#).rate(), Some(39.8));
    }

    #[test]
    fn no_positive_price_is_unavailable() {
        assert_eq!(quote(r#"{"promedio":0,"venta":null}"#).rate(), None);
        assert_eq!(Quote::default().rate(), None);
    }
}
