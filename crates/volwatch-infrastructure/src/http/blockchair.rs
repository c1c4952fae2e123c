use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use volwatch_domain::forecast::IndicatorProvider;
use volwatch_domain::shared::DomainError;

use crate::config::TimeoutConfig;

/// Blockchair reports output totals in satoshi
pub const SATOSHI_PER_BTC: f64 = 100_000_000.0;

const VALUE_FIELD: &str = "sum(output_total)";
const USER_AGENT: &str = concat!("volwatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum IndicatorError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("response has no rows")]
    NoRows,

    #[error("field '{0}' missing or not numeric")]
    MissingField(&'static str),

    #[error("value out of range: {0}")]
    OutOfRange(f64),
}

impl From<IndicatorError> for DomainError {
    fn from(err: IndicatorError) -> Self {
        DomainError::ProviderUnavailable(err.to_string())
    }
}

/// Daily BTC output volume from the Blockchair blocks aggregation endpoint
pub struct BlockchairProvider {
    client: Client,
    base_url: Url,
}

impl BlockchairProvider {
    pub fn new(base_url: &str, timeouts: &TimeoutConfig) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, timeouts.http_request)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid indicator URL: {base_url}"))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Query for the UTC calendar date of `now`
    pub fn build_url(&self, now: DateTime<Utc>) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("a", &format!("date,{VALUE_FIELD}"))
            .append_pair("q", &format!("time({})", now.format("%Y-%m-%d")));
        url
    }

    /// Pull the day's total out of `{"data": [{"sum(output_total)": n}]}`,
    /// converted to whole BTC
    pub fn extract_value(body: &serde_json::Value) -> Result<i64, IndicatorError> {
        let row = body
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|rows| rows.first())
            .ok_or(IndicatorError::NoRows)?;

        let raw = row
            .get(VALUE_FIELD)
            .and_then(|v| v.as_f64())
            .ok_or(IndicatorError::MissingField(VALUE_FIELD))?;

        let btc = (raw / SATOSHI_PER_BTC).round();
        if !btc.is_finite() || btc.abs() >= i64::MAX as f64 {
            return Err(IndicatorError::OutOfRange(raw));
        }

        Ok(btc as i64)
    }

    async fn fetch_once(&self, now: DateTime<Utc>) -> Result<i64, IndicatorError> {
        let url = self.build_url(now);
        debug!("Fetching indicator: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IndicatorError::Status(status));
        }

        let body: serde_json::Value = response.json().await?;
        Self::extract_value(&body)
    }
}

#[async_trait]
impl IndicatorProvider for BlockchairProvider {
    async fn fetch_current_value(&self, now: DateTime<Utc>) -> Result<i64, DomainError> {
        match self.fetch_once(now).await {
            Ok(value) => {
                debug!("Indicator value for {}: {} BTC", now.date_naive(), value);
                Ok(value)
            }
            Err(e) => {
                warn!("Indicator fetch failed: {}", e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn provider() -> BlockchairProvider {
        BlockchairProvider::with_timeout(
            "https://api.blockchair.com/bitcoin/blocks",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_build_url_uses_utc_date() {
        let now = Utc.with_ymd_and_hms(2021, 1, 5, 23, 30, 0).unwrap();
        let url = provider().build_url(now);

        assert_eq!(url.host_str(), Some("api.blockchair.com"));
        assert_eq!(url.path(), "/bitcoin/blocks");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "date,sum(output_total)".to_string()),
                ("q".to_string(), "time(2021-01-05)".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_value_scales_and_rounds() {
        let body = json!({
            "data": [{ "date": "2020-06-15", "sum(output_total)": 50_049_999_999i64 }]
        });
        assert_eq!(BlockchairProvider::extract_value(&body).unwrap(), 500);

        let body = json!({ "data": [{ "sum(output_total)": 50_050_000_000i64 }] });
        assert_eq!(BlockchairProvider::extract_value(&body).unwrap(), 501);
    }

    #[test]
    fn test_extract_value_accepts_float_totals() {
        let body = json!({ "data": [{ "sum(output_total)": 1.2e11 }] });
        assert_eq!(BlockchairProvider::extract_value(&body).unwrap(), 1200);
    }

    #[test]
    fn test_extract_value_rejects_empty_rows() {
        let body = json!({ "data": [] });
        assert!(matches!(
            BlockchairProvider::extract_value(&body),
            Err(IndicatorError::NoRows)
        ));

        let body = json!({ "context": { "code": 402 } });
        assert!(matches!(
            BlockchairProvider::extract_value(&body),
            Err(IndicatorError::NoRows)
        ));
    }

    #[test]
    fn test_extract_value_rejects_missing_field() {
        let body = json!({ "data": [{ "date": "2020-06-15" }] });
        assert!(matches!(
            BlockchairProvider::extract_value(&body),
            Err(IndicatorError::MissingField(_))
        ));

        let body = json!({ "data": [{ "sum(output_total)": "lots" }] });
        assert!(BlockchairProvider::extract_value(&body).is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(BlockchairProvider::with_timeout("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_provider_unavailable() {
        // Nothing listens on port 9 of the loopback interface
        let provider =
            BlockchairProvider::with_timeout("http://127.0.0.1:9/blocks", Duration::from_secs(2))
                .unwrap();

        let err = provider.fetch_current_value(Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::ProviderUnavailable(_)));
    }
}
