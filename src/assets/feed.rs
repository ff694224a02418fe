//! External asset feed client.
//!
//! The feed serves the full tradable universe as string-keyed records; prices
//! arrive as strings and are parsed explicitly before anything caches them.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::config::FeedConfig;
use crate::models::Asset;

pub const DEFAULT_FEED_URL: &str = "https://woxa-stocks-test-data.yuttanar.workers.dev";

/// Upper bound on a single feed request. A hung feed call degrades to the
/// stale-cache path instead of stalling the request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait AssetFeed: Send + Sync {
    /// Fetch the complete asset list.
    async fn fetch_all(&self) -> Result<Vec<Asset>>;

    /// Fetch assets of a single type via the feed's filtered endpoint.
    async fn fetch_by_type(&self, asset_type: &str) -> Result<Vec<Asset>>;
}

/// Feed payload envelope. Records are decoded individually so one malformed
/// entry cannot take down a whole refresh.
#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// One asset as the feed serializes it. Every field is a string.
#[derive(Debug, Deserialize)]
struct RawFeedAsset {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Current Price")]
    current_price: String,
    #[serde(rename = "Type")]
    asset_type: String,
    #[serde(rename = "Logo URL")]
    logo_url: Option<String>,
}

impl RawFeedAsset {
    /// Convert a raw feed record into an [`Asset`], parsing the price field.
    /// Prices must parse to a finite, non-negative number.
    fn parse(self) -> Result<Asset> {
        let price: f64 = self.current_price.trim().parse().with_context(|| {
            format!(
                "unparseable price {:?} for symbol {}",
                self.current_price, self.symbol
            )
        })?;
        if !price.is_finite() || price < 0.0 {
            return Err(anyhow!(
                "invalid price {price} for symbol {}",
                self.symbol
            ));
        }

        Ok(Asset {
            symbol: self.symbol,
            name: self.name,
            description: self.description,
            price,
            asset_type: self.asset_type,
            logo: self.logo_url,
        })
    }
}

fn parse_record(value: serde_json::Value) -> Result<Asset> {
    let raw: RawFeedAsset =
        serde_json::from_value(value).context("feed record shape mismatch")?;
    raw.parse()
}

/// HTTP implementation of [`AssetFeed`].
///
/// `GET <base>` returns the full universe, `GET <base>/type/{type}` the
/// type-filtered subset. Point `base` at a mock server in tests.
pub struct HttpAssetFeed {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAssetFeed {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build feed HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Self::with_timeout(config.url.clone(), config.fetch_timeout)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<Asset>> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Feed request failed: {url}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Asset feed error: {status} - {body}"));
        }

        let payload: FeedResponse = response
            .json()
            .await
            .context("Malformed asset feed payload")?;

        let mut assets = Vec::with_capacity(payload.data.len());
        for raw in payload.data {
            match parse_record(raw) {
                Ok(asset) => assets.push(asset),
                Err(err) => warn!(error = %err, "skipping malformed feed entry"),
            }
        }

        Ok(assets)
    }
}

#[async_trait::async_trait]
impl AssetFeed for HttpAssetFeed {
    async fn fetch_all(&self) -> Result<Vec<Asset>> {
        self.fetch(&self.base_url).await
    }

    async fn fetch_by_type(&self, asset_type: &str) -> Result<Vec<Asset>> {
        let url = format!("{}/type/{}", self.base_url, asset_type);
        self.fetch(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sample feed record as served by the upstream API.
    const SAMPLE_RECORD: &str = r#"{
        "Symbol": "AAPL",
        "Name": "Apple Inc.",
        "Description": "Consumer electronics",
        "Current Price": "150.25",
        "Type": "stock",
        "Logo URL": "https://logo.example/aapl.png"
    }"#;

    const SAMPLE_RECORD_NO_LOGO: &str = r#"{
        "Symbol": "BTC",
        "Name": "Bitcoin",
        "Description": "Cryptocurrency",
        "Current Price": "42000",
        "Type": "crypto"
    }"#;

    #[test]
    fn test_parse_record() {
        let raw: RawFeedAsset = serde_json::from_str(SAMPLE_RECORD).unwrap();
        let asset = raw.parse().unwrap();

        assert_eq!(asset.symbol, "AAPL");
        assert_eq!(asset.name, "Apple Inc.");
        assert!((asset.price - 150.25).abs() < 1e-9);
        assert_eq!(asset.asset_type, "stock");
        assert_eq!(asset.logo.as_deref(), Some("https://logo.example/aapl.png"));
    }

    #[test]
    fn test_parse_record_without_logo() {
        let raw: RawFeedAsset = serde_json::from_str(SAMPLE_RECORD_NO_LOGO).unwrap();
        let asset = raw.parse().unwrap();
        assert_eq!(asset.logo, None);
        assert!((asset.price - 42000.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_record_trims_price_whitespace() {
        let raw: RawFeedAsset = serde_json::from_str(
            r#"{"Symbol": "X", "Name": "X Corp", "Current Price": " 12.5 ", "Type": "stock"}"#,
        )
        .unwrap();
        let asset = raw.parse().unwrap();
        assert!((asset.price - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_non_numeric_price() {
        let raw: RawFeedAsset = serde_json::from_str(
            r#"{"Symbol": "BAD", "Name": "Bad", "Current Price": "n/a", "Type": "stock"}"#,
        )
        .unwrap();
        assert!(raw.parse().is_err());
    }

    #[test]
    fn test_parse_rejects_negative_price() {
        let raw: RawFeedAsset = serde_json::from_str(
            r#"{"Symbol": "NEG", "Name": "Neg", "Current Price": "-1", "Type": "stock"}"#,
        )
        .unwrap();
        assert!(raw.parse().is_err());
    }

    #[test]
    fn test_parse_missing_description_defaults_empty() {
        let raw: RawFeedAsset = serde_json::from_str(
            r#"{"Symbol": "X", "Name": "X Corp", "Current Price": "1", "Type": "stock"}"#,
        )
        .unwrap();
        let asset = raw.parse().unwrap();
        assert_eq!(asset.description, "");
    }

    #[test]
    fn test_parse_record_rejects_shape_mismatch() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"Symbol": "X", "Name": "X Corp", "Type": "stock"}"#).unwrap();
        assert!(parse_record(value).is_err());
    }

    #[test]
    fn test_envelope_missing_data_is_empty() {
        let payload: FeedResponse = serde_json::from_str("{}").unwrap();
        assert!(payload.data.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let feed = HttpAssetFeed::new("https://feed.example/").unwrap();
        assert_eq!(feed.base_url, "https://feed.example");
    }
}
