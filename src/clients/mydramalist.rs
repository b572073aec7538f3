use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::clients::CatalogClient;
use crate::config::CatalogConfig;
use crate::domain::{DramaId, Quarter};
use crate::models::drama::RawDrama;

const API_KEY_HEADER: &str = "mdl-api-key";

#[derive(Debug, Serialize)]
struct QuarterRequest {
    year: i32,
    quarter: String,
}

#[derive(Clone)]
pub struct MyDramaListClient {
    client: Client,
    base_url: String,
}

impl MyDramaListClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let mut value =
                HeaderValue::from_str(&config.api_key).context("Invalid MyDramaList API key")?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
            .build()
            .context("Failed to build MyDramaList HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends `request` and returns the parsed body, `None` on 404.
    async fn send(&self, request: RequestBuilder) -> Result<Option<Value>> {
        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("MyDramaList API error: {} - {}", status, body));
        }

        Ok(Some(response.json().await?))
    }
}

#[async_trait::async_trait]
impl CatalogClient for MyDramaListClient {
    async fn fetch_by_id(&self, id: DramaId) -> Result<Option<RawDrama>> {
        let url = self.endpoint(&format!("titles/{id}"));
        debug!(%id, "Fetching title");

        Ok(self.send(self.client.get(url)).await?.map(RawDrama::new))
    }

    async fn fetch_by_year_quarter(&self, year: i32, quarter: Quarter) -> Result<Vec<RawDrama>> {
        let url = self.endpoint("calendar/quarter");
        let body = QuarterRequest {
            year,
            quarter: quarter.to_string(),
        };
        debug!(year, %quarter, "Fetching quarter calendar");

        let value = self.send(self.client.post(url).json(&body)).await?;
        Ok(value.map(into_items).unwrap_or_default())
    }

    async fn fetch_upcoming_episodes(&self) -> Result<Vec<RawDrama>> {
        let url = self.endpoint("calendar/episodes");
        debug!("Fetching upcoming episodes calendar");

        let value = self.send(self.client.post(url)).await?;
        Ok(value.map(into_items).unwrap_or_default())
    }

    async fn fetch_updates_since(&self, since: NaiveDate) -> Result<Vec<RawDrama>> {
        let url = self.endpoint(&format!("titles/updates/{}", since.format("%Y-%m-%d")));
        debug!(%since, "Fetching title updates");

        let value = self.send(self.client.get(url)).await?;
        Ok(value.map(into_items).unwrap_or_default())
    }
}

/// Listing endpoints answer with either a bare array or `{"items": [...]}`.
fn into_items(value: Value) -> Vec<RawDrama> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items.into_iter().map(RawDrama::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = CatalogConfig {
            base_url: "https://api.example.test/v1/".to_string(),
            ..CatalogConfig::default()
        };
        let client = MyDramaListClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("/titles/5"),
            "https://api.example.test/v1/titles/5"
        );
    }

    #[test]
    fn test_into_items_accepts_both_shapes() {
        let bare = into_items(json!([{"id": 1}, {"id": 2}]));
        assert_eq!(bare.len(), 2);

        let wrapped = into_items(json!({"items": [{"rid": 3}]}));
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].id_field("rid"), Some(DramaId::new(3)));

        assert!(into_items(json!({"error": "nope"})).is_empty());
        assert!(into_items(json!(false)).is_empty());
    }

    #[test]
    fn test_quarter_request_body() {
        let body = QuarterRequest {
            year: 2024,
            quarter: Quarter::Q3.to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"year": 2024, "quarter": "3"})
        );
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let config = CatalogConfig {
            api_key: "bad\nkey".to_string(),
            ..CatalogConfig::default()
        };
        assert!(MyDramaListClient::new(&config).is_err());
    }
}
