use crate::config::Settings;
use crate::domain::contract::BillingUsageRow;
use crate::ingest::UsageSource;
use crate::time::window::UsageWindow;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/usage";

/// Credentials attached to every request. Both are pre-issued; nothing here exchanges them.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Credentials<'a> {
    pub api_key: Option<&'a str>,
    pub bearer_token: Option<&'a str>,
}

/// A fixed JSON GET endpoint: URL, headers and client are resolved once at construction.
#[derive(Debug, Clone)]
pub(crate) struct JsonEndpoint {
    label: &'static str,
    http: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl JsonEndpoint {
    pub(crate) fn new(
        label: &'static str,
        url: String,
        credentials: Credentials<'_>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = credentials.api_key {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(api_key)
                    .with_context(|| format!("{label} api key is not a valid header value"))?,
            );
        }
        if let Some(token) = credentials.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .with_context(|| format!("{label} bearer token is not a valid header value"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .with_context(|| format!("failed to build {label} http client"))?;

        Ok(Self {
            label,
            http,
            url,
            headers,
        })
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// GET the endpoint and return its JSON body. Non-2xx responses are errors carrying the body.
    pub(crate) async fn get_json(&self, query: &[(&str, String)]) -> Result<Value> {
        let res = self
            .http
            .get(&self.url)
            .headers(self.headers.clone())
            .query(query)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.label))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read {} response", self.label))?;
        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("{} response is not valid JSON: {text}", self.label))?;

        if !status.is_success() {
            anyhow::bail!("{} HTTP {status}: {raw_json}", self.label);
        }

        Ok(raw_json)
    }
}

/// `base` with exactly one slash before `path`.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Pulls usage rows from an HTTP endpoint that already speaks the billing row JSON shape.
/// Token exchange and retries belong to whatever fronts that endpoint.
#[derive(Debug, Clone)]
pub struct HttpJsonUsageSource {
    endpoint: JsonEndpoint,
}

impl HttpJsonUsageSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let path = settings
            .usage_source_path
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_PATH);

        let endpoint = JsonEndpoint::new(
            "usage source",
            join_url(settings.require_usage_source_url()?, path),
            Credentials {
                api_key: settings.usage_source_api_key.as_deref(),
                bearer_token: None,
            },
            settings
                .usage_source_timeout_secs
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )?;

        Ok(Self { endpoint })
    }
}

#[async_trait::async_trait]
impl UsageSource for HttpJsonUsageSource {
    fn source_name(&self) -> &'static str {
        "http_json"
    }

    async fn fetch_usage(&self, window: &UsageWindow) -> Result<Vec<BillingUsageRow>> {
        tracing::info!(
            url = %self.endpoint.url(),
            start_date = %window.start_date,
            end_date = %window.end_date,
            "fetching usage rows"
        );

        let raw_json = self
            .endpoint
            .get_json(&[
                ("start_date", window.start_date.to_string()),
                ("end_date", window.end_date.to_string()),
            ])
            .await?;

        serde_json::from_value::<Vec<BillingUsageRow>>(raw_json)
            .context("failed to parse usage source response into usage rows")
    }
}
