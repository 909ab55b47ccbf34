//! Provider-side RI and savings-plan recommendations.
//!
//! These are the billing platform's own purchase suggestions (Cost Management
//! `benefitRecommendations`). They are passed through untouched next to the utilization report;
//! nothing in [`crate::analysis`] reads them.

use crate::config::Settings;
use crate::ingest::http::{Credentials, JsonEndpoint, DEFAULT_TIMEOUT_SECS};
use anyhow::Result;
use serde_json::Value;

pub const DEFAULT_API_VERSION: &str = "2023-03-01";

#[async_trait::async_trait]
pub trait BenefitRecommendationSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_benefit_recommendations(&self) -> Result<Value>;
}

/// `None` when no benefit recommendations endpoint is configured.
pub fn benefit_source_from_settings(
    settings: &Settings,
) -> Result<Option<Box<dyn BenefitRecommendationSource>>> {
    if settings.benefit_recommendations_url.is_none() {
        return Ok(None);
    }
    Ok(Some(Box::new(HttpBenefitRecommendationSource::from_settings(
        settings,
    )?)))
}

/// GETs the full `.../providers/Microsoft.CostManagement/benefitRecommendations` URL for a scope.
/// The bearer token must already be issued.
#[derive(Debug, Clone)]
pub struct HttpBenefitRecommendationSource {
    endpoint: JsonEndpoint,
    api_version: String,
}

impl HttpBenefitRecommendationSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let endpoint = JsonEndpoint::new(
            "benefit recommendations",
            settings.require_benefit_recommendations_url()?.to_string(),
            Credentials {
                api_key: None,
                bearer_token: settings.benefit_recommendations_token.as_deref(),
            },
            settings
                .usage_source_timeout_secs
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )?;

        let api_version = settings
            .benefit_recommendations_api_version
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        Ok(Self {
            endpoint,
            api_version,
        })
    }

    fn query(&self) -> [(&'static str, String); 1] {
        [("api-version", self.api_version.clone())]
    }
}

#[async_trait::async_trait]
impl BenefitRecommendationSource for HttpBenefitRecommendationSource {
    fn source_name(&self) -> &'static str {
        "cost_management"
    }

    async fn fetch_benefit_recommendations(&self) -> Result<Value> {
        let raw = self.endpoint.get_json(&self.query()).await?;
        let count = raw
            .get("value")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        tracing::info!(url = %self.endpoint.url(), count, "fetched benefit recommendations");
        Ok(raw)
    }
}
