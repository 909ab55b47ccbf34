pub mod benefit;
pub mod file;
pub mod http;

use crate::config::Settings;
use crate::domain::contract::BillingUsageRow;
use crate::time::window::UsageWindow;

/// Billing-data collaborator. Implementations fetch raw usage rows; validation happens in
/// [`crate::analysis`].
#[async_trait::async_trait]
pub trait UsageSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_usage(&self, window: &UsageWindow) -> anyhow::Result<Vec<BillingUsageRow>>;
}

/// Pick a source: an explicit input file first, then `USAGE_FILE`, then `USAGE_SOURCE_URL`.
pub fn source_from_settings(
    settings: &Settings,
    input_override: Option<&str>,
) -> anyhow::Result<Box<dyn UsageSource>> {
    if let Some(path) = input_override.or(settings.usage_file.as_deref()) {
        return Ok(Box::new(file::FileUsageSource::new(path)));
    }

    if settings.usage_source_url.is_some() {
        return Ok(Box::new(http::HttpJsonUsageSource::from_settings(settings)?));
    }

    anyhow::bail!("either USAGE_FILE or USAGE_SOURCE_URL is required")
}
