use crate::domain::contract::{parse_usage_rows, BillingUsageRow};
use crate::ingest::UsageSource;
use crate::time::window::UsageWindow;
use anyhow::Context;
use std::path::PathBuf;

/// Reads a pre-fetched usage snapshot (a JSON array of rows). The file is taken as-is; the
/// window only applies to sources that query a billing API.
#[derive(Debug, Clone)]
pub struct FileUsageSource {
    path: PathBuf,
}

impl FileUsageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl UsageSource for FileUsageSource {
    fn source_name(&self) -> &'static str {
        "json_file"
    }

    async fn fetch_usage(&self, _window: &UsageWindow) -> anyhow::Result<Vec<BillingUsageRow>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read usage file {}", self.path.display()))?;
        let rows = parse_usage_rows(&text)
            .with_context(|| format!("failed to parse usage file {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), rows = rows.len(), "loaded usage file");
        Ok(rows)
    }
}
