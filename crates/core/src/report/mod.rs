pub mod directory;
pub mod render;

use crate::domain::recommendation::Recommendation;
use chrono::{DateTime, Utc};

pub const REPORT_BASENAME: &str = "ri_recommendations";
pub const BENEFIT_BASENAME: &str = "benefit_recommendations";

/// A rendered report ready to be handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Report-sink collaborator (local directory, blob container, mail relay, ...).
#[async_trait::async_trait]
pub trait ReportSink: Send + Sync {
    fn sink_name(&self) -> &'static str;

    /// Returns where the artifact ended up.
    async fn store(&self, artifact: &ReportArtifact) -> anyhow::Result<String>;
}

/// Render the JSON and CSV reports, named after the run timestamp.
pub fn build_artifacts(
    recommendations: &[Recommendation],
    generated_at: DateTime<Utc>,
) -> anyhow::Result<Vec<ReportArtifact>> {
    let stamp = generated_at.format("%Y-%m-%d-%H-%M-%S");

    Ok(vec![
        ReportArtifact {
            name: format!("{REPORT_BASENAME}_{stamp}.json"),
            content_type: "application/json",
            bytes: render::render_json(recommendations)?.into_bytes(),
        },
        ReportArtifact {
            name: format!("{REPORT_BASENAME}_{stamp}.csv"),
            content_type: "text/csv",
            bytes: render::render_csv(recommendations)?,
        },
    ])
}

/// Provider recommendations are stored verbatim, pretty-printed.
pub fn benefit_artifact(
    raw: &serde_json::Value,
    generated_at: DateTime<Utc>,
) -> anyhow::Result<ReportArtifact> {
    use anyhow::Context;

    let stamp = generated_at.format("%Y-%m-%d-%H-%M-%S");
    let text = serde_json::to_string_pretty(raw)
        .context("failed to serialize benefit recommendations")?;

    Ok(ReportArtifact {
        name: format!("{BENEFIT_BASENAME}_{stamp}.json"),
        content_type: "application/json",
        bytes: text.into_bytes(),
    })
}
