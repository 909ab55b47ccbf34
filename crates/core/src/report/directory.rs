use crate::report::{ReportArtifact, ReportSink};
use anyhow::Context;
use std::path::PathBuf;

/// Writes artifacts into a local directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl ReportSink for DirectorySink {
    fn sink_name(&self) -> &'static str {
        "directory"
    }

    async fn store(&self, artifact: &ReportArtifact) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create report dir {}", self.dir.display()))?;

        let path = self.dir.join(&artifact.name);
        tokio::fs::write(&path, &artifact.bytes)
            .await
            .with_context(|| format!("failed to write report {}", path.display()))?;

        tracing::debug!(path = %path.display(), bytes = artifact.bytes.len(), "report written");
        Ok(path.display().to_string())
    }
}
