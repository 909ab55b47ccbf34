use anyhow::Context;
use chrono::{DateTime, Utc};
use ri_advisor_core::analysis;
use ri_advisor_core::config::Settings;
use ri_advisor_core::ingest;
use ri_advisor_core::report::{self, directory::DirectorySink, ReportSink};
use ri_advisor_core::time::window::{resolve_usage_window, DEFAULT_WINDOW_DAYS};

const DEFAULT_REPORT_DIR: &str = ".";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub input: Option<String>,
    pub end_date: Option<String>,
    pub threshold: Option<String>,
    pub skip_missing_keys: bool,
    pub output_dir: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub summaries: usize,
    pub recommendations: usize,
    pub stored: Vec<String>,
}

/// Fetch usage, analyze it and store the rendered reports.
pub async fn run(
    settings: &Settings,
    opts: &RunOptions,
    now: DateTime<Utc>,
) -> anyhow::Result<RunReport> {
    // Bad config must fail before anything is fetched.
    let config = settings.analysis_config(opts.threshold.as_deref(), opts.skip_missing_keys)?;

    let window = resolve_usage_window(
        opts.end_date.as_deref(),
        now,
        settings.usage_window_days.unwrap_or(DEFAULT_WINDOW_DAYS),
    )?;

    let source = ingest::source_from_settings(settings, opts.input.as_deref())?;
    tracing::info!(
        source = source.source_name(),
        start_date = %window.start_date,
        end_date = %window.end_date,
        threshold = %config.threshold,
        "fetching usage"
    );

    let rows = source
        .fetch_usage(&window)
        .await
        .with_context(|| format!("failed to fetch usage from {}", source.source_name()))?;
    let row_count = rows.len();

    let outcome = analysis::analyze(rows, &config, now).context("usage analysis failed")?;

    for skipped in &outcome.skipped {
        tracing::warn!(
            index = skipped.index,
            instance_name = ?skipped.instance_name,
            "skipped usage row without reservation id"
        );
    }
    for anomaly in &outcome.anomalies {
        tracing::warn!(
            reservation_id = %anomaly.reservation_id,
            ratio = %anomaly.ratio,
            "{anomaly}"
        );
    }

    tracing::info!(
        rows = row_count,
        summaries = outcome.summaries.len(),
        recommendations = outcome.recommendations.len(),
        skipped = outcome.skipped.len(),
        "usage analyzed"
    );

    let mut artifacts = report::build_artifacts(&outcome.recommendations, now)?;

    if let Some(benefit_source) = ingest::benefit::benefit_source_from_settings(settings)? {
        let raw = benefit_source
            .fetch_benefit_recommendations()
            .await
            .with_context(|| {
                format!(
                    "failed to fetch benefit recommendations from {}",
                    benefit_source.source_name()
                )
            })?;
        artifacts.push(report::benefit_artifact(&raw, now)?);
    }

    let mut stored = Vec::with_capacity(artifacts.len());
    if opts.dry_run {
        tracing::info!(
            dry_run = true,
            artifacts = artifacts.len(),
            "skipping report storage (dry-run)"
        );
    } else {
        let dir = opts
            .output_dir
            .as_deref()
            .or(settings.report_dir.as_deref())
            .unwrap_or(DEFAULT_REPORT_DIR);
        let sink = DirectorySink::new(dir);

        for artifact in &artifacts {
            let location = sink
                .store(artifact)
                .await
                .with_context(|| format!("failed to store {} via {}", artifact.name, sink.sink_name()))?;
            tracing::info!(%location, content_type = artifact.content_type, "stored report");
            stored.push(location);
        }
    }

    Ok(RunReport {
        summaries: outcome.summaries.len(),
        recommendations: outcome.recommendations.len(),
        stored,
    })
}
