use crate::domain::recommendation::Recommendation;
use anyhow::Context;
use chrono::SecondsFormat;

pub const CSV_HEADER: [&str; 4] = ["reservationId", "utilizationPercent", "action", "generatedAt"];

/// Pretty-printed JSON array of recommendations.
pub fn render_json(recommendations: &[Recommendation]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(recommendations).context("failed to serialize recommendations")
}

/// CSV projection with a fixed header row. Emitted even when there are no recommendations.
pub fn render_csv(recommendations: &[Recommendation]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)
        .context("failed to write csv header")?;

    for rec in recommendations {
        let percent = rec.utilization_percent.to_string();
        let generated_at = rec.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        wtr.write_record([
            rec.reservation_id.as_str(),
            percent.as_str(),
            rec.action.as_str(),
            generated_at.as_str(),
        ])
        .with_context(|| format!("failed to write csv row for {}", rec.reservation_id))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush csv report: {}", e.error()))
}
