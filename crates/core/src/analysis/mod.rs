//! Utilization scoring and recommendation generation.
//!
//! Everything under this module is a pure transform over an in-memory batch: no clock reads,
//! no environment access, no logging. Callers own I/O and decide what to do with the
//! [`AnalysisOutcome`].

pub mod aggregate;
pub mod engine;
pub mod error;

use crate::domain::contract::BillingUsageRow;
use crate::domain::recommendation::Recommendation;
use crate::domain::usage::{UsageRecord, UtilizationSummary};
use aggregate::UsageAggregator;
use chrono::{DateTime, Utc};
use engine::RecommendationEngine;
use error::{AnalysisError, AnomalousRatio};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Default utilization ratio below which a reservation is flagged.
pub const DEFAULT_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// What to do with a usage row that has no reservation id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingKeyPolicy {
    /// Fail the whole batch on the first missing key.
    #[default]
    Abort,
    /// Drop the row and report it in [`AnalysisOutcome::skipped`].
    Skip,
}

impl FromStr for MissingKeyPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => anyhow::bail!("unknown missing key policy {other:?} (expected abort|skip)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub threshold: Decimal,
    pub missing_key_policy: MissingKeyPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            missing_key_policy: MissingKeyPolicy::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        engine::validate_threshold(self.threshold)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub index: usize,
    pub instance_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub summaries: BTreeMap<String, UtilizationSummary>,
    pub recommendations: Vec<Recommendation>,
    pub anomalies: Vec<AnomalousRatio>,
    pub skipped: Vec<SkippedRow>,
}

/// Validate rows, aggregate them per reservation and classify the result.
///
/// The config is checked before any row is looked at.
pub fn analyze(
    rows: Vec<BillingUsageRow>,
    config: &AnalysisConfig,
    generated_at: DateTime<Utc>,
) -> Result<AnalysisOutcome, AnalysisError> {
    let engine = RecommendationEngine::new(config.threshold)?;

    let (records, skipped) = collect_records(rows, config.missing_key_policy)?;
    let summaries = UsageAggregator::aggregate(&records)?;
    let anomalies = summaries
        .values()
        .filter_map(UtilizationSummary::anomaly)
        .collect();
    let recommendations = engine.recommend(&summaries, generated_at);

    Ok(AnalysisOutcome {
        summaries,
        recommendations,
        anomalies,
        skipped,
    })
}

pub fn collect_records(
    rows: Vec<BillingUsageRow>,
    policy: MissingKeyPolicy,
) -> Result<(Vec<UsageRecord>, Vec<SkippedRow>), AnalysisError> {
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        let instance_name = row.instance_name.clone();
        match row.validate_and_into_record(index) {
            Ok(record) => records.push(record),
            Err(AnalysisError::MissingKey { .. }) if policy == MissingKeyPolicy::Skip => {
                skipped.push(SkippedRow {
                    index,
                    instance_name,
                });
            }
            Err(err) => return Err(err),
        }
    }

    Ok((records, skipped))
}
