use crate::analysis::error::AnalysisError;
use crate::analysis::DEFAULT_THRESHOLD;
use crate::domain::recommendation::{Recommendation, UtilizationTier};
use crate::domain::usage::UtilizationSummary;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

/// Flags reservations whose utilization ratio is strictly below a fixed threshold.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    threshold: Decimal,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl RecommendationEngine {
    pub fn new(threshold: Decimal) -> Result<Self, AnalysisError> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    pub fn classify(&self, summary: &UtilizationSummary) -> Option<UtilizationTier> {
        UtilizationTier::classify(summary.utilization_ratio, self.threshold)
    }

    /// Most idle reservations come first; ties are broken by reservation id.
    pub fn recommend(
        &self,
        summaries: &BTreeMap<String, UtilizationSummary>,
        generated_at: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        let mut flagged: Vec<(&UtilizationSummary, UtilizationTier)> = summaries
            .values()
            .filter_map(|s| self.classify(s).map(|tier| (s, tier)))
            .collect();

        flagged.sort_by(|a, b| {
            a.0.utilization_ratio
                .cmp(&b.0.utilization_ratio)
                .then_with(|| a.0.reservation_id.cmp(&b.0.reservation_id))
        });

        flagged
            .into_iter()
            .map(|(summary, tier)| Recommendation {
                reservation_id: summary.reservation_id.clone(),
                utilization_percent: utilization_percent(summary.utilization_ratio),
                action: tier.action().to_string(),
                generated_at,
            })
            .collect()
    }
}

pub(crate) fn validate_threshold(threshold: Decimal) -> Result<(), AnalysisError> {
    if (Decimal::ZERO..=Decimal::ONE).contains(&threshold) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidThreshold { threshold })
    }
}

/// `ratio * 100` rounded to two places, half to even.
pub fn utilization_percent(ratio: Decimal) -> Decimal {
    (ratio * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
        .normalize()
}
