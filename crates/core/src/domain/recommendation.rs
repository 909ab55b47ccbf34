use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Advisory output for a reservation whose utilization fell below the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub reservation_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub utilization_percent: Decimal,
    pub action: String,
    pub generated_at: DateTime<Utc>,
}

/// Classification of a reservation's utilization. Each tier carries its own advisory action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationTier {
    Underutilized,
}

impl UtilizationTier {
    /// Returns `None` when the reservation needs no action. `threshold` is exclusive.
    pub fn classify(ratio: Decimal, threshold: Decimal) -> Option<Self> {
        if ratio < threshold {
            Some(Self::Underutilized)
        } else {
            None
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            Self::Underutilized => {
                "Consider modifying or exchanging this RI to better match workload."
            }
        }
    }
}
