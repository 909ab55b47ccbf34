use crate::analysis::error::AnomalousRatio;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ratios above `1 + ANOMALY_EPSILON` mean the upstream cost data is inconsistent.
pub const ANOMALY_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 6);

/// One billing line item attributed to a reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub instance_name: Option<String>,
    pub reservation_id: String,
    pub cost: Decimal,
    pub usage_date: NaiveDate,
    pub resource_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationSummary {
    pub reservation_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub peak_cost: Decimal,
    pub record_count: u64,
    /// `total_cost / (peak_cost * record_count)`, or zero when the denominator is zero.
    #[serde(with = "rust_decimal::serde::float")]
    pub utilization_ratio: Decimal,
}

impl UtilizationSummary {
    pub fn anomaly(&self) -> Option<AnomalousRatio> {
        if self.utilization_ratio > Decimal::ONE + ANOMALY_EPSILON {
            Some(AnomalousRatio {
                reservation_id: self.reservation_id.clone(),
                ratio: self.utilization_ratio,
            })
        } else {
            None
        }
    }
}
