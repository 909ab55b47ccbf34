use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("usage row {index} is missing reservationId")]
    MissingKey { index: usize },
    #[error("threshold must be within [0, 1] (got {threshold})")]
    InvalidThreshold { threshold: Decimal },
    #[error("usage row {index} for reservation {reservation_id} has negative cost {cost}")]
    NegativeCost {
        index: usize,
        reservation_id: String,
        cost: Decimal,
    },
    #[error("cost arithmetic overflowed for reservation {reservation_id}")]
    CostOverflow { reservation_id: String },
}

/// Non-fatal: the summary is still produced and classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("utilization ratio {ratio} for reservation {reservation_id} exceeds 1; cost data is inconsistent")]
pub struct AnomalousRatio {
    pub reservation_id: String,
    pub ratio: Decimal,
}
