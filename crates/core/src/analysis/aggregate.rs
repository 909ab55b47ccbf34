//! Per-reservation grouping of usage records.
//!
//! Aggregation happens in two steps. Records are first folded into [`UsageAccumulator`]s keyed
//! by reservation id, then each accumulator is turned into a [`UtilizationSummary`]. Accumulators
//! built from disjoint slices of the same batch can be combined with
//! [`UsageAggregator::merge_partials`] before summarizing. The result does not depend on the
//! order in which shards are merged.

use crate::analysis::error::AnalysisError;
use crate::domain::usage::{UsageRecord, UtilizationSummary};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running totals for one reservation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageAccumulator {
    pub total_cost: Decimal,
    pub peak_cost: Decimal,
    pub record_count: u64,
}

impl UsageAccumulator {
    pub fn add(&mut self, reservation_id: &str, cost: Decimal) -> Result<(), AnalysisError> {
        self.total_cost = self
            .total_cost
            .checked_add(cost)
            .ok_or_else(|| overflow(reservation_id))?;
        self.peak_cost = self.peak_cost.max(cost);
        self.record_count += 1;
        Ok(())
    }

    pub fn merge(self, other: Self, reservation_id: &str) -> Result<Self, AnalysisError> {
        Ok(Self {
            total_cost: self
                .total_cost
                .checked_add(other.total_cost)
                .ok_or_else(|| overflow(reservation_id))?,
            peak_cost: self.peak_cost.max(other.peak_cost),
            record_count: self.record_count + other.record_count,
        })
    }

    pub fn into_summary(self, reservation_id: String) -> Result<UtilizationSummary, AnalysisError> {
        let denominator = self
            .peak_cost
            .checked_mul(Decimal::from(self.record_count))
            .ok_or_else(|| overflow(&reservation_id))?;

        let utilization_ratio = if denominator.is_zero() {
            Decimal::ZERO
        } else {
            self.total_cost
                .checked_div(denominator)
                .ok_or_else(|| overflow(&reservation_id))?
        };

        Ok(UtilizationSummary {
            reservation_id,
            total_cost: self.total_cost,
            peak_cost: self.peak_cost,
            record_count: self.record_count,
            utilization_ratio,
        })
    }
}

fn overflow(reservation_id: &str) -> AnalysisError {
    AnalysisError::CostOverflow {
        reservation_id: reservation_id.to_string(),
    }
}

/// Stateless grouping of usage records by reservation id.
pub struct UsageAggregator;

impl UsageAggregator {
    /// Group records into one summary per distinct reservation id (exact, case-sensitive match).
    pub fn aggregate(
        records: &[UsageRecord],
    ) -> Result<BTreeMap<String, UtilizationSummary>, AnalysisError> {
        Self::summarize(Self::accumulate(records)?)
    }

    pub fn accumulate(
        records: &[UsageRecord],
    ) -> Result<BTreeMap<String, UsageAccumulator>, AnalysisError> {
        let mut partials = BTreeMap::<String, UsageAccumulator>::new();
        for (index, record) in records.iter().enumerate() {
            if record.cost < Decimal::ZERO {
                return Err(AnalysisError::NegativeCost {
                    index,
                    reservation_id: record.reservation_id.clone(),
                    cost: record.cost,
                });
            }

            partials
                .entry(record.reservation_id.clone())
                .or_default()
                .add(&record.reservation_id, record.cost)?;
        }
        Ok(partials)
    }

    pub fn merge_partials(
        mut left: BTreeMap<String, UsageAccumulator>,
        right: BTreeMap<String, UsageAccumulator>,
    ) -> Result<BTreeMap<String, UsageAccumulator>, AnalysisError> {
        for (reservation_id, acc) in right {
            let merged = match left.remove(&reservation_id) {
                Some(existing) => existing.merge(acc, &reservation_id)?,
                None => acc,
            };
            left.insert(reservation_id, merged);
        }
        Ok(left)
    }

    pub fn summarize(
        partials: BTreeMap<String, UsageAccumulator>,
    ) -> Result<BTreeMap<String, UtilizationSummary>, AnalysisError> {
        partials
            .into_iter()
            .map(|(reservation_id, acc)| {
                let summary = acc.into_summary(reservation_id.clone())?;
                Ok((reservation_id, summary))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn record(id: &str, cost: Decimal) -> UsageRecord {
        UsageRecord {
            instance_name: None,
            reservation_id: id.to_string(),
            cost,
            usage_date: NaiveDate::from_ymd_opt(2026, 1, 27).unwrap(),
            resource_type: "Virtual Machines".to_string(),
        }
    }

    fn mixed_batch() -> Vec<UsageRecord> {
        vec![
            record("R1", dec!(10)),
            record("R2", dec!(2)),
            record("r1", dec!(4)),
            record("R1", dec!(5)),
            record("R2", dec!(20)),
            record("R3", dec!(0)),
        ]
    }

    #[test]
    fn scenario_a_two_records() {
        let summaries =
            UsageAggregator::aggregate(&[record("R1", dec!(10)), record("R1", dec!(5))]).unwrap();
        let s = &summaries["R1"];
        assert_eq!(s.total_cost, dec!(15));
        assert_eq!(s.peak_cost, dec!(10));
        assert_eq!(s.record_count, 2);
        assert_eq!(s.utilization_ratio, dec!(0.75));
    }

    #[test]
    fn scenario_b_single_spike() {
        let records = vec![
            record("R2", dec!(2)),
            record("R2", dec!(2)),
            record("R2", dec!(2)),
            record("R2", dec!(20)),
        ];
        let summaries = UsageAggregator::aggregate(&records).unwrap();
        let s = &summaries["R2"];
        assert_eq!(s.total_cost, dec!(26));
        assert_eq!(s.peak_cost, dec!(20));
        assert_eq!(s.record_count, 4);
        assert_eq!(s.utilization_ratio, dec!(0.325));
    }

    #[test]
    fn scenario_c_empty_input() {
        assert!(UsageAggregator::aggregate(&[]).unwrap().is_empty());
    }

    #[test]
    fn scenario_d_all_zero_costs_yield_zero_ratio() {
        let records = vec![record("R3", dec!(0)), record("R3", dec!(0)), record("R3", dec!(0))];
        let summaries = UsageAggregator::aggregate(&records).unwrap();
        assert_eq!(summaries["R3"].utilization_ratio, Decimal::ZERO);
        assert_eq!(summaries["R3"].record_count, 3);
    }

    #[test]
    fn one_summary_per_distinct_case_sensitive_id() {
        let records = mixed_batch();
        let summaries = UsageAggregator::aggregate(&records).unwrap();
        let distinct: BTreeSet<_> = records.iter().map(|r| r.reservation_id.as_str()).collect();
        assert_eq!(summaries.len(), distinct.len());
        assert_eq!(summaries.len(), 4);
        assert_eq!(summaries["r1"].total_cost, dec!(4));
        assert!(summaries.values().all(|s| s.utilization_ratio >= Decimal::ZERO));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let records = mixed_batch();
        let first = UsageAggregator::aggregate(&records).unwrap();
        let second = UsageAggregator::aggregate(&records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn adding_a_record_never_lowers_total_or_peak() {
        let mut records = vec![record("R1", dec!(10)), record("R1", dec!(5))];
        let before = UsageAggregator::aggregate(&records).unwrap()["R1"].clone();

        for cost in [dec!(0), dec!(7), dec!(30)] {
            records.push(record("R1", cost));
            let after = UsageAggregator::aggregate(&records).unwrap()["R1"].clone();
            assert!(after.total_cost >= before.total_cost);
            assert!(after.peak_cost >= before.peak_cost);
        }
    }

    #[test]
    fn rejects_negative_cost_records() {
        let res = UsageAggregator::aggregate(&[record("R1", dec!(1)), record("R1", dec!(-1))]);
        assert!(matches!(
            res,
            Err(AnalysisError::NegativeCost { index: 1, .. })
        ));
    }

    #[test]
    fn shard_merge_matches_single_pass_in_any_order() {
        let records = mixed_batch();
        let expected = UsageAggregator::aggregate(&records).unwrap();

        let (head, tail) = records.split_at(2);
        let a = UsageAggregator::accumulate(head).unwrap();
        let b = UsageAggregator::accumulate(tail).unwrap();

        let ab = UsageAggregator::merge_partials(a.clone(), b.clone()).unwrap();
        let ba = UsageAggregator::merge_partials(b, a).unwrap();
        assert_eq!(UsageAggregator::summarize(ab).unwrap(), expected);
        assert_eq!(UsageAggregator::summarize(ba).unwrap(), expected);
    }

    #[test]
    fn inconsistent_partials_produce_an_unclamped_ratio() {
        // Totals exceed peak * count, which cannot happen with a single consistent pass.
        let acc = UsageAccumulator {
            total_cost: dec!(30),
            peak_cost: dec!(10),
            record_count: 2,
        };
        let summary = acc.into_summary("R9".to_string()).unwrap();
        assert_eq!(summary.utilization_ratio, dec!(1.5));
        let anomaly = summary.anomaly().unwrap();
        assert_eq!(anomaly.reservation_id, "R9");
    }

    #[test]
    fn full_utilization_is_not_anomalous() {
        let summaries =
            UsageAggregator::aggregate(&[record("R1", dec!(3)), record("R1", dec!(3))]).unwrap();
        assert_eq!(summaries["R1"].utilization_ratio, Decimal::ONE);
        assert!(summaries["R1"].anomaly().is_none());
    }

    #[test]
    fn overflow_is_reported_not_panicked() {
        let res = UsageAggregator::aggregate(&[record("R1", Decimal::MAX), record("R1", Decimal::MAX)]);
        assert_eq!(
            res.unwrap_err(),
            AnalysisError::CostOverflow {
                reservation_id: "R1".to_string()
            }
        );
    }
}
