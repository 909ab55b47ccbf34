use crate::analysis::error::AnalysisError;
use crate::domain::usage::UsageRecord;
use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

pub const UNKNOWN_RESOURCE_TYPE: &str = "Unknown";

/// Raw usage row as delivered by a billing export. Nothing here is trusted until
/// [`BillingUsageRow::validate_and_into_record`] has run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingUsageRow {
    pub instance_name: Option<String>,
    pub reservation_id: Option<String>,
    pub cost: Decimal,
    #[serde(deserialize_with = "deserialize_usage_date")]
    pub usage_date: NaiveDate,
    pub resource_type: Option<String>,
}

impl BillingUsageRow {
    pub fn validate_and_into_record(self, index: usize) -> Result<UsageRecord, AnalysisError> {
        let reservation_id = self
            .reservation_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(AnalysisError::MissingKey { index })?;

        if self.cost < Decimal::ZERO {
            return Err(AnalysisError::NegativeCost {
                index,
                reservation_id,
                cost: self.cost,
            });
        }

        let instance_name = self
            .instance_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let resource_type = self
            .resource_type
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_RESOURCE_TYPE.to_string());

        Ok(UsageRecord {
            instance_name,
            reservation_id,
            cost: self.cost,
            usage_date: self.usage_date,
            resource_type,
        })
    }
}

pub fn parse_usage_rows(text: &str) -> anyhow::Result<Vec<BillingUsageRow>> {
    serde_json::from_str::<Vec<BillingUsageRow>>(text)
        .context("usage data is not a JSON array of usage rows")
}

fn deserialize_usage_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_usage_date(&raw).map_err(serde::de::Error::custom)
}

// Billing exports mix plain dates with full timestamps; only the calendar date matters.
fn parse_usage_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| format!("invalid usageDate {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn row(value: serde_json::Value) -> BillingUsageRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_billing_export_shape() {
        let r = row(json!({
            "instanceName": "vm-prod-01",
            "reservationId": "R1",
            "cost": 12.34,
            "usageDate": "2026-01-27",
            "resourceType": "Virtual Machines"
        }));
        let record = r.validate_and_into_record(0).unwrap();
        assert_eq!(record.reservation_id, "R1");
        assert_eq!(record.cost, dec!(12.34));
        assert_eq!(record.usage_date, NaiveDate::from_ymd_opt(2026, 1, 27).unwrap());
        assert_eq!(record.instance_name.as_deref(), Some("vm-prod-01"));
        assert_eq!(record.resource_type, "Virtual Machines");
    }

    #[test]
    fn accepts_timestamps_and_string_costs() {
        let r = row(json!({
            "reservationId": "R1",
            "cost": "3.50",
            "usageDate": "2026-01-27 00:00:00+00:00"
        }));
        assert_eq!(r.usage_date, NaiveDate::from_ymd_opt(2026, 1, 27).unwrap());
        assert_eq!(r.cost, dec!(3.5));
    }

    #[test]
    fn defaults_missing_resource_type_to_unknown() {
        let r = row(json!({
            "instanceName": null,
            "reservationId": "R1",
            "cost": 1,
            "usageDate": "2026-01-27",
            "resourceType": null
        }));
        let record = r.validate_and_into_record(0).unwrap();
        assert_eq!(record.resource_type, UNKNOWN_RESOURCE_TYPE);
        assert_eq!(record.instance_name, None);
    }

    #[test]
    fn missing_or_blank_reservation_id_is_a_missing_key() {
        let absent = row(json!({"cost": 1, "usageDate": "2026-01-27"}));
        assert_eq!(
            absent.validate_and_into_record(4).unwrap_err(),
            AnalysisError::MissingKey { index: 4 }
        );

        let blank = row(json!({"reservationId": "  ", "cost": 1, "usageDate": "2026-01-27"}));
        assert_eq!(
            blank.validate_and_into_record(7).unwrap_err(),
            AnalysisError::MissingKey { index: 7 }
        );
    }

    #[test]
    fn reservation_id_is_kept_verbatim() {
        let r = row(json!({"reservationId": "Res-A", "cost": 1, "usageDate": "2026-01-27"}));
        assert_eq!(r.validate_and_into_record(0).unwrap().reservation_id, "Res-A");
    }

    #[test]
    fn rejects_negative_cost() {
        let r = row(json!({"reservationId": "R1", "cost": -0.01, "usageDate": "2026-01-27"}));
        assert!(matches!(
            r.validate_and_into_record(2),
            Err(AnalysisError::NegativeCost { index: 2, .. })
        ));
    }

    #[test]
    fn rejects_invalid_usage_date() {
        let res = serde_json::from_value::<BillingUsageRow>(json!({
            "reservationId": "R1",
            "cost": 1,
            "usageDate": "yesterday"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn parse_usage_rows_requires_an_array() {
        assert!(parse_usage_rows("{\"reservationId\": \"R1\"}").is_err());
        assert!(parse_usage_rows("[]").unwrap().is_empty());
    }
}
