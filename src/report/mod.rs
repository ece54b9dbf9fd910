//! Fleet Reporting - per-ship aggregation of prediction records
//!
//! Rolls a set of annotated records up into one summary row per ship:
//! event counts, mean/max severity, and fuel/cost/CO₂ totals. Consumed by
//! the reporting layer outside this crate; the aggregation itself is part of
//! the deterministic core so offline and online reports agree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::PredictionRecord;

/// Aggregated biofouling picture for one ship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipSummary {
    pub ship_name: String,

    /// Number of scored events behind this row.
    pub events: usize,

    pub avg_bio_index: f64,
    pub max_bio_index: f64,

    pub avg_excess_ratio: f64,
    pub max_excess_ratio: f64,

    /// Summed clean-hull baseline over all events (tons).
    pub total_baseline_fuel_tons: f64,

    /// Summed excess fuel (tons); negative legs offset positive ones.
    pub total_additional_fuel_tons: f64,

    pub total_additional_cost_usd: f64,
    pub total_additional_co2_tons: f64,
}

/// Aggregate records into one summary per ship, sorted by ship name.
///
/// Records are grouped by their (already normalized) ship identifier. An
/// empty input yields an empty report.
pub fn fleet_summary(records: &[PredictionRecord]) -> Vec<ShipSummary> {
    let mut groups: HashMap<&str, Vec<&PredictionRecord>> = HashMap::new();
    for record in records {
        groups.entry(record.ship_name.as_str()).or_default().push(record);
    }

    let mut summaries: Vec<ShipSummary> = groups
        .into_iter()
        .map(|(ship, rows)| {
            let n = rows.len() as f64;
            let sum_index: f64 = rows.iter().map(|r| r.bio_index).sum();
            let sum_ratio: f64 = rows.iter().map(|r| r.excess_ratio).sum();
            ShipSummary {
                ship_name: ship.to_string(),
                events: rows.len(),
                avg_bio_index: sum_index / n,
                max_bio_index: rows.iter().map(|r| r.bio_index).fold(f64::MIN, f64::max),
                avg_excess_ratio: sum_ratio / n,
                max_excess_ratio: rows.iter().map(|r| r.excess_ratio).fold(f64::MIN, f64::max),
                total_baseline_fuel_tons: rows.iter().map(|r| r.baseline_consumption).sum(),
                total_additional_fuel_tons: rows.iter().map(|r| r.additional_fuel_tons).sum(),
                total_additional_cost_usd: rows.iter().map(|r| r.additional_cost_usd).sum(),
                total_additional_co2_tons: rows.iter().map(|r| r.additional_co2_tons).sum(),
            }
        })
        .collect();
    summaries.sort_by(|a, b| a.ship_name.cmp(&b.ship_name));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BioClass;
    use chrono::{TimeZone, Utc};

    fn record(ship: &str, bio_index: f64, excess_ratio: f64, baseline: f64) -> PredictionRecord {
        PredictionRecord {
            ship_name: ship.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap(),
            baseline_consumption: baseline,
            predicted_consumption: baseline * (1.0 + excess_ratio),
            excess_ratio,
            bio_index,
            bio_class: BioClass::Leve,
            additional_fuel_tons: baseline * excess_ratio,
            additional_cost_usd: baseline * excess_ratio * 500.0,
            additional_co2_tons: baseline * excess_ratio * 3.114,
            model_version: "test".to_string(),
        }
    }

    #[test]
    fn test_summary_groups_and_sorts() {
        let records = vec![
            record("BRAVO", 2.0, 0.05, 100.0),
            record("ALFA", 6.0, 0.15, 200.0),
            record("BRAVO", 4.0, 0.10, 100.0),
        ];
        let summary = fleet_summary(&records);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].ship_name, "ALFA");
        assert_eq!(summary[1].ship_name, "BRAVO");

        let bravo = &summary[1];
        assert_eq!(bravo.events, 2);
        assert!((bravo.avg_bio_index - 3.0).abs() < 1e-12);
        assert!((bravo.max_bio_index - 4.0).abs() < 1e-12);
        assert!((bravo.avg_excess_ratio - 0.075).abs() < 1e-12);
        assert!((bravo.max_excess_ratio - 0.10).abs() < 1e-12);
        assert!((bravo.total_baseline_fuel_tons - 200.0).abs() < 1e-12);
        assert!((bravo.total_additional_fuel_tons - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_summary_totals_offset_savings() {
        let records = vec![
            record("ALFA", 1.0, -0.10, 100.0),
            record("ALFA", 5.0, 0.10, 100.0),
        ];
        let summary = fleet_summary(&records);
        assert_eq!(summary.len(), 1);
        assert!(summary[0].total_additional_fuel_tons.abs() < 1e-12);
        assert!((summary[0].max_excess_ratio - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert!(fleet_summary(&[]).is_empty());
    }
}
