//! Impact - excess fuel to cost and emissions
//!
//! Pure linear transforms of the excess ratio. Nothing clamps here: a
//! negative excess (hull performing better than baseline) propagates as
//! negative fuel, cost, and CO₂ — semantically, savings.

use serde::{Deserialize, Serialize};

use crate::config::ImpactConfig;

/// Economic and emission impact of one event's excess consumption.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactBreakdown {
    /// Excess fuel over baseline (tons).
    pub additional_fuel_tons: f64,

    /// Excess fuel cost (USD).
    pub additional_cost_usd: f64,

    /// Excess CO₂ emitted (tons).
    pub additional_co2_tons: f64,
}

/// Convert a baseline and excess ratio into fuel, cost, and CO₂ deltas.
pub fn additional_impacts(
    baseline_consumption: f64,
    excess_ratio: f64,
    cfg: &ImpactConfig,
) -> ImpactBreakdown {
    let additional_fuel_tons = baseline_consumption * excess_ratio;
    ImpactBreakdown {
        additional_fuel_tons,
        additional_cost_usd: additional_fuel_tons * cfg.fuel_price_usd_per_ton,
        additional_co2_tons: additional_fuel_tons * cfg.co2_ton_per_fuel_ton,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        // baseline=100, ER=0.2, price=500, co2=3.114
        let impact = additional_impacts(100.0, 0.2, &ImpactConfig::default());
        assert!((impact.additional_fuel_tons - 20.0).abs() < 1e-12);
        assert!((impact.additional_cost_usd - 10_000.0).abs() < 1e-9);
        assert!((impact.additional_co2_tons - 62.28).abs() < 1e-9);
    }

    #[test]
    fn test_negative_excess_propagates_as_savings() {
        let impact = additional_impacts(100.0, -0.1, &ImpactConfig::default());
        assert!((impact.additional_fuel_tons + 10.0).abs() < 1e-12);
        assert!(impact.additional_cost_usd < 0.0);
        assert!(impact.additional_co2_tons < 0.0);
    }

    #[test]
    fn test_zero_baseline_zero_impact() {
        let impact = additional_impacts(0.0, 0.5, &ImpactConfig::default());
        assert!(impact.additional_fuel_tons.abs() < f64::EPSILON);
        assert!(impact.additional_cost_usd.abs() < f64::EPSILON);
        assert!(impact.additional_co2_tons.abs() < f64::EPSILON);
    }
}
