//! Clean-Hull Baseline - Admiralty power and calibrated fuel consumption
//!
//! Translates ship state into the fuel a clean hull would have burned:
//! - `theoretical_power()` - Admiralty coefficient approximation
//! - `baseline_consumption()` - power × duration × efficiency factor
//! - `EfficiencyTable` - per-ship calibrated efficiency with fleet fallback
//!
//! The efficiency table is produced OFFLINE from recently-cleaned voyages and
//! is read-only during serving. It versions together with the model artifact:
//! a model trained against one table is invalid against another, and the
//! orchestrator enforces the pairing at construction.

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::BaselineConfig;

// ============================================================================
// Admiralty Physics
// ============================================================================

/// Theoretical propulsion power via the Admiralty coefficient formula.
///
/// Formula: P = displacement^(2/3) × speed³ / K
///
/// Guards:
/// - speed below 1 knot returns 0 (the approximation is unstable near zero)
/// - missing/zero displacement falls back to `draft × K` when a positive
///   draft is available, otherwise 0 — one policy on every path, training
///   and serving alike
pub fn theoretical_power(
    displacement: Option<f64>,
    draft: Option<f64>,
    speed: f64,
    admiralty_scale_factor: f64,
) -> f64 {
    if speed < 1.0 {
        return 0.0;
    }
    let disp = match displacement {
        Some(d) if d > 0.0 && d.is_finite() => d,
        _ => match draft {
            Some(t) if t > 0.0 && t.is_finite() => t * admiralty_scale_factor,
            _ => return 0.0,
        },
    };
    (disp.powf(2.0 / 3.0) * speed.powi(3)) / admiralty_scale_factor
}

/// Clean-hull fuel (tons) for one leg: power × duration × efficiency.
///
/// Returns 0 when any input is non-positive.
pub fn baseline_consumption(theoretical_power: f64, duration_hours: f64, efficiency_factor: f64) -> f64 {
    if theoretical_power <= 0.0 || duration_hours <= 0.0 || efficiency_factor <= 0.0 {
        return 0.0;
    }
    theoretical_power * duration_hours * efficiency_factor
}

/// Observed excess over baseline for one leg, used to build training labels.
///
/// `None` when the baseline is non-positive or non-finite — such rows carry
/// no usable label.
pub fn observed_excess_ratio(real_consumption: f64, baseline: f64) -> Option<f64> {
    if !baseline.is_finite() || baseline <= 0.0 || !real_consumption.is_finite() {
        return None;
    }
    Some(real_consumption / baseline - 1.0)
}

// ============================================================================
// Efficiency Calibration
// ============================================================================

/// One historical voyage with measured fuel consumption, input to
/// efficiency calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionObservation {
    pub ship_name: String,
    pub days_since_cleaning: u32,
    pub displacement: Option<f64>,
    pub mid_draft: Option<f64>,
    /// Speed in knots.
    pub speed: f64,
    /// Leg duration in hours.
    pub duration: f64,
    /// Measured fuel burned over the leg (tons).
    pub real_consumption: f64,
}

/// Calibration failure.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error(
        "no clean-hull observations (days_since_cleaning < {max_days}, \
         positive power·duration, consumption ≥ {min_consumption}) — cannot calibrate"
    )]
    NoCleanHullObservations { max_days: u32, min_consumption: f64 },
}

/// Per-ship efficiency factors (fuel tons per unit power·hour) with a
/// fleet-wide median fallback.
///
/// Every ship resolves to SOME factor: calibrated ships get their own median,
/// everyone else gets the fleet median, and a table built with
/// [`EfficiencyTable::uncalibrated`] serves the documented default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EfficiencyTable {
    /// Calibration run identifier; paired with the model artifact version.
    pub version: String,

    /// Per-ship median efficiency, keyed by normalized ship name.
    factors: HashMap<String, f64>,

    /// Fleet-wide median efficiency for ships absent from calibration.
    pub global_factor: f64,
}

impl EfficiencyTable {
    /// Table with no per-ship entries, serving the configured default
    /// everywhere. For fresh deployments that have not calibrated yet.
    pub fn uncalibrated(cfg: &BaselineConfig) -> Self {
        Self {
            version: "uncalibrated".to_string(),
            factors: HashMap::new(),
            global_factor: cfg.default_global_efficiency,
        }
    }

    /// Efficiency factor for a ship (name matched case/whitespace-insensitively).
    pub fn lookup(&self, ship_name: &str) -> f64 {
        let key = ship_name.trim().to_uppercase();
        self.factors.get(&key).copied().unwrap_or(self.global_factor)
    }

    /// Number of ships with their own calibrated factor.
    pub fn calibrated_ships(&self) -> usize {
        self.factors.len()
    }

    /// Calibrate from historical voyages with measured consumption.
    ///
    /// Restricted to clean-hull legs (`days_since_cleaning <
    /// cfg.clean_hull_max_days`) with positive power·duration and consumption
    /// above the sensor-noise floor. Each ship's factor is the median of
    /// `real_consumption / (power × duration)` over its qualifying legs; the
    /// fleet median of the same ratio covers everyone else.
    pub fn calibrate(
        version: impl Into<String>,
        observations: &[ConsumptionObservation],
        cfg: &BaselineConfig,
    ) -> Result<Self, CalibrationError> {
        let mut per_ship: HashMap<String, Vec<f64>> = HashMap::new();
        let mut all_ratios: Vec<f64> = Vec::new();

        for obs in observations {
            if obs.days_since_cleaning >= cfg.clean_hull_max_days {
                continue;
            }
            if !obs.real_consumption.is_finite()
                || obs.real_consumption < cfg.min_consumption_threshold
            {
                continue;
            }
            let power = theoretical_power(
                obs.displacement,
                obs.mid_draft,
                obs.speed,
                cfg.admiralty_scale_factor,
            );
            let power_duration = power * obs.duration;
            if power_duration <= 0.0 {
                continue;
            }
            let ratio = obs.real_consumption / power_duration;
            per_ship
                .entry(obs.ship_name.trim().to_uppercase())
                .or_default()
                .push(ratio);
            all_ratios.push(ratio);
        }

        if all_ratios.is_empty() {
            return Err(CalibrationError::NoCleanHullObservations {
                max_days: cfg.clean_hull_max_days,
                min_consumption: cfg.min_consumption_threshold,
            });
        }

        let global_factor = median(all_ratios);
        let factors: HashMap<String, f64> = per_ship
            .into_iter()
            .map(|(ship, ratios)| {
                let m = median(ratios);
                debug!(ship = %ship, factor = m, "Calibrated per-ship efficiency");
                (ship, m)
            })
            .collect();

        let version = version.into();
        info!(
            version = %version,
            ships = factors.len(),
            global_factor,
            "Efficiency table calibrated"
        );
        Ok(Self {
            version,
            factors,
            global_factor,
        })
    }
}

fn median(values: Vec<f64>) -> f64 {
    let mut data = Data::new(values);
    data.median()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> BaselineConfig {
        BaselineConfig::default()
    }

    fn obs(ship: &str, days: u32, consumption: f64) -> ConsumptionObservation {
        ConsumptionObservation {
            ship_name: ship.to_string(),
            days_since_cleaning: days,
            displacement: Some(10_000.0),
            mid_draft: None,
            speed: 10.0,
            duration: 2.0,
            real_consumption: consumption,
        }
    }

    #[test]
    fn test_theoretical_power_reference_value() {
        // 10000^(2/3) = 464.16, × 10³ / 10000 = 46.416
        let power = theoretical_power(Some(10_000.0), None, 10.0, 10_000.0);
        assert!(
            (power - 46.416).abs() < 1e-3,
            "power should be ~46.416, got {power}"
        );
    }

    #[test]
    fn test_theoretical_power_low_speed_guard() {
        assert!(theoretical_power(Some(50_000.0), None, 0.5, 10_000.0).abs() < f64::EPSILON);
        assert!(theoretical_power(Some(50_000.0), None, 0.999, 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_theoretical_power_draft_fallback() {
        // displacement missing → draft × K substitutes
        let with_draft = theoretical_power(None, Some(8.0), 10.0, 10_000.0);
        let expected = (8.0_f64 * 10_000.0).powf(2.0 / 3.0) * 1_000.0 / 10_000.0;
        assert!((with_draft - expected).abs() < 1e-9);

        // zero displacement behaves like missing
        let zero_disp = theoretical_power(Some(0.0), Some(8.0), 10.0, 10_000.0);
        assert!((zero_disp - expected).abs() < 1e-9);
    }

    #[test]
    fn test_theoretical_power_nothing_available() {
        assert!(theoretical_power(None, None, 10.0, 10_000.0).abs() < f64::EPSILON);
        assert!(theoretical_power(Some(0.0), Some(0.0), 10.0, 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_baseline_consumption() {
        assert!((baseline_consumption(46.416, 2.0, 1.0e-4) - 0.009_283_2).abs() < 1e-9);
        assert!(baseline_consumption(0.0, 2.0, 1.0e-4).abs() < f64::EPSILON);
        assert!(baseline_consumption(46.416, 0.0, 1.0e-4).abs() < f64::EPSILON);
        assert!(baseline_consumption(46.416, 2.0, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_observed_excess_ratio() {
        let er = observed_excess_ratio(120.0, 100.0);
        assert!((er.unwrap() - 0.2).abs() < 1e-12);
        assert!(observed_excess_ratio(120.0, 0.0).is_none());
        assert!(observed_excess_ratio(f64::NAN, 100.0).is_none());
    }

    #[test]
    fn test_calibration_per_ship_median() {
        // Ship A: ratios spread around a known median; power·duration = 92.832
        let pd = theoretical_power(Some(10_000.0), None, 10.0, 10_000.0) * 2.0;
        let observations = vec![
            obs("alfa", 10, 0.004 * pd),
            obs("alfa", 20, 0.005 * pd),
            obs("alfa", 30, 0.006 * pd),
            obs("bravo", 15, 0.010 * pd),
        ];
        let table = EfficiencyTable::calibrate("cal-1", &observations, &cfg()).expect("calibrate");
        assert!((table.lookup("ALFA") - 0.005).abs() < 1e-9);
        assert!((table.lookup(" alfa ") - 0.005).abs() < 1e-9, "lookup must normalize");
        assert!((table.lookup("BRAVO") - 0.010).abs() < 1e-9);
        assert_eq!(table.calibrated_ships(), 2);
    }

    #[test]
    fn test_calibration_fleet_fallback_for_unknown_ship() {
        let pd = theoretical_power(Some(10_000.0), None, 10.0, 10_000.0) * 2.0;
        let observations = vec![obs("alfa", 10, 0.004 * pd), obs("bravo", 10, 0.006 * pd)];
        let table = EfficiencyTable::calibrate("cal-1", &observations, &cfg()).expect("calibrate");
        // Unknown ship resolves to the fleet median
        assert!((table.lookup("CHARLIE") - table.global_factor).abs() < f64::EPSILON);
        assert!((table.global_factor - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_excludes_dirty_hulls_and_noise() {
        let pd = theoretical_power(Some(10_000.0), None, 10.0, 10_000.0) * 2.0;
        let observations = vec![
            obs("alfa", 10, 0.004 * pd),
            // Dirty hull: excluded even though consumption is plausible
            obs("alfa", 200, 0.050 * pd),
            // Below the sensor-noise floor: excluded
            obs("alfa", 10, 0.05),
        ];
        let table = EfficiencyTable::calibrate("cal-1", &observations, &cfg()).expect("calibrate");
        assert!((table.lookup("ALFA") - 0.004).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_requires_observations() {
        let observations = vec![obs("alfa", 365, 10.0)];
        assert!(matches!(
            EfficiencyTable::calibrate("cal-1", &observations, &cfg()),
            Err(CalibrationError::NoCleanHullObservations { .. })
        ));
    }

    #[test]
    fn test_uncalibrated_table_serves_default() {
        let table = EfficiencyTable::uncalibrated(&cfg());
        assert!((table.lookup("ANYSHIP") - 0.004_158).abs() < 1e-12);
        assert_eq!(table.calibrated_ships(), 0);
    }
}
