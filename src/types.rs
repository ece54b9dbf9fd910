//! Shared data structures for the biofouling estimation pipeline
//!
//! This module defines the records that flow through the four pipeline stages:
//! - Stage 1 input: `VoyageEvent` (one telemetry record per voyage leg)
//! - Stage 4 output: `PredictionRecord` (fully annotated estimate)
//! - Batch bookkeeping: `BatchOutcome`, `EventFailure`
//!
//! Events are immutable once built: the pipeline never mutates its input,
//! it only derives new values from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Voyage Telemetry Input
// ============================================================================

/// One voyage telemetry record for a single ship.
///
/// Speed is in knots, duration in hours, displacement in tons, draft in
/// meters. Optional fields default to "not reported" and are resolved by the
/// pipeline (environmental overrides) or by documented fallbacks (baseline
/// power). Constructed per request or per ingested row; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoyageEvent {
    /// Ship identifier. Matched case/whitespace-insensitively everywhere;
    /// see [`VoyageEvent::normalized_ship_name`].
    pub ship_name: String,

    /// Event start timestamp (UTC).
    pub timestamp: DateTime<Utc>,

    /// Speed over ground in knots (≥ 0).
    pub speed: f64,

    /// Leg duration in hours (≥ 0).
    pub duration: f64,

    /// Vessel displacement in tons, when the loading computer reported it.
    #[serde(default)]
    pub displacement: Option<f64>,

    /// Mid draft in meters; fallback input for theoretical power when
    /// displacement is missing.
    #[serde(default)]
    pub mid_draft: Option<f64>,

    /// Beaufort sea state, 0-12.
    #[serde(default)]
    pub beaufort_scale: u8,

    /// Days elapsed since the last hull cleaning / drydocking.
    pub days_since_cleaning: u32,

    /// Precomputed trailing idle percentage (0-1) supplied by the caller.
    /// When absent the pipeline derives it from in-batch history.
    #[serde(default)]
    pub recent_idle_pct: Option<f64>,

    /// Numeric encoding of the hull paint type. 0 = generic coating.
    #[serde(default)]
    pub paint_encoded: f64,

    /// Water density override (kg/m³).
    #[serde(default)]
    pub water_density: Option<f64>,

    /// Dynamic water viscosity override (Pa·s).
    #[serde(default)]
    pub water_viscosity: Option<f64>,

    /// Significant wave height override (m).
    #[serde(default)]
    pub wave_height: Option<f64>,

    /// Surface current speed override (knots).
    #[serde(default)]
    pub current_speed: Option<f64>,

    /// Hull length override (m) for Reynolds number.
    #[serde(default)]
    pub ship_length: Option<f64>,

    /// Clean-hull skin friction coefficient override.
    #[serde(default)]
    pub clean_friction: Option<f64>,
}

impl VoyageEvent {
    /// Canonical ship identifier: uppercased, surrounding whitespace stripped.
    ///
    /// Every grouping and efficiency lookup uses this form, so `" Atlantico "`
    /// and `"ATLANTICO"` are the same vessel.
    pub fn normalized_ship_name(&self) -> String {
        self.ship_name.trim().to_uppercase()
    }

    /// Structural validation of one event.
    ///
    /// Bad-but-plausible physics inputs (zero displacement, becalmed speed)
    /// are NOT rejected here — those degrade to documented safe zeros further
    /// down the pipeline. Validation only rejects records that are not
    /// meaningful telemetry at all: negative or non-finite speed/duration,
    /// out-of-range scales, an empty identifier.
    pub fn validate(&self) -> Result<(), InvalidEventError> {
        if self.ship_name.trim().is_empty() {
            return Err(InvalidEventError::MissingShipName);
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(InvalidEventError::NonPhysicalField {
                field: "speed",
                value: self.speed,
            });
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(InvalidEventError::NonPhysicalField {
                field: "duration",
                value: self.duration,
            });
        }
        if self.beaufort_scale > 12 {
            return Err(InvalidEventError::BeaufortOutOfRange {
                value: self.beaufort_scale,
            });
        }
        if let Some(pct) = self.recent_idle_pct {
            if !pct.is_finite() || !(0.0..=1.0).contains(&pct) {
                return Err(InvalidEventError::NonPhysicalField {
                    field: "recent_idle_pct",
                    value: pct,
                });
            }
        }
        for (field, value) in [
            ("displacement", self.displacement),
            ("mid_draft", self.mid_draft),
            ("water_density", self.water_density),
            ("water_viscosity", self.water_viscosity),
            ("wave_height", self.wave_height),
            ("current_speed", self.current_speed),
            ("ship_length", self.ship_length),
            ("clean_friction", self.clean_friction),
            ("paint_encoded", Some(self.paint_encoded)),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(InvalidEventError::NonFiniteField { field });
                }
            }
        }
        Ok(())
    }
}

/// Structural rejection of a single telemetry record.
///
/// Reported per-event in batch mode; propagated directly in single-event mode.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidEventError {
    #[error("ship name is empty")]
    MissingShipName,

    #[error("{field} outside physical range: {value}")]
    NonPhysicalField { field: &'static str, value: f64 },

    #[error("{field} is non-finite")]
    NonFiniteField { field: &'static str },

    #[error("beaufort scale out of range 0-12: {value}")]
    BeaufortOutOfRange { value: u8 },
}

// ============================================================================
// Severity Classification
// ============================================================================

/// Qualitative biofouling class.
///
/// Thresholded on the RAW excess ratio (0.10 / 0.20), never on the sigmoid
/// index — the two scales are intentionally decoupled so that class
/// boundaries stay interpretable in fuel terms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BioClass {
    /// Excess ratio below 10% — light fouling.
    Leve,
    /// Excess ratio in [10%, 20%) — moderate fouling.
    Moderada,
    /// Excess ratio at or above 20% — severe fouling.
    Severa,
    /// Excess ratio was not a number (e.g. unlabeled training row).
    Unknown,
}

impl std::fmt::Display for BioClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BioClass::Leve => write!(f, "Leve"),
            BioClass::Moderada => write!(f, "Moderada"),
            BioClass::Severa => write!(f, "Severa"),
            BioClass::Unknown => write!(f, "Unknown"),
        }
    }
}

// ============================================================================
// Pipeline Output
// ============================================================================

/// Fully annotated estimate for one voyage event.
///
/// Invariants (kept at full precision, no rounding inside the core):
/// - `predicted_consumption == baseline_consumption * (1 + excess_ratio)`
/// - `additional_fuel_tons == baseline_consumption * excess_ratio`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Normalized ship identifier.
    pub ship_name: String,

    /// Timestamp of the scored event.
    pub timestamp: DateTime<Utc>,

    /// Clean-hull fuel baseline (tons, ≥ 0).
    pub baseline_consumption: f64,

    /// Baseline scaled by the model's excess ratio (tons).
    pub predicted_consumption: f64,

    /// Model output: fractional excess over baseline. Can be negative.
    pub excess_ratio: f64,

    /// Bounded severity index, 0-10, one decimal.
    pub bio_index: f64,

    /// Qualitative class from the raw excess ratio.
    pub bio_class: BioClass,

    /// Excess fuel (tons). Negative = efficiency gain.
    pub additional_fuel_tons: f64,

    /// Excess fuel cost (USD). Negative = savings.
    pub additional_cost_usd: f64,

    /// Excess CO₂ (tons). Negative = avoided emissions.
    pub additional_co2_tons: f64,

    /// Version of the model artifact that produced the excess ratio.
    pub model_version: String,
}

/// One rejected event inside a batch.
///
/// `index` is the event's position in the ORIGINAL input slice, so callers
/// can line failures back up with their submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFailure {
    pub index: usize,
    pub ship_name: String,
    pub message: String,
}

/// Result of a batch prediction: per-event successes plus isolated failures.
///
/// Records appear in input order. A failed event never aborts the batch; it
/// moves to `failures` with its original index.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchOutcome {
    pub records: Vec<PredictionRecord>,
    pub failures: Vec<EventFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> VoyageEvent {
        VoyageEvent {
            ship_name: "  atlantico  ".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap(),
            speed: 12.0,
            duration: 4.0,
            displacement: Some(10_000.0),
            mid_draft: None,
            beaufort_scale: 2,
            days_since_cleaning: 30,
            recent_idle_pct: None,
            paint_encoded: 0.0,
            water_density: None,
            water_viscosity: None,
            wave_height: None,
            current_speed: None,
            ship_length: None,
            clean_friction: None,
        }
    }

    #[test]
    fn test_ship_name_normalization() {
        assert_eq!(event().normalized_ship_name(), "ATLANTICO");
    }

    #[test]
    fn test_valid_event_passes() {
        assert!(event().validate().is_ok());
    }

    #[test]
    fn test_negative_speed_rejected() {
        let mut e = event();
        e.speed = -1.0;
        assert!(matches!(
            e.validate(),
            Err(InvalidEventError::NonPhysicalField { field: "speed", .. })
        ));
    }

    #[test]
    fn test_nan_duration_rejected() {
        let mut e = event();
        e.duration = f64::NAN;
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_beaufort_range() {
        let mut e = event();
        e.beaufort_scale = 13;
        assert_eq!(
            e.validate(),
            Err(InvalidEventError::BeaufortOutOfRange { value: 13 })
        );
    }

    #[test]
    fn test_zero_displacement_is_not_structural() {
        // Degenerate physics inputs degrade to safe zeros downstream,
        // they are not structural failures.
        let mut e = event();
        e.displacement = Some(0.0);
        assert!(e.validate().is_ok());
    }

    #[test]
    fn test_bio_class_display() {
        assert_eq!(BioClass::Leve.to_string(), "Leve");
        assert_eq!(BioClass::Unknown.to_string(), "Unknown");
    }
}
