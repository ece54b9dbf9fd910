//! Causal feature engineering for fouling risk estimation
//!
//! Derives per-ship temporal features from voyage telemetry:
//! - `idle_hours` - stationary exposure per leg
//! - `pct_idle_recent` - trailing 30-day idle ratio
//! - `historical_avg_speed` - trailing 10-event speed mean
//! - `accumulated_fouling_risk` - idle exposure weighted by days since cleaning
//! - `paint_x_speed` - coating/speed interaction
//!
//! ## Causality contract
//!
//! Every rolling statistic for an event is computed over the window ending at
//! the PREVIOUS event of the same ship (shift-by-one policy). The scored
//! event never contributes to its own features, and nothing after it does
//! either. Violating this silently corrupts training/serving parity, so the
//! tests below pin it down explicitly.
//!
//! Insufficient history is not an error: the statistic is taken over whatever
//! history exists, and a ship's first event falls back to zero idle exposure
//! and its own speed as the speed estimate.

use crate::config::FeatureConfig;
use crate::hydro::HydroFeatures;
use crate::types::VoyageEvent;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Denominator stabilizer for the idle ratio.
const IDLE_RATIO_EPSILON: f64 = 1e-9;

// ============================================================================
// Feature Columns & Schema
// ============================================================================

/// Canonical feature column names shared by training and serving.
pub mod columns {
    pub const SPEED: &str = "speed";
    pub const BEAUFORT_SCALE: &str = "beaufort_scale";
    pub const DAYS_SINCE_CLEANING: &str = "days_since_cleaning";
    pub const PCT_IDLE_RECENT: &str = "pct_idle_recent";
    pub const ACCUMULATED_FOULING_RISK: &str = "accumulated_fouling_risk";
    pub const HISTORICAL_AVG_SPEED: &str = "historical_avg_speed";
    pub const PAINT_X_SPEED: &str = "paint_x_speed";
    pub const PAINT_ENCODED: &str = "paint_encoded";
    pub const REYNOLDS_NUMBER: &str = "reynolds_number";
    pub const FRICTION_COEFFICIENT: &str = "friction_coefficient";
    pub const DELTA_ROUGHNESS: &str = "delta_roughness";
    pub const POWER_PENALTY: &str = "power_penalty";

    /// Operational columns present in every schema.
    pub const BASE: [&str; 8] = [
        SPEED,
        BEAUFORT_SCALE,
        DAYS_SINCE_CLEANING,
        PCT_IDLE_RECENT,
        ACCUMULATED_FOULING_RISK,
        HISTORICAL_AVG_SPEED,
        PAINT_X_SPEED,
        PAINT_ENCODED,
    ];

    /// Hydrodynamic refinement columns, present only when the deployment
    /// trains and serves with hydrodynamics enabled.
    pub const HYDRO: [&str; 4] = [
        REYNOLDS_NUMBER,
        FRICTION_COEFFICIENT,
        DELTA_ROUGHNESS,
        POWER_PENALTY,
    ];
}

/// Versioned, ordered feature column list.
///
/// One schema artifact is produced at training time, serialized with the
/// model, and validated at serving time. Training and serving can therefore
/// never disagree about which columns exist or in what order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureSchema {
    /// Schema version tag, bumped whenever the column list changes.
    pub version: String,

    /// Ordered column names. Row vectors are built in exactly this order.
    pub columns: Vec<String>,
}

impl FeatureSchema {
    /// Operational feature set (hydrodynamics disabled).
    pub fn base(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            columns: columns::BASE.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Operational plus hydrodynamic feature set.
    pub fn with_hydro(version: impl Into<String>) -> Self {
        let mut columns: Vec<String> = columns::BASE.iter().map(|c| (*c).to_string()).collect();
        columns.extend(columns::HYDRO.iter().map(|c| (*c).to_string()));
        Self {
            version: version.into(),
            columns,
        }
    }

    /// Whether any hydrodynamic column is part of this schema.
    pub fn includes_hydro(&self) -> bool {
        self.columns
            .iter()
            .any(|c| columns::HYDRO.contains(&c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Feature matrix handed to the opaque model: one row per event, columns in
/// schema order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub schema: FeatureSchema,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Operational Features
// ============================================================================

/// Causal rolling features for one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationalFeatures {
    /// Hours spent below the idle speed threshold during this leg.
    pub idle_hours: f64,

    /// Idle ratio over the trailing window ending strictly before this event.
    pub pct_idle_recent: f64,

    /// Mean speed over the trailing event window, excluding this event.
    pub historical_avg_speed: f64,

    /// `pct_idle_recent * days_since_cleaning` — exposure-weighted risk.
    pub accumulated_fouling_risk: f64,

    /// `paint_encoded * speed` coating interaction.
    pub paint_x_speed: f64,
}

/// Idle time for one leg: the full duration when the vessel was below the
/// idle speed threshold, otherwise zero.
pub fn idle_hours(speed: f64, duration: f64, idle_speed_threshold: f64) -> f64 {
    if speed < idle_speed_threshold {
        duration
    } else {
        0.0
    }
}

/// Compute causal rolling features for ONE ship's event series.
///
/// `events` must all belong to the same ship and be sorted ascending by
/// timestamp; the orchestrator groups and sorts before calling. Output is
/// index-aligned with the input.
///
/// An event carrying a caller-supplied `recent_idle_pct` keeps it (the
/// serving path may know idle history the batch does not contain); otherwise
/// the ratio is derived from the in-series history.
pub fn engineer_ship_features(
    events: &[VoyageEvent],
    cfg: &FeatureConfig,
) -> Vec<OperationalFeatures> {
    let window = Duration::days(cfg.rolling_window_days);
    let idle: Vec<f64> = events
        .iter()
        .map(|e| idle_hours(e.speed, e.duration, cfg.idle_speed_threshold_kn))
        .collect();

    let mut out = Vec::with_capacity(events.len());
    for (i, event) in events.iter().enumerate() {
        let pct_idle_recent = match event.recent_idle_pct {
            Some(provided) => provided,
            None => trailing_idle_ratio(events, &idle, i, window),
        };
        let historical_avg_speed = trailing_avg_speed(events, i, cfg.speed_window_events);
        let accumulated_fouling_risk = pct_idle_recent * f64::from(event.days_since_cleaning);
        out.push(OperationalFeatures {
            idle_hours: idle[i],
            pct_idle_recent,
            historical_avg_speed,
            accumulated_fouling_risk,
            paint_x_speed: event.paint_encoded * event.speed,
        });
    }
    out
}

/// Idle ratio over the window `(anchor - window, anchor]` where the anchor is
/// the PREVIOUS event's timestamp. Returns 0 for a ship's first event.
fn trailing_idle_ratio(events: &[VoyageEvent], idle: &[f64], i: usize, window: Duration) -> f64 {
    if i == 0 {
        return 0.0;
    }
    let anchor = events[i - 1].timestamp;
    let cutoff = anchor - window;
    let mut sum_idle = 0.0;
    let mut sum_total = 0.0;
    for j in 0..i {
        if events[j].timestamp > cutoff {
            sum_idle += idle[j];
            sum_total += events[j].duration;
        }
    }
    sum_idle / (sum_total + IDLE_RATIO_EPSILON)
}

/// Mean speed over the last `window_events` events before `i`. A ship's
/// first event has no history; its own speed is the best available estimate.
fn trailing_avg_speed(events: &[VoyageEvent], i: usize, window_events: usize) -> f64 {
    if i == 0 {
        return events[0].speed;
    }
    let start = i.saturating_sub(window_events);
    let slice = &events[start..i];
    let sum: f64 = slice.iter().map(|e| e.speed).sum();
    sum / slice.len() as f64
}

// ============================================================================
// Feature Row Construction
// ============================================================================

/// A schema column the pipeline cannot produce.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeatureRowError {
    #[error("feature column not produced by this pipeline: {0}")]
    UnknownColumn(String),

    #[error("schema requires hydrodynamic column {0} but hydrodynamics is disabled")]
    HydroNotComputed(String),
}

/// Build one feature row in schema column order.
pub fn feature_row(
    event: &VoyageEvent,
    ops: &OperationalFeatures,
    hydro: Option<&HydroFeatures>,
    schema: &FeatureSchema,
) -> Result<Vec<f64>, FeatureRowError> {
    let mut row = Vec::with_capacity(schema.columns.len());
    for column in &schema.columns {
        let value = match column.as_str() {
            columns::SPEED => event.speed,
            columns::BEAUFORT_SCALE => f64::from(event.beaufort_scale),
            columns::DAYS_SINCE_CLEANING => f64::from(event.days_since_cleaning),
            columns::PCT_IDLE_RECENT => ops.pct_idle_recent,
            columns::ACCUMULATED_FOULING_RISK => ops.accumulated_fouling_risk,
            columns::HISTORICAL_AVG_SPEED => ops.historical_avg_speed,
            columns::PAINT_X_SPEED => ops.paint_x_speed,
            columns::PAINT_ENCODED => event.paint_encoded,
            columns::REYNOLDS_NUMBER => {
                hydro
                    .ok_or_else(|| FeatureRowError::HydroNotComputed(column.clone()))?
                    .reynolds_number
            }
            columns::FRICTION_COEFFICIENT => {
                hydro
                    .ok_or_else(|| FeatureRowError::HydroNotComputed(column.clone()))?
                    .friction_coefficient
            }
            columns::DELTA_ROUGHNESS => {
                hydro
                    .ok_or_else(|| FeatureRowError::HydroNotComputed(column.clone()))?
                    .delta_roughness
            }
            columns::POWER_PENALTY => {
                hydro
                    .ok_or_else(|| FeatureRowError::HydroNotComputed(column.clone()))?
                    .power_penalty
            }
            other => return Err(FeatureRowError::UnknownColumn(other.to_string())),
        };
        row.push(value);
    }
    Ok(row)
}
