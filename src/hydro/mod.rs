//! Hydrodynamic refinement for the prediction pipeline
//!
//! Skin-friction physics that enriches the operational feature set:
//! - `reynolds_number()` - flow regime from speed, hull length, water properties
//! - `friction_coefficient()` - Prandtl-Schlichting flat-plate approximation
//! - `delta_roughness()` - friction increase over a clean hull, clamped at zero
//! - `power_penalty()` - effective power proportional to ΔCf × speed
//!
//! All functions follow the safe-zero policy: mathematically undefined or
//! degenerate input regions return 0.0 instead of erroring. A zero from this
//! module means "no usable hydrodynamic signal", which downstream stages
//! treat as a neutral feature value.

use serde::{Deserialize, Serialize};

use crate::config::HydroConfig;
use crate::environment::EnvironmentSnapshot;
use crate::types::VoyageEvent;

// ============================================================================
// Physics Formulas
// ============================================================================

/// Reynolds number for the current speed and hull geometry.
///
/// Formula: Re = ρ·v·L / μ
///
/// Where:
/// - ρ = water density (kg/m³)
/// - v = speed (knots, as reported by telemetry)
/// - L = characteristic hull length (m)
/// - μ = dynamic viscosity (Pa·s)
///
/// Returns 0 when speed, length, or viscosity is non-positive.
pub fn reynolds_number(velocity: f64, length: f64, density: f64, viscosity: f64) -> f64 {
    if velocity <= 0.0 || length <= 0.0 || viscosity <= 0.0 {
        return 0.0;
    }
    (density * velocity * length) / viscosity
}

/// Skin friction coefficient via the Prandtl-Schlichting approximation.
///
/// Formula: Cf = 0.075 / (log₁₀(Re) − 2)²
///
/// Undefined for Re ≤ 0 and for log₁₀(Re) ≤ 2 (the denominator vanishes or
/// the formula leaves its validity region); both return 0.
pub fn friction_coefficient(reynolds: f64) -> f64 {
    if reynolds <= 0.0 {
        return 0.0;
    }
    let log_re = reynolds.log10();
    if log_re <= 2.0 {
        return 0.0;
    }
    0.075 / ((log_re - 2.0) * (log_re - 2.0))
}

/// Friction increase over the clean-hull baseline.
///
/// A fouled hull can only add friction; negative deltas (measurement noise,
/// fresh coating outperforming the reference) clamp to 0.
pub fn delta_roughness(cf_dirty: f64, cf_clean: f64) -> f64 {
    (cf_dirty - cf_clean).max(0.0)
}

/// Additional effective power proportional to ΔCf × speed.
///
/// Zero unless both the roughness delta and the speed are positive.
pub fn power_penalty(delta_roughness_value: f64, velocity: f64) -> f64 {
    if delta_roughness_value <= 0.0 || velocity <= 0.0 {
        return 0.0;
    }
    delta_roughness_value * velocity
}

// ============================================================================
// Per-Event Feature Bundle
// ============================================================================

/// Hydrodynamic feature columns for one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HydroFeatures {
    pub reynolds_number: f64,
    pub friction_coefficient: f64,
    pub delta_roughness: f64,
    pub power_penalty: f64,
}

impl HydroFeatures {
    /// Compute the hydrodynamic bundle for one event.
    ///
    /// Input resolution order for water properties and geometry:
    /// event override → environment snapshot → configured default.
    pub fn compute(
        event: &VoyageEvent,
        environment: Option<&EnvironmentSnapshot>,
        cfg: &HydroConfig,
    ) -> Self {
        let density = event
            .water_density
            .or_else(|| environment.map(|e| e.density_kg_m3))
            .unwrap_or(cfg.water_density);
        let viscosity = event.water_viscosity.unwrap_or(cfg.water_viscosity);
        let length = event.ship_length.unwrap_or(cfg.ship_length);
        let cf_clean = event.clean_friction.unwrap_or(cfg.clean_friction);

        let reynolds = reynolds_number(event.speed, length, density, viscosity);
        let cf_dirty = friction_coefficient(reynolds);
        let delta = delta_roughness(cf_dirty, cf_clean);
        Self {
            reynolds_number: reynolds,
            friction_coefficient: cf_dirty,
            delta_roughness: delta,
            power_penalty: power_penalty(delta, event.speed),
        }
    }
}
