//! Environmental data accessor surface
//!
//! The pipeline consumes ocean/weather conditions as a plain snapshot. The
//! actual provider — a background cache with stale-while-revalidate refresh —
//! lives outside this crate; here we only define the synchronous accessor the
//! orchestrator calls once per request, plus a static implementation for
//! tests and offline runs.

use serde::{Deserialize, Serialize};

use crate::types::VoyageEvent;

// ============================================================================
// Snapshot
// ============================================================================

/// One observation of ambient ocean conditions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentSnapshot {
    /// Sea surface temperature (°C).
    pub temperature_c: f64,

    /// Water density (kg/m³).
    pub density_kg_m3: f64,

    /// Significant wave height (m).
    pub wave_height_m: f64,

    /// Surface current speed (knots).
    pub current_speed_kn: f64,

    /// Chlorophyll-a concentration (mg/m³), a fouling-pressure proxy.
    pub chlorophyll_mg_m3: f64,

    /// Named ocean zone the observation belongs to.
    pub zone: String,
}

impl EnvironmentSnapshot {
    /// Fill an event's missing environmental fields from this snapshot.
    ///
    /// Explicit event overrides always win; only `None` fields are filled.
    /// Returns a new event — the input is never mutated.
    pub fn apply_to(&self, event: &VoyageEvent) -> VoyageEvent {
        let mut enriched = event.clone();
        if enriched.water_density.is_none() {
            enriched.water_density = Some(self.density_kg_m3);
        }
        if enriched.wave_height.is_none() {
            enriched.wave_height = Some(self.wave_height_m);
        }
        if enriched.current_speed.is_none() {
            enriched.current_speed = Some(self.current_speed_kn);
        }
        enriched
    }
}

// ============================================================================
// Accessor Trait
// ============================================================================

/// Synchronous environment accessor.
///
/// Implementations may be backed by a refreshing cache; from the pipeline's
/// point of view the call is non-blocking and may simply have nothing
/// (`None`) when no observation is available.
pub trait EnvironmentSource: Send + Sync {
    /// Latest available snapshot, if any.
    fn current(&self) -> Option<EnvironmentSnapshot>;
}

/// Fixed in-memory source for tests and offline label building.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    snapshot: Option<EnvironmentSnapshot>,
}

impl StaticEnvironment {
    pub fn new(snapshot: Option<EnvironmentSnapshot>) -> Self {
        Self { snapshot }
    }
}

impl EnvironmentSource for StaticEnvironment {
    fn current(&self) -> Option<EnvironmentSnapshot> {
        self.snapshot.clone()
    }
}
