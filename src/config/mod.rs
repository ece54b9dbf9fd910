//! Pipeline Configuration - All estimation constants as operator-tunable TOML values
//!
//! Every threshold and conversion factor used by the pipeline is a field in
//! this module. Each struct implements `Default` with the calibrated
//! production values, so behavior is unchanged when no config file is present.
//!
//! ## Loading Order
//!
//! 1. `FOULCAST_CONFIG` environment variable (path to TOML file)
//! 2. `foulcast.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded value is immutable and passed BY VALUE into
//! [`crate::pipeline::PipelineOrchestrator`]. There is no process-global
//! config: one process can serve several orchestrators with different
//! constants (and tests never share state).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one pipeline deployment.
///
/// Load with [`PipelineConfig::load`] or build from `Default` and adjust
/// fields in code.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PipelineConfig {
    /// Rolling-feature windows and thresholds
    #[serde(default)]
    pub features: FeatureConfig,

    /// Admiralty baseline and efficiency calibration
    #[serde(default)]
    pub baseline: BaselineConfig,

    /// Bio index sigmoid / linear mapping
    #[serde(default)]
    pub index: IndexConfig,

    /// Fuel price and emission conversion factors
    #[serde(default)]
    pub impact: ImpactConfig,

    /// Hydrodynamic refinement layer
    #[serde(default)]
    pub hydro: HydroConfig,
}

impl PipelineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$FOULCAST_CONFIG` environment variable
    /// 2. `./foulcast.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("FOULCAST_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded pipeline config from FOULCAST_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from FOULCAST_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "FOULCAST_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("foulcast.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded pipeline config from ./foulcast.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./foulcast.toml, using defaults");
                }
            }
        }

        info!("No foulcast.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the pipeline numerically
    /// meaningless (non-positive windows, negative prices, degenerate
    /// sigmoid).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&str, bool); 8] = [
            (
                "features.idle_speed_threshold_kn must be > 0",
                self.features.idle_speed_threshold_kn > 0.0,
            ),
            (
                "features.rolling_window_days must be > 0",
                self.features.rolling_window_days > 0,
            ),
            (
                "features.speed_window_events must be > 0",
                self.features.speed_window_events > 0,
            ),
            (
                "baseline.admiralty_scale_factor must be > 0",
                self.baseline.admiralty_scale_factor > 0.0,
            ),
            (
                "baseline.default_global_efficiency must be > 0",
                self.baseline.default_global_efficiency > 0.0,
            ),
            ("index.sigmoid_k must be > 0", self.index.sigmoid_k > 0.0),
            (
                "impact.fuel_price_usd_per_ton must be >= 0",
                self.impact.fuel_price_usd_per_ton >= 0.0,
            ),
            (
                "impact.co2_ton_per_fuel_ton must be >= 0",
                self.impact.co2_ton_per_fuel_ton >= 0.0,
            ),
        ];
        for (message, ok) in checks {
            if !ok {
                return Err(ConfigError::Invalid {
                    message: message.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Configuration loading / validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {message}")]
    Invalid { message: String },
}

// ============================================================================
// Feature Engineering
// ============================================================================

/// Rolling-feature windows and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureConfig {
    /// Below this speed (knots) a leg counts as idle time.
    pub idle_speed_threshold_kn: f64,

    /// Trailing window for the idle-time percentage, in days.
    pub rolling_window_days: i64,

    /// Trailing window for the historical average speed, in events.
    pub speed_window_events: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            idle_speed_threshold_kn: 5.0,
            rolling_window_days: 30,
            speed_window_events: 10,
        }
    }
}

// ============================================================================
// Baseline Power
// ============================================================================

/// Admiralty baseline and efficiency calibration constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaselineConfig {
    /// Admiralty coefficient scale factor K in `disp^(2/3) * v³ / K`.
    pub admiralty_scale_factor: f64,

    /// Events with `days_since_cleaning` below this count as clean-hull
    /// observations during efficiency calibration.
    pub clean_hull_max_days: u32,

    /// Observed consumptions below this (tons) are treated as sensor noise
    /// and excluded from calibration.
    pub min_consumption_threshold: f64,

    /// Fleet-wide efficiency factor used when the calibration table has no
    /// entry at all (fresh deployment, unknown ship).
    pub default_global_efficiency: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            admiralty_scale_factor: 10_000.0,
            clean_hull_max_days: 90,
            min_consumption_threshold: 0.1,
            default_global_efficiency: 0.004_158,
        }
    }
}

// ============================================================================
// Bio Index
// ============================================================================

/// Bio index mapping from excess ratio to the 0-10 severity scale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Sigmoid steepness. Higher = sharper transition around the midpoint.
    pub sigmoid_k: f64,

    /// Excess ratio at which the sigmoid index reads 0.5.
    pub sigmoid_midpoint: f64,

    /// `true` = sigmoid mapping, `false` = linear clip to [0, 1]. The
    /// qualitative class is thresholded on the raw excess ratio either way.
    pub use_sigmoid: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            sigmoid_k: 10.0,
            sigmoid_midpoint: 0.10,
            use_sigmoid: true,
        }
    }
}

// ============================================================================
// Impact
// ============================================================================

/// Economic and emission conversion factors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactConfig {
    /// Bunker fuel price, USD per ton.
    pub fuel_price_usd_per_ton: f64,

    /// Tons of CO₂ emitted per ton of fuel burned (HFO/MSFO approximation).
    pub co2_ton_per_fuel_ton: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            fuel_price_usd_per_ton: 500.0,
            co2_ton_per_fuel_ton: 3.114,
        }
    }
}

// ============================================================================
// Hydrodynamics
// ============================================================================

/// Hydrodynamic refinement layer.
///
/// `enabled` is a deployment capability flag, not an implicit code path: the
/// loaded model's feature schema must agree with it, and the orchestrator
/// refuses to start on a mismatch. Training and serving therefore always see
/// the same feature set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HydroConfig {
    /// Compute Reynolds / friction / roughness / power-penalty feature columns.
    pub enabled: bool,

    /// Default water density (kg/m³) when neither the event nor the
    /// environment snapshot reports one.
    pub water_density: f64,

    /// Default dynamic viscosity (Pa·s).
    pub water_viscosity: f64,

    /// Default hull length (m) for the Reynolds number.
    pub ship_length: f64,

    /// Clean-hull skin friction coefficient baseline.
    pub clean_friction: f64,
}

impl Default for HydroConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            water_density: 1_025.0,
            water_viscosity: 1.0e-3,
            ship_length: 200.0,
            clean_friction: 0.003,
        }
    }
}
