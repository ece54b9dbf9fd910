//! FoulCast: Hull Biofouling Operational Intelligence
//!
//! Deterministic feature-and-impact pipeline for estimating hull biofouling
//! severity and its fuel/cost/CO₂ consequences from voyage telemetry.
//!
//! ## Architecture
//!
//! - **Features**: causal per-ship rolling features (idle exposure, speed history)
//! - **Hydrodynamics**: optional skin-friction refinement (Reynolds, Prandtl-Schlichting)
//! - **Baseline**: clean-hull Admiralty power and calibrated fuel baseline
//! - **Model**: opaque excess-ratio regressor behind a trait, loaded read-only
//! - **Bio Index / Impact**: severity scoring and economic conversion
//! - **Pipeline**: four-stage orchestrator over single events or batches
//!
//! The crate is the in-process core only. HTTP routing, persistence, model
//! training, and external data providers live behind the interfaces in
//! `model` and `environment`.

pub mod baseline;
pub mod bio_index;
pub mod config;
pub mod environment;
pub mod features;
pub mod hydro;
pub mod impact;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod types;

// Re-export configuration
pub use config::PipelineConfig;

// Re-export commonly used types
pub use types::{
    BatchOutcome, BioClass, EventFailure, InvalidEventError, PredictionRecord, VoyageEvent,
};

// Re-export feature engineering
pub use features::{FeatureMatrix, FeatureSchema, OperationalFeatures};

// Re-export baseline components
pub use baseline::{CalibrationError, ConsumptionObservation, EfficiencyTable};

// Re-export model boundary
pub use model::{ExcessRatioModel, ModelArtifact, ModelError};

// Re-export environment accessor surface
pub use environment::{EnvironmentSnapshot, EnvironmentSource, StaticEnvironment};

// Re-export orchestrator
pub use pipeline::{PipelineError, PipelineOrchestrator};

// Re-export fleet reporting
pub use report::ShipSummary;
