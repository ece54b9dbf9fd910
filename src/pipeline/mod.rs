//! Prediction Pipeline Orchestrator
//!
//! Composes the pipeline stages around one opaque model call:
//! 1. Feature stage - causal rolling features, grouped per ship (+ optional
//!    hydrodynamics)
//! 2. Baseline stage - Admiralty power and clean-hull consumption per event
//! 3. Inference stage - `predict(feature_matrix) -> excess_ratio[]`
//! 4. Post-processing - severity index, class, and impact per event
//!    (independent per event, mapped in parallel)
//!
//! ## Batch contract
//!
//! A malformed event never aborts its batch: it is collected as an
//! `EventFailure` carrying its original index, and every valid event still
//! produces a record. Output records keep input order. Single-event mode
//! propagates the same failures directly.
//!
//! ## Concurrency
//!
//! The orchestrator holds only read-only state (config, efficiency table,
//! loaded model), so one instance may be shared freely across threads; no
//! locking is involved anywhere on the prediction path.
//!
//! ## Model availability
//!
//! An orchestrator may exist before its model artifact does (process boot
//! order), but every prediction then fails with
//! [`PipelineError::ModelUnavailable`]. A missing model is never coerced to a
//! zero excess ratio — zero is a legitimate prediction, not an error code.

use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::baseline::{baseline_consumption, theoretical_power, EfficiencyTable};
use crate::bio_index::{bio_index_0_10, classify};
use crate::config::{ConfigError, PipelineConfig};
use crate::environment::{EnvironmentSnapshot, EnvironmentSource};
use crate::features::{
    engineer_ship_features, feature_row, FeatureMatrix, FeatureRowError, OperationalFeatures,
};
use crate::hydro::HydroFeatures;
use crate::impact::additional_impacts;
use crate::model::{ExcessRatioModel, ModelError};
use crate::types::{BatchOutcome, EventFailure, InvalidEventError, PredictionRecord, VoyageEvent};

// ============================================================================
// Errors
// ============================================================================

/// Whole-call pipeline failure.
///
/// Per-event structural problems only surface here in single-event mode; in
/// batch mode they are isolated into [`EventFailure`] entries instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No model artifact is loaded. Distinct from every valid prediction.
    #[error("model unavailable: no artifact loaded")]
    ModelUnavailable,

    /// Structural input rejection (single-event mode).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidEventError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Feature(#[from] FeatureRowError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The hydrodynamics capability flag disagrees with the model's schema.
    #[error(
        "hydrodynamics flag mismatch: config enabled={hydro_enabled}, \
         model schema carries hydro columns={schema_has_hydro}"
    )]
    HydroFlagMismatch {
        hydro_enabled: bool,
        schema_has_hydro: bool,
    },

    /// The model was trained against a different efficiency table.
    #[error(
        "efficiency table version mismatch: model trained against {model_expects}, \
         loaded table is {table}"
    )]
    EfficiencyVersionMismatch { model_expects: String, table: String },

    /// The model returned the wrong number of predictions for the batch.
    #[error("model returned {found} predictions for {expected} events")]
    PredictionCount { expected: usize, found: usize },
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Four-stage prediction pipeline over voyage events.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    efficiency: EfficiencyTable,
    model: Option<Arc<dyn ExcessRatioModel>>,
}

impl PipelineOrchestrator {
    /// Orchestrator without a model (boot order: artifact may arrive later
    /// via [`PipelineOrchestrator::with_model`]). Predictions fail with
    /// [`PipelineError::ModelUnavailable`] until then.
    pub fn new(
        config: PipelineConfig,
        efficiency: EfficiencyTable,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            efficiency,
            model: None,
        })
    }

    /// Orchestrator with a loaded model.
    ///
    /// Fails fast when the deployment is inconsistent:
    /// - the hydrodynamics flag disagrees with the model's feature schema
    /// - the schema names a column this pipeline cannot produce
    /// - the model was trained against a different efficiency table version
    pub fn with_model(
        config: PipelineConfig,
        efficiency: EfficiencyTable,
        model: Arc<dyn ExcessRatioModel>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let schema = model.schema();
        if schema.includes_hydro() != config.hydro.enabled {
            return Err(PipelineError::HydroFlagMismatch {
                hydro_enabled: config.hydro.enabled,
                schema_has_hydro: schema.includes_hydro(),
            });
        }
        for column in &schema.columns {
            let known = crate::features::columns::BASE.contains(&column.as_str())
                || crate::features::columns::HYDRO.contains(&column.as_str());
            if !known {
                return Err(PipelineError::Feature(FeatureRowError::UnknownColumn(
                    column.clone(),
                )));
            }
        }
        if model.efficiency_version() != efficiency.version {
            return Err(PipelineError::EfficiencyVersionMismatch {
                model_expects: model.efficiency_version().to_string(),
                table: efficiency.version.clone(),
            });
        }

        info!(
            model = %model.version(),
            schema = %schema.version,
            columns = schema.len(),
            hydro = config.hydro.enabled,
            efficiency = %efficiency.version,
            ships = efficiency.calibrated_ships(),
            "Pipeline orchestrator ready"
        );
        Ok(Self {
            config,
            efficiency,
            model: Some(model),
        })
    }

    /// Score a single event. Structural failures propagate directly.
    pub fn predict_event(
        &self,
        event: &VoyageEvent,
        environment: Option<&EnvironmentSnapshot>,
    ) -> Result<PredictionRecord, PipelineError> {
        event.validate()?;
        let enriched = match environment {
            Some(snapshot) => snapshot.apply_to(event),
            None => event.clone(),
        };
        let mut records = self.score_events(vec![enriched])?;
        records.pop().ok_or(PipelineError::PredictionCount {
            expected: 1,
            found: 0,
        })
    }

    /// Score a batch of events.
    ///
    /// Per-event structural failures are isolated into
    /// [`BatchOutcome::failures`] with their original indices; all remaining
    /// events still produce records, in input order. Only whole-batch
    /// conditions (model unavailable, schema mismatch) return `Err`.
    pub fn predict_batch(
        &self,
        events: &[VoyageEvent],
        environment: Option<&EnvironmentSnapshot>,
    ) -> Result<BatchOutcome, PipelineError> {
        // Fail the whole batch up front when no model is loaded — per-event
        // isolation is for bad events, not for a missing deployment artifact.
        if self.model.is_none() {
            return Err(PipelineError::ModelUnavailable);
        }

        let mut failures = Vec::new();
        let mut valid = Vec::with_capacity(events.len());
        for (index, event) in events.iter().enumerate() {
            match event.validate() {
                Ok(()) => {
                    let enriched = match environment {
                        Some(snapshot) => snapshot.apply_to(event),
                        None => event.clone(),
                    };
                    valid.push(enriched);
                }
                Err(err) => failures.push(EventFailure {
                    index,
                    ship_name: event.ship_name.clone(),
                    message: err.to_string(),
                }),
            }
        }

        let records = self.score_events(valid)?;
        debug!(
            events = events.len(),
            scored = records.len(),
            rejected = failures.len(),
            "Batch prediction complete"
        );
        Ok(BatchOutcome { records, failures })
    }

    /// Batch prediction pulling ambient conditions from a synchronous
    /// environment accessor (e.g. the ocean cache), consulted once per call.
    pub fn predict_batch_from_source(
        &self,
        events: &[VoyageEvent],
        source: &dyn EnvironmentSource,
    ) -> Result<BatchOutcome, PipelineError> {
        let snapshot = source.current();
        self.predict_batch(events, snapshot.as_ref())
    }

    /// Run stages 1-4 over pre-validated events. Output is index-aligned
    /// with the input.
    fn score_events(
        &self,
        events: Vec<VoyageEvent>,
    ) -> Result<Vec<PredictionRecord>, PipelineError> {
        let model = self
            .model
            .as_deref()
            .ok_or(PipelineError::ModelUnavailable)?;

        if events.is_empty() {
            return Ok(Vec::new());
        }

        // Stage 1: causal rolling features, grouped per ship. Group slices
        // are sorted by timestamp (stable on input position for ties) before
        // the window math runs.
        let operational = self.feature_stage(&events);

        let hydro: Option<Vec<HydroFeatures>> = if self.config.hydro.enabled {
            Some(
                events
                    .iter()
                    .map(|e| HydroFeatures::compute(e, None, &self.config.hydro))
                    .collect(),
            )
        } else {
            None
        };

        // Stage 2: clean-hull baseline per event.
        let baselines: Vec<f64> = events
            .iter()
            .map(|e| {
                let power = theoretical_power(
                    e.displacement,
                    e.mid_draft,
                    e.speed,
                    self.config.baseline.admiralty_scale_factor,
                );
                let efficiency = self.efficiency.lookup(&e.ship_name);
                baseline_consumption(power, e.duration, efficiency)
            })
            .collect();

        // Stage 3: one opaque model call for the whole batch.
        let mut rows = Vec::with_capacity(events.len());
        for (i, event) in events.iter().enumerate() {
            rows.push(feature_row(
                event,
                &operational[i],
                hydro.as_ref().map(|h| &h[i]),
                model.schema(),
            )?);
        }
        let matrix = FeatureMatrix {
            schema: model.schema().clone(),
            rows,
        };
        let ratios = model.predict(&matrix)?;
        if ratios.len() != events.len() {
            return Err(PipelineError::PredictionCount {
                expected: events.len(),
                found: ratios.len(),
            });
        }

        // Stage 4: independent per-event post-processing.
        let model_version = model.version().to_string();
        let scored: Vec<(VoyageEvent, f64, f64)> = events
            .into_iter()
            .zip(baselines)
            .zip(ratios)
            .map(|((event, baseline), ratio)| (event, baseline, ratio))
            .collect();
        let records = scored
            .into_par_iter()
            .map(|(event, baseline, excess_ratio)| {
                let impact = additional_impacts(baseline, excess_ratio, &self.config.impact);
                PredictionRecord {
                    ship_name: event.normalized_ship_name(),
                    timestamp: event.timestamp,
                    baseline_consumption: baseline,
                    predicted_consumption: baseline * (1.0 + excess_ratio),
                    excess_ratio,
                    bio_index: bio_index_0_10(excess_ratio, &self.config.index),
                    bio_class: classify(excess_ratio),
                    additional_fuel_tons: impact.additional_fuel_tons,
                    additional_cost_usd: impact.additional_cost_usd,
                    additional_co2_tons: impact.additional_co2_tons,
                    model_version: model_version.clone(),
                }
            })
            .collect();
        Ok(records)
    }

    /// Group events per ship, sort each group chronologically, run the
    /// rolling-feature math, and scatter the results back to input order.
    fn feature_stage(&self, events: &[VoyageEvent]) -> Vec<OperationalFeatures> {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, event) in events.iter().enumerate() {
            groups
                .entry(event.normalized_ship_name())
                .or_default()
                .push(i);
        }

        let mut out: Vec<Option<OperationalFeatures>> = vec![None; events.len()];
        for positions in groups.into_values() {
            let mut sorted = positions;
            sorted.sort_by_key(|&p| (events[p].timestamp, p));
            let series: Vec<VoyageEvent> = sorted.iter().map(|&p| events[p].clone()).collect();
            let features = engineer_ship_features(&series, &self.config.features);
            for (k, &p) in sorted.iter().enumerate() {
                out[p] = Some(features[k].clone());
            }
        }

        // Every input position belongs to exactly one group.
        out.into_iter().flatten().collect()
    }
}
