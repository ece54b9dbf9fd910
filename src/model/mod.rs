//! Opaque excess-ratio model boundary
//!
//! The regression model is trained and calibrated out-of-band; the pipeline
//! only needs `predict(features) -> excess_ratio[]`. This module defines that
//! boundary:
//! - `ExcessRatioModel` - the trait the orchestrator calls through
//! - `ModelArtifact` - the serialized bundle loaded read-only at startup
//!
//! The artifact carries its feature schema and the version of the efficiency
//! table it was trained against. Both are validated before any prediction:
//! feeding a model columns it was not trained on is a loud
//! `ModelError::SchemaMismatch`, never a silent reindex.
//!
//! Load failure is an explicit error. There is no "model missing, predict
//! zeros" path — a zero excess ratio is a legitimate prediction and must
//! never be forgeable by a deployment mistake.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::features::{FeatureMatrix, FeatureSchema};

// ============================================================================
// Errors
// ============================================================================

/// Model artifact loading / prediction failure.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact has {coefficients} coefficients for {columns} schema columns")]
    CoefficientMismatch { columns: usize, coefficients: usize },

    #[error("feature schema mismatch: model expects {expected}, pipeline built {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("feature row has {found} values, schema expects {expected}")]
    RowWidth { expected: usize, found: usize },
}

// ============================================================================
// Trait
// ============================================================================

/// The opaque predictor: one excess ratio per feature row.
///
/// Implementations are immutable after load; concurrent `predict` calls are
/// always safe (`Send + Sync`, no interior mutability).
pub trait ExcessRatioModel: Send + Sync {
    /// Predict one excess ratio per row. The matrix schema must match
    /// [`ExcessRatioModel::schema`] exactly.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError>;

    /// Feature schema this model was trained against.
    fn schema(&self) -> &FeatureSchema;

    /// Artifact version tag.
    fn version(&self) -> &str;

    /// Version of the efficiency table this model was trained with.
    fn efficiency_version(&self) -> &str;
}

// ============================================================================
// Serialized Artifact
// ============================================================================

/// On-disk model bundle: schema, versions, and the regressor's serialized
/// form (a coefficient table — the training process exports its fitted model
/// in this shape).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelArtifact {
    /// Artifact version tag, e.g. `"v13"`.
    pub artifact_version: String,

    /// Efficiency-table version this model was trained against.
    pub efficiency_version: String,

    /// Ordered feature columns the regressor expects.
    pub schema: FeatureSchema,

    /// Regression intercept.
    pub intercept: f64,

    /// One coefficient per schema column, in schema order.
    pub coefficients: Vec<f64>,
}

impl ModelArtifact {
    /// Load and validate an artifact from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self = serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        artifact.validate()?;
        info!(
            path = %path.display(),
            version = %artifact.artifact_version,
            schema = %artifact.schema.version,
            columns = artifact.schema.len(),
            "Model artifact loaded"
        );
        Ok(artifact)
    }

    /// Serialize to a JSON file (used by the offline training/calibration run).
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        self.validate()?;
        let raw = serde_json::to_string_pretty(self).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, raw).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Structural consistency: one coefficient per column.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != self.schema.len() {
            return Err(ModelError::CoefficientMismatch {
                columns: self.schema.len(),
                coefficients: self.coefficients.len(),
            });
        }
        Ok(())
    }
}

impl ExcessRatioModel for ModelArtifact {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        if features.schema != self.schema {
            return Err(ModelError::SchemaMismatch {
                expected: format!(
                    "{} ({} cols)",
                    self.schema.version,
                    self.schema.len()
                ),
                found: format!(
                    "{} ({} cols)",
                    features.schema.version,
                    features.schema.len()
                ),
            });
        }
        let mut out = Vec::with_capacity(features.rows.len());
        for row in &features.rows {
            if row.len() != self.coefficients.len() {
                return Err(ModelError::RowWidth {
                    expected: self.coefficients.len(),
                    found: row.len(),
                });
            }
            let dot: f64 = row
                .iter()
                .zip(self.coefficients.iter())
                .map(|(x, w)| x * w)
                .sum();
            out.push(self.intercept + dot);
        }
        Ok(out)
    }

    fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn version(&self) -> &str {
        &self.artifact_version
    }

    fn efficiency_version(&self) -> &str {
        &self.efficiency_version
    }
}
