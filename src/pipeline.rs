//! Composite pipeline and persisted artifact bundle
//!
//! The pipeline couples the fitted preprocessing transform with the fitted
//! classifier so every prediction runs through exactly the encoding the
//! classifier was trained on. The artifact bundle is written once at the end
//! of a training run and loaded once at service startup; it is never mutated
//! afterwards.

use crate::error::ChurnError;
use crate::features::{FeatureRow, TenureBucketizer};
use crate::model::{
    FittedLogisticRegression, LogisticRegression, ProbabilisticClassifier,
};
use crate::preprocess::FittedPreprocessor;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// Fitted preprocessing transform plus fitted classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnPipeline {
    pub preprocessor: FittedPreprocessor,
    pub classifier: FittedLogisticRegression,
}

impl ChurnPipeline {
    /// Fit the preprocessing transform on the rows, then the classifier on
    /// the encoded matrix.
    pub fn fit(
        rows: &[FeatureRow],
        labels: &[f64],
        config: &LogisticRegression,
    ) -> Result<Self, ChurnError> {
        let preprocessor = FittedPreprocessor::fit(rows)?;
        let x = preprocessor.transform_batch(rows);
        let y = Array1::from(labels.to_vec());
        let classifier = config.fit(&x, &y)?;
        Ok(Self {
            preprocessor,
            classifier,
        })
    }

    /// Churn probability for one assembled feature row.
    pub fn predict_probability(&self, row: &FeatureRow) -> f64 {
        self.classifier
            .predict_probability(&self.preprocessor.transform(row))
    }

    /// Churn probabilities for a batch of rows.
    pub fn predict_proba_batch(&self, rows: &[FeatureRow]) -> Array1<f64> {
        self.classifier
            .predict_proba_batch(&self.preprocessor.transform_batch(rows))
    }

    /// The transform and the classifier must agree on the encoded width;
    /// a mismatch means the bundle was assembled from incompatible fits.
    pub fn check_consistency(&self) -> Result<(), ChurnError> {
        let transform_width = self.preprocessor.n_output_features();
        let classifier_width = self.classifier.n_features();
        if transform_width != classifier_width {
            return Err(ChurnError::Configuration(format!(
                "preprocessing transform emits {transform_width} features but \
                 the classifier expects {classifier_width}"
            )));
        }
        Ok(())
    }
}

/// The persisted pair of named artifacts: the preprocessing + classifier
/// pipeline and the tenure bucket transformer. Consumers must load both
/// before serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifacts {
    pub pipeline: ChurnPipeline,
    pub tenure_bucket: TenureBucketizer,
}

impl ModelArtifacts {
    /// Serialize the bundle to a single binary file, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        info!(path = %path.display(), "artifact bundle saved");
        Ok(())
    }

    /// Deserialize a bundle and check it is internally consistent. The file
    /// handle is scoped to this call and released on every exit path. Any
    /// failure here is a configuration error: a service must not start
    /// serving on a partial or incompatible bundle.
    pub fn load(path: &Path) -> Result<Self, ChurnError> {
        let file = File::open(path).map_err(|e| {
            ChurnError::Configuration(format!(
                "cannot open artifact bundle {}: {e}",
                path.display()
            ))
        })?;
        let artifacts: Self =
            bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
                ChurnError::Configuration(format!(
                    "cannot decode artifact bundle {}: {e}",
                    path.display()
                ))
            })?;
        artifacts.pipeline.check_consistency()?;
        info!(path = %path.display(), "artifact bundle loaded");
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::assemble;
    use crate::record::sample_record;

    pub(crate) fn fitted_artifacts() -> ModelArtifacts {
        let bucketizer = TenureBucketizer::new();
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for (tenure, contract, monthly, churn) in [
            (1, "Month-to-month", 70.0, 1.0),
            (2, "Month-to-month", 85.0, 1.0),
            (3, "Month-to-month", 90.0, 1.0),
            (5, "Month-to-month", 75.0, 1.0),
            (30, "One year", 40.0, 0.0),
            (45, "Two year", 30.0, 0.0),
            (60, "Two year", 25.0, 0.0),
            (72, "Two year", 20.0, 0.0),
        ] {
            let mut record = sample_record();
            record.tenure = tenure;
            record.contract = contract.to_string();
            record.monthly_charges = monthly;
            record.total_charges = monthly * tenure as f64;
            rows.push(assemble(&record, &bucketizer));
            labels.push(churn);
        }
        let pipeline =
            ChurnPipeline::fit(&rows, &labels, &LogisticRegression::default()).unwrap();
        ModelArtifacts {
            pipeline,
            tenure_bucket: bucketizer,
        }
    }

    #[test]
    fn test_fitted_pipeline_is_consistent() {
        let artifacts = fitted_artifacts();
        artifacts.pipeline.check_consistency().unwrap();
    }

    #[test]
    fn test_predictions_are_probabilities() {
        let artifacts = fitted_artifacts();
        let bucketizer = &artifacts.tenure_bucket;
        let row = assemble(&sample_record(), bucketizer);
        let proba = artifacts.pipeline.predict_probability(&row);
        assert!((0.0..=1.0).contains(&proba));
    }

    #[test]
    fn test_save_load_round_trip_preserves_predictions() {
        let artifacts = fitted_artifacts();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts").join("churn.bin");
        artifacts.save(&path).unwrap();

        let loaded = ModelArtifacts::load(&path).unwrap();
        assert_eq!(loaded, artifacts);

        let row = assemble(&sample_record(), &loaded.tenure_bucket);
        assert_eq!(
            loaded.pipeline.predict_probability(&row),
            artifacts.pipeline.predict_probability(&row)
        );
    }

    #[test]
    fn test_load_missing_bundle_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelArtifacts::load(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, ChurnError::Configuration(_)));
    }

    #[test]
    fn test_load_corrupt_bundle_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"not a bundle").unwrap();
        let err = ModelArtifacts::load(&path).unwrap_err();
        assert!(matches!(err, ChurnError::Configuration(_)));
    }
}
