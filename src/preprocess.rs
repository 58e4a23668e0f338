//! Deterministic encoding of feature rows into fixed-width numeric vectors
//!
//! Numeric columns are z-scored with mean/std frozen at fit time; categorical
//! columns are one-hot encoded over the category set observed at fit time.
//! The output width and column order are identical for every call after a
//! given fit, which is the contract the serving path depends on.

use crate::error::ChurnError;
use crate::features::{FeatureRow, CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Frozen mean/std for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub mean: f64,
    pub std: f64,
}

/// A preprocessing transform fitted on training rows.
///
/// `categories` holds, per categorical column, the sorted set of values seen
/// at fit time; sorting makes the one-hot layout independent of row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    numeric: Vec<NumericStats>,
    categories: Vec<Vec<String>>,
}

impl FittedPreprocessor {
    /// Compute per-column statistics and category sets from training rows.
    ///
    /// Fitting on an empty input set is a configuration error: the transform
    /// it would produce has no usable width.
    pub fn fit(rows: &[FeatureRow]) -> Result<Self, ChurnError> {
        if rows.is_empty() {
            return Err(ChurnError::Configuration(
                "cannot fit preprocessing transform on an empty input set".to_string(),
            ));
        }

        let n = rows.len() as f64;
        let mut numeric = Vec::with_capacity(NUMERIC_FEATURES.len());
        for col in 0..NUMERIC_FEATURES.len() {
            let mean = rows.iter().map(|r| r.numerics[col]).sum::<f64>() / n;
            let variance = rows
                .iter()
                .map(|r| (r.numerics[col] - mean).powi(2))
                .sum::<f64>()
                / n;
            let std = variance.sqrt();
            // a constant column standardizes to zero, not to NaN
            let std = if std == 0.0 { 1.0 } else { std };
            numeric.push(NumericStats { mean, std });
        }

        let mut categories = Vec::with_capacity(CATEGORICAL_FEATURES.len());
        for col in 0..CATEGORICAL_FEATURES.len() {
            let observed: BTreeSet<&str> =
                rows.iter().map(|r| r.categoricals[col].as_str()).collect();
            categories.push(observed.into_iter().map(str::to_string).collect());
        }

        Ok(Self { numeric, categories })
    }

    /// Width of the encoded vector: numeric columns plus the one-hot width
    /// of every categorical column.
    pub fn n_output_features(&self) -> usize {
        self.numeric.len() + self.categories.iter().map(Vec::len).sum::<usize>()
    }

    /// Encode one row. Never fails: a categorical value not seen at fit
    /// time encodes its column as all zeros, indistinguishable from the
    /// reference encoding — an accepted approximation, not an error.
    pub fn transform(&self, row: &FeatureRow) -> Vec<f64> {
        debug_assert_eq!(row.categoricals.len(), self.categories.len());

        let mut out = Vec::with_capacity(self.n_output_features());
        for (stats, value) in self.numeric.iter().zip(row.numerics.iter()) {
            out.push((value - stats.mean) / stats.std);
        }
        for (known, value) in self.categories.iter().zip(row.categoricals.iter()) {
            let hit = known.binary_search(value).ok();
            for i in 0..known.len() {
                out.push(if hit == Some(i) { 1.0 } else { 0.0 });
            }
        }
        out
    }

    /// Encode a batch of rows into an `(n_rows, n_output_features)` matrix.
    pub fn transform_batch(&self, rows: &[FeatureRow]) -> Array2<f64> {
        let width = self.n_output_features();
        let mut data = Vec::with_capacity(rows.len() * width);
        for row in rows {
            data.extend(self.transform(row));
        }
        Array2::from_shape_vec((rows.len(), width), data)
            .expect("transform emits a fixed width per row")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{assemble, TenureBucketizer};
    use crate::record::sample_record;

    fn sample_rows() -> Vec<FeatureRow> {
        let bucketizer = TenureBucketizer::new();
        let mut records = Vec::new();
        for (tenure, contract, monthly) in [
            (1, "Month-to-month", 29.85),
            (12, "One year", 56.95),
            (40, "Two year", 42.30),
            (70, "Two year", 89.10),
        ] {
            let mut record = sample_record();
            record.tenure = tenure;
            record.contract = contract.to_string();
            record.monthly_charges = monthly;
            record.total_charges = monthly * tenure as f64;
            records.push(record);
        }
        records.iter().map(|r| assemble(r, &bucketizer)).collect()
    }

    #[test]
    fn test_fit_on_empty_input_is_configuration_error() {
        let err = FittedPreprocessor::fit(&[]).unwrap_err();
        assert!(matches!(err, ChurnError::Configuration(_)));
    }

    #[test]
    fn test_output_width_matches_category_counts() {
        let rows = sample_rows();
        let fitted = FittedPreprocessor::fit(&rows).unwrap();

        // 3 numerics; every categorical except Contract and TenureBucket has
        // one observed value, Contract has three, TenureBucket has four.
        let expected = 3 + 15 + 3 + 4;
        assert_eq!(fitted.n_output_features(), expected);

        let matrix = fitted.transform_batch(&rows);
        assert_eq!(matrix.shape(), &[rows.len(), expected]);
    }

    #[test]
    fn test_standardization_uses_frozen_mean_and_std() {
        let rows = sample_rows();
        let fitted = FittedPreprocessor::fit(&rows).unwrap();

        let tenures: Vec<f64> = rows.iter().map(|r| r.numerics[0]).collect();
        let mean = tenures.iter().sum::<f64>() / tenures.len() as f64;
        let std = (tenures.iter().map(|t| (t - mean).powi(2)).sum::<f64>()
            / tenures.len() as f64)
            .sqrt();

        let encoded = fitted.transform(&rows[0]);
        assert!((encoded[0] - (tenures[0] - mean) / std).abs() < 1e-12);
    }

    #[test]
    fn test_constant_numeric_column_does_not_blow_up() {
        let bucketizer = TenureBucketizer::new();
        let mut record = sample_record();
        record.monthly_charges = 50.0;
        let rows = vec![
            assemble(&record, &bucketizer),
            assemble(&record, &bucketizer),
        ];
        let fitted = FittedPreprocessor::fit(&rows).unwrap();
        let encoded = fitted.transform(&rows[0]);
        assert!(encoded.iter().all(|v| v.is_finite()));
        assert_eq!(encoded[1], 0.0); // constant column standardizes to zero
    }

    #[test]
    fn test_transform_is_idempotent() {
        let rows = sample_rows();
        let fitted = FittedPreprocessor::fit(&rows).unwrap();
        assert_eq!(fitted.transform(&rows[2]), fitted.transform(&rows[2]));
    }

    #[test]
    fn test_one_hot_sets_exactly_one_coordinate_per_known_column() {
        let rows = sample_rows();
        let fitted = FittedPreprocessor::fit(&rows).unwrap();
        let encoded = fitted.transform(&rows[0]);

        // every categorical block of a seen row sums to exactly 1
        let mut offset = NUMERIC_FEATURES.len();
        for known in &fitted.categories {
            let block: f64 = encoded[offset..offset + known.len()].iter().sum();
            assert_eq!(block, 1.0);
            offset += known.len();
        }
    }

    #[test]
    fn test_unseen_category_encodes_as_zero_block() {
        let rows = sample_rows();
        let fitted = FittedPreprocessor::fit(&rows).unwrap();

        let bucketizer = TenureBucketizer::new();
        let mut record = sample_record();
        record.contract = "Decade".to_string();
        let encoded = fitted.transform(&assemble(&record, &bucketizer));

        assert_eq!(encoded.len(), fitted.n_output_features());

        // locate the Contract block and check it is all zeros
        let contract_index = CATEGORICAL_FEATURES
            .iter()
            .position(|c| *c == "Contract")
            .unwrap();
        let mut offset = NUMERIC_FEATURES.len();
        for known in fitted.categories.iter().take(contract_index) {
            offset += known.len();
        }
        let width = fitted.categories[contract_index].len();
        assert!(encoded[offset..offset + width].iter().all(|v| *v == 0.0));
    }
}
