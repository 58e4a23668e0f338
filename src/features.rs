//! Tenure bucketing and feature assembly
//!
//! Training and serving both go through [`assemble`], so the column set and
//! ordering seen by the preprocessing transform can never drift between the
//! two.

use crate::record::CustomerRecord;
use serde::{Deserialize, Serialize};

/// Numeric feature columns, in encoded-vector order.
pub const NUMERIC_FEATURES: [&str; 3] = ["tenure", "MonthlyCharges", "TotalCharges"];

/// Categorical feature columns, in encoded-vector order. `SeniorCitizen` is
/// categorical despite being an integer on the wire, and `TenureBucket` is
/// derived by the bucketizer.
pub const CATEGORICAL_FEATURES: [&str; 17] = [
    "gender",
    "SeniorCitizen",
    "Partner",
    "Dependents",
    "PhoneService",
    "MultipleLines",
    "InternetService",
    "OnlineSecurity",
    "OnlineBackup",
    "DeviceProtection",
    "TechSupport",
    "StreamingTV",
    "StreamingMovies",
    "Contract",
    "PaperlessBilling",
    "PaymentMethod",
    "TenureBucket",
];

/// Divides tenure into five ordered buckets over the edges
/// `[0, 6, 12, 24, 48, 72]`.
///
/// The first interval includes its lower bound; the rest are half-open on
/// the left, so 6 falls in `0-6` and 7 in `7-12`. Tenures past the last
/// edge clamp into the last bucket: a customer beyond the observed range is
/// still a servable request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenureBucketizer {
    edges: Vec<i64>,
    labels: Vec<String>,
}

impl TenureBucketizer {
    pub fn new() -> Self {
        let edges = vec![0, 6, 12, 24, 48, 72];
        let labels = edges
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let lower = if i == 0 { w[0] } else { w[0] + 1 };
                format!("{}-{}", lower, w[1])
            })
            .collect();
        Self { edges, labels }
    }

    /// Map a tenure value to its bucket label.
    pub fn bucketize(&self, tenure: i64) -> &str {
        for (i, window) in self.edges.windows(2).enumerate() {
            if tenure <= window[1] {
                return &self.labels[i];
            }
        }
        // past the last edge: clamp
        self.labels
            .last()
            .expect("bucketizer always has at least one label")
    }

    /// All bucket labels in ascending tenure order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Default for TenureBucketizer {
    fn default() -> Self {
        Self::new()
    }
}

/// One customer's features in the exact layout the preprocessing transform
/// expects: categorical values aligned with [`CATEGORICAL_FEATURES`],
/// numeric values aligned with [`NUMERIC_FEATURES`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub categoricals: Vec<String>,
    pub numerics: [f64; 3],
}

/// Build the feature row for one record. Pure; invoked identically at
/// training and serving time.
pub fn assemble(record: &CustomerRecord, bucketizer: &TenureBucketizer) -> FeatureRow {
    let mut categoricals = Vec::with_capacity(CATEGORICAL_FEATURES.len());
    categoricals.push(record.gender.clone());
    categoricals.push(record.senior_citizen.to_string());
    categoricals.push(record.partner.clone());
    categoricals.push(record.dependents.clone());
    categoricals.push(record.phone_service.clone());
    categoricals.push(record.multiple_lines.clone());
    categoricals.push(record.internet_service.clone());
    categoricals.push(record.online_security.clone());
    categoricals.push(record.online_backup.clone());
    categoricals.push(record.device_protection.clone());
    categoricals.push(record.tech_support.clone());
    categoricals.push(record.streaming_tv.clone());
    categoricals.push(record.streaming_movies.clone());
    categoricals.push(record.contract.clone());
    categoricals.push(record.paperless_billing.clone());
    categoricals.push(record.payment_method.clone());
    categoricals.push(bucketizer.bucketize(record.tenure).to_string());

    FeatureRow {
        categoricals,
        numerics: [
            record.tenure as f64,
            record.monthly_charges,
            record.total_charges,
        ],
    }
}
