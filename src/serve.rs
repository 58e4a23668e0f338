//! Prediction service: load the frozen artifact bundle once, answer
//! single-customer prediction requests
//!
//! The bundle is loaded before the HTTP listener binds, so the service is
//! either fully ready or not running at all. Requests only read the loaded
//! bundle; they may be served concurrently without locking.

use crate::error::ChurnError;
use crate::features::assemble;
use crate::pipeline::ModelArtifacts;
use crate::record::CustomerRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use warp::{Filter, Reply};

/// Conclusion shown when the rounded probability reaches the 0.5 threshold.
pub const CONCLUSION_LIKELY: &str = "Customer is likely to churn";
/// Conclusion shown below the threshold.
pub const CONCLUSION_UNLIKELY: &str = "Customer is unlikely to churn";

/// Response for one scored customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub churn_probability: f64,
    pub conclusion: String,
}

/// A loaded, immutable artifact bundle ready to serve predictions.
pub struct PredictionService {
    artifacts: ModelArtifacts,
}

impl PredictionService {
    /// Load the bundle from disk; any failure prevents serving entirely.
    pub fn load(path: &Path) -> Result<Self, ChurnError> {
        Ok(Self {
            artifacts: ModelArtifacts::load(path)?,
        })
    }

    /// Wrap an already-loaded bundle, re-checking its consistency.
    pub fn new(artifacts: ModelArtifacts) -> Result<Self, ChurnError> {
        artifacts.pipeline.check_consistency()?;
        Ok(Self { artifacts })
    }

    /// Score one customer: validate, run the shared feature path, classify.
    /// Never refits and never mutates the bundle.
    pub fn predict(&self, record: &CustomerRecord) -> Result<PredictionResult, ChurnError> {
        record.validate()?;
        let row = assemble(record, &self.artifacts.tenure_bucket);
        let probability = self.artifacts.pipeline.predict_probability(&row);
        let rounded = round3(probability);
        Ok(PredictionResult {
            churn_probability: rounded,
            conclusion: conclusion_for(rounded).to_string(),
        })
    }
}

/// Threshold rule: 0.5 inclusive on the "likely" side, applied to the
/// already-rounded probability.
fn conclusion_for(rounded_probability: f64) -> &'static str {
    if rounded_probability >= 0.5 {
        CONCLUSION_LIKELY
    } else {
        CONCLUSION_UNLIKELY
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Serve `POST /predict` and `GET /healthz` until the process is stopped.
pub async fn run(service: Arc<PredictionService>, port: u16) {
    let service_filter = warp::any().map(move || service.clone());

    let predict = warp::path!("predict")
        .and(warp::post())
        .and(warp::body::json())
        .and(service_filter)
        .map(predict_handler);

    let healthz = warp::path!("healthz")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    let routes = predict.or(healthz).with(warp::log("churnforge"));

    info!(port, "prediction service listening");
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}

fn predict_handler(
    record: CustomerRecord,
    service: Arc<PredictionService>,
) -> impl Reply {
    match service.predict(&record) {
        Ok(result) => warp::reply::with_status(
            warp::reply::json(&result),
            warp::http::StatusCode::OK,
        ),
        Err(err) => warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "error": err.to_string() })),
            warp::http::StatusCode::BAD_REQUEST,
        ),
    }
}
