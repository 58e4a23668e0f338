//! Hyperparameter search over the declared grid
//!
//! Candidates are independent (each fits its own pipeline copies on its own
//! cross-validation folds), so they are evaluated in parallel. The winner is
//! deterministic: highest mean ROC-AUC, ties broken by first position in the
//! fixed grid order.

use crate::evaluate::{cross_validate, mean};
use crate::features::FeatureRow;
use crate::model::{LogisticRegression, Penalty};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

/// Regularization strength candidates (inverse strength, like `C`).
pub const C_GRID: [f64; 5] = [0.01, 0.1, 1.0, 10.0, 100.0];

/// Penalty candidates, in tie-break order.
pub const PENALTY_GRID: [Penalty; 2] = [Penalty::L1, Penalty::L2];

/// One evaluated candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub c: f64,
    pub penalty: Penalty,
    pub mean_auc: f64,
}

/// Search outcome: the winning configuration plus every candidate's score.
#[derive(Debug, Clone)]
pub struct TuningOutcome {
    pub best: LogisticRegression,
    pub best_score: f64,
    pub scores: Vec<CandidateScore>,
}

/// The declared grid, expanded in fixed iteration order.
pub fn param_grid(base: &LogisticRegression) -> Vec<LogisticRegression> {
    let mut grid = Vec::with_capacity(C_GRID.len() * PENALTY_GRID.len());
    for &c in &C_GRID {
        for &penalty in &PENALTY_GRID {
            grid.push(LogisticRegression {
                c,
                penalty,
                ..base.clone()
            });
        }
    }
    grid
}

/// Score every grid candidate with stratified k-fold cross-validated
/// ROC-AUC and pick the deterministic winner.
pub fn tune(
    rows: &[FeatureRow],
    labels: &[f64],
    base: &LogisticRegression,
    k: usize,
    seed: u64,
) -> crate::Result<TuningOutcome> {
    let grid = param_grid(base);

    let mean_aucs: Vec<crate::Result<f64>> = grid
        .par_iter()
        .map(|config| cross_validate(rows, labels, config, k, seed).map(|aucs| mean(&aucs)))
        .collect();

    let mut scores = Vec::with_capacity(grid.len());
    for (config, outcome) in grid.iter().zip(mean_aucs) {
        scores.push(CandidateScore {
            c: config.c,
            penalty: config.penalty,
            mean_auc: outcome?,
        });
    }

    // strict comparison keeps the first-seen candidate on ties
    let mut best_index = 0;
    for (i, score) in scores.iter().enumerate() {
        if score.mean_auc > scores[best_index].mean_auc {
            best_index = i;
        }
    }

    let best = grid[best_index].clone();
    let best_score = scores[best_index].mean_auc;
    info!(
        c = best.c,
        penalty = %best.penalty,
        mean_auc = best_score,
        "hyperparameter search finished"
    );

    Ok(TuningOutcome {
        best,
        best_score,
        scores,
    })
}
