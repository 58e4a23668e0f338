//! Model evaluation: ROC-AUC, per-class report, cross-validation

use crate::error::ChurnError;
use crate::features::FeatureRow;
use crate::model::LogisticRegression;
use crate::pipeline::ChurnPipeline;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

/// Threshold-independent ranking quality: probability that a random positive
/// scores above a random negative. Ties receive average rank.
pub fn roc_auc_score(y_true: &[f64], y_score: &[f64]) -> Result<f64, ChurnError> {
    if y_true.len() != y_score.len() {
        return Err(ChurnError::Configuration(format!(
            "label and score lengths differ: {} vs {}",
            y_true.len(),
            y_score.len()
        )));
    }
    let n_pos = y_true.iter().filter(|v| **v >= 0.5).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(ChurnError::DataQuality(
            "ROC-AUC needs both classes present".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|a, b| y_score[*a].total_cmp(&y_score[*b]));

    // average ranks over tied scores, then sum the positive ranks
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && y_score[order[j]] == y_score[order[i]] {
            j += 1;
        }
        let avg_rank = (i + 1 + j) as f64 / 2.0; // ranks are 1-based
        for &idx in &order[i..j] {
            if y_true[idx] >= 0.5 {
                rank_sum_pos += avg_rank;
            }
        }
        i = j;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Precision/recall/F1 and support for one class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics at the 0.5 decision threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub negative: ClassMetrics,
    pub positive: ClassMetrics,
    pub accuracy: f64,
}

pub fn classification_report(y_true: &[f64], y_score: &[f64]) -> ClassificationReport {
    let mut tp = 0usize;
    let mut tn = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (truth, score) in y_true.iter().zip(y_score.iter()) {
        let predicted_positive = *score >= 0.5;
        let actual_positive = *truth >= 0.5;
        match (actual_positive, predicted_positive) {
            (true, true) => tp += 1,
            (false, false) => tn += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
        }
    }

    let positive = class_metrics(tp, fp, fn_, tp + fn_);
    let negative = class_metrics(tn, fn_, fp, tn + fp);
    let total = y_true.len();
    let accuracy = if total == 0 {
        0.0
    } else {
        (tp + tn) as f64 / total as f64
    };
    ClassificationReport {
        negative,
        positive,
        accuracy,
    }
}

fn class_metrics(
    true_hits: usize,
    false_hits: usize,
    misses: usize,
    support: usize,
) -> ClassMetrics {
    let precision = ratio(true_hits, true_hits + false_hits);
    let recall = ratio(true_hits, true_hits + misses);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    ClassMetrics {
        precision,
        recall,
        f1,
        support,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Stratified k-fold assignment: per class, indices are shuffled with the
/// seed and dealt round-robin, so every fold keeps both classes represented.
/// Returns the test indices of each fold.
pub fn stratified_folds(labels: &[f64], k: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];

    for class in [0.0, 1.0] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(&mut rng);
        for (position, index) in indices.into_iter().enumerate() {
            folds[position % k].push(index);
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

/// Stratified k-fold cross-validation: fit a fresh pipeline on each training
/// complement and score ROC-AUC on the held-out fold. Observational only;
/// per-fold AUCs are returned for the caller to summarize.
pub fn cross_validate(
    rows: &[FeatureRow],
    labels: &[f64],
    config: &LogisticRegression,
    k: usize,
    seed: u64,
) -> crate::Result<Vec<f64>> {
    let folds = stratified_folds(labels, k, seed);
    let mut aucs = Vec::with_capacity(k);

    for fold in &folds {
        let in_fold: Vec<bool> = {
            let mut mask = vec![false; labels.len()];
            for &i in fold {
                mask[i] = true;
            }
            mask
        };
        let mut train_rows = Vec::with_capacity(labels.len() - fold.len());
        let mut train_labels = Vec::with_capacity(labels.len() - fold.len());
        let mut test_rows = Vec::with_capacity(fold.len());
        let mut test_labels = Vec::with_capacity(fold.len());
        for i in 0..labels.len() {
            if in_fold[i] {
                test_rows.push(rows[i].clone());
                test_labels.push(labels[i]);
            } else {
                train_rows.push(rows[i].clone());
                train_labels.push(labels[i]);
            }
        }

        let pipeline = ChurnPipeline::fit(&train_rows, &train_labels, config)?;
        let scores = pipeline.predict_proba_batch(&test_rows);
        aucs.push(roc_auc_score(&test_labels, &scores.to_vec())?);
    }
    Ok(aucs)
}

/// Mean of a slice; 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}
