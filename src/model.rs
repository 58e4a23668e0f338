//! Binary logistic regression with balanced class weighting
//!
//! The trainer runs deterministic full-batch gradient descent from
//! zero-initialized weights, so a given dataset and configuration always
//! produce the same fitted model. Class imbalance is corrected inside the
//! fitting objective by weighting each sample inversely to its class
//! frequency; the data itself is never resampled. L2 regularization enters
//! the gradient directly; L1 is applied as a proximal soft-threshold step,
//! and the intercept is never penalized.

use crate::error::ChurnError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Regularization penalty applied to the weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Penalty {
    L1,
    L2,
}

impl std::fmt::Display for Penalty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Penalty::L1 => write!(f, "l1"),
            Penalty::L2 => write!(f, "l2"),
        }
    }
}

/// Trainer configuration. `c` is the inverse regularization strength: small
/// values regularize hard, large values barely at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub c: f64,
    pub penalty: Penalty,
    pub max_iter: usize,
    pub learning_rate: f64,
    pub tol: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            penalty: Penalty::L2,
            max_iter: 1000,
            learning_rate: 0.1,
            tol: 1e-6,
        }
    }
}

/// Narrow capability seam for anything that can score a feature vector.
/// Any binary probabilistic classifier satisfying this is substitutable.
pub trait ProbabilisticClassifier {
    /// Probability of the positive class, in [0, 1].
    fn predict_probability(&self, features: &[f64]) -> f64;
}

/// A fitted model: frozen weights, deterministic at inference time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedLogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
    config: LogisticRegression,
}

impl LogisticRegression {
    /// Fit on an `(n_samples, n_features)` matrix and 0/1 labels.
    ///
    /// Rejects empty input and label vectors containing a single class,
    /// since balanced weighting is undefined without both classes.
    pub fn fit(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<FittedLogisticRegression, ChurnError> {
        let n = x.nrows();
        let d = x.ncols();
        if n == 0 || d == 0 {
            return Err(ChurnError::Configuration(
                "cannot fit classifier on an empty input set".to_string(),
            ));
        }
        if y.len() != n {
            return Err(ChurnError::Configuration(format!(
                "feature matrix has {n} rows but label vector has {}",
                y.len()
            )));
        }

        let n_pos = y.iter().filter(|v| **v >= 0.5).count();
        let n_neg = n - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(ChurnError::DataQuality(
                "training labels contain a single class".to_string(),
            ));
        }

        // balanced class weights: n_samples / (n_classes * count_c)
        let w_pos = n as f64 / (2.0 * n_pos as f64);
        let w_neg = n as f64 / (2.0 * n_neg as f64);
        let sample_weights: Array1<f64> =
            y.mapv(|v| if v >= 0.5 { w_pos } else { w_neg });
        let sum_w: f64 = sample_weights.sum();
        let lambda = 1.0 / (self.c * sum_w);

        let mut weights: Array1<f64> = Array1::zeros(d);
        let mut intercept = 0.0f64;

        for _ in 0..self.max_iter {
            let logits = x.dot(&weights) + intercept;
            let probs = logits.mapv(sigmoid);
            let residuals = (&probs - y) * &sample_weights / sum_w;

            let mut grad = x.t().dot(&residuals);
            let grad_intercept = residuals.sum();

            if self.penalty == Penalty::L2 {
                grad = grad + &weights * lambda;
            }

            let step = &grad * self.learning_rate;
            weights = &weights - &step;
            intercept -= self.learning_rate * grad_intercept;

            if self.penalty == Penalty::L1 {
                let threshold = self.learning_rate * lambda;
                weights.mapv_inplace(|w| soft_threshold(w, threshold));
            }

            let max_step = step
                .iter()
                .map(|v| v.abs())
                .fold(grad_intercept.abs() * self.learning_rate, f64::max);
            if max_step < self.tol {
                break;
            }
        }

        Ok(FittedLogisticRegression {
            weights: weights.to_vec(),
            intercept,
            config: self.clone(),
        })
    }
}

impl FittedLogisticRegression {
    /// Number of input features the model was fitted on.
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Configuration the model was fitted with.
    pub fn config(&self) -> &LogisticRegression {
        &self.config
    }

    /// Probabilities for a batch of encoded rows.
    pub fn predict_proba_batch(&self, x: &Array2<f64>) -> Array1<f64> {
        let weights = Array1::from(self.weights.clone());
        (x.dot(&weights) + self.intercept).mapv(sigmoid)
    }
}

impl ProbabilisticClassifier for FittedLogisticRegression {
    fn predict_probability(&self, features: &[f64]) -> f64 {
        let logit: f64 = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercept;
        sigmoid(logit)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn soft_threshold(w: f64, threshold: f64) -> f64 {
    if w > threshold {
        w - threshold
    } else if w < -threshold {
        w + threshold
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // linearly separable 1-d data, standardized-ish scale
    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = array![[-2.0], [-1.5], [-1.0], [-0.5], [0.5], [1.0], [1.5], [2.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_sigmoid_midpoint_and_saturation() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(20.0) > 0.999);
        assert!(sigmoid(-20.0) < 0.001);
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        let config = LogisticRegression::default();
        let x = Array2::<f64>::zeros((0, 3));
        let y = Array1::<f64>::zeros(0);
        assert!(matches!(
            config.fit(&x, &y),
            Err(ChurnError::Configuration(_))
        ));
    }

    #[test]
    fn test_fit_rejects_single_class_labels() {
        let config = LogisticRegression::default();
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![1.0, 1.0, 1.0];
        assert!(matches!(
            config.fit(&x, &y),
            Err(ChurnError::DataQuality(_))
        ));
    }

    #[test]
    fn test_learns_separable_data() {
        let (x, y) = separable();
        let model = LogisticRegression::default().fit(&x, &y).unwrap();

        assert!(model.predict_probability(&[-2.0]) < 0.5);
        assert!(model.predict_probability(&[2.0]) > 0.5);

        // probabilities are monotone in the single feature
        let p: Vec<f64> = (-4..=4)
            .map(|v| model.predict_probability(&[v as f64]))
            .collect();
        assert!(p.windows(2).all(|w| w[0] <= w[1]));
        assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable();
        let config = LogisticRegression::default();
        assert_eq!(config.fit(&x, &y).unwrap(), config.fit(&x, &y).unwrap());
    }

    #[test]
    fn test_batch_predictions_match_single() {
        let (x, y) = separable();
        let model = LogisticRegression::default().fit(&x, &y).unwrap();
        let batch = model.predict_proba_batch(&x);
        for (i, row) in x.outer_iter().enumerate() {
            let single = model.predict_probability(row.as_slice().unwrap());
            assert!((batch[i] - single).abs() < 1e-12);
        }
    }

    #[test]
    fn test_stronger_regularization_shrinks_weights() {
        let (x, y) = separable();
        let loose = LogisticRegression {
            c: 100.0,
            ..Default::default()
        };
        let tight = LogisticRegression {
            c: 0.01,
            ..Default::default()
        };
        let w_loose = loose.fit(&x, &y).unwrap().weights[0].abs();
        let w_tight = tight.fit(&x, &y).unwrap().weights[0].abs();
        assert!(w_tight < w_loose);
    }

    #[test]
    fn test_l1_drives_irrelevant_feature_toward_zero() {
        // second feature carries no signal
        let x = array![
            [-2.0, 0.3],
            [-1.5, 0.3],
            [-1.0, 0.3],
            [-0.5, 0.3],
            [0.5, 0.3],
            [1.0, 0.3],
            [1.5, 0.3],
            [2.0, 0.3]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let config = LogisticRegression {
            penalty: Penalty::L1,
            ..Default::default()
        };
        let model = config.fit(&x, &y).unwrap();
        assert!(model.weights[1].abs() < 1e-3);
        assert!(model.weights[0] > 0.1);
    }

    #[test]
    fn test_balanced_weights_counter_class_imbalance() {
        // nine negatives, one positive, overlapping region around zero:
        // without weighting the model would sit far on the negative side
        let x = array![
            [-1.0],
            [-0.9],
            [-0.8],
            [-0.7],
            [-0.6],
            [-0.5],
            [-0.4],
            [-0.3],
            [-0.2],
            [0.4]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let model = LogisticRegression::default().fit(&x, &y).unwrap();

        // the lone positive still scores above one-half under balanced
        // weighting
        assert!(model.predict_probability(&[0.4]) > 0.5);
    }
}
