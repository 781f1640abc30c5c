//! L2-regularized logistic regression with class weighting
//!
//! Minimizes `0.5 * ||w||^2 + C * sum_i s_i * logloss_i` over the weights `w`
//! and an unpenalized intercept, where `s_i` are per-sample class weights.
//! The solver is a damped Newton method with Armijo backtracking; it uses no
//! randomness, so a given dataset and parameter set always produce the same
//! weights.

use crate::errors::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Diagonal jitter that keeps the Newton system positive definite.
const HESSIAN_JITTER: f64 = 1e-10;
/// Armijo sufficient-decrease constant.
const ARMIJO: f64 = 1e-4;
const MIN_STEP: f64 = 1e-12;

/// Class weighting strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// Inverse-frequency weights `n / (2 * n_class)`
    #[default]
    Balanced,
    /// Every sample weighs 1
    None,
}

/// Classifier fitting parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    /// Convergence threshold on the largest gradient component
    pub tolerance: f64,
    pub class_weight: ClassWeight,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 500,
            tolerance: 1e-6,
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl TrainingParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(PredictorError::Config(format!(
                "regularization strength c must be positive, got {}",
                self.c
            )));
        }
        if self.max_iter == 0 {
            return Err(PredictorError::Config("max_iter must be at least 1".into()));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(PredictorError::Config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Per-sample weights for the given labels.
///
/// Fails with [`PredictorError::LabelCardinality`] unless both classes occur.
pub fn sample_weights(labels: &[bool], class_weight: ClassWeight) -> Result<Vec<f64>> {
    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    let found = usize::from(positives > 0) + usize::from(negatives > 0);
    if found < 2 {
        return Err(PredictorError::LabelCardinality { found });
    }

    Ok(match class_weight {
        ClassWeight::None => vec![1.0; labels.len()],
        ClassWeight::Balanced => {
            let n = labels.len() as f64;
            let pos_weight = n / (2.0 * positives as f64);
            let neg_weight = n / (2.0 * negatives as f64);
            labels
                .iter()
                .map(|&l| if l { pos_weight } else { neg_weight })
                .collect()
        }
    })
}

/// Logistic function, stable for large |z|
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

/// Fitted binary logistic regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
    iterations: usize,
    converged: bool,
}

/// Nonzero entries of one encoded row
type SparseRow = Vec<(usize, f64)>;

impl LogisticRegression {
    /// Build a model from explicit coefficients
    pub fn from_parts(weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            weights,
            intercept,
            iterations: 0,
            converged: true,
        }
    }

    /// Fit on encoded rows and boolean labels
    pub fn fit(x: &[Vec<f64>], y: &[bool], params: &TrainingParams) -> Result<Self> {
        params.validate()?;
        if x.len() != y.len() {
            return Err(PredictorError::DimensionMismatch {
                expected: x.len(),
                found: y.len(),
            });
        }
        if x.is_empty() {
            return Err(PredictorError::EmptyDataset);
        }

        let dim = x[0].len();
        if let Some(bad) = x.iter().find(|row| row.len() != dim) {
            return Err(PredictorError::DimensionMismatch {
                expected: dim,
                found: bad.len(),
            });
        }

        let weights = sample_weights(y, params.class_weight)?;
        let rows: Vec<SparseRow> = x
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(_, v)| **v != 0.0)
                    .map(|(j, v)| (j, *v))
                    .collect()
            })
            .collect();
        let targets: Vec<f64> = y.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();

        let problem = Problem {
            rows: &rows,
            targets: &targets,
            weights: &weights,
            dim,
            c: params.c,
        };

        // theta = [w_0 .. w_{dim-1}, intercept]
        let mut theta = vec![0.0; dim + 1];
        let mut objective = problem.objective(&theta);
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..params.max_iter {
            iterations = iter + 1;
            let (grad, mut hessian) = problem.gradient_and_hessian(&theta);

            let grad_max = grad.iter().fold(0.0_f64, |m, g| m.max(g.abs()));
            if grad_max <= params.tolerance {
                converged = true;
                iterations = iter;
                break;
            }

            let rhs: Vec<f64> = grad.iter().map(|g| -g).collect();
            let direction = cholesky_solve(&mut hessian, &rhs, dim + 1).ok_or_else(|| {
                PredictorError::Numerical(format!(
                    "Newton system is not positive definite at iteration {}",
                    iterations
                ))
            })?;

            let Some((candidate, candidate_objective, step)) =
                problem.line_search(&theta, objective, &grad, &direction)
            else {
                warn!(
                    "Line search found no decrease at iteration {}; keeping the current weights",
                    iterations
                );
                break;
            };

            let step_max = direction.iter().fold(0.0_f64, |m, d| m.max((step * d).abs()));
            theta = candidate;
            debug!(
                "Newton iteration {}: objective={:.6} grad_max={:.3e} step={}",
                iterations, candidate_objective, grad_max, step
            );

            let improvement = objective - candidate_objective;
            objective = candidate_objective;
            if step_max <= params.tolerance * 1e-3 || improvement.abs() <= f64::EPSILON * objective.abs() {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "Logistic regression stopped after {} iterations without converging",
                iterations
            );
        }

        let intercept = theta.pop().unwrap_or_default();
        Ok(Self {
            weights: theta,
            intercept,
            iterations,
            converged,
        })
    }

    /// Linear score `w . x + b`
    pub fn decision_function(&self, x: &[f64]) -> Result<f64> {
        if x.len() != self.weights.len() {
            return Err(PredictorError::DimensionMismatch {
                expected: self.weights.len(),
                found: x.len(),
            });
        }
        Ok(self.intercept + self.weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>())
    }

    /// Probability of the positive class
    pub fn predict_probability(&self, x: &[f64]) -> Result<f64> {
        self.decision_function(x).map(sigmoid)
    }

    /// Probability from active indicator indices of a one-hot row
    pub fn predict_probability_sparse(&self, active: &[usize]) -> Result<f64> {
        let mut score = self.intercept;
        for &idx in active {
            let w = self.weights.get(idx).ok_or(PredictorError::DimensionMismatch {
                expected: self.weights.len(),
                found: idx + 1,
            })?;
            score += w;
        }
        Ok(sigmoid(score))
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn is_finite(&self) -> bool {
        self.intercept.is_finite() && self.weights.iter().all(|w| w.is_finite())
    }
}

struct Problem<'a> {
    rows: &'a [SparseRow],
    targets: &'a [f64],
    weights: &'a [f64],
    dim: usize,
    c: f64,
}

impl Problem<'_> {
    fn score(&self, row: &SparseRow, theta: &[f64]) -> f64 {
        theta[self.dim] + row.iter().map(|&(j, v)| theta[j] * v).sum::<f64>()
    }

    fn objective(&self, theta: &[f64]) -> f64 {
        let penalty = 0.5 * theta[..self.dim].iter().map(|w| w * w).sum::<f64>();
        let loss: f64 = self
            .rows
            .iter()
            .zip(self.targets)
            .zip(self.weights)
            .map(|((row, &t), &s)| {
                let z = self.score(row, theta);
                s * (softplus(z) - t * z)
            })
            .sum();
        penalty + self.c * loss
    }

    /// Backtracking search along `direction` for a step satisfying the Armijo
    /// condition. Returns the accepted point, its objective and the step, or
    /// `None` when no step down to [`MIN_STEP`] decreases the objective enough.
    fn line_search(
        &self,
        theta: &[f64],
        objective: f64,
        grad: &[f64],
        direction: &[f64],
    ) -> Option<(Vec<f64>, f64, f64)> {
        let slope: f64 = grad.iter().zip(direction).map(|(g, d)| g * d).sum();
        let mut candidate = theta.to_vec();
        let mut step = 1.0;
        while step >= MIN_STEP {
            for ((c, t), d) in candidate.iter_mut().zip(theta).zip(direction) {
                *c = t + step * d;
            }
            let value = self.objective(&candidate);
            if value <= objective + ARMIJO * step * slope {
                return Some((candidate, value, step));
            }
            step *= 0.5;
        }
        None
    }

    /// Gradient and row-major Hessian of the objective
    fn gradient_and_hessian(&self, theta: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let n = self.dim + 1;
        let mut grad = vec![0.0; n];
        let mut hessian = vec![0.0; n * n];

        for j in 0..self.dim {
            grad[j] = theta[j];
            hessian[j * n + j] = 1.0;
        }
        for j in 0..n {
            hessian[j * n + j] += HESSIAN_JITTER;
        }

        let bias = self.dim;
        for ((row, &t), &s) in self.rows.iter().zip(self.targets).zip(self.weights) {
            let p = sigmoid(self.score(row, theta));
            let residual = self.c * s * (p - t);
            let curvature = self.c * s * p * (1.0 - p);

            for &(j, v) in row {
                grad[j] += residual * v;
                hessian[j * n + bias] += curvature * v;
                hessian[bias * n + j] += curvature * v;
                for &(k, u) in row {
                    hessian[j * n + k] += curvature * v * u;
                }
            }
            grad[bias] += residual;
            hessian[bias * n + bias] += curvature;
        }

        (grad, hessian)
    }
}

/// Solve `A x = b` for symmetric positive definite `A` (row-major, n x n).
///
/// `a` is overwritten with its Cholesky factor. Returns `None` when `A` is not
/// positive definite.
fn cholesky_solve(a: &mut [f64], b: &[f64], n: usize) -> Option<Vec<f64>> {
    for j in 0..n {
        let mut diag = a[j * n + j];
        for k in 0..j {
            diag -= a[j * n + k] * a[j * n + k];
        }
        if !(diag > 0.0) || !diag.is_finite() {
            return None;
        }
        let diag = diag.sqrt();
        a[j * n + j] = diag;

        for i in (j + 1)..n {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= a[i * n + k] * a[j * n + k];
            }
            a[i * n + j] = sum / diag;
        }
    }

    // L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= a[i * n + k] * y[k];
        }
        y[i] = sum / a[i * n + i];
    }

    // L^T x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= a[k * n + i] * x[k];
        }
        x[i] = sum / a[i * n + i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(idx: usize, dim: usize) -> Vec<f64> {
        let mut row = vec![0.0; dim];
        row[idx] = 1.0;
        row
    }

    #[test]
    fn test_sigmoid_is_bounded_and_symmetric() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_weights_equalize_class_mass() {
        let labels = vec![true, true, true, false];
        let w = sample_weights(&labels, ClassWeight::Balanced).unwrap();
        let pos: f64 = w.iter().zip(&labels).filter(|(_, l)| **l).map(|(w, _)| w).sum();
        let neg: f64 = w.iter().zip(&labels).filter(|(_, l)| !**l).map(|(w, _)| w).sum();
        assert!((pos - neg).abs() < 1e-12);
        assert!((w[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((w[3] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_class_is_rejected() {
        let x = vec![vec![1.0], vec![0.0]];
        let err = LogisticRegression::fit(&x, &[true, true], &TrainingParams::default()).unwrap_err();
        assert!(matches!(err, PredictorError::LabelCardinality { found: 1 }));
    }

    #[test]
    fn test_fit_learns_direction() {
        // category 0 mostly wins, category 1 mostly loses
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            x.push(one_hot(0, 2));
            y.push(i % 4 != 0);
            x.push(one_hot(1, 2));
            y.push(i % 4 == 0);
        }

        let model = LogisticRegression::fit(&x, &y, &TrainingParams::default()).unwrap();
        assert!(model.converged());
        assert!(model.is_finite());
        let p0 = model.predict_probability(&one_hot(0, 2)).unwrap();
        let p1 = model.predict_probability(&one_hot(1, 2)).unwrap();
        assert!(p0 > 0.5, "p0 = {}", p0);
        assert!(p1 < 0.5, "p1 = {}", p1);
        assert!((model.predict_probability_sparse(&[0]).unwrap() - p0).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_weighting_counters_majority() {
        // one uninformative feature; 80% positives
        let x: Vec<Vec<f64>> = (0..50).map(|_| vec![1.0]).collect();
        let y: Vec<bool> = (0..50).map(|i| i % 5 != 0).collect();

        let balanced = LogisticRegression::fit(&x, &y, &TrainingParams::default()).unwrap();
        let p = balanced.predict_probability(&[1.0]).unwrap();
        assert!((p - 0.5).abs() < 1e-6, "balanced p = {}", p);

        let params = TrainingParams {
            class_weight: ClassWeight::None,
            ..TrainingParams::default()
        };
        let unweighted = LogisticRegression::fit(&x, &y, &params).unwrap();
        assert!(unweighted.predict_probability(&[1.0]).unwrap() > 0.7);
    }

    #[test]
    fn test_separable_data_stays_finite() {
        let x = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let model = LogisticRegression::fit(&x, &[true, false], &TrainingParams::default()).unwrap();
        assert!(model.is_finite());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| one_hot(i % 3, 3)).collect();
        let y: Vec<bool> = (0..30).map(|i| i % 3 == 0 || i % 7 == 0).collect();
        let a = LogisticRegression::fit(&x, &y, &TrainingParams::default()).unwrap();
        let b = LogisticRegression::fit(&x, &y, &TrainingParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let model = LogisticRegression::from_parts(vec![0.5, -0.5], 0.0);
        assert!(model.predict_probability(&[1.0]).is_err());
        assert!(model.predict_probability_sparse(&[5]).is_err());
    }

    #[test]
    fn test_invalid_params() {
        let params = TrainingParams {
            c: 0.0,
            ..TrainingParams::default()
        };
        assert!(params.validate().is_err());
    }

    fn small_problem<'a>(rows: &'a [SparseRow], targets: &'a [f64], weights: &'a [f64]) -> Problem<'a> {
        Problem {
            rows,
            targets,
            weights,
            dim: 2,
            c: 1.0,
        }
    }

    #[test]
    fn test_line_search_rejects_uphill_direction() {
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)], vec![(0, 1.0)]];
        let targets = [1.0, 0.0, 0.0];
        let weights = [1.0; 3];
        let problem = small_problem(&rows, &targets, &weights);

        let theta = vec![0.0; 3];
        let objective = problem.objective(&theta);
        let (grad, _) = problem.gradient_and_hessian(&theta);
        assert!(grad.iter().any(|g| *g != 0.0));

        assert!(problem.line_search(&theta, objective, &grad, &grad).is_none());
    }

    #[test]
    fn test_line_search_accepts_descent_direction() {
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)], vec![(0, 1.0)]];
        let targets = [1.0, 0.0, 0.0];
        let weights = [1.0; 3];
        let problem = small_problem(&rows, &targets, &weights);

        let theta = vec![0.0; 3];
        let objective = problem.objective(&theta);
        let (grad, _) = problem.gradient_and_hessian(&theta);
        let descent: Vec<f64> = grad.iter().map(|g| -g).collect();

        let (point, value, step) = problem
            .line_search(&theta, objective, &grad, &descent)
            .unwrap();
        assert!(value < objective);
        assert!(step > 0.0 && step <= 1.0);
        assert_eq!(problem.objective(&point), value);
    }

    #[test]
    fn test_cholesky_solves_small_system() {
        let mut a = vec![4.0, 2.0, 2.0, 3.0];
        let x = cholesky_solve(&mut a, &[2.0, 1.0], 2).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
    }
}
