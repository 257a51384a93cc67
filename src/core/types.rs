//! Core type definitions for SVM training

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};

/// Labeled training data: dense feature vectors paired 1:1 with labels
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    features: Vec<Vec<f64>>,
    labels: Vec<f64>,
}

impl Problem {
    /// Create a problem, checking that every feature vector has the same length
    /// and that there is exactly one label per vector
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<f64>) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(SVMError::InvalidDataset(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }

        if let Some(first) = features.first() {
            let dim = first.len();
            if let Some(ragged) = features.iter().find(|x| x.len() != dim) {
                return Err(SVMError::DimensionMismatch {
                    expected: dim,
                    actual: ragged.len(),
                });
            }
        }

        Ok(Self { features, labels })
    }

    /// Number of examples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if the problem has no examples
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Length of every feature vector (0 for an empty problem)
    pub fn dim(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Borrowed view used by the trainers
    pub(crate) fn view(&self) -> SubProblem<'_> {
        SubProblem {
            x: self.features.iter().map(Vec::as_slice).collect(),
            y: self.labels.clone(),
        }
    }
}

/// A freshly assembled training set that borrows its feature vectors from a
/// parent [`Problem`]. Pairwise sub-problems and cross-validation folds are
/// built as new views; the parent is never mutated.
#[derive(Debug, Clone)]
pub(crate) struct SubProblem<'a> {
    pub x: Vec<&'a [f64]>,
    pub y: Vec<f64>,
}

impl<'a> SubProblem<'a> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, x: &'a [f64], y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }
}

/// Kernel function selector.
///
/// Only [`KernelType::Linear`] is implemented. The remaining variants exist so
/// that parameter validation can name and reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KernelType {
    #[default]
    Linear,
    Polynomial,
    Rbf,
    Sigmoid,
}

/// Hyperparameters of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Kernel function
    pub kernel_type: KernelType,
    /// Penalty parameter (upper bound for alpha before class weighting)
    pub c: f64,
    /// Stopping tolerance on the maximal KKT violation
    pub eps: f64,
    /// Kernel cache size in bytes
    pub cache_size: usize,
    /// Enable the shrinking heuristic
    pub shrinking: bool,
    /// Fit Platt sigmoids so the model can output class probabilities
    pub probability: bool,
    /// Per-class multipliers on `c`, keyed by class label
    pub class_weights: Vec<(i32, f64)>,
    /// Seed for fold shuffling; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            kernel_type: KernelType::Linear,
            c: 1.0,
            eps: 0.001,
            cache_size: 100_000_000, // 100MB
            shrinking: true,
            probability: false,
            class_weights: Vec::new(),
            seed: None,
        }
    }
}

/// One trained pairwise classifier: signed dual coefficients and bias
#[derive(Debug, Clone)]
pub struct DecisionFunction {
    /// `y_i * alpha_i` for every example of the sub-problem
    pub alpha: Vec<f64>,
    pub rho: f64,
}

/// How the decomposition solver stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Maximal violation dropped below `eps`
    Converged,
    /// The iteration cap was reached first; the solution is best-effort
    IterationLimit,
}

/// Result of one solver run
#[derive(Debug, Clone)]
pub struct SolutionInfo {
    /// Dual coefficients in the caller's example order
    pub alpha: Vec<f64>,
    pub rho: f64,
    /// Final value of the dual objective
    pub obj: f64,
    pub iterations: usize,
    pub status: SolverStatus,
    pub upper_bound_p: f64,
    pub upper_bound_n: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_creation() {
        let problem = Problem::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0.0, 1.0])
            .expect("valid problem");

        assert_eq!(problem.len(), 2);
        assert_eq!(problem.dim(), 2);
        assert!(!problem.is_empty());
        assert_eq!(problem.labels(), &[0.0, 1.0]);
    }

    #[test]
    fn test_problem_label_count_mismatch() {
        let result = Problem::new(vec![vec![1.0], vec![2.0]], vec![1.0]);
        assert!(matches!(result, Err(SVMError::InvalidDataset(_))));
    }

    #[test]
    fn test_problem_ragged_features() {
        let result = Problem::new(vec![vec![1.0, 2.0], vec![3.0]], vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(SVMError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_empty_problem() {
        let problem = Problem::new(Vec::new(), Vec::new()).expect("empty is representable");
        assert!(problem.is_empty());
        assert_eq!(problem.dim(), 0);
    }

    #[test]
    fn test_view_borrows_features() {
        let problem = Problem::new(vec![vec![1.0], vec![2.0]], vec![1.0, -1.0]).unwrap();
        let view = problem.view();

        assert_eq!(view.len(), 2);
        assert_eq!(view.x[1], &[2.0]);
        assert_eq!(view.y, vec![1.0, -1.0]);
    }

    #[test]
    fn test_parameters_default() {
        let params = Parameters::default();
        assert_eq!(params.kernel_type, KernelType::Linear);
        assert_eq!(params.c, 1.0);
        assert_eq!(params.eps, 0.001);
        assert_eq!(params.cache_size, 100_000_000);
        assert!(params.shrinking);
        assert!(!params.probability);
        assert!(params.class_weights.is_empty());
        assert_eq!(params.seed, None);
    }
}
