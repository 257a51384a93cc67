//! High-level API for Support Vector Machine operations
//!
//! This module provides a builder for training parameters and the free
//! functions that make up the library surface: training, cross-validation,
//! prediction and parameter checking.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ovosvm::api::{self, SVM};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Train a model on data
//! let model = SVM::new()
//!     .with_c(1.0)
//!     .with_epsilon(0.001)
//!     .train_from_file("data.libsvm")?;
//!
//! // Make predictions
//! let label = api::predict(&model, &[0.5, 1.0])?;
//! println!("predicted {label}");
//! # Ok(())
//! # }
//! ```

use crate::core::{Parameters, Problem, Result};
use crate::data::LibSVMDataset;
use crate::model::Model;
use std::path::Path;

pub use crate::cross_validation::cross_validate;
pub use crate::optimizer::{check_parameters, train};

/// Builder for [`Parameters`] with training shortcuts
#[derive(Debug, Clone, Default)]
pub struct SVM {
    params: Parameters,
}

impl SVM {
    /// Create a new SVM with linear kernel and default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing parameters
    pub fn with_parameters(params: Parameters) -> Self {
        Self { params }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.params.c = c;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.params.eps = epsilon;
        self
    }

    /// Set kernel cache size in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.params.cache_size = cache_size;
        self
    }

    pub fn with_shrinking(mut self, shrinking: bool) -> Self {
        self.params.shrinking = shrinking;
        self
    }

    /// Train probability estimates along with the classifiers
    pub fn with_probability(mut self, probability: bool) -> Self {
        self.params.probability = probability;
        self
    }

    /// Multiply C by `weight` for examples labeled `label`
    pub fn with_class_weight(mut self, label: i32, weight: f64) -> Self {
        self.params.class_weights.push((label, weight));
        self
    }

    /// Seed the random shuffles used by cross-validation and calibration
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = Some(seed);
        self
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Train on a problem
    pub fn train(&self, problem: &Problem) -> Result<Model> {
        train(problem, &self.params)
    }

    /// Train from LibSVM format file
    pub fn train_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Model> {
        let problem = LibSVMDataset::from_file(path)?.into_problem()?;
        self.train(&problem)
    }

    /// Cross-validated predictions for every example of `problem`
    pub fn cross_validate(&self, problem: &Problem, nr_fold: usize) -> Result<Vec<f64>> {
        cross_validate(problem, &self.params, nr_fold)
    }
}

/// Predict the label of `x`
pub fn predict(model: &Model, x: &[f64]) -> Result<f64> {
    model.predict(x)
}

/// Predict the label of `x` with per-class probabilities, falling back to
/// [`predict`] when `model` has no probability model
pub fn predict_probability(model: &Model, x: &[f64]) -> Result<(f64, Option<Vec<f64>>)> {
    model.predict_probability(x)
}

/// Fraction of positions where `predicted` equals `truth`
pub fn accuracy(predicted: &[f64], truth: &[f64]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(truth)
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / predicted.len() as f64
}

/// Accuracy of `model` on a labeled problem
pub fn evaluate(model: &Model, problem: &Problem) -> Result<f64> {
    let predicted = problem
        .features()
        .iter()
        .map(|x| model.predict(x))
        .collect::<Result<Vec<f64>>>()?;
    Ok(accuracy(&predicted, problem.labels()))
}
