//! Trained one-vs-one model
//!
//! Support vectors are pooled across all pairwise classifiers and stored
//! grouped by class. For `k` classes, `sv_coef` has `k - 1` rows: the
//! coefficients of classifier `(i, j)` for members of class `i` live in row
//! `j - 1`, those for members of class `j` in row `i`.

pub mod predict;

use crate::core::KernelType;
use crate::probability::Sigmoid;
use serde::{Deserialize, Serialize};

/// Class index pairs `(i, j)` with `i < j`, in classifier order
pub(crate) fn class_pairs(nr_class: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..nr_class).flat_map(move |i| (i + 1..nr_class).map(move |j| (i, j)))
}

/// A trained multi-class SVM.
///
/// Serializable with any `serde` format; no file format of its own is defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub(crate) kernel_type: KernelType,
    /// Class labels in first-encounter order of the training data
    pub(crate) labels: Vec<i32>,
    /// Number of support vectors per class
    pub(crate) n_sv: Vec<usize>,
    pub(crate) support_vectors: Vec<Vec<f64>>,
    pub(crate) sv_coef: Vec<Vec<f64>>,
    /// Bias of each pairwise classifier
    pub(crate) rho: Vec<f64>,
    /// Platt sigmoid of each pairwise classifier, when trained with probability
    pub(crate) sigmoids: Option<Vec<Sigmoid>>,
    /// Index of each support vector in the training problem
    pub(crate) sv_indices: Vec<usize>,
}

impl Model {
    pub fn kernel_type(&self) -> KernelType {
        self.kernel_type
    }

    /// Number of classes seen during training
    pub fn nr_class(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Support vector count of each class, in label order
    pub fn n_sv(&self) -> &[usize] {
        &self.n_sv
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    pub fn support_vectors(&self) -> &[Vec<f64>] {
        &self.support_vectors
    }

    pub fn sv_coef(&self) -> &[Vec<f64>] {
        &self.sv_coef
    }

    pub fn rho(&self) -> &[f64] {
        &self.rho
    }

    /// Sigmoid slopes `A`, one per pairwise classifier
    pub fn prob_a(&self) -> Option<Vec<f64>> {
        self.sigmoids
            .as_ref()
            .map(|sigmoids| sigmoids.iter().map(|s| s.a).collect())
    }

    /// Sigmoid offsets `B`, one per pairwise classifier
    pub fn prob_b(&self) -> Option<Vec<f64>> {
        self.sigmoids
            .as_ref()
            .map(|sigmoids| sigmoids.iter().map(|s| s.b).collect())
    }

    pub fn support_vector_indices(&self) -> &[usize] {
        &self.sv_indices
    }

    pub fn has_probability_model(&self) -> bool {
        self.sigmoids.is_some()
    }
}
