//! Index-based kernel evaluation over a training set

use crate::core::Result;
use crate::kernel::Kernel;

/// Evaluates the kernel between training examples addressed by position.
///
/// Holds its own ordering of the feature vectors so the solver can permute
/// examples without touching the caller's data.
pub struct KernelEvaluator<'a, K: Kernel> {
    kernel: K,
    x: Vec<&'a [f64]>,
}

impl<'a, K: Kernel> KernelEvaluator<'a, K> {
    pub fn new(kernel: K, x: &[&'a [f64]]) -> Self {
        Self {
            kernel,
            x: x.to_vec(),
        }
    }

    /// K(x_i, x_j) for the examples currently at positions `i` and `j`
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.kernel.compute(self.x[i], self.x[j])
    }

    /// Mirror a position swap made by the solver
    pub fn swap_index(&mut self, i: usize, j: usize) {
        self.x.swap(i, j);
    }

    /// K(x, y) for vectors outside the training set
    pub fn cross_value(&self, x: &[f64], y: &[f64]) -> Result<f64> {
        self.kernel.evaluate(x, y)
    }

    /// K(x_k, query) for every stored vector, in position order
    pub fn cross_row(&self, query: &[f64]) -> Result<Vec<f64>> {
        self.x
            .iter()
            .map(|&stored| self.cross_value(stored, query))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }
}
