//! Kernel trait definition

use crate::core::{Result, SVMError};

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM.
/// Implementations are pure functions of the two vectors and their own parameters.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y) for vectors of equal length
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;

    /// Compute K(x, y), rejecting vectors of different length
    fn evaluate(&self, x: &[f64], y: &[f64]) -> Result<f64> {
        if x.len() != y.len() {
            return Err(SVMError::DimensionMismatch {
                expected: x.len(),
                actual: y.len(),
            });
        }
        Ok(self.compute(x, y))
    }
}
