//! Kernel functions for SVM
//!
//! Only the linear kernel is implemented. [`Kernel`] is the extension point
//! for other kernels: a pure function of two vectors plus its own parameters.

pub mod evaluator;
pub mod linear;
pub mod qmatrix;
pub mod traits;

pub use self::evaluator::*;
pub use self::linear::*;
pub use self::qmatrix::*;
pub use self::traits::*;

use crate::core::{KernelType, Result, SVMError};

/// Kernel values of `query` against each of `stored` under the kernel
/// selected by `kernel_type`
pub fn cross_values(kernel_type: KernelType, stored: &[&[f64]], query: &[f64]) -> Result<Vec<f64>> {
    match kernel_type {
        KernelType::Linear => KernelEvaluator::new(LinearKernel, stored).cross_row(query),
        other => Err(SVMError::InvalidParameter(format!(
            "{other:?} kernel is not supported (linear kernel only)"
        ))),
    }
}
