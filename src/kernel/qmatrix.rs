//! Sign-adjusted kernel matrix consumed by the solver

use crate::cache::{CacheStats, KernelCache};
use crate::core::Result;
use crate::kernel::{Kernel, KernelEvaluator};

/// Row access to the matrix `Q` of the dual problem.
///
/// Positions refer to the solver's current ordering of examples, which it
/// changes through [`QMatrix::swap_index`].
pub trait QMatrix {
    /// First `len` entries of row `i`
    fn row(&mut self, i: usize, len: usize) -> Result<&[f32]>;

    /// Exchange the examples at positions `i` and `j`
    fn swap_index(&mut self, i: usize, j: usize);
}

/// `Q[i][j] = y_i * y_j * K(x_i, x_j)` for C-SVC, backed by a [`KernelCache`]
pub struct SvcQMatrix<'a, K: Kernel> {
    evaluator: KernelEvaluator<'a, K>,
    cache: KernelCache,
    y: Vec<i8>,
}

impl<'a, K: Kernel> SvcQMatrix<'a, K> {
    /// Build the matrix for examples `x` with labels `y` (each +1 or -1) and a
    /// kernel cache of `cache_size` bytes
    pub fn new(kernel: K, x: &[&'a [f64]], y: &[i8], cache_size: usize) -> Self {
        Self {
            evaluator: KernelEvaluator::new(kernel, x),
            cache: KernelCache::with_memory_limit(x.len(), cache_size),
            y: y.to_vec(),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<K: Kernel> QMatrix for SvcQMatrix<'_, K> {
    fn row(&mut self, i: usize, len: usize) -> Result<&[f32]> {
        let (data, start) = self.cache.get(i, len)?;
        let y_i = f64::from(self.y[i]);
        for (j, q) in data.iter_mut().enumerate().skip(start) {
            *q = (y_i * f64::from(self.y[j]) * self.evaluator.value(i, j)) as f32;
        }
        Ok(data)
    }

    fn swap_index(&mut self, i: usize, j: usize) {
        self.cache.swap_index(i, j);
        self.evaluator.swap_index(i, j);
        self.y.swap(i, j);
    }
}
