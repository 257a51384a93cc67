//! Shrinking heuristic implementation
//!
//! Variables at a bound whose gradient shows they cannot join a violating
//! pair are moved behind `active_size` and skipped by working-set selection.
//! The gradient of shrunk variables goes stale while they are inactive and is
//! rebuilt from `g_bar` before they are brought back.

use super::smo::{AlphaStatus, Solver};
use crate::core::Result;
use crate::kernel::QMatrix;
use log::debug;

impl<Q: QMatrix> Solver<'_, Q> {
    /// Whether position `k` is dominated by the current maximal violations.
    ///
    /// `None` for free variables, which are never shrunk.
    fn can_be_shrunk(&self, k: usize, g_m1: f64, g_m2: f64) -> Option<bool> {
        let g = self.g[k];
        let positive = self.y[k] > 0;
        match self.alpha_status[k] {
            AlphaStatus::LowerBound if positive => Some(-g < g_m1),
            AlphaStatus::LowerBound => Some(-g < g_m2),
            AlphaStatus::UpperBound if positive => Some(g < g_m2),
            AlphaStatus::UpperBound => Some(g < g_m1),
            AlphaStatus::Free => None,
        }
    }

    pub(super) fn do_shrinking(&mut self) -> Result<()> {
        let Some((i, j)) = self.select_working_set() else {
            return Ok(());
        };
        let g_m1 = -f64::from(self.y[j]) * self.g[j];
        let g_m2 = f64::from(self.y[i]) * self.g[i];

        let mut k = 0;
        while k < self.active_size {
            if self.can_be_shrunk(k, g_m1, g_m2) == Some(true) {
                self.active_size -= 1;
                self.swap_index(k, self.active_size);
            } else {
                k += 1;
            }
        }

        // close to the optimum: bring everything back once and shrink again later
        if self.unshrunk || -(g_m1 + g_m2) > 10.0 * self.eps {
            return Ok(());
        }
        self.unshrunk = true;
        self.reconstruct_gradient()?;

        let mut k = self.l;
        while k > self.active_size {
            if self.can_be_shrunk(k - 1, g_m1, g_m2) == Some(false) {
                self.swap_index(k - 1, self.active_size);
                self.active_size += 1;
            } else {
                k -= 1;
            }
        }
        debug!("unshrink: {} of {} variables active", self.active_size, self.l);

        Ok(())
    }

    /// Recompute the gradient of the inactive positions from `g_bar` and the
    /// free active variables
    pub(super) fn reconstruct_gradient(&mut self) -> Result<()> {
        let active_size = self.active_size;
        let l = self.l;
        if active_size == l {
            return Ok(());
        }

        for k in active_size..l {
            self.g[k] = self.g_bar[k] + self.p[k];
        }

        for i in 0..active_size {
            if self.alpha_status[i] != AlphaStatus::Free {
                continue;
            }
            let alpha_i = self.alpha[i];
            let q_i = self.q.row(i, l)?;
            for (g, &q) in self.g[active_size..].iter_mut().zip(&q_i[active_size..]) {
                *g += alpha_i * f64::from(q);
            }
        }
        Ok(())
    }
}
