//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Generalized SMO decomposition for the dual problem
//!
//! ```text
//!     min  0.5 a^T Q a + p^T a
//!     s.t. y^T a = delta,  0 <= a_i <= C_i
//! ```
//!
//! where `C_i` is `Cp` for `y_i = +1` and `Cn` for `y_i = -1`. Each iteration
//! picks the maximal violating pair and solves the two-variable subproblem in
//! closed form. Examples are addressed by their current position; shrinking
//! moves examples behind `active_size` by swapping positions, and
//! `active_set` remembers where every position came from.

use crate::core::{Result, SVMError, SolutionInfo, SolverStatus};
use crate::kernel::QMatrix;
use log::{debug, warn};

/// Hard cap on solver iterations
pub const MAX_ITERATIONS: usize = 10_000;

/// Floor for the curvature of a pairwise step
const TAU: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AlphaStatus {
    LowerBound,
    UpperBound,
    Free,
}

/// Configuration of one solver run
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Upper bound for examples labeled +1
    pub cp: f64,
    /// Upper bound for examples labeled -1
    pub cn: f64,
    /// Stopping tolerance on the maximal violation
    pub eps: f64,
    /// Enable the shrinking heuristic
    pub shrinking: bool,
    pub max_iterations: usize,
}

impl SolverConfig {
    pub fn new(cp: f64, cn: f64, eps: f64, shrinking: bool) -> Self {
        Self {
            cp,
            cn,
            eps,
            shrinking,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

/// SMO solver state for one binary problem
pub struct Solver<'q, Q: QMatrix> {
    pub(super) q: &'q mut Q,
    pub(super) l: usize,
    pub(super) active_size: usize,
    /// Original example index of every position
    pub(super) active_set: Vec<usize>,
    pub(super) y: Vec<i8>,
    pub(super) alpha: Vec<f64>,
    pub(super) alpha_status: Vec<AlphaStatus>,
    /// Gradient of the objective
    pub(super) g: Vec<f64>,
    /// Gradient contribution of the variables at their upper bound
    pub(super) g_bar: Vec<f64>,
    /// Linear term
    pub(super) p: Vec<f64>,
    pub(super) eps: f64,
    pub(super) unshrunk: bool,
    cp: f64,
    cn: f64,
    shrinking: bool,
    max_iterations: usize,
    q_i: Vec<f64>,
    q_j: Vec<f64>,
}

impl<'q, Q: QMatrix> Solver<'q, Q> {
    /// Prepare a solver over `q` with linear term `p`, labels `y` (+1/-1) and a
    /// feasible starting point `alpha`
    pub fn new(
        q: &'q mut Q,
        p: &[f64],
        y: &[i8],
        alpha: &[f64],
        config: &SolverConfig,
    ) -> Result<Self> {
        let l = y.len();
        for len in [p.len(), alpha.len()] {
            if len != l {
                return Err(SVMError::DimensionMismatch {
                    expected: l,
                    actual: len,
                });
            }
        }

        let mut solver = Self {
            q,
            l,
            active_size: l,
            active_set: (0..l).collect(),
            y: y.to_vec(),
            alpha: alpha.to_vec(),
            alpha_status: vec![AlphaStatus::Free; l],
            g: p.to_vec(),
            g_bar: vec![0.0; l],
            p: p.to_vec(),
            eps: config.eps,
            unshrunk: false,
            cp: config.cp,
            cn: config.cn,
            shrinking: config.shrinking,
            max_iterations: config.max_iterations,
            q_i: Vec::with_capacity(l),
            q_j: Vec::with_capacity(l),
        };

        for i in 0..l {
            solver.update_alpha_status(i);
        }
        solver.initialize_gradient()?;
        Ok(solver)
    }

    fn initialize_gradient(&mut self) -> Result<()> {
        let l = self.l;
        for i in 0..l {
            if self.is_lower_bound(i) {
                continue;
            }
            let alpha_i = self.alpha[i];
            let c_i = self.get_c(i);
            let upper = self.is_upper_bound(i);

            let q_i = self.q.row(i, l)?;
            for (g, &q) in self.g.iter_mut().zip(q_i) {
                *g += alpha_i * f64::from(q);
            }
            if upper {
                for (g_bar, &q) in self.g_bar.iter_mut().zip(q_i) {
                    *g_bar += c_i * f64::from(q);
                }
            }
        }
        Ok(())
    }

    /// Run the optimization until the maximal violation drops below `eps` or
    /// the iteration cap is reached
    pub fn solve(mut self) -> Result<SolutionInfo> {
        let mut iterations = 0;
        let mut counter = self.l.min(1000) + 1;
        let mut status = SolverStatus::Converged;

        loop {
            if iterations >= self.max_iterations {
                warn!(
                    "SMO stopped after reaching the iteration limit of {}",
                    self.max_iterations
                );
                status = SolverStatus::IterationLimit;
                break;
            }

            counter -= 1;
            if counter == 0 {
                counter = self.l.min(1000);
                if self.shrinking {
                    self.do_shrinking()?;
                }
            }

            let (i, j) = match self.select_working_set() {
                Some(pair) => pair,
                None => {
                    // optimal on the active set; check again on the full set
                    self.reconstruct_gradient()?;
                    self.active_size = self.l;
                    match self.select_working_set() {
                        Some(pair) => {
                            counter = 1;
                            pair
                        }
                        None => break,
                    }
                }
            };

            iterations += 1;
            self.update_pair(i, j)?;
        }

        if self.active_size < self.l {
            self.reconstruct_gradient()?;
            self.active_size = self.l;
        }

        let rho = self.calculate_rho();
        let obj = self
            .alpha
            .iter()
            .zip(self.g.iter().zip(&self.p))
            .map(|(a, (g, p))| a * (g + p))
            .sum::<f64>()
            / 2.0;

        let mut alpha = vec![0.0; self.l];
        for (position, &original) in self.active_set.iter().enumerate() {
            alpha[original] = self.alpha[position];
        }

        debug!("optimization finished, #iter = {iterations}, obj = {obj:.6}, rho = {rho:.6}");

        Ok(SolutionInfo {
            alpha,
            rho,
            obj,
            iterations,
            status,
            upper_bound_p: self.cp,
            upper_bound_n: self.cn,
        })
    }

    /// Closed-form update of `alpha[i]` and `alpha[j]` followed by the
    /// gradient update
    fn update_pair(&mut self, i: usize, j: usize) -> Result<()> {
        let active_size = self.active_size;

        let row = self.q.row(i, active_size)?;
        self.q_i.clear();
        self.q_i.extend(row.iter().map(|&v| f64::from(v)));
        let row = self.q.row(j, active_size)?;
        self.q_j.clear();
        self.q_j.extend(row.iter().map(|&v| f64::from(v)));

        let c_i = self.get_c(i);
        let c_j = self.get_c(j);
        let old_alpha_i = self.alpha[i];
        let old_alpha_j = self.alpha[j];
        let (mut alpha_i, mut alpha_j) = (old_alpha_i, old_alpha_j);

        if self.y[i] != self.y[j] {
            let quad = (self.q_i[i] + self.q_j[j] + 2.0 * self.q_i[j]).max(TAU);
            let delta = (-self.g[i] - self.g[j]) / quad;
            let diff = alpha_i - alpha_j;
            alpha_i += delta;
            alpha_j += delta;

            if diff > 0.0 {
                if alpha_j < 0.0 {
                    alpha_j = 0.0;
                    alpha_i = diff;
                }
            } else if alpha_i < 0.0 {
                alpha_i = 0.0;
                alpha_j = -diff;
            }
            if diff > c_i - c_j {
                if alpha_i > c_i {
                    alpha_i = c_i;
                    alpha_j = c_i - diff;
                }
            } else if alpha_j > c_j {
                alpha_j = c_j;
                alpha_i = c_j + diff;
            }
        } else {
            let quad = (self.q_i[i] + self.q_j[j] - 2.0 * self.q_i[j]).max(TAU);
            let delta = (self.g[i] - self.g[j]) / quad;
            let sum = alpha_i + alpha_j;
            alpha_i -= delta;
            alpha_j += delta;

            if sum > c_i {
                if alpha_i > c_i {
                    alpha_i = c_i;
                    alpha_j = sum - c_i;
                }
            } else if alpha_j < 0.0 {
                alpha_j = 0.0;
                alpha_i = sum;
            }
            if sum > c_j {
                if alpha_j > c_j {
                    alpha_j = c_j;
                    alpha_i = sum - c_j;
                }
            } else if alpha_i < 0.0 {
                alpha_i = 0.0;
                alpha_j = sum;
            }
        }

        self.alpha[i] = alpha_i;
        self.alpha[j] = alpha_j;

        let delta_alpha_i = alpha_i - old_alpha_i;
        let delta_alpha_j = alpha_j - old_alpha_j;
        for ((g, &q_i), &q_j) in self.g[..active_size]
            .iter_mut()
            .zip(&self.q_i)
            .zip(&self.q_j)
        {
            *g += q_i * delta_alpha_i + q_j * delta_alpha_j;
        }

        let was_upper_i = self.is_upper_bound(i);
        let was_upper_j = self.is_upper_bound(j);
        self.update_alpha_status(i);
        self.update_alpha_status(j);
        if was_upper_i != self.is_upper_bound(i) {
            self.shift_g_bar(i, if was_upper_i { -c_i } else { c_i })?;
        }
        if was_upper_j != self.is_upper_bound(j) {
            self.shift_g_bar(j, if was_upper_j { -c_j } else { c_j })?;
        }

        Ok(())
    }

    /// Add `scale` times the full row `i` to `g_bar`
    fn shift_g_bar(&mut self, i: usize, scale: f64) -> Result<()> {
        let q_i = self.q.row(i, self.l)?;
        for (g_bar, &q) in self.g_bar.iter_mut().zip(q_i) {
            *g_bar += scale * f64::from(q);
        }
        Ok(())
    }

    /// Pick the maximal violating pair among the active positions.
    ///
    /// Returns `None` once the violation is below `eps`.
    pub(super) fn select_working_set(&self) -> Option<(usize, usize)> {
        // max { -grad_i * d | y_i * d = +1 } and max { -grad_i * d | y_i * d = -1 }
        let mut g_max1 = f64::NEG_INFINITY;
        let mut g_max1_idx = None;
        let mut g_max2 = f64::NEG_INFINITY;
        let mut g_max2_idx = None;

        for t in 0..self.active_size {
            let g = self.g[t];
            let (up, down) = if self.y[t] > 0 {
                ((&mut g_max1, &mut g_max1_idx), (&mut g_max2, &mut g_max2_idx))
            } else {
                ((&mut g_max2, &mut g_max2_idx), (&mut g_max1, &mut g_max1_idx))
            };
            if !self.is_upper_bound(t) && -g > *up.0 {
                *up.0 = -g;
                *up.1 = Some(t);
            }
            if !self.is_lower_bound(t) && g > *down.0 {
                *down.0 = g;
                *down.1 = Some(t);
            }
        }

        if g_max1 + g_max2 < self.eps {
            return None;
        }
        Some((g_max1_idx?, g_max2_idx?))
    }

    fn calculate_rho(&self) -> f64 {
        let mut nr_free = 0;
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut sum_free = 0.0;

        for i in 0..self.active_size {
            let y_g = f64::from(self.y[i]) * self.g[i];
            match self.alpha_status[i] {
                AlphaStatus::LowerBound if self.y[i] > 0 => upper = upper.min(y_g),
                AlphaStatus::LowerBound => lower = lower.max(y_g),
                AlphaStatus::UpperBound if self.y[i] < 0 => upper = upper.min(y_g),
                AlphaStatus::UpperBound => lower = lower.max(y_g),
                AlphaStatus::Free => {
                    nr_free += 1;
                    sum_free += y_g;
                }
            }
        }

        if nr_free > 0 {
            sum_free / nr_free as f64
        } else {
            (upper + lower) / 2.0
        }
    }

    fn get_c(&self, i: usize) -> f64 {
        if self.y[i] > 0 {
            self.cp
        } else {
            self.cn
        }
    }

    fn update_alpha_status(&mut self, i: usize) {
        self.alpha_status[i] = if self.alpha[i] >= self.get_c(i) {
            AlphaStatus::UpperBound
        } else if self.alpha[i] <= 0.0 {
            AlphaStatus::LowerBound
        } else {
            AlphaStatus::Free
        };
    }

    pub(super) fn is_upper_bound(&self, i: usize) -> bool {
        self.alpha_status[i] == AlphaStatus::UpperBound
    }

    pub(super) fn is_lower_bound(&self, i: usize) -> bool {
        self.alpha_status[i] == AlphaStatus::LowerBound
    }

    /// Exchange positions `i` and `j` in every per-example array
    pub(super) fn swap_index(&mut self, i: usize, j: usize) {
        self.q.swap_index(i, j);
        self.y.swap(i, j);
        self.g.swap(i, j);
        self.alpha_status.swap(i, j);
        self.alpha.swap(i, j);
        self.p.swap(i, j);
        self.active_set.swap(i, j);
        self.g_bar.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{LinearKernel, SvcQMatrix};
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn solve(x: &[Vec<f64>], y: &[i8], config: &SolverConfig, cache_size: usize) -> SolutionInfo {
        let rows: Vec<&[f64]> = x.iter().map(Vec::as_slice).collect();
        let mut q = SvcQMatrix::new(LinearKernel, &rows, y, cache_size);
        let p = vec![-1.0; y.len()];
        let alpha = vec![0.0; y.len()];
        Solver::new(&mut q, &p, y, &alpha, config)
            .expect("valid solver input")
            .solve()
            .expect("solver succeeds")
    }

    /// Two overlapping point clouds so that some multipliers end at the bound
    fn overlapping_clouds(n: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<i8>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut x = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        for k in 0..n {
            let label: i8 = if k % 2 == 0 { 1 } else { -1 };
            let center = f64::from(label);
            x.push(vec![
                center + rng.gen_range(-1.5..1.5),
                center + rng.gen_range(-1.5..1.5),
            ]);
            y.push(label);
        }
        (x, y)
    }

    #[test]
    fn test_two_points_closed_form() {
        let x = vec![vec![1.0], vec![-1.0]];
        let config = SolverConfig::new(10.0, 10.0, 0.001, true);
        let info = solve(&x, &[1, -1], &config, 1 << 20);

        assert_eq!(info.status, SolverStatus::Converged);
        assert_eq!(info.iterations, 1);
        assert_abs_diff_eq!(info.alpha[0], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(info.alpha[1], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(info.rho, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(info.obj, -0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_pair_clipped_to_upper_bound() {
        let x = vec![vec![1.0], vec![-1.0]];
        let config = SolverConfig::new(0.1, 0.1, 0.001, false);
        let info = solve(&x, &[1, -1], &config, 1 << 20);

        assert_abs_diff_eq!(info.alpha[0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(info.alpha[1], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(info.rho, 0.0, epsilon = 1e-9);
        assert_eq!(info.upper_bound_p, 0.1);
        assert_eq!(info.upper_bound_n, 0.1);
    }

    #[test]
    fn test_box_and_equality_constraints() {
        let (x, y) = overlapping_clouds(60, 3);
        let c = 2.0;
        let config = SolverConfig::new(c, c, 0.001, true);
        let info = solve(&x, &y, &config, 1 << 20);

        assert_eq!(info.status, SolverStatus::Converged);
        let mut balance = 0.0;
        for (&a, &label) in info.alpha.iter().zip(&y) {
            assert!((0.0..=c).contains(&a), "alpha {a} outside [0, {c}]");
            balance += f64::from(label) * a;
        }
        assert_abs_diff_eq!(balance, 0.0, epsilon = 1e-9);
        assert!(info.alpha.iter().any(|&a| a > 0.0));
    }

    #[test]
    fn test_kkt_conditions_at_solution() {
        let (x, y) = overlapping_clouds(40, 11);
        let c = 1.0;
        let eps = 1e-4;
        let config = SolverConfig::new(c, c, eps, true);
        let info = solve(&x, &y, &config, 1 << 20);

        // y_i f(x_i) >= 1 at the lower bound, <= 1 at the upper bound, = 1 when free
        let tolerance = 10.0 * eps;
        for i in 0..x.len() {
            let f: f64 = (0..x.len())
                .map(|j| {
                    let k: f64 = x[i].iter().zip(&x[j]).map(|(a, b)| a * b).sum();
                    info.alpha[j] * f64::from(y[j]) * k
                })
                .sum::<f64>()
                - info.rho;
            let margin = f64::from(y[i]) * f;
            if info.alpha[i] <= 0.0 {
                assert!(margin >= 1.0 - tolerance, "example {i}: margin {margin}");
            } else if info.alpha[i] >= c {
                assert!(margin <= 1.0 + tolerance, "example {i}: margin {margin}");
            } else {
                assert_abs_diff_eq!(margin, 1.0, epsilon = tolerance);
            }
        }
    }

    #[test]
    fn test_shrinking_reaches_same_objective() {
        let (x, y) = overlapping_clouds(80, 5);
        let with = solve(&x, &y, &SolverConfig::new(1.0, 1.0, 1e-4, true), 1 << 20);
        let without = solve(&x, &y, &SolverConfig::new(1.0, 1.0, 1e-4, false), 1 << 20);

        assert_abs_diff_eq!(with.obj, without.obj, epsilon = 1e-3);
        assert_abs_diff_eq!(with.rho, without.rho, epsilon = 1e-2);
    }

    #[test]
    fn test_small_cache_reaches_same_objective() {
        let (x, y) = overlapping_clouds(50, 9);
        let config = SolverConfig::new(1.0, 1.0, 1e-4, true);
        let large = solve(&x, &y, &config, 1 << 20);
        // room for a little more than two full rows
        let small = solve(&x, &y, &config, 4 * 120);

        assert_abs_diff_eq!(large.obj, small.obj, epsilon = 1e-4);
    }

    #[test]
    fn test_weighted_bounds() {
        let (x, y) = overlapping_clouds(40, 21);
        let (cp, cn) = (0.5, 2.0);
        let info = solve(&x, &y, &SolverConfig::new(cp, cn, 0.001, true), 1 << 20);

        for (&a, &label) in info.alpha.iter().zip(&y) {
            let bound = if label > 0 { cp } else { cn };
            assert!((0.0..=bound).contains(&a));
        }
    }

    #[test]
    fn test_iteration_limit_is_reported() {
        let (x, y) = overlapping_clouds(40, 13);
        let mut config = SolverConfig::new(10.0, 10.0, 1e-6, true);
        config.max_iterations = 1;
        let info = solve(&x, &y, &config, 1 << 20);

        assert_eq!(info.status, SolverStatus::IterationLimit);
        assert_eq!(info.iterations, 1);
        assert_eq!(info.alpha.len(), 40);
    }

    #[test]
    fn test_iteration_limit_while_shrunk_rebuilds_gradient() {
        let x = [[1.0], [2.0], [-1.0], [-2.0]];
        let y = [1, 1, -1, -1];
        let rows: Vec<&[f64]> = x.iter().map(|v| v.as_slice()).collect();
        let mut q = SvcQMatrix::new(LinearKernel, &rows, &y, 1 << 16);
        let config = SolverConfig::new(2.0, 2.0, 0.001, true);
        // both positives and both negatives split between the two bounds
        let start = [2.0, 0.0, 2.0, 0.0];
        let mut solver = Solver::new(&mut q, &[-1.0; 4], &y, &start, &config).unwrap();

        solver.do_shrinking().unwrap();
        assert_eq!(solver.active_size, 2);
        assert!(!solver.unshrunk);

        // stale values in the inactive part must not reach rho or the objective
        solver.g[2] = -50.0;
        solver.g[3] = -100.0;
        solver.max_iterations = 0;
        let info = solver.solve().unwrap();

        assert_eq!(info.status, SolverStatus::IterationLimit);
        assert_eq!(info.iterations, 0);
        assert_eq!(info.alpha, start.to_vec());

        let kernel = |i: usize, j: usize| x[i][0] * x[j][0];
        let mut expected_obj = 0.0;
        for i in 0..4 {
            for j in 0..4 {
                let q_ij = f64::from(y[i]) * f64::from(y[j]) * kernel(i, j);
                expected_obj += 0.5 * info.alpha[i] * info.alpha[j] * q_ij;
            }
            expected_obj -= info.alpha[i];
        }
        assert_abs_diff_eq!(info.obj, expected_obj, epsilon = 1e-9);
        assert_abs_diff_eq!(info.obj, 4.0, epsilon = 1e-9);

        // no free variables: rho is the midpoint of the bounds, (3 + -3) / 2
        assert_abs_diff_eq!(info.rho, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_length_mismatch() {
        let a = [1.0];
        let mut q = SvcQMatrix::new(LinearKernel, &[&a], &[1], 1024);
        let config = SolverConfig::new(1.0, 1.0, 0.001, true);
        let result = Solver::new(&mut q, &[-1.0, -1.0], &[1], &[0.0], &config);

        assert!(matches!(result, Err(SVMError::DimensionMismatch { .. })));
    }
}
