//! Binary C-SVC trainer
//!
//! Turns one two-class sub-problem into a [`DecisionFunction`]: labels are
//! mapped to +1/-1, the solver runs with an all `-1` linear term, and the
//! resulting multipliers are signed by label so they can be used directly as
//! support-vector weights.

use crate::core::{DecisionFunction, KernelType, Parameters, Result, SVMError, SubProblem};
use crate::kernel::{Kernel, LinearKernel, SvcQMatrix};
use crate::solver::{Solver, SolverConfig};
use log::debug;
use std::mem;

/// Train one binary classifier with per-class bounds `cp` (label > 0) and
/// `cn` (label <= 0)
pub(crate) fn train_one(
    prob: &SubProblem<'_>,
    params: &Parameters,
    cp: f64,
    cn: f64,
) -> Result<DecisionFunction> {
    match params.kernel_type {
        KernelType::Linear => solve_c_svc(prob, LinearKernel, params, cp, cn),
        other => Err(SVMError::InvalidParameter(format!(
            "{other:?} kernel is not supported (linear kernel only)"
        ))),
    }
}

fn solve_c_svc<K: Kernel>(
    prob: &SubProblem<'_>,
    kernel: K,
    params: &Parameters,
    cp: f64,
    cn: f64,
) -> Result<DecisionFunction> {
    let l = prob.len();
    let y: Vec<i8> = prob.y.iter().map(|&label| if label > 0.0 { 1 } else { -1 }).collect();
    let p = vec![-1.0; l];
    let alpha = vec![0.0; l];

    // at least two full rows must fit in the cache
    let cache_size = params.cache_size.max(2 * l * mem::size_of::<f32>());
    let mut q = SvcQMatrix::new(kernel, &prob.x, &y, cache_size);
    let config = SolverConfig::new(cp, cn, params.eps, params.shrinking);
    let info = Solver::new(&mut q, &p, &y, &alpha, &config)?.solve()?;

    let stats = q.cache_stats();
    debug!(
        "kernel cache: {} hits, {} misses, hit rate {:.1}%",
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );

    if cp == cn {
        let sum_alpha: f64 = info.alpha.iter().sum();
        debug!("nu = {:.6}", sum_alpha / (cp * l as f64));
    }

    let mut n_sv = 0;
    let mut n_bsv = 0;
    for (&a, &label) in info.alpha.iter().zip(&y) {
        if a > 0.0 {
            n_sv += 1;
            let bound = if label > 0 {
                info.upper_bound_p
            } else {
                info.upper_bound_n
            };
            if a >= bound {
                n_bsv += 1;
            }
        }
    }
    debug!("obj = {:.6}, rho = {:.6}, nSV = {n_sv}, nBSV = {n_bsv}", info.obj, info.rho);

    let alpha = info
        .alpha
        .iter()
        .zip(&y)
        .map(|(&a, &label)| a * f64::from(label))
        .collect();

    Ok(DecisionFunction {
        alpha,
        rho: info.rho,
    })
}
