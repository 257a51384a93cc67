//! Platt scaling for one binary classifier
//!
//! Fits `P(y = 1 | f) = 1 / (1 + exp(A f + B))` to decision values by Newton's
//! method with backtracking, following Lin, Lin and Weng, "A note on Platt's
//! probabilistic outputs for support vector machines".

use log::warn;
use serde::{Deserialize, Serialize};

const MAX_ITERATIONS: usize = 100;
/// Smallest step accepted by the line search
const MIN_STEP: f64 = 1e-10;
/// Diagonal added to the Hessian to keep it positive definite
const SIGMA: f64 = 1e-3;
const EPS: f64 = 1e-5;

/// Fitted sigmoid parameters of one pairwise classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sigmoid {
    pub a: f64,
    pub b: f64,
}

impl Sigmoid {
    /// Probability that the example belongs to the positive class
    pub fn predict(&self, decision_value: f64) -> f64 {
        let f_apb = decision_value * self.a + self.b;
        if f_apb >= 0.0 {
            (-f_apb).exp() / (1.0 + (-f_apb).exp())
        } else {
            1.0 / (1.0 + f_apb.exp())
        }
    }
}

/// Negative log-likelihood of targets `t` under `(a, b)`
fn objective(dec_values: &[f64], targets: &[f64], a: f64, b: f64) -> f64 {
    dec_values
        .iter()
        .zip(targets)
        .map(|(&f, &t)| {
            let f_apb = f * a + b;
            if f_apb >= 0.0 {
                t * f_apb + (-f_apb).exp().ln_1p()
            } else {
                (t - 1.0) * f_apb + f_apb.exp().ln_1p()
            }
        })
        .sum()
}

/// Fit a sigmoid to decision values and their labels (positive means class +1)
pub fn sigmoid_train(dec_values: &[f64], labels: &[f64]) -> Sigmoid {
    let prior1 = labels.iter().filter(|&&y| y > 0.0).count() as f64;
    let prior0 = labels.len() as f64 - prior1;

    // regularized targets instead of hard 0/1 labels
    let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
    let lo_target = 1.0 / (prior0 + 2.0);
    let targets: Vec<f64> = labels
        .iter()
        .map(|&y| if y > 0.0 { hi_target } else { lo_target })
        .collect();

    let mut a = 0.0;
    let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
    let mut fval = objective(dec_values, &targets, a, b);

    let mut finished = false;
    for _ in 0..MAX_ITERATIONS {
        let mut h11 = SIGMA;
        let mut h22 = SIGMA;
        let mut h21 = 0.0;
        let mut g1 = 0.0;
        let mut g2 = 0.0;
        for (&f, &t) in dec_values.iter().zip(&targets) {
            let f_apb = f * a + b;
            let (p, q) = if f_apb >= 0.0 {
                let e = (-f_apb).exp();
                (e / (1.0 + e), 1.0 / (1.0 + e))
            } else {
                let e = f_apb.exp();
                (1.0 / (1.0 + e), e / (1.0 + e))
            };
            let d2 = p * q;
            h11 += f * f * d2;
            h22 += d2;
            h21 += f * d2;
            let d1 = t - p;
            g1 += f * d1;
            g2 += d1;
        }

        if g1.abs() < EPS && g2.abs() < EPS {
            finished = true;
            break;
        }

        // Newton direction -H^-1 g
        let det = h11 * h22 - h21 * h21;
        let d_a = -(h22 * g1 - h21 * g2) / det;
        let d_b = -(-h21 * g1 + h11 * g2) / det;
        let gd = g1 * d_a + g2 * d_b;

        let mut step = 1.0;
        while step >= MIN_STEP {
            let new_a = a + step * d_a;
            let new_b = b + step * d_b;
            let new_f = objective(dec_values, &targets, new_a, new_b);
            if new_f < fval + 1e-4 * step * gd {
                a = new_a;
                b = new_b;
                fval = new_f;
                break;
            }
            step /= 2.0;
        }

        if step < MIN_STEP {
            warn!("line search fails in two-class probability estimates");
            finished = true;
            break;
        }
    }

    if !finished {
        warn!("reaching maximal iterations in two-class probability estimates");
    }

    Sigmoid { a, b }
}
