//! Pairwise coupling of binary probabilities into class probabilities
//!
//! Method 2 of Wu, Lin and Weng, "Probability Estimates for Multi-class
//! Classification by Pairwise Coupling".

use log::warn;

const MAX_ITERATIONS: usize = 100;
const EPS: f64 = 0.001;

/// Combine pairwise estimates `r[i][j] ~ P(class i | class i or j)` into a
/// probability for each of the `r.len()` classes.
///
/// Only the off-diagonal entries of `r` are read.
pub fn multiclass_probability(r: &[Vec<f64>]) -> Vec<f64> {
    let k = r.len();
    let mut p = vec![1.0 / k as f64; k];

    let mut q = vec![vec![0.0; k]; k];
    for t in 0..k {
        for j in 0..k {
            if j == t {
                continue;
            }
            q[t][t] += r[j][t] * r[j][t];
            q[t][j] = -r[j][t] * r[t][j];
        }
    }

    let mut qp = vec![0.0; k];
    let mut converged = false;
    for _ in 0..MAX_ITERATIONS {
        // recompute Qp and pQp from scratch each round for accuracy
        let mut pqp = 0.0;
        for t in 0..k {
            qp[t] = q[t].iter().zip(&p).map(|(a, b)| a * b).sum();
            pqp += p[t] * qp[t];
        }
        let max_error = qp.iter().map(|&v| (v - pqp).abs()).fold(0.0, f64::max);
        if max_error < EPS {
            converged = true;
            break;
        }

        for t in 0..k {
            let diff = (-qp[t] + pqp) / q[t][t];
            p[t] += diff;
            pqp = (pqp + diff * (diff * q[t][t] + 2.0 * qp[t])) / (1.0 + diff) / (1.0 + diff);
            for j in 0..k {
                qp[j] = (qp[j] + diff * q[t][j]) / (1.0 + diff);
                p[j] /= 1.0 + diff;
            }
        }
    }

    if !converged {
        warn!("exceeds max_iter in multiclass_prob");
    }
    p
}
