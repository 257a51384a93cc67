//! Probability estimates for one-vs-one classifiers
//!
//! Each pairwise classifier gets a Platt sigmoid fitted to decision values
//! obtained by internal cross-validation. At prediction time the pairwise
//! probabilities are coupled into one distribution over all classes.

pub mod coupling;
pub mod sigmoid;

pub use self::coupling::multiclass_probability;
pub use self::sigmoid::{sigmoid_train, Sigmoid};

use crate::core::{Parameters, Result, SubProblem};
use crate::optimizer::train_with_rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Number of internal folds used to collect unbiased decision values
const NR_FOLD: usize = 5;

/// Fit the sigmoid of one binary sub-problem (labels +1/-1) trained with
/// class bounds `cp` and `cn`
pub(crate) fn binary_svc_probability(
    prob: &SubProblem<'_>,
    params: &Parameters,
    cp: f64,
    cn: f64,
    rng: &mut StdRng,
) -> Result<Sigmoid> {
    let l = prob.len();
    let mut perm: Vec<usize> = (0..l).collect();
    perm.shuffle(rng);

    let sub_params = Parameters {
        c: 1.0,
        probability: false,
        class_weights: vec![(1, cp), (-1, cn)],
        ..params.clone()
    };

    let mut dec_values = vec![0.0; l];
    for fold in 0..NR_FOLD {
        let begin = fold * l / NR_FOLD;
        let end = (fold + 1) * l / NR_FOLD;
        let held_out = &perm[begin..end];

        let mut train = SubProblem::with_capacity(l - held_out.len());
        for &k in perm[..begin].iter().chain(&perm[end..]) {
            train.push(prob.x[k], prob.y[k]);
        }

        let positives = train.y.iter().filter(|&&y| y > 0.0).count();
        let negatives = train.len() - positives;
        let constant = match (positives, negatives) {
            (0, 0) => Some(0.0),
            (_, 0) => Some(1.0),
            (0, _) => Some(-1.0),
            _ => None,
        };

        if let Some(value) = constant {
            for &k in held_out {
                dec_values[k] = value;
            }
            continue;
        }

        let submodel = train_with_rng(&train, &sub_params, rng)?;
        // the sub-model orders its classes by first appearance
        let sign = f64::from(submodel.labels()[0]);
        for &k in held_out {
            dec_values[k] = submodel.decision_values(prob.x[k])?[0] * sign;
        }
    }

    Ok(sigmoid_train(&dec_values, &prob.y))
}
