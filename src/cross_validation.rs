//! k-fold cross-validation
//!
//! Examples are shuffled once, split into contiguous folds over the shuffled
//! order, and every example is predicted by a model trained without its fold.

use crate::core::{Parameters, Problem, Result, SVMError, SubProblem};
use crate::optimizer::{check_parameters, rng_from_seed, train_with_rng};
use log::info;
use rand::seq::SliceRandom;

/// Predicted value of every example of `problem`, in the original order.
///
/// With `params.probability` set, predictions use the coupled class
/// probabilities. `nr_fold` larger than the number of examples is reduced to
/// leave-one-out.
pub fn cross_validate(problem: &Problem, params: &Parameters, nr_fold: usize) -> Result<Vec<f64>> {
    if problem.is_empty() {
        return Err(SVMError::EmptyDataset);
    }
    if let Some(message) = check_parameters(problem, params) {
        return Err(SVMError::InvalidParameter(message));
    }
    if nr_fold < 2 {
        return Err(SVMError::InvalidParameter(format!(
            "number of folds must be at least 2, got {nr_fold}"
        )));
    }

    let l = problem.len();
    if l < 2 {
        return Err(SVMError::InvalidParameter(format!(
            "cross-validation needs at least 2 examples, got {l}"
        )));
    }
    let nr_fold = nr_fold.min(l);
    let view = problem.view();
    let mut rng = rng_from_seed(params.seed);

    let mut perm: Vec<usize> = (0..l).collect();
    perm.shuffle(&mut rng);

    let mut target = vec![0.0; l];
    for fold in 0..nr_fold {
        let begin = fold * l / nr_fold;
        let end = (fold + 1) * l / nr_fold;

        let mut train = SubProblem::with_capacity(l - (end - begin));
        for &k in perm[..begin].iter().chain(&perm[end..]) {
            train.push(view.x[k], view.y[k]);
        }

        let model = train_with_rng(&train, params, &mut rng)?;
        for &k in &perm[begin..end] {
            target[k] = if params.probability {
                model.predict_probability(view.x[k])?.0
            } else {
                model.predict(view.x[k])?
            };
        }
    }

    let correct = target
        .iter()
        .zip(problem.labels())
        .filter(|(predicted, truth)| predicted == truth)
        .count();
    info!(
        "cross validation accuracy = {:.4}% ({correct}/{l})",
        100.0 * correct as f64 / l as f64
    );

    Ok(target)
}
