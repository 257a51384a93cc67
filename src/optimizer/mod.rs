//! Training entry points
//!
//! This module ties parameter validation, the one-vs-one orchestration and
//! the binary trainer together into complete SVM training.

pub mod binary;
pub mod multiclass;

use crate::core::{KernelType, Parameters, Problem, Result, SVMError, SubProblem};
use crate::model::Model;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Validate `params` for training on `problem`.
///
/// Returns a description of the first problem found, or `None` when training
/// may proceed.
pub fn check_parameters(problem: &Problem, params: &Parameters) -> Option<String> {
    if params.kernel_type != KernelType::Linear {
        return Some(format!(
            "unsupported kernel type {:?} (linear kernel only)",
            params.kernel_type
        ));
    }
    if params.cache_size == 0 {
        return Some("cache_size must be > 0".to_string());
    }
    if !(params.eps > 0.0) {
        return Some("eps must be > 0".to_string());
    }
    if !(params.c > 0.0) {
        return Some("C must be > 0".to_string());
    }
    if let Some(&(label, weight)) = params.class_weights.iter().find(|(_, w)| !(*w > 0.0)) {
        return Some(format!("weight of class {label} must be > 0, got {weight}"));
    }
    if problem.is_empty() {
        return Some("training set is empty".to_string());
    }
    None
}

/// Random source for one public call: seeded when `seed` is set
pub(crate) fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Train a one-vs-one C-SVC model
pub fn train(problem: &Problem, params: &Parameters) -> Result<Model> {
    if problem.is_empty() {
        return Err(SVMError::EmptyDataset);
    }
    if let Some(message) = check_parameters(problem, params) {
        return Err(SVMError::InvalidParameter(message));
    }

    let mut rng = rng_from_seed(params.seed);
    train_with_rng(&problem.view(), params, &mut rng)
}

/// Train on an already validated view, drawing randomness from `rng`
pub(crate) fn train_with_rng(
    prob: &SubProblem<'_>,
    params: &Parameters,
    rng: &mut StdRng,
) -> Result<Model> {
    multiclass::train_one_vs_one(prob, params, rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_problem() -> Problem {
        Problem::new(
            vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![5.0, 5.0], vec![5.0, 6.0]],
            vec![0.0, 0.0, 1.0, 1.0],
        )
        .expect("valid problem")
    }

    #[test]
    fn test_default_parameters_are_valid() {
        assert_eq!(check_parameters(&toy_problem(), &Parameters::default()), None);
    }

    #[test]
    fn test_check_parameters_rejects() {
        let problem = toy_problem();
        let invalid = [
            Parameters {
                kernel_type: KernelType::Polynomial,
                ..Parameters::default()
            },
            Parameters {
                cache_size: 0,
                ..Parameters::default()
            },
            Parameters {
                eps: 0.0,
                ..Parameters::default()
            },
            Parameters {
                eps: f64::NAN,
                ..Parameters::default()
            },
            Parameters {
                c: -1.0,
                ..Parameters::default()
            },
            Parameters {
                class_weights: vec![(1, 0.0)],
                ..Parameters::default()
            },
        ];

        for params in &invalid {
            assert!(
                check_parameters(&problem, params).is_some(),
                "accepted {params:?}"
            );
        }
    }

    #[test]
    fn test_train_rejects_invalid_parameters_before_solving() {
        let params = Parameters {
            c: 0.0,
            ..Parameters::default()
        };
        let result = train(&toy_problem(), &params);
        assert!(matches!(result, Err(SVMError::InvalidParameter(_))));
    }

    #[test]
    fn test_train_empty_problem() {
        let problem = Problem::new(Vec::new(), Vec::new()).expect("empty problem");
        let result = train(&problem, &Parameters::default());
        assert!(matches!(result, Err(SVMError::EmptyDataset)));
    }

    #[test]
    fn test_train_simple_case() {
        let model = train(&toy_problem(), &Parameters::default()).expect("Training should succeed");

        assert_eq!(model.labels(), &[0, 1]);
        assert!(model.n_sv().iter().all(|&n| n > 0));
        assert_eq!(model.predict(&[0.0, 0.5]).unwrap(), 0.0);
        assert_eq!(model.predict(&[5.0, 5.5]).unwrap(), 1.0);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        use rand::Rng;

        let a: u64 = rng_from_seed(Some(9)).gen();
        let b: u64 = rng_from_seed(Some(9)).gen();
        assert_eq!(a, b);
    }
}
