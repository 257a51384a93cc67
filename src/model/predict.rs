//! Prediction with a trained model
//!
//! Kernel values against the support vectors are computed once per query
//! and shared by all pairwise decision functions.

use super::{class_pairs, Model};
use crate::core::{Result, SVMError};
use crate::kernel::cross_values;
use crate::probability::multiclass_probability;

/// Pairwise probabilities are kept away from 0 and 1 before coupling
const MIN_PROB: f64 = 1e-7;

impl Model {
    /// Decision values of all `k(k-1)/2` pairwise classifiers, in the order
    /// `(0,1), (0,2), ..., (k-2,k-1)`.
    ///
    /// A positive value favors the first class of the pair.
    pub fn decision_values(&self, x: &[f64]) -> Result<Vec<f64>> {
        let stored: Vec<&[f64]> = self.support_vectors.iter().map(Vec::as_slice).collect();
        let kvalue = cross_values(self.kernel_type, &stored, x)?;

        let mut start = Vec::with_capacity(self.nr_class());
        let mut offset = 0;
        for &count in &self.n_sv {
            start.push(offset);
            offset += count;
        }

        let values = class_pairs(self.nr_class())
            .zip(&self.rho)
            .map(|((i, j), rho)| {
                let members_i = start[i]..start[i] + self.n_sv[i];
                let members_j = start[j]..start[j] + self.n_sv[j];
                let sum_i: f64 = members_i
                    .map(|k| self.sv_coef[j - 1][k] * kvalue[k])
                    .sum();
                let sum_j: f64 = members_j.map(|k| self.sv_coef[i][k] * kvalue[k]).sum();
                sum_i + sum_j - rho
            })
            .collect();

        Ok(values)
    }

    /// Predict the label of `x` by one-vs-one voting
    pub fn predict(&self, x: &[f64]) -> Result<f64> {
        let dec_values = self.decision_values(x)?;
        let winner = vote(self.nr_class(), &dec_values);
        self.label_of(winner)
    }

    /// Predict the label of `x` together with the probability of each class
    /// (in [`Model::labels`] order).
    ///
    /// Without a probability model this is [`Model::predict`] and no
    /// probabilities are returned.
    pub fn predict_probability(&self, x: &[f64]) -> Result<(f64, Option<Vec<f64>>)> {
        let Some(sigmoids) = &self.sigmoids else {
            return Ok((self.predict(x)?, None));
        };

        let nr_class = self.nr_class();
        let dec_values = self.decision_values(x)?;

        let mut pairwise = vec![vec![0.0; nr_class]; nr_class];
        for (((i, j), &value), sigmoid) in class_pairs(nr_class).zip(&dec_values).zip(sigmoids) {
            let p = sigmoid.predict(value).clamp(MIN_PROB, 1.0 - MIN_PROB);
            pairwise[i][j] = p;
            pairwise[j][i] = 1.0 - p;
        }
        let estimates = multiclass_probability(&pairwise);

        let winner = argmax(&estimates);
        Ok((self.label_of(winner)?, Some(estimates)))
    }

    fn label_of(&self, class: usize) -> Result<f64> {
        self.labels
            .get(class)
            .map(|&label| f64::from(label))
            .ok_or_else(|| SVMError::InvalidDataset("model has no classes".to_string()))
    }
}

/// Index of the class with the most pairwise wins; ties go to the lowest index
pub(crate) fn vote(nr_class: usize, dec_values: &[f64]) -> usize {
    let mut votes = vec![0usize; nr_class];
    for ((i, j), &value) in class_pairs(nr_class).zip(dec_values) {
        if value > 0.0 {
            votes[i] += 1;
        } else {
            votes[j] += 1;
        }
    }
    argmax(&votes)
}

/// First index holding the maximum
fn argmax<T: PartialOrd>(values: &[T]) -> usize {
    let mut best = 0;
    for (k, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = k;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KernelType;
    use crate::probability::Sigmoid;
    use approx::assert_abs_diff_eq;

    /// Two classes on the real line separated at zero: f(x) = x
    fn line_model() -> Model {
        Model {
            kernel_type: KernelType::Linear,
            labels: vec![3, 7],
            n_sv: vec![1, 1],
            support_vectors: vec![vec![1.0], vec![-1.0]],
            sv_coef: vec![vec![0.5, -0.5]],
            rho: vec![0.0],
            sigmoids: None,
            sv_indices: vec![0, 1],
        }
    }

    #[test]
    fn test_vote_majority() {
        // (0,1): +0.5 -> 0, (0,2): +0.3 -> 0, (1,2): -0.1 -> 2
        assert_eq!(vote(3, &[0.5, 0.3, -0.1]), 0);
    }

    #[test]
    fn test_vote_tie_goes_to_lowest_index() {
        // cyclic: 0 beats 1, 2 beats 0, 1 beats 2
        assert_eq!(vote(3, &[1.0, -1.0, 1.0]), 0);
    }

    #[test]
    fn test_vote_zero_counts_for_second_class() {
        assert_eq!(vote(2, &[0.0]), 1);
    }

    #[test]
    fn test_decision_values_and_predict() {
        let model = line_model();

        let values = model.decision_values(&[2.0]).unwrap();
        assert_abs_diff_eq!(values[0], 2.0, epsilon = 1e-12);
        assert_eq!(model.predict(&[2.0]).unwrap(), 3.0);
        assert_eq!(model.predict(&[-0.5]).unwrap(), 7.0);
    }

    #[test]
    fn test_predict_dimension_mismatch() {
        let model = line_model();
        assert!(matches!(
            model.predict(&[1.0, 2.0]),
            Err(SVMError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_predict_probability_without_sigmoids() {
        let model = line_model();
        let (label, estimates) = model.predict_probability(&[1.0]).unwrap();

        assert_eq!(label, 3.0);
        assert!(estimates.is_none());
    }

    #[test]
    fn test_predict_probability() {
        let mut model = line_model();
        model.sigmoids = Some(vec![Sigmoid { a: -3.0, b: 0.0 }]);

        let (label, estimates) = model.predict_probability(&[-1.0]).unwrap();
        let estimates = estimates.unwrap();

        assert_eq!(label, 7.0);
        assert!(estimates[1] > estimates[0]);
        assert_abs_diff_eq!(estimates.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_model_without_classes_is_an_error() {
        let model = Model {
            kernel_type: KernelType::Linear,
            labels: Vec::new(),
            n_sv: Vec::new(),
            support_vectors: Vec::new(),
            sv_coef: Vec::new(),
            rho: Vec::new(),
            sigmoids: Some(Vec::new()),
            sv_indices: Vec::new(),
        };

        assert!(matches!(
            model.predict(&[1.0]),
            Err(SVMError::InvalidDataset(_))
        ));
        assert!(matches!(
            model.predict_probability(&[1.0]),
            Err(SVMError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_three_class_layout() {
        // one support vector per class; coefficient rows follow the pair layout
        let model = Model {
            kernel_type: KernelType::Linear,
            labels: vec![1, 2, 3],
            n_sv: vec![1, 1, 1],
            support_vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, -1.0]],
            sv_coef: vec![vec![1.0, -1.0, -1.0], vec![1.0, 1.0, -1.0]],
            rho: vec![0.0, 0.0, 0.0],
            sigmoids: None,
            sv_indices: vec![0, 1, 2],
        };

        assert_eq!(model.predict(&[1.0, 0.0]).unwrap(), 1.0);
        assert_eq!(model.predict(&[0.0, 1.0]).unwrap(), 2.0);
        assert_eq!(model.predict(&[-1.0, -1.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_predict_is_idempotent() {
        let model = line_model();
        let first = model.predict(&[0.25]).unwrap();
        let second = model.predict(&[0.25]).unwrap();
        assert_eq!(first, second);
    }
}
