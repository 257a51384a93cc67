//! One-vs-one multi-class training
//!
//! Groups the examples by class, trains one binary classifier per class pair
//! and pools the support vectors of all pairs into a single [`Model`].

use crate::core::{DecisionFunction, Parameters, Result, SVMError, SubProblem};
use crate::model::{class_pairs, Model};
use crate::optimizer::binary::train_one;
use crate::probability::binary_svc_probability;
use log::{info, warn};
use rand::rngs::StdRng;

/// Examples grouped by class, classes numbered in first-encounter order
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClassGroups {
    pub labels: Vec<i32>,
    pub count: Vec<usize>,
    pub start: Vec<usize>,
    /// Original index of each example in grouped order
    pub perm: Vec<usize>,
}

impl ClassGroups {
    pub fn new(y: &[f64]) -> Self {
        let mut labels: Vec<i32> = Vec::new();
        let mut count: Vec<usize> = Vec::new();
        let mut class_of = Vec::with_capacity(y.len());

        for &value in y {
            let label = value as i32;
            let class = match labels.iter().position(|&l| l == label) {
                Some(class) => {
                    count[class] += 1;
                    class
                }
                None => {
                    labels.push(label);
                    count.push(1);
                    labels.len() - 1
                }
            };
            class_of.push(class);
        }

        let start = offsets(&count);
        let mut next = start.clone();
        let mut perm = vec![0; y.len()];
        for (index, &class) in class_of.iter().enumerate() {
            perm[next[class]] = index;
            next[class] += 1;
        }

        Self {
            labels,
            count,
            start,
            perm,
        }
    }

    pub fn nr_class(&self) -> usize {
        self.labels.len()
    }
}

/// Running start offsets of consecutive blocks of the given sizes
fn offsets(sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .scan(0, |acc, &size| {
            let start = *acc;
            *acc += size;
            Some(start)
        })
        .collect()
}

/// Accumulates `(row, slot, coefficient)` entries of the support-vector
/// coefficient matrix and materializes it once all pairs are known
#[derive(Debug, Default)]
pub(crate) struct CoefficientBuilder {
    entries: Vec<(usize, usize, f64)>,
}

impl CoefficientBuilder {
    pub fn push(&mut self, row: usize, slot: usize, coef: f64) {
        self.entries.push((row, slot, coef));
    }

    /// Dense `rows x slots` matrix; unset entries are zero
    pub fn build(self, rows: usize, slots: usize) -> Vec<Vec<f64>> {
        let mut matrix = vec![vec![0.0; slots]; rows];
        for (row, slot, coef) in self.entries {
            matrix[row][slot] = coef;
        }
        matrix
    }
}

/// `c` scaled by the class weights, one entry per class slot
fn weighted_c(labels: &[i32], params: &Parameters) -> Vec<f64> {
    let mut weighted = vec![params.c; labels.len()];
    for &(label, weight) in &params.class_weights {
        match labels.iter().position(|&l| l == label) {
            Some(class) => weighted[class] *= weight,
            None => warn!("class label {label} specified in weight is not found"),
        }
    }
    weighted
}

/// Train all pairwise classifiers and assemble the model
pub(crate) fn train_one_vs_one(
    prob: &SubProblem<'_>,
    params: &Parameters,
    rng: &mut StdRng,
) -> Result<Model> {
    let groups = ClassGroups::new(&prob.y);
    let nr_class = groups.nr_class();
    if nr_class == 0 {
        return Err(SVMError::EmptyDataset);
    }
    let weighted_c = weighted_c(&groups.labels, params);
    let x: Vec<&[f64]> = groups.perm.iter().map(|&i| prob.x[i]).collect();
    let l = x.len();

    let n_pairs = nr_class * nr_class.saturating_sub(1) / 2;
    let mut decisions: Vec<DecisionFunction> = Vec::with_capacity(n_pairs);
    let mut sigmoids = params.probability.then(|| Vec::with_capacity(n_pairs));
    let mut nonzero = vec![false; l];

    for (i, j) in class_pairs(nr_class) {
        let (si, ci) = (groups.start[i], groups.count[i]);
        let (sj, cj) = (groups.start[j], groups.count[j]);

        let mut sub_prob = SubProblem::with_capacity(ci + cj);
        for &features in &x[si..si + ci] {
            sub_prob.push(features, 1.0);
        }
        for &features in &x[sj..sj + cj] {
            sub_prob.push(features, -1.0);
        }

        if let Some(sigmoids) = sigmoids.as_mut() {
            let sigmoid =
                binary_svc_probability(&sub_prob, params, weighted_c[i], weighted_c[j], rng)?;
            sigmoids.push(sigmoid);
        }

        let f = train_one(&sub_prob, params, weighted_c[i], weighted_c[j])?;
        for (k, a) in f.alpha[..ci].iter().enumerate() {
            if a.abs() > 0.0 {
                nonzero[si + k] = true;
            }
        }
        for (k, a) in f.alpha[ci..].iter().enumerate() {
            if a.abs() > 0.0 {
                nonzero[sj + k] = true;
            }
        }
        decisions.push(f);
    }

    let n_sv: Vec<usize> = (0..nr_class)
        .map(|class| {
            let members = groups.start[class]..groups.start[class] + groups.count[class];
            nonzero[members].iter().filter(|&&nz| nz).count()
        })
        .collect();
    let nz_start = offsets(&n_sv);

    let mut support_vectors = Vec::new();
    let mut sv_indices = Vec::new();
    for (k, &features) in x.iter().enumerate() {
        if nonzero[k] {
            support_vectors.push(features.to_vec());
            sv_indices.push(groups.perm[k]);
        }
    }

    let mut coefficients = CoefficientBuilder::default();
    for ((i, j), f) in class_pairs(nr_class).zip(&decisions) {
        let (si, ci) = (groups.start[i], groups.count[i]);
        let sj = groups.start[j];

        let mut slot = nz_start[i];
        for (k, &a) in f.alpha[..ci].iter().enumerate() {
            if nonzero[si + k] {
                coefficients.push(j - 1, slot, a);
                slot += 1;
            }
        }
        let mut slot = nz_start[j];
        for (k, &a) in f.alpha[ci..].iter().enumerate() {
            if nonzero[sj + k] {
                coefficients.push(i, slot, a);
                slot += 1;
            }
        }
    }
    let sv_coef = coefficients.build(nr_class.saturating_sub(1), support_vectors.len());

    info!(
        "trained {} classifiers for {nr_class} classes, total nSV = {}",
        decisions.len(),
        support_vectors.len()
    );

    Ok(Model {
        kernel_type: params.kernel_type,
        labels: groups.labels,
        n_sv,
        support_vectors,
        sv_coef,
        rho: decisions.iter().map(|f| f.rho).collect(),
        sigmoids,
        sv_indices,
    })
}
