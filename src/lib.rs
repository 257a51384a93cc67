//! One-vs-one multi-class Support Vector Machine (C-SVC)
//!
//! Trains `k(k-1)/2` binary classifiers with an SMO decomposition solver and
//! an LRU kernel cache, with optional Platt-scaled probability estimates
//! coupled across classes.

pub mod api;
pub mod cache;
pub mod core;
pub mod cross_validation;
pub mod data;
pub mod kernel;
pub mod model;
pub mod optimizer;
pub mod probability;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{
    accuracy, check_parameters, cross_validate, evaluate, predict, predict_probability, train, SVM,
};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError};
pub use crate::data::LibSVMDataset;
pub use crate::kernel::{Kernel, LinearKernel};
pub use crate::model::Model;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
