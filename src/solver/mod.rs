//! SVM solver implementations
//!
//! This module implements the generalized Sequential Minimal Optimization
//! (SMO) decomposition with maximal-violating-pair selection and shrinking,
//! as described in "Working Set Selection Using Second Order Information
//! for Training SVM" by Fan, Chen and Lin.

pub mod shrinking;
pub mod smo;

pub use self::smo::*;
