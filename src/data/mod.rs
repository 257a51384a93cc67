//! Data loading
//!
//! Readers that turn common machine-learning file formats into dense
//! training problems.

pub mod libsvm;

pub use self::libsvm::*;
