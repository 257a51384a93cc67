//! Core types shared by the solver, the trainers and the predictor

pub mod error;
pub mod types;

pub use self::error::*;
pub use self::types::*;
