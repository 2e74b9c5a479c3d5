//! Question model, answer validation, and scoring for exercise sets.
//!
//! This crate defines the exercise-set data model, the answer validator that
//! turns a raw submission into a verdict, and the response intake that runs
//! student attempts and calls the validator for each answer.

pub mod attempt;
pub mod config;
pub mod error;
pub mod intake;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod validator;

pub use error::{IntakeError, QuestionError};
pub use validator::validate;
