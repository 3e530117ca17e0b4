//! Arithmetic shared by every form, the line evaluator, and the form
//! calculators built on top of it.

pub mod brackets;
pub mod common;
pub mod evaluator;
pub mod forms;

pub use brackets::{BracketError, compute_bracket_tax, marginal_rate, validate_brackets};
pub use evaluator::{Clamp, LineDef, LineScope};
