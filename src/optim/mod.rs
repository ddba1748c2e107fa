//! Convex minimisation for the regression sub-problems.
//!
//! Each objective implements `DiffFunction` (value plus gradient of its
//! smooth part); `Owlqn` adds an optional L1 penalty on top and minimises
//! with orthant-wise limited-memory quasi-Newton steps. With a zero L1
//! weight this is plain L-BFGS.

mod owlqn;

pub use owlqn::*;

/// A differentiable objective over `R^dimension`.
pub trait DiffFunction {
    fn dimension(&self) -> usize;

    /// Value at `x`, writing the gradient into `grad` (same length as `x`).
    fn evaluate(&self, x: &[f64], grad: &mut [f64]) -> f64;
}
