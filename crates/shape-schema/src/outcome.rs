//! Per-constraint evaluation result.

use serde_json::Value;
use shape_core::ViolationKind;

/// What one constraint (or a kind's type check) concluded about a value.
///
/// Outcomes are transient: the validator builds one per evaluated constraint
/// and turns the first failing one into a
/// [`ValidationError`](shape_core::ValidationError).
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<'v> {
    /// `None` when the value passed.
    pub violation: Option<ViolationKind>,
    /// The value under test.
    pub value: &'v Value,
    /// Constraint name, or `type`/`integer` for type checks.
    pub constraint: &'static str,
    /// The constraint argument as reported in errors.
    pub argument: Value,
}

impl<'v> Outcome<'v> {
    pub fn new(
        violation: Option<ViolationKind>,
        value: &'v Value,
        constraint: &'static str,
        argument: Value,
    ) -> Self {
        Self {
            violation,
            value,
            constraint,
            argument,
        }
    }

    pub fn passed(&self) -> bool {
        self.violation.is_none()
    }
}
