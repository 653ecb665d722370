//! # Validation Walk
//!
//! Evaluates a value against a datatype: resolve extensions, run the kind's
//! type check, then every option in constraint order. The first failing
//! constraint is turned into a [`ValidationError`] with a rendered message;
//! failures inside nested datatypes propagate unchanged.

use serde_json::Value;
use shape_core::{shape_name, DefinitionError, Kind, ShapeError, ValidationError, ViolationKind};

use crate::constraint;
use crate::datatype::Datatype;
use crate::message;
use crate::outcome::Outcome;

/// Validate `value` against `datatype`.
pub(crate) fn walk(value: &Value, datatype: &Datatype) -> Result<(), ShapeError> {
    let effective = datatype.resolve()?;
    let node: &Datatype = &effective;

    if let Some(violation) = node.kind().admits(value) {
        let outcome = Outcome::new(
            Some(violation),
            value,
            Kind::check_name(violation),
            Value::String(node.kind().to_string()),
        );
        return Err(reject(node, &outcome, None).into());
    }

    for (constraint, argument) in node.options() {
        let set = constraint::set_for(node.kind(), *constraint).ok_or_else(|| {
            DefinitionError::UnsupportedConstraint {
                datatype: node.name().to_string(),
                kind: node.kind().to_string(),
                constraint: constraint.to_string(),
            }
        })?;
        let violation = set.check(node.name(), *constraint, value, argument)?;
        let outcome = Outcome::new(violation, value, constraint.as_str(), argument.to_value());
        if !outcome.passed() {
            return Err(reject(node, &outcome, set.template(*constraint)).into());
        }
    }
    Ok(())
}

fn reject(
    node: &Datatype,
    outcome: &Outcome<'_>,
    family_default: Option<&'static str>,
) -> ValidationError {
    let registry = node.registry();
    let template = message::template_for(registry.as_ref(), outcome.constraint, family_default);
    let message = message::render(&template, outcome, node.name());
    let kind = outcome.violation.unwrap_or(ViolationKind::InvalidValue);

    tracing::trace!(
        datatype = node.name(),
        constraint = outcome.constraint,
        shape = shape_name(outcome.value),
        "value rejected"
    );

    ValidationError {
        kind,
        value: outcome.value.clone(),
        constraint: outcome.constraint.to_string(),
        argument: outcome.argument.clone(),
        datatype: node.name().to_string(),
        message,
    }
}
