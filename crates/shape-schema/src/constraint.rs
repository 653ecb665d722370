//! # Constraint Sets
//!
//! Each kind supports a fixed table of constraint families. A family is a
//! [`ConstraintSet`]: it declares the constraints it owns, their default
//! message templates, and how each one checks a value. The table is what
//! definition compilation consults to reject constraints a kind does not
//! support, and what the validator walks to evaluate a value.
//!
//! | Kind              | Families                                              |
//! |-------------------|-------------------------------------------------------|
//! | none, boolean     | equality                                              |
//! | string            | equality, length, pattern, membership, containment    |
//! | number, integer   | equality, ordering, membership                        |
//! | list              | length, items, containment                            |
//! | dict              | fields (with `required`), length                      |
//! | union             | candidates                                            |
//! | maybe             | optional                                              |

use serde_json::Value;
use shape_core::{
    compare_numbers, contains_value, length_of, values_equal, Constraint, DefinitionError, Kind,
    ShapeError, ViolationKind,
};
use std::cmp::Ordering;

use crate::datatype::Argument;
use crate::validate;

/// A family of constraints sharing an argument shape and a check.
pub trait ConstraintSet: Send + Sync {
    /// Family name, used in logs and `inspect` output.
    fn family(&self) -> &'static str;

    /// The constraints this family owns.
    fn constraints(&self) -> &'static [Constraint];

    /// Default message template for a constraint of this family.
    fn template(&self, _constraint: Constraint) -> Option<&'static str> {
        None
    }

    /// Evaluate one constraint. `Ok(None)` means the value passed.
    ///
    /// Families holding nested datatypes propagate the nested failure as
    /// `Err` so the innermost error surfaces unchanged.
    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError>;
}

fn malformed(datatype: &str, constraint: Constraint) -> ShapeError {
    DefinitionError::InvalidArgument {
        datatype: datatype.to_string(),
        constraint: constraint.to_string(),
        reason: "argument does not fit the constraint".to_string(),
    }
    .into()
}

fn verdict(passed: bool) -> Option<ViolationKind> {
    if passed {
        None
    } else {
        Some(ViolationKind::InvalidValue)
    }
}

/// `eq`, `ne`.
pub struct Equality;

impl ConstraintSet for Equality {
    fn family(&self) -> &'static str {
        "equality"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Eq, Constraint::Ne]
    }

    fn template(&self, constraint: Constraint) -> Option<&'static str> {
        match constraint {
            Constraint::Eq => Some("{value} is not equal to {option_value}"),
            Constraint::Ne => Some("{value} must not be equal to {option_value}"),
            _ => None,
        }
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let Argument::Literal(expected) = argument else {
            return Err(malformed(datatype, constraint));
        };
        let equal = values_equal(value, expected);
        Ok(verdict(if constraint == Constraint::Eq { equal } else { !equal }))
    }
}

/// `gt`, `lt`, `gte`, `lte`.
pub struct Bounds;

impl ConstraintSet for Bounds {
    fn family(&self) -> &'static str {
        "ordering"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Gt, Constraint::Lt, Constraint::Gte, Constraint::Lte]
    }

    fn template(&self, constraint: Constraint) -> Option<&'static str> {
        match constraint {
            Constraint::Gt => Some("{value} is not greater than {option_value}"),
            Constraint::Lt => Some("{value} is not less than {option_value}"),
            Constraint::Gte => Some("{value} is less than {option_value}"),
            Constraint::Lte => Some("{value} is greater than {option_value}"),
            _ => None,
        }
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let (Value::Number(n), Argument::Bound(bound)) = (value, argument) else {
            return Err(malformed(datatype, constraint));
        };
        let Some(ordering) = compare_numbers(n, bound) else {
            return Ok(Some(ViolationKind::InvalidValue));
        };
        let passed = match constraint {
            Constraint::Gt => ordering == Ordering::Greater,
            Constraint::Lt => ordering == Ordering::Less,
            Constraint::Gte => ordering != Ordering::Less,
            _ => ordering != Ordering::Greater,
        };
        Ok(verdict(passed))
    }
}

/// `length`, `length_min`, `length_max`.
///
/// Strings count characters, lists count items, dicts count fields.
pub struct Length;

impl ConstraintSet for Length {
    fn family(&self) -> &'static str {
        "length"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Length, Constraint::LengthMin, Constraint::LengthMax]
    }

    fn template(&self, constraint: Constraint) -> Option<&'static str> {
        match constraint {
            Constraint::Length => Some("{value} length is not {option_value}"),
            Constraint::LengthMin => Some("{value} length is not at least {option_value}"),
            Constraint::LengthMax => Some("{value} length is greater than {option_value}"),
            _ => None,
        }
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let (Some(len), Argument::Length(limit)) = (length_of(value), argument) else {
            return Err(malformed(datatype, constraint));
        };
        let passed = match constraint {
            Constraint::Length => len == *limit,
            Constraint::LengthMin => len >= *limit,
            _ => len <= *limit,
        };
        Ok(verdict(passed))
    }
}

/// `regex`, matched against the whole string.
pub struct Matching;

impl ConstraintSet for Matching {
    fn family(&self) -> &'static str {
        "pattern"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Regex]
    }

    fn template(&self, _constraint: Constraint) -> Option<&'static str> {
        Some("{value} is not a valid {datatype_name}")
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let (Value::String(text), Argument::Pattern(pattern)) = (value, argument) else {
            return Err(malformed(datatype, constraint));
        };
        Ok(verdict(pattern.is_match(text)))
    }
}

/// `enum`, `in`, `not_in`.
pub struct Membership;

impl ConstraintSet for Membership {
    fn family(&self) -> &'static str {
        "membership"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Enum, Constraint::In, Constraint::NotIn]
    }

    fn template(&self, constraint: Constraint) -> Option<&'static str> {
        match constraint {
            Constraint::NotIn => Some("{value} must not be one of {option_value}"),
            _ => Some("{value} is not one of {option_value}"),
        }
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let Argument::Choices(choices) = argument else {
            return Err(malformed(datatype, constraint));
        };
        let found = contains_value(choices, value);
        Ok(verdict(if constraint == Constraint::NotIn { !found } else { found }))
    }
}

/// `contains`, `not_contains`.
///
/// Substring test for strings, element membership for lists.
pub struct Containment;

impl ConstraintSet for Containment {
    fn family(&self) -> &'static str {
        "containment"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Contains, Constraint::NotContains]
    }

    fn template(&self, constraint: Constraint) -> Option<&'static str> {
        match constraint {
            Constraint::Contains => Some("{value} does not contain {option_value}"),
            _ => Some("{value} must not contain {option_value}"),
        }
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let found = match (value, argument) {
            (Value::String(text), Argument::Literal(Value::String(needle))) => {
                text.contains(needle.as_str())
            }
            (Value::Array(items), Argument::Literal(needle)) => contains_value(items, needle),
            _ => return Err(malformed(datatype, constraint)),
        };
        Ok(verdict(if constraint == Constraint::Contains { found } else { !found }))
    }
}

/// `items`: every element of a list validates against one datatype.
pub struct Items;

impl ConstraintSet for Items {
    fn family(&self) -> &'static str {
        "items"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Items]
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let (Value::Array(elements), Argument::Datatype(item)) = (value, argument) else {
            return Err(malformed(datatype, constraint));
        };
        for element in elements {
            validate::walk(element, item)?;
        }
        Ok(None)
    }
}

/// `required`, `fields`.
///
/// `fields` only validates keys that are present; undeclared keys pass.
pub struct Fields;

impl ConstraintSet for Fields {
    fn family(&self) -> &'static str {
        "fields"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Required, Constraint::Fields]
    }

    fn template(&self, constraint: Constraint) -> Option<&'static str> {
        match constraint {
            Constraint::Required => Some("{value} is missing required fields {option_value}"),
            _ => None,
        }
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let Value::Object(object) = value else {
            return Err(malformed(datatype, constraint));
        };
        match argument {
            Argument::Keys(keys) => Ok(verdict(keys.iter().all(|k| object.contains_key(k)))),
            Argument::Fields(fields) => {
                for (key, field) in fields {
                    if let Some(v) = object.get(key) {
                        validate::walk(v, field)?;
                    }
                }
                Ok(None)
            }
            _ => Err(malformed(datatype, constraint)),
        }
    }
}

/// `types`: the value must pass at least one candidate.
///
/// When every candidate fails, the first failure that is more specific than a
/// plain shape mismatch against the candidate itself is surfaced; otherwise
/// the union reports a type mismatch of its own.
pub struct Candidates;

impl ConstraintSet for Candidates {
    fn family(&self) -> &'static str {
        "candidates"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Types]
    }

    fn template(&self, _constraint: Constraint) -> Option<&'static str> {
        Some("{value} does not match any of {option_value}")
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let Argument::Types(candidates) = argument else {
            return Err(malformed(datatype, constraint));
        };
        let mut specific = None;
        for candidate in candidates {
            match validate::walk(value, candidate) {
                Ok(()) => return Ok(None),
                Err(ShapeError::Validation(e)) => {
                    let shape_only = e.is_type_mismatch() && e.datatype == candidate.name();
                    if specific.is_none() && !shape_only {
                        specific = Some(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        match specific {
            Some(e) => Err(e.into()),
            None => Ok(Some(ViolationKind::TypeMismatch)),
        }
    }
}

/// `base`: `null` passes, anything else must pass the base.
pub struct Optional;

impl ConstraintSet for Optional {
    fn family(&self) -> &'static str {
        "optional"
    }

    fn constraints(&self) -> &'static [Constraint] {
        &[Constraint::Base]
    }

    fn template(&self, _constraint: Constraint) -> Option<&'static str> {
        Some("{value} is neither none nor a valid {option_value}")
    }

    fn check(
        &self,
        datatype: &str,
        constraint: Constraint,
        value: &Value,
        argument: &Argument,
    ) -> Result<Option<ViolationKind>, ShapeError> {
        let Argument::Datatype(base) = argument else {
            return Err(malformed(datatype, constraint));
        };
        if value.is_null() {
            return Ok(None);
        }
        match validate::walk(value, base) {
            Ok(()) => Ok(None),
            Err(ShapeError::Validation(e))
                if e.is_type_mismatch() && e.datatype == base.name() =>
            {
                Ok(Some(ViolationKind::TypeMismatch))
            }
            Err(e) => Err(e),
        }
    }
}

static SCALAR_SETS: [&dyn ConstraintSet; 1] = [&Equality];
static STRING_SETS: [&dyn ConstraintSet; 5] =
    [&Equality, &Length, &Matching, &Membership, &Containment];
static NUMERIC_SETS: [&dyn ConstraintSet; 3] = [&Equality, &Bounds, &Membership];
static LIST_SETS: [&dyn ConstraintSet; 3] = [&Length, &Items, &Containment];
static DICT_SETS: [&dyn ConstraintSet; 2] = [&Fields, &Length];
static UNION_SETS: [&dyn ConstraintSet; 1] = [&Candidates];
static MAYBE_SETS: [&dyn ConstraintSet; 1] = [&Optional];

/// The constraint families supported by `kind`.
///
/// Extended datatypes have no families of their own; their options are
/// checked against the root kind once resolved.
pub fn sets_for(kind: Kind) -> &'static [&'static dyn ConstraintSet] {
    match kind {
        Kind::None | Kind::Boolean => &SCALAR_SETS,
        Kind::String => &STRING_SETS,
        Kind::Number | Kind::Integer => &NUMERIC_SETS,
        Kind::List => &LIST_SETS,
        Kind::Dict => &DICT_SETS,
        Kind::Union => &UNION_SETS,
        Kind::Maybe => &MAYBE_SETS,
        Kind::Extended => &[],
    }
}

/// The family owning `constraint` for `kind`, if the kind supports it.
pub fn set_for(kind: Kind, constraint: Constraint) -> Option<&'static dyn ConstraintSet> {
    sets_for(kind)
        .iter()
        .copied()
        .find(|set| set.constraints().contains(&constraint))
}

/// Returns true if `kind` supports `constraint`.
pub fn allows(kind: Kind, constraint: Constraint) -> bool {
    set_for(kind, constraint).is_some()
}

/// Every constraint `kind` supports, in evaluation order.
pub fn supported(kind: Kind) -> Vec<Constraint> {
    let mut all: Vec<Constraint> = sets_for(kind)
        .iter()
        .flat_map(|set| set.constraints().iter().copied())
        .collect();
    all.sort();
    all
}

/// Options a kind cannot be defined without.
pub(crate) fn mandatory(kind: Kind) -> &'static [Constraint] {
    match kind {
        Kind::Union => &[Constraint::Types],
        Kind::Maybe => &[Constraint::Base],
        _ => &[],
    }
}

/// Kind-specific argument rules beyond the per-constraint shape.
pub(crate) fn check_argument(
    kind: Kind,
    datatype: &str,
    constraint: Constraint,
    argument: &Argument,
) -> Result<(), DefinitionError> {
    let substring = matches!(constraint, Constraint::Contains | Constraint::NotContains);
    if kind == Kind::String && substring && !matches!(argument, Argument::Literal(Value::String(_)))
    {
        return Err(DefinitionError::InvalidArgument {
            datatype: datatype.to_string(),
            constraint: constraint.to_string(),
            reason: "string containment needs a string argument".to_string(),
        });
    }
    Ok(())
}
