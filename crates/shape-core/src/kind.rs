//! # Kinds and Constraint Names
//!
//! A datatype definition names its kind through the `type` key. Built-in
//! tags map onto [`Kind`]; any other string is a reference to a base
//! datatype and produces [`Kind::Extended`].
//!
//! The type check performed by each kind lives here as well
//! ([`Kind::admits`]) because it depends only on the shape of the value, not
//! on any registry state.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ViolationKind;
use crate::value::is_whole;

/// Synthetic constraint name reported when a value fails its kind's type check.
pub const TYPE_CHECK: &str = "type";

/// Synthetic constraint name reported when a fractional number is presented
/// to an `integer` datatype.
pub const INTEGER_CHECK: &str = "integer";

/// The kind tag of a datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// The absent value (`null`).
    None,
    /// Text.
    String,
    /// Any number, integral or not.
    Number,
    /// A number with a zero fractional part.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// An ordered sequence.
    List,
    /// A string-keyed mapping.
    Dict,
    /// Passes when any candidate passes.
    Union,
    /// Passes for `null` or when the base passes.
    Maybe,
    /// A named base datatype with overlaid constraints.
    Extended,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Kind; 10] = [
        Kind::None,
        Kind::String,
        Kind::Number,
        Kind::Integer,
        Kind::Boolean,
        Kind::List,
        Kind::Dict,
        Kind::Union,
        Kind::Maybe,
        Kind::Extended,
    ];

    /// The tag used for this kind in definitions and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::None => "none",
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Integer => "integer",
            Kind::Boolean => "boolean",
            Kind::List => "list",
            Kind::Dict => "dict",
            Kind::Union => "union",
            Kind::Maybe => "maybe",
            Kind::Extended => "extended",
        }
    }

    /// Parse a built-in kind tag.
    ///
    /// Returns `None` for any string that is not a built-in tag, including
    /// `"extended"` itself: such a `type` value names a base datatype.
    pub fn from_tag(tag: &str) -> Option<Kind> {
        match tag {
            "none" => Some(Kind::None),
            "string" => Some(Kind::String),
            "number" => Some(Kind::Number),
            "integer" => Some(Kind::Integer),
            "boolean" => Some(Kind::Boolean),
            "list" => Some(Kind::List),
            "dict" => Some(Kind::Dict),
            "union" => Some(Kind::Union),
            "maybe" => Some(Kind::Maybe),
            _ => None,
        }
    }

    /// Combinator kinds carry no type check of their own.
    pub fn is_combinator(&self) -> bool {
        matches!(self, Kind::Union | Kind::Maybe | Kind::Extended)
    }

    /// Run the kind's type check against `value`.
    ///
    /// Returns `None` when the value has the right shape. An `integer`
    /// presented with a fractional number yields
    /// [`ViolationKind::NotAnInteger`]; every other mismatch yields
    /// [`ViolationKind::TypeMismatch`]. Booleans are never numbers.
    pub fn admits(&self, value: &Value) -> Option<ViolationKind> {
        let admitted = match self {
            Kind::None => value.is_null(),
            Kind::String => value.is_string(),
            Kind::Number => value.is_number(),
            Kind::Integer => {
                return match value {
                    Value::Number(n) if is_whole(n) => None,
                    Value::Number(_) => Some(ViolationKind::NotAnInteger),
                    _ => Some(ViolationKind::TypeMismatch),
                };
            }
            Kind::Boolean => value.is_boolean(),
            Kind::List => value.is_array(),
            Kind::Dict => value.is_object(),
            Kind::Union | Kind::Maybe | Kind::Extended => true,
        };
        if admitted {
            None
        } else {
            Some(ViolationKind::TypeMismatch)
        }
    }

    /// The synthetic constraint name reported for a failed type check.
    pub fn check_name(violation: ViolationKind) -> &'static str {
        match violation {
            ViolationKind::NotAnInteger => INTEGER_CHECK,
            _ => TYPE_CHECK,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named constraint that may be attached to a datatype.
///
/// The declaration order is the evaluation order of sibling constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Length,
    LengthMin,
    LengthMax,
    Regex,
    Enum,
    In,
    NotIn,
    Contains,
    NotContains,
    Required,
    Fields,
    Items,
    Types,
    Base,
}

impl Constraint {
    /// Every constraint, in evaluation order.
    pub const ALL: [Constraint; 20] = [
        Constraint::Eq,
        Constraint::Ne,
        Constraint::Gt,
        Constraint::Lt,
        Constraint::Gte,
        Constraint::Lte,
        Constraint::Length,
        Constraint::LengthMin,
        Constraint::LengthMax,
        Constraint::Regex,
        Constraint::Enum,
        Constraint::In,
        Constraint::NotIn,
        Constraint::Contains,
        Constraint::NotContains,
        Constraint::Required,
        Constraint::Fields,
        Constraint::Items,
        Constraint::Types,
        Constraint::Base,
    ];

    /// The key used for this constraint in definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Constraint::Eq => "eq",
            Constraint::Ne => "ne",
            Constraint::Gt => "gt",
            Constraint::Lt => "lt",
            Constraint::Gte => "gte",
            Constraint::Lte => "lte",
            Constraint::Length => "length",
            Constraint::LengthMin => "length_min",
            Constraint::LengthMax => "length_max",
            Constraint::Regex => "regex",
            Constraint::Enum => "enum",
            Constraint::In => "in",
            Constraint::NotIn => "not_in",
            Constraint::Contains => "contains",
            Constraint::NotContains => "not_contains",
            Constraint::Required => "required",
            Constraint::Fields => "fields",
            Constraint::Items => "items",
            Constraint::Types => "types",
            Constraint::Base => "base",
        }
    }

    /// Parse a definition key into a constraint.
    pub fn parse(key: &str) -> Option<Constraint> {
        Constraint::ALL.into_iter().find(|c| c.as_str() == key)
    }

    /// Constraints whose argument holds nested datatypes.
    pub fn is_nested(&self) -> bool {
        matches!(
            self,
            Constraint::Fields | Constraint::Items | Constraint::Types | Constraint::Base
        )
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_tags_roundtrip() {
        for kind in Kind::ALL {
            if kind == Kind::Extended {
                assert_eq!(Kind::from_tag(kind.as_str()), None);
            } else {
                assert_eq!(Kind::from_tag(kind.as_str()), Some(kind));
            }
        }
    }

    #[test]
    fn test_unknown_tag_is_a_reference() {
        assert_eq!(Kind::from_tag("common:email"), None);
        assert_eq!(Kind::from_tag("String"), None);
    }

    #[test]
    fn test_constraint_keys_parse() {
        for c in Constraint::ALL {
            assert_eq!(Constraint::parse(c.as_str()), Some(c));
        }
        assert_eq!(Constraint::parse("maximum"), None);
    }

    #[test]
    fn test_constraint_order_follows_declaration() {
        let mut sorted = Constraint::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Constraint::ALL.to_vec());
        assert!(Constraint::Required < Constraint::Fields);
    }

    #[test]
    fn test_integer_admits_whole_floats() {
        assert_eq!(Kind::Integer.admits(&json!(10)), None);
        assert_eq!(Kind::Integer.admits(&json!(10.0)), None);
        assert_eq!(
            Kind::Integer.admits(&json!(10.1)),
            Some(ViolationKind::NotAnInteger)
        );
        assert_eq!(
            Kind::Integer.admits(&json!("10")),
            Some(ViolationKind::TypeMismatch)
        );
    }

    #[test]
    fn test_booleans_are_not_numbers() {
        assert_eq!(
            Kind::Number.admits(&json!(true)),
            Some(ViolationKind::TypeMismatch)
        );
        assert_eq!(Kind::Boolean.admits(&json!(false)), None);
    }

    #[test]
    fn test_none_admits_only_null() {
        assert_eq!(Kind::None.admits(&Value::Null), None);
        assert_eq!(
            Kind::None.admits(&json!(false)),
            Some(ViolationKind::TypeMismatch)
        );
    }

    #[test]
    fn test_combinators_have_no_type_check() {
        for kind in [Kind::Union, Kind::Maybe, Kind::Extended] {
            assert!(kind.is_combinator());
            assert_eq!(kind.admits(&json!([1, 2])), None);
        }
    }

    #[test]
    fn test_check_names() {
        assert_eq!(Kind::check_name(ViolationKind::TypeMismatch), "type");
        assert_eq!(Kind::check_name(ViolationKind::NotAnInteger), "integer");
    }
}
