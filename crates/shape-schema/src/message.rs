//! # Message Rendering
//!
//! Error messages are templates with four placeholders:
//!
//! - `{value}`: the failing value
//! - `{datatype_name}`: name of the datatype that rejected it
//! - `{option_name}`: the failing constraint
//! - `{option_value}`: the constraint argument
//!
//! Strings render bare, every other value renders as compact JSON. A template
//! is chosen from, in order: the registry's overrides, the constraint
//! family's default, the type-check defaults, and [`FALLBACK_TEMPLATE`].

use shape_core::{describe, INTEGER_CHECK, TYPE_CHECK};

use crate::outcome::Outcome;
use crate::registry::Registry;

/// Template used when nothing more specific is known.
pub const FALLBACK_TEMPLATE: &str =
    "{value} is not valid for {datatype_name}: {option_name} {option_value}";

/// Default templates for the synthetic type-check constraints.
pub fn check_template(constraint: &str) -> Option<&'static str> {
    match constraint {
        TYPE_CHECK => Some("{value} is not of type {option_value}"),
        INTEGER_CHECK => Some("{value} is not an integer"),
        _ => None,
    }
}

/// Pick the template for a failing constraint.
pub fn template_for(
    registry: Option<&Registry>,
    constraint: &str,
    family_default: Option<&'static str>,
) -> String {
    registry
        .and_then(|r| r.message(constraint))
        .or_else(|| {
            family_default
                .or_else(|| check_template(constraint))
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_TEMPLATE.to_string())
}

/// Substitute placeholders in one pass.
///
/// Substituted text is never rescanned, and unknown `{...}` sequences are
/// copied through unchanged.
pub fn render(template: &str, outcome: &Outcome<'_>, datatype_name: &str) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            break;
        };
        let key = &tail[1..close];
        match key {
            "value" => out.push_str(&describe(outcome.value)),
            "datatype_name" => out.push_str(datatype_name),
            "option_name" => out.push_str(outcome.constraint),
            "option_value" => out.push_str(&describe(&outcome.argument)),
            _ => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }
    if let Some(open) = rest.find('{') {
        out.push_str(&rest[open..]);
    } else {
        out.push_str(rest);
    }
    out
}
