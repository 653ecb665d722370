//! # shape-core: Foundational Types for shape
//!
//! This crate is the leaf of the shape workspace. It defines the vocabulary
//! every other crate speaks: the datatype [`Kind`] tags, the [`Constraint`]
//! names a schema may attach to a kind, the numeric-aware value semantics the
//! validator relies on, and the error taxonomy shared by the compile and
//! validate phases.
//!
//! ## Key Design Principles
//!
//! 1. **Values are `serde_json::Value` trees.** `null` is the absent value;
//!    strings, numbers, booleans, arrays and objects map onto the string,
//!    number/integer, boolean, list and dict kinds.
//!
//! 2. **Closed vocabularies.** `Kind` and `Constraint` are exhaustive enums.
//!    A constraint name that does not parse is a definition error, never a
//!    silently ignored key.
//!
//! 3. **Three error families.** Definition errors (the schema is broken),
//!    validation errors (the value is wrong) and lookup errors (a name does
//!    not resolve) are distinct types united by [`ShapeError`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `shape-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod kind;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use error::{DefinitionError, LookupError, ShapeError, ValidationError, ViolationKind};
pub use kind::{Constraint, Kind, INTEGER_CHECK, TYPE_CHECK};
pub use value::{
    compare_numbers, contains_value, describe, is_whole, length_of, shape_name, values_equal,
};
