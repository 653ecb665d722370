//! # Datatypes
//!
//! A [`Datatype`] is a compiled, immutable schema node. Compilation turns a
//! definition map such as
//!
//! ```text
//! { "type": "list", "length_min": 1, "items": { "type": "integer", "gt": 0 } }
//! ```
//!
//! into a node whose options are typed [`Argument`]s. Every key is checked
//! against the kind's constraint sets while compiling, so a misspelled or
//! misplaced constraint never reaches the validate phase.
//!
//! ## Extension
//!
//! A `type` that is not a built-in kind tag names a base datatype. The base
//! is kept as a name and resolved through the owning registry whenever the
//! datatype is used ([`Datatype::resolve`]). Resolution walks the whole
//! chain of bases, then overlays each layer's options on top of the
//! non-extended root: later layers replace earlier options, and `fields`
//! maps merge key by key.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use regex::Regex;
use serde_json::{Map, Number, Value};
use shape_core::{Constraint, DefinitionError, Kind, LookupError, ShapeError};

use crate::constraint;
use crate::registry::{Registry, RegistryInner};
use crate::validate;

/// Upper bound on the number of bases followed while resolving an extension.
pub const MAX_EXTENSION_DEPTH: usize = 64;

/// Definition keys that carry metadata rather than constraints.
const RESERVED_KEYS: [&str; 3] = ["type", "name", "description"];

/// A compiled `regex` argument.
///
/// The source is wrapped as `^(?:source)$` so a value must match in full.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern anchored at both ends.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written in the definition.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns true if the whole of `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// A typed constraint argument.
#[derive(Debug, Clone)]
pub enum Argument {
    /// Any value (`eq`, `ne`, `contains`, `not_contains`).
    Literal(Value),
    /// A numeric bound (`gt`, `lt`, `gte`, `lte`).
    Bound(Number),
    /// A length (`length`, `length_min`, `length_max`).
    Length(usize),
    /// A compiled pattern (`regex`).
    Pattern(Pattern),
    /// Allowed or excluded values (`enum`, `in`, `not_in`).
    Choices(Vec<Value>),
    /// Field names (`required`).
    Keys(Vec<String>),
    /// One nested datatype (`items`, `base`).
    Datatype(Arc<Datatype>),
    /// Nested datatypes by field name (`fields`).
    Fields(BTreeMap<String, Arc<Datatype>>),
    /// Ordered candidates (`types`).
    Types(Vec<Arc<Datatype>>),
}

impl Argument {
    /// Render the argument for error reporting; nested datatypes appear by name.
    pub fn to_value(&self) -> Value {
        match self {
            Argument::Literal(v) => v.clone(),
            Argument::Bound(n) => Value::Number(n.clone()),
            Argument::Length(n) => Value::from(*n),
            Argument::Pattern(p) => Value::String(p.source.clone()),
            Argument::Choices(c) => Value::Array(c.clone()),
            Argument::Keys(k) => Value::Array(k.iter().cloned().map(Value::String).collect()),
            Argument::Datatype(d) => Value::String(d.name().to_string()),
            Argument::Fields(f) => Value::Object(
                f.iter()
                    .map(|(k, d)| (k.clone(), Value::String(d.name().to_string())))
                    .collect(),
            ),
            Argument::Types(t) => Value::Array(
                t.iter()
                    .map(|d| Value::String(d.name().to_string()))
                    .collect(),
            ),
        }
    }

    /// Nested datatypes held by this argument.
    pub fn nested(&self) -> Vec<&Arc<Datatype>> {
        match self {
            Argument::Datatype(d) => vec![d],
            Argument::Fields(f) => f.values().collect(),
            Argument::Types(t) => t.iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// A compiled schema node.
#[derive(Clone)]
pub struct Datatype {
    name: String,
    kind: Kind,
    extends: Option<String>,
    description: Option<String>,
    options: BTreeMap<Constraint, Argument>,
    owner: Weak<RegistryInner>,
    /// Keeps a private registry alive for datatypes built by [`crate::define`].
    pub(crate) anchor: Option<Registry>,
}

impl Datatype {
    /// Human label used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind tag; [`Kind::Extended`] until resolved.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Base datatype name, for extended datatypes.
    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// Free-text description from the definition.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Options in evaluation order.
    pub fn options(&self) -> &BTreeMap<Constraint, Argument> {
        &self.options
    }

    /// Look up one option.
    pub fn option(&self, constraint: Constraint) -> Option<&Argument> {
        self.options.get(&constraint)
    }

    /// The registry this datatype was compiled in, if it still exists.
    pub fn registry(&self) -> Option<Registry> {
        self.owner.upgrade().map(Registry::from_inner)
    }

    /// Validate `value`, returning it unchanged on success.
    pub fn guard<'v>(&self, value: &'v Value) -> Result<&'v Value, ShapeError> {
        validate::walk(value, self)?;
        Ok(value)
    }

    /// Validate `value`; validation failures become `Ok(false)`.
    ///
    /// Definition and lookup errors still propagate: they describe a broken
    /// schema, not bad data.
    pub fn fulfill(&self, value: &Value) -> Result<bool, ShapeError> {
        match validate::walk(value, self) {
            Ok(()) => Ok(true),
            Err(ShapeError::Validation(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Resolve an extended datatype into the effective node it validates as.
    ///
    /// Non-extended datatypes are returned as-is. For extended ones every base
    /// is looked up through the registry that owns the referring layer, so a
    /// base may reference names local to its own namespace.
    ///
    /// # Errors
    ///
    /// - `DefinitionError::UnresolvedBase` if a base name does not resolve.
    /// - `LookupError::DetachedRegistry` if an owning registry was dropped.
    /// - `DefinitionError::UnsupportedConstraint` if a layer carries a
    ///   constraint the root kind does not support.
    /// - `DefinitionError::CyclicExtension` if the chain is longer than
    ///   [`MAX_EXTENSION_DEPTH`].
    pub fn resolve(&self) -> Result<Cow<'_, Datatype>, ShapeError> {
        let Some(base_name) = self.extends.as_deref() else {
            return Ok(Cow::Borrowed(self));
        };

        let mut layers: Vec<Arc<Datatype>> = Vec::new();
        let mut base = self.lookup_base(base_name)?;
        while let Some(next) = base.extends.clone() {
            if layers.len() >= MAX_EXTENSION_DEPTH {
                return Err(DefinitionError::CyclicExtension {
                    datatype: self.name.clone(),
                    depth: MAX_EXTENSION_DEPTH,
                }
                .into());
            }
            let parent = base.lookup_base(&next)?;
            layers.push(base);
            base = parent;
        }

        let mut merged = (*base).clone();
        merged.anchor = None;
        for layer in layers.iter().rev() {
            merged.overlay(layer)?;
        }
        merged.overlay(self)?;
        Ok(Cow::Owned(merged))
    }

    /// Check that this datatype and every nested one resolves.
    ///
    /// Extended datatypes are resolved but their bases are not descended
    /// into, so recursive schemas terminate.
    pub fn verify(&self) -> Result<(), ShapeError> {
        self.resolve()?;
        for argument in self.options.values() {
            for nested in argument.nested() {
                nested.verify()?;
            }
        }
        Ok(())
    }

    fn lookup_base(&self, base: &str) -> Result<Arc<Datatype>, ShapeError> {
        let registry = self.registry().ok_or_else(|| LookupError::DetachedRegistry {
            datatype: self.name.clone(),
        })?;
        registry.get(base).map_err(|source| {
            DefinitionError::UnresolvedBase {
                datatype: self.name.clone(),
                base: base.to_string(),
                source,
            }
            .into()
        })
    }

    fn overlay(&mut self, layer: &Datatype) -> Result<(), DefinitionError> {
        for (constraint, argument) in &layer.options {
            if !constraint::allows(self.kind, *constraint) {
                return Err(DefinitionError::UnsupportedConstraint {
                    datatype: layer.name.clone(),
                    kind: self.kind.to_string(),
                    constraint: constraint.to_string(),
                });
            }
            constraint::check_argument(self.kind, &layer.name, *constraint, argument)?;

            if let (Some(Argument::Fields(fields)), Argument::Fields(extra)) =
                (self.options.get_mut(constraint), argument)
            {
                fields.extend(extra.iter().map(|(k, d)| (k.clone(), Arc::clone(d))));
                continue;
            }
            self.options.insert(*constraint, argument.clone());
        }
        self.name = layer.name.clone();
        if layer.description.is_some() {
            self.description = layer.description.clone();
        }
        self.owner = layer.owner.clone();
        Ok(())
    }
}

impl fmt::Debug for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datatype")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("extends", &self.extends)
            .field("options", &self.options)
            .finish()
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extends {
            Some(base) => write!(f, "{} (extends {base})", self.name),
            None => write!(f, "{} ({})", self.name, self.kind),
        }
    }
}

/// Compile a definition into a datatype owned by `registry`.
///
/// `label` names the datatype when the definition carries no `name` key. A
/// bare reference string is named after the reference. Anything else gets a
/// per-kind sequential name.
pub(crate) fn compile(
    registry: &Registry,
    definition: &Value,
    label: Option<&str>,
) -> Result<Datatype, DefinitionError> {
    match definition {
        Value::Object(map) => compile_map(registry, map, label),
        Value::String(reference) => {
            let mut map = Map::new();
            map.insert("type".to_string(), Value::String(reference.clone()));
            compile_map(registry, &map, label.or(Some(reference)))
        }
        other => Err(DefinitionError::NotADefinition {
            found: other.to_string(),
        }),
    }
}

fn compile_map(
    registry: &Registry,
    map: &Map<String, Value>,
    label: Option<&str>,
) -> Result<Datatype, DefinitionError> {
    let tag = map
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DefinitionError::MissingType {
            definition: Value::Object(map.clone()).to_string(),
        })?;

    let (kind, extends) = match Kind::from_tag(tag) {
        Some(kind) => (kind, None),
        None => (Kind::Extended, Some(tag.to_string())),
    };

    let name = match (map.get("name").and_then(Value::as_str), label) {
        (Some(name), _) | (None, Some(name)) => name.to_string(),
        (None, None) => registry.next_name(kind),
    };

    let mut options = BTreeMap::new();
    for (key, raw) in map {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let constraint = Constraint::parse(key)
            .filter(|c| kind == Kind::Extended || constraint::allows(kind, *c))
            .ok_or_else(|| DefinitionError::UnsupportedConstraint {
                datatype: name.clone(),
                kind: kind.to_string(),
                constraint: key.clone(),
            })?;
        let argument = compile_argument(registry, &name, constraint, raw)?;
        if kind != Kind::Extended {
            constraint::check_argument(kind, &name, constraint, &argument)?;
        }
        options.insert(constraint, argument);
    }

    for required in constraint::mandatory(kind) {
        if !options.contains_key(required) {
            return Err(DefinitionError::MissingOption {
                datatype: name,
                kind: kind.to_string(),
                constraint: required.to_string(),
            });
        }
    }

    Ok(Datatype {
        name,
        kind,
        extends,
        description: map
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        options,
        owner: registry.downgrade(),
        anchor: None,
    })
}

fn compile_argument(
    registry: &Registry,
    datatype: &str,
    constraint: Constraint,
    raw: &Value,
) -> Result<Argument, DefinitionError> {
    let invalid = |reason: &str| DefinitionError::InvalidArgument {
        datatype: datatype.to_string(),
        constraint: constraint.to_string(),
        reason: reason.to_string(),
    };

    match constraint {
        Constraint::Eq | Constraint::Ne | Constraint::Contains | Constraint::NotContains => {
            Ok(Argument::Literal(raw.clone()))
        }
        Constraint::Gt | Constraint::Lt | Constraint::Gte | Constraint::Lte => match raw {
            Value::Number(n) => Ok(Argument::Bound(n.clone())),
            _ => Err(invalid("expected a number")),
        },
        Constraint::Length | Constraint::LengthMin | Constraint::LengthMax => raw
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Argument::Length)
            .ok_or_else(|| invalid("expected a non-negative integer")),
        Constraint::Regex => {
            let source = raw
                .as_str()
                .ok_or_else(|| invalid("expected a pattern string"))?;
            Pattern::new(source)
                .map(Argument::Pattern)
                .map_err(|e| DefinitionError::InvalidPattern {
                    datatype: datatype.to_string(),
                    pattern: source.to_string(),
                    reason: e.to_string(),
                })
        }
        Constraint::Enum | Constraint::In | Constraint::NotIn => raw
            .as_array()
            .map(|choices| Argument::Choices(choices.clone()))
            .ok_or_else(|| invalid("expected a list of values")),
        Constraint::Required => raw
            .as_array()
            .and_then(|keys| {
                keys.iter()
                    .map(|k| k.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .map(Argument::Keys)
            .ok_or_else(|| invalid("expected a list of field names")),
        Constraint::Items | Constraint::Base => {
            Ok(Argument::Datatype(Arc::new(compile(registry, raw, None)?)))
        }
        Constraint::Fields => {
            let fields = raw
                .as_object()
                .ok_or_else(|| invalid("expected a map of field definitions"))?;
            let mut compiled = BTreeMap::new();
            for (key, definition) in fields {
                compiled.insert(key.clone(), Arc::new(compile(registry, definition, None)?));
            }
            Ok(Argument::Fields(compiled))
        }
        Constraint::Types => {
            let candidates = raw
                .as_array()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| invalid("expected a non-empty list of definitions"))?;
            let compiled = candidates
                .iter()
                .map(|definition| compile(registry, definition, None).map(Arc::new))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Argument::Types(compiled))
        }
    }
}
