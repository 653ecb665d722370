//! # Definition Sources
//!
//! Module and service definitions arrive either as an in-memory
//! `serde_json::Value` or as a YAML/JSON file. Files are parsed into the
//! same value tree so the loader has a single input shape.
//!
//! Format is chosen by extension: `.yaml`/`.yml` parse as YAML, anything
//! else as JSON.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ModuleError;

/// Where a module definition comes from.
#[derive(Debug, Clone)]
pub enum ModuleSource {
    /// An already-parsed definition.
    Definition(Value),
    /// A YAML or JSON file.
    File(PathBuf),
}

impl ModuleSource {
    /// Produce the definition value, reading and parsing files.
    pub fn into_definition(self) -> Result<Value, ModuleError> {
        match self {
            ModuleSource::Definition(value) => Ok(value),
            ModuleSource::File(path) => read_definition(&path),
        }
    }
}

impl From<Value> for ModuleSource {
    fn from(value: Value) -> Self {
        ModuleSource::Definition(value)
    }
}

impl From<PathBuf> for ModuleSource {
    fn from(path: PathBuf) -> Self {
        ModuleSource::File(path)
    }
}

impl From<&Path> for ModuleSource {
    fn from(path: &Path) -> Self {
        ModuleSource::File(path.to_path_buf())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Read a YAML or JSON file into a value tree.
pub fn read_definition(path: &Path) -> Result<Value, ModuleError> {
    let content = std::fs::read_to_string(path).map_err(|source| ModuleError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if is_yaml(path) {
        yaml_definition(&content, path)
    } else {
        serde_json::from_str(&content).map_err(|source| ModuleError::JsonParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Parse YAML text into a value tree.
pub fn parse_yaml(text: &str) -> Result<Value, ModuleError> {
    yaml_definition(text, Path::new("<inline>"))
}

fn yaml_definition(text: &str, origin: &Path) -> Result<Value, ModuleError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|source| ModuleError::YamlParse {
            path: origin.to_path_buf(),
            source,
        })?;
    yaml_to_json_value(&yaml).map_err(|detail| ModuleError::JsonIncompatible {
        path: origin.display().to_string(),
        detail,
    })
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped. Scalar keys are stringified; composite keys and
/// non-finite floats are rejected.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => Value::Number(json_number(n)?),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(items) => Value::Array(
            items
                .iter()
                .map(yaml_to_json_value)
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| Ok::<_, String>((json_key(k)?, yaml_to_json_value(v)?)))
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Tagged(tagged) => yaml_to_json_value(&tagged.value)?,
    })
}

fn json_number(n: &serde_yaml::Number) -> Result<serde_json::Number, String> {
    if let Some(i) = n.as_i64() {
        return Ok(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Ok(u.into());
    }
    n.as_f64()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| format!("number {n} has no JSON representation"))
}

fn json_key(key: &serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("unsupported map key: {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_yaml_scalars_and_nesting() {
        let value = parse_yaml(
            "name: sample\nlimits: {gt: 100, ratio: 0.5}\nflags: [true, null]\n1: one\n",
        )
        .unwrap();
        assert_eq!(
            value,
            json!({
                "name": "sample",
                "limits": {"gt": 100, "ratio": 0.5},
                "flags": [true, null],
                "1": "one",
            })
        );
    }

    #[test]
    fn test_regex_strings_survive_yaml() {
        let value = parse_yaml(r#"regex: '^(\d{4})\D?$'"#).unwrap();
        assert_eq!(value["regex"], json!(r"^(\d{4})\D?$"));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let err = parse_yaml("x: .inf").unwrap_err();
        assert!(matches!(err, ModuleError::JsonIncompatible { .. }));
    }

    #[test]
    fn test_inline_and_file_errors_name_their_origin() {
        let err = parse_yaml("name: [unclosed\n").unwrap_err();
        assert!(matches!(err, ModuleError::YamlParse { ref path, .. } if path == Path::new("<inline>")));

        let err = parse_yaml("? [a, b]\n: pair\n").unwrap_err();
        assert!(matches!(err, ModuleError::JsonIncompatible { ref path, .. } if path == "<inline>"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.yaml");
        std::fs::write(&path, "? [a, b]\n: pair\n").unwrap();
        let err = read_definition(&path).unwrap_err();
        assert!(err.to_string().contains("keys.yaml"));
        assert!(err.to_string().contains("unsupported map key"));
    }

    #[test]
    fn test_tags_are_dropped() {
        let value = parse_yaml("limit: !custom 7\n").unwrap();
        assert_eq!(value, json!({"limit": 7}));
    }

    #[test]
    fn test_read_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("m.yml");
        std::fs::write(&yaml_path, "name: m\n").unwrap();
        assert_eq!(read_definition(&yaml_path).unwrap(), json!({"name": "m"}));

        let json_path = dir.path().join("m.json");
        let mut f = std::fs::File::create(&json_path).unwrap();
        f.write_all(br#"{"name": "m"}"#).unwrap();
        assert_eq!(read_definition(&json_path).unwrap(), json!({"name": "m"}));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "name: m").unwrap();
        assert!(matches!(
            read_definition(&bad).unwrap_err(),
            ModuleError::JsonParse { .. }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = read_definition(Path::new("/nonexistent/module.yml")).unwrap_err();
        assert!(matches!(err, ModuleError::Io { .. }));
    }
}
