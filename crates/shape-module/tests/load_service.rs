//! Loading modules and services from files, and calling their actions.

use std::path::PathBuf;

use serde_json::{json, Map, Value};
use shape_core::{DefinitionError, ShapeError, ViolationKind};
use shape_module::{load_module, load_service, ActionError, ModuleError, ModuleSource};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("not a map: {other}"),
    }
}

#[test]
fn load_service_from_yaml_file() {
    let service = load_service(fixture("sample_service.yml")).unwrap();
    assert_eq!(service.name(), "sample");
    assert_eq!(service.description(), Some("Sample service definition"));
    assert_eq!(service.datatype_names(), vec!["contact", "sampleID", "tags"]);
    assert_eq!(
        service.actions().keys().collect::<Vec<_>>(),
        vec!["register", "sample_action"]
    );
    assert!(service.fulfill(&json!("aaaaa"), "sampleID").unwrap());
}

#[test]
fn module_messages_from_file() {
    let service = load_service(fixture("sample_service.yml")).unwrap();
    let err = service.guard(&json!("abc"), "sampleID").unwrap_err();
    assert_eq!(
        err.as_validation().unwrap().message,
        "abc is shorter than 5 characters"
    );
}

#[test]
fn register_action() {
    let service = load_service(fixture("sample_service.yml")).unwrap();
    let register = service.action("register").unwrap();
    assert_eq!(register.qualified_name(), "sample.register");
    assert_eq!(register.method(), Some("POST"));

    let ok = args(json!({
        "contact": {"email": "mail@example.com", "homepage": "https://example.com/"},
        "tags": ["a", "b"],
    }));
    let stored = register.invoke(&ok, |a| a.len()).unwrap();
    assert_eq!(stored, 2);

    let with_note = args(json!({
        "contact": {"email": "mail@example.com", "homepage": null},
        "tags": [],
        "note": "hello",
    }));
    assert!(register.validate(&with_note).is_ok());

    let bad_email = args(json!({"contact": {"email": "nope"}, "tags": []}));
    let err = register.validate(&bad_email).unwrap_err();
    let violation = err.validation().unwrap();
    assert_eq!(violation.constraint, "regex");
    assert_eq!(violation.datatype, "common:email");

    let too_many = args(json!({
        "contact": {"email": "mail@example.com"},
        "tags": ["a", "b", "c", "d"],
    }));
    let err = register.validate(&too_many).unwrap_err();
    assert!(matches!(err, ActionError::Argument { ref argument, .. } if argument == "tags"));

    let missing = args(json!({"tags": []}));
    assert!(matches!(
        register.validate(&missing).unwrap_err(),
        ActionError::MissingArgument { .. }
    ));
}

#[test]
fn maybe_base_type_mismatch() {
    let service = load_service(fixture("sample_service.yml")).unwrap();
    let err = service
        .guard(&json!({"email": "mail@example.com", "homepage": 5}), "contact")
        .unwrap_err();
    let violation = err.as_validation().unwrap();
    assert_eq!(violation.kind, ViolationKind::TypeMismatch);
    assert_eq!(violation.constraint, "base");
}

#[test]
fn load_module_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geo.json");
    std::fs::write(
        &path,
        serde_json::to_string(&json!({
            "name": "geo",
            "datatypes": {
                "latitude": {"type": "number", "gte": -90, "lte": 90},
                "point": {"type": "list", "length": 2, "items": "latitude"},
            },
        }))
        .unwrap(),
    )
    .unwrap();

    let module = load_module(ModuleSource::File(path)).unwrap();
    assert!(module.fulfill(&json!([45.5, -12]), "point").unwrap());
    assert!(!module.fulfill(&json!([91, 0]), "point").unwrap());
    assert!(!module.fulfill(&json!([1]), "geo:point").unwrap());
}

#[test]
fn broken_yaml_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "name: [unclosed\n").unwrap();
    let err = load_module(path.clone()).unwrap_err();
    assert!(matches!(err, ModuleError::YamlParse { .. }));
    assert!(err.to_string().contains("broken.yaml"));
}

#[test]
fn definition_errors_surface_at_load() {
    let err = load_module(json!({
        "name": "m",
        "datatypes": {"x": {"type": "string", "gt": 1}},
    }))
    .unwrap_err();
    assert!(matches!(err, ModuleError::Shape(ShapeError::Definition(_))));

    let err = load_module(json!({
        "name": "m",
        "datatypes": {"alias": {"type": "nosuch", "length_min": 1}},
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        ModuleError::Shape(ShapeError::Definition(DefinitionError::UnresolvedBase { .. }))
    ));
}

#[test]
fn inline_param_with_unresolved_base_fails_at_load() {
    let err = load_service(json!({
        "name": "svc",
        "datatypes": {},
        "interface": {
            "act": {"request": {"params": {"id": {"type": "nosuch"}}}},
        },
    }))
    .unwrap_err();
    assert!(matches!(
        err,
        ModuleError::Shape(ShapeError::Definition(DefinitionError::UnresolvedBase { .. }))
    ));
}
