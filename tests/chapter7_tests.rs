//! Chapter 7 module graph tests.
//!
//! Links the `chapter7` fixture end to end: named and renamed exports,
//! default exports, type-only exports, re-export barrels and namespace
//! re-exports.

use esmlink_linker::{ExportTarget, ImportSpec, LinkError, Manifest, ModuleSource, NameSpec, Visibility};
use esmlink_options::{BindingSemantics, LinkerOptions, ScopingMode};
use esmlink_tests::{link, link_with, load_fixture};
use serde_json::json;

const INDEX: &str = "chapter7/index";
const NAMED: &str = "chapter7/chapter7_1_1";
const FUNCTIONS: &str = "chapter7/chapter7_1_2";
const COUNTER: &str = "chapter7/chapter7_1_3";
const TYPES: &str = "chapter7/chapter7_1_4";
const BARREL: &str = "chapter7/chapter7_1_5";
const COLUMN: &str = "chapter7/column34";

fn chapter7() -> Manifest {
    load_fixture("chapter7.json")
}

/// Add a consumer module importing `names` from `specifier`.
fn with_consumer(manifest: &mut Manifest, specifier: &str, names: Vec<NameSpec>, type_only: bool) {
    let consumer = ModuleSource {
        imports: vec![ImportSpec {
            from: specifier.to_string(),
            default: None,
            namespace: None,
            names,
            type_only,
        }],
        ..ModuleSource::default()
    };
    manifest.modules.insert("chapter7/consumer".to_string(), consumer);
}

// ============================================================================
// Named and renamed exports
// ============================================================================

#[test]
fn test_index_links() {
    let manifest = chapter7();
    let linked = link(&manifest, &[INDEX]).unwrap();
    assert_eq!(linked.evaluation_order_names(), vec![NAMED, FUNCTIONS, COUNTER, INDEX]);
}

#[test]
fn test_index_reads_renamed_imports() {
    let manifest = chapter7();
    let linked = link(&manifest, &[INDEX]).unwrap();

    assert_eq!(linked.read(INDEX, "userName").unwrap(), Some(json!("taro")));
    assert_eq!(linked.read(INDEX, "userAge").unwrap(), Some(json!(26)));
    assert_eq!(linked.read(INDEX, "language").unwrap(), Some(json!("ja")));
    assert_eq!(linked.read(INDEX, "User").unwrap(), Some(json!("class User")));
    assert!(linked.read(INDEX, "name").is_err());
}

#[test]
fn test_renamed_export_table() {
    let manifest = chapter7();
    let linked = link(&manifest, &[INDEX]).unwrap();

    let rows = linked.describe_exports(FUNCTIONS).unwrap();
    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["getFoo", "someFunc", "User"]);
    assert_eq!(rows[1].origin, "chapter7/chapter7_1_2.getBar");
    assert_eq!(rows[2].kind, "class");
}

#[test]
fn test_private_declaration_cannot_be_imported() {
    let mut manifest = chapter7();
    with_consumer(&mut manifest, "./chapter7_1_1.js", vec![NameSpec::Plain("privateData".into())], false);

    let err = link(&manifest, &["chapter7/consumer"]).unwrap_err();
    assert_eq!(
        err,
        LinkError::UnresolvedExport {
            module: "chapter7/consumer".into(),
            target: NAMED.into(),
            name: "privateData".into(),
        }
    );
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.code, 2305);
    assert!(diagnostic.to_string().starts_with("chapter7/consumer(privateData): error TS2305"));
}

// ============================================================================
// Default exports and rebinding
// ============================================================================

#[test]
fn test_default_import_binds_increment() {
    let manifest = chapter7();
    let linked = link(&manifest, &[INDEX]).unwrap();

    assert_eq!(linked.read(INDEX, "counter").unwrap(), Some(json!("function increment")));
    assert_eq!(linked.origin_of(INDEX, "counter"), linked.origin_of(COUNTER, "increment"));
}

#[test]
fn test_counter_under_snapshot_semantics() {
    let manifest = chapter7();
    let mut linked = link(&manifest, &[INDEX]).unwrap();

    assert_eq!(linked.read(INDEX, "count").unwrap(), Some(json!(0)));
    linked.assign(COUNTER, "count", json!(1)).unwrap();
    assert_eq!(linked.read(COUNTER, "count").unwrap(), Some(json!(1)));
    assert_eq!(linked.read(INDEX, "count").unwrap(), Some(json!(0)));
}

#[test]
fn test_counter_under_live_semantics() {
    let manifest = chapter7();
    let options = LinkerOptions {
        binding_semantics: Some(BindingSemantics::Live),
        ..manifest.linker_options.clone()
    };
    let mut linked = link_with(&manifest, options, &[INDEX]).unwrap();

    linked.assign(COUNTER, "count", json!(1)).unwrap();
    assert_eq!(linked.read(INDEX, "count").unwrap(), Some(json!(1)));
}

#[test]
fn test_importer_cannot_rebind_count() {
    let manifest = chapter7();
    let mut linked = link(&manifest, &[INDEX]).unwrap();

    let err = linked.assign(INDEX, "count", json!(100)).unwrap_err();
    assert_eq!(err, LinkError::ImportedBindingIsReadOnly { module: INDEX.into(), name: "count".into() });
    assert_eq!(err.to_diagnostic().code, 2632);
}

#[test]
fn test_constant_export_cannot_be_rebound_by_owner() {
    let manifest = chapter7();
    let mut linked = link(&manifest, &[INDEX]).unwrap();
    assert!(matches!(
        linked.assign(NAMED, "name", json!("jiro")),
        Err(LinkError::ConstantAssignment { .. })
    ));
    linked.assign(NAMED, "language", json!("en")).unwrap();
}

// ============================================================================
// Type-only exports
// ============================================================================

#[test]
fn test_type_module_export_table() {
    let manifest = chapter7();
    let linked = link(&manifest, &[TYPES]).unwrap();

    let rows = linked.describe_exports(TYPES).unwrap();
    let summary: Vec<(&str, &str, Visibility)> = rows
        .iter()
        .map(|row| (row.name.as_str(), row.kind, row.visibility))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Animal", "type", Visibility::Value),
            ("tama", "value", Visibility::Value),
            ("pochi", "value", Visibility::TypeOnly),
            ("Human", "type", Visibility::Value),
            ("user1", "value", Visibility::Value),
        ]
    );
}

#[test]
fn test_type_only_pochi_cannot_be_imported_as_value() {
    let mut manifest = chapter7();
    with_consumer(&mut manifest, "./chapter7_1_4.js", vec![NameSpec::Plain("pochi".into())], false);

    let err = link(&manifest, &["chapter7/consumer"]).unwrap_err();
    assert!(matches!(err, LinkError::TypeOnlyValueAccess { ref name, .. } if name == "pochi"));
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.code, 1362);
    assert_eq!(diagnostic.related_information.len(), 1);
}

#[test]
fn test_type_only_pochi_can_be_imported_as_type() {
    let mut manifest = chapter7();
    with_consumer(
        &mut manifest,
        "./chapter7_1_4.js",
        vec![NameSpec::Plain("pochi".into()), NameSpec::Plain("Animal".into())],
        true,
    );

    let linked = link(&manifest, &["chapter7/consumer"]).unwrap();
    assert!(matches!(
        linked.read("chapter7/consumer", "pochi"),
        Err(LinkError::TypeOnlyValueAccess { .. })
    ));
}

// ============================================================================
// Re-export barrels
// ============================================================================

#[test]
fn test_barrel_export_table() {
    let manifest = chapter7();
    let linked = link(&manifest, &[BARREL]).unwrap();

    let rows = linked.describe_exports(BARREL).unwrap();
    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["name", "age", "language", "count", "something"]);
    assert_eq!(rows[2].origin, "chapter7/chapter7_1_1.language");
    assert_eq!(rows[3].origin, "chapter7/chapter7_1_3.count");
    assert_eq!(rows[4].kind, "namespace");
}

#[test]
fn test_barrel_shadows_nothing_from_named_module() {
    let manifest = chapter7();
    let linked = link(&manifest, &[BARREL, INDEX]).unwrap();

    let barrel_name = linked.origin_of(BARREL, "name");
    let named_name = linked.origin_of(NAMED, "name");
    assert!(matches!(barrel_name, Some(ExportTarget::Binding(_))));
    assert_ne!(barrel_name, named_name);
    assert_eq!(linked.origin_of(INDEX, "language"), linked.origin_of(NAMED, "language"));
}

#[test]
fn test_barrel_namespace_reads_current_values() {
    let mut manifest = chapter7();
    let consumer = ModuleSource {
        imports: vec![ImportSpec {
            from: "./chapter7_1_5.js".to_string(),
            default: None,
            namespace: None,
            names: vec![NameSpec::Plain("something".into())],
            type_only: false,
        }],
        ..ModuleSource::default()
    };
    manifest.modules.insert("chapter7/consumer".to_string(), consumer);

    let mut linked = link(&manifest, &["chapter7/consumer"]).unwrap();
    linked.assign(COUNTER, "count", json!(3)).unwrap();

    let something = linked.namespace("chapter7/consumer", "something").unwrap();
    let count = linked.linker().interner().intern("count");
    let default = linked.linker().interner().intern("default");
    assert_eq!(something.value_of(count), Some(&json!(3)));
    assert!(something.contains(default));
}

// ============================================================================
// Column 34: module scoping
// ============================================================================

#[test]
fn test_module_declarations_stay_private() {
    let manifest = chapter7();
    let linked = link(&manifest, &[INDEX, COLUMN]).unwrap();

    assert_eq!(linked.read(COLUMN, "globalWord").unwrap(), Some(json!("abc")));
    assert!(matches!(
        linked.read(INDEX, "globalWord"),
        Err(LinkError::UnknownLocalBinding { .. })
    ));
}

#[test]
fn test_script_declarations_are_global() {
    let mut manifest = chapter7();
    if let Some(column) = manifest.modules.get_mut(COLUMN) {
        column.scoping = Some(ScopingMode::Script);
    }
    let linked = link(&manifest, &[COLUMN, INDEX]).unwrap();

    assert_eq!(linked.read(INDEX, "globalWord").unwrap(), Some(json!("abc")));
}
