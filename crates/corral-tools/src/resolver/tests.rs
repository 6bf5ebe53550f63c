//! Unit tests for entry-point resolution.

use rstest::{fixture, rstest};

use corral_sandbox::{GuestContext, GuestResult};

use super::*;

fn noop(_ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
    Ok(())
}

#[fixture]
fn table() -> EntryTable {
    let mut table = EntryTable::new();
    table.register("Hello", noop).expect("register Hello");
    table
}

#[rstest]
fn resolves_registered_symbol(table: EntryTable) {
    let manifest = ToolManifest::parse("Main-Class: Hello\n").expect("manifest parses");
    let entry = table.resolve(&manifest).expect("resolves");
    assert_eq!(entry.symbol(), "Hello");
    assert_eq!(entry.origin(), &EntryOrigin::Linked);
}

#[rstest]
fn unknown_symbol_is_unresolved(table: EntryTable) {
    let manifest = ToolManifest::parse("Main-Class: Missing\n").expect("manifest parses");
    let error = table.resolve(&manifest).expect_err("unresolved");
    match error {
        LoadError::UnresolvedEntryPoint { symbol, source } => {
            assert_eq!(symbol, "Missing");
            assert!(source.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
fn symbols_are_case_sensitive(table: EntryTable) {
    let manifest = ToolManifest::parse("Main-Class: hello\n").expect("manifest parses");
    assert!(table.resolve(&manifest).is_err());
}

#[rstest]
fn duplicate_registration_is_rejected(mut table: EntryTable) {
    let error = table.register("Hello", noop).expect_err("duplicate");
    assert!(matches!(error, LoadError::DuplicateEntryPoint { .. }));
    assert_eq!(table.len(), 1);
}

#[test]
fn new_table_is_empty() {
    let table = EntryTable::new();
    assert!(table.is_empty());
    assert!(table.get("Hello").is_none());
}

#[rstest]
fn resolver_references_delegate(table: EntryTable) {
    let manifest = ToolManifest::parse("Main-Class: Hello\n").expect("manifest parses");
    fn resolve_with<R: EntryResolver>(resolver: R, manifest: &ToolManifest) -> bool {
        resolver.resolve(manifest).is_ok()
    }
    let as_dyn: &dyn EntryResolver = &table;
    assert!(resolve_with(&table, &manifest));
    assert!(resolve_with(as_dyn, &manifest));
}

#[test]
fn origin_display() {
    assert_eq!(EntryOrigin::Linked.to_string(), "linked");
    assert_eq!(
        EntryOrigin::Library(PathBuf::from("/opt/libtool.so")).to_string(),
        "library /opt/libtool.so"
    );
}
