//! Unit tests for the tool host.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use camino::Utf8PathBuf;
use corral_sandbox::{GuestContext, GuestResult, Interrupt};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::error::{InvocationError, LoadError};
use crate::resolver::EntryTable;

fn hello(ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
    write!(ctx.stdout(), "hello")?;
    Err(ctx.exit(2))
}

fn warn_and_fail(ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
    write!(ctx.stdout(), "partial")?;
    writeln!(ctx.stderr(), "fatal: bad input")?;
    Err(Interrupt::fault("bad input"))
}

fn echo(ctx: &GuestContext<'_>, args: &[String]) -> GuestResult {
    write!(ctx.stdout(), "{}", args.join(" "))?;
    Ok(())
}

struct Bundles {
    dir: TempDir,
}

impl Bundles {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    fn manifest(&self, name: &str, main_class: &str) -> PathBuf {
        let path = self.dir.path().join(format!("{name}.mf"));
        fs::write(&path, format!("Main-Class: {main_class}\n")).expect("write manifest");
        path
    }
}

#[fixture]
fn table() -> EntryTable {
    let mut table = EntryTable::new();
    table.register("Hello", hello).expect("register Hello");
    table.register("WarnAndFail", warn_and_fail).expect("register WarnAndFail");
    table.register("Echo", echo).expect("register Echo");
    table
}

#[fixture]
fn loaded(table: EntryTable) -> (Bundles, ToolHost<EntryTable>) {
    let bundles = Bundles::new();
    let mut host =
        ToolHost::install(TerminationTrust::AnyRequest, table).expect("host installs");
    host.load("hello", &bundles.manifest("hello", "Hello"))
        .expect("load hello");
    host.load("fails", &bundles.manifest("fails", "WarnAndFail"))
        .expect("load fails");
    host.load("echo", &bundles.manifest("echo", "Echo"))
        .expect("load echo");
    (bundles, host)
}

#[rstest]
fn run_returns_status_and_output(loaded: (Bundles, ToolHost<EntryTable>)) {
    let (_bundles, host) = loaded;
    let output = host.run("hello", &[]).expect("runs");
    assert_eq!(output, ToolOutput::new(2, "hello", ""));
    assert!(!output.success());
}

#[rstest]
fn each_run_sees_only_its_own_output(loaded: (Bundles, ToolHost<EntryTable>)) {
    let (_bundles, host) = loaded;
    host.run("hello", &[]).expect("first run");
    let output = host
        .run("echo", &[String::from("second")])
        .expect("second run");
    assert_eq!(output.stdout(), "second");
    assert!(output.success());
}

#[rstest]
fn buffers_are_cleared_after_a_run(loaded: (Bundles, ToolHost<EntryTable>)) {
    let (_bundles, host) = loaded;
    host.run("hello", &[]).expect("runs");
    assert_eq!(host.sandbox().capture().drain_output(), "");
}

#[rstest]
fn failed_run_propagates_and_clears(loaded: (Bundles, ToolHost<EntryTable>)) {
    let (_bundles, host) = loaded;
    let error = host.run("fails", &[]).expect_err("fault");
    assert!(matches!(
        error,
        HostError::Invocation(InvocationError::Fault { .. })
    ));
    assert_eq!(host.sandbox().capture().drain_output(), "");
    assert_eq!(host.sandbox().capture().drain_error(), "");
}

#[rstest]
fn unknown_tool_is_not_loaded(loaded: (Bundles, ToolHost<EntryTable>)) {
    let (_bundles, host) = loaded;
    let error = host.run("d8", &[]).expect_err("unknown");
    assert!(matches!(error, HostError::NotLoaded { name } if name == "d8"));
}

#[rstest]
fn duplicate_names_are_rejected(loaded: (Bundles, ToolHost<EntryTable>)) {
    let (bundles, mut host) = loaded;
    let error = host
        .load("hello", &bundles.manifest("again", "Echo"))
        .expect_err("duplicate");
    assert!(matches!(error, HostError::AlreadyLoaded { .. }));
    assert_eq!(host.len(), 3);
}

#[rstest]
fn load_failures_name_the_tool(table: EntryTable) {
    let bundles = Bundles::new();
    let mut host =
        ToolHost::install(TerminationTrust::AnyRequest, table).expect("host installs");
    let error = host
        .load("ghost", &bundles.manifest("ghost", "NoSuchClass"))
        .expect_err("unresolved");
    match error {
        HostError::Load { name, source } => {
            assert_eq!(name, "ghost");
            assert!(matches!(source, LoadError::UnresolvedEntryPoint { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(host.is_empty());
}

#[rstest]
fn names_are_sorted(loaded: (Bundles, ToolHost<EntryTable>)) {
    let (_bundles, host) = loaded;
    assert_eq!(host.names(), vec!["echo", "fails", "hello"]);
    assert!(host.contains("echo"));
    assert!(!host.contains("javac"));
}

#[rstest]
fn concurrent_runs_are_serialised(loaded: (Bundles, ToolHost<EntryTable>)) {
    let (_bundles, host) = loaded;
    let shared_host = Arc::new(host);
    let workers: Vec<_> = (0..8)
        .map(|index| {
            let shared = Arc::clone(&shared_host);
            thread::spawn(move || {
                let word = format!("run-{index}");
                let output = shared.run("echo", &[word.clone()]).expect("runs");
                assert_eq!(output.stdout(), word);
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker finished");
    }
}

#[rstest]
fn sibling_hosts_share_the_run_gate(loaded: (Bundles, ToolHost<EntryTable>), table: EntryTable) {
    let (bundles, host) = loaded;
    let mut second = host.sibling(table);
    second
        .load("echo", &bundles.manifest("echo-again", "Echo"))
        .expect("load echo");
    assert!(Arc::ptr_eq(host.sandbox(), second.sandbox()));

    let hosts = [Arc::new(host), Arc::new(second)];
    let workers: Vec<_> = (0..8)
        .map(|index| {
            let shared = hosts.get(index % 2).map(Arc::clone).expect("host");
            thread::spawn(move || {
                let word = format!("sibling-{index}");
                let output = shared.run("echo", &[word.clone()]).expect("runs");
                assert_eq!(output.stdout(), word);
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker finished");
    }
}

#[rstest]
fn from_config_loads_listed_tools(table: EntryTable) {
    let bundles = Bundles::new();
    let location = Utf8PathBuf::from_path_buf(bundles.manifest("hello", "Hello"))
        .expect("utf-8 temp path");
    let config = HostConfig::default().with_tool("hi", location);

    let host = ToolHost::from_config(&config, table).expect("host builds");
    assert_eq!(host.names(), vec!["hi"]);
    assert_eq!(host.run("hi", &[]).expect("runs").status(), 2);
}

#[test]
fn tool_output_serialises_to_json() {
    let output = ToolOutput::new(1, "out", "err");
    let json = serde_json::to_value(&output).expect("serialise");
    assert_eq!(
        json,
        serde_json::json!({ "status": 1, "stdout": "out", "stderr": "err" })
    );
}
