//! Crate-level integration and BDD tests.

use std::io::Write;

use corral_sandbox::{GuestContext, GuestResult, Interrupt, TerminationTrust};

use crate::host::ToolHost;
use crate::resolver::{EntryFn, EntryTable};


fn hello(ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
    write!(ctx.stdout(), "hello")?;
    Err(ctx.exit(2))
}

fn boom(_ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
    Err(Interrupt::fault("boom"))
}

fn unwinding(_ctx: &GuestContext<'_>, args: &[String]) -> GuestResult {
    let code = args.first().and_then(|arg| arg.parse().ok()).unwrap_or(1);
    corral_sandbox::request_termination(code)
}

fn redirecting(ctx: &GuestContext<'_>, _args: &[String]) -> GuestResult {
    ctx.redirect_output()?;
    Ok(())
}

fn quiet(ctx: &GuestContext<'_>, args: &[String]) -> GuestResult {
    write!(ctx.stderr(), "{}", args.join(" "))?;
    Ok(())
}

fn entry_table() -> EntryTable {
    let mut table = EntryTable::new();
    for (symbol, callable) in [
        ("Hello", hello as EntryFn),
        ("Boom", boom),
        ("Unwinding", unwinding),
        ("Redirecting", redirecting),
        ("Quiet", quiet),
    ] {
        table.register(symbol, callable).expect("register entry");
    }
    table
}

#[test]
fn end_to_end_bundle_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    let meta = dir.path().join("hello").join("META-INF");
    std::fs::create_dir_all(&meta).expect("meta dir");
    std::fs::write(meta.join("MANIFEST.MF"), "Manifest-Version: 1.0\r\nMain-Class: Hello\r\n")
        .expect("write manifest");

    let mut host =
        ToolHost::install(TerminationTrust::AnyRequest, entry_table()).expect("host installs");
    host.load("hello", &dir.path().join("hello"))
        .expect("tool loads");
    let output = host.run("hello", &[]).expect("tool runs");
    assert_eq!(output.status(), 2);
    assert_eq!(output.stdout(), "hello");
    assert_eq!(output.stderr(), "");
}

#[test]
fn end_to_end_archive_run() {
    use zip::write::{SimpleFileOptions, ZipWriter};

    let dir = tempfile::tempdir().expect("temp dir");
    let jar = dir.path().join("hello.jar");
    let mut writer = ZipWriter::new(std::fs::File::create(&jar).expect("create archive"));
    writer
        .start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())
        .expect("start entry");
    writer
        .write_all(b"Manifest-Version: 1.0\r\nMain-Class: Hello\r\n")
        .expect("write entry");
    writer.finish().expect("finish archive");

    let mut host =
        ToolHost::install(TerminationTrust::AnyRequest, entry_table()).expect("host installs");
    host.load("hello", &jar).expect("tool loads");
    let output = host.run("hello", &[]).expect("tool runs");
    assert_eq!(output.status(), 2);
    assert_eq!(output.stdout(), "hello");
}
