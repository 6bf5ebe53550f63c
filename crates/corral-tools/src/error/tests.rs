//! Unit tests for load and invocation error types.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use rstest::rstest;

use super::*;

#[test]
fn manifest_unreadable_includes_path() {
    let error = LoadError::ManifestUnreadable {
        path: PathBuf::from("/opt/sdk/d8/META-INF/MANIFEST.MF"),
        source: Arc::new(std::io::Error::other("denied")),
    };
    let message = error.to_string();
    assert!(
        message.contains("/opt/sdk/d8/META-INF/MANIFEST.MF"),
        "expected path in message: {message}"
    );
}

#[test]
fn archive_error_names_archive_and_keeps_source() {
    let error = LoadError::ArchiveUnreadable {
        path: PathBuf::from("/opt/sdk/d8.jar"),
        source: Arc::new(zip::result::ZipError::FileNotFound),
    };
    assert!(error.to_string().contains("/opt/sdk/d8.jar"));
    assert!(error.source().is_some());
}

#[rstest]
#[case::malformed(
    LoadError::MalformedManifest {
        line: 4,
        message: "missing ': ' separator".into(),
    },
    "line 4"
)]
#[case::unresolved(
    LoadError::UnresolvedEntryPoint {
        symbol: "com.android.tools.r8.D8".into(),
        source: None,
    },
    "com.android.tools.r8.D8"
)]
#[case::duplicate(
    LoadError::DuplicateEntryPoint {
        symbol: "Main".into(),
    },
    "already registered"
)]
fn load_error_message_includes_detail(#[case] error: LoadError, #[case] expected: &str) {
    let message = error.to_string();
    assert!(
        message.contains(expected),
        "expected {expected} in message: {message}"
    );
}

#[test]
fn fault_keeps_original_cause() {
    let error = InvocationError::Fault {
        tool: "d8".into(),
        source: "boom".into(),
    };
    assert_eq!(error.tool(), "d8");
    assert!(!error.is_policy_violation());
    let source = error.source().expect("fault has a source");
    assert_eq!(source.to_string(), "boom");
}

#[test]
fn errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LoadError>();
    assert_send_sync::<InvocationError>();
    assert_send_sync::<HostError>();
}

#[test]
fn not_loaded_mentions_tool() {
    let error = HostError::NotLoaded {
        name: "apksigner".into(),
    };
    assert_eq!(error.to_string(), "tool 'apksigner' isn't loaded");
}
