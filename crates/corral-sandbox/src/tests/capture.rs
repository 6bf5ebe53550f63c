//! Unit tests for the output capture.

use std::io::Write;

use rstest::{fixture, rstest};

use crate::capture::{OutputCapture, StreamKind};
use crate::error::RestrictedAction;

#[fixture]
fn capture() -> OutputCapture {
    let capture = OutputCapture::new();
    capture.install().expect("capture installs");
    capture
}

#[test]
fn new_capture_is_inactive() {
    let capture = OutputCapture::new();
    assert!(!capture.is_installed());
    assert_eq!(capture.drain_output(), "");
    assert_eq!(capture.drain_error(), "");
}

#[rstest]
fn drain_before_any_write_is_empty(capture: OutputCapture) {
    assert_eq!(capture.drain_output(), "");
    assert_eq!(capture.drain_error(), "");
}

#[rstest]
fn streams_are_captured_separately(capture: OutputCapture) {
    write!(capture.stdout(), "out").expect("write stdout");
    write!(capture.stderr(), "err").expect("write stderr");

    assert_eq!(capture.drain_output(), "out");
    assert_eq!(capture.drain_error(), "err");
}

#[rstest]
fn drain_does_not_consume(capture: OutputCapture) {
    write!(capture.stdout(), "twice").expect("write stdout");
    assert_eq!(capture.drain_output(), "twice");
    assert_eq!(capture.drain_output(), "twice");
}

#[rstest]
fn clear_empties_both_buffers_and_is_idempotent(capture: OutputCapture) {
    write!(capture.stdout(), "out").expect("write stdout");
    write!(capture.stderr(), "err").expect("write stderr");

    capture.clear();
    assert_eq!(capture.drain_output(), "");
    assert_eq!(capture.drain_error(), "");

    capture.clear();
    assert_eq!(capture.drain_output(), "");
}

#[rstest]
fn writes_after_clear_are_kept(capture: OutputCapture) {
    write!(capture.stdout(), "stale").expect("write stdout");
    capture.clear();
    write!(capture.stdout(), "fresh").expect("write stdout");
    assert_eq!(capture.drain_output(), "fresh");
}

#[rstest]
fn invalid_utf8_is_decoded_lossily(capture: OutputCapture) {
    capture
        .stdout()
        .write_all(&[b'o', b'k', 0xff])
        .expect("write bytes");
    assert_eq!(capture.drain_output(), "ok\u{fffd}");
}

#[rstest]
fn reinstall_before_sealing_resets_buffers(capture: OutputCapture) {
    write!(capture.stdout(), "before").expect("write stdout");
    capture.install().expect("reinstall before sealing");
    assert_eq!(capture.drain_output(), "");
}

#[rstest]
fn sealed_capture_refuses_reinstall(capture: OutputCapture) {
    assert!(!capture.seal());
    let violation = capture.install().expect_err("sealed capture");
    assert_eq!(violation.action(), RestrictedAction::ReplaceOutputStreams);
}

#[rstest]
fn writers_report_their_stream(capture: OutputCapture) {
    assert_eq!(capture.stdout().kind(), StreamKind::Output);
    assert_eq!(capture.stderr().kind(), StreamKind::Error);
}
