//! End-to-end coverage of the public loader API (`spec.md` §8's literal scenarios), exercised
//! through `ecma335::registry::Registry` rather than the crate's private test fixtures.

use ecma335::registry::Registry;
use ecma335::status::{Error, Status};

/// §8 scenario 1: an empty buffer fails the whole open with `IMAGE_INVALID`.
#[test]
fn empty_buffer_is_image_invalid() {
  let registry = Registry::new();
  let err = registry.open_from_bytes(Vec::new(), false).unwrap_err();
  let status: Status = err.into();

  assert_eq!(status, Status::ImageInvalid);
}

/// A buffer that starts with `MZ` but has no PE header at all still fails cleanly rather than
/// panicking on the out-of-bounds `pe_offset` read.
#[test]
fn truncated_dos_stub_is_image_invalid() {
  let registry = Registry::new();
  let err = registry.open_from_bytes(b"MZ".to_vec(), false).unwrap_err();

  assert!(matches!(err, Error::Format(_)));
}
