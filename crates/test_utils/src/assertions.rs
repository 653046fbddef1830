//! Custom Test Assertions
//!
//! Provides assertion helpers for sync outcomes that give more meaningful
//! failure messages than plain `assert_eq!`.

use crate::transport::ScriptedTransport;

/// Asserts that `method` was called exactly `expected` times
///
/// # Panics
///
/// Panics with the full call log if the count differs
pub fn assert_call_count(transport: &ScriptedTransport, method: &str, expected: usize) {
    let actual = transport.call_count(method);
    assert_eq!(
        actual,
        expected,
        "Expected {} call(s) to {}, got {}; calls: {:?}",
        expected,
        method,
        actual,
        transport.methods()
    );
}

/// Asserts that `method` was never called
pub fn assert_not_called(transport: &ScriptedTransport, method: &str) {
    assert_call_count(transport, method, 0);
}

/// Asserts that the transport saw exactly `expected`, in order
pub fn assert_methods(transport: &ScriptedTransport, expected: &[&str]) {
    let actual = transport.methods();
    assert_eq!(
        actual, expected,
        "Unexpected call sequence: actual={:?}, expected={:?}",
        actual, expected
    );
}
