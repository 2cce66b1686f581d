//! Runtime panic handler.
//!
//! Called by compiled programs on unrecoverable errors, e.g. a match
//! expression that exhausts its arms. Prints the message to stderr and
//! aborts the process.

use std::os::raw::c_char;

use crate::string::cstr_to_str;

/// Abort with a message (internal Rust-side entry).
pub(crate) fn abort_with(message: &str) -> ! {
    eprintln!("fern panic: {message}");
    std::process::abort();
}

/// Abort the process with the given message.
///
/// # Safety
///
/// `msg` must be a valid NUL-terminated pointer.
#[no_mangle]
pub unsafe extern "C" fn fern_panic(msg: *const c_char) -> ! {
    let message = cstr_to_str(msg);
    abort_with(&message)
}

// fern_panic aborts the process, so it has no unit tests; driver-level
// tests observe it through compiled programs.
