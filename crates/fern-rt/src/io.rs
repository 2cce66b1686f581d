//! Printing helpers.
//!
//! One function per (type, newline) pair; the code generator picks the
//! variant from the checked argument type. Booleans arrive as integers
//! (0 = false).

use std::io::Write;
use std::os::raw::c_char;

use crate::string::cstr_to_str;

fn flush() {
    let _ = std::io::stdout().flush();
}

#[no_mangle]
pub extern "C" fn fern_print_int(n: i64) {
    print!("{n}");
    flush();
}

#[no_mangle]
pub extern "C" fn fern_println_int(n: i64) {
    println!("{n}");
}

#[no_mangle]
pub extern "C" fn fern_print_float(x: f64) {
    print!("{x}");
    flush();
}

#[no_mangle]
pub extern "C" fn fern_println_float(x: f64) {
    println!("{x}");
}

/// # Safety
///
/// `s` must be a valid NUL-terminated string (compiler-emitted data or
/// a runtime-allocated string).
#[no_mangle]
pub unsafe extern "C" fn fern_print_str(s: *const c_char) {
    print!("{}", cstr_to_str(s));
    flush();
}

/// # Safety
///
/// See [`fern_print_str`].
#[no_mangle]
pub unsafe extern "C" fn fern_println_str(s: *const c_char) {
    println!("{}", cstr_to_str(s));
}

#[no_mangle]
pub extern "C" fn fern_print_bool(b: i64) {
    print!("{}", if b != 0 { "true" } else { "false" });
    flush();
}

#[no_mangle]
pub extern "C" fn fern_println_bool(b: i64) {
    println!("{}", if b != 0 { "true" } else { "false" });
}
