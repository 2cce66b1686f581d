//! Fern runtime library.
//!
//! Provides the support functions compiled Fern programs call at
//! runtime. Built as both:
//!
//! - a static library (`libfern_rt.a`) linked into every Fern
//!   executable by the driver
//! - a Rust library for unit testing
//!
//! ## ABI contract
//!
//! Every public `extern "C"` function here is part of the runtime ABI;
//! the code generator emits direct calls to these symbols, so the
//! signatures must stay stable. Strings are NUL-terminated byte
//! pointers; lists are pointers to [`list::FernList`]; `Option` and
//! `Result` are packed 64-bit words (low 32 bits tag, high 32 bits
//! sign-extended payload).

pub mod io;
pub mod list;
pub mod mem;
pub mod num;
pub mod option;
pub mod panic;
pub mod string;

pub use io::{
    fern_print_bool, fern_print_float, fern_print_int, fern_print_str, fern_println_bool,
    fern_println_float, fern_println_int, fern_println_str,
};
pub use list::{
    fern_list_get, fern_list_len, fern_list_new, fern_list_push, fern_list_with_capacity,
    FernList,
};
pub use mem::{fern_alloc, fern_free};
pub use num::{fern_fmod, fern_pow};
pub use option::{
    fern_option_is_some, fern_option_none, fern_option_some, fern_option_unwrap,
    fern_option_unwrap_or, fern_result_err, fern_result_is_ok, fern_result_ok,
    fern_result_unwrap, fern_result_unwrap_or,
};
pub use panic::fern_panic;
pub use string::{fern_str_concat, fern_str_eq, fern_str_len};
