//! Shared leaf types for the Fern compiler.
//!
//! Every pipeline stage depends on this crate. It provides:
//!
//! - [`arena`]: the bump-allocated region all tokens, AST nodes, and
//!   interned strings live in
//! - [`intern`]: a deduplicating string interner backed by the arena
//! - [`pos`]: 1-based line/column source positions
//! - [`token`]: the token vocabulary, including the layout tokens
//!   (`Newline`, `Indent`, `Dedent`) synthesized by the lexer

pub mod arena;
pub mod intern;
pub mod pos;
pub mod token;

pub use arena::Arena;
pub use intern::Interner;
pub use pos::Pos;
pub use token::{keyword_from_str, Token, TokenKind};
