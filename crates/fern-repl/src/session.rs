//! REPL session state.
//!
//! The session accumulates top-level definitions; each new input is
//! parsed and checked together with everything entered so far, so later
//! lines can use earlier bindings. Expressions answer with their
//! inferred type -- the REPL does not evaluate.

use fern_common::Arena;
use fern_parser::ast::{PatternKind, StmtKind};
use fern_parser::Parser;
use fern_typeck::Checker;

/// What the caller should do with one evaluated input.
#[derive(Debug, PartialEq)]
pub enum ReplOutcome {
    /// Show this text and keep reading.
    Output(String),
    /// Nothing to show; keep reading.
    Empty,
    /// End the session.
    Quit,
}

/// Persistent state for a REPL session.
pub struct ReplSession {
    /// Accumulated top-level definitions, one input per entry.
    definitions: Vec<String>,
}

impl ReplSession {
    pub fn new() -> Self {
        ReplSession {
            definitions: Vec::new(),
        }
    }

    /// Evaluate one line of input: a `:command` or Fern source.
    pub fn eval(&mut self, line: &str) -> ReplOutcome {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ReplOutcome::Empty;
        }

        match trimmed {
            ":quit" | ":q" => return ReplOutcome::Quit,
            ":help" => return ReplOutcome::Output(help_text()),
            ":reset" => {
                self.definitions.clear();
                return ReplOutcome::Output("session cleared".to_string());
            }
            ":env" => return self.show_env(),
            ":ir" => return self.show_ir(),
            _ => {}
        }

        self.eval_source(trimmed)
    }

    /// All accumulated definitions as one source text.
    pub fn definitions_source(&self) -> String {
        self.definitions.join("\n")
    }

    // ── Source evaluation ──────────────────────────────────────────────

    fn eval_source(&mut self, input: &str) -> ReplOutcome {
        let context = self.definitions_source();
        let offset = stmt_count(&context);

        let mut combined = context;
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(input);

        let arena = Arena::new();
        let mut parser = Parser::new(&arena, &combined);
        let stmts = parser.parse_stmts();
        if let Some(error) = parser.lex_errors().first() {
            return ReplOutcome::Output(format!("lex error: {error}"));
        }
        if parser.had_error() {
            let message = parser
                .errors()
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "parse error".to_string());
            return ReplOutcome::Output(format!("parse error: {message}"));
        }

        let mut checker = Checker::new();
        if !checker.check_stmts(stmts) {
            let message = checker.first_error().unwrap_or_else(|| "type error".into());
            return ReplOutcome::Output(format!("type error: {message}"));
        }

        let new_stmts = &stmts[offset.min(stmts.len())..];
        let Some(last) = new_stmts.last() else {
            return ReplOutcome::Empty;
        };

        // Definitions are remembered; expressions answer with a type.
        let all_definitions = new_stmts
            .iter()
            .all(|s| !matches!(s.kind, StmtKind::Expr(_)));
        if all_definitions {
            self.definitions.push(input.to_string());
        }

        let output = match last.kind {
            StmtKind::Fn { name, .. } => match checker.scheme_of(name) {
                Some(scheme) => format!("{name} : {scheme}"),
                None => format!("{name} defined"),
            },
            StmtKind::Let { pattern, .. } => match pattern.kind {
                PatternKind::Binding(name) => match checker.scheme_of(name) {
                    Some(scheme) => format!("{name} : {scheme}"),
                    None => format!("{name} bound"),
                },
                _ => "bound".to_string(),
            },
            StmtKind::TypeAlias { name, .. } => format!("type {name} defined"),
            StmtKind::Import { path } => format!("imported {path}"),
            StmtKind::Expr(_) => {
                let ty = checker
                    .types()
                    .get(&last.id)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "()".to_string());
                format!("- : {ty}")
            }
        };
        ReplOutcome::Output(output)
    }

    // ── Commands ───────────────────────────────────────────────────────

    /// `:env` -- list the visible top-level bindings with their schemes.
    fn show_env(&self) -> ReplOutcome {
        let context = self.definitions_source();
        let arena = Arena::new();
        let mut parser = Parser::new(&arena, &context);
        let stmts = parser.parse_stmts();
        let mut checker = Checker::new();
        checker.check_stmts(stmts);

        let mut lines = Vec::new();
        for (name, scheme) in checker.env().visible_bindings() {
            if name.starts_with(|c: char| c.is_ascii_alphabetic()) {
                lines.push(format!("{name} : {scheme}"));
            }
        }
        ReplOutcome::Output(lines.join("\n"))
    }

    /// `:ir` -- show the QBE IR for the accumulated definitions.
    fn show_ir(&self) -> ReplOutcome {
        let context = self.definitions_source();
        let arena = Arena::new();
        let mut parser = Parser::new(&arena, &context);
        let stmts = parser.parse_stmts();
        if parser.had_error() {
            return ReplOutcome::Output("cannot emit: session has parse errors".to_string());
        }
        let mut checker = Checker::new();
        if !checker.check_stmts(stmts) {
            return ReplOutcome::Output("cannot emit: session has type errors".to_string());
        }
        let mut cg = fern_codegen::Codegen::new(checker.types());
        cg.program(stmts);
        ReplOutcome::Output(cg.output())
    }
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of top-level statements in already-accepted source.
fn stmt_count(source: &str) -> usize {
    if source.is_empty() {
        return 0;
    }
    let arena = Arena::new();
    let mut parser = Parser::new(&arena, source);
    parser.parse_stmts().len()
}

fn help_text() -> String {
    [
        ":help   show this help",
        ":env    list bindings and their types",
        ":ir     show QBE IR for the session's definitions",
        ":reset  clear the session",
        ":quit   exit",
    ]
    .join("\n")
}
