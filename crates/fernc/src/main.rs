//! The Fern compiler CLI.
//!
//! Subcommands:
//!
//! - `fernc build <file>` - compile to a native executable via the
//!   external `qbe` tool and the system C compiler
//! - `fernc check <file>` - lex, parse, and type check only
//! - `fernc emit <file>`  - print the QBE IR to stdout
//! - `fernc repl`         - start an interactive session
//!
//! Both `.fn` and `.🌿` source extensions are accepted (the compiler
//! never inspects the extension).

use std::path::{Path, PathBuf};
use std::process::{self, Command};

use clap::{Parser as ClapParser, Subcommand};

use fern_common::{Arena, Pos};
use fern_parser::Parser;
use fern_typeck::Checker;

#[derive(ClapParser)]
#[command(name = "fernc", version, about = "The Fern compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to an executable named after it
    Build {
        /// Path to the Fern source file
        file: PathBuf,
    },
    /// Type check a source file without generating code
    Check {
        /// Path to the Fern source file
        file: PathBuf,
    },
    /// Print the QBE IR for a source file to stdout
    Emit {
        /// Path to the Fern source file
        file: PathBuf,
    },
    /// Start the interactive REPL
    Repl,
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Build { file } => cmd_build(&file),
        Commands::Check { file } => cmd_check(&file),
        Commands::Emit { file } => cmd_emit(&file),
        Commands::Repl => fern_repl::run(),
    };
    process::exit(code);
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_check(file: &Path) -> i32 {
    let Some(source) = read_source(file) else {
        return 1;
    };
    if check_source(&source, file).is_none() {
        return 1;
    }
    println!("\u{2713} {}: No type errors", file.display());
    0
}

fn cmd_emit(file: &Path) -> i32 {
    let Some(source) = read_source(file) else {
        return 1;
    };
    match compile_to_ir(&source, file) {
        Some(ir) => {
            print!("{ir}");
            0
        }
        None => 1,
    }
}

fn cmd_build(file: &Path) -> i32 {
    let Some(source) = read_source(file) else {
        return 1;
    };
    eprintln!("Compiling {}...", file.display());
    let Some(ir) = compile_to_ir(&source, file) else {
        return 1;
    };

    let base = basename(file);
    let ssa_file = format!("{base}.ssa");
    if let Err(e) = std::fs::write(&ssa_file, ir) {
        eprintln!("{}: cannot write `{ssa_file}`: {e}", file.display());
        return 1;
    }

    match assemble_and_link(&ssa_file, &base) {
        Ok(()) => {
            let _ = std::fs::remove_file(&ssa_file);
            eprintln!("Created executable: {base}");
            0
        }
        Err(message) => {
            eprintln!("{}: {message}", file.display());
            1
        }
    }
}

// ── Pipeline ────────────────────────────────────────────────────────────

/// Lex, parse, and check; report diagnostics. Returns `None` on any
/// error.
fn check_source(source: &str, path: &Path) -> Option<()> {
    let arena = Arena::new();
    let mut parser = Parser::new(&arena, source);
    let stmts = parser.parse_stmts();

    if report_front_end(source, path, &parser) {
        return None;
    }

    let mut checker = Checker::new();
    let ok = checker.check_stmts(stmts);
    report_type_diagnostics(source, path, &checker);
    if !ok {
        return None;
    }
    Some(())
}

/// Full pipeline: produce the QBE IR text, or `None` after reporting
/// diagnostics.
fn compile_to_ir(source: &str, path: &Path) -> Option<String> {
    let arena = Arena::new();
    let mut parser = Parser::new(&arena, source);
    let stmts = parser.parse_stmts();

    if report_front_end(source, path, &parser) {
        return None;
    }

    let mut checker = Checker::new();
    let ok = checker.check_stmts(stmts);
    report_type_diagnostics(source, path, &checker);
    if !ok {
        return None;
    }

    let mut cg = fern_codegen::Codegen::new(checker.types());
    cg.program(stmts);
    Some(cg.output())
}

// ── Diagnostics ─────────────────────────────────────────────────────────

/// Report lex and parse errors with ariadne. Returns true if any were
/// found.
fn report_front_end(source: &str, path: &Path, parser: &Parser) -> bool {
    let mut has_errors = false;
    for error in parser.lex_errors() {
        has_errors = true;
        report_at(source, path, error.pos, "Lex error", &error.message);
    }
    for error in parser.errors() {
        has_errors = true;
        report_at(source, path, error.pos, "Parse error", &error.message);
    }
    has_errors
}

fn report_type_diagnostics(source: &str, path: &Path, checker: &Checker) {
    for warning in checker.warnings() {
        eprintln!("{}: warning: {}", path.display(), warning);
    }
    for error in checker.errors() {
        report_at(source, path, error.pos(), "Type error", &error.to_string());
    }
}

/// Render one labelled source report to stderr.
fn report_at(source: &str, path: &Path, pos: Pos, kind: &str, message: &str) {
    use ariadne::{Label, Report, ReportKind, Source};

    eprintln!("{}:{}: {kind}", path.display(), pos);
    let start = pos.byte_offset(source).min(source.len());
    let end = (start + 1).min(source.len()).max(start);
    let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, start..end)
        .with_message(kind)
        .with_label(Label::new(start..end).with_message(message))
        .finish()
        .eprint(Source::from(source));
}

// ── External tools ──────────────────────────────────────────────────────

/// Run `qbe`, assemble, and link with the runtime library.
fn assemble_and_link(ssa_file: &str, output: &str) -> Result<(), String> {
    let asm_file = format!("{output}.s");
    let obj_file = format!("{output}.o");

    run_tool(
        Command::new("qbe").args(["-o", &asm_file, ssa_file]),
        "QBE compilation failed (is qbe installed? https://c9x.me/compile/)",
    )?;

    run_tool(
        Command::new("cc").args(["-c", "-o", &obj_file, &asm_file]),
        "assembly failed",
    )?;

    let mut link = Command::new("cc");
    link.args(["-o", output, &obj_file]);
    if let Some(runtime) = find_runtime_lib() {
        link.arg(runtime);
    }
    run_tool(&mut link, "linking failed")?;

    let _ = std::fs::remove_file(&asm_file);
    let _ = std::fs::remove_file(&obj_file);
    Ok(())
}

fn run_tool(command: &mut Command, failure: &str) -> Result<(), String> {
    match command.status() {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(format!("{failure} (exit {status})")),
        Err(e) => Err(format!("{failure}: {e}")),
    }
}

/// The runtime static library is built alongside the compiler; look
/// for it next to the executable.
fn find_runtime_lib() -> Option<PathBuf> {
    let mut dir = std::env::current_exe().ok()?.parent()?.to_path_buf();
    if dir.file_name().is_some_and(|n| n == "deps") {
        dir = dir.parent()?.to_path_buf();
    }
    let lib = dir.join("libfern_rt.a");
    lib.exists().then_some(lib)
}

// ── Files ───────────────────────────────────────────────────────────────

fn read_source(file: &Path) -> Option<String> {
    match std::fs::read_to_string(file) {
        Ok(source) => Some(source),
        Err(e) => {
            eprintln!("{}: cannot read file: {e}", file.display());
            None
        }
    }
}

/// File stem without directories or extension, used to name outputs.
fn basename(file: &Path) -> String {
    file.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out")
        .to_string()
}
