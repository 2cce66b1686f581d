//! Interactive REPL for the Fern language.
//!
//! Reads lines with `rustyline` (persistent history in
//! `~/.fern_history`), feeds them to a [`ReplSession`], and prints the
//! result. The REPL type-checks and can show IR; it does not evaluate.

pub mod session;

use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub use session::{ReplOutcome, ReplSession};

/// Run the interactive loop. Returns the process exit code.
pub fn run() -> i32 {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("fern repl: cannot initialize line editor: {e}");
            return 1;
        }
    };

    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    println!("Fern REPL -- :help for commands, :quit to exit");
    let mut session = ReplSession::new();

    loop {
        match editor.readline("fern> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                match session.eval(&line) {
                    ReplOutcome::Output(text) => println!("{text}"),
                    ReplOutcome::Empty => {}
                    ReplOutcome::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C clears the current line.
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("fern repl: {e}");
                break;
            }
        }
    }

    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }
    0
}

fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".fern_history"))
}
