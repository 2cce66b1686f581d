//! Integration tests for the Fern lexer.

use fern_common::{Arena, TokenKind};
use fern_lexer::Lexer;

/// Lexing the same source twice yields identical token streams.
#[test]
fn lexing_is_deterministic() {
    let source = "fn add(a: Int, b: Int) -> Int:\n    a + b\n\nlet total = add(1, 2)\n";
    let arena = Arena::new();
    let first = Lexer::tokenize(&arena, source);
    let second = Lexer::tokenize(&arena, source);
    assert_eq!(first, second);
}

/// Concatenating non-layout lexemes reproduces the source modulo
/// whitespace and comments.
#[test]
fn lexemes_reproduce_source_modulo_whitespace() {
    let source = "let x = 1 + 2  # trailing comment\nfn f(a):\n    a * x\n";
    let arena = Arena::new();
    let tokens = Lexer::tokenize(&arena, source);

    let lexemes: String = tokens
        .iter()
        .filter(|t| !t.kind.is_layout())
        .map(|t| t.text)
        .collect();

    let stripped: String = source
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .collect::<String>()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    assert_eq!(lexemes, stripped);
}

/// A program that only nests deeper and deeper eventually hits the
/// indent stack bound and reports an error instead of growing forever.
#[test]
fn indent_depth_is_bounded() {
    let mut source = String::new();
    for depth in 0..300 {
        for _ in 0..depth {
            source.push(' ');
        }
        source.push_str("x:\n");
    }
    let arena = Arena::new();
    let mut lexer = Lexer::new(&arena, &source);
    loop {
        if lexer.next().kind == TokenKind::Eof {
            break;
        }
    }
    assert!(
        lexer
            .errors()
            .iter()
            .any(|e| e.message.contains("nested too deeply")),
        "expected a depth-bound error, got {:?}",
        lexer.errors()
    );
}

/// The lexer recovers after an error token and keeps producing tokens.
#[test]
fn error_recovery_continues_lexing() {
    let arena = Arena::new();
    let source = "let a = @\nlet b = 2";
    let mut lexer = Lexer::new(&arena, source);
    let mut kinds = Vec::new();
    loop {
        let t = lexer.next();
        kinds.push(t.kind);
        if t.kind == TokenKind::Eof {
            break;
        }
    }
    assert!(kinds.contains(&TokenKind::Error));
    // The second statement still lexes.
    let idents = kinds.iter().filter(|k| **k == TokenKind::Ident).count();
    assert_eq!(idents, 2);
    assert_eq!(lexer.errors().len(), 1);
}

/// Tabs count as four columns for layout purposes.
#[test]
fn tabs_count_as_four_columns() {
    let arena = Arena::new();
    // First block indented with a tab, continuation with four spaces:
    // both are width 4, so no dedent/indent between them.
    let source = "if x:\n\ta\n    b\n";
    let tokens = Lexer::tokenize(&arena, source);
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::If,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Eof,
        ]
    );
}
