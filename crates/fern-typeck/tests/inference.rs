//! Inference integration tests: parse then check real programs.

use fern_common::Arena;
use fern_parser::Parser;
use fern_typeck::{Checker, Ty};

/// Parse and check a program, returning the checker for inspection.
fn check(source: &str) -> Checker {
    let arena = Arena::new();
    let mut parser = Parser::new(&arena, source);
    let stmts = parser.parse_stmts();
    assert!(
        !parser.had_error(),
        "parse errors in test input: {:?}",
        parser.errors()
    );
    let mut checker = Checker::new();
    checker.check_stmts(stmts);
    checker
}

fn infer_one(source: &str) -> Ty {
    let arena = Arena::new();
    let mut parser = Parser::new(&arena, source);
    let expr = parser.parse_expr().expect("expression parses");
    let mut checker = Checker::new();
    checker.infer_expr(expr)
}

#[test]
fn identity_function_generalizes() {
    let checker = check("fn id(x): x");
    assert!(!checker.has_errors());

    let scheme = checker.scheme_of("id").expect("id is bound");
    assert_eq!(scheme.vars.len(), 1, "forall a. (a) -> a");
    match &scheme.ty {
        Ty::Fun(params, ret) => {
            assert_eq!(params.len(), 1);
            assert_eq!(params[0], **ret, "parameter and result are the same var");
        }
        other => panic!("expected a function scheme, got {other}"),
    }
}

#[test]
fn let_polymorphism() {
    let checker = check("let id = (x) -> x\nlet a = id(1)\nlet b = id(\"x\")");
    assert!(
        !checker.has_errors(),
        "polymorphic id must accept Int and String: {:?}",
        checker.errors()
    );

    let id = checker.scheme_of("id").expect("id bound");
    assert_eq!(id.vars.len(), 1);
    assert_eq!(checker.scheme_of("a").unwrap().ty, Ty::int());
    assert_eq!(checker.scheme_of("b").unwrap().ty, Ty::string());
}

#[test]
fn occurs_check_reports_recursive_type() {
    let checker = check("fn f(x): f");
    assert!(checker.has_errors());
    let first = checker.first_error().unwrap();
    assert!(
        first.contains("recursive type"),
        "expected a recursive-type error, got: {first}"
    );
}

#[test]
fn arithmetic_function_is_int() {
    let checker = check("fn f(): (1 + 2) * 3");
    assert!(!checker.has_errors());
    let scheme = checker.scheme_of("f").unwrap();
    assert_eq!(scheme.ty, Ty::fun(vec![], Ty::int()));
}

#[test]
fn if_branches_must_match() {
    let checker = check("let x = if true: 1 else: \"x\"");
    assert!(checker.has_errors());
    assert_eq!(checker.errors().len(), 1, "exactly one mismatch reported");
    let first = checker.first_error().unwrap();
    assert!(first.contains("Int"));
    assert!(first.contains("String"));
}

#[test]
fn if_without_else_is_unit() {
    let checker = check("fn f(b: Bool): if b: println(1)");
    assert!(!checker.has_errors(), "errors: {:?}", checker.errors());
    let scheme = checker.scheme_of("f").unwrap();
    match &scheme.ty {
        Ty::Fun(_, ret) => assert!(ret.is_unit()),
        other => panic!("expected function, got {other}"),
    }
}

#[test]
fn if_without_else_rejects_valued_then() {
    let checker = check("fn f(b: Bool): if b: 1");
    assert!(checker.has_errors(), "then branch must be Unit");
}

#[test]
fn annotations_constrain_inference() {
    let checker = check("fn add(a: Int, b: Int) -> Int: a + b");
    assert!(!checker.has_errors());
    let scheme = checker.scheme_of("add").unwrap();
    assert_eq!(
        scheme.ty,
        Ty::fun(vec![Ty::int(), Ty::int()], Ty::int())
    );

    let checker = check("fn bad() -> Int: \"s\"");
    assert!(checker.has_errors());
}

#[test]
fn no_implicit_numeric_coercion() {
    let checker = check("let x = 1 + 2.5");
    assert!(checker.has_errors(), "Int + Float must not unify");
}

#[test]
fn pow_always_yields_float() {
    assert_eq!(infer_one("2.0 ** 3.0"), Ty::float());
}

#[test]
fn comparisons_yield_bool() {
    assert_eq!(infer_one("1 < 2"), Ty::bool());
    assert_eq!(infer_one("\"a\" == \"b\""), Ty::bool());
}

#[test]
fn string_arithmetic_is_an_error() {
    let checker = check("let x = \"a\" + \"b\"");
    assert!(checker.has_errors(), "strings concatenate via str_concat");
}

#[test]
fn unbound_identifier() {
    let checker = check("let x = nope");
    assert!(checker.has_errors());
    assert!(checker.first_error().unwrap().contains("unbound"));
}

#[test]
fn calling_a_non_function() {
    let checker = check("let x = 1\nlet y = x(2)");
    assert!(checker.has_errors());
    assert!(checker.first_error().unwrap().contains("not a function"));
}

#[test]
fn recursion_with_annotation() {
    let source = "fn fact(n: Int) -> Int: if n < 2: 1 else: n * fact(n - 1)";
    let checker = check(source);
    assert!(!checker.has_errors(), "errors: {:?}", checker.errors());
    assert_eq!(
        checker.scheme_of("fact").unwrap().ty,
        Ty::fun(vec![Ty::int()], Ty::int())
    );
}

#[test]
fn match_arms_must_agree() {
    let checker = check("fn f(x: Int): match x: 1 -> 10, _ -> \"s\"");
    assert!(checker.has_errors());
}

#[test]
fn match_binds_pattern_variables() {
    let source = "fn unwrap_or(o, d):\n    match o:\n        Some x -> x\n        None -> d\n";
    let checker = check(source);
    assert!(!checker.has_errors(), "errors: {:?}", checker.errors());
    let scheme = checker.scheme_of("unwrap_or").unwrap();
    // forall a. (Option<a>, a) -> a
    assert_eq!(scheme.vars.len(), 1);
    match &scheme.ty {
        Ty::Fun(params, ret) => {
            assert_eq!(params.len(), 2);
            assert_eq!(params[0], Ty::option((**ret).clone()));
            assert_eq!(params[1], **ret);
        }
        other => panic!("expected function, got {other}"),
    }
}

#[test]
fn ctor_expressions() {
    assert_eq!(infer_one("Some(1)"), Ty::option(Ty::int()));
    match infer_one("Ok(2)") {
        Ty::App(con, args) => {
            assert!(con.is_con("Result"));
            assert_eq!(args[0], Ty::int());
        }
        other => panic!("expected Result, got {other}"),
    }
}

#[test]
fn ctor_pattern_arity_is_checked() {
    let checker = check("fn f(o): match o: Some -> 1, None -> 0");
    assert!(checker.has_errors());
    assert!(checker.first_error().unwrap().contains("arity"));
}

#[test]
fn tuple_destructuring_let() {
    let checker = check("let (a, b) = (1, \"s\")\nlet c = a + 1\nlet d = str_len(b)");
    assert!(!checker.has_errors(), "errors: {:?}", checker.errors());
    assert_eq!(checker.scheme_of("a").unwrap().ty, Ty::int());
    assert_eq!(checker.scheme_of("b").unwrap().ty, Ty::string());
}

#[test]
fn list_literals_unify_elements() {
    assert_eq!(infer_one("[1, 2, 3]"), Ty::list(Ty::int()));
    let checker = check("let xs = [1, \"a\"]");
    assert!(checker.has_errors(), "heterogeneous list must fail");
}

#[test]
fn non_exhaustive_match_is_a_warning_not_an_error() {
    let checker = check("fn f(x): match Some(x): Some y -> y");
    assert!(!checker.has_errors(), "errors: {:?}", checker.errors());
    assert!(
        !checker.warnings().is_empty(),
        "missing None arm should warn"
    );

    let covered = check("fn f(x):\n    match Some(x):\n        Some y -> y\n        None -> x\n");
    assert!(!covered.has_errors());
    assert!(covered.warnings().is_empty(), "full coverage must not warn");
}

#[test]
fn checking_twice_is_idempotent() {
    let source = "fn id(x): x\nlet a = id(1)\nlet bad = a + \"s\"";

    let checker1 = check(source);
    let checker2 = check(source);
    assert_eq!(checker1.errors().len(), checker2.errors().len());
    assert_eq!(
        checker1.first_error(),
        checker2.first_error(),
        "re-checking yields the same error list"
    );
    assert_eq!(
        format!("{}", checker1.scheme_of("id").unwrap()),
        format!("{}", checker2.scheme_of("id").unwrap())
    );
}

#[test]
fn nested_let_does_not_overgeneralize() {
    // The parameter variable of the enclosing lambda must stay
    // monomorphic inside the body, even through a nested let.
    let source = "fn apply_twice(f, x): f(f(x))";
    let checker = check(source);
    assert!(!checker.has_errors());
    let scheme = checker.scheme_of("apply_twice").unwrap();
    // forall a. ((a) -> a, a) -> a
    assert_eq!(scheme.vars.len(), 1);
}

#[test]
fn clear_errors_resets_state() {
    let mut checker = check("let x = nope");
    assert!(checker.has_errors());
    checker.clear_errors();
    assert!(!checker.has_errors());
    assert!(checker.first_error().is_none());
}
