//! Code generator tests: assert on the emitted QBE IR text.

use fern_common::Arena;
use fern_parser::Parser;
use fern_typeck::Checker;

use fern_codegen::Codegen;

/// Parse, check, and emit a whole program.
fn generate_program(source: &str) -> String {
    let arena = Arena::new();
    let mut parser = Parser::new(&arena, source);
    let stmts = parser.parse_stmts();
    assert!(!parser.had_error(), "parse errors: {:?}", parser.errors());

    let mut checker = Checker::new();
    assert!(
        checker.check_stmts(stmts),
        "type errors: {:?}",
        checker.errors()
    );

    let mut cg = Codegen::new(checker.types());
    cg.program(stmts);
    cg.output()
}

/// Emit a single expression (the checker runs but errors are not
/// required to be absent, matching direct expression emission).
fn generate_expr(source: &str) -> String {
    let arena = Arena::new();
    let mut parser = Parser::new(&arena, source);
    let expr = parser.parse_expr().expect("expression parses");

    let mut checker = Checker::new();
    let _ = checker.infer_expr(expr);

    let mut cg = Codegen::new(checker.types());
    cg.expr(expr);
    cg.output()
}

// ── Literals ────────────────────────────────────────────────────────────

#[test]
fn int_literal() {
    let qbe = generate_expr("42");
    assert!(qbe.contains("copy 42"), "got:\n{qbe}");
}

#[test]
fn negative_int_is_sub_from_zero() {
    let qbe = generate_expr("-5");
    assert!(qbe.contains("copy 5"), "got:\n{qbe}");
    assert!(qbe.contains("sub 0"), "got:\n{qbe}");
}

#[test]
fn bool_literals() {
    assert!(generate_expr("true").contains("copy 1"));
    assert!(generate_expr("false").contains("copy 0"));
}

#[test]
fn float_literal_is_double() {
    let qbe = generate_expr("3.14");
    assert!(qbe.contains("=d copy d_3.14"), "got:\n{qbe}");
}

#[test]
fn string_literal_goes_to_data_section() {
    let qbe = generate_expr("\"hello\"");
    assert!(qbe.contains("data $str.0"), "got:\n{qbe}");
    assert!(qbe.contains("hello"), "got:\n{qbe}");
    assert!(qbe.contains("b 0"), "NUL terminator expected:\n{qbe}");
}

#[test]
fn string_escapes_emit_byte_values() {
    let qbe = generate_expr("\"a\\nb\"");
    assert!(qbe.contains("b 10"), "newline byte expected:\n{qbe}");
}

// ── Operators ───────────────────────────────────────────────────────────

#[test]
fn add_emits_operands_and_instruction() {
    let qbe = generate_expr("1 + 2");
    assert!(qbe.contains("copy 1"));
    assert!(qbe.contains("copy 2"));
    assert!(qbe.contains("add"));
}

#[test]
fn sub_mul_div_rem() {
    assert!(generate_expr("10 - 3").contains("sub"));
    assert!(generate_expr("4 * 5").contains("mul"));
    assert!(generate_expr("20 / 4").contains("div"));
    assert!(generate_expr("7 % 2").contains("rem"));
}

#[test]
fn grouped_arithmetic_keeps_operands() {
    // (1 + 2) * 3: the add happens first, feeding the mul.
    let qbe = generate_expr("(1 + 2) * 3");
    assert!(qbe.contains("copy 1"));
    assert!(qbe.contains("copy 2"));
    assert!(qbe.contains("copy 3"));
    let add_at = qbe.find("add").expect("add emitted");
    let mul_at = qbe.find("mul").expect("mul emitted");
    assert!(add_at < mul_at, "add must precede mul:\n{qbe}");
}

#[test]
fn comparisons_use_word_compare_instructions() {
    assert!(generate_expr("1 == 2").contains("ceqw"));
    assert!(generate_expr("1 != 2").contains("cnew"));
    assert!(generate_expr("1 < 2").contains("csltw"));
    assert!(generate_expr("1 <= 2").contains("cslew"));
    assert!(generate_expr("1 > 2").contains("csgtw"));
    assert!(generate_expr("1 >= 2").contains("csgew"));
}

#[test]
fn float_comparison_uses_double_compare() {
    let qbe = generate_expr("1.0 < 2.0");
    assert!(qbe.contains("cltd"), "got:\n{qbe}");
}

#[test]
fn pow_calls_runtime_helper() {
    let qbe = generate_expr("2.0 ** 3.0");
    assert!(qbe.contains("call $fern_pow"), "got:\n{qbe}");
    assert!(qbe.contains("=d"), "pow yields a double:\n{qbe}");
}

#[test]
fn logical_and_short_circuits_with_phi() {
    let qbe = generate_expr("true and false");
    assert!(qbe.contains("jnz"), "got:\n{qbe}");
    assert!(qbe.contains("phi"), "got:\n{qbe}");
}

#[test]
fn not_is_xor_one() {
    let qbe = generate_expr("not true");
    assert!(qbe.contains("xor"), "got:\n{qbe}");
}

// ── Functions ───────────────────────────────────────────────────────────

#[test]
fn simple_function() {
    let qbe = generate_program("fn answer() -> Int: 42");
    assert!(qbe.contains("function"), "got:\n{qbe}");
    assert!(qbe.contains("$answer"), "got:\n{qbe}");
    assert!(qbe.contains("ret"), "got:\n{qbe}");
}

#[test]
fn identity_function_signature_and_return() {
    // Inferred scheme forall a. (a) -> a; parameters and returns use
    // the 64-bit ABI type.
    let qbe = generate_program("fn id(x): x");
    assert!(
        qbe.contains("function l $id(l %x.0)"),
        "got:\n{qbe}"
    );
    assert!(qbe.contains("\tret %x.0\n"), "got:\n{qbe}");
}

#[test]
fn function_with_params_uses_scoped_locals() {
    let qbe = generate_program("fn add(a: Int, b: Int) -> Int: a + b");
    assert!(qbe.contains("$add"));
    assert!(qbe.contains("%a"));
    assert!(qbe.contains("%b"));
    assert!(qbe.contains("add"));
}

#[test]
fn function_call_by_name() {
    let qbe = generate_expr("add(1, 2)");
    assert!(qbe.contains("call $add"), "got:\n{qbe}");
}

#[test]
fn call_arguments_widen_to_longs() {
    let qbe = generate_program("fn id(x): x\nlet a = id(1)");
    assert!(qbe.contains("extsw"), "w arg must widen to l:\n{qbe}");
    assert!(qbe.contains("call $id"), "got:\n{qbe}");
}

#[test]
fn every_function_is_emitted_exactly_once() {
    let qbe = generate_program("fn first(): 1\nfn second(): 2\nfn third(): first() + second()");
    for name in ["$first", "$second", "$third"] {
        let definitions = qbe
            .lines()
            .filter(|l| l.starts_with("export function") && l.contains(name))
            .count();
        assert_eq!(definitions, 1, "{name} defined once:\n{qbe}");
    }
}

#[test]
fn lambda_is_lifted_to_a_function() {
    let qbe = generate_expr("(x) -> x + 1");
    assert!(qbe.contains("function"), "got:\n{qbe}");
    assert!(qbe.contains("$lambda.0"), "got:\n{qbe}");
    assert!(qbe.contains("add"), "got:\n{qbe}");
}

#[test]
fn user_main_keeps_its_name_and_exits_zero() {
    let qbe = generate_program("fn main(): println(1)");
    assert!(qbe.contains("export function w $main()"), "got:\n{qbe}");
    assert!(qbe.contains("\tret 0\n"), "got:\n{qbe}");
    assert!(qbe.contains("call $fern_println_int"), "got:\n{qbe}");
}

// ── Statements ──────────────────────────────────────────────────────────

#[test]
fn top_level_let_lands_in_synthesized_main() {
    let qbe = generate_program("let x = 42");
    assert!(qbe.contains("$main"), "got:\n{qbe}");
    assert!(qbe.contains("%x"), "got:\n{qbe}");
    assert!(qbe.contains("copy"), "got:\n{qbe}");
}

#[test]
fn empty_program_is_preamble_only() {
    let qbe = generate_program("");
    assert_eq!(qbe, "# fern compiler output\n");
}

// ── Control flow ────────────────────────────────────────────────────────

#[test]
fn if_expression_branches_and_joins() {
    let qbe = generate_expr("if true: 1 else: 0");
    assert!(qbe.contains("jnz"), "got:\n{qbe}");
    assert!(qbe.contains("@L"), "got:\n{qbe}");
    assert!(qbe.contains("phi"), "got:\n{qbe}");
}

#[test]
fn match_on_ints_is_a_compare_cascade() {
    let qbe =
        generate_program("fn test(x: Int) -> Int: match x: 1 -> 10, 2 -> 20, _ -> 0");
    assert!(qbe.contains("$test"));
    let compares = qbe.matches("ceqw").count();
    let branches = qbe.matches("jnz").count();
    assert!(compares >= 2, "at least two compares:\n{qbe}");
    assert!(branches >= 2, "at least two branches:\n{qbe}");
    assert!(qbe.contains("phi"), "join block selects the result:\n{qbe}");
}

#[test]
fn match_wildcard_arm() {
    let qbe = generate_program("fn always_zero(x: Int) -> Int: match x: _ -> 0");
    assert!(qbe.contains("copy 0"), "got:\n{qbe}");
}

#[test]
fn non_matching_fallthrough_panics() {
    let qbe = generate_program("fn f(x: Int) -> Int: match x: 1 -> 10, 2 -> 20, _ -> 0");
    assert!(qbe.contains("call $fern_panic"), "got:\n{qbe}");
}

#[test]
fn option_match_tests_the_tag_word() {
    let source = "fn unwrap_or_zero(o):\n    match o:\n        Some x -> x\n        None -> 0\n";
    let qbe = generate_program(source);
    // Tag compare on the low word, payload extracted by arithmetic
    // shift right 32.
    assert!(qbe.contains("ceqw"), "got:\n{qbe}");
    assert!(qbe.contains("sar"), "got:\n{qbe}");
}

// ── Aggregates ──────────────────────────────────────────────────────────

#[test]
fn tuple_allocates_and_stores_fields() {
    let qbe = generate_expr("(1, 2, 3)");
    assert!(qbe.contains("copy 1"));
    assert!(qbe.contains("copy 2"));
    assert!(qbe.contains("copy 3"));
    assert!(qbe.contains("call $fern_alloc"), "got:\n{qbe}");
    assert!(qbe.contains("storel"), "got:\n{qbe}");
}

#[test]
fn list_builds_through_runtime_pushes() {
    let qbe = generate_expr("[1, 2, 3]");
    assert!(qbe.contains("call $fern_list_with_capacity"), "got:\n{qbe}");
    assert_eq!(qbe.matches("call $fern_list_push").count(), 3, "got:\n{qbe}");
}

#[test]
fn constructors_call_runtime_packers() {
    assert!(generate_expr("Some(1)").contains("call $fern_option_some"));
    assert!(generate_expr("None").contains("call $fern_option_none"));
    assert!(generate_expr("Ok(1)").contains("call $fern_result_ok"));
    assert!(generate_expr("Err(2)").contains("call $fern_result_err"));
}

// ── Builtins ────────────────────────────────────────────────────────────

#[test]
fn println_dispatches_on_argument_type() {
    let int_qbe = generate_program("fn main(): println(1)");
    assert!(int_qbe.contains("$fern_println_int"), "got:\n{int_qbe}");

    let str_qbe = generate_program("fn main(): println(\"hi\")");
    assert!(str_qbe.contains("$fern_println_str"), "got:\n{str_qbe}");

    let bool_qbe = generate_program("fn main(): println(true)");
    assert!(bool_qbe.contains("$fern_println_bool"), "got:\n{bool_qbe}");
}

#[test]
fn string_helpers_lower_to_runtime_calls() {
    let qbe = generate_program("fn main(): println(str_len(str_concat(\"a\", \"b\")))");
    assert!(qbe.contains("call $fern_str_concat"), "got:\n{qbe}");
    assert!(qbe.contains("call $fern_str_len"), "got:\n{qbe}");
}

#[test]
fn index_sugar_calls_list_get() {
    let qbe = generate_program("fn main(): println([10, 20][1])");
    assert!(qbe.contains("call $fern_list_get"), "got:\n{qbe}");
}

// ── Output layout ───────────────────────────────────────────────────────

#[test]
fn data_section_precedes_functions() {
    let qbe = generate_program("fn greet() -> String: \"hello\"");
    let data_at = qbe.find("data $str.0").expect("data emitted");
    let fn_at = qbe.find("export function").expect("function emitted");
    assert!(data_at < fn_at, "data section first:\n{qbe}");
}

#[test]
fn output_is_deterministic() {
    let source = "fn f(x: Int) -> Int: match x: 1 -> 10, _ -> 0\nfn main(): println(f(1))";
    assert_eq!(generate_program(source), generate_program(source));
}
