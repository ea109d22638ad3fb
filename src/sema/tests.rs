//! Semantic analysis tests.
//!
//! Every test parses a complete source file and runs both analysis
//! passes over it, asserting on the resulting diagnostics or the
//! analyzed program. Unit tests for the constant folder and the
//! exhaustiveness checker live next to their implementations.

use super::*;

use crate::ast::{Declaration, Statement};
use crate::parser::Parser;

// ============================================================
// Helpers
// ============================================================

fn analyze(source: &str) -> Result<AnalyzedProgram, Vec<Diagnostic>> {
    let mut parser = Parser::new(source);
    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(errors) => panic!("source must parse:\n{source}\nerrors: {errors:#?}"),
    };
    analyze_program(&program, parser.take_interner())
}

/// Analyze a program that must be clean.
fn analyze_ok(source: &str) -> AnalyzedProgram {
    match analyze(source) {
        Ok(analyzed) => analyzed,
        Err(errors) => panic!("expected analysis to succeed:\n{source}\nerrors: {errors:#?}"),
    }
}

/// Analyze a program that must be rejected, returning its diagnostics.
fn analyze_err(source: &str) -> Vec<Diagnostic> {
    match analyze(source) {
        Ok(_) => panic!("expected analysis errors for:\n{source}"),
        Err(errors) => errors,
    }
}

/// Wrap a statement list in a minimal `main` so body-level tests stay
/// short. The body runs before the closing `return ();`.
fn in_main(body: &str) -> String {
    format!("package t;\n\npub fn main(none) -> void {{\n{body}\n    return ();\n}}\n")
}

fn body_ok(body: &str) -> AnalyzedProgram {
    analyze_ok(&in_main(body))
}

fn body_err(body: &str) -> Vec<Diagnostic> {
    analyze_err(&in_main(body))
}

fn assert_error_contains(errors: &[Diagnostic], needle: &str) {
    assert!(
        errors.iter().any(|e| e.message.contains(needle)),
        "no error containing {needle:?} in {errors:#?}"
    );
}

fn assert_error_code(errors: &[Diagnostic], code: &str) {
    assert!(
        errors.iter().any(|e| e.code.as_deref() == Some(code)),
        "no error with code {code} in {errors:#?}"
    );
}

fn assert_suggestion_contains(errors: &[Diagnostic], needle: &str) {
    assert!(
        errors
            .iter()
            .any(|e| e.suggestions.iter().any(|s| s.contains(needle))),
        "no suggestion containing {needle:?} in {errors:#?}"
    );
}

// ============================================================
// Pipeline basics
// ============================================================

#[test]
fn minimal_program_analyzes() {
    let analyzed = analyze_ok("package t;\n\npub fn main(none) -> void {\n    return ();\n}\n");
    assert!(analyzed.symbols.lookup("main").is_some());
    assert!(analyzed.warnings.is_empty());
}

#[test]
fn declarations_resolve_out_of_order() {
    // `main` comes first and uses a function and a struct declared
    // after it; registration makes both visible before body checking.
    let source = r#"
package t;

pub fn main(none) -> void {
    let p: Point = make(none);
    log(p.label);
    return ();
}

fn make(none) -> Point {
    return Point { label: "origin" };
}

struct Point {
    label: string,
}
"#;
    analyze_ok(source);
}

#[test]
fn expression_types_are_recorded() {
    let source = "package t;\n\npub fn main(none) -> void {\n    let flag: bool = 1 < 2;\n    return ();\n}\n";
    let mut parser = Parser::new(source);
    let program = parser.parse_program().expect("source must parse");

    let Declaration::Function(f) = &program.declarations[0] else {
        panic!("expected a function declaration");
    };
    let Statement::Let { value, .. } = &f.body.statements[0] else {
        panic!("expected a let statement");
    };
    let value_span = value.span;

    let analyzed = analyze_program(&program, parser.take_interner()).expect("analysis succeeds");
    assert_eq!(analyzed.expr_types.get(&value_span), Some(&Type::bool()));
}

#[test]
fn registration_failure_suppresses_body_checks() {
    // The duplicate definition fails phase one; the type error in
    // `main` would only surface in phase two and must not appear.
    let source = r#"
package t;

fn dup(none) -> void {
    return ();
}

fn dup(none) -> void {
    return ();
}

pub fn main(none) -> void {
    let x: i32 = "not an int";
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_code(&errors, "E0203");
    assert_error_contains(&errors, "duplicate definition of `dup`");
}

// ============================================================
// Let bindings and mutability
// ============================================================

#[test]
fn let_initializer_must_match_declared_type() {
    let errors = body_err("    let x: i32 = true;");
    assert_error_code(&errors, "E0200");
    assert_error_contains(&errors, "expected `i32`, found `bool`");
}

#[test]
fn numeric_literals_adopt_the_declared_type() {
    body_ok("    let a: i64 = 5;\n    let b: u8 = 200;\n    let c: f64 = 1.5;\n    let d: f32 = 2.5;");
}

#[test]
fn literal_arithmetic_adopts_the_declared_type() {
    body_ok("    let x: i64 = 1 + 2;\n    let y: i64 = x + 1;\n    let z: i64 = 1 + x;");
}

#[test]
fn mixed_width_arithmetic_is_rejected() {
    let errors = body_err("    let a: i64 = 2;\n    let b: i32 = 3;\n    let c: i64 = a + b;");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_code(&errors, "E0209");
    assert_error_contains(&errors, "binary `+` cannot be applied to `i64` and `i32`");
}

#[test]
fn casts_bridge_numeric_widths() {
    body_ok("    let a: i32 = 7;\n    let b: i64 = a as i64;\n    let c: i64 = b + 1;");
}

#[test]
fn assigning_an_immutable_binding_suggests_let_mut() {
    let errors = body_err("    let x: i32 = 1;\n    x = 2;");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_code(&errors, "E0208");
    assert_error_contains(&errors, "cannot assign to `x`");
    assert_suggestion_contains(&errors, "let mut x");
}

#[test]
fn mutable_bindings_can_be_reassigned() {
    body_ok("    let mut x: i32 = 1;\n    x = 2;\n    x = x + 40;");
}

#[test]
fn assigned_value_must_match_the_target() {
    let errors = body_err("    let mut x: i32 = 1;\n    x = \"two\";");
    assert_error_contains(&errors, "expected `i32`, found `string`");
}

#[test]
fn duplicate_binding_in_one_scope_is_rejected() {
    let errors = body_err("    let x: i32 = 1;\n    let x: i32 = 2;");
    assert_error_code(&errors, "E0203");
    assert_error_contains(&errors, "duplicate definition of `x`");
}

#[test]
fn inner_scopes_may_shadow_outer_bindings() {
    body_ok(
        "    let x: i32 = 1;\n    if x > 0 {\n        let x: bool = true;\n        log(\"inner\");\n    }",
    );
}

#[test]
fn initializer_is_checked_before_the_binding_exists() {
    // `let x = x` cannot refer to itself.
    let errors = body_err("    let x: i32 = x + 1;");
    assert_error_code(&errors, "E0201");
    assert_error_contains(&errors, "cannot find `x`");
}

// ============================================================
// Assignment targets
// ============================================================

#[test]
fn field_and_index_assignment_require_a_mutable_base() {
    let source = r#"
package t;

struct Point {
    x: i32,
    y: i32,
}

pub fn main(none) -> void {
    let p: Point = Point { x: 1, y: 2 };
    p.x = 3;
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0208");
    assert_error_contains(&errors, "cannot assign to `p`");

    let errors = body_err("    let a: [2]i32 = [1, 2];\n    a[0] = 9;");
    assert_error_contains(&errors, "cannot assign to `a`");
}

#[test]
fn field_and_index_assignment_through_a_mutable_base() {
    let source = r#"
package t;

struct Point {
    x: i32,
    y: i32,
}

pub fn main(none) -> void {
    let mut p: Point = Point { x: 1, y: 2 };
    p.x = 3;
    let mut a: [2]i32 = [1, 2];
    a[0] = 9;
    a[1] = p.x;
    return ();
}
"#;
    analyze_ok(source);
}

#[test]
fn constants_are_not_assignable() {
    let source = r#"
package t;

const LIMIT: i32 = 20;

pub fn main(none) -> void {
    LIMIT = 21;
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0208");
    assert_error_contains(&errors, "cannot assign to constant `LIMIT`");
}

#[test]
fn functions_are_not_assignable() {
    let errors = body_err("    main = 1;");
    assert_error_code(&errors, "E0223");
    assert_error_contains(&errors, "invalid assignment target");
}

#[test]
fn len_is_read_only() {
    let errors = body_err("    let mut a: [2]i32 = [1, 2];\n    a.len = 4;");
    assert_error_code(&errors, "E0223");
    assert_error_contains(&errors, "invalid assignment target");
}

// ============================================================
// Returns
// ============================================================

#[test]
fn return_value_must_match_the_signature() {
    let source = r#"
package t;

fn answer(none) -> i32 {
    return "forty-two";
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0200");
    assert_error_contains(&errors, "mismatched return type: expected `i32`, found `string`");
}

#[test]
fn returned_literals_adopt_the_return_type() {
    let source = r#"
package t;

fn big(none) -> i64 {
    return 5;
}

fn sum(none) -> i64 {
    return 2 + 3;
}
"#;
    analyze_ok(source);
}

// ============================================================
// Conditions and loops
// ============================================================

#[test]
fn if_condition_must_be_bool() {
    let errors = body_err("    if 1 {\n        log(\"yes\");\n    }");
    assert_error_code(&errors, "E0200");
    assert_error_contains(&errors, "condition must be `bool`, found `i32`");
}

#[test]
fn match_guard_must_be_bool() {
    let errors = body_err(
        "    let x: i32 = 1;\n    match x {\n        n if n + 1 => {\n            log(\"odd\");\n        }\n        _ => {\n            log(\"other\");\n        }\n    }",
    );
    assert_error_contains(&errors, "condition must be `bool`, found `i32`");
}

#[test]
fn for_loop_types_the_element() {
    body_ok(
        "    for i in range(0, 10) {\n        let next: i32 = i + 1;\n        log(\"step\");\n    }",
    );
}

#[test]
fn for_over_a_non_iterable_value() {
    let errors = body_err("    for i in 42 {\n        log(\"no\");\n    }");
    assert_error_code(&errors, "E0200");
    assert_error_contains(&errors, "cannot iterate over a value of type `i32`");

    let errors = body_err("    for c in \"abc\" {\n        log(c);\n    }");
    assert_error_contains(&errors, "cannot iterate over a value of type `string`");
}

#[test]
fn loop_variable_is_immutable() {
    let errors = body_err("    for i in range(0, 3) {\n        i = 5;\n    }");
    assert_error_code(&errors, "E0208");
    assert_error_contains(&errors, "cannot assign to `i`");
}

#[test]
fn break_and_continue_require_a_loop() {
    let errors = body_err("    break;");
    assert_error_code(&errors, "E0224");
    assert_error_contains(&errors, "`break` outside a loop");

    let errors = body_err("    continue;");
    assert_error_contains(&errors, "`continue` outside a loop");
}

#[test]
fn break_is_visible_through_match_arms() {
    body_ok(
        "    for i in range(0, 10) {\n        match i {\n            0 => {\n                break;\n            }\n            _ => {\n                continue;\n            }\n        }\n    }",
    );
}

// ============================================================
// Operators
// ============================================================

#[test]
fn comparisons_yield_bool() {
    body_ok(
        "    let a: bool = 1 < 2;\n    let b: bool = 'a' < 'b';\n    let c: bool = \"x\" == \"y\";\n    let d: bool = 1.5 >= 0.5;\n    let e: bool = true == false;",
    );
}

#[test]
fn string_ordering_is_rejected() {
    let errors = body_err("    let x: bool = \"a\" < \"b\";");
    assert_error_code(&errors, "E0209");
    assert_error_contains(&errors, "binary `<` cannot be applied to `string` and `string`");
}

#[test]
fn mixed_type_equality_is_rejected() {
    let errors = body_err("    let x: bool = 1 == \"one\";");
    assert_error_contains(&errors, "binary `==` cannot be applied to `i32` and `string`");
}

#[test]
fn logical_operators_require_bool_operands() {
    body_ok("    let x: bool = true || false && true;");

    let errors = body_err("    let x: bool = true && 1;");
    assert_error_code(&errors, "E0209");
    assert_error_contains(&errors, "binary `&&` cannot be applied to `bool` and `i32`");
}

#[test]
fn remainder_is_integer_only() {
    body_ok("    let x: i32 = 5 % 2;");

    let errors = body_err("    let x: f32 = 5.0 % 2.0;");
    assert_error_contains(&errors, "binary `%` cannot be applied to `f32` and `f32`");
}

#[test]
fn bitwise_operators_require_integers() {
    body_ok("    let x: i32 = 6 & 3;\n    let y: i32 = 1 << 4;\n    let z: u8 = 255 ^ 15;");

    let errors = body_err("    let x: f32 = 1.5 & 2.5;");
    assert_error_contains(&errors, "binary `&` cannot be applied to `f32` and `f32`");
}

#[test]
fn unary_operators_check_their_operand() {
    body_ok("    let a: i32 = -5;\n    let b: f64 = -2.5;\n    let c: bool = !true;");

    let errors = body_err("    let x: bool = !1;");
    assert_error_code(&errors, "E0210");
    assert_error_contains(&errors, "unary `!` cannot be applied to `i32`");

    let errors = body_err("    let x: string = -\"s\";");
    assert_error_contains(&errors, "unary `-` cannot be applied to `string`");
}

// ============================================================
// Calls and builtins
// ============================================================

#[test]
fn call_arity_is_checked() {
    let source = r#"
package t;

fn add(a: i32, b: i32) -> i32 {
    return a + b;
}

pub fn main(none) -> void {
    let x: i32 = add(1);
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_code(&errors, "E0211");
    assert_error_contains(&errors, "wrong number of arguments: expected 2, found 1");
}

#[test]
fn call_argument_types_are_checked() {
    let source = r#"
package t;

fn add(a: i32, b: i32) -> i32 {
    return a + b;
}

pub fn main(none) -> void {
    let x: i32 = add(1, "two");
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_contains(&errors, "expected `i32`, found `string`");
}

#[test]
fn calling_a_non_function_value() {
    let errors = body_err("    let x: i32 = 7;\n    let y: i32 = x(none);");
    assert_error_code(&errors, "E0217");
    assert_error_contains(&errors, "value of type `i32` is not callable");
}

#[test]
fn calling_an_undefined_name() {
    let errors = body_err("    undefined_fn(none);");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_code(&errors, "E0201");
    assert_error_contains(&errors, "cannot find `undefined_fn`");
}

#[test]
fn builtins_are_predeclared() {
    body_ok(
        "    log(\"hello\");\n    panic(\"boom\");\n    let steps: []i32 = range(0, 10);\n    let argv: []string = args(none);\n    let n: i32 = len(steps);\n    let first: string = argv[0];\n    for tick in infinite(none) {\n        break;\n    }",
    );
}

#[test]
fn len_accepts_arrays_slices_and_strings() {
    body_ok(
        "    let a: [3]i32 = [1, 2, 3];\n    let n1: i32 = len(a);\n    let s: []i32 = a[:];\n    let n2: i32 = len(s);\n    let n3: i32 = len(\"abc\");\n    let n4: i32 = a.len;\n    let n5: i32 = s.len;\n    let n6: i32 = \"xyz\".len;",
    );
}

#[test]
fn len_rejects_other_types() {
    let errors = body_err("    let n: i32 = len(42);");
    assert_error_code(&errors, "E0200");
    assert_error_contains(&errors, "`len` expects an array, slice, or string, found `i32`");
}

#[test]
fn len_arity_is_checked() {
    let errors = body_err("    let a: [2]i32 = [1, 2];\n    let n: i32 = len(a, a);");
    assert_error_code(&errors, "E0211");
    assert_error_contains(&errors, "wrong number of arguments: expected 1, found 2");
}

#[test]
fn builtin_argument_types_are_checked() {
    let errors = body_err("    log(42);");
    assert_error_contains(&errors, "expected `string`, found `i32`");
}

#[test]
fn user_functions_shadow_builtins() {
    let source = r#"
package t;

fn log(count: i32) -> i32 {
    return count * 2;
}

pub fn main(none) -> void {
    let x: i32 = log(21);
    return ();
}
"#;
    analyze_ok(source);
}

// ============================================================
// Methods and associated functions
// ============================================================

const POINT_IMPL: &str = r#"
package geo;

struct Point {
    x: i32,
    y: i32,
}

impl Point {
    pub fn origin(none) -> Point {
        return Point { x: 0, y: 0 };
    }

    pub fn norm_sq(self) -> i32 {
        return self.x * self.x + self.y * self.y;
    }

    pub fn shifted(self, dx: i32) -> Point {
        return Point { x: self.x + dx, y: self.y };
    }
}
"#;

fn with_point(body: &str) -> String {
    format!("{POINT_IMPL}\npub fn main(none) -> void {{\n{body}\n    return ();\n}}\n")
}

#[test]
fn methods_and_associated_functions_resolve() {
    analyze_ok(&with_point(
        "    let p: Point = Point::origin(none);\n    let n: i32 = p.norm_sq(none);\n    let q: Point = p.shifted(3);\n    let m: i32 = q.norm_sq(none);",
    ));
}

#[test]
fn associated_function_called_as_method() {
    let errors = analyze_err(&with_point(
        "    let p: Point = Point::origin(none);\n    let q: Point = p.origin(none);",
    ));
    assert_error_code(&errors, "E0201");
    assert_error_contains(&errors, "no method named `origin` on type `Point`");
    assert_suggestion_contains(&errors, "Point::origin(...)");
}

#[test]
fn method_called_as_associated_function() {
    let errors = analyze_err(&with_point("    let n: i32 = Point::norm_sq(none);"));
    assert_error_contains(&errors, "no method named `norm_sq` on type `Point`");
    assert_suggestion_contains(&errors, "value.norm_sq(...)");
}

#[test]
fn unknown_method_is_reported() {
    let errors = analyze_err(&with_point(
        "    let p: Point = Point::origin(none);\n    let n: i32 = p.missing(none);",
    ));
    assert_error_contains(&errors, "no method named `missing` on type `Point`");
}

#[test]
fn method_argument_types_are_checked() {
    let errors = analyze_err(&with_point(
        "    let p: Point = Point::origin(none);\n    let q: Point = p.shifted(\"far\");",
    ));
    assert_error_contains(&errors, "expected `i32`, found `string`");
}

#[test]
fn methods_on_non_struct_types_are_rejected() {
    let errors = body_err("    let s: string = \"abc\";\n    let n: i32 = s.trim(none);");
    assert_error_code(&errors, "E0201");
    assert_error_contains(&errors, "no method named `trim` on type `string`");
}

#[test]
fn associated_call_on_an_undefined_type() {
    let errors = body_err("    let x: i32 = Missing::make(none);");
    assert_error_code(&errors, "E0202");
    assert_error_contains(&errors, "cannot find type `Missing`");
}

#[test]
fn associated_call_on_a_non_struct() {
    let source = r#"
package t;

enum Status {
    Active,
}

pub fn main(none) -> void {
    let x: i32 = Status::make(none);
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_error_contains(&errors, "`Status` is not a struct");
}

#[test]
fn type_arguments_on_a_plain_struct_are_rejected() {
    let errors = analyze_err(&with_point("    let p: Point = Point<i32>::origin(none);"));
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_code(&errors, "E0204");
    assert_error_contains(&errors, "wrong number of type arguments for `Point`: expected 0, found 1");
}

#[test]
fn self_is_mutable_inside_methods() {
    let source = r#"
package t;

struct Counter {
    count: i32,
}

impl Counter {
    fn bump(self) -> i32 {
        self.count = self.count + 1;
        return self.count;
    }
}

pub fn main(none) -> void {
    let c: Counter = Counter { count: 0 };
    let n: i32 = c.bump(none);
    return ();
}
"#;
    analyze_ok(source);
}

// ============================================================
// Structs and fields
// ============================================================

const POINT_DECL: &str = r#"
package geo;

struct Point {
    x: i32,
    y: i32,
}
"#;

fn with_point_decl(body: &str) -> String {
    format!("{POINT_DECL}\npub fn main(none) -> void {{\n{body}\n    return ();\n}}\n")
}

#[test]
fn struct_literals_and_field_access() {
    analyze_ok(&with_point_decl(
        "    let p: Point = Point { x: 1, y: 2 };\n    let x: i32 = p.x;\n    let y: i32 = p.y;",
    ));
}

#[test]
fn missing_fields_are_reported() {
    let errors = analyze_err(&with_point_decl("    let p: Point = Point { x: 1 };"));
    assert_error_code(&errors, "E0213");
    assert_error_contains(&errors, "missing field `y` in initializer of `Point`");
}

#[test]
fn unknown_fields_are_reported() {
    let errors = analyze_err(&with_point_decl(
        "    let p: Point = Point { x: 1, y: 2, z: 3 };",
    ));
    assert_error_code(&errors, "E0212");
    assert_error_contains(&errors, "no field `z` on type `Point`");
}

#[test]
fn duplicate_field_initializers_are_reported() {
    let errors = analyze_err(&with_point_decl(
        "    let p: Point = Point { x: 1, x: 2, y: 3 };",
    ));
    assert_error_code(&errors, "E0214");
    assert_error_contains(&errors, "field `x` initialized more than once");
}

#[test]
fn field_initializer_types_are_checked() {
    let errors = analyze_err(&with_point_decl(
        "    let p: Point = Point { x: true, y: 2 };",
    ));
    assert_error_contains(&errors, "expected `i32`, found `bool`");
}

#[test]
fn unknown_field_reads_are_reported() {
    let errors = analyze_err(&with_point_decl(
        "    let p: Point = Point { x: 1, y: 2 };\n    let z: i32 = p.z;",
    ));
    assert_error_code(&errors, "E0212");
    assert_error_contains(&errors, "no field `z` on type `Point`");
}

#[test]
fn struct_literal_of_an_enum_is_rejected() {
    let source = r#"
package t;

enum Status {
    Active,
}

pub fn main(none) -> void {
    let s: Status = Status { none };
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_error_contains(&errors, "`Status` is not a struct");
}

#[test]
fn struct_literal_of_an_undefined_type() {
    let errors = body_err("    let g: i32 = Ghost { none };");
    assert_error_code(&errors, "E0202");
    assert_error_contains(&errors, "cannot find type `Ghost`");
}

#[test]
fn tuple_fields_are_indexed_by_position() {
    body_ok(
        "    let pair: (i32, bool) = (7, true);\n    let first: i32 = pair.0;\n    let second: bool = pair.1;",
    );

    let errors = body_err("    let pair: (i32, bool) = (7, true);\n    let third: i32 = pair.2;");
    assert_error_contains(&errors, "no field `2` on type `(i32, bool)`");
}

// ============================================================
// Generic structs
// ============================================================

const PAIR_DECL: &str = r#"
package t;

pub struct Pair<A, B> {
    pub first: A,
    pub second: B,
}
"#;

fn with_pair(body: &str) -> String {
    format!("{PAIR_DECL}\npub fn main(none) -> void {{\n{body}\n    return ();\n}}\n")
}

#[test]
fn generic_struct_literals_instantiate() {
    analyze_ok(&with_pair(
        "    let explicit: Pair<i32, bool> = Pair<i32, bool> { first: 1, second: true };\n    let inferred: Pair<string, i32> = Pair { first: \"a\", second: 2 };\n    let f: string = inferred.first;\n    let s: i32 = inferred.second;",
    ));
}

#[test]
fn generic_struct_type_arg_count_is_checked() {
    let errors = analyze_err(&with_pair(
        "    let p: Pair<i32, bool> = Pair<i32> { first: 1, second: true };",
    ));
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_code(&errors, "E0204");
    assert_error_contains(&errors, "wrong number of type arguments for `Pair`: expected 2, found 1");
}

#[test]
fn generic_struct_literal_needs_context_or_args() {
    let errors = analyze_err(&with_pair("    Pair { first: 1, second: true };"));
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_code(&errors, "E0204");
    assert_error_contains(&errors, "cannot infer type arguments for `Pair`");
    assert_suggestion_contains(&errors, "Pair<i32>");
}

#[test]
fn substituted_field_types_are_checked() {
    let errors = analyze_err(&with_pair(
        "    let p: Pair<i32, bool> = Pair { first: \"a\", second: 3 };",
    ));
    assert_eq!(errors.len(), 2, "{errors:#?}");
    assert_error_contains(&errors, "expected `i32`, found `string`");
    assert_error_contains(&errors, "expected `bool`, found `i32`");
}

// ============================================================
// Enum constructors
// ============================================================

const COLOR_DECL: &str = r#"
package paint;

pub enum Color {
    Red,
    Green,
    Blue,
}
"#;

fn with_color(body: &str) -> String {
    format!("{COLOR_DECL}\npub fn main(none) -> void {{\n{body}\n    return ();\n}}\n")
}

const SHAPE_DECL: &str = r#"
package t;

pub enum Shape {
    Dot,
    Circle(f64),
}
"#;

fn with_shape(body: &str) -> String {
    format!("{SHAPE_DECL}\npub fn main(none) -> void {{\n{body}\n    return ();\n}}\n")
}

#[test]
fn plain_enum_constructors() {
    analyze_ok(&with_color("    let c: Color = Color.Red;\n    let d: Color = Color.Blue;"));
}

#[test]
fn unknown_variants_are_reported() {
    let errors = analyze_err(&with_color("    let c: Color = Color.Purple;"));
    assert_error_code(&errors, "E0215");
    assert_error_contains(&errors, "no variant `Purple` on enum `Color`");
}

#[test]
fn variant_payload_is_required() {
    analyze_ok(&with_shape("    let s: Shape = Shape.Circle(2.5);\n    let d: Shape = Shape.Dot;"));

    let errors = analyze_err(&with_shape("    let s: Shape = Shape.Circle;"));
    assert_error_code(&errors, "E0216");
    assert_error_contains(&errors, "variant `Shape.Circle` requires a payload");

    let errors = analyze_err(&with_shape("    let s: Shape = Shape.Dot(1.0);"));
    assert_error_contains(&errors, "variant `Shape.Dot` does not take a payload");
}

#[test]
fn variant_payload_type_is_checked() {
    let errors = analyze_err(&with_shape("    let s: Shape = Shape.Circle(true);"));
    assert_error_contains(&errors, "expected `f64`, found `bool`");
}

#[test]
fn enum_constructor_on_a_struct_is_rejected() {
    let errors = analyze_err(&with_point_decl("    let p: Point = Point.Origin;"));
    assert_error_contains(&errors, "`Point` is not an enum");
}

#[test]
fn enum_constructor_on_an_undefined_type() {
    let errors = body_err("    let x: i32 = Missing.Thing;");
    assert_error_code(&errors, "E0202");
    assert_error_contains(&errors, "cannot find type `Missing`");
}

#[test]
fn type_args_on_a_plain_enum_are_rejected() {
    let errors = analyze_err(&with_color("    let c: Color = Color<i32>.Red;"));
    assert_error_code(&errors, "E0204");
    assert_error_contains(&errors, "wrong number of type arguments for `Color`: expected 0, found 1");
}

// ============================================================
// Generic enums
// ============================================================

const WRAP_DECL: &str = r#"
package t;

pub enum Wrap<T> {
    Of(T),
    Empty,
}
"#;

fn with_wrap(body: &str) -> String {
    format!("{WRAP_DECL}\npub fn main(none) -> void {{\n{body}\n    return ();\n}}\n")
}

#[test]
fn generic_enum_constructors_instantiate() {
    analyze_ok(&with_wrap(
        "    let a: Wrap<string> = Wrap.Of(\"text\");\n    let b: Wrap<i32> = Wrap.Empty;\n    let c: Wrap<bool> = Wrap<bool>.Empty;",
    ));
}

#[test]
fn payload_drives_type_argument_inference() {
    // No expected type; the argument fixes `T`.
    analyze_ok(&with_wrap("    Wrap.Of(\"text\");"));
}

#[test]
fn empty_variant_needs_context() {
    let errors = analyze_err(&with_wrap("    Wrap.Empty;"));
    assert_error_code(&errors, "E0204");
    assert_error_contains(&errors, "cannot infer type arguments for `Wrap`");
    assert_suggestion_contains(&errors, "Wrap<i32>");
}

#[test]
fn generic_enum_type_arg_count_is_checked() {
    let errors = analyze_err(&with_wrap("    let w: Wrap<i32> = Wrap<i32, bool>.Empty;"));
    assert_error_code(&errors, "E0204");
    assert_error_contains(&errors, "wrong number of type arguments for `Wrap`: expected 1, found 2");
}

#[test]
fn substituted_payload_types_are_checked() {
    let errors = analyze_err(&with_wrap("    let w: Wrap<i32> = Wrap.Of(\"text\");"));
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_contains(&errors, "expected `i32`, found `string`");
}

// ============================================================
// Option and Result
// ============================================================

#[test]
fn option_constructors() {
    body_ok(
        "    let some: Option<i32> = Option.Some(42);\n    let none_typed: Option<string> = Option.None;\n    let explicit: Option<i32> = Option<i32>.None;",
    );
}

#[test]
fn bare_none_needs_context() {
    let errors = body_err("    Option.None;");
    assert_error_code(&errors, "E0204");
    assert_error_contains(&errors, "cannot infer type arguments for `Option`");
}

#[test]
fn option_payload_rules() {
    let errors = body_err("    let o: Option<i32> = Option.Some;");
    assert_error_code(&errors, "E0216");
    assert_error_contains(&errors, "variant `Option.Some` requires a payload");

    let errors = body_err("    let o: Option<i32> = Option.None(3);");
    assert_error_contains(&errors, "variant `Option.None` does not take a payload");

    let errors = body_err("    let o: Option<i32> = Option.Missing;");
    assert_error_contains(&errors, "no variant `Missing` on enum `Option`");
}

#[test]
fn result_sides_come_from_the_expected_type() {
    let source = r#"
package t;

fn parse_flag(text: string) -> Result<bool, string> {
    if text == "on" {
        return Result.Ok(true);
    }
    return Result.Err("unknown flag");
}

pub fn main(none) -> void {
    let flag: Result<bool, string> = parse_flag("on");
    match flag {
        Result.Ok(value) => {
            if value {
                log("enabled");
            }
        }
        Result.Err(message) => {
            log(message);
        }
    }
    return ();
}
"#;
    analyze_ok(source);
}

#[test]
fn result_payload_type_is_checked_against_context() {
    let errors = body_err("    let r: Result<i32, string> = Result.Ok(\"text\");");
    assert_error_contains(&errors, "expected `Result<i32, string>`, found `Result<string, string>`");
}

#[test]
fn if_let_unwraps_an_option() {
    let source = r#"
package t;

fn find(none) -> Option<string> {
    return Option.Some("hit");
}

pub fn main(none) -> void {
    if let Option.Some(value) = find(none) {
        log(value);
    }
    return ();
}
"#;
    analyze_ok(source);
}

// ============================================================
// Match exhaustiveness
// ============================================================

#[test]
fn exhaustive_enum_match() {
    analyze_ok(&with_color(
        "    let c: Color = Color.Red;\n    match c {\n        Color.Red => {\n            log(\"red\");\n        }\n        Color.Green => {\n            log(\"green\");\n        }\n        Color.Blue => {\n            log(\"blue\");\n        }\n    }",
    ));
}

#[test]
fn missing_variants_are_listed() {
    let errors = analyze_err(&with_color(
        "    let c: Color = Color.Red;\n    match c {\n        Color.Red => {\n            log(\"red\");\n        }\n        Color.Green => {\n            log(\"green\");\n        }\n    }",
    ));
    assert_error_code(&errors, "E0206");
    assert_error_contains(&errors, "non-exhaustive match: `Color.Blue` not covered");
}

#[test]
fn wildcard_arm_covers_the_rest() {
    analyze_ok(&with_color(
        "    let c: Color = Color.Red;\n    match c {\n        Color.Red => {\n            log(\"red\");\n        }\n        _ => {\n            log(\"other\");\n        }\n    }",
    ));
}

#[test]
fn guarded_arms_do_not_discharge_a_variant() {
    let errors = analyze_err(&with_color(
        "    let c: Color = Color.Red;\n    match c {\n        Color.Red => {\n            log(\"red\");\n        }\n        Color.Green => {\n            log(\"green\");\n        }\n        Color.Blue if 1 < 2 => {\n            log(\"blue\");\n        }\n    }",
    ));
    assert_error_contains(&errors, "`Color.Blue` not covered");
}

#[test]
fn arms_after_a_catch_all_are_unreachable() {
    let analyzed = analyze_ok(&with_color(
        "    let c: Color = Color.Red;\n    match c {\n        _ => {\n            log(\"any\");\n        }\n        Color.Red => {\n            log(\"red\");\n        }\n    }",
    ));
    assert_eq!(analyzed.warnings.len(), 1, "{:#?}", analyzed.warnings);
    assert!(analyzed.warnings[0].message.contains("unreachable match arm"));
    assert_eq!(analyzed.warnings[0].code.as_deref(), Some("E0207"));
}

#[test]
fn integer_matches_need_a_wildcard() {
    let errors = body_err(
        "    let x: i32 = 3;\n    match x {\n        0 => {\n            log(\"zero\");\n        }\n        1 => {\n            log(\"one\");\n        }\n    }",
    );
    assert_error_code(&errors, "E0206");
    assert_error_contains(&errors, "non-exhaustive match: `_` not covered");

    body_ok(
        "    let x: i32 = 3;\n    match x {\n        0 => {\n            log(\"zero\");\n        }\n        _ => {\n            log(\"more\");\n        }\n    }",
    );
}

#[test]
fn bool_matches_need_both_values() {
    let errors = body_err(
        "    let f: bool = true;\n    match f {\n        true => {\n            log(\"yes\");\n        }\n    }",
    );
    assert_error_contains(&errors, "non-exhaustive match: `false` not covered");
}

#[test]
fn refutable_payload_patterns_do_not_cover_a_variant() {
    let errors = body_err(
        "    let o: Option<i32> = Option.Some(1);\n    match o {\n        Option.Some(1) => {\n            log(\"one\");\n        }\n        Option.None => {\n            log(\"none\");\n        }\n    }",
    );
    assert_error_contains(&errors, "`Option.Some` not covered");
}

// ============================================================
// Patterns
// ============================================================

#[test]
fn tuple_patterns_bind_elementwise() {
    body_ok(
        "    let pair: (i32, bool) = (1, true);\n    match pair {\n        (count, mut flag) => {\n            flag = false;\n            let n: i32 = count + 1;\n        }\n    }",
    );
}

#[test]
fn tuple_pattern_arity_is_checked() {
    let errors = body_err(
        "    let pair: (i32, bool) = (1, true);\n    match pair {\n        (a, b, c) => {\n            log(\"three\");\n        }\n    }",
    );
    assert_error_contains(&errors, "tuple pattern has 3 elements but the matched tuple has 2");
}

#[test]
fn literal_patterns_must_match_the_scrutinee() {
    let errors = body_err(
        "    let x: i32 = 1;\n    match x {\n        \"one\" => {\n            log(\"s\");\n        }\n        _ => {\n            log(\"other\");\n        }\n    }",
    );
    assert_error_contains(&errors, "pattern does not match the matched type `i32`");
}

#[test]
fn variant_patterns_must_name_the_matched_enum() {
    let source = format!(
        "{COLOR_DECL}\nenum Status {{\n    Active,\n}}\n\npub fn main(none) -> void {{\n    let c: Color = Color.Red;\n    match c {{\n        Status.Active => {{\n            log(\"?\");\n        }}\n        _ => {{\n            log(\"other\");\n        }}\n    }}\n    return ();\n}}\n"
    );
    let errors = analyze_err(&source);
    assert_error_contains(&errors, "pattern does not match the matched type `Color`");
}

#[test]
fn variant_pattern_payload_rules() {
    let errors = analyze_err(&with_shape(
        "    let s: Shape = Shape.Dot;\n    match s {\n        Shape.Circle => {\n            log(\"circle\");\n        }\n        _ => {\n            log(\"other\");\n        }\n    }",
    ));
    assert_error_code(&errors, "E0216");
    assert_error_contains(&errors, "variant `Shape.Circle` requires a payload");

    let errors = analyze_err(&with_shape(
        "    let s: Shape = Shape.Dot;\n    match s {\n        Shape.Dot(x) => {\n            log(\"dot\");\n        }\n        _ => {\n            log(\"other\");\n        }\n    }",
    ));
    assert_error_contains(&errors, "variant `Shape.Dot` does not take a payload");
}

#[test]
fn variant_pattern_payloads_bind_typed_names() {
    analyze_ok(&with_shape(
        "    let s: Shape = Shape.Circle(2.5);\n    match s {\n        Shape.Dot => {\n            log(\"dot\");\n        }\n        Shape.Circle(radius) => {\n            let area: f64 = radius * radius;\n        }\n    }",
    ));
}

// ============================================================
// Arrays, slices, and indexing
// ============================================================

#[test]
fn array_literals_unify_their_elements() {
    body_ok("    let a: [3]i32 = [1, 2, 3];\n    let b: [2]string = [\"x\", \"y\"];");

    let errors = body_err("    let a: [3]i32 = [1, true, 3];");
    assert_error_contains(&errors, "expected `i32`, found `bool`");
}

#[test]
fn repeat_arrays_need_a_constant_length() {
    body_ok("    let a: [4]i32 = [0; 4];\n    let b: [4]i32 = [0; 2 + 2];");

    let errors = body_err("    let n: i32 = 4;\n    let a: [4]i32 = [0; n];");
    assert_error_code(&errors, "E0222");
    assert_error_contains(&errors, "array length must be a compile-time constant");
    assert_suggestion_contains(&errors, "`n` is not a constant");
}

#[test]
fn negative_array_lengths_are_rejected() {
    let errors = body_err("    let a: [1]i32 = [0; -1];");
    assert_error_code(&errors, "E0222");
    assert_error_contains(&errors, "array size must be non-negative, found -1");
}

#[test]
fn arrays_decay_to_slices() {
    body_ok(
        "    let a: [3]i32 = [1, 2, 3];\n    let s: []i32 = a;\n    let t: []i32 = a[:];\n    let tail: []i32 = a[1:];\n    let empty: []string = [none];",
    );
}

#[test]
fn slices_do_not_convert_back_to_arrays() {
    let errors = body_err("    let a: [3]i32 = [1, 2, 3];\n    let s: []i32 = a;\n    let b: [3]i32 = s;");
    assert_error_contains(&errors, "expected `[3]i32`, found `[]i32`");
}

#[test]
fn array_sizes_must_match() {
    let errors = body_err("    let a: [4]i32 = [1, 2, 3];");
    assert_error_contains(&errors, "expected `[4]i32`, found `[3]i32`");
}

#[test]
fn indexes_must_be_integers() {
    body_ok("    let a: [3]i32 = [1, 2, 3];\n    let first: i32 = a[0];\n    let mid: []i32 = a[1:2];");

    let errors = body_err("    let a: [3]i32 = [1, 2, 3];\n    let x: i32 = a[true];");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_contains(&errors, "expected `i32`, found `bool`");
}

#[test]
fn only_arrays_and_slices_are_indexable() {
    let errors = body_err("    let c: char = \"abc\"[0];");
    assert_error_code(&errors, "E0218");
    assert_error_contains(&errors, "value of type `string` cannot be indexed");

    let errors = body_err("    let x: i32 = 7;\n    let y: i32 = x[0];");
    assert_error_contains(&errors, "value of type `i32` cannot be indexed");
}

// ============================================================
// Casts
// ============================================================

#[test]
fn numeric_bool_and_char_sources_cast_to_numbers() {
    body_ok(
        "    let a: i64 = 3 as i64;\n    let b: i32 = 2.7 as i32;\n    let c: u8 = 'x' as u8;\n    let d: i32 = true as i32;\n    let e: f64 = 1 as f64;",
    );
}

#[test]
fn invalid_casts_are_rejected() {
    let errors = body_err("    let x: i32 = \"s\" as i32;");
    assert_error_code(&errors, "E0200");
    assert_error_contains(&errors, "cannot cast `string` to `i32`");

    let errors = body_err("    let x: bool = 1 as bool;");
    assert_error_contains(&errors, "cannot cast `i32` to `bool`");
}

#[test]
fn pointer_casts_do_not_need_unsafe() {
    body_ok(
        "    let x: i32 = 7;\n    let p: *const i32 = &x;\n    let q: *const u8 = p as *const u8;",
    );
}

// ============================================================
// Pointers and unsafe
// ============================================================

#[test]
fn dereferencing_needs_an_unsafe_block() {
    let errors = body_err("    let x: i32 = 7;\n    let p: *const i32 = &x;\n    let v: i32 = *p;");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_code(&errors, "E0221");
    assert_error_contains(&errors, "dereferencing a raw pointer requires an unsafe block");
    assert_suggestion_contains(&errors, "unsafe {");
}

#[test]
fn dereferencing_inside_unsafe_is_allowed() {
    body_ok(
        "    let x: i32 = 7;\n    let p: *const i32 = &x;\n    unsafe {\n        let v: i32 = *p;\n    }",
    );
}

#[test]
fn assigning_through_a_mut_pointer_in_unsafe() {
    let source = r#"
package ffi;

pub extern "libc" fn alloc_i32(none) -> *mut i32;

pub fn main(none) -> void {
    let p: *mut i32 = alloc_i32(none);
    unsafe {
        *p = 42;
        let v: i32 = *p;
    }
    return ();
}
"#;
    analyze_ok(source);
}

#[test]
fn assigning_through_a_pointer_outside_unsafe() {
    let source = r#"
package ffi;

pub extern "libc" fn alloc_i32(none) -> *mut i32;

pub fn main(none) -> void {
    let p: *mut i32 = alloc_i32(none);
    *p = 42;
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0221");
    assert_error_contains(&errors, "assigning through a raw pointer requires an unsafe block");
}

#[test]
fn assigning_through_a_const_pointer_is_rejected() {
    let errors = body_err(
        "    let x: i32 = 7;\n    let p: *const i32 = &x;\n    unsafe {\n        *p = 9;\n    }",
    );
    assert_error_code(&errors, "E0208");
    assert_error_contains(&errors, "cannot assign through `*const i32`: pointer is not `*mut`");
}

#[test]
fn address_of_yields_a_const_pointer() {
    let errors = body_err("    let x: i32 = 7;\n    let p: *mut i32 = &x;");
    assert_error_contains(&errors, "expected `*mut i32`, found `*const i32`");
}

#[test]
fn sizeof_is_a_usize() {
    body_ok("    let n: usize = sizeof(i64);\n    let m: i32 = sizeof(i64) as i32;");
}

// ============================================================
// Constants
// ============================================================

#[test]
fn constants_fold_in_declaration_order() {
    let source = r#"
package t;

pub const HOUR: i32 = 3600;
pub const DAY: i32 = HOUR * 24;

pub fn main(none) -> void {
    let span: i32 = DAY;
    return ();
}
"#;
    analyze_ok(source);
}

#[test]
fn constants_cannot_reference_later_constants() {
    let source = r#"
package t;

const EARLY: i32 = LATE + 1;
const LATE: i32 = 2;
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0201");
    assert_error_contains(&errors, "cannot find `LATE`");
}

#[test]
fn constants_cannot_reference_themselves() {
    let errors = analyze_err("package t;\n\nconst CYCLE: i32 = CYCLE + 1;\n");
    assert_error_code(&errors, "E0222");
    assert_suggestion_contains(&errors, "constants evaluate in declaration order");
}

#[test]
fn constant_initializers_cannot_call_functions() {
    let errors = analyze_err("package t;\n\npub const ARGS: []string = args(none);\n");
    assert_error_code(&errors, "E0222");
    assert_error_contains(&errors, "constant initializer must be a compile-time constant");
}

#[test]
fn builtins_are_not_constants() {
    let errors = analyze_err("package t;\n\npub const L: i32 = len;\n");
    assert_error_code(&errors, "E0222");
    assert_suggestion_contains(&errors, "`len` is not a constant");
}

#[test]
fn constant_division_by_zero_is_reported() {
    let errors = analyze_err("package t;\n\npub const BAD: i32 = 1 / 0;\n");
    assert_error_code(&errors, "E0222");
    assert_suggestion_contains(&errors, "overflows or divides by zero");
}

#[test]
fn constant_value_must_fit_the_declared_type() {
    let errors = analyze_err("package t;\n\npub const FLAG: i32 = true;\n");
    assert_error_code(&errors, "E0200");
    assert_error_contains(&errors, "expected `i32`, found `bool`");
}

#[test]
fn constants_size_arrays() {
    let source = r#"
package t;

pub const N: i32 = 4;

pub fn main(none) -> void {
    let a: [4]i32 = [0; N];
    return ();
}
"#;
    analyze_ok(source);
}

#[test]
fn sizeof_folds_in_constants() {
    analyze_ok("package t;\n\npub const WORD: i32 = sizeof(i64) as i32;\n");
}

#[test]
fn enum_discriminants_fold_constants() {
    let source = r#"
package t;

pub const BASE: i32 = 10;

pub enum Code {
    Low = BASE,
    High = 20,
}

pub fn main(none) -> void {
    let c: Code = Code.Low;
    return ();
}
"#;
    analyze_ok(source);
}

#[test]
fn enum_discriminants_must_be_constant() {
    let source = r#"
package t;

pub enum Code {
    Low = len("ab"),
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0222");
    assert_error_contains(&errors, "enum discriminant must be a compile-time constant");
}

// ============================================================
// Concurrency
// ============================================================

#[test]
fn spawn_and_await_round_trip() {
    let source = r#"
package t;

fn compute(seed: i32) -> i64 {
    return seed as i64;
}

pub fn main(none) -> void {
    spawn compute(1);
    spawn_with_handle task = compute(2);
    let result: i64 = await task;
    return ();
}
"#;
    analyze_ok(source);
}

#[test]
fn await_requires_a_task_handle() {
    let errors = body_err("    let x: i32 = 1;\n    let y: i32 = await x;");
    assert_error_code(&errors, "E0200");
    assert_error_contains(&errors, "`await` requires a task handle, found `i32`");
}

#[test]
fn awaited_result_type_flows_from_the_spawned_call() {
    let source = r#"
package t;

fn compute(seed: i32) -> i64 {
    return seed as i64;
}

pub fn main(none) -> void {
    spawn_with_handle task = compute(2);
    let result: i32 = await task;
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_error_contains(&errors, "expected `i32`, found `i64`");
}

#[test]
fn spawned_calls_are_type_checked() {
    let errors = body_err("    spawn missing(none);");
    assert_error_code(&errors, "E0201");
    assert_error_contains(&errors, "cannot find `missing`");
}

#[test]
fn task_handles_are_immutable() {
    let source = r#"
package t;

fn compute(seed: i32) -> i64 {
    return seed as i64;
}

pub fn main(none) -> void {
    spawn_with_handle task = compute(2);
    task = compute(3);
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0208");
    assert_error_contains(&errors, "cannot assign to `task`");
}

// ============================================================
// Annotations and externs
// ============================================================

#[test]
fn borrowed_is_parameter_only() {
    let source = r#"
package ffi;

#[borrowed]
pub fn helper(none) -> void {
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0220");
    assert_error_contains(&errors, "`#[borrowed]` is only valid on function parameters");
}

#[test]
fn borrowed_on_a_method_is_rejected() {
    let source = r#"
package t;

struct Point {
    x: i32,
}

impl Point {
    #[borrowed]
    fn x_value(self) -> i32 {
        return self.x;
    }
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0220");
}

#[test]
fn extern_functions_are_callable() {
    let source = r#"
package ffi;

pub extern "libc" fn malloc(size: u64) -> *mut void;
pub extern "libc" fn write(#[borrowed] buf: *const u8, count: u64) -> i64;

pub fn main(none) -> void {
    let p: *mut void = malloc(16);
    let byte: u8 = 65;
    let n: i64 = write(&byte, 1);
    return ();
}
"#;
    analyze_ok(source);
}

// ============================================================
// Error recovery
// ============================================================

#[test]
fn one_bad_subexpression_reports_once() {
    let errors = body_err("    let x: i32 = missing + 1;");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_contains(&errors, "cannot find `missing`");

    let errors = body_err("    missing.field[0];");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_contains(&errors, "cannot find `missing`");
}

#[test]
fn checking_continues_with_the_declared_type() {
    // `a` keeps its declared `i32` after the bad initializer, so the
    // comparison below still checks cleanly.
    let errors = body_err("    let a: i32 = \"one\";\n    let b: bool = a == 2;");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert_error_contains(&errors, "expected `i32`, found `string`");
}

#[test]
fn independent_errors_are_all_reported() {
    let errors = body_err("    let a: i32 = true;\n    let b: bool = 3;\n    let c: string = 'x';");
    assert_eq!(errors.len(), 3, "{errors:#?}");
}

// ============================================================
// Declaration scoping
// ============================================================

#[test]
fn type_parameters_do_not_leak_out_of_their_declaration() {
    let source = r#"
package t;

pub struct Pair<A, B> {
    pub first: A,
    pub second: B,
}

fn f(value: A) -> void {
    return ();
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0202");
    assert_error_contains(&errors, "cannot find type `A`");
}

#[test]
fn duplicate_type_parameters_are_rejected() {
    let source = r#"
package t;

pub struct Bad<A, A> {
    pub first: A,
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0205");
    assert_error_contains(&errors, "duplicate type parameter `A`");
}

#[test]
fn struct_and_enum_names_share_a_namespace() {
    let source = r#"
package t;

struct Thing {
    none
}

enum Thing {
    One,
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0203");
    assert_error_contains(&errors, "duplicate definition of `Thing`");
}

#[test]
fn duplicate_parameters_are_rejected() {
    let source = r#"
package t;

fn g(a: i32, a: i32) -> i32 {
    return a;
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0203");
    assert_error_contains(&errors, "duplicate definition of `a`");
}

#[test]
fn duplicate_struct_fields_are_rejected() {
    let source = r#"
package t;

struct P {
    x: i32,
    x: i32,
}
"#;
    let errors = analyze_err(source);
    assert_error_contains(&errors, "duplicate definition of `x`");
}

#[test]
fn duplicate_methods_are_rejected() {
    let source = r#"
package t;

struct Point {
    x: i32,
}

impl Point {
    fn norm(self) -> i32 {
        return 0;
    }

    fn norm(self) -> i32 {
        return 1;
    }
}
"#;
    let errors = analyze_err(source);
    assert_error_code(&errors, "E0203");
    assert_error_contains(&errors, "duplicate definition of `norm`");
}

#[test]
fn duplicate_enum_variants_are_rejected() {
    let source = r#"
package t;

enum Status {
    Active,
    Active,
}
"#;
    let errors = analyze_err(source);
    assert_error_contains(&errors, "duplicate definition of `Active`");
}
