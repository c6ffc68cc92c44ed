//! Static-rule enforcement. All resolver diagnostics carry the `Runtime`
//! phase tag.

use quill::reporter::Phase;

fn first_error(source: &str) -> quill::reporter::Diagnostic {
    let result = quill::run(source);

    assert!(!result.succeeded, "expected failure for {:?}", source);

    result.errors[0].clone()
}

#[test]
fn test_return_at_top_level() {
    let diagnostic = first_error("return 5;");

    assert_eq!(diagnostic.message, "Cannot return from top-level code.");
    assert_eq!(diagnostic.phase, Phase::Runtime);
}

#[test]
fn test_return_inside_block_at_top_level() {
    let diagnostic = first_error("{ return; }");

    assert_eq!(diagnostic.message, "Cannot return from top-level code.");
}

#[test]
fn test_return_value_from_initializer() {
    let diagnostic = first_error("class A { init() { return 5; } }");

    assert_eq!(diagnostic.message, "Cannot return a value from an initializer.");
    assert_eq!(diagnostic.phase, Phase::Runtime);
}

#[test]
fn test_bare_return_from_initializer_is_allowed() {
    let result = quill::run("class A { init() { return; } } A();");

    assert!(result.succeeded, "errors: {:?}", result.errors);
}

#[test]
fn test_this_outside_class() {
    let diagnostic = first_error("print this;");

    assert_eq!(diagnostic.message, "Cannot use 'this' outside of a class.");
}

#[test]
fn test_this_inside_plain_function() {
    let diagnostic = first_error("fun f() { return this; }");

    assert_eq!(diagnostic.message, "Cannot use 'this' outside of a class.");
}

#[test]
fn test_super_outside_class() {
    let diagnostic = first_error("print super.x;");

    assert_eq!(diagnostic.message, "Cannot use 'super' outside of a class.");
}

#[test]
fn test_super_without_superclass() {
    let diagnostic = first_error("class A { f() { return super.f(); } }");

    assert_eq!(
        diagnostic.message,
        "Cannot use 'super' in a class with no superclass."
    );
}

#[test]
fn test_class_cannot_inherit_from_itself() {
    let diagnostic = first_error("class A inherits A {}");

    assert_eq!(diagnostic.message, "A class cannot inherit from itself.");
}

#[test]
fn test_redeclaration_in_same_scope() {
    let diagnostic = first_error("{ let a = 1; let a = 2; }");

    assert_eq!(
        diagnostic.message,
        "Variable with name 'a' already declared in this scope."
    );
}

#[test]
fn test_redeclaration_of_global_is_allowed() {
    // Only local scopes reject redeclaration.
    let result = quill::run("let a = 1; let a = 2; print a;");

    assert!(result.succeeded);
    assert_eq!(result.output, vec!["2"]);
}

#[test]
fn test_read_in_own_initializer() {
    let diagnostic = first_error("{ let a = a; }");

    assert_eq!(
        diagnostic.message,
        "Cannot read local variable 'a' in its own initializer."
    );
}

#[test]
fn test_duplicate_parameter_names() {
    let diagnostic = first_error("fun f(a, a) {}");

    assert_eq!(
        diagnostic.message,
        "Variable with name 'a' already declared in this scope."
    );
}

#[test]
fn test_break_outside_loop() {
    let diagnostic = first_error("break;");

    assert_eq!(diagnostic.message, "Cannot use 'break' outside of a loop.");
}

#[test]
fn test_continue_outside_loop() {
    let diagnostic = first_error("continue;");

    assert_eq!(
        diagnostic.message,
        "Cannot use 'continue' outside of a loop."
    );
}

#[test]
fn test_break_inside_function_inside_loop_is_rejected() {
    // The function body is a fresh loop context.
    let diagnostic = first_error("while (true) { fun f() { break; } }");

    assert_eq!(diagnostic.message, "Cannot use 'break' outside of a loop.");
}

#[test]
fn test_shadowing_in_inner_scope_is_allowed() {
    let result = quill::run("let a = 1; { let a = 2; print a; } print a;");

    assert!(result.succeeded);
    assert_eq!(result.output, vec!["2", "1"]);
}

#[test]
fn test_resolution_survives_reuse_of_names_across_scopes() {
    let source = "\
let x = \"global\";
{
  fun show() {
    print x;
  }

  show();
  let x = \"local\";
  show();
}
";

    // `show` captured the scope before the inner `x` was declared, but its
    // body resolves `x` to the global: the block-local declaration comes
    // after the closure's reference.
    let result = quill::run(source);

    assert!(result.succeeded, "errors: {:?}", result.errors);
    assert_eq!(result.output, vec!["global", "global"]);
}
