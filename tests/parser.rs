use quill::error::QuillError;
use quill::expr::Expr;
use quill::parser::Parser;
use quill::reporter::{Phase, Reporter};
use quill::scanner::Scanner;
use quill::stmt::Stmt;
use quill::token::TokenType;

fn parse(source: &str) -> Result<Vec<Stmt>, QuillError> {
    let mut reporter = Reporter::new();
    let tokens = Scanner::new(source).scan_tokens(&mut reporter);

    assert!(
        !reporter.had_error(),
        "unexpected lexical diagnostics: {:?}",
        reporter.diagnostics()
    );

    Parser::new(tokens).parse()
}

fn parse_error(source: &str) -> QuillError {
    match parse(source) {
        Ok(statements) => panic!("expected syntax error, parsed {:?}", statements),
        Err(error) => error,
    }
}

#[test]
fn test_parser_error_messages() {
    let cases: &[(&str, &str)] = &[
        ("1 + 2", "Expect ';' after expression."),
        ("print 1", "Expect ';' after value."),
        ("let x = 1", "Expect ';' after variable declaration."),
        ("let 1 = 2;", "Expect variable name."),
        ("if x < 1 {}", "Expect '(' after 'if'"),
        ("if (x < 1 print x;", "Expect ')' after 'if' condition."),
        ("while x {}", "Expect '(' after 'while'"),
        ("while (x print x;", "Expect ')' after 'while' condition."),
        ("for ;;) {}", "Expect '(' after 'for'"),
        ("for (;1 2;) {}", "Expect ';' after 'for' condition."),
        ("for (;; x = x + 1 {}", "Expect ')' after 'for' clauses."),
        ("{ print 1;", "Expect '}' after block."),
        ("f(1, 2;", "Expect ')' after arguments."),
        ("a[1;", "Expect ']' after index."),
        ("a.;", "Expect property name after '.'"),
        ("fun () {}", "Expect function name."),
        ("fun f {}", "Expect '(' after function name."),
        ("fun f(a {}", "Expect ')' after parameters."),
        ("class {}", "Expect 'class' name"),
        ("class A", "Expect '{' before 'class' body."),
        ("class A inherits {}", "Expect superclass name."),
        ("class A { 1 }", "Expect method name."),
        ("class A { f {} }", "Expect '(' after method name."),
        ("class A { f() { return super; } }", "Expect '.' after 'super'"),
        ("return 1", "Expect ';' after 'return' value"),
        ("print ;", "Expect expression."),
        ("1 = 2;", "Invalid assignment target."),
        ("a + b = c;", "Invalid assignment target."),
        ("[1, 2;", "Expect ']' after array elements."),
    ];

    for (source, expected) in cases {
        let error = parse_error(source);

        assert_eq!(
            error.diagnostic.message, *expected,
            "message for {:?}",
            source
        );
        assert_eq!(error.diagnostic.phase, Phase::Syntax, "phase for {:?}", source);
    }
}

#[test]
fn test_parser_parameter_limit() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    let error = parse_error(&source);
    assert_eq!(
        error.diagnostic.message,
        "Can't have more than 255 parameters."
    );

    // 255 parameters is still fine.
    let params: Vec<String> = (0..255).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));
    assert!(parse(&source).is_ok());
}

#[test]
fn test_parser_argument_limit() {
    let args: Vec<String> = (0..256).map(|i| format!("{}", i)).collect();
    let source = format!("f({});", args.join(", "));

    let error = parse_error(&source);
    assert_eq!(
        error.diagnostic.message,
        "Can't have more than 255 arguments."
    );

    let args: Vec<String> = (0..255).map(|i| format!("{}", i)).collect();
    let source = format!("f({});", args.join(", "));
    assert!(parse(&source).is_ok());
}

#[test]
fn test_parser_for_desugars_to_while() {
    let statements = parse("for (let i = 0; i < 3; i = i + 1) print i;").unwrap();

    assert_eq!(statements.len(), 1);

    // { let i = 0; while (i < 3) { print i; i = i + 1; } }
    let outer = match &statements[0] {
        Stmt::Block(inner) => inner,
        other => panic!("expected outer block, got {:?}", other),
    };

    assert!(matches!(outer[0], Stmt::Var { .. }));

    let (condition, body) = match &outer[1] {
        Stmt::While { condition, body } => (condition, body),
        other => panic!("expected while, got {:?}", other),
    };

    assert!(matches!(condition, Expr::Binary { .. }));

    let body = match body.as_ref() {
        Stmt::Block(inner) => inner,
        other => panic!("expected body block, got {:?}", other),
    };

    assert!(matches!(body[0], Stmt::Print(_)));
    assert!(matches!(body[1], Stmt::Expression(Expr::Assign { .. })));
}

#[test]
fn test_parser_for_without_condition_defaults_to_true() {
    let statements = parse("for (;;) break;").unwrap();

    let (condition, body) = match &statements[0] {
        Stmt::While { condition, body } => (condition, body),
        other => panic!("expected bare while, got {:?}", other),
    };

    match condition {
        Expr::Literal(token) => assert_eq!(token.token_type, TokenType::TRUE),
        other => panic!("expected literal true, got {:?}", other),
    }

    // No initializer and no increment: no wrapping blocks.
    assert!(matches!(body.as_ref(), Stmt::Break(_)));
}

#[test]
fn test_parser_compound_assignment_desugars_to_binary() {
    let statements = parse("x += 2;").unwrap();

    let expr = match &statements[0] {
        Stmt::Expression(expr) => expr,
        other => panic!("expected expression statement, got {:?}", other),
    };

    let value = match expr {
        Expr::Assign { name, value, .. } => {
            assert_eq!(name.lexeme, "x");
            value
        }
        other => panic!("expected assignment, got {:?}", other),
    };

    match value.as_ref() {
        Expr::Binary { operator, left, .. } => {
            assert_eq!(operator.token_type, TokenType::PLUS);
            assert!(matches!(left.as_ref(), Expr::Variable { .. }));
        }
        other => panic!("expected binary value, got {:?}", other),
    }
}

#[test]
fn test_parser_postfix_increment_desugars_to_plus_one() {
    let statements = parse("x++;").unwrap();

    let value = match &statements[0] {
        Stmt::Expression(Expr::Assign { value, .. }) => value,
        other => panic!("expected assignment, got {:?}", other),
    };

    match value.as_ref() {
        Expr::Binary {
            operator, right, ..
        } => {
            assert_eq!(operator.token_type, TokenType::PLUS);

            match right.as_ref() {
                Expr::Literal(token) => assert_eq!(token.token_type, TokenType::NUMBER(0.0)),
                other => panic!("expected literal 1, got {:?}", other),
            }
        }
        other => panic!("expected binary value, got {:?}", other),
    }
}

#[test]
fn test_parser_indexed_and_property_assignment_targets() {
    let statements = parse("a[0] = 1; a.b = 2; a[0] += 1; a.b++;").unwrap();

    assert!(matches!(
        statements[0],
        Stmt::Expression(Expr::IndexSet { .. })
    ));
    assert!(matches!(statements[1], Stmt::Expression(Expr::Set { .. })));
    assert!(matches!(
        statements[2],
        Stmt::Expression(Expr::IndexSet { .. })
    ));
    assert!(matches!(statements[3], Stmt::Expression(Expr::Set { .. })));
}

#[test]
fn test_parser_else_binds_to_nearest_if() {
    let statements = parse("if (a) if (b) print 1; else print 2;").unwrap();

    let (then_branch, else_branch) = match &statements[0] {
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => (then_branch, else_branch),
        other => panic!("expected if, got {:?}", other),
    };

    // The outer if has no else; the inner one took it.
    assert!(else_branch.is_none());

    match then_branch.as_ref() {
        Stmt::If { else_branch, .. } => assert!(else_branch.is_some()),
        other => panic!("expected nested if, got {:?}", other),
    }
}

#[test]
fn test_parser_elif_becomes_nested_if() {
    let statements = parse("if (a) print 1; elif (b) print 2; else print 3;").unwrap();

    let else_branch = match &statements[0] {
        Stmt::If { else_branch, .. } => else_branch,
        other => panic!("expected if, got {:?}", other),
    };

    match else_branch.as_deref() {
        Some(Stmt::If { else_branch, .. }) => assert!(else_branch.is_some()),
        other => panic!("expected elif as nested if, got {:?}", other),
    }
}

#[test]
fn test_parser_call_chains_are_left_associative() {
    let statements = parse("a.b(1)[2].c;").unwrap();

    // ((a.b)(1))[2].c
    let expr = match &statements[0] {
        Stmt::Expression(expr) => expr,
        other => panic!("expected expression statement, got {:?}", other),
    };

    let object = match expr {
        Expr::Get { object, name } => {
            assert_eq!(name.lexeme, "c");
            object
        }
        other => panic!("expected property access, got {:?}", other),
    };

    let object = match object.as_ref() {
        Expr::Index { object, .. } => object,
        other => panic!("expected index, got {:?}", other),
    };

    assert!(matches!(object.as_ref(), Expr::Call { .. }));
}

#[test]
fn test_parser_array_literals() {
    let statements = parse("[]; [1, 2, 3];").unwrap();

    match &statements[0] {
        Stmt::Expression(Expr::Array { elements, .. }) => assert!(elements.is_empty()),
        other => panic!("expected empty array literal, got {:?}", other),
    }

    match &statements[1] {
        Stmt::Expression(Expr::Array { elements, .. }) => assert_eq!(elements.len(), 3),
        other => panic!("expected array literal, got {:?}", other),
    }
}

#[test]
fn test_parser_surfaces_only_the_first_error() {
    // Both statements are bad; only the first is reported.
    let error = parse_error("print ; let 1 = 2;");

    assert_eq!(error.diagnostic.message, "Expect expression.");
}

#[test]
fn test_parser_error_carries_position_and_lexeme() {
    let error = parse_error("let x = 1\nprint x;");

    assert_eq!(error.diagnostic.line, 2);
    assert_eq!(error.diagnostic.lexeme.as_deref(), Some("print"));
}
