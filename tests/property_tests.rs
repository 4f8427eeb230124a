//! Property-based tests fuzzing the parser's idempotence and the runtime
//! value table, as opposed to the example-based scenarios in
//! `integration_scenarios.rs`.

use proptest::prelude::*;

use loxide::ast_printer::AstPrinter;
use loxide::object::Value;
use loxide::parser::Parser;
use loxide::scanner::Scanner;
use loxide::syntax::Stmt;

#[derive(Debug, Clone)]
enum AExpr {
    Num(i32),
    Add(Box<AExpr>, Box<AExpr>),
    Sub(Box<AExpr>, Box<AExpr>),
    Mul(Box<AExpr>, Box<AExpr>),
    Group(Box<AExpr>),
}

fn arb_aexpr() -> impl Strategy<Value = AExpr> {
    let leaf = (0i32..1000).prop_map(AExpr::Num);
    leaf.prop_recursive(4, 64, 4, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| AExpr::Add(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| AExpr::Sub(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| AExpr::Mul(Box::new(l), Box::new(r))),
            inner.prop_map(|e| AExpr::Group(Box::new(e))),
        ]
    })
}

fn render(e: &AExpr) -> String {
    match e {
        AExpr::Num(n) => n.to_string(),
        AExpr::Add(l, r) => format!("{} + {}", render(l), render(r)),
        AExpr::Sub(l, r) => format!("{} - {}", render(l), render(r)),
        AExpr::Mul(l, r) => format!("{} * {}", render(l), render(r)),
        AExpr::Group(e) => format!("({})", render(e)),
    }
}

fn parse_single_expression_statement(source: &str) -> loxide::syntax::Expr {
    let tokens = Scanner::new(source.to_string()).scan_tokens().unwrap();
    let statements = Parser::new(&tokens).parse().unwrap();
    match statements.into_iter().next().unwrap() {
        Stmt::Expression { expression } => expression,
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

proptest! {
    /// Parsing the same well-formed source twice produces structurally
    /// equal trees (modulo node id) — the AST-printer's output doesn't
    /// depend on node id, so printing both parses and comparing the
    /// strings stands in for a structural-equality check.
    #[test]
    fn parsing_is_idempotent_in_shape(e in arb_aexpr()) {
        let source = format!("{};", render(&e));
        let first = parse_single_expression_statement(&source);
        let second = parse_single_expression_statement(&source);

        let mut printer = AstPrinter;
        prop_assert_eq!(printer.print(&first), printer.print(&second));
    }

    /// `!!x == truthy(x)` for every value, and only `Nil`/`Boolean(false)`
    /// are falsy.
    #[test]
    fn truthiness_law_holds(n in any::<f64>(), s in ".*", b in any::<bool>()) {
        prop_assert!(Value::Number(n).is_truthy());
        prop_assert!(Value::String(s).is_truthy());
        prop_assert_eq!(Value::Boolean(b).is_truthy(), b);
        prop_assert!(!Value::Nil.is_truthy());
    }

    /// Equality never crosses variant boundaries, and is reflexive within
    /// one.
    #[test]
    fn equality_is_typed_and_reflexive(n in any::<f64>(), s in ".*") {
        prop_assert!(Value::Number(n).equals(&Value::Number(n)) || n.is_nan());
        prop_assert!(Value::String(s.clone()).equals(&Value::String(s.clone())));
        prop_assert!(!Value::Number(n).equals(&Value::Nil));
        prop_assert!(!Value::String(s).equals(&Value::Boolean(false)));
    }
}

/// Arity law: a call succeeds only when the argument count matches the
/// callee's declared parameter count.
#[test]
fn arity_law_across_param_counts() {
    for params in 0..5usize {
        for args in 0..5usize {
            let param_list = (0..params).map(|i| format!("p{i}")).collect::<Vec<_>>().join(", ");
            let arg_list = (0..args).map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
            let source = format!("fun f({param_list}) {{ return 0; }} f({arg_list});");
            let result = loxide::run(&source);
            if params == args {
                assert!(result.is_ok(), "expected {params} params / {args} args to succeed");
            } else {
                assert!(result.is_err(), "expected {params} params / {args} args to fail");
            }
        }
    }
}
