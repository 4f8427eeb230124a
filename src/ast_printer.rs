// A debugging visitor, not part of the evaluation pipeline: it renders an
// expression as a fully-parenthesized Lisp-ish string so a developer can
// see exactly how the parser grouped an expression. Wired up behind the
// `--ast` flag in `main`.

use crate::syntax::{expr, Expr, LiteralValue, NodeId, Stmt};
use crate::token::Token;

pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&mut self, expr: &Expr) -> String {
        expr.accept(self)
    }

    fn parenthesize(&mut self, name: &str, exprs: &[&Expr]) -> String {
        let mut builder = String::new();
        builder.push('(');
        builder.push_str(name);
        for expr in exprs {
            builder.push(' ');
            builder.push_str(&expr.accept(self));
        }
        builder.push(')');
        builder
    }
}

impl expr::Visitor<String> for AstPrinter {
    fn visit_assign_expr(&mut self, _id: NodeId, name: &Token, value: &Expr) -> String {
        self.parenthesize(&format!("= {}", name.lexeme), &[value])
    }

    fn visit_logical_expr(&mut self, _id: NodeId, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_binary_expr(&mut self, _id: NodeId, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_unary_expr(&mut self, _id: NodeId, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[right])
    }

    fn visit_call_expr(&mut self, _id: NodeId, callee: &Expr, _paren: &Token, arguments: &[Expr]) -> String {
        let mut exprs = vec![callee];
        exprs.extend(arguments.iter());
        self.parenthesize("call", &exprs)
    }

    fn visit_grouping_expr(&mut self, _id: NodeId, expression: &Expr) -> String {
        self.parenthesize("group", &[expression])
    }

    fn visit_func_expr(&mut self, _id: NodeId, params: &[Token], _body: &[Stmt]) -> String {
        let names: Vec<&str> = params.iter().map(|p| p.lexeme.as_str()).collect();
        format!("(fun ({}) <body>)", names.join(" "))
    }

    fn visit_literal_expr(&mut self, _id: NodeId, value: &LiteralValue) -> String {
        match value {
            LiteralValue::Nil => "nil".to_string(),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Number(n) => n.to_string(),
            LiteralValue::String(s) => s.clone(),
        }
    }

    fn visit_variable_expr(&mut self, _id: NodeId, name: &Token) -> String {
        name.lexeme.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn prints_fully_parenthesized_form() {
        let expression = Expr::Binary {
            id: 0,
            left: Box::new(Expr::Unary {
                id: 1,
                operator: Token::new(TokenType::Minus, "-", 1),
                right: Box::new(Expr::Literal {
                    id: 2,
                    value: LiteralValue::Number(123.0),
                }),
            }),
            operator: Token::new(TokenType::Star, "*", 1),
            right: Box::new(Expr::Grouping {
                id: 3,
                expression: Box::new(Expr::Literal {
                    id: 4,
                    value: LiteralValue::Number(45.67),
                }),
            }),
        };

        let mut printer = AstPrinter;
        assert_eq!(printer.print(&expression), "(* (- 123) (group 45.67))");
    }
}
