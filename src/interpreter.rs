use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::environment::{self, EnvHandle, Environment};
use crate::error::Error;
use crate::function::Function;
use crate::object::Value;
use crate::syntax::{expr, stmt, Expr, LiteralValue, NodeId, Stmt};
use crate::token::{Token, TokenType};

/// Walks the AST produced by the parser and resolver, evaluating it for
/// effect. Holds the live environment chain plus the resolver's depth map,
/// so a single `Interpreter` is meant to be reused across an entire REPL
/// session — each line sees the globals and closures left behind by the
/// ones before it.
pub struct Interpreter {
    pub globals: EnvHandle,
    env: EnvHandle,
    locals: HashMap<NodeId, usize>,
    output: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// Builds an interpreter that writes `print` output to `output` instead
    /// of the real stdout. Used by tests that need to assert on what a
    /// program printed.
    pub fn with_output(output: Rc<RefCell<dyn Write>>) -> Self {
        let globals = Environment::new_global();
        globals.borrow_mut().define(
            "clock".to_string(),
            Value::Callable(Function::Native {
                name: "clock",
                arity: 0,
                body: |_| {
                    let now = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .expect("system clock is before the epoch");
                    Value::Number(now.as_nanos() as f64)
                },
            }),
        );

        Interpreter {
            env: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Recorded by the resolver: `id` is this many scopes away from the one
    /// that declares it.
    pub fn resolve(&mut self, id: NodeId, depth: usize) {
        self.locals.insert(id, depth);
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        for statement in statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    fn execute(&mut self, statement: &Stmt) -> Result<(), Error> {
        statement.accept(self)
    }

    /// Runs `statements` in a fresh environment nested inside `environment`,
    /// restoring the previously active environment on every exit path
    /// (normal completion, an error, or a `return`).
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvHandle) -> Result<(), Error> {
        let previous = std::mem::replace(&mut self.env, environment);
        let result = (|| {
            for statement in statements {
                self.execute(statement)?;
            }
            Ok(())
        })();
        self.env = previous;
        result
    }

    fn evaluate(&mut self, expression: &Expr) -> Result<Value, Error> {
        expression.accept(self)
    }

    fn look_up_variable(&self, id: NodeId, name: &Token) -> Result<Value, Error> {
        match self.locals.get(&id) {
            Some(&distance) => environment::get_at(&self.env, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn number_operand_error<R>(&self, operator: &Token) -> Result<R, Error> {
        Err(Error::Runtime {
            token: operator.clone(),
            message: "Operand must be a number.".to_string(),
        })
    }
}

impl expr::Visitor<Result<Value, Error>> for Interpreter {
    fn visit_assign_expr(&mut self, id: NodeId, name: &Token, value: &Expr) -> Result<Value, Error> {
        let value = self.evaluate(value)?;
        match self.locals.get(&id) {
            Some(&distance) => environment::assign_at(&self.env, distance, name, value.clone())?,
            None => self.globals.borrow_mut().assign(name, value.clone())?,
        }
        Ok(value)
    }

    fn visit_logical_expr(&mut self, _id: NodeId, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, Error> {
        let left = self.evaluate(left)?;
        match operator.token_type {
            TokenType::Or if left.is_truthy() => Ok(left),
            TokenType::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right),
        }
    }

    fn visit_binary_expr(&mut self, _id: NodeId, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, Error> {
        let l = self.evaluate(left)?;
        let r = self.evaluate(right)?;

        match operator.token_type {
            TokenType::Minus => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => self.number_operand_error(operator),
            },
            TokenType::Slash => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
                _ => self.number_operand_error(operator),
            },
            TokenType::Star => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => self.number_operand_error(operator),
            },
            TokenType::Plus => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(Error::Runtime {
                    token: operator.clone(),
                    message: "Operands must be two numbers or two strings.".to_string(),
                }),
            },
            TokenType::Greater => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a > b)),
                _ => self.number_operand_error(operator),
            },
            TokenType::GreaterEqual => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a >= b)),
                _ => self.number_operand_error(operator),
            },
            TokenType::Less => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a < b)),
                _ => self.number_operand_error(operator),
            },
            TokenType::LessEqual => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a <= b)),
                _ => self.number_operand_error(operator),
            },
            TokenType::BangEqual => Ok(Value::Boolean(!l.equals(&r))),
            TokenType::EqualEqual => Ok(Value::Boolean(l.equals(&r))),
            _ => unreachable!("parser never produces this token as a binary operator"),
        }
    }

    fn visit_unary_expr(&mut self, _id: NodeId, operator: &Token, right: &Expr) -> Result<Value, Error> {
        let right = self.evaluate(right)?;
        match operator.token_type {
            TokenType::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => self.number_operand_error(operator),
            },
            TokenType::Bang => Ok(Value::Boolean(!right.is_truthy())),
            _ => unreachable!("parser never produces this token as a unary operator"),
        }
    }

    fn visit_call_expr(&mut self, _id: NodeId, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value, Error> {
        let callee = self.evaluate(callee)?;
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let function = match callee {
            Value::Callable(f) => f,
            _ => {
                return Err(Error::Runtime {
                    token: paren.clone(),
                    message: "Can only call functions and classes.".to_string(),
                })
            }
        };

        if args.len() != function.arity() {
            return Err(Error::Runtime {
                token: paren.clone(),
                message: format!("Expected {} arguments but got {}.", function.arity(), args.len()),
            });
        }

        function.call(self, &args)
    }

    fn visit_grouping_expr(&mut self, _id: NodeId, expression: &Expr) -> Result<Value, Error> {
        self.evaluate(expression)
    }

    fn visit_func_expr(&mut self, _id: NodeId, params: &[Token], body: &[Stmt]) -> Result<Value, Error> {
        Ok(Value::Callable(Function::User {
            name: None,
            params: params.to_vec(),
            body: Rc::new(body.to_vec()),
            closure: self.env.clone(),
        }))
    }

    fn visit_literal_expr(&mut self, _id: NodeId, value: &LiteralValue) -> Result<Value, Error> {
        Ok(match value {
            LiteralValue::Nil => Value::Nil,
            LiteralValue::Boolean(b) => Value::Boolean(*b),
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::String(s) => Value::String(s.clone()),
        })
    }

    fn visit_variable_expr(&mut self, id: NodeId, name: &Token) -> Result<Value, Error> {
        self.look_up_variable(id, name)
    }
}

impl stmt::Visitor<Result<(), Error>> for Interpreter {
    fn visit_expression_stmt(&mut self, expression: &Expr) -> Result<(), Error> {
        self.evaluate(expression)?;
        Ok(())
    }

    fn visit_print_stmt(&mut self, expression: &Expr) -> Result<(), Error> {
        let value = self.evaluate(expression)?;
        writeln!(self.output.borrow_mut(), "{value}").map_err(Error::Io)?;
        Ok(())
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: &Option<Expr>) -> Result<(), Error> {
        let value = match initializer {
            Some(init) => self.evaluate(init)?,
            None => Value::Nil,
        };
        self.env.borrow_mut().define(name.lexeme.clone(), value);
        Ok(())
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        let block_env = Environment::with_enclosing(&self.env);
        self.execute_block(statements, block_env)
    }

    fn visit_if_stmt(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> Result<(), Error> {
        if self.evaluate(condition)?.is_truthy() {
            self.execute(then_branch)
        } else if let Some(else_stmt) = else_branch {
            self.execute(else_stmt)
        } else {
            Ok(())
        }
    }

    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> Result<(), Error> {
        while self.evaluate(condition)?.is_truthy() {
            self.execute(body)?;
        }
        Ok(())
    }

    fn visit_function_stmt(&mut self, name: &Token, params: &[Token], body: &[Stmt]) -> Result<(), Error> {
        let function = Value::Callable(Function::User {
            name: Some(name.clone()),
            params: params.to_vec(),
            body: Rc::new(body.to_vec()),
            closure: self.env.clone(),
        });
        self.env.borrow_mut().define(name.lexeme.clone(), function);
        Ok(())
    }

    fn visit_return_stmt(&mut self, _keyword: &Token, value: &Option<Expr>) -> Result<(), Error> {
        let value = match value {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };
        Err(Error::Return { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run(source: &str) -> Interpreter {
        let tokens = Scanner::new(source.to_string()).scan_tokens().unwrap();
        let statements = Parser::new(&tokens).parse().unwrap();
        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve_stmts(&statements);
        interpreter.interpret(&statements).unwrap();
        interpreter
    }

    fn eval_global(source_with_result: &str, name: &str) -> Value {
        let interpreter = run(source_with_result);
        interpreter.globals.borrow().get(&Token::new(TokenType::Identifier, name, 1)).unwrap()
    }

    #[test]
    fn arithmetic_with_swapped_precedence_tables() {
        // `+`/`-` are handled by `comparison`, looser than `<`/`>` from
        // `term`, so this is `1 + (2 * 3)` = 7.
        let value = eval_global("var result = 1 + 2 * 3;", "result");
        assert!(matches!(value, Value::Number(n) if n == 7.0));
    }

    #[test]
    fn string_concatenation() {
        let value = eval_global(r#"var result = "hi" + " " + "world";"#, "result");
        assert!(matches!(value, Value::String(s) if s == "hi world"));
    }

    #[test]
    fn block_scoping_shadows_without_leaking() {
        let value = eval_global("var a = 1; { var a = 2; } var result = a;", "result");
        assert!(matches!(value, Value::Number(n) if n == 1.0));
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let interpreter = run(
            "fun makeCounter() { var i = 0; fun count() { i = i + 1; return i; } return count; }
             var counter = makeCounter();
             var a = counter();
             var b = counter();
             var c = counter();",
        );
        let get = |name: &str| {
            interpreter
                .globals
                .borrow()
                .get(&Token::new(TokenType::Identifier, name, 1))
                .unwrap()
        };
        assert!(matches!(get("a"), Value::Number(n) if n == 1.0));
        assert!(matches!(get("b"), Value::Number(n) if n == 2.0));
        assert!(matches!(get("c"), Value::Number(n) if n == 3.0));
    }

    #[test]
    fn division_by_zero_follows_ieee_754() {
        let value = eval_global("var result = 1 / 0;", "result");
        assert!(matches!(value, Value::Number(n) if n.is_infinite()));
    }

    #[test]
    fn clock_returns_nanoseconds_since_the_epoch() {
        // nanosecond-scale epoch timestamps are on the order of 1e18 as of
        // any date past 2001; a seconds-scale value would only be ~1e9.
        let value = eval_global("var result = clock();", "result");
        assert!(matches!(value, Value::Number(n) if n > 1.0e17));
    }

    #[test]
    fn calling_a_non_callable_is_a_runtime_error() {
        let tokens = Scanner::new("var a = 1; a();".to_string()).scan_tokens().unwrap();
        let statements = Parser::new(&tokens).parse().unwrap();
        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve_stmts(&statements);
        assert!(interpreter.interpret(&statements).is_err());
    }

    #[test]
    fn lexical_scoping_resolves_against_the_defining_scope() {
        // the classic closure-capture regression: `showA` must always print
        // the global `a`, never the block-local shadow, because it was
        // resolved against the scope chain in effect where it was declared.
        let interpreter = run(
            r#"
            var a = "global";
            var result1;
            {
                fun showA() { result1 = a; }
                showA();
                var a = "block";
                showA();
            }
            "#,
        );
        let get = |name: &str| {
            interpreter
                .globals
                .borrow()
                .get(&Token::new(TokenType::Identifier, name, 1))
                .unwrap()
        };
        assert!(matches!(get("result1"), Value::String(s) if s == "global"));
    }
}
