use crate::error::resolution_error;
use crate::interpreter::Interpreter;
use crate::syntax::{expr, stmt, Expr, LiteralValue, NodeId, Stmt};
use crate::token::Token;

use std::collections::HashMap;

/// Tracks whether the code currently being resolved sits inside a function
/// body, so `return` outside one can be rejected statically.
#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
}

/// The static pass between parsing and interpretation. Walks the AST once,
/// recording on the interpreter how many enclosing scopes separate each
/// variable reference from the scope that declares it. Running the
/// interpreter without first running this pass degrades every variable
/// lookup to a direct globals lookup — correct for top-level code, wrong for
/// anything nested in a closure.
pub struct Resolver<'i> {
    interpreter: &'i mut Interpreter,
    // Only local block scopes are tracked here; the resolver never looks at
    // the global scope, which is far more dynamic (new globals can appear
    // at any point) and simply resolves unresolved names at globals lookup
    // time.
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    pub had_error: bool,
}

impl<'i> Resolver<'i> {
    pub fn new(interpreter: &'i mut Interpreter) -> Self {
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            had_error: false,
        }
    }

    pub fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, statement: &Stmt) {
        statement.accept(self);
    }

    fn resolve_expr(&mut self, expression: &Expr) {
        expression.accept(self);
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.had_error = true;
        resolution_error(token, message);
    }

    /// Adds the name to the innermost scope, marked "declared but not yet
    /// defined" — this is what lets `visit_variable_expr` catch
    /// `var a = a;`. Redeclaring a name already present in this same scope
    /// is an error; shadowing a name from an *enclosing* scope is fine.
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.had_error = true;
                resolution_error(name, "Already a variable with this name in this scope.");
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Walks scopes from innermost outward. `i` is the number of scopes
    /// between the current one and the one that binds `name`; 0 means the
    /// innermost scope. If no scope contains the name, it's left
    /// unresolved and treated as a global at interpretation time.
    fn resolve_local(&mut self, id: NodeId, name: &Token) {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, i);
                return;
            }
        }
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Stmt], kind: FunctionType) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(body);
        self.end_scope();

        self.current_function = enclosing_function;
    }
}

impl<'i> expr::Visitor<()> for Resolver<'i> {
    fn visit_assign_expr(&mut self, id: NodeId, name: &Token, value: &Expr) {
        self.resolve_expr(value);
        self.resolve_local(id, name);
    }

    fn visit_logical_expr(&mut self, _id: NodeId, left: &Expr, _operator: &Token, right: &Expr) {
        // Static analysis does no short-circuiting, so a logical operator is
        // resolved exactly like any other binary one.
        self.resolve_expr(left);
        self.resolve_expr(right);
    }

    fn visit_binary_expr(&mut self, _id: NodeId, left: &Expr, _operator: &Token, right: &Expr) {
        self.resolve_expr(left);
        self.resolve_expr(right);
    }

    fn visit_unary_expr(&mut self, _id: NodeId, _operator: &Token, right: &Expr) {
        self.resolve_expr(right);
    }

    fn visit_call_expr(&mut self, _id: NodeId, callee: &Expr, _paren: &Token, arguments: &[Expr]) {
        self.resolve_expr(callee);
        for argument in arguments {
            self.resolve_expr(argument);
        }
    }

    fn visit_grouping_expr(&mut self, _id: NodeId, expression: &Expr) {
        self.resolve_expr(expression);
    }

    fn visit_func_expr(&mut self, _id: NodeId, params: &[Token], body: &[Stmt]) {
        self.resolve_function(params, body, FunctionType::Function);
    }

    fn visit_literal_expr(&mut self, _id: NodeId, _value: &LiteralValue) {}

    fn visit_variable_expr(&mut self, id: NodeId, name: &Token) {
        if let Some(scope) = self.scopes.last() {
            if scope.get(&name.lexeme) == Some(&false) {
                self.error(name, "Can't read local variable in its own initializer.");
            }
        }
        self.resolve_local(id, name);
    }
}

impl<'i> stmt::Visitor<()> for Resolver<'i> {
    fn visit_expression_stmt(&mut self, expression: &Expr) {
        self.resolve_expr(expression);
    }

    fn visit_print_stmt(&mut self, expression: &Expr) {
        self.resolve_expr(expression);
    }

    // Splitting declare/define into two steps is what lets `var a = a;`
    // inside a block be caught: `a` is declared (but not yet defined) while
    // its own initializer is resolved.
    fn visit_var_stmt(&mut self, name: &Token, initializer: &Option<Expr>) {
        self.declare(name);
        if let Some(init) = initializer {
            self.resolve_expr(init);
        }
        self.define(name);
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) {
        self.begin_scope();
        self.resolve_stmts(statements);
        self.end_scope();
    }

    fn visit_if_stmt(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        self.resolve_expr(condition);
        self.resolve_stmt(then_branch);
        if let Some(else_stmt) = else_branch {
            self.resolve_stmt(else_stmt);
        }
    }

    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) {
        self.resolve_expr(condition);
        self.resolve_stmt(body);
    }

    // Unlike a variable, a function's name is defined *before* its body is
    // resolved, so it can refer to itself recursively.
    fn visit_function_stmt(&mut self, name: &Token, params: &[Token], body: &[Stmt]) {
        self.declare(name);
        self.define(name);
        self.resolve_function(params, body, FunctionType::Function);
    }

    fn visit_return_stmt(&mut self, keyword: &Token, value: &Option<Expr>) {
        if self.current_function == FunctionType::None {
            self.error(keyword, "Can't return from top-level code.");
        }
        if let Some(return_value) = value {
            self.resolve_expr(return_value);
        }
    }
}
