use crate::environment::{Environment, EnvHandle};
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::object::Value;
use crate::syntax::Stmt;
use crate::token::Token;

use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum Function {
    /// Functions the interpreter exposes to user code but that are
    /// implemented in the host language (FFI, of a sort — see `clock`).
    Native {
        name: &'static str,
        arity: usize,
        body: fn(&[Value]) -> Value,
    },

    /// A closure: the function's parameters and body, plus a handle to the
    /// environment that was active when the function was declared (named)
    /// or the literal was evaluated (anonymous).
    User {
        name: Option<Token>,
        params: Vec<Token>,
        body: Rc<Vec<Stmt>>,
        closure: EnvHandle,
    },
}

impl Function {
    /// Invokes the callable. `arguments` has already been evaluated
    /// left-to-right and arity-checked by the caller.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value, Error> {
        match self {
            Function::Native { body, .. } => Ok(body(arguments)),
            Function::User { params, body, closure, .. } => {
                // Each call gets its own environment nested in the closure,
                // not in whatever environment is active at the call site —
                // otherwise recursive and re-entrant calls would clobber
                // each other's parameter bindings.
                let environment = Environment::with_enclosing(closure);
                for (param, argument) in params.iter().zip(arguments.iter()) {
                    environment
                        .borrow_mut()
                        .define(param.lexeme.clone(), argument.clone());
                }
                match interpreter.execute_block(body, environment) {
                    Err(Error::Return { value }) => Ok(value),
                    Err(other) => Err(other),
                    Ok(()) => Ok(Value::Nil),
                }
            }
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Native { arity, .. } => *arity,
            Function::User { params, .. } => params.len(),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native { name, .. } => write!(f, "<native fun {name}>"),
            Function::User { name: Some(name), .. } => write!(f, "<fun {}>", name.lexeme),
            Function::User { name: None, .. } => write!(f, "<anonymous fun>"),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn display_form_distinguishes_named_anonymous_and_native() {
        let named = Function::User {
            name: Some(Token::new(TokenType::Identifier, "inc", 1)),
            params: vec![],
            body: Rc::new(vec![]),
            closure: Environment::new_global(),
        };
        assert_eq!(named.to_string(), "<fun inc>");

        let anon = Function::User {
            name: None,
            params: vec![],
            body: Rc::new(vec![]),
            closure: Environment::new_global(),
        };
        assert_eq!(anon.to_string(), "<anonymous fun>");

        let native = Function::Native {
            name: "clock",
            arity: 0,
            body: |_| Value::Nil,
        };
        assert_eq!(native.to_string(), "<native fun clock>");
    }

    #[test]
    fn arity_reflects_param_count() {
        let f = Function::User {
            name: None,
            params: vec![
                Token::new(TokenType::Identifier, "a", 1),
                Token::new(TokenType::Identifier, "b", 1),
            ],
            body: Rc::new(vec![]),
            closure: Environment::new_global(),
        };
        assert_eq!(f.arity(), 2);
    }
}
