use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Error;
use crate::object::Value;
use crate::token::Token;

/// A chain of scope frames, rooted at the globals frame. Shared via `Rc`
/// because closures capture a handle to the frame active at their creation,
/// and that frame may outlive the block or call that introduced it.
pub type EnvHandle = Rc<RefCell<Environment>>;

pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvHandle>,
}

impl Environment {
    pub fn new_global() -> EnvHandle {
        Rc::new(RefCell::new(Self {
            values: HashMap::new(),
            enclosing: None,
        }))
    }

    pub fn with_enclosing(enclosing: &EnvHandle) -> EnvHandle {
        Rc::new(RefCell::new(Self {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    /// Shadowing and redefinition within the same frame are both permitted.
    pub fn define(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, Error> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }
        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => Err(undefined(name)),
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), Error> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }
        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &Token) -> Error {
    Error::Runtime {
        token: name.clone(),
        message: format!("Undefined variable '{}'.", name.lexeme),
    }
}

/// Follows `enclosing` links `distance` times. The resolver guarantees the
/// chain is always at least that long at every call site that uses this, so
/// a shorter chain indicates a resolver bug rather than a recoverable
/// runtime condition.
pub fn ancestor(env: &EnvHandle, distance: usize) -> EnvHandle {
    let mut current = Rc::clone(env);
    for _ in 0..distance {
        let next = current
            .borrow()
            .enclosing
            .clone()
            .expect("resolver-recorded depth exceeds environment chain length");
        current = next;
    }
    current
}

pub fn get_at(env: &EnvHandle, distance: usize, name: &Token) -> Result<Value, Error> {
    let frame = ancestor(env, distance);
    let value = frame.borrow().values.get(&name.lexeme).cloned();
    value.ok_or_else(|| undefined(name))
}

pub fn assign_at(env: &EnvHandle, distance: usize, name: &Token, value: Value) -> Result<(), Error> {
    let frame = ancestor(env, distance);
    frame.borrow_mut().values.insert(name.lexeme.clone(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn tok(name: &str) -> Token {
        Token::new(TokenType::Identifier, name, 1)
    }

    #[test]
    fn get_walks_enclosing_chain() {
        let global = Environment::new_global();
        global.borrow_mut().define("a".to_string(), Value::Number(1.0));
        let block = Environment::with_enclosing(&global);
        assert!(matches!(block.borrow().get(&tok("a")), Ok(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn assign_updates_defining_frame_not_a_shadow() {
        let global = Environment::new_global();
        global.borrow_mut().define("a".to_string(), Value::Number(1.0));
        let block = Environment::with_enclosing(&global);
        block.borrow_mut().assign(&tok("a"), Value::Number(2.0)).unwrap();
        assert!(matches!(global.borrow().get(&tok("a")), Ok(Value::Number(n)) if n == 2.0));
    }

    #[test]
    fn undefined_get_is_an_error() {
        let global = Environment::new_global();
        assert!(global.borrow().get(&tok("nope")).is_err());
    }

    #[test]
    fn get_at_skips_the_walk() {
        let global = Environment::new_global();
        global.borrow_mut().define("a".to_string(), Value::Number(5.0));
        let block = Environment::with_enclosing(&global);
        let inner = Environment::with_enclosing(&block);
        assert!(matches!(get_at(&inner, 2, &tok("a")), Ok(Value::Number(n)) if n == 5.0));
    }
}
