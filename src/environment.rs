//! Runtime scope frames.
//!
//! A frame is shared (`Rc<RefCell<_>>`) between the interpreter while it runs
//! inside it and every closure created there.  Links only point outward, from
//! a frame to its enclosing frame.

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root frame with no enclosing scope.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a frame in a shared handle.
    pub fn shared(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this frame, overwriting any previous binding.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}'", name);
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup: this frame, then each enclosing frame in turn.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Dynamic assignment to the nearest frame that already binds `name`.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The frame exactly `distance` links out from `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut frame: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef = frame.borrow().enclosing.clone()?;
            frame = next;
        }

        Some(frame)
    }

    /// Resolved lookup.  A miss means the resolver and the runtime disagree.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Result<Value> {
        Self::ancestor(env, distance)
            .and_then(|frame| {
                let value = frame.borrow().values.get(name).cloned();
                value
            })
            .ok_or_else(|| unresolved(distance, name))
    }

    /// Resolved assignment; same invariant as [`Environment::get_at`].
    pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> Result<()> {
        let frame: EnvRef =
            Self::ancestor(env, distance).ok_or_else(|| unresolved(distance, name))?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(unresolved(distance, name)),
        }
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

fn unresolved(distance: usize, name: &str) -> LoxError {
    LoxError::Internal(format!(
        "no binding for '{}' at resolved distance {}",
        name, distance
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 7)
    }

    #[test]
    fn redefinition_overwrites() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.define("a", Value::Number(2.0));

        assert_eq!(env.get(&ident("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn dynamic_lookup_walks_outward() {
        let global = Environment::new().shared();
        global.borrow_mut().define("g", Value::Bool(true));
        let inner = Environment::with_enclosing(Rc::clone(&global)).shared();

        assert_eq!(inner.borrow().get(&ident("g")).unwrap(), Value::Bool(true));

        inner
            .borrow_mut()
            .assign(&ident("g"), Value::Bool(false))
            .unwrap();
        assert_eq!(global.borrow().get(&ident("g")).unwrap(), Value::Bool(false));
    }

    #[test]
    fn undefined_variable_reports_token_line() {
        let env = Environment::new();
        let err = env.get(&ident("missing")).unwrap_err();

        assert_eq!(err.line(), Some(7));
        assert_eq!(err.message(), "Undefined variable 'missing'.");

        let mut env = Environment::new();
        assert!(env.assign(&ident("missing"), Value::Nil).is_err());
    }

    #[test]
    fn distance_lookup_skips_shadowing_frames() {
        let outer = Environment::new().shared();
        outer.borrow_mut().define("x", Value::Number(1.0));
        let middle = Environment::with_enclosing(Rc::clone(&outer)).shared();
        middle.borrow_mut().define("x", Value::Number(2.0));
        let inner = Environment::with_enclosing(Rc::clone(&middle)).shared();

        assert_eq!(Environment::get_at(&inner, 2, "x").unwrap(), Value::Number(1.0));
        assert_eq!(Environment::get_at(&inner, 1, "x").unwrap(), Value::Number(2.0));

        Environment::assign_at(&inner, 2, "x", Value::Number(3.0)).unwrap();
        assert_eq!(outer.borrow().get(&ident("x")).unwrap(), Value::Number(3.0));
        assert_eq!(middle.borrow().get(&ident("x")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn distance_miss_is_internal_error() {
        let env = Environment::new().shared();

        assert!(matches!(
            Environment::get_at(&env, 0, "nope"),
            Err(LoxError::Internal(_))
        ));
        assert!(matches!(
            Environment::get_at(&env, 3, "nope"),
            Err(LoxError::Internal(_))
        ));
    }
}
