//! Function values: the [`Callable`] trait and its two implementations.

use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::Result;
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

/// Anything that can appear on the left of `( … )`.
pub trait Callable: fmt::Display {
    fn name(&self) -> &str;

    /// Exact number of arguments the call site must supply.
    fn arity(&self) -> usize;

    /// Invoke with already evaluated, arity-checked arguments.
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value>;
}

/// A user-defined function paired with the frame it was declared in.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef) -> Self {
        Self {
            declaration,
            closure,
        }
    }
}

impl Callable for LoxFunction {
    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        let mut frame = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            debug!("Binding parameter '{}' to {}", param.lexeme, argument);
            frame.define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, frame.shared())? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

/// Signature of a host-provided function body.
pub type NativeFn = fn(&[Value]) -> Result<Value>;

/// A function implemented in Rust and seeded into the global frame.
pub struct NativeFunction {
    name: &'static str,
    arity: usize,
    func: NativeFn,
}

impl NativeFunction {
    pub const fn new(name: &'static str, arity: usize, func: NativeFn) -> Self {
        Self { name, arity, func }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);
        (self.func)(&arguments)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}

/// `clock()` – seconds since the Unix epoch.
fn clock(_args: &[Value]) -> Result<Value> {
    let seconds: f64 = Utc::now().timestamp_millis() as f64 / 1000.0;
    Ok(Value::Number(seconds))
}

/// Functions every fresh global frame starts with.
pub fn natives() -> Vec<NativeFunction> {
    vec![NativeFunction::new("clock", 0, clock)]
}
