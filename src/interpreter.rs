//! Tree‑walking evaluator.
//!
//! Statements execute against a chain of [`Environment`] frames rooted at a
//! process‑lifetime global frame.  Variable nodes the resolver recorded are
//! looked up by distance; all others go straight to the globals.  `return`
//! travels back to the call site as [`Flow::Return`], not as an error.

use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{natives, Callable, LoxFunction};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fell through to the next statement.
    Normal,
    /// A `return` is unwinding to the nearest call.
    Return(Value),
}

/// Strategy for variables the resolver recorded a distance for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(test), allow(dead_code))]
enum Lookup {
    /// Walk exactly the recorded number of frames.
    Resolved,
    /// Ignore the distance and search the chain outward.
    Dynamic,
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    out: Box<dyn Write>,
    lookup: Lookup,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter whose `print` statements write to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().shared();

        for native in natives() {
            debug!("Defining native function '{}'", native.name());
            let name: String = native.name().to_string();
            globals
                .borrow_mut()
                .define(&name, Value::Callable(Rc::new(native)));
        }

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            out,
            lookup: Lookup::Resolved,
        }
    }

    #[cfg(test)]
    fn with_dynamic_lookup(out: Box<dyn Write>) -> Self {
        Self {
            lookup: Lookup::Dynamic,
            ..Self::with_output(out)
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Merge a resolver side table into the one this interpreter consults.
    /// Entries from earlier programs are kept: closures defined by them may
    /// still run.  Nothing is ever pruned, so a long REPL session grows the
    /// table by one entry per resolved local reference on every line.
    pub fn resolve(&mut self, locals: Locals) {
        debug!("Recording {} resolved binding(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Execute a program.  The first runtime error aborts the remaining
    /// statements; global state stays usable for the next call.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                self.environment = Rc::clone(&self.globals);
                debug!("Runtime error: {}", e);
                return Err(e);
            }
        }

        self.out.flush()?;
        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, frame.shared())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let flow @ Flow::Return(_) = self.execute(body)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment));
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Callable(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }
        }
    }

    /// Run `statements` with `frame` as the current scope, restoring the
    /// previous scope afterwards whether or not execution succeeded.
    pub fn execute_block(&mut self, statements: &[Stmt], frame: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, frame);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let flow @ Flow::Return(_) = self.execute(stmt)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;
                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) if self.lookup == Lookup::Resolved => {
                        Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        )?;
                    }
                    Some(_) => self.environment.borrow_mut().assign(name, value.clone())?,
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                debug!("Assigned {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                let Value::Callable(function) = callee else {
                    return Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                if args.len() != function.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            function.arity(),
                            args.len()
                        ),
                    ));
                }

                debug!("Calling '{}' with {} argument(s)", function.name(), args.len());
                function.call(self, args)
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => match self.lookup {
                Lookup::Resolved => Environment::get_at(&self.environment, distance, &name.lexeme),
                Lookup::Dynamic => self.environment.borrow().get(name),
            },
            None => self.globals.borrow().get(name),
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => {
            debug!(
                "'{}' on {} and {}",
                operator.lexeme,
                left.type_name(),
                right.type_name()
            );
            Err(LoxError::runtime(operator, "Operands must be numbers."))
        }
    }
}

/// Strict binary operators.  Division follows IEEE‑754, so `1 / 0` is `inf`.
fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    let value = match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::String(a), Value::String(b)) => Value::from(format!("{}{}", a, b)),
            (left, right) => {
                debug!("'+' on {} and {}", left.type_name(), right.type_name());
                return Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                ));
            }
        },

        TokenType::EQUAL_EQUAL => Value::Bool(left == right),
        TokenType::BANG_EQUAL => Value::Bool(left != right),

        _ => {
            let (a, b) = number_operands(operator, &left, &right)?;

            match operator.token_type {
                TokenType::MINUS => Value::Number(a - b),
                TokenType::STAR => Value::Number(a * b),
                TokenType::SLASH => Value::Number(a / b),
                TokenType::GREATER => Value::Bool(a > b),
                TokenType::GREATER_EQUAL => Value::Bool(a >= b),
                TokenType::LESS => Value::Bool(a < b),
                TokenType::LESS_EQUAL => Value::Bool(a <= b),
                _ => return Err(LoxError::runtime(operator, "Invalid binary operator.")),
            }
        }
    };

    Ok(value)
}
