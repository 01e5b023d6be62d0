pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod token;
pub mod value;

pub use error::{LoxError, Result};
pub use session::{Lox, Outcome, Reporter};
