//! One interpreter session: scan → parse → resolve → interpret, with
//! compile errors gating execution.
//!
//! The session replaces process-wide "had error" flags: it owns the
//! interpreter (and therefore the global frame), the diagnostic sink, and the
//! node-id counter that keeps resolver entries from separate runs apart.
//! Reusing one session across runs gives REPL semantics.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::value::Value;

/// Where diagnostics go.  The session calls it; it never decides exit codes.
pub trait Reporter {
    /// A scan, parse or resolve error.  `location` is `""`, `" at end"` or
    /// `" at 'lexeme'"`.
    fn error(&mut self, line: usize, location: &str, message: &str);

    fn runtime_error(&mut self, message: &str, line: usize);
}

/// Writes diagnostics to standard error in the classic Lox format.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn error(&mut self, line: usize, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
    }

    fn runtime_error(&mut self, message: &str, line: usize) {
        eprintln!("{}\n[line {}]", message, line);
    }
}

/// In-memory `Write` sink whose clones share one buffer, so output can be
/// read back after handing a clone to the interpreter.
#[derive(Debug, Default, Clone)]
pub struct OutputBuffer(Rc<RefCell<Vec<u8>>>);

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// How a single [`Lox::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Scan, parse or resolve errors; nothing was executed.
    CompileError,
    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

pub struct Lox<R: Reporter = StderrReporter> {
    interpreter: Interpreter,
    reporter: R,
    next_expr_id: usize,
    had_error: bool,
    had_runtime_error: bool,
}

impl Default for Lox<StderrReporter> {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox<StderrReporter> {
    /// Session reporting to stderr and printing to stdout.
    pub fn new() -> Self {
        Self::with_reporter(StderrReporter, Box::new(io::stdout()))
    }
}

impl<R: Reporter> Lox<R> {
    pub fn with_reporter(reporter: R, output: Box<dyn Write>) -> Self {
        info!("Lox session created");

        Self {
            interpreter: Interpreter::with_output(output),
            reporter,
            next_expr_id: 0,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Did the last run hit a scan, parse or resolve error?
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Did the last run hit a runtime error?
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Run one program.  Globals defined by earlier runs stay visible.
    pub fn run(&mut self, source: &str) -> Outcome {
        self.had_error = false;
        self.had_runtime_error = false;

        let (tokens, lex_errors) = scan_tokens(source);
        self.report_all(&lex_errors);

        // Parse even after lexical errors so syntax errors are reported too.
        let mut parser = Parser::with_first_id(tokens, self.next_expr_id);
        let parsed = parser.parse();
        self.next_expr_id = parser.next_id();

        let statements = match parsed {
            Ok(statements) => statements,
            Err(errors) => {
                self.report_all(&errors);
                return Outcome::CompileError;
            }
        };

        if self.had_error {
            return Outcome::CompileError;
        }

        let locals = match Resolver::new().resolve(&statements) {
            Ok(locals) => locals,
            Err(errors) => {
                self.report_all(&errors);
                return Outcome::CompileError;
            }
        };

        self.interpreter.resolve(locals);

        match self.interpreter.interpret(&statements) {
            Ok(()) => Outcome::Completed,
            Err(e) => {
                self.report(&e);
                Outcome::RuntimeError
            }
        }
    }

    /// Parse `source` as one expression and evaluate it against the
    /// session's globals.
    pub fn evaluate(&mut self, source: &str) -> Result<Value, Outcome> {
        self.had_error = false;
        self.had_runtime_error = false;

        let (tokens, lex_errors) = scan_tokens(source);
        self.report_all(&lex_errors);

        let mut parser = Parser::with_first_id(tokens, self.next_expr_id);
        let parsed = parser.parse_expression();
        self.next_expr_id = parser.next_id();

        let expr = match parsed {
            Ok(expr) if !self.had_error => expr,
            Ok(_) => return Err(Outcome::CompileError),
            Err(errors) => {
                self.report_all(&errors);
                return Err(Outcome::CompileError);
            }
        };

        // A lone expression opens no scope, so every name in it is global.
        self.interpreter.evaluate(&expr).map_err(|e| {
            self.report(&e);
            Outcome::RuntimeError
        })
    }

    fn report_all(&mut self, errors: &[LoxError]) {
        for error in errors {
            self.report(error);
        }
    }

    fn report(&mut self, error: &LoxError) {
        debug!("Reporting: {}", error);

        let line: usize = error.line().unwrap_or(0);

        if error.is_compile_error() {
            self.had_error = true;

            let location: &str = match error {
                LoxError::Parse { location, .. } | LoxError::Resolve { location, .. } => {
                    location.as_str()
                }
                _ => "",
            };
            self.reporter.error(line, location, &error.message());
        } else {
            self.had_runtime_error = true;
            self.reporter.runtime_error(&error.message(), line);
        }
    }
}
