#![allow(dead_code)]

use lox_interpreter as lox;

use lox::session::{Lox, OutputBuffer, Outcome, Reporter};

/// Reporter that keeps every diagnostic as a formatted line.
#[derive(Debug, Default)]
pub struct Collected {
    pub errors: Vec<String>,
    pub runtime_errors: Vec<String>,
}

impl Reporter for Collected {
    fn error(&mut self, line: usize, location: &str, message: &str) {
        self.errors
            .push(format!("[line {}] Error{}: {}", line, location, message));
    }

    fn runtime_error(&mut self, message: &str, line: usize) {
        self.runtime_errors
            .push(format!("{}\n[line {}]", message, line));
    }
}

/// A session wired to an in-memory output buffer and a collecting reporter.
pub fn session() -> (Lox<Collected>, OutputBuffer) {
    let buffer = OutputBuffer::new();
    let session = Lox::with_reporter(Collected::default(), Box::new(buffer.clone()));
    (session, buffer)
}

/// Run `source` in a fresh session.
pub fn run(source: &str) -> (Outcome, String, Lox<Collected>) {
    let (mut session, buffer) = session();
    let outcome = session.run(source);
    (outcome, buffer.contents(), session)
}

/// Run `source` and return stdout, panicking on any diagnostic.
pub fn output(source: &str) -> String {
    let (outcome, out, session) = run(source);
    assert_eq!(
        outcome,
        Outcome::Completed,
        "diagnostics: {:?}",
        session.reporter()
    );
    out
}
