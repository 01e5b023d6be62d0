use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use lox_interpreter as lox;

use lox::ast_printer::AstPrinter;
use lox::parser::Parser;
use lox::scanner::Scanner;
use lox::session::{Lox, Outcome, Reporter, StderrReporter};

/// Exit code for scan/parse/resolve failures.
const EXIT_COMPILE_ERROR: u8 = 65;
/// Exit code for runtime failures.
const EXIT_RUNTIME_ERROR: u8 = 70;
/// Exit code for command-line misuse.
const EXIT_USAGE: u8 = 64;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Log file written when --log is given
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print each token as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program, or starts a prompt without one
    Run { filename: Option<PathBuf> },

    /// Starts an interactive prompt
    Repl,
}

/// Reads the contents of a file as UTF-8 text.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf)
        .map_err(lox::LoxError::from)
        .context(format!("{:?} is not valid UTF-8", filename))
}

fn init_logger(path: &PathBuf) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            // Strip the crate prefix from the module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("lox_interpreter::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn require(filename: Option<PathBuf>, command: &str) -> std::result::Result<PathBuf, ExitCode> {
    filename.ok_or_else(|| {
        eprintln!("Usage: lox {} <filename>", command);
        ExitCode::from(EXIT_USAGE)
    })
}

fn exit_code(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Completed => ExitCode::SUCCESS,
        Outcome::CompileError => ExitCode::from(EXIT_COMPILE_ERROR),
        Outcome::RuntimeError => ExitCode::from(EXIT_RUNTIME_ERROR),
    }
}

fn tokenize(source: &str, json: bool) -> Result<ExitCode> {
    let mut tokenized = true;

    for result in Scanner::new(source) {
        match result {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),

            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                debug!("Tokenization error: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_COMPILE_ERROR)
    })
}

fn parse(source: &str) -> ExitCode {
    let (tokens, lex_errors) = lox::scanner::scan_tokens(source);
    let mut reporter = StderrReporter;

    for e in &lex_errors {
        reporter.error(e.line().unwrap_or(0), "", &e.message());
    }

    match Parser::new(tokens).parse_expression() {
        Ok(expr) if lex_errors.is_empty() => {
            let ast_str = AstPrinter::print(&expr);
            debug!("AST: {}", ast_str);
            println!("{}", ast_str);
            ExitCode::SUCCESS
        }

        Ok(_) => ExitCode::from(EXIT_COMPILE_ERROR),

        Err(errors) => {
            for e in errors {
                eprintln!("{}", e);
            }
            ExitCode::from(EXIT_COMPILE_ERROR)
        }
    }
}

fn evaluate(source: &str) -> ExitCode {
    let mut session = Lox::new();

    match session.evaluate(source) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(outcome) => exit_code(outcome),
    }
}

fn repl() -> Result<ExitCode> {
    info!("Starting prompt");

    let mut session = Lox::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let outcome = session.run(&line);
        debug!("Prompt line finished: {:?}", outcome);
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        // Minimal logger so log macros have somewhere to go
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match args.commands {
        Commands::Tokenize { filename, json } => match require(filename, "tokenize") {
            Ok(path) => tokenize(&read_file(&path)?, json)?,
            Err(code) => code,
        },

        Commands::Parse { filename } => match require(filename, "parse") {
            Ok(path) => parse(&read_file(&path)?),
            Err(code) => code,
        },

        Commands::Evaluate { filename } => match require(filename, "evaluate") {
            Ok(path) => evaluate(&read_file(&path)?),
            Err(code) => code,
        },

        Commands::Run {
            filename: Some(path),
        } => {
            let source = read_file(&path)?;
            info!("Running {:?}", path);
            exit_code(Lox::new().run(&source))
        }

        Commands::Run { filename: None } | Commands::Repl => repl()?,
    };

    Ok(code)
}
