pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod syntax;
pub mod token;

use std::cell::RefCell;
use std::rc::Rc;

use error::Error;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Runs a complete program through the full scanner -> parser -> resolver
/// -> interpreter pipeline against a fresh interpreter. Exists mainly so
/// integration tests don't have to re-assemble the pipeline by hand.
pub fn run(source: &str) -> Result<(), Error> {
    let mut interpreter = Interpreter::new();
    run_with(&mut interpreter, source)
}

/// Runs a program and returns everything it printed, for tests that want
/// to assert on `print` output without spawning the CLI binary.
pub fn run_capturing(source: &str) -> Result<String, Error> {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let mut interpreter = Interpreter::with_output(buffer.clone());
    run_with(&mut interpreter, source)?;
    Ok(String::from_utf8(buffer.borrow().clone()).expect("print only ever writes UTF-8 text"))
}

/// Same pipeline, reusing a caller-supplied interpreter so state (globals,
/// closures) persists across calls, the way a REPL session does.
pub fn run_with(interpreter: &mut Interpreter, source: &str) -> Result<(), Error> {
    let tokens = Scanner::new(source.to_string()).scan_tokens()?;
    let mut parser = Parser::new(&tokens);
    let statements = parser.parse()?;

    let mut resolver = Resolver::new(interpreter);
    resolver.resolve_stmts(&statements);
    if resolver.had_error {
        return Err(Error::Parse);
    }

    interpreter.interpret(&statements)
}
