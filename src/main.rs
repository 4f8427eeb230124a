use std::fs;
use std::io::{self, BufRead, Write};
use std::process::exit;

use clap::Parser as ClapParser;

use loxide::ast_printer::AstPrinter;
use loxide::error::Error;
use loxide::interpreter::Interpreter;
use loxide::parser::Parser;
use loxide::resolver::Resolver;
use loxide::scanner::Scanner;
use loxide::syntax::Stmt;

/// A tree-walking interpreter for a small dynamically-typed scripting
/// language. Run with a script path to execute a file, or with none to open
/// a REPL.
#[derive(ClapParser)]
#[command(name = "loxide", version, about)]
struct Cli {
    /// Script to run. Omit to start an interactive prompt.
    script: Option<String>,

    /// Print the parsed AST of each top-level expression statement to
    /// stderr before interpreting.
    #[arg(long)]
    ast: bool,
}

struct Lox {
    interpreter: Interpreter,
    print_ast: bool,
}

impl Lox {
    fn new(print_ast: bool) -> Self {
        Lox {
            interpreter: Interpreter::new(),
            print_ast,
        }
    }

    fn run_file(&mut self, path: &str) -> Result<(), Error> {
        let contents = fs::read_to_string(path)?;
        self.run(contents)
    }

    fn run_prompt(&mut self) -> Result<(), Error> {
        let stdin = io::stdin();
        print!("> ");
        io::stdout().flush()?;
        for line in stdin.lock().lines() {
            // Parse/lex/resolution errors on one line shouldn't kill the
            // session — only surface them and keep prompting.
            if let Err(err) = self.run(line?) {
                match err {
                    Error::Return { .. } => unreachable!("a top-level return is rejected by the resolver"),
                    _ => eprintln!("{err}"),
                }
            }
            print!("> ");
            io::stdout().flush()?;
        }
        Ok(())
    }

    fn run(&mut self, source: String) -> Result<(), Error> {
        log::debug!("scanning {} bytes of source", source.len());
        let tokens = Scanner::new(source).scan_tokens()?;

        let mut parser = Parser::new(&tokens);
        let statements = parser.parse()?;

        // A parse error already aborted above via `?`, so by this point the
        // syntax is clean and worth resolving.
        let mut resolver = Resolver::new(&mut self.interpreter);
        resolver.resolve_stmts(&statements);
        if resolver.had_error {
            return Err(Error::Parse);
        }

        if self.print_ast {
            let mut printer = AstPrinter;
            for statement in &statements {
                if let Stmt::Expression { expression } = statement {
                    eprintln!("{}", printer.print(expression));
                }
            }
        }

        self.interpreter.interpret(&statements)
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut lox = Lox::new(cli.ast);

    match cli.script {
        Some(path) => match lox.run_file(&path) {
            Ok(()) => (),
            Err(Error::Runtime { .. }) => exit(70),
            Err(Error::Return { .. }) => unreachable!("a top-level return is rejected by the resolver"),
            Err(Error::Parse) | Err(Error::Lex { .. }) | Err(Error::Resolution { .. }) => exit(65),
            Err(Error::Io(err)) => {
                eprintln!("{err}");
                exit(74)
            }
        },
        None => {
            if let Err(err) = lox.run_prompt() {
                eprintln!("{err}");
                exit(74)
            }
        }
    }
}
