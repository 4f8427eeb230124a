use crate::object::Value;
use crate::token::{Token, TokenType};

/// All errors the pipeline can produce. `Return` is a control-flow signal
/// threaded through the interpreter's `Result` chain rather than a genuine
/// failure; it must be caught exactly at the call site that created the
/// function activation (see `function::Function::call`) and never escapes
/// to `main`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("[line {line}] Error: {message}")]
    Lex { line: i32, message: String },

    /// The top-level parse failed; a message was already reported to
    /// stderr at the point of failure (see `parser_error`), so this variant
    /// carries no payload.
    #[error("parse error")]
    Parse,

    #[error("[line {}] Error: {message}", token.line)]
    Resolution { token: Token, message: String },

    #[error("{message}\n[line {}]", token.line)]
    Runtime { token: Token, message: String },

    /// Not a user-visible error: unwinds the call stack back to the
    /// function activation that should receive this value.
    #[error("return is not an error")]
    Return { value: Value },
}

pub fn report(line: i32, location: &str, message: &str) {
    eprintln!("[line {line}] Error{location}: {message}");
}

pub fn parser_error(token: &Token, message: &str) {
    if token.token_type == TokenType::Eof {
        report(token.line, " at end", message);
    } else {
        report(token.line, &format!(" at '{}'", token.lexeme), message);
    }
}

pub fn resolution_error(token: &Token, message: &str) {
    parser_error(token, message);
}
