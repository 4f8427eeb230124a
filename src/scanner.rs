// A lexeme is the raw sequence of characters in the source code that represents a meaningful unit
// A token is a categorized representation of a lexeme, pairing it with its type

use crate::error::Error;
use crate::token::{Token, TokenType, KEYWORDS};

pub struct Scanner {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: i32,
}

impl Scanner {
    pub fn new(source: String) -> Self {
        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, Error> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(TokenType::Eof, "", self.line));
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), Error> {
        let c: char = self.advance();
        match c {
            // single char
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),

            // can be double char
            '!' => {
                let kind = if self.r#match('=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.r#match('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.r#match('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.r#match('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(kind);
            }

            // can be a line comment, a block comment, or division
            '/' => {
                if self.r#match('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.r#match('*') {
                    self.block_comment()?;
                } else {
                    self.add_token(TokenType::Slash);
                }
            }

            // ignore whitespace
            ' ' | '\t' | '\r' => (),

            // handle new line
            '\n' => {
                self.line += 1;
            }

            '"' => self.string()?,

            c => {
                if c.is_ascii_digit() {
                    self.number();
                } else if c.is_alphabetic() || c == '_' {
                    self.identifier();
                } else {
                    return Err(Error::Lex {
                        line: self.line,
                        message: "Unexpected character.".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    // block comments don't nest: the first `*/` closes the comment, no
    // matter how many `/*` preceded it.
    fn block_comment(&mut self) -> Result<(), Error> {
        while !(self.peek() == '*' && self.peek_next() == '/') && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::Lex {
                line: self.line,
                message: "Unterminated block comment.".to_string(),
            });
        }

        // consume the closing "*/"
        self.advance();
        self.advance();
        Ok(())
    }

    // consume characters until we reach the closing "
    fn string(&mut self) -> Result<(), Error> {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::Lex {
                line: self.line,
                message: "Unterminated string.".to_string(),
            });
        }

        // the closing "
        self.advance();

        // trim the surrounding quotes; the lexeme is the string's content
        let literal: String = self.source[(self.start + 1)..(self.current - 1)]
            .iter()
            .collect();
        self.tokens
            .push(Token::new(TokenType::String, literal, self.line));
        Ok(())
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // consume the fractional part, if any
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.add_token(TokenType::Number);
    }

    // Digits are deliberately not part of identifiers in this dialect, even
    // after the first character: `foo1` scans as `foo` followed by `1`.
    fn identifier(&mut self) {
        while self.peek().is_alphabetic() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let token_type = KEYWORDS
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);
        self.add_token(token_type);
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    // it's like advance but doesn't consume the next character
    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(token_type, text, self.line));
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    // we only consume the current character if that is what we are looking for
    fn r#match(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<TokenType> {
        Scanner::new(source.to_string())
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn single_char_tokens() {
        assert_eq!(
            scan("(){}"),
            vec![
                TokenType::LeftParen,
                TokenType::RightParen,
                TokenType::LeftBrace,
                TokenType::RightBrace,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_prefer_longest_match() {
        assert_eq!(
            scan("!= == <= >= ! = < >"),
            vec![
                TokenType::BangEqual,
                TokenType::EqualEqual,
                TokenType::LessEqual,
                TokenType::GreaterEqual,
                TokenType::Bang,
                TokenType::Equal,
                TokenType::Less,
                TokenType::Greater,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_is_skipped() {
        assert_eq!(scan("1 // a comment\n2"), scan("1\n2"));
    }

    #[test]
    fn block_comment_does_not_nest() {
        // the first `*/` closes the comment; the trailing `*/` is dangling
        // and should scan as two more tokens, not be swallowed.
        let tokens = scan("/* /* nested */ */ 1");
        assert_eq!(
            tokens,
            vec![
                TokenType::Star,
                TokenType::Slash,
                TokenType::Number,
                TokenType::Eof
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_is_fatal() {
        let err = Scanner::new("/* never closed".to_string()).scan_tokens();
        assert!(matches!(err, Err(Error::Lex { .. })));
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = Scanner::new("\"never closed".to_string()).scan_tokens();
        assert!(matches!(err, Err(Error::Lex { .. })));
    }

    #[test]
    fn string_lexeme_strips_quotes() {
        let tokens = Scanner::new("\"hi\"".to_string()).scan_tokens().unwrap();
        assert_eq!(tokens[0].lexeme, "hi");
    }

    #[test]
    fn identifiers_stop_at_digits() {
        let tokens = Scanner::new("foo1".to_string()).scan_tokens().unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            kinds,
            vec![TokenType::Identifier, TokenType::Number, TokenType::Eof]
        );
        assert_eq!(tokens[0].lexeme, "foo");
        assert_eq!(tokens[1].lexeme, "1");
    }

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(
            scan("var while fun"),
            vec![TokenType::Var, TokenType::While, TokenType::Fun, TokenType::Eof]
        );
    }

    #[test]
    fn newlines_increment_line_number() {
        let tokens = Scanner::new("1\n\n2".to_string()).scan_tokens().unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 3);
    }
}
