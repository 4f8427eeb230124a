use crate::error::{parser_error, Error};
use crate::syntax::{Expr, LiteralValue, NodeId, Stmt};
use crate::token::{Token, TokenType};

pub struct Parser<'t> {
    tokens: &'t [Token],
    current: usize,
    next_id: NodeId,
}

macro_rules! matches_any {
    ( $sel:ident, $( $x:expr ),* ) => {
        {
            if $( $sel.check($x) )||* {
                $sel.advance();
                true
            } else {
                false
            }
        }
    };
}

impl<'t> Parser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            current: 0,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // program → declaration* EOF
    pub fn parse(&mut self) -> Result<Vec<Stmt>, Error> {
        let mut statements: Vec<Stmt> = Vec::new();
        while !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        Ok(statements)
    }

    // declaration → funDecl | varDecl | statement
    fn declaration(&mut self) -> Result<Stmt, Error> {
        if matches_any!(self, TokenType::Fun) {
            self.function("function")
        } else if matches_any!(self, TokenType::Var) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    // funDecl → "fun" IDENT "(" params? ")" block
    fn function(&mut self, kind: &str) -> Result<Stmt, Error> {
        let name = self.consume(TokenType::Identifier, &format!("Expect {kind} name."))?;
        let (params, body) = self.function_tail(kind)?;
        Ok(Stmt::Function { name, params, body })
    }

    // Shared between named function declarations and anonymous function
    // literals: everything after the (optional) name.
    fn function_tail(&mut self, kind: &str) -> Result<(Vec<Token>, Vec<Stmt>), Error> {
        self.consume(TokenType::LeftParen, &format!("Expect '(' after {kind} name."))?;
        let mut params: Vec<Token> = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                if params.len() >= 255 {
                    return Err(self.error(self.peek(), "Can't have more than 255 parameters."));
                }
                params.push(self.consume(TokenType::Identifier, "Expect parameter name.")?);
                if !matches_any!(self, TokenType::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenType::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;
        Ok((params, body))
    }

    // varDecl → "var" IDENT ( "=" expression )? ";"
    fn var_declaration(&mut self) -> Result<Stmt, Error> {
        let name = self.consume(TokenType::Identifier, "Expect variable name.")?;
        let initializer = if matches_any!(self, TokenType::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    // statement → returnStmt | forStmt | whileStmt | ifStmt | printStmt | block | exprStmt
    fn statement(&mut self) -> Result<Stmt, Error> {
        if matches_any!(self, TokenType::Return) {
            self.return_statement()
        } else if matches_any!(self, TokenType::For) {
            self.for_statement()
        } else if matches_any!(self, TokenType::While) {
            self.while_statement()
        } else if matches_any!(self, TokenType::If) {
            self.if_statement()
        } else if matches_any!(self, TokenType::Print) {
            self.print_statement()
        } else if matches_any!(self, TokenType::LeftBrace) {
            Ok(Stmt::Block {
                statements: self.block()?,
            })
        } else {
            self.expression_statement()
        }
    }

    // returnStmt → "return" expression? ";"
    fn return_statement(&mut self) -> Result<Stmt, Error> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenType::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    // ifStmt → "if" "(" expression ")" statement ( "else" statement )?
    // the else is bound to the nearest preceding if, same as the grammar's
    // right-recursion into `statement` suggests.
    fn if_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if matches_any!(self, TokenType::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    // block → "{" declaration* "}"
    fn block(&mut self) -> Result<Vec<Stmt>, Error> {
        let mut statements: Vec<Stmt> = Vec::new();
        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.consume(TokenType::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    // whileStmt → "while" "(" expression ")" statement
    fn while_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expect ')' after condition.")?;
        let body = self.statement()?;

        Ok(Stmt::While {
            condition,
            body: Box::new(body),
        })
    }

    // forStmt → "for" "(" (varDecl | exprStmt | ";") expression? ";" expression? ")" statement
    //
    // Desugared on the spot into a Block wrapping a While: there is no
    // dedicated `Stmt::For` variant, so by the time the resolver or
    // interpreter see it, a for-loop is indistinguishable from the
    // equivalent hand-written while-loop.
    fn for_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenType::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if matches_any!(self, TokenType::Semicolon) {
            None
        } else if matches_any!(self, TokenType::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenType::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenType::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(incr) = increment {
            body = Stmt::Block {
                statements: vec![body, Stmt::Expression { expression: incr }],
            };
        }

        let condition = condition.unwrap_or_else(|| Expr::Literal {
            id: self.next_id(),
            value: LiteralValue::Boolean(true),
        });
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(init) = initializer {
            body = Stmt::Block {
                statements: vec![init, body],
            };
        }

        Ok(body)
    }

    // printStmt → "print" expression ";"
    fn print_statement(&mut self) -> Result<Stmt, Error> {
        let value = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print { expression: value })
    }

    // exprStmt → expression ";"
    fn expression_statement(&mut self) -> Result<Stmt, Error> {
        let value = self.expression()?;
        self.consume(TokenType::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression { expression: value })
    }

    // expression → assignment
    fn expression(&mut self) -> Result<Expr, Error> {
        self.assignment()
    }

    // assignment → IDENT "=" assignment | logic_or
    //
    // The left side is parsed as an ordinary expression first, then
    // reinterpreted as an assignment target if `=` follows. Every legal
    // assignment target also parses as a valid expression on its own, which
    // is what makes that reinterpretation possible; `Variable` is the only
    // legal target in this dialect.
    fn assignment(&mut self) -> Result<Expr, Error> {
        let expr = self.logic_or()?;

        if matches_any!(self, TokenType::Equal) {
            let equals = self.previous().clone();
            let value = Box::new(self.assignment()?);

            if let Expr::Variable { name, .. } = expr {
                return Ok(Expr::Assign {
                    id: self.next_id(),
                    name,
                    value,
                });
            }

            // Not throwing: the parser isn't in a confused state that needs
            // synchronization, it just found an expression that can't be
            // assigned to.
            return Err(self.error(&equals, "Invalid assignment target."));
        }

        Ok(expr)
    }

    // logic_or → logic_and ( "or" logic_and )?
    // A single, non-looping level: `a or b or c` only ever nests one level
    // deep of `Logical`, it doesn't chain.
    fn logic_or(&mut self) -> Result<Expr, Error> {
        let left = self.logic_and()?;
        if matches_any!(self, TokenType::Or) {
            let operator = self.previous().clone();
            let right = self.logic_and()?;
            return Ok(Expr::Logical {
                id: self.next_id(),
                left: Box::new(left),
                operator,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    // logic_and → equality ( "and" equality )?
    fn logic_and(&mut self) -> Result<Expr, Error> {
        let left = self.equality()?;
        if matches_any!(self, TokenType::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            return Ok(Expr::Logical {
                id: self.next_id(),
                left: Box::new(left),
                operator,
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    // equality → comparison ( ("!=" | "==") comparison )*
    fn equality(&mut self) -> Result<Expr, Error> {
        let mut expr = self.comparison()?;
        while matches_any!(self, TokenType::BangEqual, TokenType::EqualEqual) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    // comparison → term ( ("-" | "+") term )*
    //
    // NOTE: this is not a typo. The grammar this dialect was distilled from
    // swaps the operator sets between `comparison` and `term` — this level
    // handles additive operators, `term` below handles relational ones. It
    // is preserved as specified rather than "corrected".
    fn comparison(&mut self) -> Result<Expr, Error> {
        let mut expr = self.term()?;
        while matches_any!(self, TokenType::Minus, TokenType::Plus) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    // term → factor ( (">" | ">=" | "<" | "<=") factor )*
    fn term(&mut self) -> Result<Expr, Error> {
        let mut expr = self.factor()?;
        while matches_any!(
            self,
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual
        ) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    // factor → unary ( ("/" | "*") unary )*
    fn factor(&mut self) -> Result<Expr, Error> {
        let mut expr = self.unary()?;
        while matches_any!(self, TokenType::Slash, TokenType::Star) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    // unary → ("!" | "-") unary | call
    fn unary(&mut self) -> Result<Expr, Error> {
        if matches_any!(self, TokenType::Bang, TokenType::Minus) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                id: self.next_id(),
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    // call → primary ( "(" arguments? ")" )*
    fn call(&mut self) -> Result<Expr, Error> {
        let mut expr = self.primary()?;
        loop {
            if matches_any!(self, TokenType::LeftParen) {
                expr = self.finish_call(expr)?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, Error> {
        let mut arguments: Vec<Expr> = Vec::new();
        if !self.check(TokenType::RightParen) {
            loop {
                if arguments.len() >= 255 {
                    return Err(self.error(self.peek(), "Can't have more than 255 arguments."));
                }
                arguments.push(self.expression()?);
                if !matches_any!(self, TokenType::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenType::RightParen, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            id: self.next_id(),
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    // primary → NUMBER | STRING | IDENT | "true" | "false" | "nil"
    //         | "(" expression ")" | "fun" "(" params? ")" block
    fn primary(&mut self) -> Result<Expr, Error> {
        if matches_any!(self, TokenType::False) {
            return Ok(Expr::Literal {
                id: self.next_id(),
                value: LiteralValue::Boolean(false),
            });
        }
        if matches_any!(self, TokenType::True) {
            return Ok(Expr::Literal {
                id: self.next_id(),
                value: LiteralValue::Boolean(true),
            });
        }
        if matches_any!(self, TokenType::Nil) {
            return Ok(Expr::Literal {
                id: self.next_id(),
                value: LiteralValue::Nil,
            });
        }
        if self.check(TokenType::Number) {
            let lexeme = self.advance().lexeme.clone();
            let value = lexeme
                .parse::<f64>()
                .expect("scanner only emits well-formed numbers");
            return Ok(Expr::Literal {
                id: self.next_id(),
                value: LiteralValue::Number(value),
            });
        }
        if self.check(TokenType::String) {
            let lexeme = self.advance().lexeme.clone();
            return Ok(Expr::Literal {
                id: self.next_id(),
                value: LiteralValue::String(lexeme),
            });
        }
        if matches_any!(self, TokenType::Fun) {
            let (params, body) = self.function_tail("function")?;
            return Ok(Expr::FuncExpr {
                id: self.next_id(),
                params,
                body,
            });
        }
        if self.check(TokenType::Identifier) {
            let name = self.advance().clone();
            return Ok(Expr::Variable {
                id: self.next_id(),
                name,
            });
        }
        if matches_any!(self, TokenType::LeftParen) {
            let expr = self.expression()?;
            self.consume(TokenType::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping {
                id: self.next_id(),
                expression: Box::new(expr),
            });
        }

        Err(self.error(self.peek(), "Expect expression."))
    }

    fn check(&self, token_type: TokenType) -> bool {
        !self.is_at_end() && self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<Token, Error> {
        if self.check(token_type) {
            Ok(self.advance().clone())
        } else {
            Err(self.error(self.peek(), message))
        }
    }

    fn error(&self, token: &Token, message: &str) -> Error {
        parser_error(token, message);
        Error::Parse
    }
}
