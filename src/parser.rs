// ABOUTME: Recursive-descent parser turning tokens into an AST

use std::rc::Rc;

use crate::ast::{Expr, ExprRef, Literal, Stmt, StmtRef};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

const MAX_ARGS: usize = 255;

/// Marks that an error was already recorded in `Parser::errors`; callers
/// propagate it up to the statement loop, which resynchronizes.
struct ParseFail;

type PResult<T> = Result<T, ParseFail>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, current: 0, errors: Vec::new() }
    }

    pub fn parse(mut self) -> (Vec<StmtRef>, Vec<ParseError>) {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => stmts.push(stmt),
                Err(_) => self.synchronize(),
            }
        }
        (stmts, self.errors)
    }

    // ---- declarations ----

    fn declaration(&mut self) -> PResult<StmtRef> {
        if self.match_token(&[TokenKind::Var]) {
            return self.var_declaration(false);
        }
        if self.match_token(&[TokenKind::Const]) {
            return self.var_declaration(true);
        }
        if self.match_token(&[TokenKind::Func]) {
            return self.function_declaration();
        }
        if self.match_token(&[TokenKind::Import]) {
            return self.import_declaration();
        }
        self.statement()
    }

    fn var_declaration(&mut self, is_const: bool) -> PResult<StmtRef> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let initializer = if self.match_token(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Rc::new(Stmt::Var { name, is_const, initializer }))
    }

    fn function_declaration(&mut self) -> PResult<StmtRef> {
        let name = self.consume(TokenKind::Identifier, "Expect function name.")?;
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;
        let params = self.parameter_list()?;
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.block()?;
        Ok(Rc::new(Stmt::Function { name, params, body }))
    }

    fn parameter_list(&mut self) -> PResult<Vec<Token>> {
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    return Err(self.error_at_peek("Cannot have more than 255 parameters."));
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        Ok(params)
    }

    fn import_declaration(&mut self) -> PResult<StmtRef> {
        let keyword = self.previous().clone();
        let module = if self.match_token(&[TokenKind::String]) {
            self.previous().clone()
        } else {
            self.consume(TokenKind::Identifier, "Expect module name.")?
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after import.")?;
        Ok(Rc::new(Stmt::Import { keyword, module }))
    }

    // ---- statements ----

    fn statement(&mut self) -> PResult<StmtRef> {
        if self.match_token(&[TokenKind::If]) {
            return self.if_statement();
        }
        if self.match_token(&[TokenKind::While]) {
            return self.while_statement();
        }
        if self.match_token(&[TokenKind::For]) {
            return self.for_statement();
        }
        if self.match_token(&[TokenKind::Return]) {
            return self.return_statement();
        }
        if self.match_token(&[TokenKind::Break]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Semicolon, "Expect ';' after 'break'.")?;
            return Ok(Rc::new(Stmt::Break(keyword)));
        }
        if self.match_token(&[TokenKind::Continue]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Semicolon, "Expect ';' after 'continue'.")?;
            return Ok(Rc::new(Stmt::Continue(keyword)));
        }
        if self.match_token(&[TokenKind::LeftBrace]) {
            return Ok(Rc::new(Stmt::Block(self.block()?)));
        }
        self.expression_statement()
    }

    fn block(&mut self) -> PResult<Vec<StmtRef>> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(stmts)
    }

    fn if_statement(&mut self) -> PResult<StmtRef> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = self.statement()?;

        let mut elseifs = Vec::new();
        while self.match_token(&[TokenKind::Elseif]) {
            self.consume(TokenKind::LeftParen, "Expect '(' after 'elseif'.")?;
            let cond = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after elseif condition.")?;
            let branch = self.statement()?;
            elseifs.push((cond, branch));
        }

        let else_branch = if self.match_token(&[TokenKind::Else]) {
            Some(self.statement()?)
        } else {
            None
        };

        Ok(Rc::new(Stmt::If { condition, then_branch, elseifs, else_branch }))
    }

    fn while_statement(&mut self) -> PResult<StmtRef> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after while condition.")?;
        let body = self.statement()?;
        Ok(Rc::new(Stmt::While { condition, body }))
    }

    fn for_statement(&mut self) -> PResult<StmtRef> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let init = if self.match_token(&[TokenKind::Semicolon]) {
            None
        } else if self.match_token(&[TokenKind::Var]) {
            Some(self.var_declaration(false)?)
        } else if self.match_token(&[TokenKind::Const]) {
            Some(self.var_declaration(true)?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenKind::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let body = self.statement()?;
        Ok(Rc::new(Stmt::For { init, condition, increment, body }))
    }

    fn return_statement(&mut self) -> PResult<StmtRef> {
        let keyword = self.previous().clone();
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Rc::new(Stmt::Return { keyword, value }))
    }

    fn expression_statement(&mut self) -> PResult<StmtRef> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Rc::new(Stmt::Expression(expr)))
    }

    // ---- expressions, lowest to highest precedence ----

    fn expression(&mut self) -> PResult<ExprRef> {
        self.assignment()
    }

    fn assignment(&mut self) -> PResult<ExprRef> {
        let expr = self.logical_or()?;

        if self.match_token(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr.as_ref() {
                Expr::Variable(name) => Ok(Rc::new(Expr::Assign { name: name.clone(), value })),
                Expr::Get { object, name } => Ok(Rc::new(Expr::Set {
                    object: object.clone(),
                    name: name.clone(),
                    value,
                })),
                Expr::Index { object, bracket, index } => Ok(Rc::new(Expr::SetIndex {
                    object: object.clone(),
                    bracket: bracket.clone(),
                    index: index.clone(),
                    value,
                })),
                _ => Err(self.error_at(&equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> PResult<ExprRef> {
        let mut expr = self.logical_and()?;
        while self.match_token(&[TokenKind::Or]) {
            let op = self.previous().clone();
            let right = self.logical_and()?;
            expr = Rc::new(Expr::Logical { left: expr, op, right });
        }
        Ok(expr)
    }

    fn logical_and(&mut self) -> PResult<ExprRef> {
        let mut expr = self.equality()?;
        while self.match_token(&[TokenKind::And]) {
            let op = self.previous().clone();
            let right = self.equality()?;
            expr = Rc::new(Expr::Logical { left: expr, op, right });
        }
        Ok(expr)
    }

    fn equality(&mut self) -> PResult<ExprRef> {
        let mut expr = self.comparison()?;
        while self.match_token(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let op = self.previous().clone();
            let right = self.comparison()?;
            expr = Rc::new(Expr::Binary { left: expr, op, right });
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> PResult<ExprRef> {
        let mut expr = self.additive()?;
        while self.match_token(&[
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ]) {
            let op = self.previous().clone();
            let right = self.additive()?;
            expr = Rc::new(Expr::Binary { left: expr, op, right });
        }
        Ok(expr)
    }

    fn additive(&mut self) -> PResult<ExprRef> {
        let mut expr = self.multiplicative()?;
        while self.match_token(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.multiplicative()?;
            expr = Rc::new(Expr::Binary { left: expr, op, right });
        }
        Ok(expr)
    }

    fn multiplicative(&mut self) -> PResult<ExprRef> {
        let mut expr = self.unary()?;
        while self.match_token(&[TokenKind::Star, TokenKind::Slash, TokenKind::Modulo]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            expr = Rc::new(Expr::Binary { left: expr, op, right });
        }
        Ok(expr)
    }

    fn unary(&mut self) -> PResult<ExprRef> {
        if self.match_token(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.unary()?;
            return Ok(Rc::new(Expr::Unary { op, right }));
        }
        self.call()
    }

    fn call(&mut self) -> PResult<ExprRef> {
        let mut expr = self.primary()?;
        loop {
            if self.match_token(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'.")?;
                expr = Rc::new(Expr::Get { object: expr, name });
            } else if self.match_token(&[TokenKind::LeftBracket]) {
                let bracket = self.previous().clone();
                let index = self.expression()?;
                self.consume(TokenKind::RightBracket, "Expect ']' after index.")?;
                expr = Rc::new(Expr::Index { object: expr, bracket, index });
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: ExprRef) -> PResult<ExprRef> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARGS {
                    return Err(self.error_at_peek("Cannot have more than 255 arguments."));
                }
                args.push(self.expression()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Rc::new(Expr::Call { callee, paren, args }))
    }

    fn primary(&mut self) -> PResult<ExprRef> {
        if self.match_token(&[TokenKind::False]) {
            return Ok(Rc::new(Expr::Literal(Literal::Boolean(false))));
        }
        if self.match_token(&[TokenKind::True]) {
            return Ok(Rc::new(Expr::Literal(Literal::Boolean(true))));
        }
        if self.match_token(&[TokenKind::Nil]) {
            return Ok(Rc::new(Expr::Literal(Literal::Nothing)));
        }
        if self.match_token(&[TokenKind::Number]) {
            let literal = match &self.previous().literal {
                Some(crate::token::Literal::Number(n)) => Literal::from(*n),
                _ => unreachable!("scanner always attaches a numeric literal to Number tokens"),
            };
            return Ok(Rc::new(Expr::Literal(literal)));
        }
        if self.match_token(&[TokenKind::String, TokenKind::MultilineString]) {
            let text = match &self.previous().literal {
                Some(crate::token::Literal::String(s)) => s.clone(),
                _ => unreachable!("scanner always attaches a string literal to String tokens"),
            };
            return Ok(Rc::new(Expr::Literal(Literal::String(text))));
        }
        if self.match_token(&[TokenKind::Identifier]) {
            return Ok(Rc::new(Expr::Variable(self.previous().clone())));
        }
        if self.match_token(&[TokenKind::LeftBracket]) {
            return self.array_literal();
        }
        if self.match_token(&[TokenKind::LeftBrace]) {
            return self.object_literal();
        }
        if self.match_token(&[TokenKind::LeftParen]) {
            return self.grouping_or_lambda();
        }
        Err(self.error_at_peek("Expect expression."))
    }

    fn array_literal(&mut self) -> PResult<ExprRef> {
        let bracket = self.previous().clone();
        let mut elements = Vec::new();
        if !self.check(TokenKind::RightBracket) {
            loop {
                if elements.len() >= MAX_ARGS {
                    return Err(self.error_at_peek("Cannot have more than 255 elements."));
                }
                elements.push(self.expression()?);
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBracket, "Expect ']' after array elements.")?;
        Ok(Rc::new(Expr::ArrayLiteral { bracket, elements }))
    }

    fn object_literal(&mut self) -> PResult<ExprRef> {
        let brace = self.previous().clone();
        let mut entries = Vec::new();
        if !self.check(TokenKind::RightBrace) {
            loop {
                if entries.len() >= MAX_ARGS {
                    return Err(self.error_at_peek("Cannot have more than 255 properties."));
                }
                let key = self.consume(TokenKind::Identifier, "Expect property name.")?;
                self.consume(TokenKind::Colon, "Expect ':' after property name.")?;
                let value = self.expression()?;
                entries.push((key, value));
                if !self.match_token(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after object properties.")?;
        Ok(Rc::new(Expr::ObjectLiteral { brace, entries }))
    }

    /// The one non-LL(1) point in the grammar: a `(` may open either a
    /// parenthesized expression or a lambda parameter list. Speculatively
    /// parse a parameter list; commit to a lambda only if it is followed
    /// by `)` then `->`, otherwise rewind and parse a grouping.
    fn grouping_or_lambda(&mut self) -> PResult<ExprRef> {
        if let Some(params) = self.try_lambda_params() {
            return self.finish_lambda(params);
        }

        let expr = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
        Ok(Rc::new(Expr::Grouping(expr)))
    }

    fn try_lambda_params(&mut self) -> Option<Vec<Token>> {
        let checkpoint = self.current;
        let mut params = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                if !self.check(TokenKind::Identifier) {
                    self.current = checkpoint;
                    return None;
                }
                params.push(self.advance().clone());
                if self.match_token(&[TokenKind::Comma]) {
                    // Trailing comma `(a,)` is explicitly rejected (§9).
                    if self.check(TokenKind::RightParen) {
                        self.current = checkpoint;
                        return None;
                    }
                    continue;
                }
                break;
            }
        }

        if !self.match_token(&[TokenKind::RightParen]) || !self.match_token(&[TokenKind::Arrow]) {
            self.current = checkpoint;
            return None;
        }

        Some(params)
    }

    fn finish_lambda(&mut self, params: Vec<Token>) -> PResult<ExprRef> {
        let body = if self.match_token(&[TokenKind::LeftBrace]) {
            self.block()?
        } else {
            let keyword = self.previous().clone();
            let value = self.expression()?;
            vec![Rc::new(Stmt::Return { keyword, value: Some(value) })]
        };
        Ok(Rc::new(Expr::Lambda { params, body }))
    }

    // ---- token cursor primitives ----

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn match_token(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            Err(self.error_at_peek(message))
        }
    }

    fn error_at_peek(&mut self, message: &str) -> ParseFail {
        let token = self.peek().clone();
        self.error_at(&token, message)
    }

    fn error_at(&mut self, token: &Token, message: &str) -> ParseFail {
        self.errors.push(ParseError {
            line: token.line,
            lexeme: token.lexeme.clone(),
            message: message.to_string(),
        });
        ParseFail
    }

    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.peek().kind {
                TokenKind::Var
                | TokenKind::Const
                | TokenKind::Func
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return
                | TokenKind::Import => return,
                _ => {}
            }
            self.advance();
        }
    }
}
