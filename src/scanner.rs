// ABOUTME: Hand-written scanner turning source text into a token stream

use crate::error::ScanError;
use crate::token::{keyword, Literal, NumberLiteral, Token, TokenKind};

pub struct Scanner {
    source: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
    tokens: Vec<Token>,
    errors: Vec<ScanError>,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Scans the whole source, returning every token plus any diagnostics
    /// collected along the way. Scanning always completes and the token
    /// stream always ends with an `Eof` sentinel, even if errors occurred.
    pub fn scan(mut self) -> (Vec<Token>, Vec<ScanError>) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens.push(Token::eof(self.line));
        (self.tokens, self.errors)
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add(TokenKind::LeftParen),
            ')' => self.add(TokenKind::RightParen),
            '{' => self.add(TokenKind::LeftBrace),
            '}' => self.add(TokenKind::RightBrace),
            '[' => self.add(TokenKind::LeftBracket),
            ']' => self.add(TokenKind::RightBracket),
            ',' => self.add(TokenKind::Comma),
            '.' => self.add(TokenKind::Dot),
            '+' => self.add(TokenKind::Plus),
            ';' => self.add(TokenKind::Semicolon),
            '*' => self.add(TokenKind::Star),
            '%' => self.add(TokenKind::Modulo),
            '-' => {
                let kind = if self.matches('>') { TokenKind::Arrow } else { TokenKind::Minus };
                self.add(kind);
            }
            ':' => {
                let kind = if self.matches(':') { TokenKind::DoubleColon } else { TokenKind::Colon };
                self.add(kind);
            }
            '!' => {
                let kind = if self.matches('=') { TokenKind::BangEqual } else { TokenKind::Bang };
                self.add(kind);
            }
            '=' => {
                let kind = if self.matches('=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.add(kind);
            }
            '<' => {
                let kind = if self.matches('=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.add(kind);
            }
            '>' => {
                let kind = if self.matches('=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.add(kind);
            }
            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.matches('*') {
                    self.block_comment();
                } else {
                    self.add(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string('"'),
            '\'' => self.string('\''),
            c if c.is_ascii_digit() => self.number(),
            c if is_alpha(c) => self.identifier(),
            other => self.errors.push(ScanError {
                line: self.line,
                message: format!("Unexpected character '{}'", other),
            }),
        }
    }

    fn block_comment(&mut self) {
        let start_line = self.line;
        let mut depth = 1;
        while depth > 0 {
            if self.is_at_end() {
                self.errors.push(ScanError {
                    line: start_line,
                    message: "Unterminated block comment".to_string(),
                });
                return;
            }
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
            if self.check('*') && self.check_next('/') {
                self.advance();
                self.advance();
                depth -= 1;
            }
        }
    }

    fn string(&mut self, quote: char) {
        // Triple-quoted (only meaningful for `"`) multi-line string.
        if quote == '"' && self.check('"') && self.check_next('"') {
            self.advance();
            self.advance();
            return self.multiline_string();
        }

        let start_line = self.line;
        let mut raw = String::new();
        while self.peek() != quote && !self.is_at_end() {
            let c = self.peek();
            if c == '\n' {
                self.line += 1;
            }
            if c == '\\' {
                self.advance();
                if self.is_at_end() {
                    break;
                }
                raw.push(decode_escape(self.advance()));
                continue;
            }
            raw.push(self.advance());
        }

        if self.is_at_end() {
            self.errors.push(ScanError {
                line: start_line,
                message: "Unterminated string".to_string(),
            });
            return;
        }

        self.advance(); // closing quote
        self.add_literal(TokenKind::String, Literal::String(raw));
    }

    fn multiline_string(&mut self) {
        let start_line = self.line;
        let mut raw = String::new();
        loop {
            if self.is_at_end() {
                self.errors.push(ScanError {
                    line: start_line,
                    message: "Unterminated multiline string".to_string(),
                });
                return;
            }
            if self.check('"') && self.check_next('"') && self.check_next2('"') {
                self.advance();
                self.advance();
                self.advance();
                break;
            }
            let c = self.advance();
            if c == '\n' {
                self.line += 1;
            }
            if c == '\\' && !self.is_at_end() {
                raw.push(decode_escape(self.advance()));
            } else {
                raw.push(c);
            }
        }
        self.add_literal(TokenKind::MultilineString, Literal::String(raw));
    }

    fn number(&mut self) {
        // Hex / binary forms: `0x...` / `0b...`.
        if self.source[self.start] == '0' && (self.check('x') || self.check('b')) {
            let radix_char = self.advance();
            let radix = if radix_char == 'x' { 16 } else { 2 };
            let digits_start = self.current;
            while self.peek().is_ascii_hexdigit() {
                self.advance();
            }
            let text: String = self.source[digits_start..self.current].iter().collect();
            let value = i64::from_str_radix(&text, radix).unwrap_or(0);
            self.add_literal(TokenKind::Number, Literal::Number(NumberLiteral::Integer(value)));
            return;
        }

        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let literal = if is_float {
            let value: f64 = text.parse().unwrap_or(0.0);
            if value.fract() == 0.0 && value.is_finite() {
                NumberLiteral::Integer(value as i64)
            } else {
                NumberLiteral::Float(value)
            }
        } else {
            NumberLiteral::Integer(text.parse().unwrap_or(0))
        };
        self.add_literal(TokenKind::Number, Literal::Number(literal));
    }

    fn identifier(&mut self) {
        while is_alphanumeric(self.peek()) {
            self.advance();
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        let kind = keyword(&text).unwrap_or(TokenKind::Identifier);
        self.add(kind);
    }

    // ---- cursor primitives ----

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.check(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn check(&self, expected: char) -> bool {
        !self.is_at_end() && self.source[self.current] == expected
    }

    fn check_next(&self, expected: char) -> bool {
        self.current + 1 < self.source.len() && self.source[self.current + 1] == expected
    }

    fn check_next2(&self, expected: char) -> bool {
        self.current + 2 < self.source.len() && self.source[self.current + 2] == expected
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn add(&mut self, kind: TokenKind) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(kind, lexeme, None, self.line));
    }

    fn add_literal(&mut self, kind: TokenKind, literal: Literal) {
        let lexeme: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(kind, lexeme, Some(literal), self.line));
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alphanumeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

fn decode_escape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '\\' => '\\',
        '"' => '"',
        '\'' => '\'',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Scanner::new(src).scan();
        assert!(errors.is_empty(), "unexpected scan errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_punctuation_and_two_char_operators() {
        let kinds = kinds("( ) { } [ ] , . -> :: != == <= >=");
        use TokenKind::*;
        assert_eq!(
            kinds,
            vec![
                LeftParen, RightParen, LeftBrace, RightBrace, LeftBracket, RightBracket, Comma,
                Dot, Arrow, DoubleColon, BangEqual, EqualEqual, LessEqual, GreaterEqual, Eof
            ]
        );
    }

    #[test]
    fn distinguishes_integer_and_float_literals() {
        let (tokens, _) = Scanner::new("1 1.0 1.5").scan();
        let literals: Vec<_> = tokens
            .iter()
            .filter_map(|t| t.literal.clone())
            .collect();
        assert_eq!(
            literals,
            vec![
                Literal::Number(NumberLiteral::Integer(1)),
                // A decimal point with a zero fractional part still
                // collapses to Integer (§4.1).
                Literal::Number(NumberLiteral::Integer(1)),
                Literal::Number(NumberLiteral::Float(1.5)),
            ]
        );
    }

    #[test]
    fn hex_and_binary_literals_are_integers() {
        let (tokens, _) = Scanner::new("0xFF 0b101").scan();
        let literals: Vec<_> = tokens.iter().filter_map(|t| t.literal.clone()).collect();
        assert_eq!(
            literals,
            vec![
                Literal::Number(NumberLiteral::Integer(255)),
                Literal::Number(NumberLiteral::Integer(5)),
            ]
        );
    }

    #[test]
    fn decodes_string_escapes_and_accepts_either_quote() {
        let (tokens, _) = Scanner::new(r#" "a\nb" 'c\td' "#).scan();
        let literals: Vec<_> = tokens.iter().filter_map(|t| t.literal.clone()).collect();
        assert_eq!(
            literals,
            vec![
                Literal::String("a\nb".to_string()),
                Literal::String("c\td".to_string()),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_nonfatal() {
        let (tokens, errors) = Scanner::new("var x = \"abc").scan();
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn keywords_are_recognized_and_identifiers_survive_otherwise() {
        let kinds = kinds("var const func if elseif else while for break continue import and or true false nil return foo_bar");
        use TokenKind::*;
        assert_eq!(
            kinds,
            vec![
                Var, Const, Func, If, Elseif, Else, While, For, Break, Continue, Import, And, Or,
                True, False, Nil, Return, Identifier, Eof
            ]
        );
    }

    #[test]
    fn line_comment_and_block_comment_are_skipped() {
        let kinds = kinds("1 // comment\n2 /* block \n comment */ 3");
        use TokenKind::*;
        assert_eq!(kinds, vec![Number, Number, Number, Eof]);
    }

    #[test]
    fn unknown_character_is_skipped_and_reported() {
        let (tokens, errors) = Scanner::new("1 @ 2").scan();
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens.len(), 3); // 1, 2, Eof
    }

    #[test]
    fn multiline_string_spans_lines() {
        let (tokens, errors) = Scanner::new("\"\"\"line one\nline two\"\"\"").scan();
        assert!(errors.is_empty());
        assert_eq!(
            tokens[0].literal,
            Some(Literal::String("line one\nline two".to_string()))
        );
    }

    #[test]
    fn trailing_dot_without_digits_is_not_a_float() {
        let (tokens, _) = Scanner::new("1.").scan();
        assert_eq!(tokens[0].literal, Some(Literal::Number(NumberLiteral::Integer(1))));
        assert_eq!(tokens[1].kind, TokenKind::Dot);
    }
}
