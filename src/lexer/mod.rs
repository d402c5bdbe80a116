use std::fmt;


#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    If,
    Elif,
    Else,
    While,
    And,
    Or,
    Not,
    True,
    False,
    None,

    // Identifiers and literals
    Identifier(String),
    Str(String),
    Int(i64),
    Float(f64),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    SlashSlashAssign,
    PercentAssign,

    // Delimiters
    LeftParen,
    RightParen,
    Colon,
    Semicolon,
    Comma,

    // Layout
    Newline,
    Indent,
    Dedent,

    // Other
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub line: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_type {
            TokenType::Newline | TokenType::Indent | TokenType::Dedent | TokenType::Eof => {
                write!(f, "{:?}", self.token_type)
            }
            _ => write!(f, "{:?} '{}'", self.token_type, self.lexeme),
        }
    }
}

#[derive(Debug)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lexer error on line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for LexerError {}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

// Tab stops advance indentation to the next multiple of 8 columns.
const TAB_WIDTH: usize = 8;

pub struct Lexer {
    chars: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    // Open indentation widths; the base level 0 is never popped.
    indents: Vec<usize>,
    // Newlines inside parentheses join lines instead of ending them.
    paren_depth: usize,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            indents: vec![0],
            paren_depth: 0,
            at_line_start: true,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            if self.at_line_start && self.paren_depth == 0 {
                self.handle_indentation()?;
                continue;
            }
            self.start = self.current;
            self.scan_token()?;
        }

        // A last line without a trailing newline still ends a statement.
        if self
            .tokens
            .last()
            .is_some_and(|t| !matches!(t.token_type, TokenType::Newline))
        {
            self.push_layout(TokenType::Newline);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push_layout(TokenType::Dedent);
        }
        self.push_layout(TokenType::Eof);

        Ok(self.tokens.clone())
    }

    /// Measure the indentation of the next logical line and emit
    /// Indent/Dedent tokens against the stack. Blank and comment-only
    /// lines produce nothing at all.
    fn handle_indentation(&mut self) -> Result<(), LexerError> {
        loop {
            let mut width = 0;
            loop {
                match self.peek() {
                    ' ' => {
                        width += 1;
                        self.advance();
                    }
                    '\t' => {
                        width = width - width % TAB_WIDTH + TAB_WIDTH;
                        self.advance();
                    }
                    '\r' => {
                        self.advance();
                    }
                    _ => break,
                }
            }

            if self.is_at_end() {
                self.at_line_start = false;
                return Ok(());
            }
            match self.peek() {
                '\n' => {
                    self.advance();
                    self.line += 1;
                    continue;
                }
                '#' => {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    continue;
                }
                _ => {}
            }

            let current = self.indents.last().copied().unwrap_or(0);
            if width > current {
                self.indents.push(width);
                self.push_layout(TokenType::Indent);
            } else {
                while width < self.indents.last().copied().unwrap_or(0) {
                    self.indents.pop();
                    self.push_layout(TokenType::Dedent);
                }
                if width != self.indents.last().copied().unwrap_or(0) {
                    return Err(LexerError {
                        message: "unindent does not match any outer indentation level".to_string(),
                        line: self.line,
                    });
                }
            }
            self.at_line_start = false;
            return Ok(());
        }
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c = self.advance();
        match c {
            '(' => {
                self.paren_depth += 1;
                self.add_token(TokenType::LeftParen);
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.add_token(TokenType::RightParen);
            }
            ':' => self.add_token(TokenType::Colon),
            ';' => self.add_token(TokenType::Semicolon),
            ',' => self.add_token(TokenType::Comma),
            '+' => {
                let token_type = if self.match_char('=') {
                    TokenType::PlusAssign
                } else {
                    TokenType::Plus
                };
                self.add_token(token_type);
            }
            '-' => {
                let token_type = if self.match_char('=') {
                    TokenType::MinusAssign
                } else {
                    TokenType::Minus
                };
                self.add_token(token_type);
            }
            '*' => {
                let token_type = if self.match_char('=') {
                    TokenType::StarAssign
                } else {
                    TokenType::Star
                };
                self.add_token(token_type);
            }
            '/' => {
                let token_type = if self.match_char('/') {
                    if self.match_char('=') {
                        TokenType::SlashSlashAssign
                    } else {
                        TokenType::SlashSlash
                    }
                } else if self.match_char('=') {
                    TokenType::SlashAssign
                } else {
                    TokenType::Slash
                };
                self.add_token(token_type);
            }
            '%' => {
                let token_type = if self.match_char('=') {
                    TokenType::PercentAssign
                } else {
                    TokenType::Percent
                };
                self.add_token(token_type);
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Assign
                };
                self.add_token(token_type);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::NotEqual);
                } else {
                    return Err(LexerError {
                        message: "Unexpected character: !".to_string(),
                        line: self.line,
                    });
                }
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '#' => {
                // A comment goes until the end of the line
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
            }
            ' ' | '\r' | '\t' => {
                // Ignore whitespace
            }
            '\n' => {
                if self.paren_depth == 0 {
                    self.push_layout(TokenType::Newline);
                    self.at_line_start = true;
                }
                self.line += 1;
            }
            '"' | '\'' => self.string(c)?,
            '0'..='9' => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            _ => {
                return Err(LexerError {
                    message: format!("Unexpected character: {}", c),
                    line: self.line,
                });
            }
        }

        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.chars[self.start..self.current].iter().collect();
        let token_type = match text.as_str() {
            "if" => TokenType::If,
            "elif" => TokenType::Elif,
            "else" => TokenType::Else,
            "while" => TokenType::While,
            "and" => TokenType::And,
            "or" => TokenType::Or,
            "not" => TokenType::Not,
            "True" => TokenType::True,
            "False" => TokenType::False,
            "None" => TokenType::None,
            _ => TokenType::Identifier(text),
        };

        self.add_token(token_type);
    }

    fn number(&mut self) -> Result<(), LexerError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Fractional part
        if self.peek() == '.' {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // Exponent, only when a digit actually follows
        if self.peek() == 'e' || self.peek() == 'E' {
            let mut look = self.current + 1;
            if matches!(self.chars.get(look), Some('+') | Some('-')) {
                look += 1;
            }
            if self.chars.get(look).is_some_and(|c| c.is_ascii_digit()) {
                self.current = look;
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            }
        }

        let text: String = self.chars[self.start..self.current].iter().collect();
        if text.contains(['.', 'e', 'E']) {
            let value: f64 = text.parse().map_err(|_| LexerError {
                message: format!("invalid float literal: {}", text),
                line: self.line,
            })?;
            self.add_token(TokenType::Float(value));
        } else {
            let value: i64 = text.parse().map_err(|_| LexerError {
                message: format!("integer literal too large: {}", text),
                line: self.line,
            })?;
            self.add_token(TokenType::Int(value));
        }

        Ok(())
    }

    fn string(&mut self, quote: char) -> Result<(), LexerError> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            let c = self.advance();
            match c {
                '\n' => {
                    return Err(LexerError {
                        message: "unterminated string literal".to_string(),
                        line: self.line,
                    });
                }
                '\\' => {
                    if self.is_at_end() {
                        break;
                    }
                    match self.advance() {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' => value.push('\\'),
                        '\'' => value.push('\''),
                        '"' => value.push('"'),
                        // Unknown escapes keep the backslash verbatim
                        other => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                }
                _ => value.push(c),
            }
        }

        if self.is_at_end() {
            return Err(LexerError {
                message: "unterminated string literal".to_string(),
                line: self.line,
            });
        }

        // The closing quote.
        self.advance();
        self.add_token(TokenType::Str(value));

        Ok(())
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.current] != expected {
            return false;
        }

        self.current += 1;
        true
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    fn advance(&mut self) -> char {
        self.current += 1;
        self.chars[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn add_token(&mut self, token_type: TokenType) {
        let lexeme: String = self.chars[self.start..self.current].iter().collect();
        self.tokens.push(Token {
            token_type,
            lexeme,
            line: self.line,
        });
    }

    fn push_layout(&mut self, token_type: TokenType) {
        self.tokens.push(Token {
            token_type,
            lexeme: String::new(),
            line: self.line,
        });
    }
}
