//! Character-level tokenizer for Weft markup.
//!
//! [`Tokenizer`] holds one decoded line at a time and a cursor into it;
//! the next line is only pulled in when the cursor runs off the end, so a
//! parse never needs more than the current line resident (block comments
//! excepted, which scan forward). [`next_token`](Tokenizer::next_token) is
//! idempotent at end of input: once the source is exhausted it returns EOF
//! tokens forever.
//!
//! Tokens are plain values; the tokenizer retains nothing about a token
//! after producing the next one.

use serde::Serialize;

/// Token classification plus payload. Numeric literals carry their value
/// and the raw unit suffix (`px`, `pt`, `em`, `%`, ...); what a suffix
/// means is the parser's business, the tokenizer only captures it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    Eof,
    Eol,
    Whitespace,
    /// String literal with escapes already resolved.
    Str(String),
    Int {
        value: i64,
        suffix: String,
    },
    Float {
        value: f64,
        suffix: String,
    },
    /// Raw comment text including its delimiters. `multiline` is true for
    /// `/* ... */` comments even when they sit on one line.
    Comment {
        text: String,
        multiline: bool,
    },
    Ident(String),
    /// An unrecognized character run. The parser treats this as fatal.
    Error(String),
    Colon,
    Dot,
    Semicolon,
    Slash,
    Comma,
    Minus,
    Plus,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

/// One classified lexeme with its 1-based start position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

impl Token {
    fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Token {
            kind,
            line: (line + 1) as u32,
            column: (column + 1) as u32,
        }
    }
}

pub struct Tokenizer<'s> {
    lines: Vec<&'s str>,
    /// Decoded characters of the current line.
    chars: Vec<char>,
    /// 0-based index of the current line.
    line: usize,
    /// 0-based cursor within `chars`.
    col: usize,
    line_comment_prefixes: Vec<String>,
}

impl<'s> Tokenizer<'s> {
    pub fn new(source: &'s str) -> Self {
        let lines: Vec<&str> = source
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        let chars = lines[0].chars().collect();
        Tokenizer {
            lines,
            chars,
            line: 0,
            col: 0,
            line_comment_prefixes: vec!["//".to_owned()],
        }
    }

    /// Register an additional single-line comment prefix. `//` is always
    /// present.
    pub fn register_line_comment(&mut self, prefix: impl Into<String>) {
        self.line_comment_prefixes.push(prefix.into());
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.col).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.col + offset).copied()
    }

    fn at_last_line(&self) -> bool {
        self.line + 1 >= self.lines.len()
    }

    /// True when the cursor sits on `text` within the current line.
    fn looking_at(&self, text: &str) -> bool {
        let mut offset = 0;
        for c in text.chars() {
            if self.peek_at(offset) != Some(c) {
                return false;
            }
            offset += 1;
        }
        true
    }

    /// Move to the start of the next line. Caller checks `at_last_line`.
    fn advance_line(&mut self) {
        self.line += 1;
        self.chars = self.lines[self.line].chars().collect();
        self.col = 0;
    }

    pub fn next_token(&mut self) -> Token {
        let (line, col) = (self.line, self.col);

        // End of the current line: either the EOF sentinel or a line
        // terminator.
        if self.col >= self.chars.len() {
            if self.at_last_line() {
                return Token::new(TokenKind::Eof, line, col);
            }
            self.advance_line();
            return Token::new(TokenKind::Eol, line, col);
        }

        let c = self.chars[self.col];

        // Maximal run of spaces and tabs.
        if c == ' ' || c == '\t' {
            while matches!(self.peek(), Some(' ') | Some('\t')) {
                self.col += 1;
            }
            return Token::new(TokenKind::Whitespace, line, col);
        }

        if c == '"' || c == '\'' || c == '`' {
            return Token::new(self.scan_string(c), line, col);
        }

        if c.is_alphabetic() || c == '_' {
            let mut word = String::new();
            while matches!(self.peek(), Some(ch) if ch.is_alphanumeric() || ch == '_') {
                word.push(self.chars[self.col]);
                self.col += 1;
            }
            return Token::new(TokenKind::Ident(word), line, col);
        }

        // Hexadecimal literal: `0x...` or `#...`.
        if c == '#' || (c == '0' && self.peek_at(1) == Some('x')) {
            self.col += if c == '#' { 1 } else { 2 };
            return Token::new(self.scan_hex_literal(col), line, col);
        }

        if c.is_ascii_digit() {
            return Token::new(self.scan_decimal_literal(), line, col);
        }

        // `.5` style float with a zero integer part.
        if c == '.' && matches!(self.peek_at(1), Some(ch) if ch.is_ascii_digit()) {
            self.col += 1;
            return Token::new(self.scan_fraction(0, col), line, col);
        }

        for i in 0..self.line_comment_prefixes.len() {
            if self.looking_at(&self.line_comment_prefixes[i]) {
                let text: String = self.chars[self.col..].iter().collect();
                self.col = self.chars.len();
                return Token::new(
                    TokenKind::Comment {
                        text,
                        multiline: false,
                    },
                    line,
                    col,
                );
            }
        }

        if self.looking_at("/*") {
            return Token::new(self.scan_block_comment(), line, col);
        }

        let op = match c {
            ':' => Some(TokenKind::Colon),
            '.' => Some(TokenKind::Dot),
            ';' => Some(TokenKind::Semicolon),
            '/' => Some(TokenKind::Slash),
            ',' => Some(TokenKind::Comma),
            '-' => Some(TokenKind::Minus),
            '+' => Some(TokenKind::Plus),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            _ => None,
        };
        if let Some(kind) = op {
            self.col += 1;
            return Token::new(kind, line, col);
        }

        // Nothing matched: error token. Skip up to the next whitespace so
        // scanning cannot loop on the same character.
        Token::new(self.scan_error_run(col), line, col)
    }

    /// String literal delimited by `quote`. Honors `\\`, `\n`, `\t`,
    /// backslash-quote, and the doubled-quote-escapes-itself convention.
    /// A string that is still open at end of line ends there silently;
    /// documents in the wild rely on this leniency.
    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.col += 1;
        let mut text = String::new();
        loop {
            let Some(c) = self.peek() else {
                // Unterminated: end at the line break, no error.
                return TokenKind::Str(text);
            };
            if c == quote {
                if self.peek_at(1) == Some(quote) {
                    text.push(quote);
                    self.col += 2;
                    continue;
                }
                self.col += 1;
                return TokenKind::Str(text);
            }
            if c == '\\' {
                match self.peek_at(1) {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(other) => text.push(other),
                    None => {
                        // Lone backslash at line end; keep it and let the
                        // unterminated-string path close the literal.
                        text.push('\\');
                        self.col += 1;
                        continue;
                    }
                }
                self.col += 2;
                continue;
            }
            text.push(c);
            self.col += 1;
        }
    }

    /// Hex digits (prefix already consumed), then an optional unit suffix.
    /// `start` is the column of the `#`/`0x` prefix, for error recovery.
    fn scan_hex_literal(&mut self, start: usize) -> TokenKind {
        let digits_start = self.col;
        while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
            self.col += 1;
        }
        if self.col == digits_start {
            return self.scan_error_run(start);
        }
        let digits: String = self.chars[digits_start..self.col].iter().collect();
        let value = match i64::from_str_radix(&digits, 16) {
            Ok(v) => v,
            Err(_) => return self.scan_error_run(start),
        };
        self.finish_number(start, |suffix| TokenKind::Int { value, suffix })
    }

    /// Decimal integer, continuing into a float when a `.` follows.
    fn scan_decimal_literal(&mut self) -> TokenKind {
        let start = self.col;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.col += 1;
        }
        let digits: String = self.chars[start..self.col].iter().collect();
        let Ok(value) = digits.parse::<i64>() else {
            return self.scan_error_run(start);
        };
        if self.peek() == Some('.') {
            self.col += 1;
            return self.scan_fraction(value, start);
        }
        self.finish_number(start, |suffix| TokenKind::Int { value, suffix })
    }

    /// Fractional digits after the decimal point, accumulated against a
    /// power-of-ten divisor.
    fn scan_fraction(&mut self, int_part: i64, start: usize) -> TokenKind {
        let mut frac = 0.0f64;
        let mut divisor = 1.0f64;
        while let Some(c) = self.peek() {
            let Some(d) = c.to_digit(10) else { break };
            frac = frac * 10.0 + d as f64;
            divisor *= 10.0;
            self.col += 1;
        }
        let value = int_part as f64 + frac / divisor;
        self.finish_number(start, |suffix| TokenKind::Float { value, suffix })
    }

    /// Capture the unit suffix after a numeric literal and reject trailing
    /// junk; all three literal forms share this tail logic. `start` is the
    /// column where the literal began.
    fn finish_number(&mut self, start: usize, make: impl FnOnce(String) -> TokenKind) -> TokenKind {
        let suffix = self.scan_unit_suffix();
        // Anything alphanumeric (or a stray dot) directly after the
        // suffix makes the whole literal malformed: `10pt5`, `1.2.3`.
        if matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '.') {
            return self.scan_error_run(start);
        }
        make(suffix)
    }

    /// A unit suffix is `%` or a run of lowercase letters.
    fn scan_unit_suffix(&mut self) -> String {
        if self.peek() == Some('%') {
            self.col += 1;
            return "%".to_owned();
        }
        let start = self.col;
        while matches!(self.peek(), Some(c) if c.is_ascii_lowercase()) {
            self.col += 1;
        }
        self.chars[start..self.col].iter().collect()
    }

    /// `/* ... */`, possibly spanning lines. Unterminated comments run to
    /// the end of input.
    fn scan_block_comment(&mut self) -> TokenKind {
        let mut text = String::from("/*");
        self.col += 2;
        loop {
            if self.col >= self.chars.len() {
                if self.at_last_line() {
                    break;
                }
                self.advance_line();
                text.push('\n');
                continue;
            }
            if self.looking_at("*/") {
                text.push_str("*/");
                self.col += 2;
                break;
            }
            text.push(self.chars[self.col]);
            self.col += 1;
        }
        TokenKind::Comment {
            text,
            multiline: true,
        }
    }

    /// Consume up to the next space, tab, or line end and wrap everything
    /// from `start` in an error token, so scanning cannot loop on the same
    /// character.
    fn scan_error_run(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(), Some(c) if c != ' ' && c != '\t') {
            self.col += 1;
        }
        // Guard against a zero-width error (cursor already at a boundary):
        // always consume at least one character if any remain.
        if self.col == start && self.col < self.chars.len() {
            self.col += 1;
        }
        TokenKind::Error(self.chars[start..self.col].iter().collect())
    }
}

/// Run the tokenizer to completion. The trailing EOF token is excluded,
/// matching what syntax highlighters and tests want to see.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(source);
    let mut tokens = Vec::new();
    loop {
        let tok = tokenizer.next_token();
        if tok.kind == TokenKind::Eof {
            return tokens;
        }
        tokens.push(tok);
    }
}
