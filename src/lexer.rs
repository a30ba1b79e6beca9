use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Name(String),
    Str(String),
    Int(String),
    Float(String),

    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    Colon,    // :
    Eq,       // =
    At,       // @
    Bang,     // !
    Pipe,     // |
    Amp,      // &
    Dollar,   // $
    Spread,   // ...

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(s) => write!(f, "Name \"{}\"", s),
            Token::Str(s) => write!(f, "String \"{}\"", s),
            Token::Int(s) | Token::Float(s) => write!(f, "Number \"{}\"", s),
            Token::LBrace => f.write_str("\"{\""),
            Token::RBrace => f.write_str("\"}\""),
            Token::LParen => f.write_str("\"(\""),
            Token::RParen => f.write_str("\")\""),
            Token::LBracket => f.write_str("\"[\""),
            Token::RBracket => f.write_str("\"]\""),
            Token::Colon => f.write_str("\":\""),
            Token::Eq => f.write_str("\"=\""),
            Token::At => f.write_str("\"@\""),
            Token::Bang => f.write_str("\"!\""),
            Token::Pipe => f.write_str("\"|\""),
            Token::Amp => f.write_str("\"&\""),
            Token::Dollar => f.write_str("\"$\""),
            Token::Spread => f.write_str("\"...\""),
            Token::Eof => f.write_str("<EOF>"),
        }
    }
}

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: Pos,
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character {0:?} at {1}")]
    UnexpectedChar(char, Pos),
    #[error("Unterminated string at {0}")]
    UnterminatedString(Pos),
    #[error("Unterminated block string at {0}")]
    UnterminatedBlockString(Pos),
    #[error("Invalid number {0:?} at {1}")]
    InvalidNumber(String, Pos),
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek() == Some(&expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Whitespace, line terminators, commas and comments carry no meaning in SDL.
    fn skip_ignored(&mut self) {
        loop {
            match self.chars.peek() {
                Some(&c) if c.is_whitespace() || c == ',' => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_name(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn read_string(&mut self, start: Pos) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('b') => s.push('\u{8}'),
                    Some('f') => s.push('\u{c}'),
                    Some('u') => {
                        let mut hex = String::new();
                        for _ in 0..4 {
                            match self.bump() {
                                Some(h) => hex.push(h),
                                None => return Err(LexError::UnterminatedString(start)),
                            }
                        }
                        let decoded = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .unwrap_or('\u{fffd}');
                        s.push(decoded);
                    }
                    Some(c) => s.push(c),
                    None => return Err(LexError::UnterminatedString(start)),
                },
                Some('\n') | None => return Err(LexError::UnterminatedString(start)),
                Some(c) => s.push(c),
            }
        }
    }

    /// Reads the body of a `"""` string; the opening quotes are already consumed.
    fn read_block_string(&mut self, start: Pos) -> Result<String, LexError> {
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some('"') => {
                    if self.eat('"') {
                        if self.eat('"') {
                            return Ok(dedent_block(&raw));
                        }
                        raw.push_str("\"\"");
                    } else {
                        raw.push('"');
                    }
                }
                Some('\\') => {
                    if self.chars.peek() == Some(&'"') {
                        // \""" escapes a literal triple quote
                        let mut quotes = 0;
                        while quotes < 3 && self.eat('"') {
                            quotes += 1;
                        }
                        if quotes < 3 {
                            raw.push('\\');
                        }
                        raw.push_str(&"\"".repeat(quotes));
                    } else {
                        raw.push('\\');
                    }
                }
                Some(c) => raw.push(c),
                None => return Err(LexError::UnterminatedBlockString(start)),
            }
        }
    }

    fn read_number(&mut self, first: char, start: Pos) -> Result<Token, LexError> {
        let mut s = String::from(first);
        let mut is_float = false;

        self.read_digits(&mut s);
        if s == "-" {
            return Err(LexError::InvalidNumber(s, start));
        }

        if self.chars.peek() == Some(&'.') {
            is_float = true;
            s.push('.');
            self.bump();
            if !self.read_digits(&mut s) {
                return Err(LexError::InvalidNumber(s, start));
            }
        }

        if matches!(self.chars.peek(), Some('e') | Some('E')) {
            is_float = true;
            if let Some(e) = self.bump() {
                s.push(e);
            }
            if let Some(&sign) = self.chars.peek() {
                if sign == '+' || sign == '-' {
                    s.push(sign);
                    self.bump();
                }
            }
            if !self.read_digits(&mut s) {
                return Err(LexError::InvalidNumber(s, start));
            }
        }

        // A number may not run straight into a name: `12abc`
        if let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphabetic() || c == '_' || c == '.' {
                s.push(c);
                return Err(LexError::InvalidNumber(s, start));
            }
        }

        Ok(if is_float { Token::Float(s) } else { Token::Int(s) })
    }

    fn read_digits(&mut self, s: &mut String) -> bool {
        let mut any = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.bump();
                any = true;
            } else {
                break;
            }
        }
        any
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_ignored();

        let pos = self.pos();
        let c = match self.bump() {
            Some(c) => c,
            None => {
                return Ok(Spanned {
                    token: Token::Eof,
                    pos,
                });
            }
        };

        let token = match c {
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ':' => Token::Colon,
            '=' => Token::Eq,
            '@' => Token::At,
            '!' => Token::Bang,
            '|' => Token::Pipe,
            '&' => Token::Amp,
            '$' => Token::Dollar,
            '.' => {
                if self.eat('.') && self.eat('.') {
                    Token::Spread
                } else {
                    return Err(LexError::UnexpectedChar('.', pos));
                }
            }
            '"' => {
                if self.eat('"') {
                    if self.eat('"') {
                        Token::Str(self.read_block_string(pos)?)
                    } else {
                        Token::Str(String::new())
                    }
                } else {
                    Token::Str(self.read_string(pos)?)
                }
            }
            c if c.is_ascii_digit() || c == '-' => self.read_number(c, pos)?,
            c if c.is_ascii_alphabetic() || c == '_' => Token::Name(self.read_name(c)),
            _ => return Err(LexError::UnexpectedChar(c, pos)),
        };

        Ok(Spanned { token, pos })
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.token == Token::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Strips the common indentation and blank leading/trailing lines of a block string.
fn dedent_block(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                l.to_string()
            } else {
                l.get(common_indent..).unwrap_or("").to_string()
            }
        })
        .collect();

    while out.first().is_some_and(|l| l.trim().is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }

    out.join("\n")
}
