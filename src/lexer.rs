//! Lexer for tokenizing preference directive files
//!
//! This module converts a character stream into positioned tokens for the
//! parser. Unlike a plain tokenizer it does not throw comments away: `//` and
//! `/* */` comments come back as tokens so they can be attached to directives
//! and written back out. Line and column numbers are tracked for every token.

use crate::error::{Error, Result};
use std::iter::Peekable;
use std::str::Chars;

/// Token types produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier (e.g., set, user_pref, lock_pref)
    Identifier(String),
    /// String value with escape sequences already processed
    String(String),
    /// Integer literal
    Integer(i64),
    /// Boolean literal
    Boolean(bool),
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    /// `//` comment, text after the slashes
    LineComment(String),
    /// `/* */` comment, text between the markers
    BlockComment(String),
    /// End of input
    Eof,
}

impl Token {
    /// Short description used in parse error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(s) => format!("identifier '{}'", s),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Integer(n) => format!("integer {}", n),
            Token::Boolean(b) => format!("boolean {}", b),
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Semicolon => "';'".to_string(),
            Token::LineComment(_) | Token::BlockComment(_) => "comment".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

/// A token together with where it starts and the line it ends on
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
}

/// Lexer for tokenizing preference files
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;

        let token = match self.chars.peek().copied() {
            None => Token::Eof,
            Some('(') => self.single(Token::LeftParen),
            Some(')') => self.single(Token::RightParen),
            Some(',') => self.single(Token::Comma),
            Some(';') => self.single(Token::Semicolon),
            Some('/') => self.lex_comment()?,
            Some('"') | Some('\'') => self.lex_string()?,
            Some('-' | '0'..='9') => self.lex_number()?,
            Some('a'..='z' | 'A'..='Z' | '_') => self.lex_identifier(),
            Some(c) => {
                return Err(Error::parse(
                    line,
                    column,
                    format!("Unexpected character: '{}'", c),
                ))
            }
        };

        Ok(Spanned {
            token,
            line,
            column,
            end_line: self.line,
        })
    }

    /// Consume one character, keeping line/column in sync
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

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || c == '\u{feff}' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn lex_comment(&mut self) -> Result<Token> {
        let line = self.line;
        let column = self.column;
        self.bump(); // first '/'

        match self.chars.peek() {
            Some('/') => {
                self.bump();
                let mut text = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    text.push(c);
                    self.bump();
                }
                if text.ends_with('\r') {
                    text.pop();
                }
                Ok(Token::LineComment(text))
            }
            Some('*') => {
                self.bump();
                let mut text = String::new();
                loop {
                    match self.bump() {
                        Some('*') if self.chars.peek() == Some(&'/') => {
                            self.bump();
                            return Ok(Token::BlockComment(text));
                        }
                        Some(c) => text.push(c),
                        None => {
                            return Err(Error::parse(line, column, "Unterminated block comment"))
                        }
                    }
                }
            }
            _ => Err(Error::parse(line, column, "Unexpected character: '/'")),
        }
    }

    /// Lex an identifier or boolean keyword
    fn lex_identifier(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            _ => Token::Identifier(ident),
        }
    }

    /// Lex a quoted string literal, single or double quoted
    fn lex_string(&mut self) -> Result<Token> {
        let start_line = self.line;
        let start_col = self.column;
        let quote = self.bump().unwrap_or('"');

        let mut result = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(Token::String(result)),
                Some('\\') => self.lex_escape(&mut result)?,
                Some('\n') | None => {
                    return Err(Error::parse(
                        start_line,
                        start_col,
                        "Unterminated string literal",
                    ))
                }
                Some(c) => result.push(c),
            }
        }
    }

    /// Decode one escape sequence (the backslash is already consumed)
    fn lex_escape(&mut self, out: &mut String) -> Result<()> {
        let line = self.line;
        let column = self.column - 1;

        match self.bump() {
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('0') => {
                if matches!(self.chars.peek(), Some('0'..='7')) {
                    return Err(Error::parse(
                        line,
                        column,
                        "Octal escape sequences are not supported. Use \\x00 instead.",
                    ));
                }
                out.push('\0');
            }
            Some('x') => {
                let code = self.read_hex(2, line, column, "\\x")?;
                // Two hex digits always fit in a char
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            Some('u') => {
                let unit = self.read_hex(4, line, column, "\\u")?;
                self.push_utf16(out, unit, line, column)?;
            }
            Some(c) => {
                return Err(Error::parse(
                    line,
                    column,
                    format!("Invalid escape sequence: \\{}", c),
                ))
            }
            None => {
                return Err(Error::parse(
                    line,
                    column,
                    "Unexpected end of input in escape sequence",
                ))
            }
        }
        Ok(())
    }

    fn read_hex(&mut self, digits: usize, line: usize, column: usize, prefix: &str) -> Result<u32> {
        let mut hex = String::with_capacity(digits);
        for _ in 0..digits {
            match self.chars.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(*c);
                    self.bump();
                }
                _ => {
                    return Err(Error::parse(
                        line,
                        column,
                        format!("Incomplete escape: {}{}", prefix, hex),
                    ))
                }
            }
        }
        u32::from_str_radix(&hex, 16)
            .map_err(|_| Error::parse(line, column, format!("Invalid escape: {}{}", prefix, hex)))
    }

    /// Push a `\uXXXX` code unit onto `out`, pairing surrogates when present
    ///
    /// Unpaired surrogates become U+FFFD. A `\u` escape that follows a high
    /// surrogate but is not a low surrogate is decoded on its own.
    fn push_utf16(
        &mut self,
        out: &mut String,
        mut unit: u32,
        line: usize,
        column: usize,
    ) -> Result<()> {
        loop {
            if !(0xD800..0xDC00).contains(&unit) {
                out.push(char::from_u32(unit).unwrap_or('\u{FFFD}'));
                return Ok(());
            }

            // High surrogate: a `\uDC00`-`\uDFFF` low surrogate must follow
            let mut lookahead = self.chars.clone();
            if !(lookahead.next() == Some('\\') && lookahead.next() == Some('u')) {
                out.push('\u{FFFD}');
                return Ok(());
            }
            self.bump();
            self.bump();
            let low = self.read_hex(4, line, column, "\\u")?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                return Ok(());
            }
            out.push('\u{FFFD}');
            unit = low;
        }
    }

    /// Lex an integer; decimals and exponents are rejected
    fn lex_number(&mut self) -> Result<Token> {
        let line = self.line;
        let start_col = self.column;

        let mut num_str = String::new();
        if let Some(&'-') = self.chars.peek() {
            num_str.push('-');
            self.bump();
        }

        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                num_str.push(c);
                self.bump();
            } else {
                break;
            }
        }

        if let Some('.' | 'e' | 'E') = self.chars.peek() {
            return Err(Error::parse(
                line,
                start_col,
                "Floating point values are not supported; use an integer or a string",
            ));
        }

        num_str.parse::<i64>().map(Token::Integer).map_err(|_| {
            Error::parse(
                line,
                start_col,
                format!("Failed to parse integer: {}", num_str),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let spanned = lexer.next_token().unwrap();
            if spanned.token == Token::Eof {
                break;
            }
            out.push(spanned.token);
        }
        out
    }

    #[test]
    fn test_lexer_basic_tokens() {
        assert_eq!(
            tokens("( ) , ;"),
            vec![
                Token::LeftParen,
                Token::RightParen,
                Token::Comma,
                Token::Semicolon
            ]
        );
    }

    #[test]
    fn test_lexer_keeps_line_comment() {
        assert_eq!(
            tokens("( // this is a comment\n )"),
            vec![
                Token::LeftParen,
                Token::LineComment(" this is a comment".to_string()),
                Token::RightParen
            ]
        );
    }

    #[test]
    fn test_lexer_keeps_block_comment() {
        let mut lexer = Lexer::new("/* one\ntwo */ x");
        let comment = lexer.next_token().unwrap();
        assert_eq!(comment.token, Token::BlockComment(" one\ntwo ".to_string()));
        assert_eq!(comment.line, 1);
        assert_eq!(comment.end_line, 2);
    }

    #[test]
    fn test_lexer_unterminated_block_comment() {
        let mut lexer = Lexer::new("/* never closed");
        assert!(matches!(lexer.next_token(), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_lexer_crlf_line_comment() {
        assert_eq!(
            tokens("// windows\r\n;"),
            vec![Token::LineComment(" windows".to_string()), Token::Semicolon]
        );
    }

    #[test]
    fn test_lexer_identifier_and_booleans() {
        assert_eq!(
            tokens("set user_pref true false"),
            vec![
                Token::Identifier("set".to_string()),
                Token::Identifier("user_pref".to_string()),
                Token::Boolean(true),
                Token::Boolean(false)
            ]
        );
    }

    #[test]
    fn test_lexer_string_escapes() {
        assert_eq!(
            tokens(r#""a\"b\\c\n\t\x41B""#),
            vec![Token::String("a\"b\\c\n\tAB".to_string())]
        );
    }

    #[test]
    fn test_lexer_single_quoted_string() {
        assert_eq!(tokens("'hi'"), vec![Token::String("hi".to_string())]);
    }

    #[test]
    fn test_lexer_surrogate_pair() {
        assert_eq!(
            tokens(r#""\uD83D\uDE00""#),
            vec![Token::String("\u{1F600}".to_string())]
        );
    }

    #[test]
    fn test_lexer_unpaired_surrogates() {
        // The escape after an unpaired high surrogate is kept
        assert_eq!(
            tokens(r#""\uD800\u0041""#),
            vec![Token::String("\u{FFFD}A".to_string())]
        );
        assert_eq!(
            tokens(r#""\uD800\uD83D\uDE00""#),
            vec![Token::String("\u{FFFD}\u{1F600}".to_string())]
        );
        assert_eq!(
            tokens(r#""\uD800x""#),
            vec![Token::String("\u{FFFD}x".to_string())]
        );
        assert_eq!(
            tokens(r#""\uDC00""#),
            vec![Token::String("\u{FFFD}".to_string())]
        );
    }

    #[test]
    fn test_lexer_octal_escape_rejected() {
        let mut lexer = Lexer::new(r#""test\00""#);
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_lexer_invalid_hex_escape() {
        let mut lexer = Lexer::new(r#""\xGG""#);
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_lexer_unterminated_string() {
        let mut lexer = Lexer::new("\"open");
        let err = lexer.next_token().unwrap_err();
        assert!(err.to_string().contains("Unterminated string"));
    }

    #[test]
    fn test_lexer_integers() {
        assert_eq!(
            tokens("42 -7 0"),
            vec![Token::Integer(42), Token::Integer(-7), Token::Integer(0)]
        );
    }

    #[test]
    fn test_lexer_float_rejected() {
        let mut lexer = Lexer::new("3.14");
        let err = lexer.next_token().unwrap_err();
        assert!(err.to_string().contains("Floating point"));
    }

    #[test]
    fn test_lexer_positions() {
        let mut lexer = Lexer::new("set(\n  \"k\"");
        assert_eq!(lexer.next_token().unwrap().column, 1);
        assert_eq!(lexer.next_token().unwrap().column, 4);
        let key = lexer.next_token().unwrap();
        assert_eq!((key.line, key.column), (2, 3));
    }

    #[test]
    fn test_lexer_unexpected_character() {
        let mut lexer = Lexer::new(".");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, column: 1, .. }));
    }
}
