//! Parser for preference directive files (user.js style)
//!
//! This module provides a recursive descent parser that turns directive text
//! into a [`PreferenceSet`].
//!
//! # Format
//!
//! ```text
//! // Disable battery API
//! set("dom.battery.enabled", false);
//! user_pref("network.cookie.cookieBehavior", 5); // reject trackers
//! ```
//!
//! Comment lines are collected and attached to the directive that follows
//! them. Blank lines between comment groups are remembered as separators. A
//! `//` comment on the same line after a directive becomes its trailing
//! comment. Comments after the last directive are kept on the set itself.
//!
//! # Example
//!
//! ```rust
//! use prefset::{load, PrefValue};
//!
//! let set = load(r#"
//!     // Disable battery API
//!     set("dom.battery.enabled", false);
//! "#)?;
//! let entry = set.get("dom.battery.enabled").unwrap();
//! assert_eq!(entry.value, PrefValue::Bool(false));
//! assert_eq!(entry.comment.as_ref().unwrap().text(), "Disable battery API");
//! # Ok::<(), prefset::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Spanned, Token};
use crate::types::{Comment, CommentLine, PrefFunction, PrefValue, PreferenceEntry, PreferenceSet};
use std::path::Path;

/// Parse directive text into an ordered preference set
///
/// Repeated keys keep only their last occurrence; each repeat is recorded in
/// [`PreferenceSet::overrides`].
pub fn load(content: &str) -> Result<PreferenceSet> {
    let mut parser = Parser::new(content)?;
    let set = parser.parse()?;
    tracing::debug!(
        entries = set.len(),
        overrides = set.overrides().len(),
        "loaded preference set"
    );
    Ok(set)
}

/// Read and parse a preference file
///
/// A missing file is reported as [`Error::NotFound`].
pub fn load_file(path: &Path) -> Result<PreferenceSet> {
    tracing::debug!(path = %path.display(), "reading preference file");
    let content = std::fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
    load(&content)
}

/// Parser for preference directive files
struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Current lookahead token
    current: Spanned,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    /// Parse the whole input
    fn parse(&mut self) -> Result<PreferenceSet> {
        let mut entries: Vec<PreferenceEntry> = Vec::new();
        let mut pending = Comment::default();
        // Last line occupied by a consumed comment or directive
        let mut last_line = 0;
        // Line holding the `;` of the most recent directive
        let mut directive_end = 0;

        loop {
            match &self.current.token {
                Token::Eof => break,
                Token::LineComment(_) | Token::BlockComment(_) => {
                    let spanned = self.advance()?;

                    if let Token::LineComment(text) = &spanned.token {
                        if spanned.line == directive_end && pending.is_empty() {
                            if let Some(last) = entries.last_mut() {
                                last.trailing_comment = Some(text.clone());
                                continue;
                            }
                        }
                    }

                    if !pending.is_empty() && spanned.line > last_line + 1 {
                        pending.lines.push(CommentLine::Blank);
                    }
                    pending.lines.push(match spanned.token {
                        Token::LineComment(text) => CommentLine::Line(text),
                        Token::BlockComment(text) => CommentLine::Block(text),
                        _ => unreachable!(),
                    });
                    last_line = spanned.end_line;
                }
                _ => {
                    let start_line = self.current.line;
                    if !pending.is_empty() && start_line > last_line + 1 {
                        pending.lines.push(CommentLine::Blank);
                    }

                    let (mut entry, end_line) = self.parse_directive()?;
                    if !pending.is_empty() {
                        entry.comment = Some(std::mem::take(&mut pending));
                    }
                    tracing::trace!(key = %entry.key, line = entry.line, "parsed directive");
                    entries.push(entry);

                    last_line = end_line;
                    directive_end = end_line;
                }
            }
        }

        let mut set: PreferenceSet = entries.into_iter().collect();
        if !pending.is_empty() {
            pending.trim_end();
            set.trailing_comment = Some(pending);
        }
        Ok(set)
    }

    /// Parse one directive: function "(" key "," value ")" ";"
    ///
    /// Returns the entry and the line of its closing semicolon.
    fn parse_directive(&mut self) -> Result<(PreferenceEntry, usize)> {
        let line = self.current.line;
        let function = self.parse_function()?;

        self.expect(Token::LeftParen)?;
        let key = self.expect_key()?;
        self.expect(Token::Comma)?;
        let value = self.parse_value()?;
        self.expect(Token::RightParen)?;
        let semicolon = self.expect(Token::Semicolon)?;

        let entry = PreferenceEntry {
            key,
            value,
            function,
            comment: None,
            trailing_comment: None,
            line,
        };
        Ok((entry, semicolon.end_line))
    }

    fn parse_function(&mut self) -> Result<PrefFunction> {
        match &self.current.token {
            Token::Identifier(ident) => match PrefFunction::from_ident(ident) {
                Some(function) => {
                    self.advance_in_directive()?;
                    Ok(function)
                }
                None => Err(self.error(format!(
                    "Unknown directive function '{}'. Expected set, user_pref, pref, lock_pref, or sticky_pref",
                    ident
                ))),
            },
            token => Err(self.error(format!(
                "Expected directive (e.g. set(\"key\", value);), got {}",
                token.describe()
            ))),
        }
    }

    fn expect_key(&mut self) -> Result<String> {
        match &self.current.token {
            Token::String(_) => match self.advance_in_directive()?.token {
                Token::String(key) => Ok(key),
                _ => unreachable!(),
            },
            token => Err(self.error(format!(
                "Expected quoted preference key, got {}",
                token.describe()
            ))),
        }
    }

    /// Parse a literal value (boolean, integer, string)
    fn parse_value(&mut self) -> Result<PrefValue> {
        let value = match &self.current.token {
            Token::Boolean(b) => PrefValue::Bool(*b),
            Token::Integer(n) => {
                if i32::try_from(*n).is_err() {
                    return Err(self.error(format!(
                        "Integer value {} does not fit in 32 bits",
                        n
                    )));
                }
                PrefValue::Integer(*n)
            }
            Token::String(_) => match self.advance_in_directive()?.token {
                Token::String(s) => return Ok(PrefValue::String(s)),
                _ => unreachable!(),
            },
            token => {
                return Err(self.error(format!(
                    "Expected boolean, integer, or string literal, got {}",
                    token.describe()
                )))
            }
        };
        self.advance_in_directive()?;
        Ok(value)
    }

    /// Expect a specific token and consume it
    fn expect(&mut self, expected: Token) -> Result<Spanned> {
        if self.current.token == expected {
            self.advance_in_directive()
        } else {
            Err(self.error(format!(
                "Expected {}, got {}",
                expected.describe(),
                self.current.token.describe()
            )))
        }
    }

    /// Move to the next token, returning the one consumed
    fn advance(&mut self) -> Result<Spanned> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Like [`Self::advance`], but drops comments found inside a directive
    fn advance_in_directive(&mut self) -> Result<Spanned> {
        let consumed = self.advance()?;
        while matches!(
            self.current.token,
            Token::LineComment(_) | Token::BlockComment(_)
        ) && !self.at_directive_tail(&consumed)
        {
            tracing::debug!(line = self.current.line, "dropping comment inside directive");
            self.advance()?;
        }
        Ok(consumed)
    }

    /// A comment right after the closing `;` belongs to the directive list
    fn at_directive_tail(&self, consumed: &Spanned) -> bool {
        consumed.token == Token::Semicolon
    }

    fn error(&self, message: String) -> Error {
        Error::parse(self.current.line, self.current.column, message)
    }
}
