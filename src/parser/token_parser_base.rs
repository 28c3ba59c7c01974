//! Base token parser providing common helper methods for statement parsing.
//!
//! Every statement recognizer (`CREATE TABLE`, `ALTER TABLE`, `INSERT`, ...) wraps
//! a `TokenParser` over a slice of the token tree and delegates navigation to it:
//!
//! ```ignore
//! let mut parser = TokenParser::new(statement.tokens());
//! parser.expect_word("CREATE")?;
//! parser.expect_word("TABLE")?;
//! let name = parser.parse_name()?;
//! let columns = parser.parse_paren_group()?;
//! ```
//!
//! Groups are already nested by the tokenizer, so "skip a parenthesized
//! expression" is a single `advance()`.

use super::identifier_utils::normalize_identifier;
use super::tokenizer::{Token, TokenType};
use crate::model::Name;

/// Cursor over a token slice.
pub struct TokenParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    // ========================================================================
    // Position and state
    // ========================================================================

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    /// Tokens from the current position to the end.
    #[inline]
    pub fn remaining(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    // ========================================================================
    // Token access
    // ========================================================================

    #[inline]
    pub fn current_token(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Peek at a token at an offset from current position.
    #[inline]
    pub fn peek(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    #[inline]
    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Consume and return the current token.
    pub fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.current_token()?;
        self.advance();
        Some(token)
    }

    // ========================================================================
    // Token checks
    // ========================================================================

    /// Check if current token is the given word (case-insensitive, unquoted).
    #[inline]
    pub fn check_word(&self, word: &str) -> bool {
        self.current_token().is_some_and(|t| t.is_word(word))
    }

    /// Check a sequence of words starting at the current token.
    pub fn check_words(&self, words: &[&str]) -> bool {
        words
            .iter()
            .enumerate()
            .all(|(i, w)| self.peek(i).is_some_and(|t| t.is_word(w)))
    }

    #[inline]
    pub fn check_type(&self, token_type: TokenType) -> bool {
        self.current_token()
            .is_some_and(|t| t.token_type() == token_type)
    }

    // ========================================================================
    // Expect methods (check and advance)
    // ========================================================================

    /// Expect a word, advancing if found. Position is unchanged on `None`.
    pub fn expect_word(&mut self, word: &str) -> Option<()> {
        if self.check_word(word) {
            self.advance();
            Some(())
        } else {
            None
        }
    }

    /// Expect a sequence of words; either all are consumed or none.
    pub fn expect_words(&mut self, words: &[&str]) -> Option<()> {
        if self.check_words(words) {
            self.pos += words.len();
            Some(())
        } else {
            None
        }
    }

    /// Consume the word if present.
    pub fn accept_word(&mut self, word: &str) -> bool {
        self.expect_word(word).is_some()
    }

    /// Consume the first of `words` that matches, returning it uppercased.
    pub fn accept_any_word(&mut self, words: &[&str]) -> Option<String> {
        let found = words.iter().find(|w| self.check_word(w))?;
        self.advance();
        Some(found.to_ascii_uppercase())
    }

    pub fn expect_type(&mut self, token_type: TokenType) -> Option<&'a Token> {
        if self.check_type(token_type) {
            self.next_token()
        } else {
            None
        }
    }

    // ========================================================================
    // Identifier parsing
    // ========================================================================

    /// Parse a single-part identifier, returning it without brackets/quotes.
    pub fn parse_identifier(&mut self) -> Option<String> {
        let token = self.current_token()?;
        if !token.is_name_like() {
            return None;
        }
        self.advance();
        Some(normalize_identifier(token.value()))
    }

    /// Parse a possibly qualified object name.
    pub fn parse_name(&mut self) -> Option<Name> {
        let token = self.current_token()?;
        if !token.is_name_like() {
            return None;
        }
        let name = Name::parse(token.value())?;
        self.advance();
        Some(name)
    }

    /// Consume a `( ... )` group.
    pub fn parse_paren_group(&mut self) -> Option<&'a Token> {
        let token = self.current_token()?;
        if !token.is_paren_group() {
            return None;
        }
        self.advance();
        Some(token)
    }

    // ========================================================================
    // Numeric parsing
    // ========================================================================

    /// Parse a signed integer (optional leading `-` or `+`).
    pub fn parse_signed_integer(&mut self) -> Option<i64> {
        let start = self.pos;
        let negative = match self.current_token() {
            Some(t) if t.token_type() == TokenType::Operator && t.value() == "-" => {
                self.advance();
                true
            }
            Some(t) if t.token_type() == TokenType::Operator && t.value() == "+" => {
                self.advance();
                false
            }
            _ => false,
        };
        match self.current_token() {
            Some(t) if t.token_type() == TokenType::Number => match t.value().parse::<i64>() {
                Ok(value) => {
                    self.advance();
                    Some(if negative { -value } else { value })
                }
                Err(_) => {
                    self.pos = start;
                    None
                }
            },
            _ => {
                self.pos = start;
                None
            }
        }
    }

    // ========================================================================
    // Utility methods
    // ========================================================================

    /// Consume tokens until one of `words` (or the end) is reached; the stop word
    /// is not consumed.
    pub fn take_until_words(&mut self, words: &[&str]) -> &'a [Token] {
        let start = self.pos;
        while !self.is_at_end() && !words.iter().any(|w| self.check_word(w)) {
            self.advance();
        }
        &self.tokens[start..self.pos]
    }
}

/// Split a token slice on top-level `,` separators. Empty segments are dropped.
pub fn split_on_separators(tokens: &[Token]) -> Vec<&[Token]> {
    tokens
        .split(|t| t.token_type() == TokenType::Separator)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Identifier names listed in a `( ... )` group, e.g. a column list.
pub fn parse_identifier_list(group: &Token) -> Vec<String> {
    split_on_separators(group.inner())
        .into_iter()
        .filter_map(|segment| {
            let mut parser = TokenParser::new(segment);
            parser.parse_identifier()
        })
        .collect()
}
