//! SQL tokenizer producing a nested token tree.
//!
//! Lexing is delegated to sqlparser's MsSql tokenizer; this module converts its
//! flat token stream into [`Token`]s with byte offsets, merges dotted identifiers,
//! and nests everything between `(`/`)` and `BEGIN`/`CASE`..`END` under the
//! opening token. The closing delimiter is kept as the last child of its group.
//!
//! Tokenizing never fails. Input that sqlparser rejects (unterminated strings,
//! comments, or quoted identifiers) is tokenized up to the broken construct and
//! the remainder becomes a single token.

use sqlparser::dialect::MsSqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Location, Token as SqlToken, TokenWithSpan, Tokenizer};

use super::token_set::TokenSet;

/// Classification of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Keyword,
    Identifier,
    Number,
    StringValue,
    Operator,
    Separator,
    GroupBegin,
    GroupEnd,
    Semicolon,
}

/// A token and, for group openers, everything up to its matching closer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    token_type: TokenType,
    value: String,
    raw: String,
    unicode: bool,
    start_index: usize,
    end_index: usize,
    children: Vec<Token>,
}

impl Token {
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Token text. String literals are unquoted and unescaped, without the `N` prefix.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Byte offset of the first character of the lexeme.
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Byte offset one past the lexeme. For groups this is one past the matching closer.
    pub fn end_index(&self) -> usize {
        self.end_index
    }

    pub fn children(&self) -> &[Token] {
        &self.children
    }

    /// Whether a string literal carried the `N` prefix.
    pub fn is_unicode(&self) -> bool {
        self.unicode
    }

    pub fn is_group(&self) -> bool {
        self.token_type == TokenType::GroupBegin
    }

    /// A `( ... )` group.
    pub fn is_paren_group(&self) -> bool {
        self.is_group() && self.value == "("
    }

    /// Children without the trailing closing delimiter.
    pub fn inner(&self) -> &[Token] {
        match self.children.last() {
            Some(last) if last.token_type == TokenType::GroupEnd => {
                &self.children[..self.children.len() - 1]
            }
            _ => &self.children,
        }
    }

    /// Case-insensitive match against an unquoted word.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(
            self.token_type,
            TokenType::Keyword | TokenType::Identifier | TokenType::GroupBegin | TokenType::GroupEnd
        ) && !self.raw.starts_with('[')
            && !self.raw.starts_with('"')
            && self.value.eq_ignore_ascii_case(word)
    }

    /// Keyword or identifier
    pub fn is_name_like(&self) -> bool {
        matches!(self.token_type, TokenType::Keyword | TokenType::Identifier)
    }

    /// Text used when comparing tokens: lowercase, identifier quoting removed.
    pub fn normalized_value(&self) -> String {
        match self.token_type {
            TokenType::Identifier => super::identifier_utils::comparison_key(&self.value),
            _ => self.value.to_lowercase(),
        }
    }

    /// Reassemble SQL text for this token and its children.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(&self.raw);
        if self.is_group() {
            let inner = self.inner();
            let block = !self.is_paren_group();
            if block && !inner.is_empty() {
                out.push(' ');
            }
            render_sequence(inner, out);
            if let Some(last) = self.children.last() {
                if last.token_type == TokenType::GroupEnd {
                    if block {
                        out.push(' ');
                    }
                    out.push_str(&last.raw);
                }
            }
        }
    }

    /// Depth-first iteration over this token and all descendants.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Token> + '_> {
        Box::new(std::iter::once(self).chain(self.children.iter().flat_map(|c| c.walk())))
    }
}

/// Render a token sequence with single spaces, omitting them around `,`, `.`,
/// before `)` and between a word and a following `(` group.
pub fn render_sequence(tokens: &[Token], out: &mut String) {
    let mut previous: Option<&Token> = None;
    for token in tokens {
        if let Some(prev) = previous {
            let tight = token.token_type == TokenType::Separator
                || token.token_type == TokenType::Semicolon
                || prev.token_type == TokenType::Separator
                || (token.is_paren_group() && prev.is_name_like());
            if !tight {
                out.push(' ');
            }
        }
        token.render_into(out);
        previous = Some(token);
    }
}

/// Tokenize SQL text into a token tree.
pub fn tokenize(text: &str) -> TokenSet {
    let flat = tokenize_flat(text, 0);
    TokenSet::from_tokens(build_tree(flat))
}

/// A lexeme before grouping
#[derive(Debug, Clone)]
struct Lexeme {
    token_type: TokenType,
    value: String,
    raw: String,
    unicode: bool,
    start: usize,
    end: usize,
}

impl Lexeme {
    fn into_token(self) -> Token {
        Token {
            token_type: self.token_type,
            value: self.value,
            raw: self.raw,
            unicode: self.unicode,
            start_index: self.start,
            end_index: self.end,
            children: Vec::new(),
        }
    }
}

/// Words that follow `BEGIN` when it starts a statement rather than a block.
const BEGIN_STATEMENT_WORDS: &[&str] = &["TRAN", "TRANSACTION", "DISTRIBUTED", "DIALOG", "CONVERSATION"];

fn tokenize_flat(text: &str, base: usize) -> Vec<Lexeme> {
    let dialect = MsSqlDialect {};
    match Tokenizer::new(&dialect, text).tokenize_with_location() {
        Ok(tokens) => classify(text, base, &tokens),
        Err(_) => match unterminated_tail(text) {
            Some(start) if start < text.len() => {
                let mut lexemes = tokenize_flat(&text[..start], base);
                lexemes.extend(tail_lexeme(&text[start..], base + start));
                lexemes
            }
            _ => text
                .split_whitespace()
                .map(|word| {
                    let offset = word.as_ptr() as usize - text.as_ptr() as usize;
                    Lexeme {
                        token_type: TokenType::Identifier,
                        value: word.to_string(),
                        raw: word.to_string(),
                        unicode: false,
                        start: base + offset,
                        end: base + offset + word.len(),
                    }
                })
                .collect(),
        },
    }
}

/// Convert sqlparser tokens to lexemes, dropping whitespace and comments.
fn classify(text: &str, base: usize, tokens: &[TokenWithSpan]) -> Vec<Lexeme> {
    let mut offsets = OffsetMap::new(text);
    let mut lexemes: Vec<Lexeme> = Vec::with_capacity(tokens.len());

    for token in tokens {
        let start = offsets.byte_offset(token.span.start);
        let end = offsets.byte_offset(token.span.end);
        let raw = &text[start..end];

        let (token_type, value, unicode) = match &token.token {
            SqlToken::Whitespace(_) | SqlToken::EOF => continue,
            SqlToken::Word(w) => {
                if w.quote_style.is_none() && w.keyword != Keyword::NoKeyword {
                    (TokenType::Keyword, raw.to_string(), false)
                } else {
                    (TokenType::Identifier, raw.to_string(), false)
                }
            }
            SqlToken::Number(_, _) | SqlToken::HexStringLiteral(_) => {
                (TokenType::Number, raw.to_string(), false)
            }
            SqlToken::SingleQuotedString(s) => (TokenType::StringValue, s.clone(), false),
            SqlToken::NationalStringLiteral(s) => (TokenType::StringValue, s.clone(), true),
            SqlToken::LParen => (TokenType::GroupBegin, raw.to_string(), false),
            SqlToken::RParen => (TokenType::GroupEnd, raw.to_string(), false),
            SqlToken::Comma => (TokenType::Separator, raw.to_string(), false),
            SqlToken::SemiColon => (TokenType::Semicolon, raw.to_string(), false),
            _ => (TokenType::Operator, raw.to_string(), false),
        };

        let lexeme = Lexeme {
            token_type,
            value,
            raw: raw.to_string(),
            unicode,
            start: base + start,
            end: base + end,
        };

        if !merge_dotted(&mut lexemes, &lexeme) {
            lexemes.push(lexeme);
        }
    }

    mark_blocks(&mut lexemes);
    lexemes
}

/// Merge `a.b`, `a..b` and `a.*` into one identifier lexeme.
fn merge_dotted(lexemes: &mut [Lexeme], next: &Lexeme) -> bool {
    let Some(last) = lexemes.last_mut() else {
        return false;
    };
    if last.end != next.start {
        return false;
    }
    let last_is_dot_open = last.raw.ends_with('.');
    let next_is_dot = next.token_type == TokenType::Operator && next.raw == ".";
    let last_is_word = matches!(last.token_type, TokenType::Keyword | TokenType::Identifier);
    let next_is_word = matches!(next.token_type, TokenType::Keyword | TokenType::Identifier)
        || (next.token_type == TokenType::Operator && next.raw == "*");

    if (last_is_word && next_is_dot) || (last_is_dot_open && (next_is_word || next_is_dot)) {
        last.raw.push_str(&next.raw);
        last.value.push_str(&next.raw);
        last.end = next.end;
        last.token_type = TokenType::Identifier;
        true
    } else {
        false
    }
}

/// Turn `BEGIN`, `CASE` and `END` keywords into group delimiters.
fn mark_blocks(lexemes: &mut [Lexeme]) {
    for i in 0..lexemes.len() {
        if lexemes[i].token_type != TokenType::Keyword {
            continue;
        }
        let word = lexemes[i].value.to_ascii_uppercase();
        match word.as_str() {
            "BEGIN" => {
                let starts_statement = lexemes.get(i + 1).is_some_and(|next| {
                    BEGIN_STATEMENT_WORDS
                        .iter()
                        .any(|w| next.value.eq_ignore_ascii_case(w))
                });
                if !starts_statement {
                    lexemes[i].token_type = TokenType::GroupBegin;
                }
            }
            "CASE" => lexemes[i].token_type = TokenType::GroupBegin,
            "END" => lexemes[i].token_type = TokenType::GroupEnd,
            _ => {}
        }
    }
}

fn is_paren(lexeme: &Token) -> bool {
    lexeme.raw == "(" || lexeme.raw == ")"
}

/// Nest lexemes under their group openers.
fn build_tree(lexemes: Vec<Lexeme>) -> Vec<Token> {
    let mut roots: Vec<Token> = Vec::new();
    let mut open: Vec<Token> = Vec::new();

    fn push(open: &mut [Token], roots: &mut Vec<Token>, token: Token) {
        match open.last_mut() {
            Some(group) => group.children.push(token),
            None => roots.push(token),
        }
    }

    fn close_implicitly(mut group: Token) -> Token {
        if let Some(last) = group.children.last() {
            group.end_index = group.end_index.max(last.end_index);
        }
        group
    }

    for lexeme in lexemes {
        let token = lexeme.into_token();
        match token.token_type {
            TokenType::GroupBegin => open.push(token),
            TokenType::GroupEnd => {
                let paren = is_paren(&token);
                match open.iter().rposition(|g| is_paren(g) == paren) {
                    Some(pos) => {
                        while open.len() > pos + 1 {
                            if let Some(inner) = open.pop() {
                                let inner = close_implicitly(inner);
                                push(&mut open, &mut roots, inner);
                            }
                        }
                        if let Some(mut group) = open.pop() {
                            group.end_index = token.end_index;
                            group.children.push(token);
                            push(&mut open, &mut roots, group);
                        }
                    }
                    None => push(&mut open, &mut roots, token),
                }
            }
            _ => push(&mut open, &mut roots, token),
        }
    }

    while let Some(group) = open.pop() {
        let group = close_implicitly(group);
        push(&mut open, &mut roots, group);
    }

    roots
}

/// Tracks sqlparser's (line, column) positions as byte offsets. sqlparser counts
/// columns in characters and only `\n` starts a new line.
struct OffsetMap<'a> {
    text: &'a str,
    byte: usize,
    line: u64,
    column: u64,
}

impl<'a> OffsetMap<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            line: 1,
            column: 1,
        }
    }

    fn byte_offset(&mut self, location: Location) -> usize {
        while (self.line, self.column) < (location.line, location.column) {
            let Some(c) = self.text[self.byte..].chars().next() else {
                break;
            };
            self.byte += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.byte
    }
}

/// Find where an unterminated string, quoted identifier, or block comment begins.
fn unterminated_tail(text: &str) -> Option<usize> {
    #[derive(PartialEq)]
    enum State {
        Normal,
        LineComment,
        BlockComment(usize),
        Quoted(usize, char),
    }

    let bytes = text.as_bytes();
    let mut state = State::Normal;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match state {
            State::Normal => {
                if c == b'-' && bytes.get(i + 1) == Some(&b'-') {
                    state = State::LineComment;
                    i += 1;
                } else if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
                    state = State::BlockComment(i);
                    i += 1;
                } else if c == b'\'' {
                    let start = if i > 0 && (bytes[i - 1] == b'N' || bytes[i - 1] == b'n') {
                        i - 1
                    } else {
                        i
                    };
                    state = State::Quoted(start, '\'');
                } else if c == b'[' {
                    state = State::Quoted(i, ']');
                } else if c == b'"' {
                    state = State::Quoted(i, '"');
                }
            }
            State::LineComment => {
                if c == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(_) => {
                if c == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    state = State::Normal;
                    i += 1;
                }
            }
            State::Quoted(_, close) => {
                if c == close as u8 {
                    if bytes.get(i + 1) == Some(&(close as u8)) {
                        i += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
        }
        i += 1;
    }

    match state {
        State::BlockComment(start) | State::Quoted(start, _) => Some(start),
        _ => None,
    }
}

/// The single token standing in for an unterminated construct.
fn tail_lexeme(tail: &str, start: usize) -> Option<Lexeme> {
    if tail.starts_with("/*") {
        return None;
    }
    let (token_type, value, unicode) = if let Some(rest) = tail.strip_prefix('\'') {
        (TokenType::StringValue, rest.replace("''", "'"), false)
    } else if let Some(rest) = tail
        .strip_prefix("N'")
        .or_else(|| tail.strip_prefix("n'"))
    {
        (TokenType::StringValue, rest.replace("''", "'"), true)
    } else {
        (TokenType::Identifier, tail.to_string(), false)
    };
    Some(Lexeme {
        token_type,
        value,
        raw: tail.to_string(),
        unicode,
        start,
        end: start + tail.len(),
    })
}
