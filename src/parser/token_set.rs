//! Token sequences and structural equivalence

use super::tokenizer::{render_sequence, tokenize, Token, TokenType};

/// An ordered sequence of top-level tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSet {
    tokens: Vec<Token>,
}

impl TokenSet {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Tokenize `text`.
    pub fn parse(text: &str) -> Self {
        tokenize(text)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// SQL text rebuilt from the tokens.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_sequence(&self.tokens, &mut out);
        out
    }

    /// Depth-first iteration over every token, including group children.
    pub fn walk(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().flat_map(|t| t.walk())
    }

    /// Structural comparison that ignores case and redundant `( ... )` wrapping.
    ///
    /// `(a)`, `a`, and `((a))` are equivalent; `((a)+[b])` is equivalent to `a + b`.
    pub fn equivalent_to(&self, other: &TokenSet) -> bool {
        sequences_equivalent(&self.tokens, &other.tokens)
    }
}

impl From<Vec<Token>> for TokenSet {
    fn from(tokens: Vec<Token>) -> Self {
        Self::from_tokens(tokens)
    }
}

/// Remove parentheses that wrap an entire sequence.
fn unwrap_redundant(mut tokens: &[Token]) -> &[Token] {
    while tokens.len() == 1 && tokens[0].is_paren_group() {
        tokens = tokens[0].inner();
    }
    tokens
}

/// Words that may precede a parenthesized operand without calling it
const OPERAND_WORDS: &[&str] = &[
    "AND", "OR", "NOT", "WHEN", "THEN", "ELSE", "WHERE", "ON", "AS", "RETURN", "SELECT",
];

/// A group right after a name is an argument list, never redundant.
fn is_argument_list(tokens: &[Token], i: usize) -> bool {
    i > 0
        && tokens[i].is_paren_group()
        && tokens[i - 1].is_name_like()
        && !OPERAND_WORDS.iter().any(|w| tokens[i - 1].is_word(w))
}

pub(crate) fn sequences_equivalent(a: &[Token], b: &[Token]) -> bool {
    let a = unwrap_redundant(a);
    let b = unwrap_redundant(b);
    a.len() == b.len()
        && (0..a.len()).all(|i| {
            if is_argument_list(a, i) || is_argument_list(b, i) {
                a[i].is_paren_group()
                    && b[i].is_paren_group()
                    && sequences_equivalent(a[i].inner(), b[i].inner())
            } else {
                tokens_equivalent(&a[i], &b[i])
            }
        })
}

fn tokens_equivalent(a: &Token, b: &Token) -> bool {
    match (a.is_paren_group(), b.is_paren_group()) {
        (true, true) => sequences_equivalent(a.inner(), b.inner()),
        (true, false) => sequences_equivalent(a.inner(), std::slice::from_ref(b)),
        (false, true) => sequences_equivalent(std::slice::from_ref(a), b.inner()),
        (false, false) => {
            same_class(a.token_type(), b.token_type())
                && a.normalized_value() == b.normalized_value()
                && (!a.is_group() || sequences_equivalent(a.inner(), b.inner()))
        }
    }
}

/// Keywords and identifiers compare as one class so that `[name]` matches `name`.
fn same_class(a: TokenType, b: TokenType) -> bool {
    let word = |t| matches!(t, TokenType::Keyword | TokenType::Identifier);
    a == b || (word(a) && word(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(a: &str, b: &str) -> bool {
        TokenSet::parse(a).equivalent_to(&TokenSet::parse(b))
    }

    #[test]
    fn test_redundant_parens() {
        assert!(eq("(a)", "a"));
        assert!(eq("a", "(a)"));
        assert!(eq("((0))", "0"));
    }

    #[test]
    fn test_nested_with_brackets() {
        assert!(eq("((a)+[b])", "a + b"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(eq("GETDATE()", "getdate()"));
        assert!(eq("'Foo'", "'foo'"));
    }

    #[test]
    fn test_differences() {
        assert!(!eq("a + b", "a - b"));
        assert!(!eq("(a, b)", "(a)"));
        assert!(!eq("'1'", "1"));
        assert!(!eq("f(a)", "f(b)"));
    }

    #[test]
    fn test_function_call_parens_are_not_redundant() {
        assert!(eq("getdate()", "(getdate())"));
        assert!(!eq("getdate()", "getdate"));
        assert!(!eq("f(a)", "f a"));
        assert!(!eq("f a", "f(a)"));
        assert!(eq("f((a))", "f(a)"));
        assert!(eq("x AND (y)", "x and y"));
    }

    #[test]
    fn test_empty_sets() {
        assert!(TokenSet::default().equivalent_to(&TokenSet::parse("")));
    }
}
