//! Tokenizer and token equivalence tests

use rust_sqldiff::parser::{tokenize, TokenSet, TokenType};

fn equivalent(a: &str, b: &str) -> bool {
    tokenize(a).equivalent_to(&tokenize(b))
}

// ============================================================================
// Equivalence
// ============================================================================

#[test]
fn test_redundant_parens_are_ignored() {
    assert!(equivalent("(a)", "a"));
    assert!(equivalent("a", "(a)"));
    assert!(equivalent("((a)+[b])", "a + b"));
}

#[test]
fn test_equivalence_is_case_insensitive() {
    assert!(equivalent("GETDATE()", "getdate()"));
    assert!(equivalent("[Foo]", "foo"));
}

#[test]
fn test_different_text_is_not_equivalent() {
    assert!(!equivalent("a + b", "a - b"));
    assert!(!equivalent("'x'", "'y'"));
    assert!(!equivalent("(a, b)", "(a)"));
}

#[test]
fn test_call_arguments_keep_their_parens() {
    assert!(!equivalent("f(a)", "f a"));
    assert!(equivalent("ISNULL((x), 0)", "isnull(x, 0)"));
}

// ============================================================================
// Token tree
// ============================================================================

#[test]
fn test_group_owns_its_closer() {
    let set = tokenize("BEGIN SELECT 1 END");
    let tokens = set.tokens();
    assert_eq!(tokens.len(), 1);
    let children = tokens[0].children();
    assert_eq!(children.last().map(|t| t.token_type()), Some(TokenType::GroupEnd));
}

#[test]
fn test_group_span_covers_both_delimiters() {
    let text = "x (a, b) y";
    let set = tokenize(text);
    let group = &set.tokens()[1];
    assert_eq!(&text[group.start_index()..group.end_index()], "(a, b)");
}

#[test]
fn test_token_set_parse_matches_tokenize() {
    assert!(TokenSet::parse("SELECT 1").equivalent_to(&tokenize("select 1")));
}
