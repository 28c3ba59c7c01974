//! Views, functions, and stored procedures
//!
//! ```sql
//! CREATE [OR ALTER] VIEW [schema].[name] AS SELECT ...
//! CREATE [OR ALTER] FUNCTION [schema].[name] (@p INT) RETURNS ...
//! CREATE [OR ALTER] {PROCEDURE|PROC} [schema].[name] @p INT AS ...
//! ALTER {VIEW|FUNCTION|PROCEDURE|PROC} ...
//! ```
//!
//! Bodies are kept as text and tokens; they are not interpreted.

use std::collections::BTreeSet;

use super::identifier_utils::is_local_identifier;
use super::token_parser_base::TokenParser;
use super::token_set::TokenSet;
use super::tokenizer::Token;
use crate::model::{Name, Routine, RoutineKind};

/// Whether `tokens` start a routine definition, whose body runs to the end of
/// the batch.
pub fn is_routine_start(tokens: &[Token]) -> bool {
    let mut parser = TokenParser::new(tokens);
    parse_routine_header(&mut parser).is_some()
}

fn parse_routine_header(parser: &mut TokenParser) -> Option<RoutineKind> {
    if parser.accept_word("CREATE") {
        parser.expect_words(&["OR", "ALTER"]);
    } else {
        parser.expect_word("ALTER")?;
    }
    match parser.accept_any_word(&["VIEW", "FUNCTION", "PROCEDURE", "PROC"])?.as_str() {
        "VIEW" => Some(RoutineKind::View),
        "FUNCTION" => Some(RoutineKind::Function),
        _ => Some(RoutineKind::Procedure),
    }
}

/// Parse a routine definition. `source` is the text the tokens were read from.
pub fn parse_routine(tokens: &[Token], source: &str) -> Option<Routine> {
    let mut parser = TokenParser::new(tokens);
    let kind = parse_routine_header(&mut parser)?;
    let name = parser.parse_name()?;
    let body = parser.remaining();

    let start = tokens.first()?.start_index();
    let end = tokens.last()?.end_index();
    let definition = source.get(start..end)?.trim().to_string();

    Some(Routine {
        references: referenced_names(body, &name),
        name,
        kind,
        definition,
        body: TokenSet::from_tokens(body.to_vec()),
    })
}

/// Every name-like token of `tokens` as an object name, excluding `own` and
/// local variables.
pub fn referenced_names(tokens: &[Token], own: &Name) -> Vec<Name> {
    let mut names = BTreeSet::new();
    for token in tokens.iter().flat_map(|t| t.walk()) {
        if !token.is_name_like() || is_local_identifier(token.value()) {
            continue;
        }
        if let Some(name) = Name::parse(token.value()) {
            if &name != own {
                names.insert(name);
            }
        }
    }
    names.into_iter().collect()
}
