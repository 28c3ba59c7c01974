//! Data statements: INSERT ... VALUES, DELETE, TRUNCATE TABLE
//!
//! ```sql
//! INSERT [INTO] [schema].[table] [(col, ...)] VALUES (v, ...)[, (v, ...)]
//! INSERT [INTO] [schema].[table] DEFAULT VALUES
//! DELETE [FROM] [schema].[table] [WHERE predicate]
//! TRUNCATE TABLE [schema].[table]
//! ```

use super::predicate::{parse_predicate, Predicate};
use super::token_parser_base::{parse_identifier_list, split_on_separators, TokenParser};
use super::token_set::TokenSet;
use super::tokenizer::{Token, TokenType};
use crate::model::{Name, SqlValue};

/// A value in an INSERT row; `None` stands for the `DEFAULT` keyword.
pub type InsertValue = Option<SqlValue>;

#[derive(Debug, Clone)]
pub struct ParsedInsert {
    pub table: Name,
    /// Explicit column list, if any
    pub columns: Option<Vec<String>>,
    pub rows: Vec<Vec<InsertValue>>,
}

#[derive(Debug, Clone)]
pub enum DeleteFilter {
    All,
    Where(Predicate),
    /// A WHERE clause that cannot be evaluated, kept as text for diagnostics
    Unsupported(String),
}

#[derive(Debug, Clone)]
pub struct ParsedDelete {
    pub table: Name,
    pub filter: DeleteFilter,
}

pub fn parse_insert(tokens: &[Token]) -> Option<ParsedInsert> {
    let mut parser = TokenParser::new(tokens);
    parser.expect_word("INSERT")?;
    parser.accept_word("INTO");
    let table = parser.parse_name()?;
    let columns = parser.parse_paren_group().map(parse_identifier_list);

    if parser.expect_words(&["DEFAULT", "VALUES"]).is_some() {
        return parser.is_at_end().then(|| ParsedInsert {
            table,
            columns: Some(Vec::new()),
            rows: vec![Vec::new()],
        });
    }

    parser.expect_word("VALUES")?;
    let mut rows = Vec::new();
    loop {
        let group = parser.parse_paren_group()?;
        rows.push(parse_values_row(group));
        if parser.expect_type(TokenType::Separator).is_none() {
            break;
        }
    }
    if !parser.is_at_end() {
        return None;
    }
    Some(ParsedInsert {
        table,
        columns,
        rows,
    })
}

fn parse_values_row(group: &Token) -> Vec<InsertValue> {
    split_on_separators(group.inner())
        .into_iter()
        .map(|segment| match segment {
            [only] if only.is_word("DEFAULT") => None,
            _ => Some(SqlValue::from_tokens(segment)),
        })
        .collect()
}

pub fn parse_delete(tokens: &[Token]) -> Option<ParsedDelete> {
    let mut parser = TokenParser::new(tokens);
    parser.expect_word("DELETE")?;
    if parser.check_word("TOP") {
        return None;
    }
    parser.accept_word("FROM");
    let table = parser.parse_name()?;

    if parser.is_at_end() {
        return Some(ParsedDelete {
            table,
            filter: DeleteFilter::All,
        });
    }
    parser.expect_word("WHERE")?;
    let clause = parser.remaining();
    let filter = match parse_predicate(clause) {
        Some(predicate) => DeleteFilter::Where(predicate),
        None => DeleteFilter::Unsupported(TokenSet::from_tokens(clause.to_vec()).render()),
    };
    Some(ParsedDelete { table, filter })
}

pub fn parse_truncate(tokens: &[Token]) -> Option<Name> {
    let mut parser = TokenParser::new(tokens);
    parser.expect_words(&["TRUNCATE", "TABLE"])?;
    let table = parser.parse_name()?;
    parser.is_at_end().then_some(table)
}
