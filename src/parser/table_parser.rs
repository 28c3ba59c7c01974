//! Token-based CREATE TABLE parsing
//!
//! ```sql
//! CREATE TABLE [schema].[name] (
//!     [Col1] INT IDENTITY(1,1) NOT NULL,
//!     [Col2] NVARCHAR(50) CONSTRAINT [DF_x] DEFAULT 'value',
//!     CONSTRAINT [PK_x] PRIMARY KEY CLUSTERED ([Col1])
//! ) [ON filegroup] [WITH (...)]
//! ```

use super::column_parser::{ColumnTokenParser, ParsedColumn};
use super::constraint_parser::{starts_table_constraint, ConstraintTokenParser, ParsedConstraint};
use super::identifier_utils::is_local_identifier;
use super::token_parser_base::{split_on_separators, TokenParser};
use super::tokenizer::Token;
use crate::model::Name;

/// Result of parsing a table definition
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub name: Name,
    pub columns: Vec<ParsedColumn>,
    pub constraints: Vec<ParsedConstraint>,
}

/// Parse `CREATE TABLE`. Temporary tables are not part of the schema and are
/// not recognized.
pub fn parse_create_table(tokens: &[Token]) -> Option<ParsedTable> {
    let mut parser = TokenParser::new(tokens);
    parser.expect_words(&["CREATE", "TABLE"])?;
    let name = parser.parse_name()?;
    if is_local_identifier(name.object_name()) {
        return None;
    }
    let group = parser.parse_paren_group()?;
    let (columns, constraints) = parse_table_elements(group)?;
    Some(ParsedTable {
        name,
        columns,
        constraints,
    })
}

/// Split the body of a table (or table type) into columns and constraints.
pub(crate) fn parse_table_elements(
    group: &Token,
) -> Option<(Vec<ParsedColumn>, Vec<ParsedConstraint>)> {
    let mut columns = Vec::new();
    let mut constraints = Vec::new();
    for item in split_on_separators(group.inner()) {
        if starts_table_constraint(item) {
            constraints.push(ConstraintTokenParser::new(item).parse_table_constraint()?);
        } else {
            columns.push(ColumnTokenParser::new(item).parse()?);
        }
    }
    if columns.is_empty() {
        return None;
    }
    Some((columns, constraints))
}
