//! Token-based table type definition parsing for T-SQL
//!
//! ## Supported Syntax
//!
//! ```sql
//! CREATE TYPE [schema].[name] AS TABLE (
//!     [Col1] INT NOT NULL,
//!     [Col2] NVARCHAR(50) DEFAULT 'value',
//!     PRIMARY KEY CLUSTERED ([Col1]),
//!     UNIQUE NONCLUSTERED ([Col2])
//! )
//! ```
//!
//! Alias types (`CREATE TYPE x FROM varchar(10)`) are not recognized.

use super::constraint_parser::ParsedConstraint;
use super::table_parser::parse_table_elements;
use super::token_parser_base::TokenParser;
use super::tokenizer::Token;
use crate::model::{Column, TableType};

/// Parse `CREATE TYPE ... AS TABLE` into a table type.
pub fn parse_create_table_type(tokens: &[Token]) -> Option<TableType> {
    let mut parser = TokenParser::new(tokens);
    parser.expect_words(&["CREATE", "TYPE"])?;
    let name = parser.parse_name()?;
    parser.expect_words(&["AS", "TABLE"])?;
    let group = parser.parse_paren_group()?;
    let (parsed_columns, constraints) = parse_table_elements(group)?;

    let mut primary_key = None;
    let mut columns: Vec<Column> = Vec::with_capacity(parsed_columns.len());
    for parsed in parsed_columns {
        for constraint in &parsed.constraints {
            if let ParsedConstraint::PrimaryKey { columns, .. } = constraint {
                primary_key = Some(columns.clone());
            }
        }
        columns.push(parsed.column);
    }
    for constraint in constraints {
        if let ParsedConstraint::PrimaryKey { columns, .. } = constraint {
            primary_key = Some(columns);
        }
    }

    Some(TableType {
        name,
        columns,
        primary_key,
    })
}
