//! Statement splitting and recognition
//!
//! A script is split into statements on top-level `;`, on `GO`, and before
//! words that can only start a statement (`CREATE`, `INSERT`, ...). View,
//! function, procedure, and trigger definitions run to the end of the batch.
//!
//! Each statement is then matched against the recognized shapes:
//!
//! ```sql
//! CREATE TABLE ...
//! CREATE [OR ALTER] VIEW | FUNCTION | PROCEDURE ...
//! CREATE TYPE ... AS TABLE (...)
//! CREATE FULLTEXT CATALOG ...
//! ALTER TABLE ... ADD ... | CHECK CONSTRAINT ...
//! INSERT ... VALUES ... | DELETE ... | TRUNCATE TABLE ...
//! SET option ... | PRINT ...
//! ```

use super::constraint_parser::{ConstraintTokenParser, ParsedAlterTable};
use super::data_parser::{parse_delete, parse_insert, parse_truncate, ParsedDelete, ParsedInsert};
use super::fulltext_parser::parse_fulltext_catalog;
use super::routine_parser::{is_routine_start, parse_routine};
use super::table_parser::{parse_create_table, ParsedTable};
use super::table_type_parser::parse_create_table_type;
use super::token_parser_base::TokenParser;
use super::tokenizer::{tokenize, Token, TokenType};
use crate::model::{FullTextCatalog, Name, Routine, TableType};

/// Words that begin a new statement
const STATEMENT_STARTERS: &[&str] = &[
    "CREATE", "ALTER", "INSERT", "DELETE", "TRUNCATE", "DROP", "UPDATE", "EXEC", "EXECUTE",
    "DECLARE", "PRINT", "IF", "SET", "GRANT", "USE",
];

/// Words after which a starter word continues the current statement
/// (`ON DELETE`, `INSTEAD OF INSERT`, `FOR UPDATE`, `CREATE OR ALTER`)
const CONTINUATION_WORDS: &[&str] = &["ON", "OF", "FOR", "OR"];

/// Session options accepted as `SET option ...`
const SESSION_OPTIONS: &[&str] = &[
    "IDENTITY_INSERT",
    "ANSI_NULLS",
    "ANSI_PADDING",
    "ANSI_WARNINGS",
    "ARITHABORT",
    "CONCAT_NULL_YIELDS_NULL",
    "NUMERIC_ROUNDABORT",
    "QUOTED_IDENTIFIER",
    "NOCOUNT",
    "XACT_ABORT",
];

/// A recognized statement
#[derive(Debug, Clone)]
pub enum ParsedStatement {
    CreateTable(ParsedTable),
    AlterTable(ParsedAlterTable),
    CreateRoutine(Routine),
    CreateTableType(TableType),
    CreateFullTextCatalog(FullTextCatalog),
    Insert(ParsedInsert),
    Delete(ParsedDelete),
    Truncate(Name),
    /// Statements with no effect on the model (`SET NOCOUNT ON`, `PRINT`)
    Untracked,
}

impl ParsedStatement {
    /// Replay order of a script whose earliest statement is this one:
    /// definitions, then table alterations, then data.
    pub fn phase(&self) -> u8 {
        match self {
            ParsedStatement::CreateTable(_)
            | ParsedStatement::CreateRoutine(_)
            | ParsedStatement::CreateTableType(_)
            | ParsedStatement::CreateFullTextCatalog(_) => 0,
            ParsedStatement::AlterTable(_) => 1,
            ParsedStatement::Insert(_)
            | ParsedStatement::Delete(_)
            | ParsedStatement::Truncate(_)
            | ParsedStatement::Untracked => 2,
        }
    }
}

/// One statement of a script and what it was recognized as
#[derive(Debug, Clone)]
pub struct SourceStatement {
    pub text: String,
    pub parsed: Option<ParsedStatement>,
}

/// Split `text` into statements and recognize each one.
pub fn parse_statements(text: &str) -> Vec<SourceStatement> {
    let tokens = tokenize(text);
    split_statements(tokens.tokens())
        .into_iter()
        .map(|statement| {
            let start = statement.first().map_or(0, |t| t.start_index());
            let end = statement.last().map_or(0, |t| t.end_index());
            SourceStatement {
                text: text.get(start..end).unwrap_or_default().to_string(),
                parsed: recognize(statement, text),
            }
        })
        .collect()
}

/// Split a token sequence into statements. Empty statements are dropped.
pub fn split_statements(tokens: &[Token]) -> Vec<&[Token]> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_routine = false;

    for i in 0..tokens.len() {
        let token = &tokens[i];
        if i == start && !in_routine {
            in_routine = starts_batch_scoped(&tokens[i..]);
        }
        if token.is_word("GO") {
            push_statement(&mut statements, &tokens[start..i]);
            start = i + 1;
            in_routine = false;
        } else if in_routine {
            continue;
        } else if token.token_type() == TokenType::Semicolon {
            push_statement(&mut statements, &tokens[start..i]);
            start = i + 1;
        } else if i > start && is_statement_start(tokens, i, start) {
            push_statement(&mut statements, &tokens[start..i]);
            start = i;
            in_routine = starts_batch_scoped(&tokens[i..]);
        }
    }
    push_statement(&mut statements, &tokens[start.min(tokens.len())..]);
    statements
}

fn push_statement<'a>(statements: &mut Vec<&'a [Token]>, mut statement: &'a [Token]) {
    while let [rest @ .., last] = statement {
        if last.token_type() != TokenType::Semicolon {
            break;
        }
        statement = rest;
    }
    if !statement.is_empty() {
        statements.push(statement);
    }
}

/// Routine and trigger definitions, whose bodies extend to the next `GO`.
fn starts_batch_scoped(tokens: &[Token]) -> bool {
    if is_routine_start(tokens) {
        return true;
    }
    let mut parser = TokenParser::new(tokens);
    if parser.accept_word("CREATE") {
        parser.expect_words(&["OR", "ALTER"]);
    } else if !parser.accept_word("ALTER") {
        return false;
    }
    parser.check_word("TRIGGER")
}

fn is_statement_start(tokens: &[Token], i: usize, statement_start: usize) -> bool {
    let token = &tokens[i];
    let Some(starter) = STATEMENT_STARTERS.iter().find(|w| token.is_word(w)) else {
        return false;
    };
    let previous = &tokens[i - 1];
    let statement = &tokens[statement_start..];
    // `SET IDENTITY_INSERT t ON` ends with a value, not a continuation
    let in_set = statement[0].is_word("SET");
    if !in_set && CONTINUATION_WORDS.iter().any(|w| previous.is_word(w)) {
        return false;
    }
    let in_alter_table = TokenParser::new(statement).check_words(&["ALTER", "TABLE"]);
    match *starter {
        "ALTER" | "DROP" | "SET" if in_alter_table && is_alter_table_clause(tokens, i) => false,
        // UPDATE t SET ..., ON DELETE SET NULL
        "SET" => {
            let first = &statement[0];
            !(first.is_word("UPDATE")
                || first.is_word("MERGE")
                || previous.is_word("DELETE")
                || previous.is_word("UPDATE"))
        }
        _ => true,
    }
}

/// `ALTER COLUMN`, `DROP CONSTRAINT|COLUMN|PERIOD` and `SET (...)` inside an
/// `ALTER TABLE`. Any other `ALTER`, `DROP` or `SET` begins a new statement.
fn is_alter_table_clause(tokens: &[Token], i: usize) -> bool {
    let Some(next) = tokens.get(i + 1) else {
        return false;
    };
    let token = &tokens[i];
    if token.is_word("ALTER") {
        next.is_word("COLUMN")
    } else if token.is_word("DROP") {
        ["CONSTRAINT", "COLUMN", "PERIOD"].iter().any(|w| next.is_word(w))
    } else {
        next.is_paren_group()
    }
}

/// Match one statement against the recognized shapes.
pub fn recognize(tokens: &[Token], source: &str) -> Option<ParsedStatement> {
    let parser = TokenParser::new(tokens);
    if parser.check_words(&["CREATE", "TABLE"]) {
        return parse_create_table(tokens).map(ParsedStatement::CreateTable);
    }
    if parser.check_words(&["CREATE", "TYPE"]) {
        return parse_create_table_type(tokens).map(ParsedStatement::CreateTableType);
    }
    if parser.check_words(&["CREATE", "FULLTEXT", "CATALOG"]) {
        return parse_fulltext_catalog(tokens).map(ParsedStatement::CreateFullTextCatalog);
    }
    if is_routine_start(tokens) {
        return parse_routine(tokens, source).map(ParsedStatement::CreateRoutine);
    }
    if parser.check_words(&["ALTER", "TABLE"]) {
        return ConstraintTokenParser::new(tokens)
            .parse_alter_table()
            .map(ParsedStatement::AlterTable);
    }
    if parser.check_word("INSERT") {
        return parse_insert(tokens).map(ParsedStatement::Insert);
    }
    if parser.check_word("DELETE") {
        return parse_delete(tokens).map(ParsedStatement::Delete);
    }
    if parser.check_word("TRUNCATE") {
        return parse_truncate(tokens).map(ParsedStatement::Truncate);
    }
    if parser.check_word("PRINT") {
        return Some(ParsedStatement::Untracked);
    }
    if parser.check_word("SET") {
        let is_option = tokens
            .get(1)
            .is_some_and(|t| SESSION_OPTIONS.iter().any(|o| t.is_word(o)));
        return is_option.then_some(ParsedStatement::Untracked);
    }
    None
}
