//! T-SQL parsing
//!
//! Scripts are tokenized, split into statements, and the statements that
//! affect the model are recognized. Everything else is left to the caller.

mod column_parser;
mod constraint_parser;
mod data_parser;
mod fulltext_parser;
pub mod identifier_utils;
mod predicate;
mod routine_parser;
mod script_parser;
mod statement_parser;
mod table_parser;
mod table_type_parser;
mod token_parser_base;
mod token_set;
pub mod tokenizer;

pub use column_parser::{parse_data_type, ColumnTokenParser, ParsedColumn};
pub use constraint_parser::{
    AlterTableAction, ConstraintTokenParser, ParsedAlterTable, ParsedConstraint, ParsedReference,
};
pub use data_parser::{DeleteFilter, InsertValue, ParsedDelete, ParsedInsert};
pub use predicate::{parse_predicate, CompareOp, Predicate};
pub use routine_parser::referenced_names;
pub use script_parser::ScriptParser;
pub use statement_parser::{parse_statements, split_statements, ParsedStatement, SourceStatement};
pub use table_parser::ParsedTable;
pub use token_parser_base::TokenParser;
pub use token_set::TokenSet;
pub use tokenizer::{tokenize, Token, TokenType};
