//! Token-based fulltext catalog parsing for T-SQL
//!
//! ```sql
//! CREATE FULLTEXT CATALOG [name]
//!     [ON FILEGROUP fg] [IN PATH 'path']
//!     [WITH ACCENT_SENSITIVITY = {ON|OFF}]
//!     [AS DEFAULT]
//!     [AUTHORIZATION owner]
//! ```

use super::token_parser_base::TokenParser;
use super::tokenizer::Token;
use crate::model::FullTextCatalog;

/// Parse CREATE FULLTEXT CATALOG and return catalog info
pub fn parse_fulltext_catalog(tokens: &[Token]) -> Option<FullTextCatalog> {
    let mut parser = TokenParser::new(tokens);
    parser.expect_words(&["CREATE", "FULLTEXT", "CATALOG"])?;
    let name = parser.parse_name()?;

    let mut catalog = FullTextCatalog {
        name,
        is_default: false,
        accent_sensitive: None,
    };
    while !parser.is_at_end() {
        if parser.expect_words(&["AS", "DEFAULT"]).is_some() {
            catalog.is_default = true;
        } else if parser.accept_word("ACCENT_SENSITIVITY") {
            // `=` then ON|OFF
            parser.advance();
            if let Some(setting) = parser.accept_any_word(&["ON", "OFF"]) {
                catalog.accent_sensitive = Some(setting == "ON");
            }
        } else {
            parser.advance();
        }
    }
    Some(catalog)
}
