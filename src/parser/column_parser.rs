//! Token-based column definition parsing for T-SQL
//!
//! ## Supported Syntax
//!
//! Regular columns:
//! ```sql
//! [Name] TYPE [COLLATE name] [IDENTITY(seed, increment)] [NOT NULL|NULL]
//!     [CONSTRAINT name] DEFAULT value [WITH VALUES]
//!     [CONSTRAINT name] PRIMARY KEY [CLUSTERED|NONCLUSTERED]
//!     [CONSTRAINT name] [FOREIGN KEY] REFERENCES table [(col)] [ON DELETE ...]
//!     [ROWGUIDCOL] [SPARSE] [FILESTREAM]
//! ```
//!
//! Computed columns:
//! ```sql
//! [Name] AS expression [PERSISTED] [NOT NULL]
//! ```

use super::constraint_parser::{parse_clustering, parse_references, ParsedConstraint};
use super::identifier_utils::normalize_identifier;
use super::token_parser_base::{split_on_separators, TokenParser};
use super::token_set::TokenSet;
use super::tokenizer::{Token, TokenType};
use crate::model::{Column, DataType, Identity, Name};

/// Words that end a DEFAULT expression
const DEFAULT_STOP_WORDS: &[&str] = &[
    "NOT",
    "NULL",
    "CONSTRAINT",
    "PRIMARY",
    "FOREIGN",
    "REFERENCES",
    "UNIQUE",
    "CHECK",
    "COLLATE",
    "IDENTITY",
    "WITH",
    "ROWGUIDCOL",
    "SPARSE",
    "PERSISTED",
    "FOR",
];

/// Words that end a computed column expression
const COMPUTED_STOP_WORDS: &[&str] = &[
    "PERSISTED",
    "NOT",
    "NULL",
    "CONSTRAINT",
    "PRIMARY",
    "UNIQUE",
    "CHECK",
    "FOREIGN",
    "REFERENCES",
];

/// A column together with the constraints declared inline on it
#[derive(Debug, Clone)]
pub struct ParsedColumn {
    pub column: Column,
    pub constraints: Vec<ParsedConstraint>,
    /// `WITH VALUES`: existing rows receive the default when the column is added
    pub with_values: bool,
}

/// Token-based column definition parser
pub struct ColumnTokenParser<'a> {
    base: TokenParser<'a>,
}

impl<'a> ColumnTokenParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            base: TokenParser::new(tokens),
        }
    }

    /// Parse the column definition and return the result
    pub fn parse(&mut self) -> Option<ParsedColumn> {
        let name = self.base.parse_identifier()?;

        if self.base.accept_word("AS") {
            return self.parse_computed_column(name);
        }

        let data_type = parse_data_type(&mut self.base)?;
        let mut result = ParsedColumn {
            column: Column::new(&name, data_type, true),
            constraints: Vec::new(),
            with_values: false,
        };
        let nullability = self.parse_column_modifiers(&mut result);

        // IDENTITY and PRIMARY KEY columns are implicitly NOT NULL
        let is_key = result
            .constraints
            .iter()
            .any(|c| matches!(c, ParsedConstraint::PrimaryKey { .. }));
        result.column.nullable =
            nullability.unwrap_or(result.column.identity.is_none() && !is_key);
        Some(result)
    }

    /// Parse a computed column: [Name] AS expression [PERSISTED] [NOT NULL]
    fn parse_computed_column(&mut self, name: String) -> Option<ParsedColumn> {
        let expression = self.base.take_until_words(COMPUTED_STOP_WORDS);
        if expression.is_empty() {
            return None;
        }
        let mut column = Column::new(&name, DataType::computed(), true);
        column.computed = Some(TokenSet::from_tokens(expression.to_vec()));
        let mut result = ParsedColumn {
            column,
            constraints: Vec::new(),
            with_values: false,
        };
        self.parse_column_modifiers(&mut result);
        Some(result)
    }

    /// Parse column modifiers. Returns the explicit nullability, if any.
    fn parse_column_modifiers(&mut self, result: &mut ParsedColumn) -> Option<bool> {
        let mut nullability = None;
        // CONSTRAINT [name] applies to the next DEFAULT/PRIMARY KEY/REFERENCES
        let mut pending_name: Option<String> = None;
        let column_name = result.column.name.clone();

        while !self.base.is_at_end() {
            if self.base.accept_word("IDENTITY") {
                let mut identity = Identity::default();
                if let Some(group) = self.base.parse_paren_group() {
                    if let Some((seed, increment)) = parse_identity_arguments(group) {
                        identity = Identity { seed, increment };
                    }
                }
                result.column.identity = Some(identity);
                continue;
            }

            if self.base.expect_words(&["NOT", "NULL"]).is_some() {
                nullability = Some(false);
                continue;
            }

            if self.base.accept_word("NULL") {
                nullability = Some(true);
                continue;
            }

            if self.base.accept_word("CONSTRAINT") {
                pending_name = self.base.parse_identifier();
                continue;
            }

            if self.base.accept_word("DEFAULT") {
                if let Some(expression) = self.parse_default_expression() {
                    result.constraints.push(ParsedConstraint::Default {
                        name: pending_name.take(),
                        column: column_name.clone(),
                        expression,
                    });
                }
                continue;
            }

            if self.base.expect_words(&["PRIMARY", "KEY"]).is_some() {
                let clustered = parse_clustering(&mut self.base);
                self.base.accept_any_word(&["ASC", "DESC"]);
                result.constraints.push(ParsedConstraint::PrimaryKey {
                    name: pending_name.take(),
                    columns: vec![column_name.clone()],
                    clustered,
                });
                continue;
            }

            if self.base.accept_word("FOREIGN") {
                self.base.accept_word("KEY");
                continue;
            }

            if self.base.check_word("REFERENCES") {
                if let Some(reference) = parse_references(&mut self.base) {
                    // an empty column list means the referenced primary key
                    result.constraints.push(ParsedConstraint::ForeignKey {
                        name: pending_name.take(),
                        columns: vec![column_name.clone()],
                        referenced_table: reference.table,
                        referenced_columns: reference.columns,
                        on_delete: reference.on_delete,
                        on_update: reference.on_update,
                    });
                } else {
                    self.base.advance();
                }
                continue;
            }

            if self.base.accept_word("UNIQUE") {
                parse_clustering(&mut self.base);
                pending_name = None;
                continue;
            }

            if self.base.accept_word("CHECK") {
                self.base.parse_paren_group();
                pending_name = None;
                continue;
            }

            if self.base.accept_word("COLLATE") {
                result.column.collation = self.base.parse_identifier();
                continue;
            }

            if self.base.expect_words(&["WITH", "VALUES"]).is_some() {
                result.with_values = true;
                continue;
            }

            if self.base.expect_words(&["NOT", "FOR", "REPLICATION"]).is_some() {
                continue;
            }

            if self
                .base
                .accept_any_word(&["ROWGUIDCOL", "SPARSE", "FILESTREAM", "PERSISTED", "HIDDEN"])
                .is_some()
            {
                continue;
            }

            // Unknown token
            self.base.advance();
        }
        nullability
    }

    /// The expression after DEFAULT: its first token plus everything up to the
    /// next column modifier.
    fn parse_default_expression(&mut self) -> Option<TokenSet> {
        let start = self.base.remaining();
        if start.is_empty() {
            return None;
        }
        self.base.advance();
        let rest = self.base.take_until_words(DEFAULT_STOP_WORDS);
        Some(TokenSet::from_tokens(start[..1 + rest.len()].to_vec()))
    }
}

/// `(seed, increment)`
fn parse_identity_arguments(group: &Token) -> Option<(i64, i64)> {
    let args = split_on_separators(group.inner());
    let [seed, increment] = args.as_slice() else {
        return None;
    };
    let seed = TokenParser::new(seed).parse_signed_integer()?;
    let increment = TokenParser::new(increment).parse_signed_integer()?;
    Some((seed, increment))
}

/// Parse a data type (e.g., INT, NVARCHAR(50), DECIMAL(18, 2), dbo.MyType)
pub fn parse_data_type(base: &mut TokenParser) -> Option<DataType> {
    let token = base.current_token()?;
    if !token.is_name_like() {
        return None;
    }
    base.advance();

    let mut type_name = if token.value().contains('.') {
        let name = Name::parse(token.value())?;
        name.unquoted()
    } else {
        normalize_identifier(token.value())
    };
    if type_name.eq_ignore_ascii_case("double") && base.accept_word("PRECISION") {
        type_name = "float".to_string();
    }
    let type_name = match type_name.to_lowercase().as_str() {
        "integer" => "int".to_string(),
        "dec" => "decimal".to_string(),
        "rowversion" => "timestamp".to_string(),
        other => other.to_string(),
    };

    let args: Vec<String> = match base.parse_paren_group() {
        Some(group) => split_on_separators(group.inner())
            .into_iter()
            .map(|segment| {
                segment
                    .iter()
                    .filter(|t| t.token_type() != TokenType::Operator || t.value() == "-")
                    .map(|t| t.value().to_string())
                    .collect::<String>()
            })
            .collect(),
        None => Vec::new(),
    };
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    Some(DataType::from_parts(&type_name, &args))
}
