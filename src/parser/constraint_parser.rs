//! Token-based constraint parsing for T-SQL
//!
//! ## Supported Syntax
//!
//! ALTER TABLE statements:
//! ```sql
//! ALTER TABLE [schema].[table] ADD CONSTRAINT [name] PRIMARY KEY (columns)
//! ALTER TABLE [schema].[table] ADD CONSTRAINT [name] FOREIGN KEY (columns) REFERENCES [table](columns)
//! ALTER TABLE [schema].[table] ADD CONSTRAINT [name] DEFAULT value FOR [column]
//! ALTER TABLE [schema].[table] WITH CHECK ADD CONSTRAINT [name] ...
//! ALTER TABLE [schema].[table] ADD [column] TYPE ...
//! ALTER TABLE [schema].[table] CHECK CONSTRAINT [name]
//! ```
//!
//! Table-level constraints:
//! ```sql
//! CONSTRAINT [name] PRIMARY KEY CLUSTERED ([Col1], [Col2] DESC)
//! CONSTRAINT [name] FOREIGN KEY ([Col]) REFERENCES [Table]([Col]) ON DELETE CASCADE
//! PRIMARY KEY ([Col1])  -- unnamed
//! ```

use super::column_parser::{ColumnTokenParser, ParsedColumn};
use super::token_parser_base::{parse_identifier_list, split_on_separators, TokenParser};
use super::token_set::TokenSet;
use super::tokenizer::Token;
use crate::model::{Name, ReferentialAction};

/// Parsed constraint result
#[derive(Debug, Clone)]
pub enum ParsedConstraint {
    PrimaryKey {
        name: Option<String>,
        columns: Vec<String>,
        clustered: bool,
    },
    ForeignKey {
        name: Option<String>,
        columns: Vec<String>,
        referenced_table: Name,
        /// Empty when the referenced primary key is implied
        referenced_columns: Vec<String>,
        on_delete: ReferentialAction,
        on_update: ReferentialAction,
    },
    Default {
        name: Option<String>,
        column: String,
        expression: TokenSet,
    },
    /// UNIQUE, CHECK and inline INDEX definitions, which the model does not track
    Untracked,
}

/// `REFERENCES table [(columns)] [ON DELETE action] [ON UPDATE action]`
#[derive(Debug, Clone)]
pub struct ParsedReference {
    pub table: Name,
    pub columns: Vec<String>,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

#[derive(Debug, Clone)]
pub enum AlterTableAction {
    Add {
        columns: Vec<ParsedColumn>,
        constraints: Vec<ParsedConstraint>,
    },
    /// `CHECK CONSTRAINT` / `NOCHECK CONSTRAINT`, which leave the model unchanged
    Untracked,
}

/// Result of parsing an ALTER TABLE statement
#[derive(Debug, Clone)]
pub struct ParsedAlterTable {
    pub table: Name,
    pub action: AlterTableAction,
}

/// Token-based constraint parser
pub struct ConstraintTokenParser<'a> {
    base: TokenParser<'a>,
}

impl<'a> ConstraintTokenParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            base: TokenParser::new(tokens),
        }
    }

    /// Parse `ALTER TABLE name [WITH CHECK|NOCHECK] ADD ...`
    pub fn parse_alter_table(&mut self) -> Option<ParsedAlterTable> {
        self.base.expect_words(&["ALTER", "TABLE"])?;
        let table = self.base.parse_name()?;
        if self.base.accept_word("WITH") {
            self.base.accept_any_word(&["CHECK", "NOCHECK"])?;
        }

        if self.base.accept_word("ADD") {
            let mut columns = Vec::new();
            let mut constraints = Vec::new();
            for item in split_on_separators(self.base.remaining()) {
                if starts_table_constraint(item) {
                    constraints.push(ConstraintTokenParser::new(item).parse_table_constraint()?);
                } else {
                    columns.push(ColumnTokenParser::new(item).parse()?);
                }
            }
            if columns.is_empty() && constraints.is_empty() {
                return None;
            }
            return Some(ParsedAlterTable {
                table,
                action: AlterTableAction::Add {
                    columns,
                    constraints,
                },
            });
        }

        if self.base.check_words(&["CHECK", "CONSTRAINT"])
            || self.base.check_words(&["NOCHECK", "CONSTRAINT"])
        {
            return Some(ParsedAlterTable {
                table,
                action: AlterTableAction::Untracked,
            });
        }
        None
    }

    /// Parse a table-level constraint (from CREATE TABLE or ALTER TABLE ADD)
    pub fn parse_table_constraint(&mut self) -> Option<ParsedConstraint> {
        let name = if self.base.accept_word("CONSTRAINT") {
            Some(self.base.parse_identifier()?)
        } else {
            None
        };

        if self.base.expect_words(&["PRIMARY", "KEY"]).is_some() {
            return self.parse_primary_key(name);
        }
        if self.base.expect_words(&["FOREIGN", "KEY"]).is_some() {
            return self.parse_foreign_key(name);
        }
        if self.base.accept_word("DEFAULT") {
            return self.parse_default(name);
        }
        if self.base.check_word("UNIQUE")
            || self.base.check_word("CHECK")
            || self.base.check_word("INDEX")
            || self.base.check_word("PERIOD")
        {
            return Some(ParsedConstraint::Untracked);
        }
        None
    }

    fn parse_primary_key(&mut self, name: Option<String>) -> Option<ParsedConstraint> {
        let clustered = parse_clustering(&mut self.base);
        let group = self.base.parse_paren_group()?;
        let columns = parse_identifier_list(group);
        if columns.is_empty() {
            return None;
        }
        Some(ParsedConstraint::PrimaryKey {
            name,
            columns,
            clustered,
        })
    }

    fn parse_foreign_key(&mut self, name: Option<String>) -> Option<ParsedConstraint> {
        let group = self.base.parse_paren_group()?;
        let columns = parse_identifier_list(group);
        let reference = parse_references(&mut self.base)?;
        Some(ParsedConstraint::ForeignKey {
            name,
            columns,
            referenced_table: reference.table,
            referenced_columns: reference.columns,
            on_delete: reference.on_delete,
            on_update: reference.on_update,
        })
    }

    /// `DEFAULT expression FOR column`
    fn parse_default(&mut self, name: Option<String>) -> Option<ParsedConstraint> {
        let expression = self.base.take_until_words(&["FOR"]);
        if expression.is_empty() {
            return None;
        }
        self.base.expect_word("FOR")?;
        let column = self.base.parse_identifier()?;
        Some(ParsedConstraint::Default {
            name,
            column,
            expression: TokenSet::from_tokens(expression.to_vec()),
        })
    }
}

/// Whether a table element starts a constraint rather than a column.
pub fn starts_table_constraint(tokens: &[Token]) -> bool {
    tokens.first().is_some_and(|t| {
        ["CONSTRAINT", "PRIMARY", "FOREIGN", "UNIQUE", "CHECK", "INDEX", "PERIOD"]
            .iter()
            .any(|w| t.is_word(w))
    })
}

/// Optional CLUSTERED/NONCLUSTERED; primary keys are clustered unless stated.
pub(crate) fn parse_clustering(base: &mut TokenParser) -> bool {
    match base.accept_any_word(&["CLUSTERED", "NONCLUSTERED"]) {
        Some(word) => word == "CLUSTERED",
        None => true,
    }
}

pub(crate) fn parse_references(base: &mut TokenParser) -> Option<ParsedReference> {
    base.expect_word("REFERENCES")?;
    let table = base.parse_name()?;
    let columns = base
        .parse_paren_group()
        .map(parse_identifier_list)
        .unwrap_or_default();

    let mut reference = ParsedReference {
        table,
        columns,
        on_delete: ReferentialAction::NoAction,
        on_update: ReferentialAction::NoAction,
    };
    loop {
        if base.expect_words(&["ON", "DELETE"]).is_some() {
            reference.on_delete = parse_referential_action(base)?;
        } else if base.expect_words(&["ON", "UPDATE"]).is_some() {
            reference.on_update = parse_referential_action(base)?;
        } else if base.expect_words(&["NOT", "FOR", "REPLICATION"]).is_none() {
            break;
        }
    }
    Some(reference)
}

fn parse_referential_action(base: &mut TokenParser) -> Option<ReferentialAction> {
    if base.accept_word("CASCADE") {
        Some(ReferentialAction::Cascade)
    } else if base.expect_words(&["NO", "ACTION"]).is_some() {
        Some(ReferentialAction::NoAction)
    } else if base.expect_words(&["SET", "NULL"]).is_some() {
        Some(ReferentialAction::SetNull)
    } else if base.expect_words(&["SET", "DEFAULT"]).is_some() {
        Some(ReferentialAction::SetDefault)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenizer::tokenize;

    fn alter(sql: &str) -> ParsedAlterTable {
        let set = tokenize(sql);
        ConstraintTokenParser::new(set.tokens())
            .parse_alter_table()
            .unwrap()
    }

    fn table_constraint(sql: &str) -> ParsedConstraint {
        let set = tokenize(sql);
        ConstraintTokenParser::new(set.tokens())
            .parse_table_constraint()
            .unwrap()
    }

    #[test]
    fn test_alter_add_pk() {
        let parsed = alter("ALTER TABLE [dbo].[foo] ADD CONSTRAINT [PK_foo] PRIMARY KEY NONCLUSTERED ([a], [b] DESC)");
        assert_eq!(parsed.table, Name::object("foo"));
        match parsed.action {
            AlterTableAction::Add { constraints, .. } => match &constraints[0] {
                ParsedConstraint::PrimaryKey {
                    name,
                    columns,
                    clustered,
                } => {
                    assert_eq!(name.as_deref(), Some("PK_foo"));
                    assert_eq!(columns, &vec!["a".to_string(), "b".to_string()]);
                    assert!(!clustered);
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alter_with_check_add_fk() {
        let parsed = alter(
            "ALTER TABLE bar WITH CHECK ADD CONSTRAINT FK_bar_foo FOREIGN KEY (a) REFERENCES foo (a) ON DELETE SET NULL ON UPDATE CASCADE",
        );
        match parsed.action {
            AlterTableAction::Add { constraints, .. } => match &constraints[0] {
                ParsedConstraint::ForeignKey {
                    referenced_table,
                    on_delete,
                    on_update,
                    ..
                } => {
                    assert_eq!(referenced_table, &Name::object("foo"));
                    assert_eq!(*on_delete, ReferentialAction::SetNull);
                    assert_eq!(*on_update, ReferentialAction::Cascade);
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alter_add_default_for() {
        let parsed = alter("ALTER TABLE foo ADD CONSTRAINT DF_foo_b DEFAULT ('x') FOR b");
        match parsed.action {
            AlterTableAction::Add { constraints, .. } => match &constraints[0] {
                ParsedConstraint::Default { column, expression, .. } => {
                    assert_eq!(column, "b");
                    assert!(expression.equivalent_to(&TokenSet::parse("'x'")));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alter_add_columns() {
        let parsed = alter("ALTER TABLE foo ADD b int NULL, c varchar(5) NOT NULL DEFAULT ''");
        match parsed.action {
            AlterTableAction::Add { columns, constraints } => {
                assert_eq!(columns.len(), 2);
                assert!(constraints.is_empty());
                assert_eq!(columns[1].column.name, "c");
                assert_eq!(columns[1].constraints.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alter_check_constraint_is_untracked() {
        let parsed = alter("ALTER TABLE foo CHECK CONSTRAINT FK_foo");
        assert!(matches!(parsed.action, AlterTableAction::Untracked));
    }

    #[test]
    fn test_alter_unknown_action() {
        let set = tokenize("ALTER TABLE foo DROP COLUMN a");
        assert!(ConstraintTokenParser::new(set.tokens()).parse_alter_table().is_none());
    }

    #[test]
    fn test_unnamed_pk() {
        match table_constraint("PRIMARY KEY (id)") {
            ParsedConstraint::PrimaryKey { name, clustered, .. } => {
                assert!(name.is_none());
                assert!(clustered);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unique_is_untracked() {
        assert!(matches!(
            table_constraint("CONSTRAINT UQ_x UNIQUE (a)"),
            ParsedConstraint::Untracked
        ));
    }

    #[test]
    fn test_fk_without_column_list() {
        match table_constraint("FOREIGN KEY (a) REFERENCES foo") {
            ParsedConstraint::ForeignKey {
                referenced_columns, ..
            } => assert!(referenced_columns.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
