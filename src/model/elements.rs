//! Database model element types

use std::fmt;

use super::data_type::DataType;
use super::name::Name;
use super::value::{SqlValue, ValueKey};
use crate::parser::TokenSet;

/// One row of table data, ordered like the table's columns.
pub type Row = Vec<SqlValue>;

/// IDENTITY(seed, increment)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub seed: i64,
    pub increment: i64,
}

impl Default for Identity {
    fn default() -> Self {
        Self { seed: 1, increment: 1 }
    }
}

/// A column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub identity: Option<Identity>,
    /// Expression of a computed column
    pub computed: Option<TokenSet>,
    pub collation: Option<String>,
}

impl Column {
    pub fn new(name: &str, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            nullable,
            identity: None,
            computed: None,
            collation: None,
        }
    }

    pub fn is_computed(&self) -> bool {
        self.computed.is_some()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether two definitions describe the same column. Collation is only
    /// compared when both sides state one.
    pub fn same_definition(&self, other: &Column) -> bool {
        let computed_same = match (&self.computed, &other.computed) {
            (None, None) => true,
            (Some(a), Some(b)) => a.equivalent_to(b),
            _ => false,
        };
        let collation_same = match (&self.collation, &other.collation) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => true,
        };
        self.has_name(&other.name)
            && computed_same
            && collation_same
            && (self.is_computed() || self.data_type == other.data_type)
            && (self.is_computed() || self.nullable == other.nullable)
            && self.identity == other.identity
    }
}

/// A table with its columns and data.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: Name,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// Last IDENTITY value handed out while replaying inserts
    pub(crate) last_identity: Option<i64>,
}

impl Table {
    pub fn new(name: Name, columns: Vec<Column>) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
            last_identity: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.has_name(name))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.has_name(name))
    }

    pub fn identity_column(&self) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.identity.is_some())
    }

    /// Columns that hold stored values (everything but computed columns).
    pub fn stored_columns(&self) -> impl Iterator<Item = (usize, &Column)> {
        self.columns.iter().enumerate().filter(|(_, c)| !c.is_computed())
    }

    /// Comparison key of a row over the stored columns.
    pub fn row_key(&self, row: &Row) -> Vec<ValueKey> {
        self.stored_columns()
            .map(|(i, c)| {
                row.get(i)
                    .unwrap_or(&SqlValue::Null)
                    .comparison_key(Some(&c.data_type))
            })
            .collect()
    }

    /// Next value of the simulated IDENTITY sequence.
    pub(crate) fn next_identity(&mut self) -> Option<i64> {
        let identity = self.identity_column()?.1.identity?;
        let next = match self.last_identity {
            Some(last) => last + identity.increment,
            None => identity.seed,
        };
        self.last_identity = Some(next);
        Some(next)
    }

    /// Record an explicitly inserted IDENTITY value.
    pub(crate) fn observe_identity(&mut self, value: i64) {
        let Some(identity) = self.identity_column().and_then(|(_, c)| c.identity) else {
            return;
        };
        let advance = match self.last_identity {
            None => true,
            Some(last) if identity.increment >= 0 => value > last,
            Some(last) => value < last,
        };
        if advance {
            self.last_identity = Some(value);
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrimaryKey {
    pub name: Name,
    pub table: Name,
    pub columns: Vec<String>,
    pub clustered: bool,
}

impl PrimaryKey {
    pub fn same_definition(&self, other: &PrimaryKey) -> bool {
        self.table == other.table
            && self.clustered == other.clustered
            && same_columns(&self.columns, &other.columns)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column))
    }
}

/// ON DELETE / ON UPDATE behavior of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub name: Name,
    pub table: Name,
    pub columns: Vec<String>,
    pub referenced_table: Name,
    pub referenced_columns: Vec<String>,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

impl ForeignKey {
    pub fn same_definition(&self, other: &ForeignKey) -> bool {
        self.table == other.table
            && self.referenced_table == other.referenced_table
            && same_columns(&self.columns, &other.columns)
            && same_columns(&self.referenced_columns, &other.referenced_columns)
            && self.on_delete == other.on_delete
            && self.on_update == other.on_update
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column))
    }
}

#[derive(Debug, Clone)]
pub struct DefaultConstraint {
    pub name: Name,
    pub table: Name,
    pub column: String,
    pub expression: TokenSet,
}

impl DefaultConstraint {
    pub fn same_definition(&self, other: &DefaultConstraint) -> bool {
        self.table == other.table
            && self.column.eq_ignore_ascii_case(&other.column)
            && self.expression.equivalent_to(&other.expression)
    }

    /// The value a new row receives from this default.
    pub fn value(&self) -> SqlValue {
        SqlValue::from_tokens(self.expression.tokens())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoutineKind {
    View,
    Function,
    Procedure,
}

impl RoutineKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RoutineKind::View => "VIEW",
            RoutineKind::Function => "FUNCTION",
            RoutineKind::Procedure => "PROCEDURE",
        }
    }
}

/// A view, function, or stored procedure kept as its source text.
#[derive(Debug, Clone)]
pub struct Routine {
    pub name: Name,
    pub kind: RoutineKind,
    /// Full definition as written
    pub definition: String,
    /// Tokens following the name, used for comparison
    pub body: TokenSet,
    /// Names mentioned in the body
    pub references: Vec<Name>,
}

impl Routine {
    pub fn same_definition(&self, other: &Routine) -> bool {
        self.kind == other.kind && self.body.equivalent_to(&other.body)
    }

    pub fn references(&self, name: &Name) -> bool {
        self.references.iter().any(|r| r == name)
    }
}

/// A user-defined table type (`CREATE TYPE ... AS TABLE`)
#[derive(Debug, Clone)]
pub struct TableType {
    pub name: Name,
    pub columns: Vec<Column>,
    pub primary_key: Option<Vec<String>>,
}

impl TableType {
    pub fn same_definition(&self, other: &TableType) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.same_definition(b))
            && match (&self.primary_key, &other.primary_key) {
                (None, None) => true,
                (Some(a), Some(b)) => same_columns(a, b),
                _ => false,
            }
    }
}

#[derive(Debug, Clone)]
pub struct FullTextCatalog {
    pub name: Name,
    pub is_default: bool,
    pub accent_sensitive: Option<bool>,
}

impl FullTextCatalog {
    pub fn same_definition(&self, other: &FullTextCatalog) -> bool {
        self.is_default == other.is_default && self.accent_sensitive == other.accent_sensitive
    }
}

fn same_columns(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignore_ascii_case(y))
}
