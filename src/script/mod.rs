//! Generated scripts, their kinds, and the ordered set they are collected in

mod dependency;
mod script_set;

use std::fmt;

use crate::model::Name;

pub use dependency::{resolve_order, CycleBreak, SortOutcome};
pub use script_set::ScriptSet;

/// Kind of a script.
///
/// The order of the variants matters: it is the tie-break priority of the
/// sorter once dependencies are satisfied. Drops and data removal come first,
/// then creates, then data, then the constraints that validate that data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptType {
    DropForeignKey,
    DropPrimaryKey,
    DropDefaultConstraint,
    TableRemoveData,
    DropStoredProc,
    DropView,
    DropFunction,
    DropTable,
    DropTableType,
    DropFullTextCatalog,
    TableSaveData,
    FullTextCatalog,
    TableType,
    Table,
    DefaultConstraint,
    TableRestoreData,
    TableData,
    PrimaryKey,
    ForeignKey,
    Function,
    View,
    StoredProc,
    Unknown,
}

impl ScriptType {
    pub fn is_drop(&self) -> bool {
        self.created_kind_of_drop().is_some()
    }

    /// The kind whose object a drop script removes.
    pub fn created_kind_of_drop(&self) -> Option<ScriptType> {
        match self {
            ScriptType::DropForeignKey => Some(ScriptType::ForeignKey),
            ScriptType::DropPrimaryKey => Some(ScriptType::PrimaryKey),
            ScriptType::DropDefaultConstraint => Some(ScriptType::DefaultConstraint),
            ScriptType::DropStoredProc => Some(ScriptType::StoredProc),
            ScriptType::DropView => Some(ScriptType::View),
            ScriptType::DropFunction => Some(ScriptType::Function),
            ScriptType::DropTable => Some(ScriptType::Table),
            ScriptType::DropTableType => Some(ScriptType::TableType),
            ScriptType::DropFullTextCatalog => Some(ScriptType::FullTextCatalog),
            _ => None,
        }
    }

    /// Scripts that define an object whose text may name other objects.
    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            ScriptType::Table
                | ScriptType::TableType
                | ScriptType::View
                | ScriptType::Function
                | ScriptType::StoredProc
        )
    }

    /// Scripts whose name is the table they act on.
    pub fn is_table_level(&self) -> bool {
        matches!(
            self,
            ScriptType::Table
                | ScriptType::DropTable
                | ScriptType::TableSaveData
                | ScriptType::TableRestoreData
                | ScriptType::TableData
                | ScriptType::TableRemoveData
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScriptType::DropForeignKey => "DropForeignKey",
            ScriptType::DropPrimaryKey => "DropPrimaryKey",
            ScriptType::DropDefaultConstraint => "DropDefaultConstraint",
            ScriptType::TableRemoveData => "TableRemoveData",
            ScriptType::DropStoredProc => "DropStoredProc",
            ScriptType::DropView => "DropView",
            ScriptType::DropFunction => "DropFunction",
            ScriptType::DropTable => "DropTable",
            ScriptType::DropTableType => "DropTableType",
            ScriptType::DropFullTextCatalog => "DropFullTextCatalog",
            ScriptType::TableSaveData => "TableSaveData",
            ScriptType::FullTextCatalog => "FullTextCatalog",
            ScriptType::TableType => "TableType",
            ScriptType::Table => "Table",
            ScriptType::DefaultConstraint => "DefaultConstraint",
            ScriptType::TableRestoreData => "TableRestoreData",
            ScriptType::TableData => "TableData",
            ScriptType::PrimaryKey => "PrimaryKey",
            ScriptType::ForeignKey => "ForeignKey",
            ScriptType::Function => "Function",
            ScriptType::View => "View",
            ScriptType::StoredProc => "StoredProc",
            ScriptType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit of generated or loaded SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub text: String,
    pub name: Name,
    pub script_type: ScriptType,
    /// Table the script acts on, for constraint scripts
    pub table: Option<Name>,
    /// Objects this script needs (referenced tables of a foreign key, parents of inserted rows, ...)
    pub references: Vec<Name>,
}

impl Script {
    pub fn new(text: impl Into<String>, name: Name, script_type: ScriptType) -> Self {
        Self {
            text: text.into(),
            name,
            script_type,
            table: None,
            references: Vec::new(),
        }
    }

    pub fn on_table(mut self, table: &Name) -> Self {
        self.table = Some(table.clone());
        self
    }

    pub fn with_references(mut self, references: impl IntoIterator<Item = Name>) -> Self {
        self.references.extend(references);
        self
    }

    /// The table this script acts on, if any.
    pub fn subject_table(&self) -> Option<&Name> {
        self.table
            .as_ref()
            .or_else(|| self.script_type.is_table_level().then_some(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        assert!(ScriptType::DropForeignKey < ScriptType::DropPrimaryKey);
        assert!(ScriptType::TableRemoveData < ScriptType::TableSaveData);
        assert!(ScriptType::Table < ScriptType::DefaultConstraint);
        assert!(ScriptType::DefaultConstraint < ScriptType::TableData);
        assert!(ScriptType::TableData < ScriptType::PrimaryKey);
        assert!(ScriptType::PrimaryKey < ScriptType::ForeignKey);
    }

    #[test]
    fn test_drop_kinds() {
        assert_eq!(
            ScriptType::DropView.created_kind_of_drop(),
            Some(ScriptType::View)
        );
        assert!(!ScriptType::TableRemoveData.is_drop());
        assert!(ScriptType::DropFullTextCatalog.is_drop());
    }

    #[test]
    fn test_subject_table() {
        let data = Script::new("", Name::object("foo"), ScriptType::TableData);
        assert_eq!(data.subject_table(), Some(&Name::object("foo")));

        let pk = Script::new("", Name::object("PK_foo"), ScriptType::PrimaryKey)
            .on_table(&Name::object("foo"));
        assert_eq!(pk.subject_table(), Some(&Name::object("foo")));

        let view = Script::new("", Name::object("v"), ScriptType::View);
        assert_eq!(view.subject_table(), None);
    }
}
