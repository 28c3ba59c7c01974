//! In-memory snapshot of a database

use std::collections::BTreeMap;

use super::elements::{
    DefaultConstraint, ForeignKey, FullTextCatalog, PrimaryKey, Routine, RoutineKind, Table,
    TableType,
};
use super::name::Name;
use crate::diff;
use crate::error::SqlDiffError;
use crate::log::Logger;
use crate::script::ScriptSet;

/// Schema objects and table data, keyed by name.
///
/// Constraints are stored by their own name and point at their table.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub tables: BTreeMap<Name, Table>,
    pub views: BTreeMap<Name, Routine>,
    pub functions: BTreeMap<Name, Routine>,
    pub procedures: BTreeMap<Name, Routine>,
    pub table_types: BTreeMap<Name, TableType>,
    pub primary_keys: BTreeMap<Name, PrimaryKey>,
    pub foreign_keys: BTreeMap<Name, ForeignKey>,
    pub default_constraints: BTreeMap<Name, DefaultConstraint>,
    pub full_text_catalogs: BTreeMap<Name, FullTextCatalog>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.views.is_empty()
            && self.functions.is_empty()
            && self.procedures.is_empty()
            && self.table_types.is_empty()
            && self.primary_keys.is_empty()
            && self.foreign_keys.is_empty()
            && self.default_constraints.is_empty()
            && self.full_text_catalogs.is_empty()
    }

    pub fn routines(&self, kind: RoutineKind) -> &BTreeMap<Name, Routine> {
        match kind {
            RoutineKind::View => &self.views,
            RoutineKind::Function => &self.functions,
            RoutineKind::Procedure => &self.procedures,
        }
    }

    pub fn routines_mut(&mut self, kind: RoutineKind) -> &mut BTreeMap<Name, Routine> {
        match kind {
            RoutineKind::View => &mut self.views,
            RoutineKind::Function => &mut self.functions,
            RoutineKind::Procedure => &mut self.procedures,
        }
    }

    pub fn all_routines(&self) -> impl Iterator<Item = &Routine> {
        self.views
            .values()
            .chain(self.functions.values())
            .chain(self.procedures.values())
    }

    pub fn primary_key_of(&self, table: &Name) -> Option<&PrimaryKey> {
        self.primary_keys.values().find(|pk| &pk.table == table)
    }

    /// Foreign keys owned by `table`.
    pub fn foreign_keys_of<'a>(&'a self, table: &'a Name) -> impl Iterator<Item = &'a ForeignKey> + 'a {
        self.foreign_keys.values().filter(move |fk| &fk.table == table)
    }

    /// Foreign keys pointing at `table`.
    pub fn foreign_keys_referencing<'a>(
        &'a self,
        table: &'a Name,
    ) -> impl Iterator<Item = &'a ForeignKey> + 'a {
        self.foreign_keys
            .values()
            .filter(move |fk| &fk.referenced_table == table)
    }

    pub fn default_for(&self, table: &Name, column: &str) -> Option<&DefaultConstraint> {
        self.default_constraints
            .values()
            .find(|df| &df.table == table && df.column.eq_ignore_ascii_case(column))
    }

    /// Whether `column` of `table` takes part in a key or default.
    pub fn column_is_constrained(&self, table: &Name, column: &str) -> bool {
        self.primary_key_of(table).is_some_and(|pk| pk.contains_column(column))
            || self.foreign_keys_of(table).any(|fk| fk.contains_column(column))
            || self.foreign_keys_referencing(table).any(|fk| {
                fk.referenced_columns
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(column))
            })
            || self.default_for(table, column).is_some()
    }

    /// Whether any constraint already uses `name`.
    pub fn constraint_name_taken(&self, name: &Name) -> bool {
        self.primary_keys.contains_key(name)
            || self.foreign_keys.contains_key(name)
            || self.default_constraints.contains_key(name)
    }

    /// Remove a table together with its constraints.
    pub fn remove_table(&mut self, name: &Name) -> Option<Table> {
        let table = self.tables.remove(name)?;
        self.primary_keys.retain(|_, pk| &pk.table != name);
        self.foreign_keys.retain(|_, fk| &fk.table != name);
        self.default_constraints.retain(|_, df| &df.table != name);
        Some(table)
    }

    /// Scripts that turn `current` into `self`, unsorted.
    pub fn create_diff_scripts(
        &self,
        current: &Database,
        logger: &mut dyn Logger,
    ) -> Result<ScriptSet, SqlDiffError> {
        diff::create_diff_scripts(self, current, logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, DataType};

    fn sample() -> Database {
        let mut db = Database::new();
        let foo = Name::object("foo");
        let bar = Name::object("bar");
        db.tables.insert(
            foo.clone(),
            Table::new(foo.clone(), vec![Column::new("a", DataType::simple("int"), false)]),
        );
        db.tables.insert(
            bar.clone(),
            Table::new(bar.clone(), vec![Column::new("a", DataType::simple("int"), true)]),
        );
        db.primary_keys.insert(
            Name::object("PK_foo"),
            PrimaryKey {
                name: Name::object("PK_foo"),
                table: foo.clone(),
                columns: vec!["a".to_string()],
                clustered: true,
            },
        );
        db.foreign_keys.insert(
            Name::object("FK_bar_foo"),
            ForeignKey {
                name: Name::object("FK_bar_foo"),
                table: bar,
                columns: vec!["a".to_string()],
                referenced_table: foo,
                referenced_columns: vec!["a".to_string()],
                on_delete: Default::default(),
                on_update: Default::default(),
            },
        );
        db
    }

    #[test]
    fn test_constraint_lookups() {
        let db = sample();
        let foo = Name::object("FOO");
        assert!(db.primary_key_of(&foo).is_some());
        assert_eq!(db.foreign_keys_referencing(&foo).count(), 1);
        assert_eq!(db.foreign_keys_of(&Name::object("bar")).count(), 1);
        assert!(db.column_is_constrained(&foo, "A"));
        assert!(db.constraint_name_taken(&Name::object("fk_bar_foo")));
    }

    #[test]
    fn test_default_lookup_outlives_table_name() {
        let mut db = sample();
        db.default_constraints.insert(
            Name::object("DF_bar_a"),
            DefaultConstraint {
                name: Name::object("DF_bar_a"),
                table: Name::object("bar"),
                column: "a".to_string(),
                expression: crate::parser::tokenize("0"),
            },
        );
        let found = {
            let table = Name::object("BAR");
            db.default_for(&table, "A")
        };
        assert_eq!(found.map(|df| df.name.clone()), Some(Name::object("DF_bar_a")));
        assert!(db.default_for(&Name::object("foo"), "a").is_none());
    }

    #[test]
    fn test_remove_table_drops_owned_constraints() {
        let mut db = sample();
        db.remove_table(&Name::object("bar"));
        assert!(db.foreign_keys.is_empty());
        assert_eq!(db.primary_keys.len(), 1);
        assert!(!db.is_empty());
    }
}
