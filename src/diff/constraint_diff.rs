//! Primary keys, foreign keys, and default constraints
//!
//! Constraints are matched by name. A constraint is dropped when it changed,
//! disappeared, or sits on a rebuilt table (its name would otherwise move with
//! the parked rows), and added when it is new, changed, or was dropped for
//! one of those reasons. Foreign keys also follow the primary key and the
//! table they point at.

use std::collections::BTreeSet;

use super::sql_writer;
use super::table_diff::{TablePlan, TablePlans};
use crate::error::SqlDiffError;
use crate::log::{LogLevel, Logger};
use crate::model::{Database, DefaultConstraint, ForeignKey, Name, PrimaryKey};
use crate::script::{Script, ScriptSet, ScriptType};

struct ConstraintDiff<'a> {
    plans: &'a TablePlans,
    desired: &'a Database,
    current: &'a Database,
    /// Tables whose primary key is dropped or added
    key_changed: BTreeSet<Name>,
}

impl<'a> ConstraintDiff<'a> {
    fn new(plans: &'a TablePlans, desired: &'a Database, current: &'a Database) -> Self {
        let mut diff = Self {
            plans,
            desired,
            current,
            key_changed: BTreeSet::new(),
        };
        let mut key_changed = BTreeSet::new();
        for pk in current.primary_keys.values() {
            if diff.drops_primary_key(pk) {
                key_changed.insert(pk.table.clone());
            }
        }
        for pk in desired.primary_keys.values() {
            if diff.adds_primary_key(pk) {
                key_changed.insert(pk.table.clone());
            }
        }
        diff.key_changed = key_changed;
        diff
    }

    fn plan(&self, table: &Name) -> Option<&TablePlan> {
        self.plans.get(table)
    }

    fn is_dropped(&self, table: &Name) -> bool {
        self.plan(table) == Some(&TablePlan::Drop)
    }

    fn is_rebuilt(&self, table: &Name) -> bool {
        self.plan(table).is_some_and(|p| p.is_rebuild())
    }

    fn is_recreated(&self, table: &Name) -> bool {
        self.plan(table).is_some_and(|p| p.recreates())
    }

    fn drops_primary_key(&self, pk: &PrimaryKey) -> bool {
        if self.is_dropped(&pk.table) {
            return false;
        }
        match self.desired.primary_keys.get(&pk.name) {
            Some(desired) => !desired.same_definition(pk) || self.is_rebuilt(&pk.table),
            None => true,
        }
    }

    fn adds_primary_key(&self, pk: &PrimaryKey) -> bool {
        match self.current.primary_keys.get(&pk.name) {
            Some(current) => {
                !current.same_definition(pk)
                    || self.drops_primary_key(current)
                    || self.is_recreated(&pk.table)
            }
            None => true,
        }
    }

    fn drops_foreign_key(&self, fk: &ForeignKey) -> bool {
        if self.is_dropped(&fk.referenced_table) {
            return true;
        }
        if self.is_dropped(&fk.table) {
            return false;
        }
        match self.desired.foreign_keys.get(&fk.name) {
            Some(desired) => {
                !desired.same_definition(fk)
                    || self.is_rebuilt(&fk.table)
                    || self.is_rebuilt(&fk.referenced_table)
                    || self.key_changed.contains(&fk.referenced_table)
            }
            None => true,
        }
    }

    fn adds_foreign_key(&self, fk: &ForeignKey) -> bool {
        match self.current.foreign_keys.get(&fk.name) {
            Some(current) => {
                !current.same_definition(fk)
                    || self.drops_foreign_key(current)
                    || self.is_recreated(&fk.table)
            }
            None => true,
        }
    }

    fn drops_default(&self, df: &DefaultConstraint) -> bool {
        if self.is_dropped(&df.table) {
            return false;
        }
        match self.desired.default_constraints.get(&df.name) {
            Some(desired) => !desired.same_definition(df) || self.is_rebuilt(&df.table),
            None => true,
        }
    }

    fn adds_default(&self, df: &DefaultConstraint) -> bool {
        match self.current.default_constraints.get(&df.name) {
            Some(current) => {
                !current.same_definition(df)
                    || self.drops_default(current)
                    || self.is_recreated(&df.table)
            }
            None => true,
        }
    }
}

/// Drop and add scripts for every constraint that changes. `inline` names
/// defaults already created by column-adding table scripts.
pub fn constraint_scripts(
    plans: &TablePlans,
    desired: &Database,
    current: &Database,
    inline: &BTreeSet<Name>,
    scripts: &mut ScriptSet,
    logger: &mut dyn Logger,
) -> Result<(), SqlDiffError> {
    let diff = ConstraintDiff::new(plans, desired, current);

    for pk in current.primary_keys.values().filter(|pk| diff.drops_primary_key(pk)) {
        logger.log(
            LogLevel::Differences,
            &format!("Primary key {} on {} is dropped", pk.name, pk.table),
        );
        scripts.add(
            Script::new(
                sql_writer::drop_constraint(&pk.table, &pk.name),
                pk.name.clone(),
                ScriptType::DropPrimaryKey,
            )
            .on_table(&pk.table),
        )?;
    }
    for pk in desired.primary_keys.values().filter(|pk| diff.adds_primary_key(pk)) {
        if !diff.is_recreated(&pk.table) {
            logger.log(
                LogLevel::Differences,
                &format!("Primary key {} on {} is added", pk.name, pk.table),
            );
        }
        scripts.add(
            Script::new(
                sql_writer::add_primary_key(pk),
                pk.name.clone(),
                ScriptType::PrimaryKey,
            )
            .on_table(&pk.table),
        )?;
    }

    for fk in current.foreign_keys.values().filter(|fk| diff.drops_foreign_key(fk)) {
        logger.log(
            LogLevel::Differences,
            &format!("Foreign key {} on {} is dropped", fk.name, fk.table),
        );
        scripts.add(
            Script::new(
                sql_writer::drop_constraint(&fk.table, &fk.name),
                fk.name.clone(),
                ScriptType::DropForeignKey,
            )
            .on_table(&fk.table)
            .with_references([fk.referenced_table.clone()]),
        )?;
    }
    for fk in desired.foreign_keys.values().filter(|fk| diff.adds_foreign_key(fk)) {
        if !diff.is_recreated(&fk.table) {
            logger.log(
                LogLevel::Differences,
                &format!("Foreign key {} on {} is added", fk.name, fk.table),
            );
        }
        scripts.add(
            Script::new(
                sql_writer::add_foreign_key(fk),
                fk.name.clone(),
                ScriptType::ForeignKey,
            )
            .on_table(&fk.table)
            .with_references([fk.referenced_table.clone()]),
        )?;
    }

    for df in current
        .default_constraints
        .values()
        .filter(|df| diff.drops_default(df))
    {
        scripts.add(
            Script::new(
                sql_writer::drop_constraint(&df.table, &df.name),
                df.name.clone(),
                ScriptType::DropDefaultConstraint,
            )
            .on_table(&df.table),
        )?;
    }
    for df in desired
        .default_constraints
        .values()
        .filter(|df| !inline.contains(&df.name) && diff.adds_default(df))
    {
        scripts.add(
            Script::new(
                sql_writer::add_default(df),
                df.name.clone(),
                ScriptType::DefaultConstraint,
            )
            .on_table(&df.table),
        )?;
    }
    Ok(())
}
