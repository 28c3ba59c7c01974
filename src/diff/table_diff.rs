//! Table structure differences
//!
//! A table present in both snapshots is altered in place only when every
//! change is one `ALTER TABLE` can make without touching existing data:
//!
//! * new columns at the end that are nullable, have a default, or land in an
//!   empty table
//! * type widening per `DataType::can_widen_to` on columns no key or
//!   default depends on
//! * `NOT NULL` relaxed to `NULL`
//!
//! Anything else rebuilds the table: its rows are parked in `Tmp__<table>`,
//! the table is created in the new shape, and the surviving rows are copied
//! back.

use std::collections::{BTreeMap, BTreeSet};

use super::sql_writer;
use crate::error::SqlDiffError;
use crate::log::{LogLevel, Logger};
use crate::model::{Column, Database, Name, Table};
use crate::script::{Script, ScriptSet, ScriptType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterStep {
    /// Index into the desired table's columns
    AddColumn(usize),
    AlterColumn(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TablePlan {
    Create,
    Drop,
    Unchanged,
    Alter(Vec<AlterStep>),
    /// Rename, recreate, and restore; the string says why
    Rebuild(String),
}

impl TablePlan {
    /// The table will be created from nothing, so everything attached to it
    /// must be added again.
    pub fn recreates(&self) -> bool {
        matches!(self, TablePlan::Create | TablePlan::Rebuild(_))
    }

    pub fn is_rebuild(&self) -> bool {
        matches!(self, TablePlan::Rebuild(_))
    }
}

pub type TablePlans = BTreeMap<Name, TablePlan>;

/// Plan every table that appears in either snapshot.
pub fn plan_tables(desired: &Database, current: &Database, logger: &mut dyn Logger) -> TablePlans {
    let names: BTreeSet<&Name> = desired.tables.keys().chain(current.tables.keys()).collect();
    let mut plans = TablePlans::new();

    for name in names {
        let plan = match (desired.tables.get(name), current.tables.get(name)) {
            (Some(_), None) => {
                logger.log(LogLevel::Differences, &format!("Table {} is new", name));
                TablePlan::Create
            }
            (None, Some(_)) => {
                logger.log(LogLevel::Differences, &format!("Table {} was removed", name));
                TablePlan::Drop
            }
            (Some(d), Some(c)) => {
                let plan = plan_table(d, c, desired, current);
                match &plan {
                    TablePlan::Rebuild(reason) => logger.log(
                        LogLevel::Differences,
                        &format!("Table {} differs: {}; rebuilding", name, reason),
                    ),
                    TablePlan::Alter(steps) => logger.log(
                        LogLevel::Differences,
                        &format!("Table {} differs: {} column change(s) in place", name, steps.len()),
                    ),
                    _ => {}
                }
                plan
            }
            (None, None) => continue,
        };
        plans.insert(name.clone(), plan);
    }
    plans
}

/// Decide how to bring `current` to the shape of `desired`.
pub fn plan_table(
    desired: &Table,
    current: &Table,
    desired_db: &Database,
    current_db: &Database,
) -> TablePlan {
    let mut steps = Vec::new();

    if desired.columns.len() < current.columns.len() {
        return TablePlan::Rebuild("column removed".to_string());
    }
    for (i, old) in current.columns.iter().enumerate() {
        let new = &desired.columns[i];
        if !new.has_name(&old.name) {
            return TablePlan::Rebuild(format!("column [{}] removed or moved", old.name));
        }
        if new.same_definition(old) {
            continue;
        }
        if let Some(reason) = in_place_blocker(&current.name, old, new, desired_db, current_db) {
            return TablePlan::Rebuild(reason);
        }
        steps.push(AlterStep::AlterColumn(i));
    }

    for (i, new) in desired.columns.iter().enumerate().skip(current.columns.len()) {
        if new.identity.is_some() {
            return TablePlan::Rebuild(format!("IDENTITY column [{}] added", new.name));
        }
        if new.is_computed() {
            return TablePlan::Rebuild(format!("computed column [{}] added", new.name));
        }
        let has_default = desired_db.default_for(&desired.name, &new.name).is_some();
        if !new.nullable && !has_default && !current.rows.is_empty() {
            return TablePlan::Rebuild(format!(
                "NOT NULL column [{}] added without a default",
                new.name
            ));
        }
        steps.push(AlterStep::AddColumn(i));
    }

    if steps.is_empty() {
        TablePlan::Unchanged
    } else {
        TablePlan::Alter(steps)
    }
}

/// Why `ALTER COLUMN` cannot turn `old` into `new`, if it cannot.
fn in_place_blocker(
    table: &Name,
    old: &Column,
    new: &Column,
    desired_db: &Database,
    current_db: &Database,
) -> Option<String> {
    if old.identity != new.identity {
        return Some(format!("IDENTITY of [{}] changed", new.name));
    }
    if old.is_computed() || new.is_computed() {
        return Some(format!("computed column [{}] changed", new.name));
    }
    if let (Some(a), Some(b)) = (&old.collation, &new.collation) {
        if !a.eq_ignore_ascii_case(b) {
            return Some(format!("collation of [{}] changed", new.name));
        }
    }
    if !old.data_type.can_widen_to(&new.data_type) {
        return Some(format!(
            "[{}] cannot change from {} to {} in place",
            new.name, old.data_type, new.data_type
        ));
    }
    if old.nullable && !new.nullable {
        return Some(format!("[{}] became NOT NULL", new.name));
    }
    if current_db.column_is_constrained(table, &old.name)
        || desired_db.column_is_constrained(table, &new.name)
    {
        return Some(format!("[{}] is part of a key or default", new.name));
    }
    None
}

/// Defaults created inline by `ALTER TABLE ... ADD` column scripts.
pub fn inline_defaults(plans: &TablePlans, desired: &Database) -> BTreeSet<Name> {
    let mut names = BTreeSet::new();
    for (name, plan) in plans {
        let (TablePlan::Alter(steps), Some(table)) = (plan, desired.tables.get(name)) else {
            continue;
        };
        for step in steps {
            if let AlterStep::AddColumn(i) = step {
                if let Some(df) = desired.default_for(name, &table.columns[*i].name) {
                    names.insert(df.name.clone());
                }
            }
        }
    }
    names
}

/// Columns copied back into a rebuilt table: stored columns of the new shape
/// that existed before.
pub fn restored_columns(desired: &Table, current: &Table) -> Vec<String> {
    desired
        .stored_columns()
        .filter(|(_, c)| current.column(&c.name).is_some_and(|old| !old.is_computed()))
        .map(|(_, c)| c.name.clone())
        .collect()
}

/// Structural scripts for every planned table. `survivors` holds, for tables
/// present in both snapshots, how many current rows are kept.
pub fn table_scripts(
    plans: &TablePlans,
    desired: &Database,
    current: &Database,
    survivors: &BTreeMap<Name, usize>,
    scripts: &mut ScriptSet,
) -> Result<(), SqlDiffError> {
    for (name, plan) in plans {
        let new = desired.tables.get(name);
        let old = current.tables.get(name);
        match (plan, new, old) {
            (TablePlan::Create, Some(new), _) => {
                scripts.add(Script::new(
                    sql_writer::create_table(new),
                    name.clone(),
                    ScriptType::Table,
                ))?;
            }
            (TablePlan::Drop, _, Some(_)) => {
                // tables its foreign keys point at
                let referenced: BTreeSet<Name> = current
                    .foreign_keys_of(name)
                    .map(|fk| fk.referenced_table.clone())
                    .filter(|t| t != name)
                    .collect();
                scripts.add(
                    Script::new(sql_writer::drop_table(name), name.clone(), ScriptType::DropTable)
                        .with_references(referenced),
                )?;
            }
            (TablePlan::Alter(steps), Some(new), Some(_)) => {
                let statements: Vec<String> = steps
                    .iter()
                    .map(|step| match *step {
                        AlterStep::AddColumn(i) => {
                            let column = &new.columns[i];
                            sql_writer::add_column(name, column, desired.default_for(name, &column.name))
                        }
                        AlterStep::AlterColumn(i) => sql_writer::alter_column(name, &new.columns[i]),
                    })
                    .collect();
                scripts.add(Script::new(
                    statements.join("\n\n"),
                    name.clone(),
                    ScriptType::Table,
                ))?;
            }
            (TablePlan::Rebuild(_), Some(new), Some(old)) => {
                rebuild_scripts(name, new, old, survivors.get(name).copied().unwrap_or(0), scripts)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn rebuild_scripts(
    name: &Name,
    new: &Table,
    old: &Table,
    survivors: usize,
    scripts: &mut ScriptSet,
) -> Result<(), SqlDiffError> {
    scripts.add(Script::new(
        sql_writer::rename_to_temp(name),
        name.clone(),
        ScriptType::TableSaveData,
    ))?;

    let columns = restored_columns(new, old);
    if survivors > 0 && !columns.is_empty() {
        scripts.add(Script::new(
            sql_writer::create_table(new),
            name.clone(),
            ScriptType::Table,
        ))?;
        let identity_insert = new
            .identity_column()
            .is_some_and(|(_, c)| columns.iter().any(|r| c.has_name(r)));
        scripts.add(Script::new(
            sql_writer::restore_from_temp(name, &columns, identity_insert),
            name.clone(),
            ScriptType::TableRestoreData,
        ))?;
    } else {
        // nothing to copy back, so the parked table goes right away
        let temp = sql_writer::temp_table_name(name);
        scripts.add(Script::new(
            format!(
                "{}\n\n{}",
                sql_writer::drop_table(&temp),
                sql_writer::create_table(new)
            ),
            name.clone(),
            ScriptType::Table,
        ))?;
    }
    Ok(())
}
