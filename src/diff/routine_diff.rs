//! Views, functions, procedures, table types, and full-text catalogs
//!
//! None of these can be altered in place here: a changed definition is
//! dropped and created again. Routines that use a table type being recreated
//! are recreated with it, since the type cannot be dropped while referenced.

use std::collections::BTreeSet;

use super::sql_writer;
use crate::error::SqlDiffError;
use crate::log::{LogLevel, Logger};
use crate::model::{Database, Name, Routine, RoutineKind};
use crate::script::{Script, ScriptSet, ScriptType};

fn create_type(kind: RoutineKind) -> ScriptType {
    match kind {
        RoutineKind::View => ScriptType::View,
        RoutineKind::Function => ScriptType::Function,
        RoutineKind::Procedure => ScriptType::StoredProc,
    }
}

fn drop_type(kind: RoutineKind) -> ScriptType {
    match kind {
        RoutineKind::View => ScriptType::DropView,
        RoutineKind::Function => ScriptType::DropFunction,
        RoutineKind::Procedure => ScriptType::DropStoredProc,
    }
}

/// Table types present on both sides with different definitions.
fn rebuilt_table_types(desired: &Database, current: &Database) -> BTreeSet<Name> {
    desired
        .table_types
        .values()
        .filter(|d| {
            current
                .table_types
                .get(&d.name)
                .is_some_and(|c| !c.same_definition(d))
        })
        .map(|d| d.name.clone())
        .collect()
}

pub fn table_type_scripts(
    desired: &Database,
    current: &Database,
    scripts: &mut ScriptSet,
    logger: &mut dyn Logger,
) -> Result<BTreeSet<Name>, SqlDiffError> {
    let rebuilt = rebuilt_table_types(desired, current);

    for table_type in current.table_types.values() {
        let removed = !desired.table_types.contains_key(&table_type.name);
        if removed || rebuilt.contains(&table_type.name) {
            logger.log(
                LogLevel::Differences,
                &format!(
                    "Table type {} {}",
                    table_type.name,
                    if removed { "was removed" } else { "differs" }
                ),
            );
            scripts.add(Script::new(
                sql_writer::drop_table_type(&table_type.name),
                table_type.name.clone(),
                ScriptType::DropTableType,
            ))?;
        }
    }
    for table_type in desired.table_types.values() {
        let new = !current.table_types.contains_key(&table_type.name);
        if new || rebuilt.contains(&table_type.name) {
            if new {
                logger.log(
                    LogLevel::Differences,
                    &format!("Table type {} is new", table_type.name),
                );
            }
            scripts.add(Script::new(
                sql_writer::create_table_type(table_type),
                table_type.name.clone(),
                ScriptType::TableType,
            ))?;
        }
    }
    Ok(rebuilt)
}

pub fn routine_scripts(
    desired: &Database,
    current: &Database,
    rebuilt_types: &BTreeSet<Name>,
    scripts: &mut ScriptSet,
    logger: &mut dyn Logger,
) -> Result<(), SqlDiffError> {
    let uses_rebuilt_type =
        |routine: &Routine| rebuilt_types.iter().any(|t| routine.references(t));

    for kind in [RoutineKind::View, RoutineKind::Function, RoutineKind::Procedure] {
        let wanted = desired.routines(kind);
        let existing = current.routines(kind);

        for old in existing.values() {
            let replace = match wanted.get(&old.name) {
                Some(new) => {
                    let changed = !new.same_definition(old);
                    if changed {
                        logger.log(
                            LogLevel::Differences,
                            &format!("{} {} differs", kind_label(kind), old.name),
                        );
                    }
                    changed || uses_rebuilt_type(old)
                }
                None => {
                    logger.log(
                        LogLevel::Differences,
                        &format!("{} {} was removed", kind_label(kind), old.name),
                    );
                    true
                }
            };
            if replace {
                scripts.add(
                    Script::new(
                        sql_writer::drop_routine(kind, &old.name),
                        old.name.clone(),
                        drop_type(kind),
                    )
                    .with_references(old.references.iter().cloned()),
                )?;
            }
        }

        for new in wanted.values() {
            let create = match existing.get(&new.name) {
                Some(old) => !new.same_definition(old) || uses_rebuilt_type(old),
                None => {
                    logger.log(
                        LogLevel::Differences,
                        &format!("{} {} is new", kind_label(kind), new.name),
                    );
                    true
                }
            };
            if create {
                scripts.add(
                    Script::new(
                        sql_writer::create_routine(new),
                        new.name.clone(),
                        create_type(kind),
                    )
                    .with_references(new.references.iter().cloned()),
                )?;
            }
        }
    }
    Ok(())
}

fn kind_label(kind: RoutineKind) -> &'static str {
    match kind {
        RoutineKind::View => "View",
        RoutineKind::Function => "Function",
        RoutineKind::Procedure => "Procedure",
    }
}

pub fn fulltext_catalog_scripts(
    desired: &Database,
    current: &Database,
    scripts: &mut ScriptSet,
    logger: &mut dyn Logger,
) -> Result<(), SqlDiffError> {
    for old in current.full_text_catalogs.values() {
        let keep = desired
            .full_text_catalogs
            .get(&old.name)
            .is_some_and(|new| new.same_definition(old));
        if !keep {
            logger.log(
                LogLevel::Differences,
                &format!("Full-text catalog {} differs", old.name),
            );
            scripts.add(Script::new(
                sql_writer::drop_fulltext_catalog(&old.name),
                old.name.clone(),
                ScriptType::DropFullTextCatalog,
            ))?;
        }
    }
    for new in desired.full_text_catalogs.values() {
        let keep = current
            .full_text_catalogs
            .get(&new.name)
            .is_some_and(|old| old.same_definition(new));
        if !keep {
            scripts.add(Script::new(
                sql_writer::create_fulltext_catalog(new),
                new.name.clone(),
                ScriptType::FullTextCatalog,
            ))?;
        }
    }
    Ok(())
}
