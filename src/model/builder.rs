//! Apply recognized statements to a database model
//!
//! Statements are replayed in script order, so data reflects every INSERT,
//! DELETE, and TRUNCATE seen so far, IDENTITY values included. Unnamed
//! constraints get the names SQL Server scripts conventionally use:
//! `PK_<table>`, `FK_<table>_<referenced>` (with a numeric suffix when taken),
//! and `DF_<table>_<column>`.

use super::database_model::Database;
use super::elements::{Column, DefaultConstraint, ForeignKey, PrimaryKey, Row, Table};
use super::name::Name;
use super::value::SqlValue;
use crate::log::{LogLevel, Logger};
use crate::parser::{
    AlterTableAction, DeleteFilter, ParsedAlterTable, ParsedConstraint, ParsedDelete,
    ParsedInsert, ParsedStatement, ParsedTable,
};

/// Fold one statement into `database`.
pub fn apply_statement(database: &mut Database, statement: ParsedStatement, log: &mut dyn Logger) {
    match statement {
        ParsedStatement::CreateTable(table) => create_table(database, table, log),
        ParsedStatement::AlterTable(alter) => alter_table(database, alter, log),
        ParsedStatement::CreateRoutine(routine) => {
            database
                .routines_mut(routine.kind)
                .insert(routine.name.clone(), routine);
        }
        ParsedStatement::CreateTableType(table_type) => {
            database
                .table_types
                .insert(table_type.name.clone(), table_type);
        }
        ParsedStatement::CreateFullTextCatalog(catalog) => {
            if catalog.is_default {
                for other in database.full_text_catalogs.values_mut() {
                    other.is_default = false;
                }
            }
            database
                .full_text_catalogs
                .insert(catalog.name.clone(), catalog);
        }
        ParsedStatement::Insert(insert) => insert_rows(database, insert, log),
        ParsedStatement::Delete(delete) => delete_rows(database, delete, log),
        ParsedStatement::Truncate(name) => match database.tables.get_mut(&name) {
            Some(table) => {
                table.rows.clear();
                table.last_identity = None;
            }
            None => log.log(
                LogLevel::Verbose,
                &format!("Skipping TRUNCATE of unknown table {}", name),
            ),
        },
        ParsedStatement::Untracked => {}
    }
}

fn create_table(database: &mut Database, parsed: ParsedTable, log: &mut dyn Logger) {
    let name = parsed.name;
    if database.remove_table(&name).is_some() {
        log.log(
            LogLevel::Warning,
            &format!("Table {} is defined more than once; using the last definition", name),
        );
    }

    let mut constraints = Vec::new();
    let mut columns: Vec<Column> = Vec::with_capacity(parsed.columns.len());
    for column in parsed.columns {
        constraints.extend(column.constraints);
        columns.push(column.column);
    }
    constraints.extend(parsed.constraints);

    database
        .tables
        .insert(name.clone(), Table::new(name.clone(), columns));
    for constraint in constraints {
        add_constraint(database, &name, constraint, log);
    }
}

fn alter_table(database: &mut Database, alter: ParsedAlterTable, log: &mut dyn Logger) {
    let name = alter.table;
    let (columns, mut constraints) = match alter.action {
        AlterTableAction::Add {
            columns,
            constraints,
        } => (columns, constraints),
        AlterTableAction::Untracked => return,
    };
    let Some(table) = database.tables.get_mut(&name) else {
        log.log(
            LogLevel::Verbose,
            &format!("Skipping ALTER TABLE of unknown table {}", name),
        );
        return;
    };

    let mut column_constraints = Vec::new();
    for parsed in columns {
        if table.column(&parsed.column.name).is_some() {
            log.log(
                LogLevel::Warning,
                &format!("Column [{}] already exists in {}", parsed.column.name, name),
            );
            continue;
        }
        // existing rows get the default when the column cannot be NULL or WITH VALUES is given
        let fill = parsed
            .constraints
            .iter()
            .find_map(|c| match c {
                ParsedConstraint::Default { expression, .. } => {
                    Some(SqlValue::from_tokens(expression.tokens()))
                }
                _ => None,
            })
            .filter(|_| !parsed.column.nullable || parsed.with_values)
            .unwrap_or(SqlValue::Null);
        let is_identity = parsed.column.identity.is_some();

        table.columns.push(parsed.column);
        for i in 0..table.rows.len() {
            let value = if is_identity {
                table
                    .next_identity()
                    .map_or(SqlValue::Null, SqlValue::number)
            } else {
                fill.clone()
            };
            table.rows[i].push(value);
        }
        column_constraints.extend(parsed.constraints);
    }

    column_constraints.append(&mut constraints);
    for constraint in column_constraints {
        add_constraint(database, &name, constraint, log);
    }
}

/// Register a constraint on `table`, naming it if the script did not.
fn add_constraint(
    database: &mut Database,
    table: &Name,
    constraint: ParsedConstraint,
    log: &mut dyn Logger,
) {
    let Some(owner) = database.tables.get_mut(table) else {
        log.log(
            LogLevel::Verbose,
            &format!("Skipping constraint on unknown table {}", table),
        );
        return;
    };

    match constraint {
        ParsedConstraint::PrimaryKey {
            name,
            columns,
            clustered,
        } => {
            for column in owner.columns.iter_mut() {
                if columns.iter().any(|c| column.has_name(c)) {
                    column.nullable = false;
                }
            }
            let name = match name {
                Some(name) => table.with_object(&name),
                None => table.with_object(&format!("PK_{}", table.object_name())),
            };
            database.primary_keys.insert(
                name.clone(),
                PrimaryKey {
                    name,
                    table: table.clone(),
                    columns,
                    clustered,
                },
            );
        }
        ParsedConstraint::ForeignKey {
            name,
            columns,
            referenced_table,
            referenced_columns,
            on_delete,
            on_update,
        } => {
            let name = match name {
                Some(name) => table.with_object(&name),
                None => unique_constraint_name(
                    database,
                    table,
                    &format!(
                        "FK_{}_{}",
                        table.object_name(),
                        referenced_table.object_name()
                    ),
                ),
            };
            let referenced_columns = if referenced_columns.is_empty() {
                database
                    .primary_key_of(&referenced_table)
                    .map(|pk| pk.columns.clone())
                    .unwrap_or_else(|| columns.clone())
            } else {
                referenced_columns
            };
            database.foreign_keys.insert(
                name.clone(),
                ForeignKey {
                    name,
                    table: table.clone(),
                    columns,
                    referenced_table,
                    referenced_columns,
                    on_delete,
                    on_update,
                },
            );
        }
        ParsedConstraint::Default {
            name,
            column,
            expression,
        } => {
            let name = match name {
                Some(name) => table.with_object(&name),
                None => table.with_object(&format!("DF_{}_{}", table.object_name(), column)),
            };
            database.default_constraints.insert(
                name.clone(),
                DefaultConstraint {
                    name,
                    table: table.clone(),
                    column,
                    expression,
                },
            );
        }
        ParsedConstraint::Untracked => {}
    }
}

/// `base`, or `base_2`, `base_3`, ... when already used.
fn unique_constraint_name(database: &Database, table: &Name, base: &str) -> Name {
    let mut name = table.with_object(base);
    let mut suffix = 2;
    while database.constraint_name_taken(&name) {
        name = table.with_object(&format!("{}_{}", base, suffix));
        suffix += 1;
    }
    name
}

fn insert_rows(database: &mut Database, insert: ParsedInsert, log: &mut dyn Logger) {
    let defaults: Vec<SqlValue> = match database.tables.get(&insert.table) {
        Some(table) => table
            .columns
            .iter()
            .map(|c| {
                database
                    .default_for(&insert.table, &c.name)
                    .map_or(SqlValue::Null, |df| df.value())
            })
            .collect(),
        None => {
            log.log(
                LogLevel::Verbose,
                &format!("Skipping rows for unknown table {}", insert.table),
            );
            return;
        }
    };
    let Some(table) = database.tables.get_mut(&insert.table) else {
        return;
    };

    // Without a column list, values fill every column but IDENTITY and computed ones
    let targets: Vec<Option<usize>> = match &insert.columns {
        Some(columns) => columns
            .iter()
            .map(|c| {
                let index = table.column_index(c);
                if index.is_none() {
                    log.log(
                        LogLevel::Warning,
                        &format!("Unknown column [{}] in INSERT into {}", c, table.name),
                    );
                }
                index
            })
            .collect(),
        None => table
            .stored_columns()
            .filter(|(_, c)| c.identity.is_none())
            .map(|(i, _)| Some(i))
            .collect(),
    };

    for values in insert.rows {
        if values.len() != targets.len() {
            log.log(
                LogLevel::Warning,
                &format!(
                    "INSERT into {} supplies {} values for {} columns; row skipped",
                    table.name,
                    values.len(),
                    targets.len()
                ),
            );
            continue;
        }
        let mut supplied: Vec<Option<SqlValue>> = vec![None; table.columns.len()];
        for (target, value) in targets.iter().zip(values) {
            if let (Some(index), Some(value)) = (target, value) {
                supplied[*index] = Some(value);
            }
        }
        let row = build_row(table, supplied, &defaults);
        table.rows.push(row);
    }
}

/// Complete a row: IDENTITY columns draw the next value unless given one,
/// computed columns stay NULL, everything else falls back to its default.
fn build_row(table: &mut Table, supplied: Vec<Option<SqlValue>>, defaults: &[SqlValue]) -> Row {
    let identity_index = table.identity_column().map(|(i, _)| i);
    let mut row = Vec::with_capacity(supplied.len());
    for (i, value) in supplied.into_iter().enumerate() {
        let value = match value {
            Some(value) => {
                if Some(i) == identity_index {
                    if let SqlValue::Number(n) = &value {
                        if let Ok(n) = n.parse::<i64>() {
                            table.observe_identity(n);
                        }
                    }
                }
                value
            }
            None if Some(i) == identity_index => table
                .next_identity()
                .map_or(SqlValue::Null, SqlValue::number),
            None if table.columns[i].is_computed() => SqlValue::Null,
            None => defaults.get(i).cloned().unwrap_or(SqlValue::Null),
        };
        row.push(value);
    }
    row
}

fn delete_rows(database: &mut Database, delete: ParsedDelete, log: &mut dyn Logger) {
    let Some(table) = database.tables.get_mut(&delete.table) else {
        log.log(
            LogLevel::Verbose,
            &format!("Skipping DELETE from unknown table {}", delete.table),
        );
        return;
    };
    match delete.filter {
        DeleteFilter::All => table.rows.clear(),
        DeleteFilter::Where(predicate) => {
            let rows = std::mem::take(&mut table.rows);
            let kept: Vec<Row> = rows
                .into_iter()
                .filter(|row| predicate.evaluate(table, row) != Some(true))
                .collect();
            table.rows = kept;
        }
        DeleteFilter::Unsupported(clause) => log.log(
            LogLevel::Warning,
            &format!(
                "Cannot evaluate DELETE FROM {} WHERE {}; rows left unchanged",
                delete.table, clause
            ),
        ),
    }
}
