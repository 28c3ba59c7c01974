//! Row differences
//!
//! Current rows are first projected onto the desired columns: columns that
//! exist on both sides keep their value, new columns take their default (or
//! NULL), exactly as an in-place `ADD` or a restore would fill them. The two
//! row lists are then matched as multisets under type-aware value equality.
//! Unmatched current rows are deleted, unmatched desired rows inserted.

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::sql_writer;
use super::table_diff::{TablePlan, TablePlans};
use crate::error::SqlDiffError;
use crate::log::{LogLevel, Logger};
use crate::model::{Database, Name, Row, SqlValue, Table, ValueKey};
use crate::script::{Script, ScriptSet, ScriptType};

/// Outcome of matching the rows of one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowChanges {
    /// Indices of current rows to delete, in order
    pub removed: Vec<usize>,
    /// Indices of desired rows to insert, in order
    pub added: Vec<usize>,
    /// Number of current rows that stay
    pub kept: usize,
}

impl RowChanges {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// `row` of `current` laid out like the columns of `desired`.
pub fn project_row(desired_db: &Database, desired: &Table, current: &Table, row: &Row) -> Row {
    desired
        .columns
        .iter()
        .map(|column| {
            if column.is_computed() {
                return SqlValue::Null;
            }
            match current.column_index(&column.name) {
                Some(i) => row.get(i).cloned().unwrap_or(SqlValue::Null),
                None => desired_db
                    .default_for(&desired.name, &column.name)
                    .map_or(SqlValue::Null, |df| df.value()),
            }
        })
        .collect()
}

/// Match the rows of a table present in both snapshots.
pub fn match_rows(desired_db: &Database, desired: &Table, current: &Table) -> RowChanges {
    let mut pending: HashMap<Vec<ValueKey>, VecDeque<usize>> = HashMap::new();
    for (i, row) in desired.rows.iter().enumerate() {
        pending.entry(desired.row_key(row)).or_default().push_back(i);
    }

    let mut changes = RowChanges::default();
    let mut matched = vec![false; desired.rows.len()];
    for (i, row) in current.rows.iter().enumerate() {
        let projected = project_row(desired_db, desired, current, row);
        let key = desired.row_key(&projected);
        match pending.get_mut(&key).and_then(|q| q.pop_front()) {
            Some(d) => {
                matched[d] = true;
                changes.kept += 1;
            }
            None => changes.removed.push(i),
        }
    }
    changes.added = (0..desired.rows.len()).filter(|&d| !matched[d]).collect();
    changes
}

/// Row changes for every table that survives into the desired snapshot.
pub fn match_all(plans: &TablePlans, desired: &Database, current: &Database) -> BTreeMap<Name, RowChanges> {
    let mut all = BTreeMap::new();
    for (name, plan) in plans {
        let changes = match (plan, desired.tables.get(name), current.tables.get(name)) {
            (TablePlan::Drop, _, _) => continue,
            (TablePlan::Create, Some(new), _) => RowChanges {
                added: (0..new.rows.len()).collect(),
                ..RowChanges::default()
            },
            (_, Some(new), Some(old)) => match_rows(desired, new, old),
            _ => continue,
        };
        all.insert(name.clone(), changes);
    }
    all
}

/// `TableRemoveData` and `TableData` scripts.
pub fn data_scripts(
    changes: &BTreeMap<Name, RowChanges>,
    desired: &Database,
    current: &Database,
    scripts: &mut ScriptSet,
    logger: &mut dyn Logger,
) -> Result<(), SqlDiffError> {
    for (name, change) in changes {
        if change.is_empty() {
            continue;
        }
        if let Some(old) = current.tables.get(name) {
            logger.log(
                LogLevel::Differences,
                &format!(
                    "Data of {} differs: {} row(s) to remove, {} row(s) to add",
                    name,
                    change.removed.len(),
                    change.added.len()
                ),
            );
            if !change.removed.is_empty() {
                let parents = current.foreign_keys_of(name).map(|fk| fk.referenced_table.clone());
                scripts.add(
                    Script::new(
                        delete_statements(current, old, &change.removed),
                        name.clone(),
                        ScriptType::TableRemoveData,
                    )
                    .with_references(parents.filter(|p| p != name)),
                )?;
            }
        }
        if let (Some(new), false) = (desired.tables.get(name), change.added.is_empty()) {
            let parents = desired.foreign_keys_of(name).map(|fk| fk.referenced_table.clone());
            let rows = change.added.iter().filter_map(|&i| new.rows.get(i));
            scripts.add(
                Script::new(sql_writer::insert_rows(new, rows), name.clone(), ScriptType::TableData)
                    .with_references(parents.filter(|p| p != name)),
            )?;
        }
    }
    Ok(())
}

/// One `DELETE` per removed row, by primary key when the table has one.
/// Without a key, identical rows are deleted together, with `TOP (n)` when
/// some copies stay.
fn delete_statements(current_db: &Database, table: &Table, removed: &[usize]) -> String {
    let key_columns: Option<Vec<usize>> = current_db
        .primary_key_of(&table.name)
        .map(|pk| pk.columns.iter().filter_map(|c| table.column_index(c)).collect())
        .filter(|columns: &Vec<usize>| !columns.is_empty());

    if let Some(columns) = key_columns {
        return removed
            .iter()
            .map(|&i| {
                let predicate = sql_writer::row_predicate(table, &table.rows[i], &columns);
                sql_writer::delete_rows(&table.name, &predicate, None)
            })
            .collect::<Vec<_>>()
            .join("\n\n");
    }

    let columns: Vec<usize> = table.stored_columns().map(|(i, _)| i).collect();
    let mut totals: HashMap<Vec<ValueKey>, usize> = HashMap::new();
    for row in &table.rows {
        *totals.entry(table.row_key(row)).or_default() += 1;
    }

    // removed rows grouped by value, in order of first appearance
    let mut groups: Vec<(Vec<ValueKey>, usize, usize)> = Vec::new();
    for &i in removed {
        let key = table.row_key(&table.rows[i]);
        match groups.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, _, count)) => *count += 1,
            None => groups.push((key, i, 1)),
        }
    }

    groups
        .into_iter()
        .map(|(key, first, count)| {
            let predicate = sql_writer::row_predicate(table, &table.rows[first], &columns);
            let top = (totals.get(&key).copied().unwrap_or(0) > count).then_some(count);
            sql_writer::delete_rows(&table.name, &predicate, top)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
