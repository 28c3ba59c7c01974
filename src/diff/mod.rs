//! Difference engine
//!
//! Compares a desired and a current [`Database`] and produces the scripts
//! that take the current one to the desired one. The scripts come back
//! unsorted; [`ScriptSet::sort`] puts them in a runnable order.
//!
//! Tables are planned first, since whether a table is altered, rebuilt, or
//! recreated decides what happens to its constraints and which of its rows
//! need to be written again.

mod constraint_diff;
mod data_diff;
mod routine_diff;
pub mod sql_writer;
mod table_diff;

use std::collections::BTreeMap;

use crate::error::SqlDiffError;
use crate::log::{LogLevel, Logger};
use crate::model::{Database, Name};
use crate::script::ScriptSet;

pub use data_diff::RowChanges;
pub use table_diff::{AlterStep, TablePlan, TablePlans};

/// Scripts that turn `current` into `desired`.
pub fn create_diff_scripts(
    desired: &Database,
    current: &Database,
    logger: &mut dyn Logger,
) -> Result<ScriptSet, SqlDiffError> {
    let mut scripts = ScriptSet::new();

    let plans = table_diff::plan_tables(desired, current, logger);
    let changes = data_diff::match_all(&plans, desired, current);
    let survivors: BTreeMap<Name, usize> = changes
        .iter()
        .map(|(name, change)| (name.clone(), change.kept))
        .collect();

    table_diff::table_scripts(&plans, desired, current, &survivors, &mut scripts)?;
    let inline = table_diff::inline_defaults(&plans, desired);
    constraint_diff::constraint_scripts(&plans, desired, current, &inline, &mut scripts, logger)?;

    let rebuilt_types = routine_diff::table_type_scripts(desired, current, &mut scripts, logger)?;
    routine_diff::routine_scripts(desired, current, &rebuilt_types, &mut scripts, logger)?;
    routine_diff::fulltext_catalog_scripts(desired, current, &mut scripts, logger)?;

    data_diff::data_scripts(&changes, desired, current, &mut scripts, logger)?;

    logger.log(
        LogLevel::Verbose,
        &format!("{} difference script(s) generated", scripts.len()),
    );
    Ok(scripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{MessageLog, NullLogger};
    use crate::parser::ScriptParser;
    use crate::script::ScriptType;
    use pretty_assertions::assert_eq;

    fn database(sql: &str) -> Database {
        let mut parser = ScriptParser::new();
        parser.parse(sql);
        parser.into_database()
    }

    fn sorted_diff(desired: &str, current: &str) -> ScriptSet {
        let mut scripts =
            create_diff_scripts(&database(desired), &database(current), &mut NullLogger).unwrap();
        scripts.sort(&mut NullLogger);
        scripts
    }

    #[test]
    fn test_identical_databases_need_no_scripts() {
        let sql = "CREATE TABLE foo (id int IDENTITY PRIMARY KEY, a varchar(10) DEFAULT 'x')
                   GO
                   CREATE VIEW v AS SELECT a FROM foo
                   GO
                   INSERT INTO foo (a) VALUES ('one')";
        let mut log = MessageLog::new();
        let scripts = create_diff_scripts(&database(sql), &database(sql), &mut log).unwrap();
        assert!(scripts.is_empty());
        assert_eq!(log.at_level(LogLevel::Differences).count(), 0);
    }

    #[test]
    fn test_new_table_with_default_and_rows() {
        let scripts = sorted_diff(
            "CREATE TABLE foo (a varchar(10), b varchar(20) DEFAULT 'foo')
             INSERT INTO foo (a) VALUES ('X')
             INSERT INTO foo VALUES ('A', 'B')",
            "",
        );
        assert_eq!(
            scripts.types(),
            vec![
                ScriptType::Table,
                ScriptType::DefaultConstraint,
                ScriptType::TableData
            ]
        );
        let data = &scripts.scripts()[2].text;
        assert!(data.contains("VALUES('X','foo')"));
        assert!(data.contains("VALUES('A','B')"));
    }

    #[test]
    fn test_rebuild_parks_and_rewrites_rows() {
        let scripts = sorted_diff(
            "CREATE TABLE foo (a int, b varchar(10))
             INSERT INTO foo VALUES (1, 'x'), (2, 'y')",
            "CREATE TABLE foo (b varchar(10), a int)
             INSERT INTO foo VALUES ('x', 1), ('z', 3)",
        );
        assert_eq!(
            scripts.types(),
            vec![
                ScriptType::TableRemoveData,
                ScriptType::TableSaveData,
                ScriptType::Table,
                ScriptType::TableRestoreData,
                ScriptType::TableData
            ]
        );
    }

    #[test]
    fn test_rebuild_without_survivors() {
        let scripts = sorted_diff(
            "CREATE TABLE foo (a int NOT NULL)
             INSERT INTO foo VALUES (2)",
            "CREATE TABLE foo (a varchar(5))
             INSERT INTO foo VALUES ('1')",
        );
        assert_eq!(
            scripts.types(),
            vec![
                ScriptType::TableRemoveData,
                ScriptType::TableSaveData,
                ScriptType::Table,
                ScriptType::TableData
            ]
        );
        assert!(scripts.scripts()[2].text.starts_with("DROP TABLE [dbo].[Tmp__foo]"));
    }

    #[test]
    fn test_dropped_parent_after_child_foreign_key() {
        let scripts = sorted_diff(
            "CREATE TABLE bar (a int)",
            "CREATE TABLE foo (a int PRIMARY KEY)
             CREATE TABLE bar (a int CONSTRAINT FK_bar_foo REFERENCES foo)",
        );
        assert_eq!(
            scripts.types(),
            vec![ScriptType::DropForeignKey, ScriptType::DropTable]
        );
    }

    #[test]
    fn test_dropped_child_before_parent_key_change() {
        let scripts = sorted_diff(
            "CREATE TABLE foo (a int CONSTRAINT PK_foo_a PRIMARY KEY)",
            "CREATE TABLE foo (a int PRIMARY KEY)
             CREATE TABLE bar (a int REFERENCES foo)",
        );
        assert_eq!(
            scripts.types(),
            vec![
                ScriptType::DropTable,
                ScriptType::DropPrimaryKey,
                ScriptType::PrimaryKey
            ]
        );
        assert_eq!(scripts.scripts()[0].name, Name::object("bar"));
    }

    #[test]
    fn test_dropped_child_before_parent_rebuild() {
        let scripts = sorted_diff(
            "CREATE TABLE foo (a int PRIMARY KEY)
             INSERT INTO foo VALUES (1)",
            "CREATE TABLE foo (a int PRIMARY KEY, b int NULL)
             CREATE TABLE bar (a int REFERENCES foo)
             INSERT INTO foo VALUES (1, 2)",
        );
        let types = scripts.types();
        let position = |t: ScriptType| types.iter().position(|x| *x == t).unwrap();
        assert!(position(ScriptType::DropTable) < position(ScriptType::DropPrimaryKey));
        assert!(position(ScriptType::DropTable) < position(ScriptType::TableSaveData));
        assert!(position(ScriptType::TableSaveData) < position(ScriptType::Table));
    }

    #[test]
    fn test_in_place_alter_keeps_rows() {
        let scripts = sorted_diff(
            "CREATE TABLE foo (a varchar(10), b int NULL)
             INSERT INTO foo (a) VALUES ('x')",
            "CREATE TABLE foo (a varchar(5))
             INSERT INTO foo VALUES ('x')",
        );
        assert_eq!(scripts.types(), vec![ScriptType::Table]);
        assert_eq!(
            scripts.to_sql(),
            "ALTER TABLE [dbo].[foo] ALTER COLUMN [a] varchar(10) NULL\nGO\n\nALTER TABLE [dbo].[foo] ADD [b] int NULL\nGO"
        );
    }
}
