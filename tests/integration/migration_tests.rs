//! End-to-end migration generation from script directories

use pretty_assertions::assert_eq;
use rust_sqldiff::{generate_migration, DiffOptions, LogLevel, MessageLog, ScriptType};

use crate::common::TestContext;

#[test]
fn test_empty_current_creates_everything() {
    let ctx = TestContext::new();
    ctx.desired("Tables/dbo.foo.sql", "CREATE TABLE foo (a int PRIMARY KEY)")
        .desired("Views/dbo.v.sql", "CREATE VIEW v AS SELECT a FROM foo")
        .desired("Data/dbo.foo.sql", "INSERT INTO foo VALUES (1)");

    let options = DiffOptions {
        current_dir: None,
        ..ctx.options()
    };
    let (scripts, _) = ctx.migrate_with(options);
    assert_eq!(
        scripts.types(),
        vec![
            ScriptType::Table,
            ScriptType::TableData,
            ScriptType::PrimaryKey,
            ScriptType::View
        ]
    );
}

#[test]
fn test_identical_directories_produce_nothing() {
    let ctx = TestContext::new();
    for table in ["foo", "bar"] {
        let path = format!("Tables/{}.sql", table);
        let sql = format!("CREATE TABLE {} (a int)", table);
        ctx.desired(&path, &sql).current(&path, &sql);
    }
    let (scripts, log) = ctx.migrate();
    assert!(scripts.is_empty());
    assert_eq!(log.at_level(LogLevel::Differences).count(), 0);
}

#[test]
fn test_unrecognized_desired_scripts_are_appended() {
    let ctx = TestContext::new();
    ctx.desired("Tables/foo.sql", "CREATE TABLE foo (a int)")
        .desired("Misc/grants.sql", "GRANT SELECT ON foo TO reader");

    let (scripts, log) = ctx.migrate();
    assert_eq!(scripts.types(), vec![ScriptType::Table, ScriptType::Unknown]);
    assert_eq!(
        scripts.scripts()[1].text,
        "GRANT SELECT ON foo TO reader"
    );
    assert_eq!(log.at_level(LogLevel::Information).count(), 1);
}

#[test]
fn test_no_data_leaves_rows_alone() {
    let ctx = TestContext::new();
    ctx.desired("Tables/foo.sql", "CREATE TABLE foo (a int, b int NULL)")
        .desired("Data/foo.sql", "INSERT INTO foo (a) VALUES (2)")
        .current("Tables/foo.sql", "CREATE TABLE foo (a int)")
        .current("Data/foo.sql", "INSERT INTO foo VALUES (1)");

    let options = DiffOptions {
        include_data: false,
        ..ctx.options()
    };
    let (scripts, _) = ctx.migrate_with(options);
    assert_eq!(scripts.types(), vec![ScriptType::Table]);
    assert!(scripts.to_sql().contains("ADD [b] int NULL"));
}

#[test]
fn test_excluded_files_are_ignored() {
    let ctx = TestContext::new();
    ctx.desired("Tables/foo.sql", "CREATE TABLE foo (a int)")
        .desired("Scratch/foo.sql", "SELECT 1");

    let options = DiffOptions {
        excludes: vec!["Scratch/*".to_string()],
        ..ctx.options()
    };
    let (scripts, _) = ctx.migrate_with(options);
    assert_eq!(scripts.types(), vec![ScriptType::Table]);
}

#[test]
fn test_missing_desired_directory_fails() {
    let ctx = TestContext::new();
    let options = DiffOptions {
        desired_dir: ctx.desired_dir.join("missing"),
        ..ctx.options()
    };
    let err = generate_migration(&options, &mut MessageLog::new()).unwrap_err();
    assert!(err.to_string().contains("Script directory not found"));
}

#[test]
fn test_table_change_is_logged() {
    let ctx = TestContext::new();
    ctx.desired("Tables/foo.sql", "CREATE TABLE foo (a int, b int)")
        .current("Tables/foo.sql", "CREATE TABLE foo (b int, a int)");

    let (scripts, log) = ctx.migrate();
    assert_eq!(
        scripts.types(),
        vec![ScriptType::TableSaveData, ScriptType::Table]
    );
    assert!(log
        .at_level(LogLevel::Differences)
        .any(|m| m.message.starts_with("Table [dbo].[foo]")));
}
