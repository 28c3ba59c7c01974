//! ScriptParser tests through the public API

use rust_sqldiff::model::{RoutineKind, SqlValue};
use rust_sqldiff::{LogLevel, MessageLog, Name, Script, ScriptParser, ScriptSet, ScriptType};

fn parse(sql: &str) -> ScriptParser {
    let mut parser = ScriptParser::new();
    parser.parse(sql);
    parser
}

// ============================================================================
// Tables and constraints
// ============================================================================

#[test]
fn test_inline_constraints_are_normalized() {
    let parser = parse(
        r#"
CREATE TABLE foo (a int PRIMARY KEY, b varchar(20) DEFAULT 'foo')
GO
CREATE TABLE bar (a int FOREIGN KEY REFERENCES foo (a))
GO
"#,
    );
    let db = parser.database();
    let pk = &db.primary_keys[&Name::object("PK_foo")];
    assert_eq!(pk.columns, vec!["a"]);
    let fk = &db.foreign_keys[&Name::object("FK_bar_foo")];
    assert_eq!(fk.referenced_table, Name::object("foo"));
    let df = &db.default_constraints[&Name::object("DF_foo_b")];
    assert_eq!(df.column, "b");
}

#[test]
fn test_alter_table_constraints() {
    let parser = parse(
        r#"
CREATE TABLE foo (a int NOT NULL, b int NULL)
GO
ALTER TABLE foo ADD CONSTRAINT PK_a PRIMARY KEY CLUSTERED (a)
GO
ALTER TABLE [dbo].[foo] ADD CONSTRAINT [DF_b] DEFAULT ((0)) FOR [b]
GO
"#,
    );
    let db = parser.database();
    assert!(db.primary_keys[&Name::object("PK_a")].clustered);
    assert_eq!(db.default_constraints[&Name::object("DF_b")].column, "b");
}

#[test]
fn test_consecutive_alter_tables_without_separators() {
    let parser = parse(
        r#"
CREATE TABLE foo (a int NOT NULL)
CREATE VIEW v AS SELECT a FROM foo
GO
ALTER TABLE foo ADD CONSTRAINT PK_x PRIMARY KEY (a)
ALTER TABLE foo ADD CONSTRAINT DF_a DEFAULT (0) FOR a
DROP VIEW v
"#,
    );
    let db = parser.database();
    assert!(db.primary_keys.contains_key(&Name::object("PK_x")));
    assert_eq!(db.default_constraints[&Name::object("DF_a")].column, "a");
    // DROP VIEW is not modelled, so it is reported rather than swallowed
    assert_eq!(parser.diagnostics().at_level(LogLevel::Verbose).count(), 1);
}

#[test]
fn test_routines_and_types() {
    let parser = parse(
        r#"
CREATE VIEW v AS SELECT a FROM foo
GO
CREATE OR ALTER PROC p AS BEGIN SELECT 1 END
GO
CREATE TYPE dbo.tt AS TABLE (a int)
GO
CREATE FULLTEXT CATALOG ftc
GO
"#,
    );
    let db = parser.database();
    assert!(db.routines(RoutineKind::View)[&Name::object("v")].references(&Name::object("foo")));
    assert!(db.routines(RoutineKind::Procedure).contains_key(&Name::object("p")));
    assert_eq!(db.table_types[&Name::object("tt")].columns.len(), 1);
    assert!(db.full_text_catalogs.contains_key(&Name::object("ftc")));
}

// ============================================================================
// Data
// ============================================================================

#[test]
fn test_prefixed_and_unprefixed_inserts_reach_the_same_table() {
    let parser = parse(
        r#"
CREATE TABLE foo (a int, b varchar(10))
INSERT INTO foo (a, b) VALUES (1, 'x')
INSERT INTO dbo.foo (a, b) VALUES (2, N'y')
"#,
    );
    assert_eq!(parser.database().tables[&Name::object("foo")].rows.len(), 2);
}

#[test]
fn test_delete_and_truncate() {
    let parser = parse(
        r#"
CREATE TABLE foo (a int, b varchar(10))
INSERT INTO foo VALUES (1, 'x'), (2, 'y'), (3, NULL)
DELETE FROM foo WHERE a >= 2 AND b IS NOT NULL
"#,
    );
    let rows = &parser.database().tables[&Name::object("foo")].rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], SqlValue::Null);

    let mut parser = parser;
    parser.parse("TRUNCATE TABLE foo");
    assert!(parser.database().tables[&Name::object("foo")].rows.is_empty());
}

#[test]
fn test_unrecognized_statements_are_skipped() {
    let parser = parse("CREATE TABLE foo (a int)\nGO\nUPDATE foo SET a = 1\nGO");
    assert_eq!(parser.database().tables.len(), 1);
    assert_eq!(parser.diagnostics().at_level(LogLevel::Verbose).count(), 1);
}

// ============================================================================
// retrieve_parsable_objects
// ============================================================================

#[test]
fn test_retrieve_parsable_objects_leaves_the_rest() {
    let mut scripts = ScriptSet::new();
    scripts
        .add(Script::new(
            "INSERT INTO foo VALUES (1)",
            Name::object("foo"),
            ScriptType::TableData,
        ))
        .unwrap();
    scripts
        .add(Script::new(
            "CREATE TABLE foo (a int)",
            Name::object("foo"),
            ScriptType::Table,
        ))
        .unwrap();
    scripts
        .add(Script::new(
            "EXEC sp_configure 'x', 1",
            Name::object("config"),
            ScriptType::Unknown,
        ))
        .unwrap();

    let mut log = MessageLog::new();
    let db = ScriptParser::retrieve_parsable_objects(&mut scripts, &mut log);

    assert_eq!(db.tables[&Name::object("foo")].rows.len(), 1);
    assert_eq!(scripts.types(), vec![ScriptType::Unknown]);
}
