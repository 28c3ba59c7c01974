//! ScriptSet and ordering tests

use rust_sqldiff::{LogLevel, MessageLog, Name, Script, ScriptSet, ScriptType};

fn script(text: &str, name: &str, script_type: ScriptType) -> Script {
    Script::new(text, Name::object(name), script_type)
}

fn names(scripts: &ScriptSet) -> Vec<String> {
    scripts
        .iter()
        .map(|s| format!("{} {}", s.name.object_name(), s.script_type))
        .collect()
}

#[test]
fn test_duplicate_is_rejected_with_name_and_type() {
    let mut scripts = ScriptSet::new();
    scripts
        .add(script("CREATE TABLE foo (a int)", "foo", ScriptType::Table))
        .unwrap();
    let err = scripts
        .add(script("CREATE TABLE foo (b int)", "FOO", ScriptType::Table))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("[dbo].[FOO]"), "{}", message);
    assert!(message.contains("Table"), "{}", message);
    assert_eq!(scripts.len(), 1);
}

#[test]
fn test_same_name_different_type_is_allowed() {
    let mut scripts = ScriptSet::new();
    scripts.add(script("", "foo", ScriptType::Table)).unwrap();
    scripts.add(script("", "foo", ScriptType::TableData)).unwrap();
    assert_eq!(scripts.len(), 2);
}

#[test]
fn test_mutual_table_references_sort_with_one_warning() {
    let mut scripts = ScriptSet::new();
    scripts
        .add(script("CREATE TABLE [dbo].[b]([a] int)\nGO", "b", ScriptType::Table))
        .unwrap();
    scripts
        .add(script("CREATE TABLE [dbo].[a]([b] int)\nGO", "a", ScriptType::Table))
        .unwrap();

    let mut log = MessageLog::new();
    let broken = scripts.sort(&mut log);

    assert_eq!(broken.len(), 1);
    assert_eq!(scripts.len(), 2);
    let warnings: Vec<&str> = log
        .at_level(LogLevel::Differences)
        .map(|m| m.message.as_str())
        .collect();
    assert_eq!(
        warnings,
        vec!["Warning: [dbo].[a] and [dbo].[b] both seem to refer to each other"]
    );
}

#[test]
fn test_sort_is_deterministic() {
    let build = || {
        let mut scripts = ScriptSet::new();
        for (text, name, kind) in [
            ("INSERT INTO foo VALUES (1)", "foo", ScriptType::TableData),
            ("CREATE VIEW v AS SELECT a FROM foo", "v", ScriptType::View),
            ("CREATE TABLE foo (a int)", "foo", ScriptType::Table),
            ("DROP TABLE old", "old", ScriptType::DropTable),
            ("CREATE TABLE bar (a int)", "bar", ScriptType::Table),
        ] {
            scripts.add(script(text, name, kind)).unwrap();
        }
        scripts.sort(&mut MessageLog::new());
        names(&scripts)
    };
    let first = build();
    assert_eq!(
        first,
        vec![
            "old DropTable",
            "bar Table",
            "foo Table",
            "foo TableData",
            "v View"
        ]
    );
    assert_eq!(first, build());
}

#[test]
fn test_to_sql_separates_with_blank_lines() {
    let mut scripts = ScriptSet::new();
    scripts.add(script("SELECT 1\n", "a", ScriptType::Unknown)).unwrap();
    scripts.add(script("SELECT 2", "b", ScriptType::Unknown)).unwrap();
    assert_eq!(scripts.to_sql(), "SELECT 1\n\nSELECT 2");
}
