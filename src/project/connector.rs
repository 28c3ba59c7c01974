//! Boundaries to live servers
//!
//! The diff works on [`Database`] snapshots and produces script text. Reading
//! a snapshot from somewhere and running scripts somewhere are behind the two
//! traits here. [`ScriptDirectorySource`] reads a snapshot from a script
//! directory; live connectors implement the same trait.

use std::path::Path;

use anyhow::Result;

use super::script_loader::load_scripts_excluding;
use crate::error::SqlDiffError;
use crate::log::Logger;
use crate::model::{Database, Name, SqlValue};
use crate::parser::ScriptParser;
use crate::script::{Script, ScriptSet};

/// Something a [`Database`] snapshot can be read from.
pub trait SchemaSource {
    /// Schema, and whatever data the source carries, for `target`.
    fn parse_database(&self, target: &str, logger: &mut dyn Logger) -> Result<Database>;

    /// Replace the rows of `tables` in `database` with the rows found at
    /// `target`, aligned to each table's column order.
    fn get_data(
        &self,
        database: &mut Database,
        tables: &[Name],
        target: &str,
        logger: &mut dyn Logger,
    ) -> Result<()>;
}

/// Runs scripts against a server.
pub trait ScriptExecutor {
    fn execute_script(&mut self, script: &Script, target: &str) -> Result<(), SqlDiffError>;

    /// Run `scripts` in order, stopping at the first failure.
    fn execute_scripts(&mut self, scripts: &ScriptSet, target: &str) -> Result<(), SqlDiffError> {
        if target.trim().is_empty() {
            return Err(SqlDiffError::MissingConnectionTarget);
        }
        for script in scripts {
            tracing::debug!("Executing {} {}", script.name, script.script_type);
            self.execute_script(script, target)?;
        }
        Ok(())
    }
}

/// Split script text into the batches between `GO` lines.
pub fn split_batches(text: &str) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().eq_ignore_ascii_case("GO") {
            push_batch(&mut batches, &mut current);
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    push_batch(&mut batches, &mut current);
    batches
}

fn push_batch(batches: &mut Vec<String>, current: &mut String) {
    let batch = current.trim();
    if !batch.is_empty() {
        batches.push(batch.to_string());
    }
    current.clear();
}

/// Reads snapshots from directories of `.sql` files; the target is the
/// directory path.
#[derive(Debug, Clone, Default)]
pub struct ScriptDirectorySource {
    excludes: Vec<String>,
}

impl ScriptDirectorySource {
    /// A source that skips files matching the `excludes` glob patterns.
    pub fn new(excludes: Vec<String>) -> Self {
        Self { excludes }
    }

    fn load(&self, target: &str, logger: &mut dyn Logger) -> Result<Database> {
        if target.trim().is_empty() {
            return Err(SqlDiffError::MissingConnectionTarget.into());
        }
        let mut scripts = load_scripts_excluding(Path::new(target), &self.excludes)?;
        Ok(ScriptParser::retrieve_parsable_objects(&mut scripts, logger))
    }
}

impl SchemaSource for ScriptDirectorySource {
    fn parse_database(&self, target: &str, logger: &mut dyn Logger) -> Result<Database> {
        self.load(target, logger)
    }

    fn get_data(
        &self,
        database: &mut Database,
        tables: &[Name],
        target: &str,
        logger: &mut dyn Logger,
    ) -> Result<()> {
        let source = self.load(target, logger)?;
        for name in tables {
            let (Some(table), Some(found)) = (database.tables.get_mut(name), source.tables.get(name))
            else {
                continue;
            };
            table.rows = found
                .rows
                .iter()
                .map(|row| {
                    table
                        .columns
                        .iter()
                        .map(|column| {
                            found
                                .column_index(&column.name)
                                .and_then(|i| row.get(i).cloned())
                                .unwrap_or(SqlValue::Null)
                        })
                        .collect()
                })
                .collect();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NullLogger;
    use crate::script::ScriptType;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingExecutor {
        ran: Vec<String>,
        fail_on: Option<String>,
    }

    impl ScriptExecutor for RecordingExecutor {
        fn execute_script(&mut self, script: &Script, _target: &str) -> Result<(), SqlDiffError> {
            let name = script.name.object_name().to_string();
            if self.fail_on.as_deref() == Some(name.as_str()) {
                return Err(SqlDiffError::ExecutionFailed {
                    name: script.name.clone(),
                    script_type: script.script_type,
                    message: "constraint violation".to_string(),
                });
            }
            self.ran.push(name);
            Ok(())
        }
    }

    fn two_scripts() -> ScriptSet {
        let mut scripts = ScriptSet::new();
        for name in ["a", "b"] {
            scripts
                .add(Script::new("SELECT 1", Name::object(name), ScriptType::Table))
                .unwrap();
        }
        scripts
    }

    #[test]
    fn test_split_batches() {
        let batches = split_batches("CREATE TABLE a (x int)\nGO\n\n  go  \nSELECT 1\nSELECT 2\nGO");
        assert_eq!(batches, vec!["CREATE TABLE a (x int)", "SELECT 1\nSELECT 2"]);
    }

    #[test]
    fn test_execute_scripts_requires_target() {
        let mut executor = RecordingExecutor::default();
        let err = executor.execute_scripts(&two_scripts(), " ").unwrap_err();
        assert!(matches!(err, SqlDiffError::MissingConnectionTarget));
        assert!(executor.ran.is_empty());
    }

    #[test]
    fn test_execute_scripts_stops_at_first_failure() {
        let mut executor = RecordingExecutor {
            fail_on: Some("a".to_string()),
            ..Default::default()
        };
        let err = executor.execute_scripts(&two_scripts(), "server").unwrap_err();
        assert!(err.to_string().contains("constraint violation"));
        assert!(executor.ran.is_empty());
    }

    #[test]
    fn test_directory_source_get_data_aligns_columns() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Tables")).unwrap();
        fs::create_dir_all(dir.path().join("Data")).unwrap();
        fs::write(dir.path().join("Tables/foo.sql"), "CREATE TABLE foo (a int, b int)").unwrap();
        fs::write(dir.path().join("Data/foo.sql"), "INSERT INTO foo VALUES (1, 2)").unwrap();

        let mut database = {
            let mut parser = ScriptParser::new();
            parser.parse("CREATE TABLE foo (b int, a int, c int)");
            parser.into_database()
        };
        let target = dir.path().to_string_lossy().into_owned();
        ScriptDirectorySource::default()
            .get_data(&mut database, &[Name::object("foo")], &target, &mut NullLogger)
            .unwrap();

        let rows = &database.tables[&Name::object("foo")].rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], SqlValue::Null);
        assert_eq!(
            database.tables[&Name::object("foo")].row_key(&rows[0]),
            database.tables[&Name::object("foo")].row_key(&vec![
                SqlValue::Number("2".to_string()),
                SqlValue::Number("1".to_string()),
                SqlValue::Null
            ])
        );
    }
}
