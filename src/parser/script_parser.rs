//! Folding scripts into a database model
//!
//! `ScriptParser` accumulates a `Database` over any number of `parse` calls.
//! Statements that match none of the recognized shapes are skipped and noted
//! at Verbose level.

use super::statement_parser::{parse_statements, SourceStatement};
use crate::log::{LogLevel, Logger, MessageLog};
use crate::model::builder::apply_statement;
use crate::model::Database;
use crate::script::{Script, ScriptSet};

#[derive(Debug, Default)]
pub struct ScriptParser {
    database: Database,
    diagnostics: MessageLog,
}

impl ScriptParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and fold every recognized statement into the database.
    /// Messages go to `diagnostics()`.
    pub fn parse(&mut self, text: &str) {
        apply(&mut self.database, parse_statements(text), &mut self.diagnostics);
    }

    /// Like `parse`, reporting to `logger` instead of `diagnostics()`.
    pub fn parse_logged(&mut self, text: &str, logger: &mut dyn Logger) {
        apply(&mut self.database, parse_statements(text), logger);
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn into_database(self) -> Database {
        self.database
    }

    /// Messages produced while parsing
    pub fn diagnostics(&self) -> &MessageLog {
        &self.diagnostics
    }

    /// Move every script made only of recognized statements out of `scripts`
    /// and build a database from them. Scripts with anything unrecognized stay
    /// in the set untouched.
    ///
    /// Table definitions are applied before alterations and alterations before
    /// data, whatever order the scripts come in.
    pub fn retrieve_parsable_objects(scripts: &mut ScriptSet, logger: &mut dyn Logger) -> Database {
        let mut parsable: Vec<(u8, Script, Vec<SourceStatement>)> = Vec::new();
        let keys: Vec<_> = scripts
            .iter()
            .map(|s| (s.name.clone(), s.script_type))
            .collect();

        for (name, script_type) in keys {
            let Some(script) = scripts.get(&name, script_type) else {
                continue;
            };
            let statements = parse_statements(&script.text);
            let phase = statements
                .iter()
                .map(|s| s.parsed.as_ref().map(|p| p.phase()))
                .collect::<Option<Vec<u8>>>()
                .and_then(|phases| phases.into_iter().min());
            match phase {
                Some(phase) => {
                    if let Some(script) = scripts.remove(&name, script_type) {
                        parsable.push((phase, script, statements));
                    }
                }
                None => logger.log(
                    LogLevel::Verbose,
                    &format!("Script {} {} was not recognized", name, script_type),
                ),
            }
        }

        // stable, so scripts of one phase keep their set order
        parsable.sort_by_key(|(phase, _, _)| *phase);

        let mut database = Database::new();
        for (_, _, statements) in parsable {
            apply(&mut database, statements, logger);
        }
        database
    }
}

fn apply(database: &mut Database, statements: Vec<SourceStatement>, logger: &mut dyn Logger) {
    for statement in statements {
        match statement.parsed {
            Some(parsed) => apply_statement(database, parsed, logger),
            None => logger.log(
                LogLevel::Verbose,
                &format!("Skipping unrecognized statement: {}", first_line(&statement.text)),
            ),
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}
