//! rust-sqldiff: migration scripts from two SQL Server snapshots
//!
//! Both snapshots are directories of `.sql` scripts. The recognized scripts
//! are folded into a [`Database`] model each, the two models are compared,
//! and the differences come back as a dependency-ordered [`ScriptSet`].

pub mod diff;
pub mod error;
pub mod log;
pub mod model;
pub mod parser;
pub mod project;
pub mod script;
pub mod util;

use std::path::PathBuf;

use anyhow::Result;

pub use error::SqlDiffError;
pub use log::{LogLevel, LogMessage, Logger, MessageLog, NullLogger, TracingLogger};
pub use model::{Database, Name};
pub use parser::ScriptParser;
pub use script::{Script, ScriptSet, ScriptType};

use project::{SchemaSource, ScriptDirectorySource};

/// Options for generating a migration
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Directory holding the scripts of the desired database
    pub desired_dir: PathBuf,
    /// Directory holding the scripts of the current database; absent means
    /// the current database is empty
    pub current_dir: Option<PathBuf>,
    /// Where to write the migration (defaults to stdout)
    pub output_path: Option<PathBuf>,
    /// Emit scripts that insert and delete rows
    pub include_data: bool,
    /// Glob patterns, relative to each script directory, of files to skip
    pub excludes: Vec<String>,
    /// Enable verbose output
    pub verbose: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            desired_dir: PathBuf::from("."),
            current_dir: None,
            output_path: None,
            include_data: true,
            excludes: Vec::new(),
            verbose: false,
        }
    }
}

/// Generate the ordered scripts that take the current snapshot to the desired one.
pub fn generate_migration(options: &DiffOptions, logger: &mut dyn Logger) -> Result<ScriptSet> {
    // Step 1: Load the desired scripts and fold the recognized ones
    let mut leftovers = project::load_scripts_excluding(&options.desired_dir, &options.excludes)?;
    let desired = ScriptParser::retrieve_parsable_objects(&mut leftovers, logger);

    // Step 2: Read the current snapshot
    let current = match &options.current_dir {
        Some(dir) => ScriptDirectorySource::new(options.excludes.clone())
            .parse_database(&dir.to_string_lossy(), logger)?,
        None => Database::new(),
    };

    // Step 3: Diff and order
    let mut scripts = desired.create_diff_scripts(&current, logger)?;
    if !options.include_data {
        scripts.retain(|s| {
            !matches!(
                s.script_type,
                ScriptType::TableData | ScriptType::TableRemoveData
            )
        });
    }
    scripts.sort(logger);

    // Step 4: Scripts that could not be modelled run last, as written
    for script in leftovers {
        logger.log(
            LogLevel::Information,
            &format!(
                "Script {} {} could not be compared and is appended as is",
                script.name, script.script_type
            ),
        );
        scripts.add(script)?;
    }

    Ok(scripts)
}
