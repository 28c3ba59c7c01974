//! Common test utilities for rust-sqldiff tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rust_sqldiff::{
    generate_migration, Database, DiffOptions, MessageLog, ScriptParser, ScriptSet, ScriptType,
};
use tempfile::TempDir;

/// Test context with a desired and a current script directory
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub desired_dir: PathBuf,
    pub current_dir: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let desired_dir = temp_dir.path().join("desired");
        let current_dir = temp_dir.path().join("current");
        fs::create_dir_all(&desired_dir).expect("Failed to create desired directory");
        fs::create_dir_all(&current_dir).expect("Failed to create current directory");
        Self {
            _temp_dir: temp_dir,
            desired_dir,
            current_dir,
        }
    }

    /// Write a script under the desired directory, e.g. `Tables/dbo.foo.sql`
    pub fn desired(&self, relative: &str, sql: &str) -> &Self {
        write_script(&self.desired_dir, relative, sql);
        self
    }

    /// Write a script under the current directory
    pub fn current(&self, relative: &str, sql: &str) -> &Self {
        write_script(&self.current_dir, relative, sql);
        self
    }

    pub fn options(&self) -> DiffOptions {
        DiffOptions {
            desired_dir: self.desired_dir.clone(),
            current_dir: Some(self.current_dir.clone()),
            ..DiffOptions::default()
        }
    }

    /// Generate the migration, panicking on failure
    pub fn migrate(&self) -> (ScriptSet, MessageLog) {
        self.migrate_with(self.options())
    }

    pub fn migrate_with(&self, options: DiffOptions) -> (ScriptSet, MessageLog) {
        let mut log = MessageLog::new();
        let scripts = generate_migration(&options, &mut log)
            .unwrap_or_else(|e| panic!("Migration failed: {:#}", e));
        (scripts, log)
    }
}

pub fn write_script(root: &Path, relative: &str, sql: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create script directory");
    }
    fs::write(&path, sql).expect("Failed to write script");
}

/// Build a database from SQL text
pub fn database(sql: &str) -> Database {
    let mut parser = ScriptParser::new();
    parser.parse(sql);
    parser.into_database()
}

pub fn types(scripts: &ScriptSet) -> Vec<ScriptType> {
    scripts.types()
}
