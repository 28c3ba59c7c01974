//! Loading a directory of `.sql` files into a [`ScriptSet`]
//!
//! The directory layout carries the metadata:
//!
//! ```text
//! <root>/Tables/dbo.foo.sql        -> [dbo].[foo]  Table
//! <root>/StoredProcedures/p.sql    -> [dbo].[p]    StoredProc
//! <root>/Data/dbo.foo.sql          -> [dbo].[foo]  TableData
//! ```
//!
//! Files in any other directory load as `Unknown`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use encoding_rs::WINDOWS_1252;
use rayon::prelude::*;

use crate::error::SqlDiffError;
use crate::model::Name;
use crate::script::{Script, ScriptSet, ScriptType};

/// Minimum number of files to benefit from parallel reads.
const PARALLEL_THRESHOLD: usize = 8;

/// Read a file as a string, trying UTF-8 first, then Windows-1252 as fallback
pub fn read_script_file(path: &Path) -> Result<String, SqlDiffError> {
    let bytes = std::fs::read(path).map_err(|source| SqlDiffError::ScriptReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let bytes = err.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                return Err(SqlDiffError::ScriptReadError {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "File contains invalid characters",
                    ),
                });
            }
            decoded.into_owned()
        }
    };
    if let Some(rest) = text.strip_prefix('\u{FEFF}') {
        return Ok(rest.to_string());
    }
    Ok(text)
}

/// Script type implied by the name of the directory a file sits in.
pub fn script_type_for_directory(directory: &str) -> ScriptType {
    match directory.to_ascii_lowercase().as_str() {
        "tables" => ScriptType::Table,
        "types" | "tabletypes" => ScriptType::TableType,
        "views" => ScriptType::View,
        "functions" => ScriptType::Function,
        "storedprocedures" | "procedures" => ScriptType::StoredProc,
        "data" => ScriptType::TableData,
        "primarykeys" => ScriptType::PrimaryKey,
        "foreignkeys" => ScriptType::ForeignKey,
        "defaults" | "defaultconstraints" => ScriptType::DefaultConstraint,
        "fulltextcatalogs" => ScriptType::FullTextCatalog,
        _ => ScriptType::Unknown,
    }
}

/// Name and type of the script stored at `path`.
fn describe(path: &Path) -> Result<(Name, ScriptType), SqlDiffError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = Name::parse(&stem).ok_or(SqlDiffError::InvalidName { text: stem })?;
    let script_type = path
        .parent()
        .and_then(Path::file_name)
        .map_or(ScriptType::Unknown, |dir| {
            script_type_for_directory(&dir.to_string_lossy())
        });
    Ok((name, script_type))
}

/// Every `.sql` file under `root`, sorted, minus those matching `excludes`.
pub fn find_script_files(root: &Path, excludes: &[String]) -> Result<Vec<PathBuf>> {
    let matchers = excludes
        .iter()
        .map(|pattern| {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {}", pattern))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
        })
        .filter(|p| {
            let relative = p.strip_prefix(root).unwrap_or(p);
            !matchers.iter().any(|m| m.matches_path(relative))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn load_one(path: &Path) -> Result<Script, SqlDiffError> {
    let (name, script_type) = describe(path)?;
    let text = read_script_file(path)?;
    Ok(Script::new(text, name, script_type))
}

/// Load every script under `root`.
pub fn load_scripts(root: &Path) -> Result<ScriptSet> {
    load_scripts_excluding(root, &[])
}

/// Load every script under `root` except those whose path relative to `root`
/// matches one of the `excludes` glob patterns.
pub fn load_scripts_excluding(root: &Path, excludes: &[String]) -> Result<ScriptSet> {
    if !root.is_dir() {
        return Err(SqlDiffError::ScriptDirectoryNotFound {
            path: root.to_path_buf(),
        }
        .into());
    }
    let files = find_script_files(root, excludes)?;

    let loaded: Vec<Result<Script, SqlDiffError>> = if files.len() >= PARALLEL_THRESHOLD {
        files.par_iter().map(|file| load_one(file)).collect()
    } else {
        files.iter().map(|file| load_one(file)).collect()
    };

    let mut scripts = ScriptSet::new();
    for (script, path) in loaded.into_iter().zip(&files) {
        scripts
            .add(script?)
            .with_context(|| format!("Loading {}", path.display()))?;
    }
    tracing::debug!("Loaded {} scripts from {}", scripts.len(), root.display());
    Ok(scripts)
}
