//! Ordered collection of scripts, unique by name and kind

use std::collections::HashSet;

use super::dependency::{resolve_order, CycleBreak};
use super::{Script, ScriptType};
use crate::error::SqlDiffError;
use crate::log::Logger;
use crate::model::Name;

#[derive(Debug, Clone, Default)]
pub struct ScriptSet {
    scripts: Vec<Script>,
    keys: HashSet<(Name, ScriptType)>,
}

impl ScriptSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a script. A second script with the same name and kind is an error.
    pub fn add(&mut self, script: Script) -> Result<(), SqlDiffError> {
        let key = (script.name.clone(), script.script_type);
        if self.keys.contains(&key) {
            return Err(SqlDiffError::DuplicateScript {
                name: key.0,
                script_type: key.1,
            });
        }
        self.keys.insert(key);
        self.scripts.push(script);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Script> {
        self.scripts.iter()
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn get(&self, name: &Name, script_type: ScriptType) -> Option<&Script> {
        self.scripts
            .iter()
            .find(|s| s.script_type == script_type && &s.name == name)
    }

    pub fn remove(&mut self, name: &Name, script_type: ScriptType) -> Option<Script> {
        let index = self
            .scripts
            .iter()
            .position(|s| s.script_type == script_type && &s.name == name)?;
        self.keys.remove(&(name.clone(), script_type));
        Some(self.scripts.remove(index))
    }

    /// Keep only the scripts for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Script) -> bool) {
        let keys = &mut self.keys;
        self.scripts.retain(|s| {
            let kept = keep(s);
            if !kept {
                keys.remove(&(s.name.clone(), s.script_type));
            }
            kept
        });
    }

    /// Kinds of the scripts, in order.
    pub fn types(&self) -> Vec<ScriptType> {
        self.scripts.iter().map(|s| s.script_type).collect()
    }

    /// All script text, separated by blank lines.
    pub fn to_sql(&self) -> String {
        self.scripts
            .iter()
            .map(|s| s.text.trim_end())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Reorder so every script runs after the scripts it depends on.
    ///
    /// Dependency cycles do not fail the sort: each one is broken, logged,
    /// and returned.
    pub fn sort(&mut self, logger: &mut dyn Logger) -> Vec<CycleBreak> {
        let outcome = resolve_order(&self.scripts, logger);
        let mut slots: Vec<Option<Script>> = std::mem::take(&mut self.scripts)
            .into_iter()
            .map(Some)
            .collect();
        self.scripts = outcome
            .order
            .iter()
            .filter_map(|&i| slots[i].take())
            .collect();
        outcome.broken_cycles
    }
}

impl<'a> IntoIterator for &'a ScriptSet {
    type Item = &'a Script;
    type IntoIter = std::slice::Iter<'a, Script>;

    fn into_iter(self) -> Self::IntoIter {
        self.scripts.iter()
    }
}

impl IntoIterator for ScriptSet {
    type Item = Script;
    type IntoIter = std::vec::IntoIter<Script>;

    fn into_iter(self) -> Self::IntoIter {
        self.scripts.into_iter()
    }
}
