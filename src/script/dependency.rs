//! Dependency graph over scripts and the cycle-tolerant topological sort
//!
//! An edge `a -> b` means `a` must run before `b`. Edges come from fixed rules
//! between script kinds acting on the same table, from foreign keys, and from
//! a textual scan of definition scripts for names of other scripts. The scan
//! can produce false positives (a column named like another table), so cycles
//! are expected: the sorter breaks them deterministically and keeps going.
//!
//! Among scripts whose prerequisites have all run, the next one is the least
//! by `(ScriptType, Name)`.

use std::collections::{BTreeSet, HashMap};

use super::{Script, ScriptType};
use crate::log::{LogLevel, Logger};
use crate::model::Name;
use crate::parser::{referenced_names, tokenize};

/// A dependency that was ignored to break a cycle: `script` was scheduled
/// although `depends_on` had not run yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleBreak {
    pub script: Name,
    pub depends_on: Name,
}

#[derive(Debug, Clone)]
pub struct SortOutcome {
    /// Indices into the input, in execution order
    pub order: Vec<usize>,
    pub broken_cycles: Vec<CycleBreak>,
}

/// Order `scripts` so that prerequisites come first.
pub fn resolve_order(scripts: &[Script], logger: &mut dyn Logger) -> SortOutcome {
    let graph = DependencyGraph::build(scripts);
    graph.sort(scripts, logger)
}

struct DependencyGraph {
    /// `prerequisites[b]` holds every `a` with an edge `a -> b`
    prerequisites: Vec<BTreeSet<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl DependencyGraph {
    fn build(scripts: &[Script]) -> Self {
        let references: Vec<Vec<Name>> = scripts.iter().map(all_references).collect();

        // Definitions by name, for the reference rule
        let mut definitions: HashMap<&Name, Vec<usize>> = HashMap::new();
        for (i, script) in scripts.iter().enumerate() {
            if script.script_type.is_definition() || script.script_type == ScriptType::FullTextCatalog
            {
                definitions.entry(&script.name).or_default().push(i);
            }
        }

        let mut graph = Self {
            prerequisites: vec![BTreeSet::new(); scripts.len()],
            dependents: vec![Vec::new(); scripts.len()],
        };

        for (b, script) in scripts.iter().enumerate() {
            if script.script_type.is_definition() {
                for name in &references[b] {
                    for &a in definitions.get(name).into_iter().flatten() {
                        graph.add_edge(a, b);
                    }
                }
            }
            for (a, other) in scripts.iter().enumerate() {
                if a != b && must_precede(other, &references[a], script, &references[b]) {
                    graph.add_edge(a, b);
                }
            }
        }
        graph
    }

    fn add_edge(&mut self, a: usize, b: usize) {
        if a != b && self.prerequisites[b].insert(a) {
            self.dependents[a].push(b);
        }
    }

    fn sort(mut self, scripts: &[Script], logger: &mut dyn Logger) -> SortOutcome {
        let key = |i: usize| (scripts[i].script_type, scripts[i].name.clone(), i);
        let mut done = vec![false; scripts.len()];
        let mut ready: BTreeSet<(ScriptType, Name, usize)> = (0..scripts.len())
            .filter(|&i| self.prerequisites[i].is_empty())
            .map(key)
            .collect();
        let mut order = Vec::with_capacity(scripts.len());
        let mut broken_cycles = Vec::new();

        while order.len() < scripts.len() {
            let Some((_, _, next)) = ready.pop_first() else {
                let (script, depends_on) = self.pick_cycle_break(scripts, &done);
                logger.log(
                    LogLevel::Differences,
                    &format!(
                        "Warning: {} and {} both seem to refer to each other",
                        scripts[script].name, scripts[depends_on].name
                    ),
                );
                broken_cycles.push(CycleBreak {
                    script: scripts[script].name.clone(),
                    depends_on: scripts[depends_on].name.clone(),
                });
                self.prerequisites[script].clear();
                ready.insert(key(script));
                continue;
            };

            done[next] = true;
            order.push(next);
            for &dependent in &self.dependents[next] {
                let prerequisites = &mut self.prerequisites[dependent];
                if prerequisites.remove(&next) && prerequisites.is_empty() && !done[dependent] {
                    ready.insert(key(dependent));
                }
            }
        }

        SortOutcome {
            order,
            broken_cycles,
        }
    }

    /// Every pending script waits on another, so the pending graph holds a
    /// cycle. Take the strongly connected components nothing else feeds into,
    /// pick the least script of the least such component, and pair it with
    /// its least pending prerequisite.
    fn pick_cycle_break(&self, scripts: &[Script], done: &[bool]) -> (usize, usize) {
        let rank = move |i: usize| (scripts[i].script_type, &scripts[i].name, i);
        let components = self.strongly_connected(done);

        let mut component_of = vec![usize::MAX; scripts.len()];
        for (c, members) in components.iter().enumerate() {
            for &m in members {
                component_of[m] = c;
            }
        }
        let is_source = |c: usize| {
            components[c].iter().all(|&m| {
                self.prerequisites[m]
                    .iter()
                    .all(|&p| done[p] || component_of[p] == c)
            })
        };

        let script = (0..components.len())
            .filter(|&c| is_source(c) && components[c].len() > 1)
            .filter_map(|c| components[c].iter().copied().min_by_key(|&m| rank(m)))
            .min_by_key(|&m| rank(m))
            .or_else(|| {
                (0..scripts.len())
                    .filter(|&i| !done[i])
                    .min_by_key(|&i| rank(i))
            })
            .unwrap_or(0);
        let depends_on = self.prerequisites[script]
            .iter()
            .copied()
            .filter(|&p| !done[p])
            .min_by_key(|&p| rank(p))
            .unwrap_or(script);
        (script, depends_on)
    }

    /// Kosaraju over the pending scripts.
    fn strongly_connected(&self, done: &[bool]) -> Vec<Vec<usize>> {
        let n = done.len();
        let mut visited = vec![false; n];
        let mut finished = Vec::with_capacity(n);

        // First pass: finish order along prerequisite -> dependent edges
        for start in 0..n {
            if done[start] || visited[start] {
                continue;
            }
            visited[start] = true;
            let mut stack = vec![(start, 0usize)];
            while let Some((node, edge)) = stack.pop() {
                if let Some(&next) = self.dependents[node].get(edge) {
                    stack.push((node, edge + 1));
                    if !done[next] && !visited[next] {
                        visited[next] = true;
                        stack.push((next, 0));
                    }
                } else {
                    finished.push(node);
                }
            }
        }

        // Second pass: reverse edges, in reverse finish order
        let mut assigned = vec![false; n];
        let mut components = Vec::new();
        for &start in finished.iter().rev() {
            if assigned[start] {
                continue;
            }
            assigned[start] = true;
            let mut members = Vec::new();
            let mut stack = vec![start];
            while let Some(node) = stack.pop() {
                members.push(node);
                for &p in &self.prerequisites[node] {
                    if !done[p] && !assigned[p] {
                        assigned[p] = true;
                        stack.push(p);
                    }
                }
            }
            components.push(members);
        }
        components
    }
}

/// Declared references plus, for definitions, every name the text mentions.
fn all_references(script: &Script) -> Vec<Name> {
    let mut names: BTreeSet<Name> = script.references.iter().cloned().collect();
    if script.script_type.is_definition() {
        let tokens = tokenize(&script.text);
        names.extend(referenced_names(tokens.tokens(), &script.name));
    }
    names.into_iter().collect()
}

/// Teardown of a table: drops of its constraints and removal of rows.
fn is_teardown(script_type: ScriptType) -> bool {
    matches!(
        script_type,
        ScriptType::DropForeignKey
            | ScriptType::DropPrimaryKey
            | ScriptType::DropDefaultConstraint
            | ScriptType::TableRemoveData
    )
}

/// Scripts that (re)build a table and what hangs off it.
fn is_build(script_type: ScriptType) -> bool {
    matches!(
        script_type,
        ScriptType::Table
            | ScriptType::DefaultConstraint
            | ScriptType::TableRestoreData
            | ScriptType::TableData
            | ScriptType::PrimaryKey
            | ScriptType::ForeignKey
    )
}

/// Order between two scripts on the same table.
fn same_table_order(a: ScriptType, b: ScriptType) -> bool {
    use ScriptType::*;
    match a {
        _ if is_teardown(a) => {
            matches!(b, TableSaveData | DropTable) || is_build(b)
        }
        TableSaveData => is_build(b),
        Table => is_build(b) && b != Table,
        DefaultConstraint => b == TableRestoreData,
        TableRestoreData => matches!(b, TableData | PrimaryKey | ForeignKey),
        TableData => b == ForeignKey,
        _ => false,
    }
}

/// Whether `a` must run before `b`.
fn must_precede(a: &Script, a_refs: &[Name], b: &Script, b_refs: &[Name]) -> bool {
    use ScriptType::*;
    let (ta, tb) = (a.script_type, b.script_type);
    let a_table = a.subject_table();
    let b_table = b.subject_table();

    if a_table.is_some() && a_table == b_table && same_table_order(ta, tb) {
        return true;
    }

    // drop before create of the same object
    if ta.created_kind_of_drop() == Some(tb) && a.name == b.name {
        return true;
    }

    // a foreign key needs its referenced table built and loaded
    if tb == ForeignKey
        && matches!(ta, Table | TableRestoreData | TableData | PrimaryKey)
        && a_table.is_some_and(|t| b_refs.contains(t))
    {
        return true;
    }

    // a dropped foreign key no longer holds its referenced table in place
    if ta == DropForeignKey
        && matches!(tb, DropTable | TableSaveData | DropPrimaryKey | TableRemoveData)
        && b_table.is_some_and(|t| a_refs.contains(t))
    {
        return true;
    }

    // a dropped table holds the targets of its foreign keys until it is gone
    if ta == DropTable
        && matches!(tb, DropTable | TableSaveData | DropPrimaryKey | TableRemoveData)
        && b_table.is_some_and(|t| a_refs.contains(t))
    {
        return true;
    }

    // parent rows before child rows; child rows removed before parent rows
    if tb == TableData
        && matches!(ta, TableData | TableRestoreData)
        && a_table.is_some_and(|t| b_refs.contains(t))
    {
        return true;
    }
    if ta == TableRemoveData
        && tb == TableRemoveData
        && b_table.is_some_and(|t| a_refs.contains(t))
    {
        return true;
    }

    // a dropped routine no longer holds what it referenced in place
    if matches!(ta, DropView | DropFunction | DropStoredProc)
        && matches!(
            tb,
            DropTable | TableSaveData | DropView | DropFunction | DropTableType | DropStoredProc
        )
        && a_refs.contains(&b.name)
    {
        return true;
    }

    false
}
