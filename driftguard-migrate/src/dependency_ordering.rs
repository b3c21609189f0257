//! Dependency ordering for multi-table migration generation
//!
//! This module provides functionality to:
//! - Build dependency information from tables' foreign keys
//! - Order tables so referenced tables are created first
//! - Break circular references by postponing a minimal set of foreign keys
//! - Report references to tables outside the requested set

use driftguard::Table;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Table metadata for dependency ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub dependencies: Vec<String>, // Tables this table references
}

impl TableInfo {
    pub fn new<S: Into<String>>(name: impl Into<String>, dependencies: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_table(table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            dependencies: table.dependencies(),
        }
    }
}

/// Creation order plus the references that had to be postponed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arrangement {
    /// Referenced tables before the tables referencing them
    pub order: Vec<String>,
    /// Table → dependencies whose foreign keys must be added afterwards
    pub suppressed: BTreeMap<String, Vec<String>>,
}

impl Arrangement {
    pub fn is_suppressed(&self, table: &str, dependency: &str) -> bool {
        self.suppressed
            .get(table)
            .is_some_and(|deps| deps.iter().any(|d| d == dependency))
    }

    pub fn has_suppressed(&self) -> bool {
        !self.suppressed.is_empty()
    }
}

/// A reference to a table that is not part of the arranged set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReference {
    pub table: String,
    pub referenced: String,
}

/// Order tables so every unsuppressed reference points backwards
///
/// Repeatedly takes the first remaining table (in input order) whose
/// dependencies are all placed. When none qualifies the remaining graph has a
/// cycle: among the tables on a cycle, the one with the fewest remaining
/// dependencies (the last such table in input order on ties) gives up its
/// first dependency that leads back to it. That edge is recorded as
/// suppressed and the scan resumes.
///
/// Self references and references outside the set never constrain the order.
pub fn arrange(tables: &[TableInfo]) -> Arrangement {
    let graph = Graph::new(tables);
    let n = graph.names.len();

    let mut deps = graph.deps.clone();
    let mut placed = vec![false; n];
    let mut arrangement = Arrangement::default();

    while arrangement.order.len() < n {
        let ready = (0..n).find(|&i| !placed[i] && deps[i].iter().all(|&d| placed[d]));
        if let Some(i) = ready {
            placed[i] = true;
            arrangement.order.push(graph.names[i].clone());
            continue;
        }

        let Some((table, dependency)) = pick_cut(&deps, &placed) else {
            // unreachable for a finite graph where every table waits on another
            log::warn!("Dependency ordering stalled; appending remaining tables in input order");
            for i in 0..n {
                if !placed[i] {
                    placed[i] = true;
                    arrangement.order.push(graph.names[i].clone());
                }
            }
            break;
        };

        deps[table].retain(|&d| d != dependency);
        log::debug!(
            "Postponing foreign keys from '{}' to '{}' to break a cycle",
            graph.names[table],
            graph.names[dependency]
        );
        arrangement
            .suppressed
            .entry(graph.names[table].clone())
            .or_default()
            .push(graph.names[dependency].clone());
    }

    arrangement
}

/// References to tables that are not in `tables`
pub fn missing_references(tables: &[TableInfo]) -> Vec<MissingReference> {
    let table_names: HashSet<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    let mut missing = Vec::new();

    for table in tables {
        for dep in &table.dependencies {
            if !table_names.contains(dep.as_str()) {
                missing.push(MissingReference {
                    table: table.name.clone(),
                    referenced: dep.clone(),
                });
            }
        }
    }

    missing
}

/// Validate that all foreign key references point to tables in the set
pub fn validate_foreign_key_references(tables: &[TableInfo]) -> Result<(), String> {
    let errors: Vec<String> = missing_references(tables)
        .into_iter()
        .map(|m| {
            format!(
                "Table '{}' has foreign key reference to '{}' which is not part of this batch",
                m.table, m.referenced
            )
        })
        .collect();

    if !errors.is_empty() {
        return Err(errors.join("\n"));
    }

    Ok(())
}

/// Index-based view of the input: unique names, in-set dependencies only
struct Graph {
    names: Vec<String>,
    deps: Vec<Vec<usize>>,
}

impl Graph {
    fn new(tables: &[TableInfo]) -> Self {
        let mut names: Vec<String> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for table in tables {
            if !index.contains_key(table.name.as_str()) {
                index.insert(table.name.as_str(), names.len());
                names.push(table.name.clone());
            }
        }

        let mut deps: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
        for table in tables {
            let i = index[table.name.as_str()];
            for dep in &table.dependencies {
                if let Some(&d) = index.get(dep.as_str()) {
                    if d != i && !deps[i].contains(&d) {
                        deps[i].push(d);
                    }
                }
            }
        }

        Self { names, deps }
    }
}

/// Choose the edge to cut when no table is ready
fn pick_cut(deps: &[Vec<usize>], placed: &[bool]) -> Option<(usize, usize)> {
    let pending = |i: usize| deps[i].iter().filter(|&&d| !placed[d]).count();

    let mut best: Option<usize> = None;
    for i in 0..deps.len() {
        if placed[i] || !reaches(deps, placed, i, i) {
            continue;
        }
        // `<=` lets later tables win ties
        if best.map_or(true, |b| pending(i) <= pending(b)) {
            best = Some(i);
        }
    }

    let table = best?;
    let dependency = deps[table]
        .iter()
        .copied()
        .find(|&d| !placed[d] && reaches(deps, placed, d, table))?;
    Some((table, dependency))
}

/// Whether `target` is reachable from `from` in one or more steps over unplaced tables
fn reaches(deps: &[Vec<usize>], placed: &[bool], from: usize, target: usize) -> bool {
    let mut seen = vec![false; deps.len()];
    let mut stack: Vec<usize> = if from == target {
        deps[from].iter().copied().filter(|&d| !placed[d]).collect()
    } else {
        vec![from]
    };

    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if seen[current] {
            continue;
        }
        seen[current] = true;
        stack.extend(deps[current].iter().copied().filter(|&d| !placed[d]));
    }
    false
}
