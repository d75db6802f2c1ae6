//! Foreign key ordering of whole-schema maps
//!
//! Referenced tables come before the tables that reference them so that
//! constraints created right after each `CREATE TABLE` find their target.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{Error, Result};
use crate::schema::types::TableMap;

/// Stable topological sort over the foreign key graph.
///
/// Among the tables ready at any point the earliest in `tables` goes first;
/// self references and references to tables outside `tables` are ignored.
/// Fails with `CyclicReferenceError` naming every table that sits on or
/// behind a cycle.
pub fn sort_by_references(tables: &TableMap) -> Result<TableMap> {
    // indegree[i] = number of distinct in-map tables that table i references
    let mut indegree: Vec<usize> = vec![0; tables.len()];
    let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();

    for (index, table) in tables.values().enumerate() {
        let targets: HashSet<usize> = table
            .referenced_tables()
            .filter_map(|name| tables.get_index_of(name))
            .filter(|&target| target != index)
            .collect();

        indegree[index] = targets.len();
        for target in targets {
            dependents.entry(target).or_default().push(index);
        }
    }

    let mut ready: VecDeque<usize> = (0..tables.len()).filter(|&i| indegree[i] == 0).collect();
    let mut ordered: Vec<usize> = Vec::with_capacity(tables.len());

    while let Some(index) = ready.pop_front() {
        ordered.push(index);

        let mut unlocked = Vec::new();
        if let Some(children) = dependents.get(&index) {
            for &child in children {
                indegree[child] -= 1;
                if indegree[child] == 0 {
                    unlocked.push(child);
                }
            }
        }

        // ready stays sorted by original position
        unlocked.sort_unstable();
        for child in unlocked {
            let position = ready.iter().position(|&queued| queued > child).unwrap_or(ready.len());
            ready.insert(position, child);
        }
    }

    if ordered.len() != tables.len() {
        let cyclic = indegree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .filter_map(|(index, _)| tables.get_index(index).map(|(name, _)| name.clone()))
            .collect();

        return Err(Error::CyclicReferenceError { tables: cyclic });
    }

    Ok(ordered
        .into_iter()
        .filter_map(|index| tables.get_index(index))
        .map(|(name, table)| (name.clone(), table.clone()))
        .collect())
}
