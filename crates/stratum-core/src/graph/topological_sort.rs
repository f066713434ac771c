// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Kahn's algorithm with a stable tie-break.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

/// An error indicating that a cycle was detected in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError;

/// Performs a topological sort on a generic directed graph.
///
/// Whenever several nodes are ready at once, the one that appears first in
/// `nodes` is emitted first, so a graph without edges comes back in input order.
///
/// # Arguments
///
/// * `nodes`: The unique nodes of the graph, in preferred order.
/// * `edges`: Directed edges `(before, after)`. Edges naming unknown nodes are ignored.
///
/// # Returns
///
/// * `Ok(Vec<T>)`: The nodes in a valid topological order.
/// * `Err(CycleError)`: If the graph contains one or more cycles.
pub fn topological_sort<T>(
    nodes: impl IntoIterator<Item = T>,
    edges: impl IntoIterator<Item = (T, T)>,
) -> Result<Vec<T>, CycleError>
where
    T: Copy + Eq + Hash,
{
    let node_list: Vec<T> = nodes.into_iter().collect();
    if node_list.is_empty() {
        return Ok(Vec::new());
    }

    let position: HashMap<T, usize> = node_list
        .iter()
        .enumerate()
        .map(|(i, n)| (*n, i))
        .collect();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); node_list.len()];
    let mut in_degree = vec![0usize; node_list.len()];

    for (before, after) in edges {
        let (Some(&b), Some(&a)) = (position.get(&before), position.get(&after)) else {
            continue;
        };
        if b == a || successors[b].contains(&a) {
            continue;
        }
        successors[b].push(a);
        in_degree[a] += 1;
    }

    let mut ready: BTreeSet<usize> = (0..node_list.len())
        .filter(|&i| in_degree[i] == 0)
        .collect();
    let mut sorted = Vec::with_capacity(node_list.len());

    while let Some(next) = ready.pop_first() {
        sorted.push(node_list[next]);
        for &succ in &successors[next] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.insert(succ);
            }
        }
    }

    if sorted.len() != node_list.len() {
        Err(CycleError)
    } else {
        Ok(sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_edges_keeps_input_order() {
        let sorted = topological_sort([3, 1, 2], std::iter::empty()).unwrap();
        assert_eq!(sorted, vec![3, 1, 2]);
    }

    #[test]
    fn edges_reorder_dependents_after_producers() {
        // 'c' feeds 'a', so 'c' must come first even though it is listed last.
        let sorted = topological_sort(['a', 'b', 'c'], [('c', 'a')]).unwrap();
        assert_eq!(sorted, vec!['b', 'c', 'a']);
    }

    #[test]
    fn self_edges_are_ignored() {
        let sorted = topological_sort([1, 2], [(1, 1)]).unwrap();
        assert_eq!(sorted, vec![1, 2]);
    }

    #[test]
    fn cycle_is_reported() {
        assert_eq!(
            topological_sort([1, 2, 3], [(1, 2), (2, 3), (3, 1)]),
            Err(CycleError)
        );
    }
}
