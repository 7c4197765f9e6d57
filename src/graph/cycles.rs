//! Bounded-depth cycle detection over the relationship graph.

use std::collections::{HashMap, HashSet};

use crate::graph::{GraphEdge, GraphNode, Loop};
use crate::model::ModelIdentifier;

/// Detect cycles by depth-first traversal from every node, bounded by
/// `max_depth`: paths longer than the bound are abandoned, not reported.
/// Loops are deduplicated by their unordered node set; the kept loop
/// preserves the originally discovered path order.
#[must_use]
pub fn detect(nodes: &[GraphNode], edges: &[GraphEdge], max_depth: usize) -> Vec<Loop> {
    let ids: Vec<&ModelIdentifier> = nodes.iter().map(|n| &n.id).collect();
    let index: HashMap<&ModelIdentifier, usize> =
        ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    for edge in edges {
        // Edges pointing at models outside this run do not participate.
        if let (Some(&s), Some(&t)) = (index.get(&edge.source), index.get(&edge.target)) {
            if !adjacency[s].contains(&t) {
                adjacency[s].push(t);
            }
        }
    }

    let mut raw: Vec<Vec<usize>> = Vec::new();
    for start in 0..ids.len() {
        let mut path: Vec<usize> = Vec::new();
        let mut on_path = vec![false; ids.len()];
        dfs(start, 0, max_depth, &adjacency, &mut path, &mut on_path, &mut raw);
    }

    // Dedupe by sorted node-set key, first occurrence wins.
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut out = Vec::new();
    for cycle in raw {
        let mut key = cycle.clone();
        key.sort_unstable();
        if seen.insert(key) {
            out.push(Loop(cycle.into_iter().map(|i| ids[i].clone()).collect()));
        }
    }
    out
}

fn dfs(
    node: usize,
    depth: usize,
    max_depth: usize,
    adjacency: &[Vec<usize>],
    path: &mut Vec<usize>,
    on_path: &mut [bool],
    out: &mut Vec<Vec<usize>>,
) {
    path.push(node);
    on_path[node] = true;
    for &next in &adjacency[node] {
        if on_path[next] {
            // Closed a cycle: the loop is the path slice from the first
            // occurrence of `next` through the current node.
            if let Some(pos) = path.iter().position(|&x| x == next) {
                out.push(path[pos..].to_vec());
            }
        } else if depth < max_depth {
            dfs(next, depth + 1, max_depth, adjacency, path, on_path, out);
        }
    }
    path.pop();
    on_path[node] = false;
}

/// Mark loop membership on nodes: `in_loops` and one `loop_severity`
/// increment per unique loop the node belongs to.
pub fn annotate(nodes: &mut [GraphNode], loops: &[Loop]) {
    for lp in loops {
        let members: HashSet<&ModelIdentifier> = lp.0.iter().collect();
        for node in nodes.iter_mut() {
            if members.contains(&node.id) {
                node.in_loops = true;
                node.loop_severity += 1;
            }
        }
    }
}
