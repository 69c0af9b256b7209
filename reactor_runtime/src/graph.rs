//! The precedence graph: a DAG over reaction keys whose topological order
//! determines the priorities the scheduler's reaction queue sorts by.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A directed acyclic graph over node identities `N`, with priorities
/// assigned by repeatedly peeling off sinks (nodes with no outgoing edges).
#[derive(Debug, Clone)]
pub struct PrecedenceGraph<N: Eq + Hash + Copy + Ord> {
    /// Nodes in first-insertion order; ties among simultaneous sinks are
    /// broken by this order, so it must stay stable across rebuilds.
    order: Vec<N>,
    present: HashSet<N>,
    out_edges: HashMap<N, Vec<N>>,
    in_edges: HashMap<N, Vec<N>>,
    /// Edges in insertion order, used only for `to_string_with`'s rendering.
    edge_order: Vec<(N, N)>,
    priorities: HashMap<N, i64>,
}

impl<N: Eq + Hash + Copy + Ord> Default for PrecedenceGraph<N> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            present: HashSet::new(),
            out_edges: HashMap::new(),
            in_edges: HashMap::new(),
            edge_order: Vec::new(),
            priorities: HashMap::new(),
        }
    }
}

impl<N: Eq + Hash + Copy + Ord> PrecedenceGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, v: N) {
        if self.present.insert(v) {
            self.order.push(v);
            self.out_edges.entry(v).or_default();
            self.in_edges.entry(v).or_default();
        }
    }

    pub fn remove_node(&mut self, v: N) {
        if !self.present.remove(&v) {
            return;
        }
        self.order.retain(|&n| n != v);
        if let Some(outs) = self.out_edges.remove(&v) {
            for w in outs {
                if let Some(ins) = self.in_edges.get_mut(&w) {
                    ins.retain(|&n| n != v);
                }
            }
        }
        if let Some(ins) = self.in_edges.remove(&v) {
            for u in ins {
                if let Some(outs) = self.out_edges.get_mut(&u) {
                    outs.retain(|&n| n != v);
                }
            }
        }
        self.edge_order.retain(|&(a, b)| a != v && b != v);
        self.priorities.remove(&v);
    }

    /// Records that `u` depends on `v`: `v` is assigned a strictly lower
    /// priority than `u`, so a reaction queue drained in ascending priority
    /// order runs `v` before `u`.
    pub fn add_edge(&mut self, u: N, v: N) {
        self.add_node(u);
        self.add_node(v);
        let outs = self.out_edges.get_mut(&u).expect("node just inserted");
        if !outs.contains(&v) {
            outs.push(v);
            self.in_edges.get_mut(&v).expect("node just inserted").push(u);
            self.edge_order.push((u, v));
        }
    }

    pub fn add_edges(&mut self, u: N, vs: impl IntoIterator<Item = N>) {
        for v in vs {
            self.add_edge(u, v);
        }
    }

    pub fn remove_edge(&mut self, u: N, v: N) {
        if let Some(outs) = self.out_edges.get_mut(&u) {
            outs.retain(|&n| n != v);
        }
        if let Some(ins) = self.in_edges.get_mut(&v) {
            ins.retain(|&n| n != u);
        }
        self.edge_order.retain(|&(a, b)| !(a == u && b == v));
    }

    pub fn priority(&self, v: N) -> Option<i64> {
        self.priorities.get(&v).copied()
    }

    pub fn contains_node(&self, v: N) -> bool {
        self.present.contains(&v)
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// Assigns priorities `0, spacing, 2*spacing, ...` by repeatedly peeling
    /// off the current set of sinks (zero out-degree nodes), in the stable
    /// node order, until the graph is empty. Returns `false` without
    /// touching the previously assigned priorities if a cycle prevents any
    /// further progress.
    pub fn update_priorities(&mut self, spacing: i64) -> bool {
        let mut remaining: Vec<N> = self.order.clone();
        let mut out_degree: HashMap<N, usize> =
            remaining.iter().map(|&n| (n, self.out_edges[&n].len())).collect();
        let mut assigned = HashMap::new();
        let mut next_priority = 0i64;

        while !remaining.is_empty() {
            let sinks: Vec<N> = remaining
                .iter()
                .copied()
                .filter(|n| out_degree[n] == 0)
                .collect();
            if sinks.is_empty() {
                return false;
            }
            for &n in &sinks {
                assigned.insert(n, next_priority);
                next_priority += spacing;
            }
            let sink_set: HashSet<N> = sinks.iter().copied().collect();
            for &n in &sinks {
                for &u in &self.in_edges[&n] {
                    if !sink_set.contains(&u) {
                        if let Some(d) = out_degree.get_mut(&u) {
                            *d -= 1;
                        }
                    }
                }
            }
            remaining.retain(|n| !sink_set.contains(n));
        }

        self.priorities = assigned;
        true
    }

    /// Renders the graph as a `mermaid`-flavored snapshot: nodes numbered by
    /// ascending priority, edges in original insertion order.
    pub fn to_string_with<F: Fn(N) -> String>(&self, name_of: F) -> String {
        let mut nodes: Vec<N> = self.priorities.keys().copied().collect();
        nodes.sort_by_key(|n| self.priorities[n]);
        let rank: HashMap<N, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let mut out = String::from("graph\n");
        for &n in &nodes {
            out.push_str(&format!("  {}[\"{}\"]\n", rank[&n], name_of(n)));
        }
        for &(u, v) in &self.edge_order {
            if let (Some(&ru), Some(&rv)) = (rank.get(&u), rank.get(&v)) {
                out.push_str(&format!("  {} --> {}\n", ru, rv));
            }
        }
        out
    }
}
