//! Connected components over the undirected projection of the graph.
//!
//! An edge `A → B` joins `A` and `B` regardless of direction.  Union-find
//! with path halving and union by rank keeps the whole pass at O(N + E·α(N)).

use log::info;

use rn_core::{NodeId, NodeIdx};
use rn_network::RoadGraph;

// ── ComponentSet ──────────────────────────────────────────────────────────────

/// Partition of every node of a graph into disjoint components.
///
/// Components are ordered by descending size, ties by ascending smallest
/// member.  Members of each component are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSet {
    components: Vec<Vec<NodeId>>,
}

impl ComponentSet {
    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[NodeId]> + '_ {
        self.components.iter().map(Vec::as_slice)
    }

    pub fn get(&self, i: usize) -> Option<&[NodeId]> {
        self.components.get(i).map(Vec::as_slice)
    }

    /// Size of each component, in output order.
    pub fn sizes(&self) -> Vec<usize> {
        self.components.iter().map(Vec::len).collect()
    }

    /// The largest component (first in output order).
    pub fn largest(&self) -> Option<&[NodeId]> {
        self.get(0)
    }

    /// Position of the component containing `id`.
    pub fn component_of(&self, id: NodeId) -> Option<usize> {
        self.components
            .iter()
            .position(|c| c.binary_search(&id).is_ok())
    }

    pub fn into_inner(self) -> Vec<Vec<NodeId>> {
        self.components
    }
}

// ── Union-find ────────────────────────────────────────────────────────────────

struct UnionFind {
    parent: Vec<u32>,
    rank:   Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n as u32).collect(), rank: vec![0; n] }
    }

    /// Root of `x`, halving the path on the way up.
    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra as usize].cmp(&self.rank[rb as usize]) {
            std::cmp::Ordering::Less    => self.parent[ra as usize] = rb,
            std::cmp::Ordering::Greater => self.parent[rb as usize] = ra,
            std::cmp::Ordering::Equal   => {
                self.parent[rb as usize] = ra;
                self.rank[ra as usize] += 1;
            }
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Partition `graph` into connected components, ignoring edge direction.
///
/// Every node appears in exactly one component; a node without edges is a
/// singleton.  An empty graph yields an empty set.
pub fn components(graph: &RoadGraph) -> ComponentSet {
    let n = graph.node_count();
    let mut uf = UnionFind::new(n);

    for i in 0..n as u32 {
        for e in graph.out_edges(NodeIdx(i)) {
            uf.union(i, graph.edge_target(e).0);
        }
    }

    // Walk nodes in ascending id order so each component's members come out
    // sorted and its first member is its minimum.
    let mut slot_of_root = vec![u32::MAX; n];
    let mut groups: Vec<Vec<NodeId>> = Vec::new();
    for i in 0..n as u32 {
        let root = uf.find(i) as usize;
        if slot_of_root[root] == u32::MAX {
            slot_of_root[root] = groups.len() as u32;
            groups.push(Vec::new());
        }
        groups[slot_of_root[root] as usize].push(graph.node_id(NodeIdx(i)));
    }

    groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

    info!(
        "{} connected components, largest has {} nodes",
        groups.len(),
        groups.first().map_or(0, Vec::len)
    );
    ComponentSet { components: groups }
}
