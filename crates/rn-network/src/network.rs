//! Road graph store and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeIdx n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Edge arrays are sorted by `(source, target)` and indexed by `EdgeId`, so a
//! node's neighbours come out in ascending `NodeId` order and iteration is a
//! contiguous memory scan.
//!
//! Nodes are stored sorted by their external [`NodeId`]; a hash map resolves
//! an external id to its dense [`NodeIdx`].  Algorithms work on `NodeIdx`
//! internally and translate back only at their public boundary.

use log::{debug, info, trace};
use rustc_hash::FxHashMap;

use rn_core::{BoundingBox, EdgeId, GeoPoint, Metric, NetworkConfig, NodeId, NodeIdx};

use crate::{NetworkError, NetworkResult};

// ── Input records ─────────────────────────────────────────────────────────────

/// One node as delivered by a data source: `(id, lat, lon)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub id:  NodeId,
    pub pos: GeoPoint,
}

/// One directed edge as delivered by a data source.
///
/// `speed_mps` and `travel_time_s` are optional; see
/// [`RoadGraphBuilder::build`] for how travel time is derived.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    pub from:          NodeId,
    pub to:            NodeId,
    pub length_m:      f64,
    pub speed_mps:     Option<f64>,
    pub travel_time_s: Option<f64>,
}

impl EdgeRecord {
    pub fn new(from: NodeId, to: NodeId, length_m: f64) -> Self {
        Self { from, to, length_m, speed_mps: None, travel_time_s: None }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn with_travel_time(mut self, travel_time_s: f64) -> Self {
        self.travel_time_s = Some(travel_time_s);
        self
    }
}

/// One outgoing edge as seen from its source node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbor {
    pub target:        NodeId,
    pub length_m:      f64,
    pub travel_time_s: f64,
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Immutable directed road graph in CSR format.
///
/// There is no way to mutate a `RoadGraph` after [`RoadGraphBuilder::build`];
/// share it across threads by reference or `Arc` without locking.
#[derive(Debug)]
pub struct RoadGraph {
    // ── Node data (indexed by NodeIdx) ────────────────────────────────────
    node_ids:  Vec<NodeId>,
    node_pos:  Vec<GeoPoint>,
    id_lookup: FxHashMap<NodeId, NodeIdx>,
    bounds:    Option<BoundingBox>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// Length = `node_count + 1`.
    node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    /// Redundant with CSR but needed to walk a predecessor chain backwards.
    edge_from:     Vec<NodeIdx>,
    edge_to:       Vec<NodeIdx>,
    edge_length_m: Vec<f64>,
    edge_travel_s: Vec<f64>,
}

impl RoadGraph {
    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    /// Every node id, ascending.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    /// Smallest lat/lon box containing every node; `None` for an empty graph.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_lookup.contains_key(&id)
    }

    // ── Id translation ────────────────────────────────────────────────────

    #[inline]
    pub fn index_of(&self, id: NodeId) -> Option<NodeIdx> {
        self.id_lookup.get(&id).copied()
    }

    /// Like [`index_of`](Self::index_of) but fails with
    /// [`NetworkError::UnknownNode`].
    #[inline]
    pub fn require(&self, id: NodeId) -> NetworkResult<NodeIdx> {
        self.index_of(id).ok_or(NetworkError::UnknownNode(id))
    }

    #[inline]
    pub fn node_id(&self, idx: NodeIdx) -> NodeId {
        self.node_ids[idx.index()]
    }

    #[inline]
    pub fn node_pos(&self, idx: NodeIdx) -> GeoPoint {
        self.node_pos[idx.index()]
    }

    // ── Public node queries ───────────────────────────────────────────────

    /// Position of node `id`.
    pub fn coordinates(&self, id: NodeId) -> NetworkResult<GeoPoint> {
        self.require(id).map(|idx| self.node_pos(idx))
    }

    /// Outgoing edges of `id`, ordered by ascending target id.
    pub fn neighbors(&self, id: NodeId) -> NetworkResult<impl Iterator<Item = Neighbor> + '_> {
        let idx = self.require(id)?;
        Ok(self.out_edges(idx).map(move |e| Neighbor {
            target:        self.node_id(self.edge_target(e)),
            length_m:      self.edge_length_m[e.index()],
            travel_time_s: self.edge_travel_s[e.index()],
        }))
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    ///
    /// This is a contiguous index range — no heap allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeIdx) -> impl Iterator<Item = EdgeId> + use<> {
        let start = self.node_out_start[node.index()];
        let end   = self.node_out_start[node.index() + 1];
        (start..end).map(EdgeId)
    }

    #[inline]
    pub fn out_degree(&self, node: NodeIdx) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    #[inline]
    pub fn edge_source(&self, edge: EdgeId) -> NodeIdx {
        self.edge_from[edge.index()]
    }

    #[inline]
    pub fn edge_target(&self, edge: EdgeId) -> NodeIdx {
        self.edge_to[edge.index()]
    }

    /// Cost of `edge` under `metric` (metres or seconds).
    #[inline]
    pub fn edge_weight(&self, edge: EdgeId, metric: Metric) -> f64 {
        match metric {
            Metric::Length     => self.edge_length_m[edge.index()],
            Metric::TravelTime => self.edge_travel_s[edge.index()],
        }
    }

    /// The edge `from → to`, if one exists.  O(log degree).
    pub fn edge_between(&self, from: NodeIdx, to: NodeIdx) -> Option<EdgeId> {
        let start = self.node_out_start[from.index()] as usize;
        let end   = self.node_out_start[from.index() + 1] as usize;
        self.edge_to[start..end]
            .binary_search(&to)
            .ok()
            .map(|offset| EdgeId((start + offset) as u32))
    }

    /// Re-sum `metric` along an explicit node sequence.
    ///
    /// Each consecutive pair must be joined by an edge in the travel
    /// direction.  A single-node path costs zero.
    pub fn path_cost(&self, path: &[NodeId], metric: Metric) -> NetworkResult<f64> {
        let mut idxs = Vec::with_capacity(path.len());
        for &id in path {
            idxs.push(self.require(id)?);
        }
        let mut total = 0.0;
        for pair in idxs.windows(2) {
            let edge = self.edge_between(pair[0], pair[1]).ok_or(NetworkError::NotAdjacent {
                from: self.node_id(pair[0]),
                to:   self.node_id(pair[1]),
            })?;
            total += self.edge_weight(edge, metric);
        }
        Ok(total)
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts nodes and directed edges in any order.  `build()`
/// validates them, sorts nodes by id and edges by `(source, target)`, and
/// constructs the CSR arrays.
///
/// # Example
///
/// ```
/// use rn_core::{GeoPoint, NodeId};
/// use rn_network::RoadGraphBuilder;
///
/// let mut b = RoadGraphBuilder::new();
/// b.add_node(NodeId(1), GeoPoint::new(6.300, -10.797));
/// b.add_node(NodeId(2), GeoPoint::new(6.310, -10.804));
/// b.add_road(NodeId(1), NodeId(2), 1_300.0, Some(13.4));
/// let graph = b.build().unwrap();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // bidirectional
/// ```
pub struct RoadGraphBuilder {
    config:    NetworkConfig,
    nodes:     Vec<NodeRecord>,
    raw_edges: Vec<EdgeRecord>,
}

/// Edge after endpoint resolution and travel-time derivation.
struct ResolvedEdge {
    from:      NodeIdx,
    to:        NodeIdx,
    length_m:  f64,
    travel_s:  f64,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::with_config(NetworkConfig::default())
    }

    pub fn with_config(config: NetworkConfig) -> Self {
        Self { config, nodes: Vec::new(), raw_edges: Vec::new() }
    }

    /// Pre-allocate for the expected number of nodes and edges to reduce
    /// reallocations when bulk-loading from OSM or CSV.
    pub fn with_capacity(config: NetworkConfig, nodes: usize, edges: usize) -> Self {
        Self {
            config,
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    pub fn add_node(&mut self, id: NodeId, pos: GeoPoint) {
        self.nodes.push(NodeRecord { id, pos });
    }

    /// Add a **directed** edge.
    pub fn add_edge(&mut self, edge: EdgeRecord) {
        self.raw_edges.push(edge);
    }

    /// Convenience: add edges in **both directions** for a two-way road.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f64, speed_mps: Option<f64>) {
        let forward = EdgeRecord { from: a, to: b, length_m, speed_mps, travel_time_s: None };
        self.add_edge(forward);
        self.add_edge(EdgeRecord { from: b, to: a, ..forward });
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadGraph`].
    ///
    /// Travel time per edge is the supplied `travel_time_s`, else
    /// `length_m / speed_mps`, else `length_m / config.fallback_speed_mps`.
    /// Edges repeated with identical weights collapse into one.
    ///
    /// # Errors
    ///
    /// [`NetworkError::MalformedGraph`] on a duplicate node id, an invalid
    /// coordinate, an edge endpoint missing from the node set, a negative or
    /// non-finite length/speed/travel time, or a repeated `(from, to)` pair
    /// whose weights differ.
    ///
    /// Time complexity: O(N log N + E log E).
    pub fn build(self) -> NetworkResult<RoadGraph> {
        self.config.validate()?;

        // ── Nodes: sort by id, reject duplicates ──────────────────────────
        let mut nodes = self.nodes;
        nodes.sort_by_key(|n| n.id);
        for pair in nodes.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(malformed(format!("duplicate node id {}", pair[0].id)));
            }
        }
        if let Some(bad) = nodes.iter().find(|n| !n.pos.is_valid()) {
            return Err(malformed(format!("node {} has invalid coordinate {}", bad.id, bad.pos)));
        }
        let node_count = nodes.len();
        if u32::try_from(node_count).is_err() {
            return Err(malformed(format!("{node_count} nodes exceed the u32 index space")));
        }

        let mut id_lookup: FxHashMap<NodeId, NodeIdx> = FxHashMap::default();
        id_lookup.reserve(node_count);
        for (i, n) in nodes.iter().enumerate() {
            id_lookup.insert(n.id, NodeIdx(i as u32));
        }

        // ── Edges: resolve endpoints, derive travel time ──────────────────
        let mut resolved = Vec::with_capacity(self.raw_edges.len());
        for e in &self.raw_edges {
            resolved.push(resolve_edge(e, &id_lookup, self.config.fallback_speed_mps)?);
        }

        // Stable sort keeps duplicate resolution independent of sort internals.
        resolved.sort_by_key(|e| (e.from, e.to));
        let mut deduped: Vec<ResolvedEdge> = Vec::with_capacity(resolved.len());
        let mut collapsed = 0usize;
        for e in resolved {
            if let Some(last) = deduped.last() {
                if last.from == e.from && last.to == e.to {
                    if last.length_m == e.length_m && last.travel_s == e.travel_s {
                        collapsed += 1;
                        continue;
                    }
                    return Err(malformed(format!(
                        "edge {} -> {} given twice with different weights",
                        nodes[e.from.index()].id,
                        nodes[e.to.index()].id,
                    )));
                }
            }
            deduped.push(e);
        }
        if collapsed > 0 {
            debug!("collapsed {collapsed} identical duplicate edges");
        }
        if u32::try_from(deduped.len()).is_err() {
            return Err(malformed(format!("{} edges exceed the u32 index space", deduped.len())));
        }
        let edge_count = deduped.len();

        // ── CSR arrays ────────────────────────────────────────────────────
        let edge_from:     Vec<NodeIdx> = deduped.iter().map(|e| e.from).collect();
        let edge_to:       Vec<NodeIdx> = deduped.iter().map(|e| e.to).collect();
        let edge_length_m: Vec<f64>     = deduped.iter().map(|e| e.length_m).collect();
        let edge_travel_s: Vec<f64>     = deduped.iter().map(|e| e.travel_s).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &deduped {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let node_ids: Vec<NodeId>   = nodes.iter().map(|n| n.id).collect();
        let node_pos: Vec<GeoPoint> = nodes.iter().map(|n| n.pos).collect();
        let bounds = BoundingBox::enclosing(node_pos.iter().copied());

        info!("road graph built: {node_count} nodes, {edge_count} directed edges");

        Ok(RoadGraph {
            node_ids,
            node_pos,
            id_lookup,
            bounds,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_travel_s,
        })
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn malformed(msg: String) -> NetworkError {
    NetworkError::MalformedGraph(msg)
}

fn resolve_edge(
    e: &EdgeRecord,
    id_lookup: &FxHashMap<NodeId, NodeIdx>,
    fallback_speed_mps: f64,
) -> NetworkResult<ResolvedEdge> {
    let endpoint = |id: NodeId| {
        id_lookup.get(&id).copied().ok_or_else(|| {
            malformed(format!("edge {} -> {} references missing node {id}", e.from, e.to))
        })
    };
    let from = endpoint(e.from)?;
    let to   = endpoint(e.to)?;

    if !(e.length_m.is_finite() && e.length_m >= 0.0) {
        return Err(malformed(format!(
            "edge {} -> {} has invalid length {}",
            e.from, e.to, e.length_m
        )));
    }

    let travel_s = match (e.travel_time_s, e.speed_mps) {
        (Some(t), _) => {
            if !(t.is_finite() && t >= 0.0) {
                return Err(malformed(format!(
                    "edge {} -> {} has invalid travel time {t}",
                    e.from, e.to
                )));
            }
            t
        }
        (None, Some(speed)) => {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(malformed(format!(
                    "edge {} -> {} has invalid speed {speed}",
                    e.from, e.to
                )));
            }
            e.length_m / speed
        }
        (None, None) => {
            trace!("edge {} -> {} has no speed, assuming {fallback_speed_mps} m/s", e.from, e.to);
            e.length_m / fallback_speed_mps
        }
    };

    Ok(ResolvedEdge { from, to, length_m: e.length_m, travel_s })
}
