//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! Callers route through the [`Router`] trait so another search (A*,
//! contraction hierarchies) can replace [`DijkstraRouter`] without touching
//! the CLI or the street front-end.
//!
//! # Determinism
//!
//! When two frontier nodes carry the same tentative cost, the one with the
//! lower `NodeId` is expanded first, and a node's predecessor is only
//! replaced by a strictly cheaper path.  Identical input therefore always
//! yields the identical node sequence.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;

use rn_core::{EdgeId, Metric, NodeId, NodeIdx};

use crate::network::RoadGraph;
use crate::{NetworkError, NetworkResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Nodes visited in order, source first.  Never empty.
    pub nodes: Vec<NodeId>,
    /// Edges traversed in order; `nodes.len() - 1` of them.
    pub edges: Vec<EdgeId>,
    /// Metric the route was optimised for.
    pub metric: Metric,
    /// Total cost under `metric` (metres or seconds).
    pub cost: f64,
}

impl Route {
    fn trivial(node: NodeId, metric: Metric) -> Self {
        Self { nodes: vec![node], edges: vec![], metric, cost: 0.0 }
    }

    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    /// Re-sum the edges of this same route under `metric`.
    ///
    /// This is how a caller optimising travel time also reports distance: the
    /// second figure describes the path actually chosen rather than a second,
    /// independently searched one.  `graph` must be the graph that produced
    /// the route.
    pub fn cost_under(&self, graph: &RoadGraph, metric: Metric) -> f64 {
        self.edges
            .iter()
            .fold(0.0, |acc, &e| acc + graph.edge_weight(e, metric))
    }

    /// Route length in kilometres.
    pub fn length_km(&self, graph: &RoadGraph) -> f64 {
        self.cost_under(graph, Metric::Length) / 1_000.0
    }

    /// Free-flow driving time in minutes.
    pub fn travel_minutes(&self, graph: &RoadGraph) -> f64 {
        self.cost_under(graph, Metric::TravelTime) / 60.0
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so one router can serve concurrent
/// queries against a shared graph.
pub trait Router: Send + Sync {
    /// Compute the cheapest route from `from` to `to` under `metric`.
    ///
    /// `from == to` yields a one-node route of cost zero.
    ///
    /// # Errors
    ///
    /// [`NetworkError::UnknownNode`] if either id is absent from `graph`;
    /// [`NetworkError::NoPathExists`] if `to` is unreachable from `from`.
    fn route(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
        metric: Metric,
    ) -> NetworkResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Single-pair Dijkstra over the CSR graph.
///
/// Edge weights must be non-negative; [`RoadGraphBuilder`](crate::RoadGraphBuilder)
/// guarantees it.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        graph: &RoadGraph,
        from: NodeId,
        to: NodeId,
        metric: Metric,
    ) -> NetworkResult<Route> {
        dijkstra(graph, from, to, metric)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

/// Heap entry ordered so that `BinaryHeap` (a max-heap) pops the lowest cost
/// first and, among equal costs, the lowest node index.
#[derive(Copy, Clone, PartialEq)]
struct Frontier {
    cost: f64,
    node: NodeIdx,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn dijkstra(graph: &RoadGraph, from: NodeId, to: NodeId, metric: Metric) -> NetworkResult<Route> {
    let source = graph.require(from)?;
    let target = graph.require(to)?;

    if source == target {
        return Ok(Route::trivial(from, metric));
    }

    let n = graph.node_count();
    // dist[v] = best known cost to reach v.
    let mut dist      = vec![f64::INFINITY; n];
    // prev_edge[v] = EdgeId that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[source.index()] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(Frontier { cost: 0.0, node: source });

    let mut settled = 0usize;
    while let Some(Frontier { cost, node }) = heap.pop() {
        if node == target {
            debug!("route {from} -> {to} ({metric}): cost {cost:.3}, {settled} nodes settled");
            return Ok(reconstruct(graph, &prev_edge, target, metric, cost));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }
        settled += 1;

        for edge in graph.out_edges(node) {
            let next = graph.edge_target(edge);
            let new_cost = cost + graph.edge_weight(edge, metric);

            if new_cost < dist[next.index()] {
                dist[next.index()] = new_cost;
                prev_edge[next.index()] = edge;
                heap.push(Frontier { cost: new_cost, node: next });
            }
        }
    }

    debug!("route {from} -> {to} ({metric}): unreachable after {settled} nodes settled");
    Err(NetworkError::NoPathExists { from, to })
}

fn reconstruct(
    graph: &RoadGraph,
    prev_edge: &[EdgeId],
    target: NodeIdx,
    metric: Metric,
    cost: f64,
) -> Route {
    let mut edges = Vec::new();
    let mut cur = target;
    loop {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = graph.edge_source(e);
    }
    edges.reverse();

    let mut nodes = Vec::with_capacity(edges.len() + 1);
    nodes.push(graph.node_id(cur));
    nodes.extend(edges.iter().map(|&e| graph.node_id(graph.edge_target(e))));

    Route { nodes, edges, metric, cost }
}
