//! Nearest-node spatial index.
//!
//! An R-tree (via `rstar`) over node positions projected onto a local plane:
//! equirectangular about the graph's mid-latitude, in metres.  Within a city
//! the projection error is far below the spacing between intersections, so
//! planar distance ranks candidates the same way great-circle distance would.
//!
//! The index is derived from one [`RoadGraph`] and never updated.  Build a new
//! one for a new graph.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use rn_core::geo::EARTH_RADIUS_M;
use rn_core::{GeoPoint, NodeId, NodeIdx};

use crate::network::RoadGraph;
use crate::{NetworkError, NetworkResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a projected `[y, x]` point in metres with the
/// node it belongs to.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared planar distance in m².
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dy = self.point[0] - point[0];
        let dx = self.point[1] - point[1];
        dy * dy + dx * dx
    }
}

// ── Projection ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct Projection {
    cos_ref_lat: f64,
}

impl Projection {
    fn around(ref_lat: f64) -> Self {
        Self { cos_ref_lat: ref_lat.to_radians().cos() }
    }

    #[inline]
    fn project(self, p: GeoPoint) -> [f64; 2] {
        [
            p.lat.to_radians() * EARTH_RADIUS_M,
            p.lon.to_radians() * EARTH_RADIUS_M * self.cos_ref_lat,
        ]
    }
}

// ── SpatialIndex ──────────────────────────────────────────────────────────────

/// Immutable nearest-node lookup over a [`RoadGraph`].
pub struct SpatialIndex {
    tree:       RTree<NodeEntry>,
    projection: Projection,
}

impl SpatialIndex {
    /// Bulk-load the R-tree from every node of `graph`.  O(N log N).
    ///
    /// An empty graph yields an empty index whose queries fail with
    /// [`NetworkError::EmptyGraph`].
    pub fn build(graph: &RoadGraph) -> Self {
        let ref_lat = graph.bounds().map(|b| b.center().lat).unwrap_or(0.0);
        let projection = Projection::around(ref_lat);

        let entries: Vec<NodeEntry> = graph
            .node_ids()
            .iter()
            .enumerate()
            .map(|(i, &id)| NodeEntry {
                point: projection.project(graph.node_pos(NodeIdx(i as u32))),
                id,
            })
            .collect();

        Self { tree: RTree::bulk_load(entries), projection }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// The node nearest to `pos`.
    pub fn nearest(&self, pos: GeoPoint) -> NetworkResult<NodeId> {
        self.nearest_with_distance(pos).map(|(id, _)| id)
    }

    /// The node nearest to `pos` and its planar distance in metres.
    ///
    /// Nodes at exactly equal distance resolve to the lowest `NodeId`, so the
    /// answer never depends on the tree's internal layout.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidCoordinate`] for a non-finite or out-of-range
    /// `pos`, [`NetworkError::EmptyGraph`] for an empty index.
    pub fn nearest_with_distance(&self, pos: GeoPoint) -> NetworkResult<(NodeId, f64)> {
        let query = self.query_point(pos)?;
        let mut candidates = self
            .tree
            .nearest_neighbor_iter(&query)
            .map(|e| (e.id, e.distance_2(&query)));
        let (first, best_d2) = candidates.next().ok_or(NetworkError::EmptyGraph)?;

        let mut best = first;
        for (id, d2) in candidates {
            if d2 > best_d2 {
                break;
            }
            best = best.min(id);
        }
        Ok((best, best_d2.sqrt()))
    }

    /// Up to `k` nodes nearest to `pos`, by ascending distance and then
    /// ascending `NodeId`.  The first entry always agrees with [`nearest`](Self::nearest).
    ///
    /// An empty index yields an empty list.
    pub fn k_nearest(&self, pos: GeoPoint, k: usize) -> NetworkResult<Vec<NodeId>> {
        let query = self.query_point(pos)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        // Keep everything tied with the k-th distance so the id order below
        // sees every candidate for the last slots.
        let mut found: Vec<(f64, NodeId)> = Vec::with_capacity(k);
        for e in self.tree.nearest_neighbor_iter(&query) {
            let d2 = e.distance_2(&query);
            if found.len() >= k && d2 > found[k - 1].0 {
                break;
            }
            found.push((d2, e.id));
        }

        found.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        found.truncate(k);
        Ok(found.into_iter().map(|(_, id)| id).collect())
    }

    fn query_point(&self, pos: GeoPoint) -> NetworkResult<[f64; 2]> {
        if !pos.is_valid() {
            return Err(NetworkError::InvalidCoordinate(pos));
        }
        Ok(self.projection.project(pos))
    }
}
