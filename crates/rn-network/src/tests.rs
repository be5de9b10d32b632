//! Unit tests for rn-network.
//!
//! All tests use hand-crafted networks so they run without any OSM file.

#[cfg(test)]
mod helpers {
    use rn_core::{GeoPoint, NodeId, SampleRng};

    use crate::{EdgeRecord, RoadGraph, RoadGraphBuilder};

    pub fn pos(id: u64) -> GeoPoint {
        match id {
            1 => GeoPoint::new(6.300, -10.800),
            2 => GeoPoint::new(6.300, -10.799),
            3 => GeoPoint::new(6.301, -10.799),
            4 => GeoPoint::new(6.301, -10.800),
            5 => GeoPoint::new(6.310, -10.780),
            _ => GeoPoint::new(6.305, -10.790),
        }
    }

    /// Square 1–2–3–4–1, every side 100 m in both directions.
    ///
    /// ```text
    ///   4 ── 3
    ///   │    │
    ///   1 ── 2
    /// ```
    pub fn square_builder() -> RoadGraphBuilder {
        let mut b = RoadGraphBuilder::new();
        for id in 1..=4 {
            b.add_node(NodeId(id), pos(id));
        }
        for (a, c) in [(1, 2), (2, 3), (3, 4), (4, 1)] {
            b.add_road(NodeId(a), NodeId(c), 100.0, Some(10.0));
        }
        b
    }

    pub fn square() -> RoadGraph {
        square_builder().build().unwrap()
    }

    /// Square plus isolated node 5.
    pub fn square_with_island() -> RoadGraph {
        let mut b = square_builder();
        b.add_node(NodeId(5), pos(5));
        b.build().unwrap()
    }

    /// `side × side` grid with pseudo-random lengths and speeds; node ids are
    /// `100 + row * side + col`.  Every fifth horizontal street is one-way.
    pub fn random_grid(side: u64, seed: u64) -> RoadGraph {
        let mut rng = SampleRng::new(seed);
        let mut b = RoadGraphBuilder::new();
        let id = |r: u64, c: u64| NodeId(100 + r * side + c);
        for r in 0..side {
            for c in 0..side {
                b.add_node(
                    id(r, c),
                    GeoPoint::new(6.30 + r as f64 * 0.001, -10.80 + c as f64 * 0.001),
                );
            }
        }
        for r in 0..side {
            for c in 0..side {
                if c + 1 < side {
                    let len = rng.gen_range(50.0..250.0);
                    let speed = rng.gen_range(5.0..20.0);
                    let e = EdgeRecord::new(id(r, c), id(r, c + 1), len).with_speed(speed);
                    b.add_edge(e);
                    if r % 5 != 0 {
                        b.add_edge(EdgeRecord { from: e.to, to: e.from, ..e });
                    }
                }
                if r + 1 < side {
                    let len = rng.gen_range(50.0..250.0);
                    b.add_road(id(r, c), id(r + 1, c), len, Some(rng.gen_range(5.0..20.0)));
                }
            }
        }
        b.build().unwrap()
    }
}

// ── Builder & graph structure ─────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use rn_core::{GeoPoint, NetworkConfig, NodeId};

    use crate::{EdgeRecord, NetworkError, RoadGraphBuilder};

    use super::helpers::{pos, square, square_builder};

    #[test]
    fn empty_build() {
        let g = RoadGraphBuilder::new().build().unwrap();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.is_empty());
        assert!(g.bounds().is_none());
    }

    #[test]
    fn square_dimensions() {
        let g = square();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 8);
        assert_eq!(g.node_ids(), &[NodeId(1), NodeId(2), NodeId(3), NodeId(4)]);
    }

    #[test]
    fn neighbors_sorted_by_target() {
        let g = square();
        let n: Vec<_> = g.neighbors(NodeId(1)).unwrap().map(|n| n.target).collect();
        assert_eq!(n, vec![NodeId(2), NodeId(4)]);
        let first = g.neighbors(NodeId(1)).unwrap().next().unwrap();
        assert_eq!(first.length_m, 100.0);
        assert_eq!(first.travel_time_s, 10.0);
    }

    #[test]
    fn unknown_node_queries() {
        let g = square();
        assert!(matches!(g.neighbors(NodeId(99)), Err(NetworkError::UnknownNode(NodeId(99)))));
        assert!(matches!(g.coordinates(NodeId(99)), Err(NetworkError::UnknownNode(_))));
        assert_eq!(g.coordinates(NodeId(3)).unwrap(), pos(3));
    }

    #[test]
    fn nodes_sorted_regardless_of_insert_order() {
        let mut b = RoadGraphBuilder::new();
        b.add_node(NodeId(30), GeoPoint::new(0.0, 0.0));
        b.add_node(NodeId(10), GeoPoint::new(0.0, 1.0));
        b.add_node(NodeId(20), GeoPoint::new(0.0, 2.0));
        let g = b.build().unwrap();
        assert_eq!(g.node_ids(), &[NodeId(10), NodeId(20), NodeId(30)]);
        assert_eq!(g.coordinates(NodeId(10)).unwrap(), GeoPoint::new(0.0, 1.0));
    }

    #[test]
    fn missing_endpoint_rejected() {
        let mut b = square_builder();
        b.add_edge(EdgeRecord::new(NodeId(1), NodeId(42), 10.0));
        assert!(matches!(b.build(), Err(NetworkError::MalformedGraph(_))));
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut b = square_builder();
        b.add_node(NodeId(2), pos(2));
        assert!(matches!(b.build(), Err(NetworkError::MalformedGraph(_))));
    }

    #[test]
    fn conflicting_duplicate_edge_rejected() {
        let mut b = square_builder();
        b.add_edge(EdgeRecord::new(NodeId(1), NodeId(2), 120.0).with_speed(10.0));
        let err = b.build().unwrap_err();
        assert!(matches!(err, NetworkError::MalformedGraph(ref m) if m.contains("1 -> 2")));
    }

    #[test]
    fn identical_duplicate_edge_collapses() {
        let mut b = square_builder();
        b.add_edge(EdgeRecord::new(NodeId(1), NodeId(2), 100.0).with_speed(10.0));
        let g = b.build().unwrap();
        assert_eq!(g.edge_count(), 8);
    }

    #[test]
    fn invalid_weights_rejected() {
        for bad in [
            EdgeRecord::new(NodeId(1), NodeId(3), -1.0),
            EdgeRecord::new(NodeId(1), NodeId(3), f64::NAN),
            EdgeRecord::new(NodeId(1), NodeId(3), 10.0).with_speed(0.0),
            EdgeRecord::new(NodeId(1), NodeId(3), 10.0).with_travel_time(-5.0),
        ] {
            let mut b = square_builder();
            b.add_edge(bad);
            assert!(matches!(b.build(), Err(NetworkError::MalformedGraph(_))), "{bad:?}");
        }
    }

    #[test]
    fn travel_time_precedence() {
        let cfg = NetworkConfig { fallback_speed_mps: 5.0, ..NetworkConfig::default() };
        let mut b = RoadGraphBuilder::with_config(cfg);
        for id in 1..=4 {
            b.add_node(NodeId(id), pos(id));
        }
        // supplied travel time beats speed
        b.add_edge(EdgeRecord::new(NodeId(1), NodeId(2), 100.0).with_speed(10.0).with_travel_time(3.0));
        // speed only
        b.add_edge(EdgeRecord::new(NodeId(2), NodeId(3), 100.0).with_speed(20.0));
        // neither: fallback
        b.add_edge(EdgeRecord::new(NodeId(3), NodeId(4), 100.0));
        let g = b.build().unwrap();

        let tt = |from: u64| g.neighbors(NodeId(from)).unwrap().next().unwrap().travel_time_s;
        assert_eq!(tt(1), 3.0);
        assert_eq!(tt(2), 5.0);
        assert_eq!(tt(3), 20.0);
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = NetworkConfig { fallback_speed_mps: -1.0, ..NetworkConfig::default() };
        let b = RoadGraphBuilder::with_config(cfg);
        assert!(matches!(b.build(), Err(NetworkError::Core(_))));
    }

    #[test]
    fn one_way_degree() {
        let mut b = RoadGraphBuilder::new();
        b.add_node(NodeId(1), pos(1));
        b.add_node(NodeId(2), pos(2));
        b.add_edge(EdgeRecord::new(NodeId(1), NodeId(2), 100.0));
        let g = b.build().unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.out_degree(g.require(NodeId(1)).unwrap()), 1);
        assert_eq!(g.out_degree(g.require(NodeId(2)).unwrap()), 0);
    }

    #[test]
    fn bounds_enclose_all_nodes() {
        let g = square();
        let bbox = g.bounds().unwrap();
        for &id in g.node_ids() {
            assert!(bbox.contains(g.coordinates(id).unwrap()));
        }
    }
}

// ── Path costs ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod path_cost {
    use rn_core::{Metric, NodeId};

    use crate::NetworkError;

    use super::helpers::square;

    #[test]
    fn sums_along_sequence() {
        let g = square();
        let path = [NodeId(1), NodeId(2), NodeId(3)];
        assert_eq!(g.path_cost(&path, Metric::Length).unwrap(), 200.0);
        assert_eq!(g.path_cost(&path, Metric::TravelTime).unwrap(), 20.0);
        assert_eq!(g.path_cost(&[NodeId(4)], Metric::Length).unwrap(), 0.0);
    }

    #[test]
    fn gap_is_reported() {
        let g = square();
        let err = g.path_cost(&[NodeId(1), NodeId(3)], Metric::Length).unwrap_err();
        assert!(matches!(err, NetworkError::NotAdjacent { from: NodeId(1), to: NodeId(3) }));
    }
}

// ── Spatial index ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use rn_core::{GeoPoint, NodeId};

    use crate::{NetworkError, RoadGraphBuilder, SpatialIndex};

    use super::helpers::{pos, square, square_builder};

    #[test]
    fn exact_position_zero_distance() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let (node, d) = idx.nearest_with_distance(pos(2)).unwrap();
        assert_eq!(node, NodeId(2));
        assert_eq!(d, 0.0);
    }

    #[test]
    fn nearest_between_nodes() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        // 20 % of the way from node 1 to node 2
        assert_eq!(idx.nearest(GeoPoint::new(6.300, -10.7998)).unwrap(), NodeId(1));
        // 80 % of the way
        assert_eq!(idx.nearest(GeoPoint::new(6.300, -10.7992)).unwrap(), NodeId(2));
    }

    #[test]
    fn distance_is_roughly_metres() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        // 0.001° of latitude ≈ 111 m north of node 3
        let (node, d) = idx.nearest_with_distance(GeoPoint::new(6.302, -10.799)).unwrap();
        assert_eq!(node, NodeId(3));
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }

    #[test]
    fn coincident_nodes_pick_lowest_id() {
        let mut b = square_builder();
        b.add_node(NodeId(0), pos(3));
        b.add_node(NodeId(7), pos(3));
        let g = b.build().unwrap();
        let idx = SpatialIndex::build(&g);
        assert_eq!(idx.nearest(pos(3)).unwrap(), NodeId(0));
    }

    #[test]
    fn empty_graph_fails() {
        let g = RoadGraphBuilder::new().build().unwrap();
        let idx = SpatialIndex::build(&g);
        assert!(idx.is_empty());
        assert!(matches!(idx.nearest(pos(1)), Err(NetworkError::EmptyGraph)));
    }

    #[test]
    fn k_nearest_order() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let near = idx.k_nearest(pos(1), 3).unwrap();
        assert_eq!(near.len(), 3);
        assert_eq!(near[0], NodeId(1));
        assert!(!near.contains(&NodeId(3)), "diagonal corner is farthest");
        assert!(idx.k_nearest(pos(1), 0).unwrap().is_empty());
    }

    #[test]
    fn k_nearest_coincident_nodes_by_id() {
        let mut b = square_builder();
        for id in (10..=40).rev() {
            b.add_node(NodeId(id), pos(3));
        }
        let g = b.build().unwrap();
        let idx = SpatialIndex::build(&g);

        let near = idx.k_nearest(pos(3), 5).unwrap();
        assert_eq!(near, vec![NodeId(3), NodeId(10), NodeId(11), NodeId(12), NodeId(13)]);
        assert_eq!(near[0], idx.nearest(pos(3)).unwrap());

        // Asking past the tied group reaches the next-closest corners.
        let all = idx.k_nearest(pos(3), 40).unwrap();
        assert_eq!(all.len(), 35);
        let mut tied = vec![NodeId(3)];
        tied.extend((10..=40).map(NodeId));
        assert_eq!(all[..32], tied[..]);
    }

    #[test]
    fn non_finite_query_is_an_error() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        for bad in [
            GeoPoint::new(f64::NAN, -10.8),
            GeoPoint::new(6.3, f64::INFINITY),
            GeoPoint::new(91.0, 0.0),
        ] {
            assert!(matches!(idx.nearest(bad), Err(NetworkError::InvalidCoordinate(_))));
            assert!(matches!(idx.k_nearest(bad, 3), Err(NetworkError::InvalidCoordinate(_))));
        }
    }
}

// ── Dijkstra routing ──────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use rn_core::{GeoPoint, Metric, NodeId};

    use crate::{DijkstraRouter, EdgeRecord, NetworkError, RoadGraphBuilder, Router};

    use super::helpers::{pos, random_grid, square, square_with_island};

    #[test]
    fn square_tie_breaks_on_lower_id() {
        let g = square();
        let r = DijkstraRouter.route(&g, NodeId(1), NodeId(3), Metric::Length).unwrap();
        assert_eq!(r.cost, 200.0);
        assert_eq!(r.nodes, vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(r.edges.len(), 2);
    }

    #[test]
    fn tie_break_is_stable_across_runs() {
        let g = square();
        let first = DijkstraRouter.route(&g, NodeId(3), NodeId(1), Metric::Length).unwrap();
        for _ in 0..10 {
            let again = DijkstraRouter.route(&g, NodeId(3), NodeId(1), Metric::Length).unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(first.nodes, vec![NodeId(3), NodeId(2), NodeId(1)]);
    }

    #[test]
    fn trivial_same_node() {
        let g = square();
        let r = DijkstraRouter.route(&g, NodeId(4), NodeId(4), Metric::TravelTime).unwrap();
        assert!(r.is_trivial());
        assert_eq!(r.nodes, vec![NodeId(4)]);
        assert_eq!(r.cost, 0.0);
    }

    #[test]
    fn unknown_node_is_not_no_path() {
        let g = square();
        let err = DijkstraRouter.route(&g, NodeId(1), NodeId(77), Metric::Length).unwrap_err();
        assert!(matches!(err, NetworkError::UnknownNode(NodeId(77))));
        let err = DijkstraRouter.route(&g, NodeId(77), NodeId(1), Metric::Length).unwrap_err();
        assert!(matches!(err, NetworkError::UnknownNode(NodeId(77))));
    }

    #[test]
    fn disconnected_island() {
        let g = square_with_island();
        let err = DijkstraRouter.route(&g, NodeId(1), NodeId(5), Metric::Length).unwrap_err();
        assert!(matches!(err, NetworkError::NoPathExists { from: NodeId(1), to: NodeId(5) }));
    }

    #[test]
    fn directed_one_way_blocks_return() {
        let mut b = RoadGraphBuilder::new();
        b.add_node(NodeId(1), pos(1));
        b.add_node(NodeId(2), pos(2));
        b.add_edge(EdgeRecord::new(NodeId(1), NodeId(2), 100.0));
        let g = b.build().unwrap();

        assert!(DijkstraRouter.route(&g, NodeId(1), NodeId(2), Metric::Length).is_ok());
        let back = DijkstraRouter.route(&g, NodeId(2), NodeId(1), Metric::Length);
        assert!(matches!(back, Err(NetworkError::NoPathExists { .. })));
    }

    /// Short slow road vs. long fast road: the two metrics disagree.
    ///
    /// ```text
    ///   1 ──(100 m, 2 m/s)── 2
    ///    \                  /
    ///     3 ──(300+300 m, 30 m/s)
    /// ```
    #[test]
    fn metric_changes_route() {
        let mut b = RoadGraphBuilder::new();
        b.add_node(NodeId(1), GeoPoint::new(6.300, -10.800));
        b.add_node(NodeId(2), GeoPoint::new(6.300, -10.799));
        b.add_node(NodeId(3), GeoPoint::new(6.297, -10.7995));
        b.add_road(NodeId(1), NodeId(2), 100.0, Some(2.0)); // 50 s
        b.add_road(NodeId(1), NodeId(3), 300.0, Some(30.0)); // 10 s
        b.add_road(NodeId(3), NodeId(2), 300.0, Some(30.0)); // 10 s
        let g = b.build().unwrap();

        let by_len = DijkstraRouter.route(&g, NodeId(1), NodeId(2), Metric::Length).unwrap();
        assert_eq!(by_len.nodes, vec![NodeId(1), NodeId(2)]);
        assert_eq!(by_len.cost, 100.0);

        let by_time = DijkstraRouter.route(&g, NodeId(1), NodeId(2), Metric::TravelTime).unwrap();
        assert_eq!(by_time.nodes, vec![NodeId(1), NodeId(3), NodeId(2)]);
        assert_eq!(by_time.cost, 20.0);

        // Distance reported for the time-optimal route is that route's length.
        assert_eq!(by_time.cost_under(&g, Metric::Length), 600.0);
        assert!((by_time.length_km(&g) - 0.6).abs() < 1e-12);
        assert!((by_time.travel_minutes(&g) - 20.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn cost_matches_independent_resum() {
        let g = random_grid(8, 11);
        let ids = g.node_ids().to_vec();
        for metric in [Metric::Length, Metric::TravelTime] {
            for &a in ids.iter().step_by(5) {
                for &c in ids.iter().step_by(7) {
                    let Ok(r) = DijkstraRouter.route(&g, a, c, metric) else { continue };
                    let resum = g.path_cost(&r.nodes, metric).unwrap();
                    assert!((r.cost - resum).abs() < 1e-9, "{a}->{c}: {} vs {resum}", r.cost);
                    assert_eq!(r.cost_under(&g, metric), r.cost);
                    assert!(r.cost >= 0.0);
                }
            }
        }
    }

    #[test]
    fn triangle_inequality() {
        let g = random_grid(6, 3);
        let ids = g.node_ids().to_vec();
        let cost = |a, c| DijkstraRouter.route(&g, a, c, Metric::Length).map(|r| r.cost);
        for &a in ids.iter().step_by(4) {
            for &b in ids.iter().step_by(5) {
                for &c in ids.iter().step_by(6) {
                    if let (Ok(ac), Ok(ab), Ok(bc)) = (cost(a, c), cost(a, b), cost(b, c)) {
                        assert!(ac <= ab + bc + 1e-9, "{a},{b},{c}: {ac} > {ab} + {bc}");
                    }
                }
            }
        }
    }
}

// ── Street locator ────────────────────────────────────────────────────────────

#[cfg(test)]
mod locator {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rn_core::{BoundingBox, GeoPoint, NetworkConfig, NodeId};

    use crate::{
        FeatureProvider, LineString, MultiLineString, NamedFeature, NetworkError, NetworkResult,
        RoadGraphBuilder, SpatialIndex, StaticFeatures, StreetCache, StreetLocator, TagFilter,
    };

    use super::helpers::{pos, square};

    fn road(name: &str, points: &[GeoPoint]) -> NamedFeature {
        NamedFeature::new(
            Some(name.to_owned()),
            vec![("highway".into(), "residential".into())],
            LineString(points.to_vec()),
        )
    }

    fn streets() -> StaticFeatures {
        StaticFeatures::new(vec![
            road("Broad Street", &[pos(2), pos(3)]),
            road("Broad Street", &[pos(4), pos(1)]),
            road("Gurley Street", &[GeoPoint::new(6.3009, -10.8001), pos(1)]),
            NamedFeature::new(
                Some("Mechlin Street".into()),
                vec![("highway".into(), "tertiary".into())],
                MultiLineString(vec![
                    LineString(vec![GeoPoint::new(6.3006, -10.7991)]),
                    LineString(vec![pos(1)]),
                ]),
            ),
            NamedFeature::new(None, vec![("highway".into(), "service".into())], LineString(vec![pos(1)])),
            NamedFeature::new(
                Some("Benson Shop".into()),
                vec![("shop".into(), "yes".into())],
                LineString(vec![pos(1)]),
            ),
            road("Far Away Road", &[GeoPoint::new(7.5, -9.0)]),
        ])
    }

    /// Counts provider calls.
    struct Counting {
        inner: StaticFeatures,
        calls: AtomicUsize,
    }

    impl FeatureProvider for Counting {
        fn features(&self, bbox: &BoundingBox, filter: &TagFilter) -> NetworkResult<Vec<NamedFeature>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.features(bbox, filter)
        }
    }

    #[test]
    fn first_geometry_first_vertex() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let loc = StreetLocator::new(streets(), &g, &NetworkConfig::default()).unwrap();
        assert_eq!(loc.locate(&idx, "Broad Street").unwrap(), NodeId(2));
        // First vertex sits near node 4.
        assert_eq!(loc.locate(&idx, "Gurley Street").unwrap(), NodeId(4));
    }

    #[test]
    fn multi_part_geometry_uses_first_part() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let loc = StreetLocator::new(streets(), &g, &NetworkConfig::default()).unwrap();
        assert_eq!(loc.locate(&idx, "Mechlin Street").unwrap(), NodeId(3));
    }

    #[test]
    fn repeated_name_hits_cache() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let provider = Counting { inner: streets(), calls: AtomicUsize::new(0) };
        let loc = StreetLocator::new(provider, &g, &NetworkConfig::default()).unwrap();

        let a = loc.locate(&idx, "Broad Street").unwrap();
        let b = loc.locate(&idx, "Broad Street").unwrap();
        assert_eq!(a, b);
        assert_eq!(loc.cache().len(), 1);
        assert_eq!(loc.provider_calls(), 1);

        // Exact-string keys: different case is a separate lookup (and a miss).
        assert!(loc.locate(&idx, "broad street").is_err());
        assert_eq!(loc.provider_calls(), 2);
    }

    impl StreetLocator<Counting> {
        fn provider_calls(&self) -> usize {
            self.provider().calls.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn not_found_carries_suggestions() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let loc = StreetLocator::new(streets(), &g, &NetworkConfig::default()).unwrap();
        match loc.locate(&idx, "Nowhere Lane") {
            Err(NetworkError::StreetNotFound { name, suggestions }) => {
                assert_eq!(name, "Nowhere Lane");
                // Unique, provider order, highway only, inside the graph extent.
                assert_eq!(suggestions, vec!["Broad Street", "Gurley Street", "Mechlin Street"]);
            }
            other => panic!("expected StreetNotFound, got {other:?}"),
        }
        assert!(loc.cache().is_empty());
    }

    #[test]
    fn outside_extent_is_not_found() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let loc = StreetLocator::new(streets(), &g, &NetworkConfig::default()).unwrap();
        assert!(matches!(
            loc.locate(&idx, "Far Away Road"),
            Err(NetworkError::StreetNotFound { .. })
        ));
    }

    #[test]
    fn non_finite_first_vertex_is_an_error() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let features = StaticFeatures::new(vec![road(
            "Bad Road",
            &[GeoPoint::new(f64::NAN, f64::NAN), pos(2)],
        )]);
        let loc = StreetLocator::new(features, &g, &NetworkConfig::default()).unwrap();
        assert!(matches!(
            loc.locate(&idx, "Bad Road"),
            Err(NetworkError::InvalidCoordinate(_))
        ));
        assert!(loc.cache().is_empty());
    }

    #[test]
    fn suggestions_are_capped() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let many: Vec<_> = (0..50).map(|i| road(&format!("Street {i}"), &[pos(1)])).collect();
        let loc = StreetLocator::new(StaticFeatures::new(many), &g, &NetworkConfig::default()).unwrap();
        match loc.locate(&idx, "Missing") {
            Err(NetworkError::StreetNotFound { suggestions, .. }) => {
                assert_eq!(suggestions.len(), 20);
                assert_eq!(suggestions[0], "Street 0");
            }
            other => panic!("expected StreetNotFound, got {other:?}"),
        }
    }

    #[test]
    fn empty_graph_has_no_extent() {
        let g = RoadGraphBuilder::new().build().unwrap();
        let res = StreetLocator::new(streets(), &g, &NetworkConfig::default());
        assert!(matches!(res, Err(NetworkError::EmptyGraph)));
    }

    #[test]
    fn shared_cache_across_threads() {
        let g = square();
        let idx = SpatialIndex::build(&g);
        let cache = Arc::new(StreetCache::new());
        let loc = StreetLocator::new(streets(), &g, &NetworkConfig::default())
            .unwrap()
            .with_cache(Arc::clone(&cache));

        let results: Vec<NodeId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| loc.locate(&idx, "Broad Street").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.iter().all(|&n| n == NodeId(2)));
        assert_eq!(cache.get("Broad Street"), Some(NodeId(2)));
    }

    #[test]
    fn cache_first_insert_wins() {
        let cache = StreetCache::new();
        assert_eq!(cache.insert("A", NodeId(1)), NodeId(1));
        assert_eq!(cache.insert("A", NodeId(2)), NodeId(1));
        assert_eq!(cache.get("A"), Some(NodeId(1)));
    }

    #[test]
    fn tag_filter_value() {
        let tags = vec![("highway".to_owned(), "primary".to_owned())];
        assert!(TagFilter::highway().matches(&tags));
        let primary = TagFilter { key: "highway".into(), value: Some("primary".into()) };
        assert!(primary.matches(&tags));
        let service = TagFilter { key: "highway".into(), value: Some("service".into()) };
        assert!(!service.matches(&tags));
    }
}

// ── CSV loaders ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};

    use rn_core::{GeoPoint, Metric, NetworkConfig, NodeId};

    use crate::{
        DijkstraRouter, NetworkError, Router, load_graph_csv, load_graph_readers,
        load_streets_reader,
    };

    const NODES: &str = "\
id,lat,lon
1,6.300,-10.800
2,6.300,-10.799
3,6.301,-10.799
";

    const EDGES: &str = "\
from,to,length_m,speed_mps,travel_time_s
1,2,110.0,11.0,
2,1,110.0,,
2,3,111.0,,37.0
";

    #[test]
    fn graph_from_readers() {
        let cfg = NetworkConfig { fallback_speed_mps: 5.5, ..NetworkConfig::default() };
        let g = load_graph_readers(Cursor::new(NODES), Cursor::new(EDGES), cfg).unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);

        let tt: Vec<f64> = [1, 2]
            .iter()
            .flat_map(|&id| g.neighbors(NodeId(id)).unwrap().map(|n| n.travel_time_s).collect::<Vec<_>>())
            .collect();
        // 1→2: 110/11, 2→1: 110/5.5 (fallback), 2→3: supplied
        assert_eq!(tt, vec![10.0, 20.0, 37.0]);

        let r = DijkstraRouter.route(&g, NodeId(1), NodeId(3), Metric::TravelTime).unwrap();
        assert_eq!(r.cost, 47.0);
    }

    #[test]
    fn bad_row_is_parse_error() {
        let edges = "from,to,length_m,speed_mps,travel_time_s\n1,2,abc,,\n";
        let res = load_graph_readers(Cursor::new(NODES), Cursor::new(edges), NetworkConfig::default());
        assert!(matches!(res, Err(NetworkError::Parse(_))));
    }

    #[test]
    fn non_finite_street_vertex_rejected() {
        let csv = "\
feature,name,highway,lat,lon
10,Bad Road,primary,NaN,NaN
10,Bad Road,primary,6.3000,-10.7990
";
        assert!(matches!(
            load_streets_reader(Cursor::new(csv)),
            Err(NetworkError::Parse(_))
        ));
    }

    #[test]
    fn missing_node_in_edges_is_malformed() {
        let edges = "from,to,length_m,speed_mps,travel_time_s\n1,9,10,,\n";
        let res = load_graph_readers(Cursor::new(NODES), Cursor::new(edges), NetworkConfig::default());
        assert!(matches!(res, Err(NetworkError::MalformedGraph(_))));
    }

    #[test]
    fn graph_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let nodes = dir.path().join("nodes.csv");
        let edges = dir.path().join("edges.csv");
        std::fs::File::create(&nodes).unwrap().write_all(NODES.as_bytes()).unwrap();
        std::fs::File::create(&edges).unwrap().write_all(EDGES.as_bytes()).unwrap();

        let g = load_graph_csv(&nodes, &edges, NetworkConfig::default()).unwrap();
        assert_eq!(g.node_count(), 3);

        let missing = dir.path().join("nope.csv");
        assert!(matches!(
            load_graph_csv(&missing, &edges, NetworkConfig::default()),
            Err(NetworkError::Io(_))
        ));
    }

    #[test]
    fn streets_grouped_by_feature() {
        let csv = "\
feature,name,highway,lat,lon
10,Broad Street,primary,6.3010,-10.7990
20,,service,6.3000,-10.8000
10,Broad Street,primary,6.3000,-10.7990
30,Clay Street,residential,6.3005,-10.7995
";
        let streets = load_streets_reader(Cursor::new(csv)).unwrap();
        assert_eq!(streets.len(), 3);

        use crate::{FeatureProvider, TagFilter};
        let bbox = rn_core::BoundingBox::from_point(GeoPoint::new(6.3010, -10.7990));
        let hits = streets.features(&bbox, &TagFilter::highway()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name.as_deref(), Some("Broad Street"));
        let verts: Vec<_> = hits[0].geometry.vertices().collect();
        assert_eq!(verts, vec![GeoPoint::new(6.3010, -10.7990), GeoPoint::new(6.3000, -10.7990)]);
    }
}
