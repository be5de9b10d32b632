//! OSM PBF loader — enabled with the `osm` Cargo feature.
//!
//! # Usage
//!
//! ```ignore
//! use std::path::Path;
//! use rn_core::NetworkConfig;
//! use rn_network::osm::load_from_pbf;
//!
//! let osm = load_from_pbf(Path::new("monrovia.osm.pbf"), NetworkConfig::default())?;
//! println!("{} nodes, {} named streets", osm.graph.node_count(), osm.streets.len());
//! ```
//!
//! # What is loaded
//!
//! Only drivable `highway=*` ways are included (see [`car_speed_mps`]).
//! `maxspeed` overrides the class default when it parses.  One-way roads add
//! a single directed edge (`oneway=-1` reverses it); two-way roads add both
//! directions.  Node ids are the OSM node ids.
//!
//! Every loaded way also becomes a street feature (its node positions in way
//! order), so the same file serves as the street locator's feature provider.
//!
//! # Memory note
//!
//! The loader buffers all OSM nodes in a `HashMap<i64, GeoPoint>` for the
//! first pass (ways reference nodes by id).  The map is dropped before the
//! graph is built.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{debug, info};
use osmpbf::{Element, ElementReader};

use rn_core::{GeoPoint, NetworkConfig, NodeId};

use crate::locator::{LineString, NamedFeature, StaticFeatures};
use crate::network::{EdgeRecord, RoadGraph, RoadGraphBuilder};
use crate::{NetworkError, NetworkResult};

/// Graph plus the named road geometries read from the same file.
pub struct OsmNetwork {
    pub graph:   RoadGraph,
    pub streets: StaticFeatures,
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Load a drivable road network from an OSM PBF file.
///
/// Parallel ways between the same node pair keep the shortest segment, so
/// the result never violates the graph's one-edge-per-pair rule.
///
/// # Errors
///
/// Returns [`NetworkError::Osm`] on parse errors, [`NetworkError::Io`] on
/// file errors.
pub fn load_from_pbf(path: &Path, config: NetworkConfig) -> NetworkResult<OsmNetwork> {
    // ── Phase 1: collect all OSM nodes + road ways in one sequential pass ──
    let reader = ElementReader::from_path(path)?;

    let mut all_nodes: HashMap<i64, GeoPoint> = HashMap::new();
    let mut road_ways: Vec<OsmWay> = Vec::new();

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::DenseNode(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::Way(w) => {
                // Collect tags eagerly so &str lifetimes don't escape the closure.
                let tags: Vec<(&str, &str)> = w.tags().collect();
                let tag = |key: &str| tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

                let Some(highway) = tag("highway") else { return };
                let Some(class_speed) = car_speed_mps(highway) else { return };

                road_ways.push(OsmWay {
                    refs:      w.refs().collect(),
                    speed_mps: tag("maxspeed").and_then(parse_maxspeed).unwrap_or(class_speed),
                    direction: direction(highway, tag("oneway")),
                    name:      tag("name").map(str::to_owned),
                    highway:   highway.to_owned(),
                });
            }
            _ => {}
        })
        .map_err(|e| NetworkError::Osm(e.to_string()))?;

    info!("OSM pass complete: {} nodes buffered, {} drivable ways", all_nodes.len(), road_ways.len());

    // ── Phase 2: keep only road-referenced nodes ──────────────────────────
    let road_node_ids: HashSet<i64> = road_ways
        .iter()
        .flat_map(|w| w.refs.iter().copied())
        .collect();

    let mut builder = RoadGraphBuilder::with_capacity(
        config,
        road_node_ids.len(),
        road_node_ids.len() * 2,
    );
    let mut positions: HashMap<i64, GeoPoint> = HashMap::with_capacity(road_node_ids.len());
    for osm_id in &road_node_ids {
        if let Some(&pos) = all_nodes.get(osm_id) {
            builder.add_node(osm_node_id(*osm_id), pos);
            positions.insert(*osm_id, pos);
        }
    }

    // Free the full node map — no longer needed.
    drop(all_nodes);
    drop(road_node_ids);

    // ── Phase 3: edges (shortest parallel segment wins) and features ──────
    let mut best: HashMap<(i64, i64), (f64, f64)> = HashMap::new();
    let mut order: Vec<(i64, i64)> = Vec::new();
    let mut streets = StaticFeatures::default();

    for way in road_ways {
        for window in way.refs.windows(2) {
            let (a, b) = (window[0], window[1]);
            let (Some(&pa), Some(&pb)) = (positions.get(&a), positions.get(&b)) else {
                continue;
            };
            let len_m = pa.distance_m(pb);

            let mut keep = |from: i64, to: i64| {
                best.entry((from, to))
                    .and_modify(|cur| {
                        if len_m < cur.0 {
                            *cur = (len_m, way.speed_mps);
                        }
                    })
                    .or_insert_with(|| {
                        order.push((from, to));
                        (len_m, way.speed_mps)
                    });
            };
            match way.direction {
                Direction::Both     => { keep(a, b); keep(b, a); }
                Direction::Forward  => keep(a, b),
                Direction::Backward => keep(b, a),
            }
        }

        let vertices: Vec<GeoPoint> = way.refs.iter().filter_map(|r| positions.get(r).copied()).collect();
        if !vertices.is_empty() {
            streets.push(NamedFeature::new(
                way.name,
                vec![("highway".to_owned(), way.highway)],
                LineString(vertices),
            ));
        }
    }

    debug!("{} directed segments after parallel-way reduction", order.len());
    for (from, to) in order {
        if let Some(&(length_m, speed_mps)) = best.get(&(from, to)) {
            builder.add_edge(
                EdgeRecord::new(osm_node_id(from), osm_node_id(to), length_m).with_speed(speed_mps),
            );
        }
    }

    let graph = builder.build()?;
    Ok(OsmNetwork { graph, streets })
}

// ── Internal types ────────────────────────────────────────────────────────────

struct OsmWay {
    refs:      Vec<i64>,
    speed_mps: f64,
    direction: Direction,
    name:      Option<String>,
    highway:   String,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Direction {
    Both,
    Forward,
    Backward,
}

/// OSM ids are positive; the cast keeps their numeric value.
fn osm_node_id(id: i64) -> NodeId {
    NodeId(id as u64)
}

// ── Tag helpers ───────────────────────────────────────────────────────────────

/// Return the assumed car speed (m/s) for a road class, or `None` if this
/// `highway` value is not drivable by car.
fn car_speed_mps(highway: &str) -> Option<f64> {
    match highway {
        "motorway" | "motorway_link"         => Some(29.1), // ~65 mph
        "trunk"    | "trunk_link"            => Some(24.6), // ~55 mph
        "primary"  | "primary_link"          => Some(20.1), // ~45 mph
        "secondary"| "secondary_link"        => Some(17.9), // ~40 mph
        "tertiary" | "tertiary_link"         => Some(13.4), // ~30 mph
        "residential" | "living_street"      => Some(8.9),  // ~20 mph
        "service"  | "unclassified"          => Some(6.7),  // ~15 mph
        // Explicitly non-car:
        "footway" | "path" | "cycleway" | "bridleway"
        | "pedestrian" | "steps" | "track"
        | "construction" | "proposed"        => None,
        // Unknown road type — assign a cautious default rather than dropping.
        _                                    => Some(8.9),
    }
}

/// Parse `maxspeed` values such as `"50"`, `"50 km/h"`, or `"30 mph"` into m/s.
fn parse_maxspeed(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let (number, factor) = if let Some(n) = raw.strip_suffix("mph") {
        (n, 0.447_04)
    } else if let Some(n) = raw.strip_suffix("km/h") {
        (n, 1.0 / 3.6)
    } else {
        (raw, 1.0 / 3.6)
    };
    let value: f64 = number.trim().parse().ok()?;
    (value > 0.0).then_some(value * factor)
}

/// Travel direction for car traffic.
///
/// Motorways and motorway links are implicitly one-way in OSM convention.
fn direction(highway: &str, oneway: Option<&str>) -> Direction {
    match oneway {
        Some("yes" | "1" | "true") => Direction::Forward,
        Some("-1" | "reverse")     => Direction::Backward,
        Some("no" | "0" | "false") => Direction::Both,
        _ if matches!(highway, "motorway" | "motorway_link") => Direction::Forward,
        _ => Direction::Both,
    }
}
