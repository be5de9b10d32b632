//! CSV loaders for node/edge lists and street geometries.
//!
//! # CSV formats
//!
//! `nodes.csv` — one row per node:
//!
//! ```csv
//! id,lat,lon
//! 1,6.3000,-10.7972
//! 2,6.3106,-10.8040
//! ```
//!
//! `edges.csv` — one row per **directed** edge.  `speed_mps` and
//! `travel_time_s` may be left empty:
//!
//! ```csv
//! from,to,length_m,speed_mps,travel_time_s
//! 1,2,1320.5,13.4,
//! 2,1,1320.5,,98.5
//! ```
//!
//! `streets.csv` — street geometries, one row per vertex in drawing order.
//! Rows sharing a `feature` value form one polyline; features keep the order
//! in which their first row appears.  An empty `name` means an unnamed road.
//!
//! ```csv
//! feature,name,highway,lat,lon
//! 10,Broad Street,primary,6.3150,-10.8000
//! 10,Broad Street,primary,6.3140,-10.7990
//! ```

use std::io::Read;
use std::path::Path;

use log::info;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use rn_core::{GeoPoint, NetworkConfig, NodeId};

use crate::locator::{LineString, NamedFeature, StaticFeatures};
use crate::network::{EdgeRecord, RoadGraph, RoadGraphBuilder};
use crate::{NetworkError, NetworkResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRow {
    id:  u64,
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct EdgeRow {
    from:     u64,
    to:       u64,
    length_m: f64,
    #[serde(default)]
    speed_mps: Option<f64>,
    #[serde(default)]
    travel_time_s: Option<f64>,
}

#[derive(Deserialize)]
struct StreetRow {
    feature: u64,
    #[serde(default)]
    name:    Option<String>,
    highway: String,
    lat:     f64,
    lon:     f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and build a graph from `nodes.csv` and `edges.csv` files.
pub fn load_graph_csv(
    nodes: &Path,
    edges: &Path,
    config: NetworkConfig,
) -> NetworkResult<RoadGraph> {
    let nodes_file = std::fs::File::open(nodes)?;
    let edges_file = std::fs::File::open(edges)?;
    info!("loading graph from {} and {}", nodes.display(), edges.display());
    load_graph_readers(nodes_file, edges_file, config)
}

/// Like [`load_graph_csv`] but accepts any `Read` sources.
///
/// Useful for testing (pass a `std::io::Cursor`).
pub fn load_graph_readers<N: Read, E: Read>(
    nodes: N,
    edges: E,
    config: NetworkConfig,
) -> NetworkResult<RoadGraph> {
    let mut builder = RoadGraphBuilder::with_config(config);

    for row in csv_reader(nodes).deserialize::<NodeRow>() {
        let row = row.map_err(parse_error)?;
        builder.add_node(NodeId(row.id), GeoPoint::new(row.lat, row.lon));
    }

    for row in csv_reader(edges).deserialize::<EdgeRow>() {
        let row = row.map_err(parse_error)?;
        builder.add_edge(EdgeRecord {
            from:          NodeId(row.from),
            to:            NodeId(row.to),
            length_m:      row.length_m,
            speed_mps:     row.speed_mps,
            travel_time_s: row.travel_time_s,
        });
    }

    builder.build()
}

/// Load street geometries from a `streets.csv` file.
pub fn load_streets_csv(path: &Path) -> NetworkResult<StaticFeatures> {
    let file = std::fs::File::open(path)?;
    load_streets_reader(file)
}

/// Like [`load_streets_csv`] but accepts any `Read` source.
pub fn load_streets_reader<R: Read>(reader: R) -> NetworkResult<StaticFeatures> {
    struct Pending {
        name:     Option<String>,
        highway:  String,
        vertices: Vec<GeoPoint>,
    }

    let mut order: Vec<u64> = Vec::new();
    let mut by_feature: FxHashMap<u64, Pending> = FxHashMap::default();

    for row in csv_reader(reader).deserialize::<StreetRow>() {
        let row = row.map_err(parse_error)?;
        let vertex = GeoPoint::new(row.lat, row.lon);
        if !vertex.is_valid() {
            return Err(NetworkError::Parse(format!(
                "street feature {} has invalid coordinate {vertex}",
                row.feature
            )));
        }
        let pending = by_feature.entry(row.feature).or_insert_with(|| {
            order.push(row.feature);
            Pending {
                name:     row.name.filter(|n| !n.is_empty()),
                highway:  row.highway,
                vertices: Vec::new(),
            }
        });
        pending.vertices.push(vertex);
    }

    let mut features = StaticFeatures::default();
    for id in order {
        if let Some(p) = by_feature.remove(&id) {
            features.push(NamedFeature::new(
                p.name,
                vec![("highway".to_owned(), p.highway)],
                LineString(p.vertices),
            ));
        }
    }
    info!("loaded {} street features", features.len());
    Ok(features)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn parse_error(e: csv::Error) -> NetworkError {
    NetworkError::Parse(e.to_string())
}
