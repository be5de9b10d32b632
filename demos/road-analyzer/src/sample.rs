//! Built-in sample network, used when no `--nodes`/`--edges` are given.
//!
//! Eight intersections loosely placed on central Monrovia, Liberia, plus a
//! handful of named streets so `route` works by name out of the box.  Node 8
//! (a ferry landing) has no roads and forms its own component.

use rn_core::{GeoPoint, NetworkConfig, NodeId};
use rn_network::{
    EdgeRecord, LineString, NamedFeature, NetworkResult, RoadGraph, RoadGraphBuilder, StaticFeatures,
};

const NODES: [(u64, f64, f64); 8] = [
    (1, 6.3170, -10.8080), // Mamba Point
    (2, 6.3130, -10.8020), // Broad St / Randall St
    (3, 6.3100, -10.7990), // Broad St / Benson St
    (4, 6.3060, -10.7950), // Capitol junction
    (5, 6.3000, -10.7850), // Sinkor
    (6, 6.3150, -10.7990), // Water St / Gurley St
    (7, 6.3190, -10.7960), // Mesurado bridge approach
    (8, 6.3400, -10.8000), // ferry landing
];

// (a, b, speed m/s, one_way)
const ROADS: [(u64, u64, f64, bool); 8] = [
    (1, 2, 8.9,  false),
    (2, 3, 13.4, false),
    (3, 4, 13.4, false),
    (4, 5, 17.9, false),
    (3, 6, 8.9,  false),
    (2, 6, 6.7,  true),
    (6, 7, 8.9,  false),
    (7, 5, 17.9, true),
];

const STREETS: [(&str, &[u64]); 6] = [
    ("Randall Street",   &[1, 2]),
    ("Broad Street",     &[2, 3, 4]),
    ("Tubman Boulevard", &[4, 5]),
    ("Benson Street",    &[3, 6]),
    ("Gurley Street",    &[2, 6]),
    ("Water Street",     &[6, 7]),
];

/// Coordinates of a sample node; every id used in `ROADS` and `STREETS` is
/// listed in `NODES`.
fn position(id: u64) -> GeoPoint {
    let (_, lat, lon) = NODES[(id - 1) as usize];
    GeoPoint::new(lat, lon)
}

/// Build the sample graph and its street features.
pub fn build_sample(config: NetworkConfig) -> NetworkResult<(RoadGraph, StaticFeatures)> {
    let mut b = RoadGraphBuilder::with_config(config);
    for (id, lat, lon) in NODES {
        b.add_node(NodeId(id), GeoPoint::new(lat, lon));
    }
    for (a, c, speed, one_way) in ROADS {
        let length_m = position(a).distance_m(position(c));
        if one_way {
            b.add_edge(EdgeRecord::new(NodeId(a), NodeId(c), length_m).with_speed(speed));
        } else {
            b.add_road(NodeId(a), NodeId(c), length_m, Some(speed));
        }
    }

    let streets = STREETS
        .iter()
        .map(|&(name, ids)| {
            NamedFeature::new(
                Some(name.to_owned()),
                vec![("highway".to_owned(), "secondary".to_owned())],
                LineString(ids.iter().map(|&id| position(id)).collect()),
            )
        })
        .collect();

    Ok((b.build()?, StaticFeatures::new(streets)))
}
