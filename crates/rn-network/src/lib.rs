//! `rn-network` — road graph store, spatial index, routing, and street lookup.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`network`] | `RoadGraph` (CSR), `RoadGraphBuilder`, input records           |
//! | [`index`]   | `SpatialIndex` (R-tree nearest-node lookup)                    |
//! | [`router`]  | `Router` trait, `Route`, `DijkstraRouter`                      |
//! | [`locator`] | `StreetLocator`, `FeatureProvider`, `Geometry`, `StreetCache`  |
//! | [`loader`]  | CSV loaders for nodes, edges, and street geometries           |
//! | [`osm`]     | `load_from_pbf` (feature = `"osm"` only)                      |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                            |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `osm`   | Enables OSM PBF loading via the `osmpbf` crate.             |
//! | `serde` | Derives `Serialize`/`Deserialize` on `rn-core` types.        |

pub mod error;
pub mod index;
pub mod loader;
pub mod locator;
pub mod network;
pub mod router;

#[cfg(feature = "osm")]
pub mod osm;

#[cfg(test)]
mod tests;

pub use error::{NetworkError, NetworkResult};
pub use index::SpatialIndex;
pub use loader::{load_graph_csv, load_graph_readers, load_streets_csv, load_streets_reader};
pub use locator::{
    FeatureProvider, Geometry, LineString, MultiLineString, NamedFeature, StaticFeatures,
    StreetCache, StreetLocator, TagFilter,
};
pub use network::{EdgeRecord, Neighbor, NodeRecord, RoadGraph, RoadGraphBuilder};
pub use router::{DijkstraRouter, Route, Router};
