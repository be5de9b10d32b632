//! Network-subsystem error type.
//!
//! Every failure a query can produce is a variant here; nothing in the crate
//! panics or exits on bad input.  The application layer decides how to report
//! them.

use thiserror::Error;

use rn_core::{CoreError, GeoPoint, NodeId};

/// Errors produced by `rn-network` (and reused by `rn-analysis`).
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Structural violation detected while building a graph.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    #[error("node {0} not found in graph")]
    UnknownNode(NodeId),

    /// A query point that is non-finite or outside the WGS-84 ranges.
    #[error("invalid coordinate {0}")]
    InvalidCoordinate(GeoPoint),

    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("no path from {from} to {to}")]
    NoPathExists { from: NodeId, to: NodeId },

    /// A node sequence handed to `path_cost` skips a hop the graph lacks.
    #[error("nodes {from} and {to} are not joined by an edge")]
    NotAdjacent { from: NodeId, to: NodeId },

    #[error("street {name:?} not found")]
    StreetNotFound {
        name: String,
        /// Sample of names the feature provider does know, for the caller to
        /// show.  Empty when the provider returned no named features at all.
        suggestions: Vec<String>,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "osm")]
    #[error("OSM parse error: {0}")]
    Osm(String),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
