//! `rn-core` — foundational types for the `roadnet` analysis toolkit.
//!
//! This crate is a dependency of every other `rn-*` crate.  It has no `rn-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                               |
//! |------------|--------------------------------------------------------|
//! | [`ids`]    | `NodeId` (external), `NodeIdx`, `EdgeId` (internal)    |
//! | [`geo`]    | `GeoPoint`, `BoundingBox`, haversine distance          |
//! | [`metric`] | `Metric` cost selector (`length` / `travel_time`)      |
//! | [`rng`]    | `SampleRng` — seeded, reproducible source sampling     |
//! | [`config`] | `NetworkConfig`                                        |
//! | [`error`]  | `CoreError`, `CoreResult`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod metric;
pub mod rng;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::NetworkConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{BoundingBox, GeoPoint};
pub use ids::{EdgeId, NodeId, NodeIdx};
pub use metric::Metric;
pub use rng::SampleRng;
