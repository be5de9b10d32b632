//! `rn-analysis` — whole-graph analyses over a built [`RoadGraph`].
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`components`] | `components`, `ComponentSet` (union-find, undirected)    |
//! | [`centrality`] | `centrality`, `BetweennessEstimator`, `CentralityScores` |
//!
//! Both analyses only read the graph, so they may run concurrently with each
//! other and with routing queries on the same snapshot.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Centrality sources run on the Rayon thread pool.         |
//!
//! [`RoadGraph`]: rn_network::RoadGraph

pub mod centrality;
pub mod components;


pub use centrality::{BetweennessEstimator, CentralityScores, Weighting, centrality, centrality_weighted};
pub use components::{ComponentSet, components};
