//! Street-name front-end: resolves a street name to one representative node.
//!
//! # Protocol
//!
//! 1. Look the name up in the [`StreetCache`].  Keys are the exact input
//!    string; `"Broad Street"` and `"broad street"` are different keys.
//! 2. On a miss, ask the [`FeatureProvider`] for road features inside the
//!    graph's bounding box.
//! 3. Take the first feature (in provider order) whose name equals the input
//!    and which has at least one vertex, and snap its first vertex to the
//!    nearest node with the [`SpatialIndex`].
//! 4. No match fails with [`NetworkError::StreetNotFound`], carrying up to
//!    `street_suggestion_limit` names the provider does know.
//!
//! A long street split into many features resolves to the first feature's
//! first vertex, which may be far from the part of the street the caller had
//! in mind.  The choice is deterministic for a given provider.

use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};

use rn_core::{BoundingBox, GeoPoint, NetworkConfig, NodeId};

use crate::index::SpatialIndex;
use crate::network::RoadGraph;
use crate::{NetworkError, NetworkResult};

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Anything exposing an ordered sequence of vertices.
///
/// Single- and multi-part shapes both flatten to one sequence, so the locator
/// takes the first vertex of any geometry the same way.
pub trait Geometry {
    fn vertices(&self) -> Box<dyn Iterator<Item = GeoPoint> + '_>;

    fn first_vertex(&self) -> Option<GeoPoint> {
        self.vertices().next()
    }
}

/// A polyline.
#[derive(Clone, Debug, PartialEq)]
pub struct LineString(pub Vec<GeoPoint>);

impl Geometry for LineString {
    fn vertices(&self) -> Box<dyn Iterator<Item = GeoPoint> + '_> {
        Box::new(self.0.iter().copied())
    }
}

/// Several polylines; vertices run part by part.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiLineString(pub Vec<LineString>);

impl Geometry for MultiLineString {
    fn vertices(&self) -> Box<dyn Iterator<Item = GeoPoint> + '_> {
        Box::new(self.0.iter().flat_map(|part| part.0.iter().copied()))
    }
}

// ── Features ──────────────────────────────────────────────────────────────────

/// A geometry plus the tags a provider knows about it.
#[derive(Clone)]
pub struct NamedFeature {
    pub name:     Option<String>,
    pub tags:     Vec<(String, String)>,
    pub geometry: Arc<dyn Geometry + Send + Sync>,
}

impl NamedFeature {
    pub fn new<G>(name: Option<String>, tags: Vec<(String, String)>, geometry: G) -> Self
    where
        G: Geometry + Send + Sync + 'static,
    {
        Self { name, tags, geometry: Arc::new(geometry) }
    }
}

impl std::fmt::Debug for NamedFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedFeature")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("first_vertex", &self.geometry.first_vertex())
            .finish()
    }
}

/// Tag predicate: `key` must be present and, when `value` is set, equal it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagFilter {
    pub key:   String,
    pub value: Option<String>,
}

impl TagFilter {
    /// Any `highway=*` feature.
    pub fn highway() -> Self {
        Self { key: "highway".into(), value: None }
    }

    pub fn matches(&self, tags: &[(String, String)]) -> bool {
        tags.iter().any(|(k, v)| {
            *k == self.key && self.value.as_ref().is_none_or(|want| want == v)
        })
    }
}

impl Default for TagFilter {
    fn default() -> Self {
        Self::highway()
    }
}

/// External source of named road geometries.
///
/// # Thread safety
///
/// Providers are shared by every thread that resolves street names through
/// the same [`StreetLocator`], hence `Send + Sync`.
pub trait FeatureProvider: Send + Sync {
    /// Features matching `filter` that touch `bbox`, in the provider's order.
    fn features(&self, bbox: &BoundingBox, filter: &TagFilter) -> NetworkResult<Vec<NamedFeature>>;
}

/// In-memory provider over a fixed feature list.
///
/// A feature is inside the box when any of its vertices is.
#[derive(Clone, Debug, Default)]
pub struct StaticFeatures {
    features: Vec<NamedFeature>,
}

impl StaticFeatures {
    pub fn new(features: Vec<NamedFeature>) -> Self {
        Self { features }
    }

    pub fn push(&mut self, feature: NamedFeature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureProvider for StaticFeatures {
    fn features(&self, bbox: &BoundingBox, filter: &TagFilter) -> NetworkResult<Vec<NamedFeature>> {
        Ok(self
            .features
            .iter()
            .filter(|f| filter.matches(&f.tags))
            .filter(|f| f.geometry.vertices().any(|v| bbox.contains(v)))
            .cloned()
            .collect())
    }
}

// ── StreetCache ───────────────────────────────────────────────────────────────

/// Name → node memo shared by one or more locators.
///
/// Lookups take a read lock; inserts take a short write lock.  The external
/// provider is never called while a lock is held, so two threads missing on
/// the same name may both query the provider.  The first insert wins and
/// both callers get the winning node.  Failed lookups are not cached.
#[derive(Debug, Default)]
pub struct StreetCache {
    entries: RwLock<FxHashMap<String, NodeId>>,
}

impl StreetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    /// Record `name → node` unless already present; returns the stored node.
    pub fn insert(&self, name: &str, node: NodeId) -> NodeId {
        *self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_owned())
            .or_insert(node)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── StreetLocator ─────────────────────────────────────────────────────────────

/// Resolves street names to nodes of one graph.
pub struct StreetLocator<P: FeatureProvider> {
    provider:         P,
    extent:           BoundingBox,
    filter:           TagFilter,
    cache:            Arc<StreetCache>,
    suggestion_limit: usize,
}

impl<P: FeatureProvider> StreetLocator<P> {
    /// Locator over `graph`'s bounding box with a fresh cache.
    ///
    /// # Errors
    ///
    /// [`NetworkError::EmptyGraph`] if `graph` has no nodes (no extent).
    pub fn new(provider: P, graph: &RoadGraph, config: &NetworkConfig) -> NetworkResult<Self> {
        let extent = graph.bounds().ok_or(NetworkError::EmptyGraph)?;
        Ok(Self {
            provider,
            extent,
            filter: TagFilter::highway(),
            cache: Arc::new(StreetCache::new()),
            suggestion_limit: config.street_suggestion_limit,
        })
    }

    /// Share an existing cache (e.g. one per analysis session).
    pub fn with_cache(mut self, cache: Arc<StreetCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_filter(mut self, filter: TagFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn cache(&self) -> &Arc<StreetCache> {
        &self.cache
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve `name` to a node, consulting the cache first.
    pub fn locate(&self, index: &SpatialIndex, name: &str) -> NetworkResult<NodeId> {
        if let Some(node) = self.cache.get(name) {
            debug!("street {name:?}: cache hit -> node {node}");
            return Ok(node);
        }
        debug!("street {name:?}: cache miss, querying feature provider");

        let features = self.provider.features(&self.extent, &self.filter)?;

        let vertex = features
            .iter()
            .filter(|f| f.name.as_deref() == Some(name))
            .find_map(|f| f.geometry.first_vertex());

        let Some(vertex) = vertex else {
            return Err(NetworkError::StreetNotFound {
                name:        name.to_owned(),
                suggestions: sample_names(&features, self.suggestion_limit),
            });
        };

        let node = self.cache.insert(name, index.nearest(vertex)?);
        info!("street {name:?} resolved to node {node} via vertex {vertex}");
        Ok(node)
    }
}

/// Distinct feature names in provider order, at most `limit` of them.
fn sample_names(features: &[NamedFeature], limit: usize) -> Vec<String> {
    let mut seen = FxHashSet::default();
    features
        .iter()
        .filter_map(|f| f.name.as_deref())
        .filter(|n| seen.insert(*n))
        .take(limit)
        .map(str::to_owned)
        .collect()
}
