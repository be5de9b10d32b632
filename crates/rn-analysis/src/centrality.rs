//! Sampled betweenness centrality (Brandes, 2001).
//!
//! Full betweenness runs one single-source search per node, O(N·E) overall,
//! which is out of reach at city scale.  The estimator instead runs the
//! search from `sample_size` source nodes drawn without replacement from a
//! seeded RNG and sums each source's dependency scores.
//!
//! # Scores
//!
//! Scores are the raw accumulated dependencies over the sampled sources, not
//! normalised and not rescaled by `N / sample_size`.  Only relative order is
//! meaningful across different sample sizes.
//!
//! # Determinism
//!
//! The same graph, sample size, seed, and weighting reproduce identical
//! scores bit for bit.  With the `parallel` feature the sources of a chunk
//! are searched concurrently, but their contributions are added to the
//! totals in sample order, exactly as the sequential loop does.
//!
//! By default paths are counted in hops over directed edges.  Use
//! [`Weighting::Metric`] to count shortest paths under length or travel time.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::time::Instant;

use log::{debug, info};

use rn_core::{Metric, NetworkConfig, NodeId, NodeIdx, SampleRng};
use rn_network::{NetworkError, NetworkResult, RoadGraph};

// ── CentralityScores ──────────────────────────────────────────────────────────

/// Betweenness estimate for every node of one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct CentralityScores {
    /// Ascending, parallel to `scores`.
    node_ids: Vec<NodeId>,
    scores:   Vec<f64>,
    sources:  usize,
}

impl CentralityScores {
    pub fn get(&self, id: NodeId) -> Option<f64> {
        self.node_ids
            .binary_search(&id)
            .ok()
            .map(|i| self.scores[i])
    }

    /// `(node, score)` pairs in ascending node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.node_ids.iter().copied().zip(self.scores.iter().copied())
    }

    /// Number of source nodes actually searched.
    pub fn sources(&self) -> usize {
        self.sources
    }

    /// Every node ordered by descending score, ties by ascending id.
    pub fn ranked(&self) -> Vec<(NodeId, f64)> {
        let mut ranked: Vec<(NodeId, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// The `n` highest-ranked nodes.
    pub fn top(&self, n: usize) -> Vec<(NodeId, f64)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

// ── Estimator ─────────────────────────────────────────────────────────────────

/// How shortest paths are measured during accumulation.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Weighting {
    /// Every edge counts 1 (breadth-first search).
    #[default]
    Hops,
    /// Edge cost under the given metric (Dijkstra).
    Metric(Metric),
}

/// Configured betweenness run.
///
/// ```
/// use rn_analysis::BetweennessEstimator;
/// # use rn_network::RoadGraphBuilder;
/// # let graph = RoadGraphBuilder::new().build().unwrap();
/// let result = BetweennessEstimator::new(500, 42).run(&graph);
/// assert!(result.is_err()); // empty graph
/// ```
#[derive(Clone, Debug)]
pub struct BetweennessEstimator {
    sample_size: usize,
    seed:        u64,
    weighting:   Weighting,
    chunk:       usize,
}

impl BetweennessEstimator {
    pub fn new(sample_size: usize, seed: u64) -> Self {
        Self {
            sample_size,
            seed,
            weighting: Weighting::Hops,
            chunk: NetworkConfig::default().parallel_chunk,
        }
    }

    pub fn weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Take the parallel batch size from `config`.
    pub fn with_config(mut self, config: &NetworkConfig) -> Self {
        self.chunk = config.parallel_chunk.max(1);
        self
    }

    /// Estimate scores for `graph`.
    ///
    /// Runs on the Rayon pool when built with the `parallel` feature.
    ///
    /// # Errors
    ///
    /// [`NetworkError::EmptyGraph`] if `graph` has no nodes.
    pub fn run(&self, graph: &RoadGraph) -> NetworkResult<CentralityScores> {
        #[cfg(feature = "parallel")]
        {
            self.run_parallel(graph)
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.run_sequential(graph)
        }
    }

    /// Single-threaded estimate; identical output to [`run`](Self::run).
    pub fn run_sequential(&self, graph: &RoadGraph) -> NetworkResult<CentralityScores> {
        let started = Instant::now();
        let sources = self.draw_sources(graph)?;
        let mut totals = vec![0.0; graph.node_count()];

        let mut ws = Workspace::new(graph.node_count());
        for &s in &sources {
            ws.accumulate(graph, s, self.weighting);
            for (w, d) in ws.contributions(s) {
                totals[w.index()] += d;
            }
        }

        Ok(self.finish(graph, totals, sources.len(), started))
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn run_parallel(&self, graph: &RoadGraph) -> NetworkResult<CentralityScores> {
        use rayon::prelude::*;

        let started = Instant::now();
        let sources = self.draw_sources(graph)?;
        let n = graph.node_count();
        let mut totals = vec![0.0; n];

        for chunk in sources.chunks(self.chunk.max(1)) {
            // Indexed collect keeps sample order.
            let partials: Vec<Vec<(NodeIdx, f64)>> = chunk
                .par_iter()
                .map_init(
                    || Workspace::new(n),
                    |ws, &s| {
                        ws.accumulate(graph, s, self.weighting);
                        ws.contributions(s).collect()
                    },
                )
                .collect();

            for partial in partials {
                for (w, d) in partial {
                    totals[w.index()] += d;
                }
            }
        }

        Ok(self.finish(graph, totals, sources.len(), started))
    }

    fn draw_sources(&self, graph: &RoadGraph) -> NetworkResult<Vec<NodeIdx>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(NetworkError::EmptyGraph);
        }
        let k = self.sample_size.min(n);
        if k < self.sample_size {
            debug!("sample size {} clamped to node count {n}", self.sample_size);
        }
        info!("betweenness: {k} of {n} sources, seed {}, {:?}", self.seed, self.weighting);

        Ok(SampleRng::new(self.seed)
            .sample_indices(n, k)
            .into_iter()
            .map(|i| NodeIdx(i as u32))
            .collect())
    }

    fn finish(
        &self,
        graph: &RoadGraph,
        scores: Vec<f64>,
        sources: usize,
        started: Instant,
    ) -> CentralityScores {
        info!("betweenness done in {:.3} s", started.elapsed().as_secs_f64());
        CentralityScores { node_ids: graph.node_ids().to_vec(), scores, sources }
    }
}

/// Hop-count betweenness from `sample_size` sources drawn with `seed`.
pub fn centrality(graph: &RoadGraph, sample_size: usize, seed: u64) -> NetworkResult<CentralityScores> {
    BetweennessEstimator::new(sample_size, seed).run(graph)
}

/// Betweenness with shortest paths measured under `metric`.
pub fn centrality_weighted(
    graph: &RoadGraph,
    sample_size: usize,
    seed: u64,
    metric: Metric,
) -> NetworkResult<CentralityScores> {
    BetweennessEstimator::new(sample_size, seed)
        .weighting(Weighting::Metric(metric))
        .run(graph)
}

// ── Single-source accumulation ────────────────────────────────────────────────

/// Min-heap entry: lowest distance first, then lowest index.
#[derive(Copy, Clone, PartialEq)]
struct Frontier {
    dist: f64,
    node: NodeIdx,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-search scratch arrays, reused across sources.
///
/// Only the nodes a search reached are reset before the next one.  Every node
/// given a finite distance is eventually settled and so lands in `order`.
struct Workspace {
    dist:    Vec<f64>,
    sigma:   Vec<f64>,
    delta:   Vec<f64>,
    settled: Vec<bool>,
    preds:   Vec<Vec<NodeIdx>>,
    /// Nodes in non-decreasing distance from the source.
    order:   Vec<NodeIdx>,
    queue:   VecDeque<NodeIdx>,
    heap:    BinaryHeap<Frontier>,
}

impl Workspace {
    fn new(n: usize) -> Self {
        Self {
            dist:    vec![f64::INFINITY; n],
            sigma:   vec![0.0; n],
            delta:   vec![0.0; n],
            settled: vec![false; n],
            preds:   vec![Vec::new(); n],
            order:   Vec::new(),
            queue:   VecDeque::new(),
            heap:    BinaryHeap::new(),
        }
    }

    fn reset(&mut self) {
        for &v in &self.order {
            let i = v.index();
            self.dist[i] = f64::INFINITY;
            self.sigma[i] = 0.0;
            self.delta[i] = 0.0;
            self.settled[i] = false;
            self.preds[i].clear();
        }
        self.order.clear();
        self.queue.clear();
        self.heap.clear();
    }

    /// Run one search from `s` and back-propagate dependencies into `delta`.
    fn accumulate(&mut self, graph: &RoadGraph, s: NodeIdx, weighting: Weighting) {
        self.reset();
        self.dist[s.index()] = 0.0;
        self.sigma[s.index()] = 1.0;

        match weighting {
            Weighting::Hops => self.bfs(graph, s),
            Weighting::Metric(metric) => self.dijkstra(graph, s, metric),
        }

        for &w in self.order.iter().rev() {
            let coeff = (1.0 + self.delta[w.index()]) / self.sigma[w.index()];
            for &v in &self.preds[w.index()] {
                self.delta[v.index()] += self.sigma[v.index()] * coeff;
            }
        }
    }

    fn bfs(&mut self, graph: &RoadGraph, s: NodeIdx) {
        self.queue.push_back(s);
        while let Some(v) = self.queue.pop_front() {
            self.order.push(v);
            let next_dist = self.dist[v.index()] + 1.0;
            for e in graph.out_edges(v) {
                let w = graph.edge_target(e);
                if w == v {
                    continue;
                }
                if self.dist[w.index()].is_infinite() {
                    self.dist[w.index()] = next_dist;
                    self.queue.push_back(w);
                }
                if self.dist[w.index()] == next_dist {
                    self.sigma[w.index()] += self.sigma[v.index()];
                    self.preds[w.index()].push(v);
                }
            }
        }
    }

    fn dijkstra(&mut self, graph: &RoadGraph, s: NodeIdx, metric: Metric) {
        self.heap.push(Frontier { dist: 0.0, node: s });
        while let Some(Frontier { dist, node: v }) = self.heap.pop() {
            if self.settled[v.index()] || dist > self.dist[v.index()] {
                continue;
            }
            self.settled[v.index()] = true;
            self.order.push(v);

            for e in graph.out_edges(v) {
                let w = graph.edge_target(e);
                if self.settled[w.index()] {
                    continue;
                }
                let candidate = dist + graph.edge_weight(e, metric);
                let known = self.dist[w.index()];
                if candidate < known {
                    self.dist[w.index()] = candidate;
                    self.sigma[w.index()] = self.sigma[v.index()];
                    self.preds[w.index()].clear();
                    self.preds[w.index()].push(v);
                    self.heap.push(Frontier { dist: candidate, node: w });
                } else if candidate == known {
                    self.sigma[w.index()] += self.sigma[v.index()];
                    self.preds[w.index()].push(v);
                }
            }
        }
    }

    /// Dependencies of every reached node other than the source.
    fn contributions(&self, s: NodeIdx) -> impl Iterator<Item = (NodeIdx, f64)> + '_ {
        self.order
            .iter()
            .copied()
            .filter(move |&w| w != s)
            .map(|w| (w, self.delta[w.index()]))
    }
}
