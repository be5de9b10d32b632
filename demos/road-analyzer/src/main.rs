//! road-analyzer — command-line front-end for the roadnet toolkit.
//!
//! Loads a road network (CSV files, an OSM PBF file with the `osm` feature,
//! or the built-in Monrovia sample) and runs one analysis on it:
//!
//! ```text
//! road-analyzer route "6.3106,-10.8040" "6.3000,-10.7972"
//! road-analyzer route "Broad Street" "Water Street" --metric travel_time
//! road-analyzer components
//! road-analyzer centrality --samples 500 --seed 42 --top 10
//! road-analyzer nearest "6.31,-10.80" -k 3
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG=debug` for per-query detail.

mod sample;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use rn_analysis::{BetweennessEstimator, Weighting, components};
use rn_core::{GeoPoint, Metric, NetworkConfig, NodeId};
use rn_network::{
    DijkstraRouter, NetworkError, RoadGraph, Router, SpatialIndex, StaticFeatures, StreetLocator,
    load_graph_csv, load_streets_csv,
};

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "road-analyzer")]
#[command(about = "Shortest routes, connectivity, and centrality over a drivable road network")]
struct Cli {
    /// Node list CSV (`id,lat,lon`).  Without it the built-in sample is used.
    #[arg(long, requires = "edges")]
    nodes: Option<PathBuf>,

    /// Edge list CSV (`from,to,length_m,speed_mps,travel_time_s`).
    #[arg(long, requires = "nodes")]
    edges: Option<PathBuf>,

    /// OSM PBF extract; replaces `--nodes`/`--edges` and supplies street names.
    #[cfg(feature = "osm")]
    #[arg(long, conflicts_with_all = ["nodes", "edges"])]
    pbf: Option<PathBuf>,

    /// Street geometry CSV (`feature,name,highway,lat,lon`) for name lookup.
    #[arg(long)]
    streets: Option<PathBuf>,

    /// Speed (m/s) assumed for edges with neither speed nor travel time.
    #[arg(long, default_value_t = NetworkConfig::default().fallback_speed_mps)]
    fallback_speed: f64,

    /// Maximum number of known street names listed when a lookup fails.
    #[arg(long, default_value_t = NetworkConfig::default().street_suggestion_limit)]
    suggestions: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Shortest route between two places.
    ///
    /// Each place is either `lat,lon` or a street name.
    Route {
        from: String,
        to: String,
        /// `length` or `travel_time`.
        #[arg(long, default_value_t = Metric::Length)]
        metric: Metric,
    },
    /// Count connected components (edge direction ignored).
    Components {
        /// How many component sizes to list.
        #[arg(long, default_value_t = 5)]
        show: usize,
    },
    /// Sampled betweenness centrality.
    Centrality {
        #[arg(long, default_value_t = 500)]
        samples: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Count shortest paths under this metric instead of in hops.
        #[arg(long)]
        metric: Option<Metric>,
        /// Sources per parallel batch.
        #[arg(long, default_value_t = NetworkConfig::default().parallel_chunk)]
        chunk: usize,
    },
    /// Snap a coordinate to the closest node(s).
    Nearest {
        /// `lat,lon`
        point: GeoPoint,
        #[arg(short, default_value_t = 1)]
        k: usize,
    },
}

// ── Network loading ───────────────────────────────────────────────────────────

struct Loaded {
    graph:   RoadGraph,
    streets: StaticFeatures,
}

fn load(cli: &Cli, config: &NetworkConfig) -> Result<Loaded> {
    let started = Instant::now();

    #[cfg(feature = "osm")]
    {
        if let Some(pbf) = &cli.pbf {
            let osm = rn_network::osm::load_from_pbf(pbf, config.clone())
                .with_context(|| format!("loading {}", pbf.display()))?;
            info!("loaded {} in {:.2} s", pbf.display(), started.elapsed().as_secs_f64());
            return Ok(Loaded { graph: osm.graph, streets: osm.streets });
        }
    }

    let (graph, mut streets) = match (&cli.nodes, &cli.edges) {
        (Some(nodes), Some(edges)) => {
            let graph = load_graph_csv(nodes, edges, config.clone())
                .with_context(|| format!("loading {} / {}", nodes.display(), edges.display()))?;
            (graph, StaticFeatures::default())
        }
        _ => {
            info!("no network files given, using the built-in sample");
            sample::build_sample(config.clone()).context("building sample network")?
        }
    };

    if let Some(path) = &cli.streets {
        streets = load_streets_csv(path).with_context(|| format!("loading {}", path.display()))?;
    }

    info!("network ready in {:.2} s", started.elapsed().as_secs_f64());
    Ok(Loaded { graph, streets })
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Either a coordinate or a street name, as typed by the user.
///
/// Street names are passed through verbatim: lookups match the exact string.
enum Place {
    Point(GeoPoint),
    Street(String),
}

impl Place {
    fn parse(raw: &str) -> Self {
        match raw.parse::<GeoPoint>() {
            Ok(p) => Place::Point(p),
            Err(_) => Place::Street(raw.to_owned()),
        }
    }
}

fn resolve(
    place: &Place,
    index: &SpatialIndex,
    locator: &StreetLocator<StaticFeatures>,
) -> Result<NodeId, NetworkError> {
    match place {
        Place::Point(p) => index.nearest(*p),
        Place::Street(name) => locator.locate(index, name),
    }
}

fn cmd_route(net: Loaded, config: &NetworkConfig, from: &str, to: &str, metric: Metric) -> Result<()> {
    let index = SpatialIndex::build(&net.graph);
    let locator = StreetLocator::new(net.streets, &net.graph, config)?;

    let (from_place, to_place) = (Place::parse(from), Place::parse(to));
    let source = resolve(&from_place, &index, &locator)?;
    let target = resolve(&to_place, &index, &locator)?;

    let route = DijkstraRouter.route(&net.graph, source, target, metric)?;

    println!("From: {from} (node {source})");
    println!("To:   {to} (node {target})");
    println!(
        "Path: {}",
        route.nodes.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
    );
    println!("Distance: {:.2} km", route.length_km(&net.graph));
    if metric == Metric::TravelTime {
        println!("Estimated driving time: {:.1} minutes", route.travel_minutes(&net.graph));
    }
    Ok(())
}

fn cmd_components(net: Loaded, show: usize) {
    let set = components(&net.graph);
    println!("Number of connected components: {}", set.len());
    println!("Largest component size: {}", set.largest().map_or(0, <[NodeId]>::len));
    for (i, size) in set.sizes().into_iter().take(show).enumerate() {
        println!("  #{:<3} {size} nodes", i + 1);
    }
}

fn cmd_centrality(
    net: Loaded,
    config: &NetworkConfig,
    samples: usize,
    seed: u64,
    top: usize,
    metric: Option<Metric>,
) -> Result<()> {
    let weighting = metric.map_or(Weighting::Hops, Weighting::Metric);
    let scores = BetweennessEstimator::new(samples, seed)
        .weighting(weighting)
        .with_config(config)
        .run(&net.graph)?;

    println!("Top {top} most central nodes ({} sources):", scores.sources());
    for (node, score) in scores.top(top) {
        println!("Node {node}: {score:.3}");
    }
    Ok(())
}

fn cmd_nearest(net: Loaded, point: GeoPoint, k: usize) -> Result<()> {
    let index = SpatialIndex::build(&net.graph);
    let (node, dist) = index.nearest_with_distance(point)?;
    println!("Nearest node: {node} at {} ({dist:.1} m)", net.graph.coordinates(node)?);
    if k > 1 {
        // `k_nearest` shares the lowest-id tie rule, so its head is `node`.
        for id in index.k_nearest(point, k)?.into_iter().skip(1) {
            println!("  then {id} at {}", net.graph.coordinates(id)?);
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn run(cli: Cli) -> Result<()> {
    let mut config = NetworkConfig {
        fallback_speed_mps:      cli.fallback_speed,
        street_suggestion_limit: cli.suggestions,
        ..NetworkConfig::default()
    };
    if let Command::Centrality { chunk, .. } = &cli.command {
        config.parallel_chunk = *chunk;
    }
    config.validate()?;

    let net = load(&cli, &config)?;

    match cli.command {
        Command::Route { from, to, metric } => cmd_route(net, &config, &from, &to, metric),
        Command::Components { show } => {
            cmd_components(net, show);
            Ok(())
        }
        Command::Centrality { samples, seed, top, metric, .. } => {
            cmd_centrality(net, &config, samples, seed, top, metric)
        }
        Command::Nearest { point, k } => cmd_nearest(net, point, k),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            let not_found = err.chain().find_map(|e| e.downcast_ref::<NetworkError>());
            if let Some(NetworkError::StreetNotFound { suggestions, .. }) = not_found {
                if !suggestions.is_empty() {
                    eprintln!("Some streets this network knows:");
                    for name in suggestions {
                        eprintln!("  - {name}");
                    }
                }
            }
            ExitCode::FAILURE
        }
    }
}
