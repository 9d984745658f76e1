//! Fréchet-based matching of a trace onto a road graph.
//!
//! The matcher couples spatial pre-selection with a discrete Fréchet-style
//! dynamic program:
//!
//! 1. Every observation is seeded with nearby geometric vertices from the
//!    spatial index (its *candidates*).
//! 2. A layered DP assigns each observation a candidate subject to
//!    continuity: moving from one observation's vertex to the next must be
//!    a forward walk along edge geometry and through node outgoing edges.
//!    A transition costs the maximum squared observation distance over the
//!    walked vertices; costs accumulate across observations.
//! 3. Per observation, the cheapest finalised state decides the matched
//!    edge, and the per-edge error ratio decides the confidence.
//!
//! Off-map stretches do not poison the rest of the trace: observations
//! without survivable candidates become sentinel estimates and the chain
//! restarts at the next seedable observation.

mod frontier;
mod smart;

pub use smart::match_frechet_smart;

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::error::{MatchError, Result};
use crate::geometry::dist2;
use crate::graph::{EdgeId, NodeId, RoadGraph, VertexId};
use crate::output::{Estimate, MatchOutput};
use crate::spatial::VertexIndex;
use crate::trace::Trace;
use crate::{MatcherConfig, Point};

use frontier::BucketQueue;

/// Candidates retrieved per observation.
pub const NN_NUMBER: usize = 50;
/// Hard cutoff on accepted matching distance, metres.
pub const MAX_MATCH_ERROR: f64 = 200.0;
/// Default squared search radius, m².
pub const MAX_CONSIDERED_AREA: f64 = 150.0 * 150.0;
/// Cap on the sub-parts the smart driver may create.
pub const NUM_PARTS: usize = 10;
/// Starting candidate-search radius, metres; doubled while a query comes
/// back empty.
pub const INITIAL_ERROR: f64 = 100.0;
/// Bins in the bucketed frontier.
pub const BUCKETS: usize = 100_000;
/// Most geometric vertices a transition walk may traverse between two
/// successive observations.
pub const MAX_WALK: usize = 64;
/// Confidence below which an estimate belongs to a weak run.
pub const WEAK_THRESHOLD: f64 = 0.5;

/// A finalised DP state: best accumulated error for one observation mapped
/// at one geometric vertex, plus the edge the walk arrived on.
#[derive(Debug, Clone, Copy)]
struct LayerState {
    cost: f64,
    arrival: Option<EdgeId>,
}

/// Finalised states of one observation, keyed by vertex for deterministic
/// iteration.
type Layer = BTreeMap<VertexId, LayerState>;

/// A walk in progress during layer advancement.
struct WalkLabel {
    vertex: VertexId,
    /// Accumulated error of the source state.
    base: f64,
    /// Running maximum squared distance over the walked vertices.
    runmax: f64,
    depth: usize,
    arrival: Option<EdgeId>,
}

/// Match a trace onto the road graph.
///
/// Returns one estimate per observation, in trace order. Observations with
/// no survivable candidate receive the sentinel estimate; an empty trace or
/// an edge-less graph is an error.
pub fn match_frechet(
    graph: &RoadGraph,
    index: &VertexIndex,
    trace: &Trace,
    config: &MatcherConfig,
) -> Result<MatchOutput> {
    if trace.is_empty() {
        return Err(MatchError::EmptyTrace);
    }
    if graph.edge_count() == 0 {
        return Err(MatchError::EmptyGraph);
    }

    let m = trace.len();
    let mut queue = BucketQueue::new(m as f64 * config.max_error2, config.buckets);
    let mut layers: Vec<Layer> = Vec::with_capacity(m);

    for i in 0..m {
        let obs = trace[i];
        let candidates = seed_candidates(index, obs, config)?;
        let layer = if candidates.is_empty() {
            Layer::new()
        } else if i == 0 || layers[i - 1].is_empty() {
            seed_layer(&candidates)
        } else {
            let advanced = advance_layer(graph, &layers[i - 1], obs, &candidates, config, &mut queue);
            if advanced.is_empty() {
                // No admissible transition: restart the chain here instead
                // of losing the rest of the trace to a single hard jump.
                seed_layer(&candidates)
            } else {
                advanced
            }
        };
        layers.push(layer);
    }

    let unmatched = layers.iter().filter(|l| l.is_empty()).count();
    if unmatched > 0 {
        debug!("{unmatched} of {m} observations have no survivable candidate");
    }

    Ok(extract_output(graph, &layers))
}

/// Match many traces against one shared graph and index in parallel.
///
/// The graph and index are immutable and shared; each trace gets its own
/// independent match call.
#[cfg(feature = "parallel")]
pub fn match_frechet_batch(
    graph: &RoadGraph,
    index: &VertexIndex,
    traces: &[Trace],
    config: &MatcherConfig,
) -> Vec<Result<MatchOutput>> {
    use rayon::prelude::*;

    traces
        .par_iter()
        .map(|trace| match_frechet(graph, index, trace, config))
        .collect()
}

/// Query candidates for one observation, starting at the initial radius and
/// doubling it up to the configured maximum while nothing is found.
fn seed_candidates(
    index: &VertexIndex,
    obs: Point,
    config: &MatcherConfig,
) -> Result<Vec<(VertexId, f64)>> {
    let mut radius2 = (config.initial_error * config.initial_error).min(config.max_error2);
    loop {
        let found = index.nearest(obs, config.nn_number, radius2)?;
        if !found.is_empty() || radius2 >= config.max_error2 {
            return Ok(found);
        }
        radius2 = (radius2 * 4.0).min(config.max_error2);
    }
}

/// Base-case layer: each candidate starts a fresh chain at its own local
/// error.
fn seed_layer(candidates: &[(VertexId, f64)]) -> Layer {
    candidates
        .iter()
        .map(|&(v, d2)| {
            (
                v,
                LayerState {
                    cost: d2,
                    arrival: None,
                },
            )
        })
        .collect()
}

/// Advance the DP by one observation.
///
/// Every state of the previous layer is a walk source. The stay transition
/// (no road travelled) costs the vertex's own squared distance to the new
/// observation; a forward walk costs the maximum squared distance over the
/// vertices it steps onto, the source itself having been paid for at the
/// previous observation. Walks die on any vertex beyond the admissibility
/// bound, and only candidate vertices become states of the new layer.
fn advance_layer(
    graph: &RoadGraph,
    prev: &Layer,
    obs: Point,
    candidates: &[(VertexId, f64)],
    config: &MatcherConfig,
    queue: &mut BucketQueue<WalkLabel>,
) -> Layer {
    let targets: BTreeMap<VertexId, f64> = candidates.iter().copied().collect();
    let mut layer = Layer::new();
    // Non-dominated (base, runmax) labels seen per vertex; a label both
    // costlier and tighter-capped than an existing one cannot improve any
    // extension of it.
    let mut seen: HashMap<VertexId, Vec<(f64, f64)>> = HashMap::new();

    queue.reset();
    for (&v, state) in prev {
        let d2 = dist2(obs, graph.coord(v));
        if d2 <= config.max_error2 && targets.contains_key(&v) {
            relax(&mut layer, v, state.cost + d2, state.arrival);
        }
        queue.push(
            state.cost,
            WalkLabel {
                vertex: v,
                base: state.cost,
                runmax: 0.0,
                depth: 0,
                arrival: state.arrival,
            },
        );
    }

    while let Some((_, label)) = queue.pop() {
        if label.depth >= config.max_walk {
            continue;
        }
        for (succ, eid) in graph.successors(label.vertex) {
            let d2 = dist2(obs, graph.coord(succ));
            if d2 > config.max_error2 {
                continue;
            }
            let runmax = label.runmax.max(d2);
            if dominated(&mut seen, succ, label.base, runmax) {
                continue;
            }
            if targets.contains_key(&succ) {
                relax(&mut layer, succ, label.base + runmax, Some(eid));
            }
            queue.push(
                label.base + runmax,
                WalkLabel {
                    vertex: succ,
                    base: label.base,
                    runmax,
                    depth: label.depth + 1,
                    arrival: Some(eid),
                },
            );
        }
    }

    layer
}

fn relax(layer: &mut Layer, v: VertexId, cost: f64, arrival: Option<EdgeId>) {
    let state = layer.entry(v).or_insert(LayerState {
        cost: f64::INFINITY,
        arrival,
    });
    if cost < state.cost {
        state.cost = cost;
        state.arrival = arrival;
    }
}

/// True when `(base, runmax)` is dominated by an already-seen label at `v`;
/// otherwise records it and drops the labels it dominates.
fn dominated(seen: &mut HashMap<VertexId, Vec<(f64, f64)>>, v: VertexId, base: f64, runmax: f64) -> bool {
    let labels = seen.entry(v).or_default();
    if labels.iter().any(|&(b, r)| b <= base && r <= runmax) {
        return true;
    }
    labels.retain(|&(b, r)| b < base || r < runmax);
    labels.push((base, runmax));
    false
}

/// Turn the finalised layers into per-observation estimates.
///
/// Runs back-to-front so node states can be resolved against the following
/// observation's chosen edge.
fn extract_output(graph: &RoadGraph, layers: &[Layer]) -> MatchOutput {
    let mut estimates = vec![Estimate::unmatched(); layers.len()];
    let mut next_edge: Option<EdgeId> = None;

    for (i, layer) in layers.iter().enumerate().rev() {
        if layer.is_empty() {
            next_edge = None;
            continue;
        }
        let chosen = choose_edge(graph, layer, next_edge);
        if let Some(edge) = chosen {
            let confidence = confidence_for(graph, layer, next_edge);
            estimates[i] = Estimate::matched(edge, confidence);
        }
        next_edge = chosen;
    }

    MatchOutput::new(estimates)
}

/// The matched edge for one layer: the cheapest interior state wins
/// directly; a layer holding only node states resolves its best node.
fn choose_edge(graph: &RoadGraph, layer: &Layer, next_edge: Option<EdgeId>) -> Option<EdgeId> {
    let best_interior = layer
        .iter()
        .filter(|(v, _)| !v.is_node())
        .min_by(|a, b| cmp_states(a, b));
    if let Some((v, _)) = best_interior {
        return v.edge();
    }
    let (v, state) = layer
        .iter()
        .min_by(|a, b| cmp_states(a, b))
        .expect("layer checked non-empty");
    match v {
        VertexId::Node(n) => resolve_node_edge(graph, *n, state.arrival, next_edge),
        VertexId::Interior(e, _) => Some(*e),
    }
}

/// Representative edge for an observation matched at a graph node: prefer
/// continuity with the next observation's edge, then the edge the DP walk
/// arrived on, then the lowest outgoing edge id.
fn resolve_node_edge(
    graph: &RoadGraph,
    node: NodeId,
    arrival: Option<EdgeId>,
    next_edge: Option<EdgeId>,
) -> Option<EdgeId> {
    let outgoing = graph.outgoing(node);
    if let Some(next) = next_edge {
        if outgoing.contains(&next) {
            return Some(next);
        }
    }
    arrival.or_else(|| outgoing.first().copied())
}

/// Confidence from the ratio of the best to the second-best accumulated
/// error, the two best taken per edge rather than per vertex.
fn confidence_for(graph: &RoadGraph, layer: &Layer, next_edge: Option<EdgeId>) -> f64 {
    let mut per_edge: BTreeMap<EdgeId, f64> = BTreeMap::new();
    for (v, state) in layer {
        let edge = match v {
            VertexId::Interior(e, _) => Some(*e),
            VertexId::Node(n) => resolve_node_edge(graph, *n, state.arrival, next_edge),
        };
        if let Some(e) = edge {
            let entry = per_edge.entry(e).or_insert(f64::INFINITY);
            *entry = entry.min(state.cost);
        }
    }

    match per_edge.len() {
        0 => 0.0,
        1 => 1.0,
        _ => {
            let mut best = f64::INFINITY;
            let mut second = f64::INFINITY;
            for &cost in per_edge.values() {
                if cost < best {
                    second = best;
                    best = cost;
                } else if cost < second {
                    second = cost;
                }
            }
            if second <= 0.0 {
                // Two edges with a perfect match cannot be told apart.
                0.0
            } else {
                (1.0 - best / second).clamp(0.0, 1.0)
            }
        }
    }
}

fn cmp_states(a: &(&VertexId, &LayerState), b: &(&VertexId, &LayerState)) -> std::cmp::Ordering {
    a.1.cost
        .partial_cmp(&b.1.cost)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then(a.0.cmp(b.0))
}
