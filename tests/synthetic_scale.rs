#![cfg(feature = "synthetic")]

//! Matching against generated networks with known ground truth.

use roadmatch::synthetic::SyntheticScenario;
use roadmatch::{match_frechet, match_frechet_smart, MatcherConfig, VertexIndex};

#[test]
fn test_matches_synthetic_route() {
    let dataset = SyntheticScenario::standard_grid().generate();
    let index = VertexIndex::build(&dataset.graph);
    let config = MatcherConfig::default();

    let output = match_frechet(&dataset.graph, &index, &dataset.trace, &config).unwrap();
    assert_eq!(output.len(), dataset.trace.len());

    // 5 m noise keeps every observation well inside the search radius.
    let sentinels = output.estimates().iter().filter(|e| e.edge.is_none()).count();
    assert_eq!(sentinels, 0);

    // Most observations land on their ground-truth edge; the rest sit at
    // intersections where neighbouring route edges are equally valid.
    let agreeing = output
        .estimates()
        .iter()
        .zip(&dataset.ground_truth)
        .filter(|(est, &truth)| est.edge == Some(truth))
        .count();
    let fraction = agreeing as f64 / output.len() as f64;
    assert!(
        fraction > 0.5,
        "only {:.0}% of estimates agree with ground truth",
        fraction * 100.0
    );
}

#[test]
fn test_synthetic_match_is_deterministic() {
    let dataset = SyntheticScenario::standard_grid().generate();
    let index = VertexIndex::build(&dataset.graph);
    let config = MatcherConfig::default();

    let first = match_frechet(&dataset.graph, &index, &dataset.trace, &config).unwrap();
    let second = match_frechet(&dataset.graph, &index, &dataset.trace, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_smart_does_not_lose_confidence_at_scale() {
    let dataset = SyntheticScenario::dense_urban().generate();
    let index = VertexIndex::build(&dataset.graph);
    let config = MatcherConfig::default();

    let plain = match_frechet(&dataset.graph, &index, &dataset.trace, &config).unwrap();
    let smart = match_frechet_smart(&dataset.graph, &index, &dataset.trace, &config).unwrap();
    assert!(smart.total_confidence() >= plain.total_confidence() - 1e-9);
}
