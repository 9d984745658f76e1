//! Tests for the re-splitting driver.

use roadmatch::{
    match_frechet, match_frechet_smart, Edge, MatcherConfig, Point, RoadGraph, Trace, VertexIndex,
};

/// One long edge along the x axis, vertices every 40 m up to x = 400.
fn long_road() -> RoadGraph {
    let nodes = vec![Point::new(0.0, 0.0), Point::new(400.0, 0.0)];
    let geometry = (0..=10).map(|i| Point::new(i as f64 * 40.0, 0.0)).collect();
    let edges = vec![Edge::new(0, 0, 1, geometry)];
    RoadGraph::from_parts(nodes, edges).unwrap()
}

/// A trace along the road with a four-observation GPS glitch displaced
/// 170 m sideways: beyond the default 150 m search radius, but within the
/// 200 m hard cutoff the smart driver may relax to.
fn glitched_trace() -> Trace {
    Trace::from_points(vec![
        Point::new(0.0, 5.0),
        Point::new(40.0, -5.0),
        Point::new(80.0, 5.0),
        Point::new(120.0, 170.0),
        Point::new(160.0, 170.0),
        Point::new(200.0, 170.0),
        Point::new(240.0, 170.0),
        Point::new(280.0, 5.0),
        Point::new(320.0, -5.0),
        Point::new(360.0, 5.0),
    ])
}

#[test]
fn test_recovers_glitched_run_with_relaxed_error() {
    let graph = long_road();
    let index = VertexIndex::build(&graph);
    let trace = glitched_trace();
    let config = MatcherConfig::default();

    let plain = match_frechet(&graph, &index, &trace, &config).unwrap();

    // The glitch is out of reach for the plain matcher and forms one
    // four-observation weak run of sentinel estimates.
    assert_eq!(plain.weak_runs(config.weak_threshold), vec![(3, 6)]);
    for i in 3..=6 {
        assert_eq!(plain.edge(i), None);
    }

    let smart = match_frechet_smart(&graph, &index, &trace, &config).unwrap();

    // Re-matched in isolation with the relaxed bound, the glitch resolves
    // onto the road.
    for i in 3..=6 {
        assert_eq!(smart.edge(i), Some(0), "observation {i}");
        assert!(smart.confidence(i) > 0.0);
    }
    assert!(smart.total_confidence() > plain.total_confidence());
}

#[test]
fn test_estimates_outside_weak_runs_untouched() {
    let graph = long_road();
    let index = VertexIndex::build(&graph);
    let trace = glitched_trace();
    let config = MatcherConfig::default();

    let plain = match_frechet(&graph, &index, &trace, &config).unwrap();
    let smart = match_frechet_smart(&graph, &index, &trace, &config).unwrap();

    for i in (0..3).chain(7..10) {
        assert_eq!(smart.estimates()[i], plain.estimates()[i], "observation {i}");
    }
}

#[test]
fn test_no_weak_runs_is_a_no_op() {
    let graph = long_road();
    let index = VertexIndex::build(&graph);
    let trace = Trace::from_points(vec![
        Point::new(0.0, 5.0),
        Point::new(100.0, -5.0),
        Point::new(200.0, 5.0),
        Point::new(300.0, -5.0),
    ]);
    let config = MatcherConfig::default();

    let plain = match_frechet(&graph, &index, &trace, &config).unwrap();
    assert!(plain.weak_runs(config.weak_threshold).is_empty());

    let smart = match_frechet_smart(&graph, &index, &trace, &config).unwrap();
    assert_eq!(smart, plain);
}

#[test]
fn test_zero_retries_disables_resplitting() {
    let graph = long_road();
    let index = VertexIndex::build(&graph);
    let trace = glitched_trace();
    let config = MatcherConfig {
        num_retries: 0,
        ..MatcherConfig::default()
    };

    let plain = match_frechet(&graph, &index, &trace, &config).unwrap();
    let smart = match_frechet_smart(&graph, &index, &trace, &config).unwrap();
    assert_eq!(smart, plain);
}

#[test]
fn test_zero_parts_disables_resplitting() {
    let graph = long_road();
    let index = VertexIndex::build(&graph);
    let trace = glitched_trace();
    let config = MatcherConfig {
        num_parts: 0,
        ..MatcherConfig::default()
    };

    let plain = match_frechet(&graph, &index, &trace, &config).unwrap();
    let smart = match_frechet_smart(&graph, &index, &trace, &config).unwrap();
    assert_eq!(smart, plain);
}

#[test]
fn test_aggregate_confidence_never_decreases() {
    // A fork with an ambiguous turn: whatever the smart driver does with
    // the dip near the node, the total confidence may not drop.
    let nodes = vec![
        Point::new(0.0, 0.0),
        Point::new(100.0, 0.0),
        Point::new(100.0, 100.0),
    ];
    let edges = vec![
        Edge::new(
            0,
            0,
            1,
            vec![
                Point::new(0.0, 0.0),
                Point::new(25.0, 0.0),
                Point::new(50.0, 0.0),
                Point::new(75.0, 0.0),
                Point::new(100.0, 0.0),
            ],
        ),
        Edge::new(
            1,
            0,
            2,
            vec![
                Point::new(0.0, 0.0),
                Point::new(25.0, 25.0),
                Point::new(50.0, 50.0),
                Point::new(75.0, 75.0),
                Point::new(100.0, 100.0),
            ],
        ),
    ];
    let graph = RoadGraph::from_parts(nodes, edges).unwrap();
    let index = VertexIndex::build(&graph);
    let config = MatcherConfig::default();

    let traces = [
        vec![
            Point::new(10.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(95.0, 75.0),
            Point::new(100.0, 90.0),
        ],
        vec![
            Point::new(10.0, 5.0),
            Point::new(50.0, 40.0),
            Point::new(60.0, 30.0),
            Point::new(90.0, 10.0),
        ],
    ];

    for points in traces {
        let trace = Trace::from_points(points);
        let plain = match_frechet(&graph, &index, &trace, &config).unwrap();
        let smart = match_frechet_smart(&graph, &index, &trace, &config).unwrap();
        assert!(smart.total_confidence() >= plain.total_confidence() - 1e-9);
    }
}

#[test]
fn test_smart_is_deterministic() {
    let graph = long_road();
    let index = VertexIndex::build(&graph);
    let trace = glitched_trace();
    let config = MatcherConfig::default();

    let first = match_frechet_smart(&graph, &index, &trace, &config).unwrap();
    let second = match_frechet_smart(&graph, &index, &trace, &config).unwrap();
    assert_eq!(first, second);
}
