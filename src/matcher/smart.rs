//! Re-splitting driver over the plain matcher.
//!
//! Low-confidence stretches of a matched trace are usually caused by
//! spatial ambiguity that the accumulated error of a long chain can no
//! longer discriminate, or by observations drifting past the admissibility
//! bound. Both respond to the same treatment: cut the weak stretch out,
//! re-match it in isolation with a relaxed error bound, and splice the
//! result back in.

use log::{debug, info};

use crate::error::Result;
use crate::graph::RoadGraph;
use crate::output::MatchOutput;
use crate::spatial::VertexIndex;
use crate::trace::Trace;
use crate::MatcherConfig;

use super::match_frechet;

/// Match a trace, then iteratively re-match weak runs on sub-traces.
///
/// A weak run is a maximal stretch of estimates with confidence below the
/// configured threshold. Each run is re-matched as its own trace, extended
/// by one observation per side for boundary continuity, with the squared
/// error bound doubled (capped at the hard matching cutoff). The re-matched
/// estimates replace the run only when they do not lower its summed
/// confidence, so the aggregate confidence never decreases. At most
/// `num_parts` sub-parts are created across all passes, and at most
/// `num_retries` passes run.
pub fn match_frechet_smart(
    graph: &RoadGraph,
    index: &VertexIndex,
    trace: &Trace,
    config: &MatcherConfig,
) -> Result<MatchOutput> {
    let mut output = match_frechet(graph, index, trace, config)?;

    let relaxed2 = (config.max_error2 * 2.0)
        .min(config.max_match_error * config.max_match_error)
        .max(config.max_error2);
    let mut parts_used = 0;

    for _pass in 0..config.num_retries {
        let runs = output.weak_runs(config.weak_threshold);
        if runs.is_empty() || parts_used >= config.num_parts {
            break;
        }
        debug!(
            "{} weak runs below {:.2}, {} parts left",
            runs.len(),
            config.weak_threshold,
            config.num_parts - parts_used
        );

        let mut improved = false;
        for (a, b) in runs {
            if parts_used >= config.num_parts {
                break;
            }
            parts_used += 1;

            // One extra observation per side anchors the sub-match to its
            // surroundings without touching their estimates.
            let start = a.saturating_sub(1);
            let end = (b + 1).min(trace.len() - 1);
            let sub_trace = trace.sub_trace(start, end);
            let sub_config = MatcherConfig {
                max_error2: relaxed2,
                ..config.clone()
            };
            let sub_output = match_frechet(graph, index, &sub_trace, &sub_config)?;

            let current: f64 = (a..=b).map(|i| output.confidence(i)).sum();
            let rematched: f64 = (a..=b).map(|i| sub_output.confidence(i - start)).sum();
            if rematched > current {
                info!(
                    "re-matched weak run [{a}, {b}]: confidence {current:.2} -> {rematched:.2}"
                );
                for i in a..=b {
                    output.estimates_mut()[i] = sub_output.estimates()[i - start];
                }
                improved = true;
            }
        }

        if !improved {
            break;
        }
    }

    Ok(output)
}
