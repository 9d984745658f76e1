//! Match results.
//!
//! One [`Estimate`] per observation, in trace order. The text format is
//! line-oriented, `"<index>|<edge>|<confidence>"`, with the sentinel edge
//! written as `-1` and confidences at two-decimal fixed precision.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::graph::EdgeId;
use crate::IO_DELIMITER;

/// The matched edge and confidence for a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Matched edge, `None` when no candidate survived.
    pub edge: Option<EdgeId>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Estimate {
    pub fn matched(edge: EdgeId, confidence: f64) -> Self {
        Estimate {
            edge: Some(edge),
            confidence,
        }
    }

    /// The sentinel estimate for an unmatched observation.
    pub fn unmatched() -> Self {
        Estimate {
            edge: None,
            confidence: 0.0,
        }
    }
}

/// Ordered per-observation estimates, same length as the matched trace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutput {
    estimates: Vec<Estimate>,
}

impl MatchOutput {
    pub fn new(estimates: Vec<Estimate>) -> Self {
        MatchOutput { estimates }
    }

    pub fn estimates(&self) -> &[Estimate] {
        &self.estimates
    }

    pub(crate) fn estimates_mut(&mut self) -> &mut [Estimate] {
        &mut self.estimates
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn edge(&self, i: usize) -> Option<EdgeId> {
        self.estimates[i].edge
    }

    pub fn confidence(&self, i: usize) -> f64 {
        self.estimates[i].confidence
    }

    /// Sum of all confidences; the aggregate the smart driver improves.
    pub fn total_confidence(&self) -> f64 {
        self.estimates.iter().map(|e| e.confidence).sum()
    }

    /// Maximal contiguous index ranges (inclusive) whose confidence falls
    /// below `threshold`.
    pub fn weak_runs(&self, threshold: f64) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, est) in self.estimates.iter().enumerate() {
            if est.confidence < threshold {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                runs.push((s, i - 1));
            }
        }
        if let Some(s) = start {
            runs.push((s, self.estimates.len() - 1));
        }
        runs
    }

    /// Write the output as delimited text, confidences at two decimals.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_delimited(path, IO_DELIMITER)
    }

    /// [`MatchOutput::save`] with a custom single-character delimiter.
    pub fn save_delimited(&self, path: impl AsRef<Path>, delimiter: char) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| MatchError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        for (i, est) in self.estimates.iter().enumerate() {
            let edge = est.edge.map_or(-1, |e| e as i64);
            writeln!(
                writer,
                "{i}{delimiter}{edge}{delimiter}{:.2}",
                est.confidence
            )
            .map_err(|e| MatchError::io(path, e))?;
        }
        writer.flush().map_err(|e| MatchError::io(path, e))
    }

    /// Read an output previously written by [`MatchOutput::save`]. The
    /// leading index field is ignored; a negative edge reads back as the
    /// sentinel.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_delimited(path, IO_DELIMITER)
    }

    /// [`MatchOutput::load`] with a custom single-character delimiter.
    pub fn load_delimited(path: impl AsRef<Path>, delimiter: char) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MatchError::io(path, e))?;
        let mut estimates = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| MatchError::io(path, e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = MatchError::InvalidRecord {
                path: path.to_path_buf(),
                line: number + 1,
            };
            let mut fields = line.split(delimiter);
            let _index = fields.next();
            let edge = fields.next().and_then(|f| f.trim().parse::<i64>().ok());
            let confidence = fields.next().and_then(|f| f.trim().parse::<f64>().ok());
            match (edge, confidence) {
                (Some(edge), Some(confidence)) => estimates.push(Estimate {
                    edge: (edge >= 0).then_some(edge as EdgeId),
                    confidence,
                }),
                _ => return Err(record),
            }
        }
        Ok(MatchOutput { estimates })
    }

    /// Score this output against a reference assignment: the sum of this
    /// output's confidences where the edges agree, divided by the length.
    pub fn evaluate(&self, reference: &MatchOutput) -> Result<f64> {
        if self.len() != reference.len() {
            return Err(MatchError::SizeMismatch {
                expected: self.len(),
                actual: reference.len(),
            });
        }
        if self.is_empty() {
            return Ok(0.0);
        }
        let agreeing: f64 = self
            .estimates
            .iter()
            .zip(reference.estimates.iter())
            .filter(|(a, b)| a.edge == b.edge)
            .map(|(a, _)| a.confidence)
            .sum();
        Ok(agreeing / self.len() as f64)
    }
}
