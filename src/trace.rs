//! Observed traces.
//!
//! A trace is an ordered sequence of noisy planar observations in metric
//! coordinates. Geographic (lat/lon) projection happens upstream; this
//! crate only ever sees metres.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{MatchError, Result};
use crate::{Point, IO_DELIMITER};

/// An ordered sequence of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    points: Vec<Point>,
}

impl Trace {
    pub fn from_points(points: Vec<Point>) -> Self {
        Trace { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<Point> {
        self.points.get(i).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Copy of the observations in `[start, end]` (inclusive) as a new
    /// trace. Used when re-matching sub-traces in isolation.
    pub fn sub_trace(&self, start: usize, end: usize) -> Trace {
        Trace {
            points: self.points[start..=end].to_vec(),
        }
    }

    /// Load a trace from a delimited text file, one observation per line:
    /// `"<id>|<x>|<y>"`. The leading id field is ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_delimited(path, IO_DELIMITER)
    }

    /// [`Trace::load`] with a custom single-character delimiter.
    pub fn load_delimited(path: impl AsRef<Path>, delimiter: char) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MatchError::io(path, e))?;
        let mut points = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| MatchError::io(path, e))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split(delimiter);
            let record = MatchError::InvalidRecord {
                path: path.to_path_buf(),
                line: number + 1,
            };
            let _id = fields.next();
            let x = fields.next().and_then(|f| f.trim().parse::<f64>().ok());
            let y = fields.next().and_then(|f| f.trim().parse::<f64>().ok());
            match (x, y) {
                (Some(x), Some(y)) => points.push(Point::new(x, y)),
                _ => return Err(record),
            }
        }
        Ok(Trace { points })
    }
}

impl std::ops::Index<usize> for Trace {
    type Output = Point;

    fn index(&self, i: usize) -> &Point {
        &self.points[i]
    }
}

impl From<Vec<Point>> for Trace {
    fn from(points: Vec<Point>) -> Self {
        Trace { points }
    }
}
