//! Spatial index over the graph's geometric vertices.
//!
//! A read-only façade over an R-tree populated once from a [`RoadGraph`]:
//! every geometric vertex, node or interior alike, is inserted under a
//! packed 64-bit identifier and queried with k-nearest-neighbour within a
//! radius. The packing only exists at this boundary; everywhere else
//! vertices are addressed by [`VertexId`].

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::error::{MatchError, Result};
use crate::graph::{EdgeId, RoadGraph, VertexId};
use crate::Point;

/// Pack a vertex id into the index's 64-bit identifier:
/// `(eid << 32) | gid`, with `eid = -1` marking the node form.
pub fn pack_vertex_id(v: VertexId) -> u64 {
    let (eid, gid) = match v {
        VertexId::Node(n) => (-1i64, n),
        VertexId::Interior(e, g) => (e as i64, g),
    };
    ((eid << 32) as u64) | gid as u64
}

/// Decode a packed identifier back into a vertex id.
///
/// Rejects identifiers that decode to neither form, including interior ids
/// with polyline index 0 (endpoints are canonically node-form).
pub fn unpack_vertex_id(raw: u64) -> Result<VertexId> {
    let eid = (raw as i64) >> 32;
    let gid = (raw & 0xFFFF_FFFF) as u32;
    match eid {
        -1 => Ok(VertexId::Node(gid)),
        e if e >= 0 && gid > 0 => Ok(VertexId::Interior(e as EdgeId, gid)),
        _ => Err(MatchError::MalformedVertexId { raw }),
    }
}

/// A geometric vertex as stored in the R-tree.
#[derive(Debug, Clone, Copy)]
pub struct IndexedVertex {
    pub id: u64,
    pub pos: [f64; 2],
}

impl RTreeObject for IndexedVertex {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for IndexedVertex {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.pos[0] - point[0];
        let dy = self.pos[1] - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree over every geometric vertex of a road graph.
#[derive(Debug)]
pub struct VertexIndex {
    tree: RTree<IndexedVertex>,
}

impl VertexIndex {
    /// Populate the index from a graph. Interior polyline vertices and node
    /// vertices are treated uniformly.
    pub fn build(graph: &RoadGraph) -> Self {
        let vertices: Vec<IndexedVertex> = graph
            .vertices()
            .map(|(v, p)| IndexedVertex {
                id: pack_vertex_id(v),
                pos: [p.x, p.y],
            })
            .collect();
        VertexIndex {
            tree: RTree::bulk_load(vertices),
        }
    }

    /// Up to `k` geometric vertices within squared distance `max_radius2`
    /// of `p`, ascending by distance, each with its squared distance.
    pub fn nearest(&self, p: Point, k: usize, max_radius2: f64) -> Result<Vec<(VertexId, f64)>> {
        self.tree
            .nearest_neighbor_iter_with_distance_2(&[p.x, p.y])
            .take_while(|(_, d2)| *d2 <= max_radius2)
            .take(k)
            .map(|(v, d2)| unpack_vertex_id(v.id).map(|id| (id, d2)))
            .collect()
    }

    /// Number of indexed vertices.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_round_trip() {
        for v in [
            VertexId::Node(0),
            VertexId::Node(u32::MAX),
            VertexId::Interior(0, 1),
            VertexId::Interior(2_000_000_000, 17),
        ] {
            assert_eq!(unpack_vertex_id(pack_vertex_id(v)).unwrap(), v);
        }
    }

    #[test]
    fn test_unpack_rejects_malformed() {
        // eid below -1.
        let raw = ((-2i64) << 32) as u64;
        assert!(matches!(
            unpack_vertex_id(raw),
            Err(MatchError::MalformedVertexId { .. })
        ));
        // Interior form with polyline index 0.
        let raw = (3i64 << 32) as u64;
        assert!(unpack_vertex_id(raw).is_err());
    }
}
