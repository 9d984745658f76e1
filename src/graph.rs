//! Immutable road network model.
//!
//! The graph is a directed multigraph: nodes are planar points, edges carry
//! the physical shape of the road segment as a polyline between their
//! endpoint nodes. Matching operates on *geometric vertices*, the union of
//! graph nodes and interior polyline vertices, addressed by [`VertexId`].

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::geometry;
use crate::Point;

/// Dense node index.
pub type NodeId = u32;
/// Dense edge index.
pub type EdgeId = u32;

/// Identifier of a geometric vertex.
///
/// Edge-polyline endpoints are always represented in the `Node` form;
/// `Interior(eid, gid)` only ever addresses `gid` in `[1, n-1)` of an edge
/// with `n + 1` polyline vertices.
///
/// The ordering is lexicographic on `(edge, index)` with every node sorting
/// before every interior vertex, which is what all deterministic
/// tie-breaking in the matcher relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VertexId {
    /// A graph node, shared by all edges meeting there.
    Node(NodeId),
    /// An interior vertex of one edge's polyline.
    Interior(EdgeId, u32),
}

impl VertexId {
    /// The edge this vertex belongs to, if it is an interior vertex.
    pub fn edge(&self) -> Option<EdgeId> {
        match self {
            VertexId::Node(_) => None,
            VertexId::Interior(eid, _) => Some(*eid),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, VertexId::Node(_))
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VertexId::Node(n) => write!(f, "node({n})"),
            VertexId::Interior(e, g) => write!(f, "edge({e}, {g})"),
        }
    }
}

/// A directed road segment with its physical shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    /// Abstract traversal cost carried through from the network source.
    pub cost: u32,
    /// Euclidean polyline length in metres.
    pub length: f64,
    pub name: String,
    /// Road classification, e.g. "residential".
    pub kind: String,
    /// Polyline from `coord(from)` to `coord(to)`, at least two vertices.
    pub geometry: Vec<Point>,
}

impl Edge {
    /// Build an edge from its endpoints and shape; length is derived from
    /// the geometry.
    pub fn new(id: EdgeId, from: NodeId, to: NodeId, geometry: Vec<Point>) -> Self {
        let length = geometry::polyline_length(&geometry);
        Edge {
            id,
            from,
            to,
            cost: 1,
            length,
            name: String::new(),
            kind: String::new(),
            geometry,
        }
    }

    /// Canonical vertex id for polyline index `gid`: endpoints resolve to
    /// the node form.
    pub fn vertex_id(&self, gid: u32) -> VertexId {
        if gid == 0 {
            VertexId::Node(self.from)
        } else if gid as usize == self.geometry.len() - 1 {
            VertexId::Node(self.to)
        } else {
            VertexId::Interior(self.id, gid)
        }
    }

    /// Number of interior polyline vertices.
    pub fn interior_count(&self) -> usize {
        self.geometry.len().saturating_sub(2)
    }

    /// Project a point onto the edge's polyline.
    pub fn project(&self, p: Point) -> Option<(Point, f64)> {
        geometry::project_onto_polyline(p, &self.geometry)
    }
}

/// Immutable directed road graph.
///
/// Nodes and edges live in dense, index-addressed storage; adjacency lists
/// hold edge indices only. Once constructed the graph is read-only and can
/// be shared freely between concurrent match calls.
#[derive(Debug, Clone)]
pub struct RoadGraph {
    nodes: Vec<Point>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
}

/// Endpoint coordinates may drift from node coordinates by at most this
/// much (metres) before construction rejects the edge.
const ENDPOINT_TOLERANCE: f64 = 1e-6;

impl RoadGraph {
    /// Assemble a graph from node coordinates and edges.
    ///
    /// Edges must be densely numbered in input order (`edges[i].id == i`),
    /// reference valid nodes, and carry polylines whose endpoints coincide
    /// with their `from`/`to` node coordinates.
    pub fn from_parts(nodes: Vec<Point>, edges: Vec<Edge>) -> Result<Self> {
        let mut outgoing = vec![Vec::new(); nodes.len()];
        for (i, edge) in edges.iter().enumerate() {
            if edge.id as usize != i {
                return Err(MatchError::InvalidEdge {
                    edge: edge.id,
                    reason: format!("id must equal dense index {i}"),
                });
            }
            if edge.from as usize >= nodes.len() || edge.to as usize >= nodes.len() {
                return Err(MatchError::InvalidEdge {
                    edge: edge.id,
                    reason: "endpoint node out of range".to_string(),
                });
            }
            if edge.geometry.len() < 2 {
                return Err(MatchError::InvalidEdge {
                    edge: edge.id,
                    reason: "geometry needs at least two vertices".to_string(),
                });
            }
            let first = edge.geometry[0];
            let last = *edge.geometry.last().expect("validated non-empty");
            if geometry::dist2(first, nodes[edge.from as usize]) > ENDPOINT_TOLERANCE
                || geometry::dist2(last, nodes[edge.to as usize]) > ENDPOINT_TOLERANCE
            {
                return Err(MatchError::InvalidEdge {
                    edge: edge.id,
                    reason: "geometry endpoints do not coincide with nodes".to_string(),
                });
            }
            // Input order is id order, so each adjacency list stays sorted.
            outgoing[edge.from as usize].push(edge.id);
        }
        Ok(RoadGraph {
            nodes,
            edges,
            outgoing,
        })
    }

    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id as usize)
    }

    /// Edges leaving `node`, ascending by id.
    pub fn outgoing(&self, node: NodeId) -> &[EdgeId] {
        &self.outgoing[node as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Coordinate of any geometric vertex, O(1).
    ///
    /// The id must address a vertex of this graph.
    pub fn coord(&self, v: VertexId) -> Point {
        match v {
            VertexId::Node(n) => self.nodes[n as usize],
            VertexId::Interior(e, g) => self.edges[e as usize].geometry[g as usize],
        }
    }

    /// Successor geometric vertices of `v`, each with the edge traversed.
    ///
    /// Interior vertices step to the next polyline vertex of their edge
    /// (the final step resolving to the destination node); node vertices
    /// step into the first interior vertex of each outgoing edge, or
    /// straight to the far endpoint when the edge has no interior shape.
    /// Self-loops are never produced.
    pub fn successors(&self, v: VertexId) -> Vec<(VertexId, EdgeId)> {
        match v {
            VertexId::Node(n) => self
                .outgoing(n)
                .iter()
                .filter_map(|&eid| {
                    let edge = &self.edges[eid as usize];
                    let succ = if edge.interior_count() > 0 {
                        VertexId::Interior(eid, 1)
                    } else {
                        VertexId::Node(edge.to)
                    };
                    (succ != v).then_some((succ, eid))
                })
                .collect(),
            VertexId::Interior(eid, gid) => {
                let edge = &self.edges[eid as usize];
                vec![(edge.vertex_id(gid + 1), eid)]
            }
        }
    }

    /// Successor geometric vertices of `v`.
    pub fn adjacent(&self, v: VertexId) -> Vec<VertexId> {
        self.successors(v).into_iter().map(|(s, _)| s).collect()
    }

    /// Every geometric vertex of the graph with its coordinate: all nodes,
    /// then all interior polyline vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, Point)> + '_ {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &p)| (VertexId::Node(i as NodeId), p));
        let interiors = self.edges.iter().flat_map(|e| {
            (1..e.geometry.len().saturating_sub(1))
                .map(move |g| (VertexId::Interior(e.id, g as u32), e.geometry[g]))
        });
        nodes.chain(interiors)
    }
}
