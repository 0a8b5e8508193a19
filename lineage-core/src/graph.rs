//! The labelled lineage graph returned to callers.

use std::sync::Arc;

use crate::{
    centroid::Centroid,
    confidence::ScoredForest,
    distance::DistanceMatrix,
    mst::DisjointSet,
};

/// A cluster node, optionally carrying its centroid coordinates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LineageNode {
    label: Arc<str>,
    coordinates: Option<Vec<f64>>,
}

impl LineageNode {
    /// Returns the cluster label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the centroid coordinates, absent for precomputed matrices
    /// supplied without centroids.
    #[must_use]
    pub fn coordinates(&self) -> Option<&[f64]> {
        self.coordinates.as_deref()
    }
}

/// An undirected tree edge between two node indices (`source < target`).
///
/// `gain` is `+∞` when the edge cannot be rerouted. JSON serialisation
/// renders an infinite gain as `null`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LineageEdge {
    source: usize,
    target: usize,
    weight: f64,
    gain: f64,
}

impl LineageEdge {
    /// Returns the lower node index.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source(&self) -> usize { self.source }

    /// Returns the higher node index.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target(&self) -> usize { self.target }

    /// Returns the edge weight (inter-cluster distance).
    #[must_use]
    #[rustfmt::skip]
    pub const fn weight(&self) -> f64 { self.weight }

    /// Returns the confidence score, in `[0, +∞]`.
    #[must_use]
    #[rustfmt::skip]
    pub const fn gain(&self) -> f64 { self.gain }

    /// Returns `true` when `node` is one of the edge's endpoints.
    #[must_use]
    pub const fn touches(&self, node: usize) -> bool {
        self.source == node || self.target == node
    }

    /// Returns the endpoint opposite `node`, if the edge touches it.
    #[must_use]
    pub const fn other(&self, node: usize) -> Option<usize> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}

/// A minimum spanning tree or forest over cluster centroids.
///
/// Edges are listed in ascending `(weight, source, target)` order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LineageGraph {
    nodes: Vec<LineageNode>,
    edges: Vec<LineageEdge>,
}

impl LineageGraph {
    /// Returns the nodes in index order.
    #[must_use]
    pub fn nodes(&self) -> &[LineageNode] {
        &self.nodes
    }

    /// Returns the edges.
    #[must_use]
    pub fn edges(&self) -> &[LineageEdge] {
        &self.edges
    }

    /// Returns the node labelled `label`.
    #[must_use]
    pub fn node(&self, label: &str) -> Option<&LineageNode> {
        self.node_index(label).map(|index| &self.nodes[index])
    }

    /// Returns the index of the node labelled `label`.
    #[must_use]
    pub fn node_index(&self, label: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.label() == label)
    }

    /// Returns the number of edges touching node `index`.
    #[must_use]
    pub fn degree(&self, index: usize) -> usize {
        self.edges.iter().filter(|edge| edge.touches(index)).count()
    }

    /// Iterates over the neighbours of node `index`.
    pub fn neighbours(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.iter().filter_map(move |edge| edge.other(index))
    }

    /// Returns the edge joining nodes `left` and `right`, in either order.
    #[must_use]
    pub fn edge_between(&self, left: usize, right: usize) -> Option<&LineageEdge> {
        let (source, target) = if left <= right { (left, right) } else { (right, left) };
        self.edges
            .iter()
            .find(|edge| edge.source == source && edge.target == target)
    }

    /// Returns the number of connected components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        let mut components = DisjointSet::new(self.nodes.len());
        for edge in &self.edges {
            components.try_union(edge.source, edge.target);
        }
        components.components()
    }

    /// Returns the sum of all edge weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(LineageEdge::weight).sum()
    }
}

/// Builds the caller-facing graph, dropping the outgroup node and its edges.
///
/// The outgroup, when present, is the last matrix node, so real node
/// indices are unchanged by its removal.
pub(crate) fn assemble(
    matrix: &DistanceMatrix,
    outgroup: Option<usize>,
    scored: &ScoredForest,
    centroids: Option<&[Centroid]>,
) -> LineageGraph {
    let real = outgroup.unwrap_or(matrix.len());
    let nodes = matrix
        .labels()
        .iter()
        .take(real)
        .enumerate()
        .map(|(index, label)| LineageNode {
            label: Arc::clone(label),
            coordinates: centroids
                .and_then(|centroids| centroids.get(index))
                .map(|centroid| centroid.coordinates().to_vec()),
        })
        .collect();
    let edges = scored
        .edges
        .iter()
        .filter(|scored| outgroup.is_none_or(|node| !scored.edge.touches(node)))
        .map(|scored| LineageEdge {
            source: scored.edge.source(),
            target: scored.edge.target(),
            weight: scored.edge.weight(),
            gain: scored.gain,
        })
        .collect();
    LineageGraph { nodes, edges }
}
