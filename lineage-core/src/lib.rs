//! Lineage core library.
//!
//! Infers a branching trajectory between clusters of points: centroids are
//! summarised, compared under one of several distance models, joined by a
//! minimum spanning tree (optionally split into a forest by an outgroup
//! node and constrained so chosen clusters stay leaves), and every tree
//! edge is scored by how much the tree degrades without it.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod centroid;
mod confidence;
mod distance;
mod endpoints;
mod error;
mod graph;
mod mst;
mod neighbours;
mod outgroup;
mod points;
mod tree;

pub use crate::{
    builder::{ClusterTreeBuilder, DEFAULT_MNN_K, DEFAULT_OUTSCALE},
    centroid::{Aggregation, Centroid, centroids_from_rows},
    distance::{DistanceMatrix, DistanceMethod, euclidean_distance, squared_euclidean},
    error::{ErrorKind, LineageError, LineageErrorCode, Result},
    graph::{LineageEdge, LineageGraph, LineageNode},
    mst::{
        MinimumSpanningForest, MstEdge, MstError, MstErrorCode, WeightedEdge, kruskal,
        matrix_spanning_forest,
    },
    neighbours::{ExactIndex, NeighbourIndex, mutual_nearest_neighbours},
    outgroup::OutgroupSpec,
    points::{ClusterAssignment, PointSet, SoftAssignment},
    tree::{ClusterTree, TreeInput},
};
