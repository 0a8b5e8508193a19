//! Unit tests for the Kruskal MST implementation.

use proptest::prelude::*;
use rstest::rstest;

use crate::distance::DistanceMatrix;

use super::{
    MstEdge, MstError, SortedEdges, WeightedEdge, kruskal, matrix_edges, matrix_spanning_forest,
};

fn edges(raw: &[(usize, usize, f64, u64)]) -> Vec<WeightedEdge> {
    raw.iter()
        .map(|(source, target, weight, sequence)| {
            WeightedEdge::new(*source, *target, *weight, *sequence)
        })
        .collect()
}

fn check_forest_invariants(node_count: usize, edges: &[MstEdge]) -> usize {
    let mut parent: Vec<usize> = (0..node_count).collect();

    fn find(parent: &mut [usize], node: usize) -> usize {
        let mut current = node;
        while parent[current] != current {
            let grandparent = parent[parent[current]];
            parent[current] = grandparent;
            current = parent[current];
        }
        current
    }

    fn union(parent: &mut [usize], left: usize, right: usize) -> bool {
        let left_root = find(parent, left);
        let right_root = find(parent, right);
        if left_root == right_root {
            return false;
        }
        parent[right_root] = left_root;
        true
    }

    for edge in edges {
        assert!(edge.source() < node_count);
        assert!(edge.target() < node_count);
        assert!(edge.source() < edge.target());
        assert!(edge.weight().is_finite());
        assert!(union(&mut parent, edge.source(), edge.target()));
    }

    let mut roots = (0..node_count)
        .map(|node| find(&mut parent, node))
        .collect::<Vec<_>>();
    roots.sort_unstable();
    roots.dedup();
    roots.len()
}

#[test]
fn rejects_empty_graph() {
    let result = kruskal(0, &[]);
    assert!(matches!(result, Err(MstError::EmptyGraph)));
}

#[test]
fn rejects_out_of_bounds_node_ids() {
    let result = kruskal(3, &edges(&[(0, 3, 1.0, 0)]));
    assert!(matches!(
        result,
        Err(MstError::InvalidNodeId {
            node: 3,
            node_count: 3
        })
    ));
}

#[test]
fn rejects_non_finite_weight() {
    let result = kruskal(2, &edges(&[(0, 1, f64::NAN, 0)]));
    assert!(matches!(
        result,
        Err(MstError::NonFiniteWeight { left: 0, right: 1 })
    ));
}

#[test]
fn ignores_self_edges() {
    let result = kruskal(2, &edges(&[(0, 0, 1.0, 0), (0, 1, 2.0, 1)])).expect("valid graph");
    assert_eq!(result.component_count(), 1);
    assert_eq!(result.edges().len(), 1);
    assert_eq!(result.edges()[0].source(), 0);
    assert_eq!(result.edges()[0].target(), 1);
}

#[test]
fn canonicalises_reversed_edges() {
    let result = kruskal(2, &edges(&[(1, 0, 2.0, 0)])).expect("valid graph");
    assert_eq!(result.edges()[0].source(), 0);
    assert_eq!(result.edges()[0].target(), 1);
}

#[test]
fn returns_expected_mst_on_unique_weights() {
    let graph = edges(&[
        (0, 1, 1.0, 0),
        (1, 2, 2.0, 1),
        (2, 3, 3.0, 2),
        (0, 2, 6.0, 3),
        (0, 3, 10.0, 4),
    ]);
    let expected = vec![
        MstEdge {
            source: 0,
            target: 1,
            weight: 1.0,
            sequence: 0,
        },
        MstEdge {
            source: 1,
            target: 2,
            weight: 2.0,
            sequence: 1,
        },
        MstEdge {
            source: 2,
            target: 3,
            weight: 3.0,
            sequence: 2,
        },
    ];

    let result = kruskal(4, &graph).expect("MST must succeed");
    assert!(result.is_tree());
    assert_eq!(result.edges(), expected.as_slice());
    assert!((result.total_weight() - 6.0).abs() < 1e-12);
}

#[rstest]
#[case::two_pairs(5, vec![(0, 1, 1.0, 0), (2, 3, 2.0, 1)], 3)]
#[case::isolated_nodes(3, vec![], 3)]
#[case::single_node(1, vec![], 1)]
fn returns_minimum_spanning_forest_for_disconnected_graph(
    #[case] node_count: usize,
    #[case] raw: Vec<(usize, usize, f64, u64)>,
    #[case] components: usize,
) {
    let result = kruskal(node_count, &edges(&raw)).expect("forest must succeed");
    assert_eq!(result.component_count(), components);
    assert_eq!(result.edges().len(), node_count - components);
    assert_eq!(check_forest_invariants(node_count, result.edges()), components);
}

#[test]
fn ties_prefer_lower_endpoint_ids() {
    let graph = edges(&[(1, 2, 1.0, 0), (0, 2, 1.0, 1), (0, 1, 1.0, 2)]);
    let result = kruskal(3, &graph).expect("MST must succeed");
    let pairs: Vec<(usize, usize)> = result
        .edges()
        .iter()
        .map(|edge| (edge.source(), edge.target()))
        .collect();
    assert_eq!(pairs, vec![(0, 1), (0, 2)]);
}

#[test]
fn skipping_an_edge_reroutes_the_tree() {
    let graph = edges(&[(0, 1, 1.0, 0), (1, 2, 2.0, 1), (0, 2, 4.0, 2)]);
    let sorted = SortedEdges::new(3, &graph).expect("valid graph");
    let full = sorted.spanning_forest(None);
    let removed = full.edges()[1];
    let position = sorted.position_of(&removed).expect("edge is present");
    let rerouted = sorted.spanning_forest(Some(position));
    assert!(rerouted.is_tree());
    assert!((rerouted.total_weight() - 5.0).abs() < 1e-12);
}

#[test]
fn matrix_zero_entries_are_not_edges() {
    let matrix = DistanceMatrix::try_new(
        vec!["a".into(), "b".into(), "c".into()],
        vec![0.0, 1.0, 0.0, 1.0, 0.0, 2.0, 0.0, 2.0, 0.0],
    )
    .expect("valid matrix");
    assert_eq!(matrix_edges(&matrix).len(), 2);
    let forest = matrix_spanning_forest(&matrix).expect("forest must succeed");
    assert!(forest.is_tree());
    assert_eq!(forest.edges().len(), 2);
}

fn random_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize, f64, u64)>)> {
    (2_usize..24).prop_flat_map(|node_count| {
        let edge = (0..node_count, 0..node_count, 0.01_f64..100.0);
        (
            Just(node_count),
            proptest::collection::vec(edge, 0..(node_count * 3)).prop_map(|raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(sequence, (source, target, weight))| {
                        (source, target, weight, sequence as u64)
                    })
                    .collect()
            }),
        )
    })
}

proptest! {
    #[test]
    fn forest_has_node_count_minus_components_edges((node_count, raw) in random_graph()) {
        let result = kruskal(node_count, &edges(&raw)).expect("valid graph");
        let components = check_forest_invariants(node_count, result.edges());
        prop_assert_eq!(components, result.component_count());
        prop_assert_eq!(result.edges().len(), node_count - components);
    }

    #[test]
    fn forest_is_independent_of_input_order((node_count, raw) in random_graph()) {
        let forward = kruskal(node_count, &edges(&raw)).expect("valid graph");
        let mut reversed_raw = raw.clone();
        reversed_raw.reverse();
        let reversed = kruskal(node_count, &edges(&reversed_raw)).expect("valid graph");
        prop_assert!((forward.total_weight() - reversed.total_weight()).abs() < 1e-9);
    }
}
