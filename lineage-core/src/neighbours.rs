//! Nearest-neighbour search between point sets.
//!
//! The mutual-nearest-neighbour distance model only needs two queries: the
//! `k` nearest members of a set to an arbitrary point, and the list of
//! mutually nearest pairs between two sets. [`NeighbourIndex`] captures the
//! first; [`mutual_nearest_neighbours`] builds the second on top of it.

use std::collections::HashSet;

use crate::distance::squared_euclidean;

/// A queryable nearest-neighbour index over a fixed set of points.
pub trait NeighbourIndex {
    /// Returns the number of indexed points.
    fn len(&self) -> usize;

    /// Returns `true` when the index holds no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the coordinates of member `index`.
    fn point(&self, index: usize) -> Option<&[f64]>;

    /// Returns up to `k` member indices in ascending distance from `query`,
    /// ties broken by lower member index.
    fn nearest(&self, query: &[f64], k: usize) -> Vec<usize>;
}

/// Exact brute-force index over a row-major buffer.
///
/// # Examples
/// ```
/// use lineage_core::{ExactIndex, NeighbourIndex};
///
/// let index = ExactIndex::new(1, vec![0.0, 5.0, 1.0]);
/// assert_eq!(index.nearest(&[0.9], 2), vec![2, 0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ExactIndex {
    dimension: usize,
    values: Vec<f64>,
}

impl ExactIndex {
    /// Indexes `values`, interpreted as rows of `dimension` coordinates.
    ///
    /// A trailing partial row is ignored.
    #[must_use]
    pub fn new(dimension: usize, values: Vec<f64>) -> Self {
        let usable = if dimension == 0 {
            0
        } else {
            values.len() - values.len() % dimension
        };
        let mut values = values;
        values.truncate(usable);
        Self { dimension, values }
    }
}

impl NeighbourIndex for ExactIndex {
    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.values.len() / self.dimension
        }
    }

    fn point(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.dimension)?;
        self.values.get(start..start.checked_add(self.dimension)?)
    }

    fn nearest(&self, query: &[f64], k: usize) -> Vec<usize> {
        let mut scored: Vec<(f64, usize)> = (0..self.len())
            .filter_map(|index| {
                self.point(index)
                    .map(|point| (squared_euclidean(point, query), index))
            })
            .collect();
        scored.sort_by(|left, right| {
            left.0.total_cmp(&right.0).then(left.1.cmp(&right.1))
        });
        scored.truncate(k);
        scored.into_iter().map(|(_, index)| index).collect()
    }
}

/// Lists every mutually nearest pair `(a, b)` with `a` in `left` and `b` in
/// `right`.
///
/// `b` must be among the `k` nearest members of `right` to `a`, and `a`
/// among the `k` nearest members of `left` to `b`. `k` is clamped to each
/// index's size. Pairs are returned in ascending `(a, b)` order.
///
/// # Examples
/// ```
/// use lineage_core::{ExactIndex, mutual_nearest_neighbours};
///
/// let left = ExactIndex::new(1, vec![0.0, 4.0]);
/// let right = ExactIndex::new(1, vec![5.0, 10.0]);
/// assert_eq!(mutual_nearest_neighbours(&left, &right, 1), vec![(1, 0)]);
/// ```
#[must_use]
pub fn mutual_nearest_neighbours<L, R>(left: &L, right: &R, k: usize) -> Vec<(usize, usize)>
where
    L: NeighbourIndex + ?Sized,
    R: NeighbourIndex + ?Sized,
{
    let towards_right = k.min(right.len());
    let towards_left = k.min(left.len());
    if towards_right == 0 || towards_left == 0 {
        return Vec::new();
    }

    let mut reverse: HashSet<(usize, usize)> = HashSet::new();
    for b in 0..right.len() {
        let Some(point) = right.point(b) else {
            continue;
        };
        for a in left.nearest(point, towards_left) {
            reverse.insert((a, b));
        }
    }

    let mut pairs = Vec::new();
    for a in 0..left.len() {
        let Some(point) = left.point(a) else {
            continue;
        };
        let mut forward = right.nearest(point, towards_right);
        forward.sort_unstable();
        pairs.extend(
            forward
                .into_iter()
                .filter(|&b| reverse.contains(&(a, b)))
                .map(|b| (a, b)),
        );
    }
    pairs
}
