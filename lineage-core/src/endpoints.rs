//! Leaf constraints on selected clusters.
//!
//! Each endpoint keeps exactly one finite distance, to its chosen partner,
//! and loses every other edge. The partner assignment minimises the total
//! retained distance and is found by depth-first branch-and-bound over the
//! endpoints in the order they were requested.

use std::sync::Arc;

use tracing::debug;

use crate::{
    distance::DistanceMatrix,
    error::{LineageError, Result},
};

/// Best complete assignment seen so far.
#[derive(Clone, Debug, PartialEq)]
struct Incumbent {
    cost: f64,
    partners: Vec<usize>,
}

/// Mutable state threaded through the recursive search.
#[derive(Debug)]
struct Search<'a> {
    matrix: &'a DistanceMatrix,
    endpoints: &'a [usize],
    /// Position of each node in `endpoints`, if it is one.
    slots: Vec<Option<usize>>,
    allow_dyads: bool,
    partners: Vec<usize>,
    best: Option<Incumbent>,
    branches: u64,
}

impl<'a> Search<'a> {
    fn new(matrix: &'a DistanceMatrix, endpoints: &'a [usize], allow_dyads: bool) -> Self {
        let mut slots = vec![None; matrix.len()];
        for (position, &node) in endpoints.iter().enumerate() {
            slots[node] = Some(position);
        }
        Self {
            matrix,
            endpoints,
            slots,
            allow_dyads,
            partners: Vec::with_capacity(endpoints.len()),
            best: None,
            branches: 0,
        }
    }

    fn descend(&mut self, step: usize, accumulated: f64) {
        self.branches += 1;
        if self
            .best
            .as_ref()
            .is_some_and(|best| accumulated > best.cost)
        {
            return;
        }
        let Some(&endpoint) = self.endpoints.get(step) else {
            if self.best.as_ref().is_none_or(|best| accumulated < best.cost) {
                self.best = Some(Incumbent {
                    cost: accumulated,
                    partners: self.partners.clone(),
                });
            }
            return;
        };

        // An earlier endpoint that picked this one forms a dyad with it.
        if let Some(earlier) = self.partners.iter().position(|&partner| partner == endpoint) {
            self.partners.push(self.endpoints[earlier]);
            self.descend(step + 1, accumulated);
            self.partners.pop();
            return;
        }

        for candidate in 0..self.matrix.len() {
            if !self.admits(step, endpoint, candidate) {
                continue;
            }
            self.partners.push(candidate);
            self.descend(step + 1, accumulated + self.matrix.get(endpoint, candidate));
            self.partners.pop();
        }
    }

    fn admits(&self, step: usize, endpoint: usize, candidate: usize) -> bool {
        if candidate == endpoint || self.matrix.get(endpoint, candidate) <= 0.0 {
            return false;
        }
        match self.slots[candidate] {
            None => true,
            Some(position) => {
                self.allow_dyads && position > step && !self.partners.contains(&candidate)
            }
        }
    }
}

/// Outcome of the endpoint search.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EndpointSolution {
    /// `(endpoint, partner)` pairs in request order.
    pub(crate) pairs: Vec<(usize, usize)>,
    pub(crate) cost: f64,
    pub(crate) branches: u64,
}

/// Finds the cheapest partner assignment for `endpoints`.
///
/// Returns `Ok(None)` when every node is an endpoint and there are at most
/// two nodes: such a matrix already satisfies the constraint.
pub(crate) fn solve(
    matrix: &DistanceMatrix,
    endpoints: &[usize],
    allow_dyads: bool,
) -> Result<Option<EndpointSolution>> {
    if endpoints.is_empty() || (endpoints.len() == matrix.len() && matrix.len() <= 2) {
        return Ok(None);
    }
    let mut search = Search::new(matrix, endpoints, allow_dyads);
    search.descend(0, 0.0);
    record_branches(search.branches);
    let branches = search.branches;
    let Some(best) = search.best else {
        return Err(LineageError::UnsatisfiableEndpoints {
            endpoints: endpoints
                .iter()
                .map(|&node| Arc::clone(&matrix.labels()[node]))
                .collect(),
        });
    };
    debug!(branches, cost = best.cost, "endpoint assignment found");
    Ok(Some(EndpointSolution {
        pairs: endpoints.iter().copied().zip(best.partners).collect(),
        cost: best.cost,
        branches,
    }))
}

/// Removes every edge of each endpoint except the one to its partner.
pub(crate) fn enforce(matrix: &DistanceMatrix, solution: &EndpointSolution) -> DistanceMatrix {
    let mut constrained = matrix.clone();
    for &(endpoint, partner) in &solution.pairs {
        for other in 0..constrained.len() {
            if other != endpoint && other != partner {
                constrained.set_symmetric(endpoint, other, 0.0);
            }
        }
    }
    constrained
}

#[cfg(feature = "metrics")]
fn record_branches(branches: u64) {
    metrics::counter!("lineage_endpoint_search_branches_total").increment(branches);
}

#[cfg(not(feature = "metrics"))]
fn record_branches(_branches: u64) {}
