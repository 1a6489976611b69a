//! Route construction and improvement over a cost matrix.
//!
//! Routes are permutations of matrix indices. Position 0 is the fixed start
//! of the day and is never moved by the improver.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::matrix::{Cost, CostMatrix, UNREACHABLE};

/// How the 2-opt comparison treats the edge after the last stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourClosure {
    /// The day is a one-way path: there is no edge after the last stop.
    #[default]
    Open,
    /// Score moves as if the route returned to its first stop.
    Closed,
}

/// Sums the sequential edge costs of `order`, saturating at [`UNREACHABLE`].
pub fn evaluate(order: &[usize], matrix: &CostMatrix) -> Cost {
    order
        .windows(2)
        .fold(0, |total: Cost, edge| total.saturating_add(matrix.get(edge[0], edge[1])))
}

/// Greedy nearest-neighbor construction from `start`.
///
/// Ties go to the lowest index. Unreachable candidates are never chosen; if
/// every remaining candidate is unreachable, the rest are appended in index
/// order.
///
/// # Panics
///
/// Panics if `start` is out of bounds for a matrix with more than two rows.
pub fn nearest_neighbor(durations: &CostMatrix, start: usize) -> Vec<usize> {
    let n = durations.size();
    if n <= 2 {
        return (0..n).collect();
    }

    let mut visited = vec![false; n];
    let mut route = Vec::with_capacity(n);
    visited[start] = true;
    route.push(start);
    let mut current = start;

    while route.len() < n {
        let mut best: Option<(usize, Cost)> = None;
        for candidate in 0..n {
            if visited[candidate] {
                continue;
            }
            let cost = durations.get(current, candidate);
            if cost == UNREACHABLE {
                continue;
            }
            if best.is_none_or(|(_, best_cost)| cost < best_cost) {
                best = Some((candidate, cost));
            }
        }

        match best {
            Some((next, _)) => {
                visited[next] = true;
                route.push(next);
                current = next;
            }
            None => {
                warn!(
                    from = current,
                    remaining = n - route.len(),
                    "no reachable stop left, appending the rest in input order"
                );
                route.extend((0..n).filter(|&index| !visited[index]));
            }
        }
    }

    route
}

/// Cost of `route` as `closure` scores it: the open path, plus the edge back
/// to the first stop when closed.
fn tour_cost(route: &[usize], durations: &CostMatrix, closure: TourClosure) -> Cost {
    let path = evaluate(route, durations);
    match (closure, route.first(), route.last()) {
        (TourClosure::Closed, Some(&first), Some(&last)) if route.len() > 1 => {
            path.saturating_add(durations.get(last, first))
        }
        _ => path,
    }
}

/// First-improvement 2-opt: reverses `route[i+1..=j]` whenever that strictly
/// lowers the route's cost, until a full pass finds nothing or `max_passes`
/// is reached.
///
/// Candidates are scored on the whole route, so reversed inner edges count
/// on asymmetric matrices and a move never introduces an unreachable edge
/// into a finite route. The result never costs more than the input under
/// the same `closure`.
pub fn two_opt_improve(
    mut route: Vec<usize>,
    durations: &CostMatrix,
    closure: TourClosure,
    max_passes: usize,
) -> Vec<usize> {
    let len = route.len();
    if len < 3 {
        return route;
    }

    let mut cost = tour_cost(&route, durations, closure);
    let mut passes = 0;
    loop {
        if passes == max_passes {
            warn!(passes, "2-opt stopped before convergence");
            break;
        }
        passes += 1;

        let mut improved = false;
        for i in 0..len - 2 {
            for j in i + 2..len {
                if closure == TourClosure::Closed && i == 0 && j == len - 1 {
                    continue;
                }

                route[i + 1..=j].reverse();
                let candidate = tour_cost(&route, durations, closure);
                if candidate < cost {
                    cost = candidate;
                    improved = true;
                } else {
                    route[i + 1..=j].reverse();
                }
            }
        }

        if !improved {
            break;
        }
    }

    debug!(passes, stops = len, cost, "2-opt finished");
    route
}
