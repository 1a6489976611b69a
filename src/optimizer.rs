//! Single-technician route optimization.
//!
//! Builds the cost matrices, constructs a route with nearest-neighbor,
//! improves it with 2-opt and reports the savings against the order the
//! jobs were given in.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::matrix::{Cost, CostMatrices, UNREACHABLE, build_cost_matrices};
use crate::solver::{TourClosure, evaluate, nearest_neighbor, two_opt_improve};
use crate::traits::{DistanceMatrixProvider, Job, Location, TechnicianLocator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeOptions {
    pub closure: TourClosure,
    /// Upper bound on full 2-opt passes.
    pub max_passes: usize,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            closure: TourClosure::Open,
            max_passes: 100,
        }
    }
}

/// Travel totals of one visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub travel_time: Cost,
    pub distance: Cost,
}

impl Totals {
    pub fn of(order: &[usize], matrices: &CostMatrices) -> Self {
        Self {
            travel_time: evaluate(order, &matrices.durations),
            distance: evaluate(order, &matrices.distances),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Savings {
    pub time_seconds: i64,
    pub distance_meters: i64,
    pub percent_improvement: i64,
}

impl Savings {
    /// Baseline minus optimized. Deltas against an unreachable total are 0,
    /// as is the percentage when the baseline time is 0.
    pub fn compute(baseline: Totals, optimized: Totals) -> Self {
        let percent_improvement = if baseline.travel_time == 0
            || baseline.travel_time == UNREACHABLE
            || optimized.travel_time == UNREACHABLE
        {
            0
        } else {
            let delta = baseline.travel_time as f64 - optimized.travel_time as f64;
            (delta / baseline.travel_time as f64 * 100.0).round() as i64
        };

        Self {
            time_seconds: signed_delta(baseline.travel_time, optimized.travel_time),
            distance_meters: signed_delta(baseline.distance, optimized.distance),
            percent_improvement,
        }
    }
}

fn signed_delta(baseline: Cost, optimized: Cost) -> i64 {
    if baseline == UNREACHABLE || optimized == UNREACHABLE {
        return 0;
    }
    (i128::from(baseline) - i128::from(optimized)).clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Travel from the previous stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub duration_secs: Cost,
    pub distance_meters: Cost,
}

impl Leg {
    pub fn is_reachable(&self) -> bool {
        self.duration_secs != UNREACHABLE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Stop<Id> {
    /// The technician's starting point.
    Start,
    Job(Id),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteStop<Id> {
    pub stop: Stop<Id>,
    /// `None` for the first stop of the route.
    pub from_previous: Option<Leg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizationResult<Id> {
    pub optimized_order: Vec<Id>,
    pub total_travel_time: Cost,
    pub total_distance: Cost,
    /// Travel time of the jobs in the order given; `UNREACHABLE` when that
    /// order has a leg with no known route.
    pub baseline_travel_time: Cost,
    pub baseline_distance: Cost,
    pub savings: Savings,
    pub route: Vec<RouteStop<Id>>,
}

impl<Id: Clone> OptimizationResult<Id> {
    /// The input order with every cost and saving at zero.
    fn unchanged<J>(jobs: &[J], start: Option<&Location>) -> Self
    where
        J: Job<Id = Id>,
    {
        let route = start
            .map(|_| Stop::Start)
            .into_iter()
            .chain(jobs.iter().map(|job| Stop::Job(job.id().clone())))
            .map(|stop| RouteStop {
                stop,
                from_previous: None,
            })
            .collect();

        Self {
            optimized_order: jobs.iter().map(|job| job.id().clone()).collect(),
            total_travel_time: 0,
            total_distance: 0,
            baseline_travel_time: 0,
            baseline_distance: 0,
            savings: Savings::default(),
            route,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DegradedReason {
    ProviderUnavailable { message: String },
}

/// Outcome of one route optimization.
///
/// Every variant carries a usable result; only `Optimized` reflects an
/// actual search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Optimization<Id> {
    Optimized(OptimizationResult<Id>),
    /// Fewer than two jobs, nothing to decide.
    Trivial(OptimizationResult<Id>),
    /// Travel data was unavailable; the input order is returned as is.
    Degraded {
        result: OptimizationResult<Id>,
        reason: DegradedReason,
    },
}

impl<Id> Optimization<Id> {
    pub fn result(&self) -> &OptimizationResult<Id> {
        match self {
            Optimization::Optimized(result) | Optimization::Trivial(result) => result,
            Optimization::Degraded { result, .. } => result,
        }
    }

    pub fn into_result(self) -> OptimizationResult<Id> {
        match self {
            Optimization::Optimized(result) | Optimization::Trivial(result) => result,
            Optimization::Degraded { result, .. } => result,
        }
    }

    pub fn is_optimized(&self) -> bool {
        matches!(self, Optimization::Optimized(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Optimization::Degraded { .. })
    }
}

/// Orders `jobs` to minimize travel time.
///
/// With a `start`, the route begins there and the baseline is the start
/// followed by the jobs in input order. Without one, the first job is the
/// fixed start.
pub fn optimize_route<J, M>(
    jobs: &[J],
    start: Option<&Location>,
    provider: &M,
    options: &OptimizeOptions,
) -> Optimization<J::Id>
where
    J: Job,
    M: DistanceMatrixProvider + ?Sized,
{
    if jobs.len() < 2 {
        return Optimization::Trivial(OptimizationResult::unchanged(jobs, start));
    }

    let locations: Vec<Location> = jobs.iter().map(|job| job.location().clone()).collect();
    let matrices = match build_cost_matrices(&locations, start, provider) {
        Ok(matrices) => matrices,
        Err(err) => {
            warn!(error = %err, jobs = jobs.len(), "travel matrix unavailable, keeping original order");
            return Optimization::Degraded {
                result: OptimizationResult::unchanged(jobs, start),
                reason: DegradedReason::ProviderUnavailable {
                    message: err.to_string(),
                },
            };
        }
    };

    let offset = usize::from(start.is_some());
    let baseline_order: Vec<usize> = (0..matrices.size()).collect();
    let baseline = Totals::of(&baseline_order, &matrices);

    let constructed = nearest_neighbor(&matrices.durations, 0);
    let improved = two_opt_improve(constructed.clone(), &matrices.durations, options.closure, options.max_passes);
    let improved_totals = Totals::of(&improved, &matrices);

    // Closed-tour scoring or a poor greedy start can leave the heuristic
    // behind a simpler order. Ties go to the later candidate.
    let mut order = baseline_order;
    let mut totals = baseline;
    for candidate in [constructed, improved] {
        let candidate_totals = Totals::of(&candidate, &matrices);
        if candidate_totals.travel_time <= totals.travel_time {
            order = candidate;
            totals = candidate_totals;
        }
    }
    if totals.travel_time < improved_totals.travel_time {
        debug!(
            improved = improved_totals.travel_time,
            kept = totals.travel_time,
            "2-opt order is slower than a simpler order, keeping the faster one"
        );
    }

    let savings = Savings::compute(baseline, totals);
    debug!(
        jobs = jobs.len(),
        baseline_secs = baseline.travel_time,
        optimized_secs = totals.travel_time,
        percent = savings.percent_improvement,
        "route optimized"
    );

    let route = order
        .iter()
        .enumerate()
        .map(|(position, &index)| RouteStop {
            stop: if index < offset {
                Stop::Start
            } else {
                Stop::Job(jobs[index - offset].id().clone())
            },
            from_previous: (position > 0).then(|| {
                let previous = order[position - 1];
                Leg {
                    duration_secs: matrices.durations.get(previous, index),
                    distance_meters: matrices.distances.get(previous, index),
                }
            }),
        })
        .collect();

    let optimized_order = order
        .iter()
        .filter(|&&index| index >= offset)
        .map(|&index| jobs[index - offset].id().clone())
        .collect();

    Optimization::Optimized(OptimizationResult {
        optimized_order,
        total_travel_time: totals.travel_time,
        total_distance: totals.distance,
        baseline_travel_time: baseline.travel_time,
        baseline_distance: baseline.distance,
        savings,
        route,
    })
}

/// Picks the starting point: an explicit location wins, then the
/// technician's current position, else none.
pub fn resolve_start<L>(
    technician_id: &L::TechnicianId,
    explicit: Option<&Location>,
    locator: &L,
) -> Option<Location>
where
    L: TechnicianLocator + ?Sized,
{
    if let Some(location) = explicit {
        return Some(location.clone());
    }
    let current = locator.current_location(technician_id).map(Location::Coordinates);
    if current.is_none() {
        debug!("technician location unknown, first job is the start");
    }
    current
}

/// Resolves the technician's start and optimizes their jobs.
pub fn optimize_technician_route<J, M, L>(
    technician_id: &L::TechnicianId,
    jobs: &[J],
    explicit_start: Option<&Location>,
    locator: &L,
    provider: &M,
    options: &OptimizeOptions,
) -> Optimization<J::Id>
where
    J: Job,
    M: DistanceMatrixProvider + ?Sized,
    L: TechnicianLocator + ?Sized,
{
    if jobs.len() < 2 {
        return optimize_route(jobs, explicit_start, provider, options);
    }
    let start = resolve_start(technician_id, explicit_start, locator);
    optimize_route(jobs, start.as_ref(), provider, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_savings_math() {
        let baseline = Totals {
            travel_time: 1000,
            distance: 5000,
        };
        let optimized = Totals {
            travel_time: 800,
            distance: 4500,
        };
        let savings = Savings::compute(baseline, optimized);
        assert_eq!(savings.time_seconds, 200);
        assert_eq!(savings.distance_meters, 500);
        assert_eq!(savings.percent_improvement, 20);
    }

    #[test]
    fn test_savings_zero_baseline() {
        let savings = Savings::compute(Totals::default(), Totals::default());
        assert_eq!(savings, Savings::default());
    }

    #[test]
    fn test_savings_rounds_percent() {
        let savings = Savings::compute(
            Totals {
                travel_time: 38,
                distance: 0,
            },
            Totals {
                travel_time: 30,
                distance: 0,
            },
        );
        assert_eq!(savings.percent_improvement, 21);
    }

    #[test]
    fn test_savings_against_unreachable() {
        let savings = Savings::compute(
            Totals {
                travel_time: UNREACHABLE,
                distance: UNREACHABLE,
            },
            Totals {
                travel_time: 10,
                distance: 10,
            },
        );
        assert_eq!(savings, Savings::default());
    }

    #[test]
    fn test_negative_distance_savings() {
        let savings = Savings::compute(
            Totals {
                travel_time: 100,
                distance: 1000,
            },
            Totals {
                travel_time: 90,
                distance: 1200,
            },
        );
        assert_eq!(savings.distance_meters, -200);
        assert_eq!(savings.percent_improvement, 10);
    }
}
