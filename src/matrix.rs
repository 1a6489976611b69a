//! Cost matrices built from a distance matrix provider.

use tracing::{debug, warn};

use crate::error::MatrixError;
use crate::traits::{CellStatus, DistanceMatrixProvider, Location, MatrixRequest};

/// Travel cost: seconds for durations, meters for distances.
pub type Cost = u64;

/// Cost of an edge with no known route.
pub const UNREACHABLE: Cost = Cost::MAX;

/// Dense square matrix stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    data: Vec<Cost>,
    size: usize,
}

impl CostMatrix {
    /// Creates a matrix with every off-diagonal cell unreachable.
    pub fn unreachable(size: usize) -> Self {
        let mut data = vec![UNREACHABLE; size * size];
        for i in 0..size {
            data[i * size + i] = 0;
        }
        Self { data, size }
    }

    /// Creates a matrix from explicit rows. Returns `None` unless every row
    /// has exactly `rows.len()` entries.
    pub fn from_rows(rows: Vec<Vec<Cost>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            data: rows.into_iter().flatten().collect(),
            size,
        })
    }

    pub fn get(&self, from: usize, to: usize) -> Cost {
        self.data[from * self.size + to]
    }

    pub fn set(&mut self, from: usize, to: usize, cost: Cost) {
        self.data[from * self.size + to] = cost;
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Duration and distance matrices over the same index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrices {
    pub durations: CostMatrix,
    pub distances: CostMatrix,
}

impl CostMatrices {
    pub fn size(&self) -> usize {
        self.durations.size()
    }
}

/// Builds duration and distance matrices for `locations`.
///
/// When `start` is given it takes index 0 and location `k` takes index
/// `k + 1`. The provider is called once with the whole set; an empty set
/// never reaches the provider.
pub fn build_cost_matrices<M>(
    locations: &[Location],
    start: Option<&Location>,
    provider: &M,
) -> Result<CostMatrices, MatrixError>
where
    M: DistanceMatrixProvider + ?Sized,
{
    let points: Vec<Location> = start.into_iter().chain(locations).cloned().collect();
    let n = points.len();
    if n == 0 {
        return Ok(CostMatrices {
            durations: CostMatrix::unreachable(0),
            distances: CostMatrix::unreachable(0),
        });
    }

    let response = provider.matrix_for(&MatrixRequest::depart_now(&points))?;
    if response.rows.is_empty() {
        return Err(MatrixError::NoRows);
    }
    if response.rows.len() != n || response.rows.iter().any(|row| row.len() != n) {
        return Err(MatrixError::DimensionMismatch {
            expected: n,
            actual_rows: response.rows.len(),
            actual_cols: response.rows.iter().map(Vec::len).max().unwrap_or(0),
        });
    }

    let mut durations = CostMatrix::unreachable(n);
    let mut distances = CostMatrix::unreachable(n);
    let mut gaps = 0usize;

    for (i, row) in response.rows.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            if i == j {
                continue;
            }
            if cell.status == CellStatus::Ok {
                durations.set(i, j, cell.duration_secs);
                distances.set(i, j, cell.distance_meters);
            } else {
                gaps += 1;
            }
        }
    }

    if gaps > 0 {
        warn!(gaps, size = n, "matrix has unreachable pairs");
    }
    debug!(size = n, "cost matrices built");

    Ok(CostMatrices {
        durations,
        distances,
    })
}
