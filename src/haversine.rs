//! Haversine distance matrix provider (offline estimate).
//!
//! Uses great-circle distance and an assumed speed to estimate travel time.
//! Less accurate than a road network but needs no service.

use crate::error::ProviderError;
use crate::traits::{CellStatus, Coordinates, DistanceMatrixProvider, MatrixCell, MatrixRequest, ProviderMatrix};

/// Average urban driving speed assumption.
const DEFAULT_SPEED_KMH: f64 = 40.0;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine-based distance matrix provider.
///
/// Only coordinate locations can be estimated; pairs involving an address
/// or place id come back unreachable.
#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineMatrix {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Great-circle distance between two points in kilometers.
    pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
        let lat1_rad = from.lat.to_radians();
        let lat2_rad = to.lat.to_radians();
        let delta_lat = (to.lat - from.lat).to_radians();
        let delta_lng = (to.lng - from.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    fn km_to_seconds(&self, km: f64) -> u64 {
        let hours = km / self.speed_kmh;
        (hours * 3600.0).round() as u64
    }

    fn cell(&self, from: Option<Coordinates>, to: Option<Coordinates>) -> MatrixCell {
        match (from, to) {
            (Some(from), Some(to)) => {
                let km = Self::haversine_km(from, to);
                MatrixCell::ok(self.km_to_seconds(km), (km * 1000.0).round() as u64)
            }
            _ => MatrixCell::unreachable(CellStatus::NotFound),
        }
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, request: &MatrixRequest<'_>) -> Result<ProviderMatrix, ProviderError> {
        let points: Vec<Option<Coordinates>> = request.locations.iter().map(|l| l.coordinates()).collect();

        let rows = points
            .iter()
            .enumerate()
            .map(|(i, from)| {
                points
                    .iter()
                    .enumerate()
                    .map(|(j, to)| if i == j { MatrixCell::ok(0, 0) } else { self.cell(*from, *to) })
                    .collect()
            })
            .collect();

        Ok(ProviderMatrix { rows })
    }
}
