//! OSRM HTTP adapter for distance matrices.

use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::traits::{CellStatus, DistanceMatrixProvider, MatrixCell, MatrixRequest, ProviderMatrix};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl DistanceMatrixProvider for OsrmClient {
    fn matrix_for(&self, request: &MatrixRequest<'_>) -> Result<ProviderMatrix, ProviderError> {
        if request.locations.is_empty() {
            return Ok(ProviderMatrix::default());
        }

        // OSRM only routes coordinates, in lng,lat order.
        let coords = request
            .locations
            .iter()
            .map(|location| {
                location
                    .coordinates()
                    .map(|c| format!("{:.6},{:.6}", c.lng, c.lat))
                    .ok_or_else(|| ProviderError::UnsupportedLocation(location.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?
            .join(";");

        let url = format!(
            "{}/table/v1/{}/{}?annotations=duration,distance",
            self.config.base_url, self.config.profile, coords
        );

        debug!(locations = request.locations.len(), "requesting OSRM table");
        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmTableResponse>())?;

        body.into_matrix()
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    message: Option<String>,
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    fn into_matrix(self) -> Result<ProviderMatrix, ProviderError> {
        if self.code != "Ok" {
            return Err(ProviderError::Status {
                status: self.code,
                message: self.message.unwrap_or_default(),
            });
        }

        let durations = self.durations.unwrap_or_default();
        if durations.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        let distances = self.distances.unwrap_or_default();

        let rows = durations
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(j, duration)| {
                        let distance = distances.get(i).and_then(|r| r.get(j)).copied().flatten();
                        match duration {
                            Some(secs) => MatrixCell::ok(secs.round() as u64, distance.map_or(0, |m| m.round() as u64)),
                            None => MatrixCell::unreachable(CellStatus::ZeroResults),
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(ProviderMatrix { rows })
    }
}
