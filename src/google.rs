//! Google Distance Matrix HTTP adapter.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::traits::{CellStatus, DistanceMatrixProvider, MatrixCell, MatrixRequest, ProviderMatrix};

/// Documented per-request element limit of the Distance Matrix API.
const MAX_ELEMENTS_PER_REQUEST: usize = 100;

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://maps.googleapis.com".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleMatrixClient {
    config: GoogleConfig,
    client: reqwest::blocking::Client,
}

impl GoogleMatrixClient {
    pub fn new(config: GoogleConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured("Google Maps API key".to_string()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl DistanceMatrixProvider for GoogleMatrixClient {
    fn matrix_for(&self, request: &MatrixRequest<'_>) -> Result<ProviderMatrix, ProviderError> {
        let n = request.locations.len();
        if n == 0 {
            return Ok(ProviderMatrix::default());
        }
        if n * n > MAX_ELEMENTS_PER_REQUEST {
            warn!(
                elements = n * n,
                limit = MAX_ELEMENTS_PER_REQUEST,
                "distance matrix request exceeds the per-request element limit"
            );
        }

        let places = request
            .locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|");
        let params = [
            ("origins", places.clone()),
            ("destinations", places),
            ("mode", request.mode.as_str().to_string()),
            ("departure_time", request.departure_time.to_string()),
            ("key", self.config.api_key.clone()),
        ];

        debug!(locations = n, "requesting distance matrix");
        let body = self
            .client
            .get(format!("{}/maps/api/distancematrix/json", self.config.base_url))
            .query(&params)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<GoogleMatrixResponse>())?;

        body.into_matrix()
    }
}

#[derive(Debug, Deserialize)]
struct GoogleMatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<GoogleRow>,
}

#[derive(Debug, Deserialize)]
struct GoogleRow {
    #[serde(default)]
    elements: Vec<GoogleElement>,
}

#[derive(Debug, Deserialize)]
struct GoogleElement {
    status: CellStatus,
    distance: Option<GoogleValue>,
    duration: Option<GoogleValue>,
    duration_in_traffic: Option<GoogleValue>,
}

#[derive(Debug, Deserialize)]
struct GoogleValue {
    value: u64,
}

impl GoogleMatrixResponse {
    fn into_matrix(self) -> Result<ProviderMatrix, ProviderError> {
        if self.status != "OK" {
            return Err(ProviderError::Status {
                status: self.status,
                message: self.error_message.unwrap_or_default(),
            });
        }
        if self.rows.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        let rows = self
            .rows
            .into_iter()
            .map(|row| row.elements.into_iter().map(GoogleElement::into_cell).collect())
            .collect();
        Ok(ProviderMatrix { rows })
    }
}

impl GoogleElement {
    /// Traffic-aware duration wins when the API supplies one.
    fn into_cell(self) -> MatrixCell {
        if self.status != CellStatus::Ok {
            return MatrixCell::unreachable(self.status);
        }
        match self.duration_in_traffic.or(self.duration) {
            Some(duration) => MatrixCell::ok(duration.value, self.distance.map_or(0, |d| d.value)),
            None => MatrixCell::unreachable(CellStatus::Unknown),
        }
    }
}
