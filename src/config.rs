//! Engine configuration.

use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::cache::{CachedProvider, DEFAULT_CACHE_TTL};
use crate::error::ConfigError;
use crate::google::{GoogleConfig, GoogleMatrixClient};
use crate::haversine::HaversineMatrix;
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::roster::RosterOptions;
use crate::solver::TourClosure;
use crate::traits::DistanceMatrixProvider;

/// A provider usable from the roster worker pool.
pub type SharedProvider = Box<dyn DistanceMatrixProvider + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    Osrm,
    Haversine,
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(ProviderKind::Google),
            "osrm" => Ok(ProviderKind::Osrm),
            "haversine" => Ok(ProviderKind::Haversine),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub provider: ProviderKind,
    pub google: GoogleConfig,
    pub osrm: OsrmConfig,
    pub cache_ttl: Duration,
    pub roster: RosterOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Google,
            google: GoogleConfig::default(),
            osrm: OsrmConfig::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            roster: RosterOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("ROUTE_PROVIDER") {
            config.provider = value.parse().map_err(|_| ConfigError::Invalid {
                name: "ROUTE_PROVIDER",
                value,
            })?;
        }

        if let Some(timeout) = parse_var::<u64, _>(&lookup, "PROVIDER_TIMEOUT_SECS")? {
            config.google.timeout_secs = timeout;
            config.osrm.timeout_secs = timeout;
        }

        config.google.api_key = lookup("GOOGLE_MAPS_API_KEY").unwrap_or_default();
        if config.provider == ProviderKind::Google && config.google.api_key.is_empty() {
            return Err(ConfigError::Missing("GOOGLE_MAPS_API_KEY"));
        }
        if let Some(url) = lookup("GOOGLE_MAPS_BASE_URL") {
            config.google.base_url = url;
        }
        if let Some(url) = lookup("OSRM_URL") {
            config.osrm.base_url = url;
        }
        if let Some(profile) = lookup("OSRM_PROFILE") {
            config.osrm.profile = profile;
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "ROUTE_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(limit) = parse_var::<usize, _>(&lookup, "ROUTE_MAX_CONCURRENCY")? {
            if limit == 0 {
                return Err(ConfigError::Invalid {
                    name: "ROUTE_MAX_CONCURRENCY",
                    value: limit.to_string(),
                });
            }
            config.roster.max_concurrency = limit;
        }

        if let Some(value) = lookup("ROUTE_TOUR_CLOSURE") {
            config.roster.optimize.closure = match value.trim().to_ascii_lowercase().as_str() {
                "open" => TourClosure::Open,
                "closed" => TourClosure::Closed,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "ROUTE_TOUR_CLOSURE",
                        value,
                    });
                }
            };
        }

        Ok(config)
    }

    /// Builds the configured provider behind the response cache.
    pub fn build_provider(&self) -> Result<CachedProvider<SharedProvider>, ConfigError> {
        let provider: SharedProvider = match self.provider {
            ProviderKind::Google => Box::new(GoogleMatrixClient::new(self.google.clone())?),
            ProviderKind::Osrm => Box::new(OsrmClient::new(self.osrm.clone())?),
            ProviderKind::Haversine => Box::new(HaversineMatrix::default()),
        };
        info!(provider = ?self.provider, cache_ttl_secs = self.cache_ttl.as_secs(), "distance matrix provider ready");
        Ok(CachedProvider::new(provider, self.cache_ttl))
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}
