//! Test fixtures for route-optimizer.
//!
//! Provides:
//! - Real Las Vegas / Henderson customer sites
//! - Job and appointment builders
//! - Table-driven and failing matrix providers, a locator and an in-memory
//!   schedule store

#![allow(dead_code)]

pub mod service_area;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;

use route_optimizer::error::{ProviderError, StoreError};
use route_optimizer::matrix::{Cost, UNREACHABLE};
use route_optimizer::traits::{
    Appointment, AppointmentSlot, CellStatus, Coordinates, DistanceMatrixProvider, Job, Location, MatrixCell, MatrixRequest,
    ProviderMatrix, ScheduleStore, TechnicianLocator,
};

// ============================================================================
// Jobs
// ============================================================================

#[derive(Debug, Clone)]
pub struct TestJob {
    pub id: String,
    pub location: Location,
}

impl TestJob {
    /// A job at a named place known to [`TableProvider`].
    pub fn at(id: &str, place: &str) -> Self {
        Self {
            id: id.to_string(),
            location: Location::Address(place.to_string()),
        }
    }

    pub fn coords(id: &str, lat: f64, lng: f64) -> Self {
        Self {
            id: id.to_string(),
            location: Location::Coordinates(Coordinates::new(lat, lng)),
        }
    }
}

impl Job for TestJob {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn location(&self) -> &Location {
        &self.location
    }
}

pub fn ids(jobs: &[TestJob]) -> Vec<String> {
    jobs.iter().map(|job| job.id.clone()).collect()
}

// ============================================================================
// Providers
// ============================================================================

/// Serves durations from a fixed table keyed by place name. Distances are
/// durations times `distance_factor`; an `UNREACHABLE` entry comes back as a
/// `ZERO_RESULTS` cell. An unknown place fails the request.
pub struct TableProvider {
    places: Vec<String>,
    durations: Vec<Vec<Cost>>,
    distance_factor: Cost,
    calls: AtomicUsize,
}

impl TableProvider {
    pub fn new(places: &[&str], durations: Vec<Vec<Cost>>) -> Self {
        assert_eq!(places.len(), durations.len());
        Self {
            places: places.iter().map(|p| p.to_string()).collect(),
            durations,
            distance_factor: 10,
            calls: AtomicUsize::new(0),
        }
    }

    /// Corners of a square, clockwise: 10 along a side, 14 across.
    pub fn square() -> Self {
        Self::new(
            &["nw", "ne", "se", "sw"],
            vec![
                vec![0, 10, 14, 10],
                vec![10, 0, 10, 14],
                vec![14, 10, 0, 10],
                vec![10, 14, 10, 0],
            ],
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn index_of(&self, location: &Location) -> Result<usize, ProviderError> {
        let name = location.to_string();
        self.places
            .iter()
            .position(|place| *place == name)
            .ok_or(ProviderError::UnsupportedLocation(name))
    }
}

impl DistanceMatrixProvider for TableProvider {
    fn matrix_for(&self, request: &MatrixRequest<'_>) -> Result<ProviderMatrix, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let indices = request
            .locations
            .iter()
            .map(|location| self.index_of(location))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = indices
            .iter()
            .map(|&from| {
                indices
                    .iter()
                    .map(|&to| match self.durations[from][to] {
                        UNREACHABLE => MatrixCell::unreachable(CellStatus::ZeroResults),
                        secs => MatrixCell::ok(secs, secs * self.distance_factor),
                    })
                    .collect()
            })
            .collect();
        Ok(ProviderMatrix { rows })
    }
}

/// A provider that is always over quota.
#[derive(Default)]
pub struct FailingProvider {
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DistanceMatrixProvider for FailingProvider {
    fn matrix_for(&self, _request: &MatrixRequest<'_>) -> Result<ProviderMatrix, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Status {
            status: "OVER_QUERY_LIMIT".to_string(),
            message: "quota exceeded".to_string(),
        })
    }
}

// ============================================================================
// Locator
// ============================================================================

#[derive(Default)]
pub struct MockLocator {
    positions: HashMap<String, Coordinates>,
}

impl MockLocator {
    pub fn with(mut self, technician: &str, lat: f64, lng: f64) -> Self {
        self.positions.insert(technician.to_string(), Coordinates::new(lat, lng));
        self
    }
}

impl TechnicianLocator for MockLocator {
    type TechnicianId = String;

    fn current_location(&self, technician_id: &String) -> Option<Coordinates> {
        self.positions.get(technician_id).copied()
    }
}

// ============================================================================
// Schedule store
// ============================================================================

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub fn at_hour(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
}

/// A recorded `update_slot` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotUpdate {
    pub appointment_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub optimized_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryStore {
    appointments: Vec<Appointment<String, String>>,
    slots: Mutex<HashMap<String, (DateTime<Utc>, DateTime<Utc>)>>,
    updates: Mutex<Vec<SlotUpdate>>,
    rejected: HashSet<String>,
    unavailable: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an appointment on [`day`] from `hour` lasting `minutes`.
    pub fn appointment(self, id: &str, technician: &str, hour: u32, minutes: i64, place: Option<&str>) -> Self {
        let location = place.map(|p| Location::Address(p.to_string()));
        self.located_appointment(id, technician, hour, minutes, location)
    }

    pub fn located_appointment(
        mut self,
        id: &str,
        technician: &str,
        hour: u32,
        minutes: i64,
        location: Option<Location>,
    ) -> Self {
        let start = at_hour(hour);
        let end = start + chrono::Duration::minutes(minutes);
        self.slots.lock().insert(id.to_string(), (start, end));
        self.appointments.push(Appointment {
            id: id.to_string(),
            technician_id: technician.to_string(),
            scheduled_start: start,
            scheduled_end: end,
            location,
        });
        self
    }

    /// Makes every write to `id` fail.
    pub fn rejecting(mut self, id: &str) -> Self {
        self.rejected.insert(id.to_string());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn slot(&self, id: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.slots.lock().get(id).copied()
    }

    pub fn updates(&self) -> Vec<SlotUpdate> {
        self.updates.lock().clone()
    }
}

impl ScheduleStore for InMemoryStore {
    type TechnicianId = String;
    type AppointmentId = String;

    fn appointments_for_day(
        &self,
        _company_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment<String, String>>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(self
            .appointments
            .iter()
            .filter(|a| a.scheduled_start.date_naive() == date)
            .cloned()
            .collect())
    }

    fn slots_for(&self, appointment_ids: &[String]) -> Result<Vec<AppointmentSlot<String>>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        let slots = self.slots.lock();
        Ok(appointment_ids
            .iter()
            .filter_map(|id| {
                slots.get(id).map(|&(start, end)| AppointmentSlot {
                    appointment_id: id.clone(),
                    start,
                    end,
                })
            })
            .collect())
    }

    fn update_slot(
        &self,
        appointment_id: &String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        optimized_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.rejected.contains(appointment_id) {
            return Err(StoreError::Rejected(format!("{appointment_id} is locked")));
        }
        self.slots.lock().insert(appointment_id.clone(), (start, end));
        self.updates.lock().push(SlotUpdate {
            appointment_id: appointment_id.clone(),
            start,
            end,
            optimized_at,
        });
        Ok(())
    }
}
