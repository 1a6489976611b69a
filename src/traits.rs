//! Core domain traits and the collaborator interfaces of the engine.
//!
//! The engine never owns jobs, schedules or travel data. Callers implement
//! these traits for their own models and services.

use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, StoreError};

/// Unique identifier for engine entities.
pub trait Id: Clone + Eq + Hash {}

impl<T> Id for T where T: Clone + Eq + Hash {}

/// A `(latitude, longitude)` pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Where a job takes place, in whichever form the caller has it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Coordinates(Coordinates),
    Address(String),
    PlaceId(String),
}

impl Location {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Location::Coordinates(coords) => Some(*coords),
            _ => None,
        }
    }
}

impl From<Coordinates> for Location {
    fn from(coords: Coordinates) -> Self {
        Location::Coordinates(coords)
    }
}

/// Provider-facing form: `lat,lng`, the raw address, or `place_id:<id>`.
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Coordinates(c) => write!(f, "{:.6},{:.6}", c.lat, c.lng),
            Location::Address(address) => f.write_str(address),
            Location::PlaceId(id) => write!(f, "place_id:{}", id),
        }
    }
}

/// A single field-service job to be placed in a technician's day.
pub trait Job {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    fn location(&self) -> &Location;

    /// Currently scheduled start/end. The roster orders a technician's
    /// booked day by it; the heuristic never treats it as a constraint.
    fn scheduled_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Driving,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
        }
    }
}

/// A full pairwise matrix request: every location is both origin and
/// destination.
#[derive(Debug, Clone, Copy)]
pub struct MatrixRequest<'a> {
    pub locations: &'a [Location],
    pub mode: TravelMode,
    /// Departure hint as unix seconds ("now" for a live request).
    pub departure_time: i64,
}

impl<'a> MatrixRequest<'a> {
    pub fn depart_now(locations: &'a [Location]) -> Self {
        Self {
            locations,
            mode: TravelMode::Driving,
            departure_time: Utc::now().timestamp(),
        }
    }
}

/// Per-pair status reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellStatus {
    Ok,
    NotFound,
    ZeroResults,
    MaxRouteLengthExceeded,
    #[serde(other)]
    Unknown,
}

/// One origin/destination pair of a provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixCell {
    pub status: CellStatus,
    pub duration_secs: u64,
    pub distance_meters: u64,
}

impl MatrixCell {
    pub fn ok(duration_secs: u64, distance_meters: u64) -> Self {
        Self {
            status: CellStatus::Ok,
            duration_secs,
            distance_meters,
        }
    }

    pub fn unreachable(status: CellStatus) -> Self {
        Self {
            status,
            duration_secs: 0,
            distance_meters: 0,
        }
    }
}

/// Row-major provider response, `rows[origin][destination]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderMatrix {
    pub rows: Vec<Vec<MatrixCell>>,
}

/// Provides pairwise travel time and distance for a set of locations.
///
/// Called once per optimization request with the full location set.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, request: &MatrixRequest<'_>) -> Result<ProviderMatrix, ProviderError>;
}

impl<P> DistanceMatrixProvider for Box<P>
where
    P: DistanceMatrixProvider + ?Sized,
{
    fn matrix_for(&self, request: &MatrixRequest<'_>) -> Result<ProviderMatrix, ProviderError> {
        (**self).matrix_for(request)
    }
}

/// Looks up where a technician currently is, if known.
pub trait TechnicianLocator {
    type TechnicianId: Id;

    fn current_location(&self, technician_id: &Self::TechnicianId) -> Option<Coordinates>;
}

/// An appointment as read from the schedule store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment<T, A> {
    pub id: A,
    pub technician_id: T,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    /// Location of the linked job/property, if one is on file.
    pub location: Option<Location>,
}

/// A time slot currently held by an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSlot<A> {
    pub appointment_id: A,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Persistence of appointments and their scheduled time slots.
pub trait ScheduleStore {
    type TechnicianId: Id;
    type AppointmentId: Id;

    /// All scheduled appointments for a company on a day.
    fn appointments_for_day(
        &self,
        company_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Appointment<Self::TechnicianId, Self::AppointmentId>>, StoreError>;

    /// Current slots of the given appointments, in any order.
    fn slots_for(
        &self,
        appointment_ids: &[Self::AppointmentId],
    ) -> Result<Vec<AppointmentSlot<Self::AppointmentId>>, StoreError>;

    /// Moves one appointment to a new slot and stamps it as optimized.
    fn update_slot(
        &self,
        appointment_id: &Self::AppointmentId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        optimized_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
