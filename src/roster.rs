//! Roster-wide optimization: every technician's day, in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, NaiveDate, Utc};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RosterError;
use crate::matrix::Cost;
use crate::optimizer::{Optimization, OptimizeOptions, optimize_technician_route};
use crate::traits::{Appointment, DistanceMatrixProvider, Id, Job, Location, ScheduleStore, TechnicianLocator};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterOptions {
    /// Technicians optimized at the same time. Bounds concurrent provider
    /// requests.
    pub max_concurrency: usize,
    /// Shared start for every technician (e.g. the shop). Overrides the
    /// technicians' current locations when set.
    pub start: Option<Location>,
    pub optimize: OptimizeOptions,
}

impl Default for RosterOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            start: None,
            optimize: OptimizeOptions::default(),
        }
    }
}

/// Cooperative cancellation for a roster run. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Optimized,
    /// No travel data for this technician; figures are zero.
    Degraded,
}

/// One technician's line of the roster savings report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry<T, A> {
    pub technician_id: T,
    pub job_count: usize,
    /// Travel time of the booked order. `UNREACHABLE` when a booked leg has
    /// no known route; savings are then reported as 0.
    pub current_travel_time: Cost,
    pub optimized_travel_time: Cost,
    pub potential_savings: i64,
    pub percent_improvement: i64,
    pub status: EntryStatus,
    /// Appointment ids in suggested visiting order.
    pub optimized_order: Vec<A>,
}

/// An appointment with a known location, routable as a job.
struct RoutableAppointment<T, A> {
    appointment: Appointment<T, A>,
    location: Location,
}

impl<T: Id, A: Id> Job for RoutableAppointment<T, A> {
    type Id = A;

    fn id(&self) -> &A {
        &self.appointment.id
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn scheduled_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.appointment.scheduled_start, self.appointment.scheduled_end))
    }
}

/// Optimizes every technician with two or more located appointments on
/// `date` and reports the potential savings.
///
/// Technicians are processed on a pool of `options.max_concurrency`
/// threads. A technician whose travel data is unavailable gets a
/// `Degraded` entry without affecting the others. After `cancel` is set, no
/// further technicians are started and only finished entries are returned.
pub fn optimize_roster<S, M, L>(
    date: NaiveDate,
    company_id: &str,
    store: &S,
    provider: &M,
    locator: &L,
    options: &RosterOptions,
    cancel: &CancelFlag,
) -> Result<Vec<RosterEntry<S::TechnicianId, S::AppointmentId>>, RosterError>
where
    S: ScheduleStore,
    S::TechnicianId: Send + Sync,
    S::AppointmentId: Send + Sync,
    M: DistanceMatrixProvider + Sync + ?Sized,
    L: TechnicianLocator<TechnicianId = S::TechnicianId> + Sync + ?Sized,
{
    let appointments = store.appointments_for_day(company_id, date)?;
    let groups = group_by_technician(appointments);
    let eligible: Vec<_> = groups.into_iter().filter(|(_, jobs)| jobs.len() >= 2).collect();

    let technicians = eligible.len();
    debug!(%date, company_id, technicians, "optimizing roster");

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.max_concurrency.max(1))
        .build()?;

    let entries: Vec<_> = pool.install(|| {
        eligible
            .into_par_iter()
            .filter_map(|(technician_id, jobs)| {
                if cancel.is_cancelled() {
                    return None;
                }
                let outcome = optimize_technician_route(
                    &technician_id,
                    &jobs,
                    options.start.as_ref(),
                    locator,
                    provider,
                    &options.optimize,
                );
                Some(entry_for(technician_id, jobs.len(), outcome))
            })
            .collect()
    });

    let total_savings: i64 = entries.iter().map(|entry| entry.potential_savings).sum();
    let degraded = entries.iter().filter(|entry| entry.status == EntryStatus::Degraded).count();
    if cancel.is_cancelled() {
        warn!(
            completed = entries.len(),
            skipped = technicians - entries.len(),
            "roster optimization cancelled"
        );
    }
    info!(
        %date,
        company_id,
        technicians = entries.len(),
        degraded,
        total_savings_secs = total_savings,
        "roster optimization finished"
    );

    Ok(entries)
}

/// Groups located appointments per technician, in first-appearance order,
/// each group sorted by scheduled start.
fn group_by_technician<T: Id, A: Id>(
    appointments: Vec<Appointment<T, A>>,
) -> Vec<(T, Vec<RoutableAppointment<T, A>>)> {
    let mut index: HashMap<T, usize> = HashMap::new();
    let mut groups: Vec<(T, Vec<RoutableAppointment<T, A>>)> = Vec::new();
    let mut unlocated = 0usize;

    for appointment in appointments {
        let Some(location) = appointment.location.clone() else {
            unlocated += 1;
            continue;
        };
        let slot = *index.entry(appointment.technician_id.clone()).or_insert_with(|| {
            groups.push((appointment.technician_id.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(RoutableAppointment { appointment, location });
    }

    if unlocated > 0 {
        warn!(unlocated, "appointments without a location were left out");
    }

    for (_, jobs) in &mut groups {
        jobs.sort_by_key(|job| job.scheduled_window().map(|(start, _)| start));
    }
    groups
}

fn entry_for<T, A>(technician_id: T, job_count: usize, outcome: Optimization<A>) -> RosterEntry<T, A> {
    let status = if outcome.is_degraded() {
        EntryStatus::Degraded
    } else {
        EntryStatus::Optimized
    };
    let result = outcome.into_result();

    RosterEntry {
        technician_id,
        job_count,
        current_travel_time: result.baseline_travel_time,
        optimized_travel_time: result.total_travel_time,
        potential_savings: result.savings.time_seconds,
        percent_improvement: result.savings.percent_improvement,
        status,
        optimized_order: result.optimized_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn appointment(id: &str, technician: &str, hour: u32, located: bool) -> Appointment<String, String> {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap();
        Appointment {
            id: id.to_string(),
            technician_id: technician.to_string(),
            scheduled_start: start,
            scheduled_end: start + chrono::Duration::hours(1),
            location: located.then(|| Location::Address(format!("{id} street"))),
        }
    }

    #[test]
    fn test_grouping_keeps_first_appearance_and_sorts_by_start() {
        let groups = group_by_technician(vec![
            appointment("a3", "bob", 13, true),
            appointment("a1", "alice", 11, true),
            appointment("a2", "bob", 9, true),
            appointment("a4", "alice", 8, false),
        ]);

        let technicians: Vec<_> = groups.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(technicians, vec!["bob", "alice"]);
        let bob: Vec<_> = groups[0].1.iter().map(|j| j.id().as_str()).collect();
        assert_eq!(bob, vec!["a2", "a3"]);
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
