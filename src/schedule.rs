//! Applying an accepted order back onto the schedule.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ScheduleError;
use crate::traits::{Id, ScheduleStore};

/// Tally of a best-effort rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplySummary<A> {
    pub updated: usize,
    /// Appointments whose write failed, with the store's message.
    pub failed: Vec<(A, String)>,
}

impl<A> ApplySummary<A> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Reassigns the appointments' current slots to `optimized_order`: the
/// appointment at position `k` takes the `k`-th slot by original start.
///
/// Slot count and durations are unchanged. Each write is independent, so a
/// failed write is recorded and the rest still go through.
pub fn apply_order<S>(
    store: &S,
    appointment_ids: &[S::AppointmentId],
    optimized_order: &[S::AppointmentId],
) -> Result<ApplySummary<S::AppointmentId>, ScheduleError>
where
    S: ScheduleStore + ?Sized,
{
    apply_order_at(store, appointment_ids, optimized_order, Utc::now())
}

/// [`apply_order`] with an explicit "optimized at" stamp.
pub fn apply_order_at<S>(
    store: &S,
    appointment_ids: &[S::AppointmentId],
    optimized_order: &[S::AppointmentId],
    optimized_at: DateTime<Utc>,
) -> Result<ApplySummary<S::AppointmentId>, ScheduleError>
where
    S: ScheduleStore + ?Sized,
{
    if !is_permutation(appointment_ids, optimized_order) {
        return Err(ScheduleError::OrderMismatch);
    }

    let mut slots = store.slots_for(appointment_ids)?;
    if slots.len() != optimized_order.len() {
        return Err(ScheduleError::MissingSlots {
            expected: optimized_order.len(),
            actual: slots.len(),
        });
    }
    slots.sort_by_key(|slot| slot.start);

    let mut summary = ApplySummary {
        updated: 0,
        failed: Vec::new(),
    };

    for (appointment_id, slot) in optimized_order.iter().zip(&slots) {
        match store.update_slot(appointment_id, slot.start, slot.end, optimized_at) {
            Ok(()) => summary.updated += 1,
            Err(err) => {
                warn!(error = %err, "appointment slot update failed");
                summary.failed.push((appointment_id.clone(), err.to_string()));
            }
        }
    }

    debug!(
        updated = summary.updated,
        failed = summary.failed.len(),
        "optimized order applied"
    );
    Ok(summary)
}

fn is_permutation<A: Id>(ids: &[A], order: &[A]) -> bool {
    if ids.len() != order.len() {
        return false;
    }
    let expected: HashSet<&A> = ids.iter().collect();
    let seen: HashSet<&A> = order.iter().collect();
    expected.len() == ids.len() && seen == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[1, 2, 3], &[3, 1, 2]));
        assert!(!is_permutation(&[1, 2, 3], &[3, 1, 1]));
        assert!(!is_permutation(&[1, 2, 3], &[1, 2]));
        assert!(!is_permutation(&[1, 2, 4], &[1, 2, 3]));
        assert!(!is_permutation(&[1, 1, 2], &[1, 2, 2]));
        assert!(is_permutation::<u8>(&[], &[]));
    }
}
