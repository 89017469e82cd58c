use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use crate::domain::models::appointment::Appointment;
use crate::domain::models::work_schedule::WorkSchedule;

/// Candidate slots are aligned to a fixed 30-minute grid.
pub const SLOT_GRID_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

/// Half-open interval test: [a_start, a_end) and [b_start, b_end) overlap
/// iff a_start < b_end && b_start < a_end. Touching boundaries do not count.
pub fn overlaps(a_start: NaiveDateTime, a_end: NaiveDateTime, b_start: NaiveDateTime, b_end: NaiveDateTime) -> bool {
    a_start < b_end && b_start < a_end
}

/// Walks the employee's working window on `date` in grid steps and keeps
/// every slot of `duration_min` minutes that fits the window, does not
/// overlap an existing appointment, and starts strictly after `now`.
/// A slot ending exactly at the window's end is still bookable.
pub fn compute_slots(
    schedule: &WorkSchedule,
    date: NaiveDate,
    duration_min: i64,
    existing: &[Appointment],
    now: NaiveDateTime,
) -> Vec<Slot> {
    let mut slots = Vec::new();
    if !schedule.is_active {
        return slots;
    }

    let window_end = date.and_time(schedule.end_time);
    let duration = Duration::minutes(duration_min);
    let mut cursor = date.and_time(schedule.start_time);

    while cursor + duration <= window_end {
        let slot_end = cursor + duration;
        let taken = existing
            .iter()
            .any(|apt| overlaps(cursor, slot_end, apt.start_time, apt.end_time));

        if !taken && cursor > now {
            slots.push(Slot { start_time: cursor, end_time: slot_end });
        }

        cursor += Duration::minutes(SLOT_GRID_MINUTES);
    }

    slots
}
