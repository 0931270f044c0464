//! Backward search for a charging slot.
//!
//! Starting from the requested instant snapped down to the step grid, a window
//! of the vehicle's charging duration is slid backwards one step at a time
//! until it is free, it would start before the last qualifying charge, or it
//! leaves the search horizon. The first free window wins; the search is greedy
//! and bounded (72 h / 30 min = 144 probes with the default configuration).

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;
use tracing::debug;

use crate::availability::Availability;
use crate::error::Result;
use crate::model::{ReservationId, Vehicle};
use crate::repository::ReservationRepository;

/// Outcome of [`Availability::search_charging_slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "start", rename_all = "snake_case")]
pub enum SlotSearch {
    /// Nothing driven since the last full charge.
    NotNeeded,
    /// Recommended start of the charge.
    Found(DateTime<Utc>),
    /// No free window before the last charge or within the horizon.
    Exhausted,
}

impl SlotSearch {
    pub fn found(self) -> Option<DateTime<Utc>> {
        match self {
            SlotSearch::Found(start) => Some(start),
            SlotSearch::NotNeeded | SlotSearch::Exhausted => None,
        }
    }
}

/// Truncate `time` to the previous multiple of `step_minutes` within its hour.
///
/// With a 30 minute step, 11:47 becomes 11:30 and 11:12 becomes 11:00.
pub fn snap_to_grid(time: DateTime<Utc>, step_minutes: u32) -> DateTime<Utc> {
    let excess = time.minute() % step_minutes.max(1);
    time - Duration::minutes(i64::from(excess))
        - Duration::seconds(i64::from(time.second()))
        - Duration::nanoseconds(i64::from(time.nanosecond()))
}

impl<R: ReservationRepository + ?Sized> Availability<'_, R> {
    /// Nearest free charging window ending at or before `time`.
    ///
    /// The returned start lies one spacing interval before the free window that
    /// was found.
    pub fn search_charging_slot(
        &self,
        vehicle: &Vehicle,
        time: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> Result<SlotSearch> {
        if self.is_fully_charged(vehicle, time)? {
            return Ok(SlotSearch::NotNeeded);
        }

        let search = &self.config.slot_search;
        let last_charge = self.last_qualifying_charge_before(vehicle, time)?;
        let min_search = time - search.horizon();
        let step = search.step();

        let mut window_end = snap_to_grid(time, search.step_minutes);
        let mut window_start = window_end - vehicle.charging_duration();
        let mut probes = 0u32;

        while window_start > last_charge && window_start > min_search {
            probes += 1;
            if self.time_slot_free(vehicle, window_start, window_end, exclude, None)? {
                let slot = window_start - search.spacing();
                debug!(
                    vehicle = %vehicle.id,
                    %time,
                    %window_start,
                    %window_end,
                    %slot,
                    probes,
                    "found charging slot"
                );
                return Ok(SlotSearch::Found(slot));
            }
            window_start -= step;
            window_end -= step;
        }

        debug!(vehicle = %vehicle.id, %time, %last_charge, probes, "no charging slot in horizon");
        Ok(SlotSearch::Exhausted)
    }

    /// Recommended charge start before `time`, or `None` when no charge is
    /// needed or none fits.
    pub fn find_charging_slot(
        &self,
        vehicle: &Vehicle,
        time: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(self.search_charging_slot(vehicle, time, exclude)?.found())
    }
}
