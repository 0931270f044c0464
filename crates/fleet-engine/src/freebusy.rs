//! Free/busy calendar for one vehicle.
//!
//! Both reservation kinds are clipped to a window, merged into busy blocks, and
//! the gaps between blocks are reported as free windows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::availability::Availability;
use crate::conflict::Booked;
use crate::error::Result;
use crate::interval::overlaps;
use crate::model::Vehicle;
use crate::repository::ReservationRepository;

/// A merged busy period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusyBlock {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Driving reservations merged into this block.
    pub driving: usize,
    /// Charging reservations merged into this block.
    pub charging: usize,
}

/// A gap with nothing booked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl FreeWindow {
    fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleCalendar {
    /// Sorted by start, non-overlapping.
    pub busy: Vec<BusyBlock>,
    /// Sorted by start.
    pub free: Vec<FreeWindow>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Merge overlapping or adjacent bookings, clipped to the window.
fn merge_busy(
    bookings: &[Booked],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<BusyBlock> {
    let mut clipped: Vec<(DateTime<Utc>, DateTime<Utc>, bool)> = bookings
        .iter()
        .filter(|b| overlaps(b.start_time(), b.end_time(), window_start, window_end))
        .map(|b| {
            (
                b.start_time().max(window_start),
                b.end_time().min(window_end),
                matches!(b, Booked::Driving(_)),
            )
        })
        .collect();
    clipped.sort_by_key(|&(start, end, _)| (start, end));

    let mut merged: Vec<BusyBlock> = Vec::new();
    for (start, end, is_driving) in clipped {
        let (driving, charging) = if is_driving { (1, 0) } else { (0, 1) };
        if let Some(last) = merged.last_mut() {
            if start <= last.end {
                last.end = last.end.max(end);
                last.driving += driving;
                last.charging += charging;
                continue;
            }
        }
        merged.push(BusyBlock {
            start,
            end,
            driving,
            charging,
        });
    }
    merged
}

fn gaps(busy: &[BusyBlock], window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Vec<FreeWindow> {
    let mut free = Vec::new();
    let mut cursor = window_start;
    for block in busy {
        if cursor < block.start {
            free.push(FreeWindow::new(cursor, block.start));
        }
        cursor = cursor.max(block.end);
    }
    if cursor < window_end {
        free.push(FreeWindow::new(cursor, window_end));
    }
    free
}

impl<R: ReservationRepository + ?Sized> Availability<'_, R> {
    pub fn calendar(
        &self,
        vehicle: &Vehicle,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<VehicleCalendar> {
        if window_start >= window_end {
            return Ok(VehicleCalendar {
                busy: Vec::new(),
                free: Vec::new(),
                window_start,
                window_end,
            });
        }

        let bookings: Vec<Booked> = self
            .conflicts(vehicle, window_start, window_end, None, None)?
            .into_iter()
            .map(|c| c.with)
            .collect();
        let busy = merge_busy(&bookings, window_start, window_end);
        let free = gaps(&busy, window_start, window_end);

        Ok(VehicleCalendar {
            busy,
            free,
            window_start,
            window_end,
        })
    }

    /// Free windows of `vehicle` inside `[window_start, window_end)`.
    pub fn free_windows(
        &self,
        vehicle: &Vehicle,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<FreeWindow>> {
        Ok(self.calendar(vehicle, window_start, window_end)?.free)
    }
}
