//! Range and energy-budget accounting.
//!
//! The budget at instant `T` is the seasonal range at `T` minus the distance of
//! every driving reservation lying inside `[last qualifying charge end, T]`.
//! Charges shorter than the vehicle's charging duration do not reset it.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::availability::Availability;
use crate::config::SeasonConfig;
use crate::error::Result;
use crate::model::{ReservationId, Vehicle};
use crate::repository::{ChargeBound, ReservationRepository};

/// Returned by [`Availability::last_qualifying_charge_before`] when the vehicle
/// has never been fully charged.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Returned by [`Availability::next_qualifying_charge_after`] when no full
/// charge is planned.
pub fn far_future() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Full-charge range of `vehicle` for the calendar month of `time`.
pub fn seasonal_range(vehicle: &Vehicle, time: DateTime<Utc>, season: &SeasonConfig) -> u32 {
    if season.is_summer(time) {
        vehicle.summer_range
    } else {
        vehicle.winter_range
    }
}

impl<R: ReservationRepository + ?Sized> Availability<'_, R> {
    pub fn seasonal_range(&self, vehicle: &Vehicle, time: DateTime<Utc>) -> u32 {
        seasonal_range(vehicle, time, &self.config.season)
    }

    /// End of the latest qualifying charge ending at or before `time`, or
    /// [`epoch`] if there is none.
    pub fn last_qualifying_charge_before(
        &self,
        vehicle: &Vehicle,
        time: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let charges = self.repo.qualifying_charging_reservations(
            vehicle.id,
            vehicle.charging_duration(),
            Some(ChargeBound::EndingBy(time)),
        )?;
        Ok(charges
            .iter()
            .map(|c| c.end_time)
            .max()
            .unwrap_or_else(epoch))
    }

    /// End of the earliest qualifying charge starting at or after `time`, or
    /// [`far_future`] if there is none.
    ///
    /// The end, not the start, is returned: the cycle that follows `time` runs
    /// until that charge has completed.
    pub fn next_qualifying_charge_after(
        &self,
        vehicle: &Vehicle,
        time: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let charges = self.repo.qualifying_charging_reservations(
            vehicle.id,
            vehicle.charging_duration(),
            Some(ChargeBound::StartingFrom(time)),
        )?;
        Ok(charges
            .iter()
            .min_by_key(|c| c.start_time)
            .map(|c| c.end_time)
            .unwrap_or_else(far_future))
    }

    /// Kilometres still available at `time`. Negative when the cycle is
    /// already overbooked.
    pub fn distance_left(
        &self,
        vehicle: &Vehicle,
        time: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> Result<i64> {
        let range = self.seasonal_range(vehicle, time);
        let last_charge = self.last_qualifying_charge_before(vehicle, time)?;
        let driven =
            self.repo
                .driving_reservations_in_range(vehicle.id, last_charge, time, exclude)?;
        let used = self.repo.sum_distance(&driven);
        let left = i64::from(range) - i64::try_from(used).unwrap_or(i64::MAX);
        debug!(
            vehicle = %vehicle.id,
            %time,
            %last_charge,
            range,
            used,
            left,
            "computed distance left"
        );
        Ok(left)
    }

    /// Whether the battery is effectively full at `time` (nothing driven since
    /// the last qualifying charge).
    pub fn is_fully_charged(&self, vehicle: &Vehicle, time: DateTime<Utc>) -> Result<bool> {
        let full = i64::from(self.seasonal_range(vehicle, time));
        Ok(self.distance_left(vehicle, time, None)? == full)
    }
}
