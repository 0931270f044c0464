//! Slot allocation checks for both reservation kinds.
//!
//! A driving reservation must be ordered, free, affordable at its start, and
//! must not starve the last reservation before the next full charge. A
//! charging reservation must be ordered, free, and long enough.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::availability::Availability;
use crate::error::{FleetError, Result};
use crate::interval::{overlap_minutes, overlaps};
use crate::model::{
    ChargingReservation, ChargingReservationId, DrivingReservation, NewChargingReservation,
    NewDrivingReservation, ReservationId, Vehicle, VehicleId,
};
use crate::repository::ReservationRepository;

/// A stored reservation of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Booked {
    Driving(DrivingReservation),
    Charging(ChargingReservation),
}

impl Booked {
    pub fn start_time(&self) -> DateTime<Utc> {
        match self {
            Booked::Driving(r) => r.start_time,
            Booked::Charging(c) => c.start_time,
        }
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        match self {
            Booked::Driving(r) => r.end_time,
            Booked::Charging(c) => c.end_time,
        }
    }
}

/// A stored reservation that collides with a requested span.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub with: Booked,
    pub overlap_minutes: i64,
}

impl<R: ReservationRepository + ?Sized> Availability<'_, R> {
    pub(crate) fn vehicle(&self, id: VehicleId) -> Result<Vehicle> {
        self.repo.vehicle(id)?.ok_or(FleetError::UnknownVehicle(id))
    }

    /// Every stored reservation on `vehicle` overlapping `[start, end)`,
    /// driving reservations first.
    pub fn conflicts(
        &self,
        vehicle: &Vehicle,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_reservation: Option<ReservationId>,
        exclude_charging: Option<ChargingReservationId>,
    ) -> Result<Vec<Conflict>> {
        let driving = self
            .repo
            .reservations_overlapping(vehicle.id, start, end, exclude_reservation)?;
        let charging = self
            .repo
            .charging_reservations_overlapping(vehicle.id, start, end, exclude_charging)?;

        // The store may over-approximate; the half-open rule decides.
        let conflicts = driving
            .into_iter()
            .map(Booked::Driving)
            .chain(charging.into_iter().map(Booked::Charging))
            .filter(|b| overlaps(b.start_time(), b.end_time(), start, end))
            .map(|b| Conflict {
                overlap_minutes: overlap_minutes(b.start_time(), b.end_time(), start, end),
                with: b,
            })
            .collect();
        Ok(conflicts)
    }

    /// True iff no reservation of either kind (other than the excluded ones)
    /// overlaps `[start, end)`.
    pub fn time_slot_free(
        &self,
        vehicle: &Vehicle,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_reservation: Option<ReservationId>,
        exclude_charging: Option<ChargingReservationId>,
    ) -> Result<bool> {
        Ok(self
            .conflicts(vehicle, start, end, exclude_reservation, exclude_charging)?
            .is_empty())
    }

    fn ensure_free(
        &self,
        vehicle: &Vehicle,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_reservation: Option<ReservationId>,
        exclude_charging: Option<ChargingReservationId>,
    ) -> Result<()> {
        let conflicts =
            self.conflicts(vehicle, start, end, exclude_reservation, exclude_charging)?;
        match conflicts.first() {
            None => Ok(()),
            Some(conflict) => Err(FleetError::Overlap {
                vehicle: vehicle.id,
                start: conflict.with.start_time(),
                end: conflict.with.end_time(),
            }),
        }
    }

    pub fn validate_driving_reservation(
        &self,
        candidate: &NewDrivingReservation,
        exclude: Option<ReservationId>,
    ) -> Result<()> {
        let result = self.check_driving(candidate, exclude);
        if let Err(err) = &result {
            warn!(vehicle = %candidate.vehicle_id, owner = %candidate.owner, %err, "driving reservation rejected");
        }
        result
    }

    fn check_driving(
        &self,
        candidate: &NewDrivingReservation,
        exclude: Option<ReservationId>,
    ) -> Result<()> {
        let vehicle = self.vehicle(candidate.vehicle_id)?;
        ensure_ordered(candidate.start_time, candidate.end_time)?;
        self.ensure_free(&vehicle, candidate.start_time, candidate.end_time, exclude, None)?;

        let available = self.distance_left(&vehicle, candidate.start_time, exclude)?;
        if available < i64::from(candidate.distance) {
            return Err(FleetError::InsufficientRange {
                at: candidate.start_time,
                requested: candidate.distance,
                available,
            });
        }

        self.check_downstream(&vehicle, candidate, exclude)
    }

    /// Only the latest-starting reservation before the next full charge is
    /// re-checked; it carries the whole cycle's consumption.
    fn check_downstream(
        &self,
        vehicle: &Vehicle,
        candidate: &NewDrivingReservation,
        exclude: Option<ReservationId>,
    ) -> Result<()> {
        let next_charge = self.next_qualifying_charge_after(vehicle, candidate.end_time)?;
        let downstream = self.repo.driving_reservations_in_range(
            vehicle.id,
            candidate.end_time,
            next_charge,
            exclude,
        )?;
        let Some(latest) = downstream.into_iter().max_by_key(|r| r.start_time) else {
            return Ok(());
        };

        let remaining =
            self.distance_left(vehicle, latest.end_time, exclude)? - i64::from(candidate.distance);
        if remaining < 0 {
            return Err(FleetError::CascadingConflict {
                reservation: latest.id,
                owner: latest.owner,
                location: latest.location,
                start: latest.start_time,
                end: latest.end_time,
                distance: latest.distance,
                remaining,
            });
        }
        Ok(())
    }

    pub fn validate_charging_reservation(
        &self,
        candidate: &NewChargingReservation,
        exclude: Option<ChargingReservationId>,
    ) -> Result<()> {
        let result = self.check_charging(candidate, exclude);
        if let Err(err) = &result {
            warn!(vehicle = %candidate.vehicle_id, %err, "charging reservation rejected");
        }
        result
    }

    fn check_charging(
        &self,
        candidate: &NewChargingReservation,
        exclude: Option<ChargingReservationId>,
    ) -> Result<()> {
        let vehicle = self.vehicle(candidate.vehicle_id)?;
        ensure_ordered(candidate.start_time, candidate.end_time)?;
        self.ensure_free(&vehicle, candidate.start_time, candidate.end_time, None, exclude)?;

        if candidate.end_time - candidate.start_time < vehicle.charging_duration() {
            return Err(FleetError::InsufficientDuration {
                start: candidate.start_time,
                end: candidate.end_time,
                required_hours: vehicle.charging_duration,
            });
        }
        Ok(())
    }
}

fn ensure_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start >= end {
        return Err(FleetError::Ordering { start, end });
    }
    Ok(())
}
