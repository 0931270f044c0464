//! Validate-and-commit for reservation mutations.
//!
//! Every mutation checks membership, then validates and writes while holding
//! the vehicle's lock, so two requests for the same vehicle can never both pass
//! validation against the same state. Requests for different vehicles proceed
//! in parallel.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::availability::Availability;
use crate::config::EngineConfig;
use crate::error::{FleetError, Result};
use crate::model::{
    ChargingReservation, ChargingReservationId, DrivingReservation, NewChargingReservation,
    NewDrivingReservation, ReservationId, Vehicle, VehicleId,
};
use crate::repository::ReservationRepository;

/// A committed driving reservation and what was done to make it fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub reservation: DrivingReservation,
    /// Charge inserted ahead of the reservation to restore range.
    pub inserted_charge: Option<ChargingReservation>,
    /// Human-readable notes for the caller.
    pub notices: Vec<String>,
}

pub struct ReservationService<R> {
    repo: R,
    config: EngineConfig,
    locks: DashMap<VehicleId, Arc<Mutex<()>>>,
}

impl<R: ReservationRepository> ReservationService<R> {
    pub fn new(repo: R, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            repo,
            config,
            locks: DashMap::new(),
        })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn availability(&self) -> Availability<'_, R> {
        Availability::new(&self.repo, &self.config)
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    fn with_vehicle_lock<T>(&self, vehicle: VehicleId, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.locks.entry(vehicle).or_default().clone();
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    fn authorized_vehicle(&self, user: &str, id: VehicleId) -> Result<Vehicle> {
        let vehicle = self.repo.vehicle(id)?.ok_or(FleetError::UnknownVehicle(id))?;
        if !vehicle.is_member(user) {
            warn!(%user, vehicle = %id, "user is not a member of vehicle");
            return Err(FleetError::NotPermitted {
                user: user.to_string(),
                vehicle: id,
            });
        }
        Ok(vehicle)
    }

    /// Books a driving reservation for `user`.
    ///
    /// When the only obstacle is range and auto-insertion is enabled, a charge
    /// is scheduled before the trip and validation is run again. If the trip
    /// still does not fit, the inserted charge is removed. A trip still short
    /// of range reports the original rejection; any other failure (such as a
    /// later reservation left without range) is reported as is.
    pub fn create_driving_reservation(
        &self,
        user: &str,
        mut new: NewDrivingReservation,
    ) -> Result<Booking> {
        let vehicle = self.authorized_vehicle(user, new.vehicle_id)?;
        new.owner = user.to_string();
        self.with_vehicle_lock(vehicle.id, || {
            self.place_driving(&vehicle, new, None, |repo, new| {
                Ok(repo.create_driving_reservation(new)?)
            })
        })
    }

    /// Replaces reservation `id`. Its owner is kept; moving it to another
    /// vehicle is refused.
    pub fn update_driving_reservation(
        &self,
        user: &str,
        id: ReservationId,
        mut new: NewDrivingReservation,
    ) -> Result<Booking> {
        let existing = self
            .repo
            .driving_reservation(id)?
            .ok_or(FleetError::ReservationNotFound(id))?;
        if existing.vehicle_id != new.vehicle_id {
            return Err(FleetError::VehicleMismatch {
                expected: existing.vehicle_id,
                found: new.vehicle_id,
            });
        }
        let vehicle = self.authorized_vehicle(user, existing.vehicle_id)?;
        new.owner = existing.owner;
        self.with_vehicle_lock(vehicle.id, || {
            self.place_driving(&vehicle, new, Some(id), |repo, new| {
                repo.update_driving_reservation(id, new)?
                    .ok_or(FleetError::ReservationNotFound(id))
            })
        })
    }

    /// Removes reservation `id`, freeing its interval. Nothing else changes.
    pub fn delete_driving_reservation(
        &self,
        user: &str,
        id: ReservationId,
    ) -> Result<DrivingReservation> {
        let existing = self
            .repo
            .driving_reservation(id)?
            .ok_or(FleetError::ReservationNotFound(id))?;
        let vehicle = self.authorized_vehicle(user, existing.vehicle_id)?;
        self.with_vehicle_lock(vehicle.id, || {
            if !self.repo.delete_driving_reservation(id)? {
                return Err(FleetError::ReservationNotFound(id));
            }
            info!(reservation = %id, vehicle = %vehicle.id, %user, "deleted driving reservation");
            Ok(existing)
        })
    }

    fn place_driving<F>(
        &self,
        vehicle: &Vehicle,
        new: NewDrivingReservation,
        exclude: Option<ReservationId>,
        commit: F,
    ) -> Result<Booking>
    where
        F: FnOnce(&R, NewDrivingReservation) -> Result<DrivingReservation>,
    {
        let availability = self.availability();
        let rejection = match availability.validate_driving_reservation(&new, exclude) {
            Ok(()) => {
                let reservation = commit(&self.repo, new)?;
                info!(reservation = %reservation.id, vehicle = %vehicle.id, "committed driving reservation");
                return Ok(Booking {
                    reservation,
                    inserted_charge: None,
                    notices: Vec::new(),
                });
            }
            Err(err @ FleetError::InsufficientRange { .. }) if self.config.auto_insert_charging => err,
            Err(err) => return Err(err),
        };

        let Some(charge) = self.insert_charge(vehicle, &new, exclude)? else {
            return Err(rejection);
        };

        let committed = availability
            .validate_driving_reservation(&new, exclude)
            .and_then(|()| commit(&self.repo, new));
        match committed {
            Ok(reservation) => {
                info!(
                    reservation = %reservation.id,
                    charge = %charge.id,
                    vehicle = %vehicle.id,
                    "committed driving reservation after inserting a charge"
                );
                let notice = format!(
                    "A charging reservation was added from {} to {}.",
                    charge.start_time, charge.end_time
                );
                Ok(Booking {
                    reservation,
                    inserted_charge: Some(charge),
                    notices: vec![notice],
                })
            }
            Err(err) => {
                self.repo.delete_charging_reservation(charge.id)?;
                debug!(charge = %charge.id, "rolled back inserted charge");
                match err {
                    FleetError::InsufficientRange { .. } => Err(rejection),
                    other => Err(other),
                }
            }
        }
    }

    /// Schedules a full charge ahead of `candidate` when it fails validation
    /// only for lack of range. Other reservations are not re-validated against
    /// the new charge.
    pub fn auto_insert_charging_reservation(
        &self,
        vehicle: VehicleId,
        candidate: &NewDrivingReservation,
    ) -> Result<Option<ChargingReservation>> {
        let vehicle = self
            .repo
            .vehicle(vehicle)?
            .ok_or(FleetError::UnknownVehicle(vehicle))?;
        self.with_vehicle_lock(vehicle.id, || {
            match self.availability().validate_driving_reservation(candidate, None) {
                Err(FleetError::InsufficientRange { .. }) => {
                    self.insert_charge(&vehicle, candidate, None)
                }
                Ok(()) => Ok(None),
                Err(err) if err.is_rejection() => Ok(None),
                Err(err) => Err(err),
            }
        })
    }

    /// Caller holds the vehicle lock.
    fn insert_charge(
        &self,
        vehicle: &Vehicle,
        candidate: &NewDrivingReservation,
        exclude: Option<ReservationId>,
    ) -> Result<Option<ChargingReservation>> {
        let availability = self.availability();
        let Some(start) = availability.find_charging_slot(vehicle, candidate.start_time, exclude)?
        else {
            return Ok(None);
        };

        let charge = NewChargingReservation {
            vehicle_id: vehicle.id,
            start_time: start,
            end_time: start + vehicle.charging_duration(),
        };
        match availability.validate_charging_reservation(&charge, None) {
            Ok(()) => {}
            Err(err) if err.is_rejection() => return Ok(None),
            Err(err) => return Err(err),
        }

        let stored = self.repo.create_charging_reservation(charge)?;
        info!(
            charge = %stored.id,
            vehicle = %vehicle.id,
            start = %stored.start_time,
            end = %stored.end_time,
            "inserted charging reservation"
        );
        Ok(Some(stored))
    }

    pub fn create_charging_reservation(
        &self,
        user: &str,
        new: NewChargingReservation,
    ) -> Result<ChargingReservation> {
        let vehicle = self.authorized_vehicle(user, new.vehicle_id)?;
        self.with_vehicle_lock(vehicle.id, || {
            self.availability().validate_charging_reservation(&new, None)?;
            let stored = self.repo.create_charging_reservation(new)?;
            info!(charge = %stored.id, vehicle = %vehicle.id, "committed charging reservation");
            Ok(stored)
        })
    }

    pub fn update_charging_reservation(
        &self,
        user: &str,
        id: ChargingReservationId,
        new: NewChargingReservation,
    ) -> Result<ChargingReservation> {
        let existing = self
            .repo
            .charging_reservation(id)?
            .ok_or(FleetError::ChargingReservationNotFound(id))?;
        if existing.vehicle_id != new.vehicle_id {
            return Err(FleetError::VehicleMismatch {
                expected: existing.vehicle_id,
                found: new.vehicle_id,
            });
        }
        let vehicle = self.authorized_vehicle(user, existing.vehicle_id)?;
        self.with_vehicle_lock(vehicle.id, || {
            self.availability()
                .validate_charging_reservation(&new, Some(id))?;
            let stored = self
                .repo
                .update_charging_reservation(id, new)?
                .ok_or(FleetError::ChargingReservationNotFound(id))?;
            info!(charge = %id, vehicle = %vehicle.id, "updated charging reservation");
            Ok(stored)
        })
    }

    pub fn delete_charging_reservation(
        &self,
        user: &str,
        id: ChargingReservationId,
    ) -> Result<ChargingReservation> {
        let existing = self
            .repo
            .charging_reservation(id)?
            .ok_or(FleetError::ChargingReservationNotFound(id))?;
        let vehicle = self.authorized_vehicle(user, existing.vehicle_id)?;
        self.with_vehicle_lock(vehicle.id, || {
            if !self.repo.delete_charging_reservation(id)? {
                return Err(FleetError::ChargingReservationNotFound(id));
            }
            info!(charge = %id, vehicle = %vehicle.id, %user, "deleted charging reservation");
            Ok(existing)
        })
    }
}
