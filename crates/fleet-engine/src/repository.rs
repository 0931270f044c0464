//! The reservation store the engine polls.
//!
//! [`ReservationRepository`] is the only seam between the engine and storage.
//! Queries are synchronous; failures come back as [`RepositoryError`] and are
//! passed through to the caller untouched.

use chrono::{DateTime, Duration, Utc};

use crate::error::RepositoryError;
use crate::model::{
    ChargingReservation, ChargingReservationId, DrivingReservation, NewChargingReservation,
    NewDrivingReservation, ReservationId, Vehicle, VehicleId,
};

pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Restricts which qualifying charges are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeBound {
    /// Charges with `end_time <= t`.
    EndingBy(DateTime<Utc>),
    /// Charges with `start_time >= t`.
    StartingFrom(DateTime<Utc>),
}

impl ChargeBound {
    pub fn admits(&self, charge: &ChargingReservation) -> bool {
        match *self {
            ChargeBound::EndingBy(t) => charge.end_time <= t,
            ChargeBound::StartingFrom(t) => charge.start_time >= t,
        }
    }
}

pub trait ReservationRepository {
    fn vehicle(&self, id: VehicleId) -> RepoResult<Option<Vehicle>>;

    /// Driving reservations whose span overlaps `[start, end)`.
    fn reservations_overlapping(
        &self,
        vehicle_id: VehicleId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> RepoResult<Vec<DrivingReservation>>;

    /// Charging reservations whose span overlaps `[start, end)`.
    fn charging_reservations_overlapping(
        &self,
        vehicle_id: VehicleId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<ChargingReservationId>,
    ) -> RepoResult<Vec<ChargingReservation>>;

    /// Driving reservations lying entirely inside `[range_start, range_end]`.
    fn driving_reservations_in_range(
        &self,
        vehicle_id: VehicleId,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> RepoResult<Vec<DrivingReservation>>;

    /// Charging reservations lasting at least `min_duration`, optionally bounded.
    fn qualifying_charging_reservations(
        &self,
        vehicle_id: VehicleId,
        min_duration: Duration,
        bound: Option<ChargeBound>,
    ) -> RepoResult<Vec<ChargingReservation>>;

    /// Total distance of `reservations`; zero for an empty slice.
    fn sum_distance(&self, reservations: &[DrivingReservation]) -> u64 {
        reservations.iter().map(|r| u64::from(r.distance)).sum()
    }

    fn driving_reservation(&self, id: ReservationId) -> RepoResult<Option<DrivingReservation>>;

    fn charging_reservation(
        &self,
        id: ChargingReservationId,
    ) -> RepoResult<Option<ChargingReservation>>;

    fn create_driving_reservation(
        &self,
        new: NewDrivingReservation,
    ) -> RepoResult<DrivingReservation>;

    /// Replaces the stored fields; `None` when `id` does not exist.
    fn update_driving_reservation(
        &self,
        id: ReservationId,
        new: NewDrivingReservation,
    ) -> RepoResult<Option<DrivingReservation>>;

    /// Returns whether a reservation was removed.
    fn delete_driving_reservation(&self, id: ReservationId) -> RepoResult<bool>;

    fn create_charging_reservation(
        &self,
        new: NewChargingReservation,
    ) -> RepoResult<ChargingReservation>;

    fn update_charging_reservation(
        &self,
        id: ChargingReservationId,
        new: NewChargingReservation,
    ) -> RepoResult<Option<ChargingReservation>>;

    fn delete_charging_reservation(&self, id: ChargingReservationId) -> RepoResult<bool>;
}
