//! In-process [`ReservationRepository`] backed by ordered maps.
//!
//! Used by the CLI (loaded from a [`FleetSnapshot`]) and by tests.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};

use crate::error::RepositoryError;
use crate::interval::overlaps;
use crate::model::{
    ChargingReservation, ChargingReservationId, DrivingReservation, FleetSnapshot,
    NewChargingReservation, NewDrivingReservation, ReservationId, Vehicle, VehicleId,
};
use crate::repository::{ChargeBound, RepoResult, ReservationRepository};

#[derive(Debug, Default)]
struct MemoryState {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    driving: BTreeMap<ReservationId, DrivingReservation>,
    charging: BTreeMap<ChargingReservationId, ChargingReservation>,
    next_driving_id: u64,
    next_charging_id: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot as-is. Stored reservations are not re-validated.
    pub fn from_snapshot(snapshot: FleetSnapshot) -> Self {
        let mut state = MemoryState::default();
        for vehicle in snapshot.vehicles {
            state.vehicles.insert(vehicle.id, vehicle);
        }
        for r in snapshot.driving {
            state.next_driving_id = state.next_driving_id.max(r.id.0);
            state.driving.insert(r.id, r);
        }
        for c in snapshot.charging {
            state.next_charging_id = state.next_charging_id.max(c.id.0);
            state.charging.insert(c.id, c);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn snapshot(&self) -> RepoResult<FleetSnapshot> {
        let state = self.read()?;
        Ok(FleetSnapshot {
            vehicles: state.vehicles.values().cloned().collect(),
            driving: state.driving.values().cloned().collect(),
            charging: state.charging.values().copied().collect(),
        })
    }

    pub fn insert_vehicle(&self, vehicle: Vehicle) -> RepoResult<()> {
        self.write()?.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| RepositoryError::Unavailable("in-memory store lock poisoned".into()))
    }
}

impl ReservationRepository for InMemoryRepository {
    fn vehicle(&self, id: VehicleId) -> RepoResult<Option<Vehicle>> {
        Ok(self.read()?.vehicles.get(&id).cloned())
    }

    fn reservations_overlapping(
        &self,
        vehicle_id: VehicleId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> RepoResult<Vec<DrivingReservation>> {
        let state = self.read()?;
        let mut found: Vec<_> = state
            .driving
            .values()
            .filter(|r| r.vehicle_id == vehicle_id && Some(r.id) != exclude)
            .filter(|r| overlaps(r.start_time, r.end_time, start, end))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.start_time);
        Ok(found)
    }

    fn charging_reservations_overlapping(
        &self,
        vehicle_id: VehicleId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<ChargingReservationId>,
    ) -> RepoResult<Vec<ChargingReservation>> {
        let state = self.read()?;
        let mut found: Vec<_> = state
            .charging
            .values()
            .filter(|c| c.vehicle_id == vehicle_id && Some(c.id) != exclude)
            .filter(|c| overlaps(c.start_time, c.end_time, start, end))
            .copied()
            .collect();
        found.sort_by_key(|c| c.start_time);
        Ok(found)
    }

    fn driving_reservations_in_range(
        &self,
        vehicle_id: VehicleId,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> RepoResult<Vec<DrivingReservation>> {
        let state = self.read()?;
        let mut found: Vec<_> = state
            .driving
            .values()
            .filter(|r| r.vehicle_id == vehicle_id && Some(r.id) != exclude)
            .filter(|r| r.span().lies_within(range_start, range_end))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.start_time);
        Ok(found)
    }

    fn qualifying_charging_reservations(
        &self,
        vehicle_id: VehicleId,
        min_duration: Duration,
        bound: Option<ChargeBound>,
    ) -> RepoResult<Vec<ChargingReservation>> {
        let state = self.read()?;
        let mut found: Vec<_> = state
            .charging
            .values()
            .filter(|c| c.vehicle_id == vehicle_id && c.qualifies(min_duration))
            .filter(|c| bound.is_none_or(|b| b.admits(c)))
            .copied()
            .collect();
        found.sort_by_key(|c| c.start_time);
        Ok(found)
    }

    fn driving_reservation(&self, id: ReservationId) -> RepoResult<Option<DrivingReservation>> {
        Ok(self.read()?.driving.get(&id).cloned())
    }

    fn charging_reservation(
        &self,
        id: ChargingReservationId,
    ) -> RepoResult<Option<ChargingReservation>> {
        Ok(self.read()?.charging.get(&id).copied())
    }

    fn create_driving_reservation(
        &self,
        new: NewDrivingReservation,
    ) -> RepoResult<DrivingReservation> {
        let mut state = self.write()?;
        state.next_driving_id += 1;
        let id = ReservationId(state.next_driving_id);
        let stored = DrivingReservation::from_new(id, new);
        state.driving.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_driving_reservation(
        &self,
        id: ReservationId,
        new: NewDrivingReservation,
    ) -> RepoResult<Option<DrivingReservation>> {
        let mut state = self.write()?;
        Ok(state.driving.get_mut(&id).map(|slot| {
            *slot = DrivingReservation::from_new(id, new);
            slot.clone()
        }))
    }

    fn delete_driving_reservation(&self, id: ReservationId) -> RepoResult<bool> {
        Ok(self.write()?.driving.remove(&id).is_some())
    }

    fn create_charging_reservation(
        &self,
        new: NewChargingReservation,
    ) -> RepoResult<ChargingReservation> {
        let mut state = self.write()?;
        state.next_charging_id += 1;
        let id = ChargingReservationId(state.next_charging_id);
        let stored = ChargingReservation::from_new(id, new);
        state.charging.insert(id, stored);
        Ok(stored)
    }

    fn update_charging_reservation(
        &self,
        id: ChargingReservationId,
        new: NewChargingReservation,
    ) -> RepoResult<Option<ChargingReservation>> {
        let mut state = self.write()?;
        Ok(state.charging.get_mut(&id).map(|slot| {
            *slot = ChargingReservation::from_new(id, new);
            *slot
        }))
    }

    fn delete_charging_reservation(&self, id: ChargingReservationId) -> RepoResult<bool> {
        Ok(self.write()?.charging.remove(&id).is_some())
    }
}
