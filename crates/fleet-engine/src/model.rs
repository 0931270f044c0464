//! Vehicles and the two reservation kinds booked against them.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::interval::TimeSpan;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a shared vehicle.
    VehicleId
);
id_type!(
    /// Identity of a driving reservation.
    ReservationId
);
id_type!(
    /// Identity of a charging reservation. Separate namespace from [`ReservationId`].
    ChargingReservationId
);

/// A shared electric vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    /// Full-charge range in km for April through September.
    pub summer_range: u32,
    /// Full-charge range in km for the rest of the year.
    pub winter_range: u32,
    /// Minimum hours a charge must last to count as a full charge.
    pub charging_duration: u32,
    /// Usernames allowed to book this vehicle.
    #[serde(default)]
    pub members: Vec<String>,
}

impl Vehicle {
    pub fn charging_duration(&self) -> Duration {
        Duration::hours(i64::from(self.charging_duration))
    }

    pub fn is_member(&self, user: &str) -> bool {
        self.members.iter().any(|m| m == user)
    }
}

/// Informational only; no allocation decision consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    High,
}

/// A driving reservation that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrivingReservation {
    pub vehicle_id: VehicleId,
    pub owner: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Kilometres this trip consumes from the energy budget.
    pub distance: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub must_fully_charge: bool,
}

impl NewDrivingReservation {
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrivingReservation {
    pub id: ReservationId,
    pub vehicle_id: VehicleId,
    pub owner: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub distance: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub must_fully_charge: bool,
}

impl DrivingReservation {
    pub fn from_new(id: ReservationId, new: NewDrivingReservation) -> Self {
        Self {
            id,
            vehicle_id: new.vehicle_id,
            owner: new.owner,
            description: new.description,
            location: new.location,
            start_time: new.start_time,
            end_time: new.end_time,
            distance: new.distance,
            priority: new.priority,
            must_fully_charge: new.must_fully_charge,
        }
    }

    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start_time, self.end_time)
    }
}

/// A charging reservation that has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChargingReservation {
    pub vehicle_id: VehicleId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl NewChargingReservation {
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargingReservation {
    pub id: ChargingReservationId,
    pub vehicle_id: VehicleId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl ChargingReservation {
    pub fn from_new(id: ChargingReservationId, new: NewChargingReservation) -> Self {
        Self {
            id,
            vehicle_id: new.vehicle_id,
            start_time: new.start_time,
            end_time: new.end_time,
        }
    }

    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start_time, self.end_time)
    }

    /// A charge resets the energy budget only if it lasts at least `min_duration`.
    pub fn qualifies(&self, min_duration: Duration) -> bool {
        self.end_time - self.start_time >= min_duration
    }
}

/// Serializable picture of a fleet: vehicles plus every stored reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub driving: Vec<DrivingReservation>,
    #[serde(default)]
    pub charging: Vec<ChargingReservation>,
}
