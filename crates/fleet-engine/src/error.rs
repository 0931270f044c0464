//! Error types for fleet-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{ChargingReservationId, ReservationId, VehicleId};

/// Failure reported by a [`ReservationRepository`](crate::repository::ReservationRepository).
///
/// Surfaced unchanged to the caller; the engine never retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("reservation store unavailable: {0}")]
    Unavailable(String),

    #[error("reservation store rejected the write: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FleetError {
    #[error("start time {start} must be before end time {end}")]
    Ordering {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("vehicle {vehicle} is already reserved between {start} and {end}")]
    Overlap {
        vehicle: VehicleId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("not enough range at {at}: {requested} km requested but only {available} km left")]
    InsufficientRange {
        at: DateTime<Utc>,
        requested: u32,
        available: i64,
    },

    #[error("charging from {start} to {end} is shorter than the required {required_hours} hours")]
    InsufficientDuration {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        required_hours: u32,
    },

    /// A later reservation on the same charge cycle would run out of range.
    #[error(
        "reservation of {owner} from {start} to {end} to {location} ({distance} km) \
         would be left with {remaining} km"
    )]
    CascadingConflict {
        reservation: ReservationId,
        owner: String,
        location: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        distance: u32,
        remaining: i64,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),

    #[error("user {user} may not book vehicle {vehicle}")]
    NotPermitted { user: String, vehicle: VehicleId },

    #[error("driving reservation {0} not found")]
    ReservationNotFound(ReservationId),

    #[error("charging reservation {0} not found")]
    ChargingReservationNotFound(ChargingReservationId),

    #[error("reservation belongs to vehicle {expected}, not {found}")]
    VehicleMismatch {
        expected: VehicleId,
        found: VehicleId,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FleetError {
    /// True for the validation kinds: the candidate was rejected and nothing
    /// was written.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            FleetError::Ordering { .. }
                | FleetError::Overlap { .. }
                | FleetError::InsufficientRange { .. }
                | FleetError::InsufficientDuration { .. }
                | FleetError::CascadingConflict { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
