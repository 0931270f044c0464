//! # fleet-engine
//!
//! Availability and energy-feasibility engine for a shared electric car fleet.
//!
//! Members of a vehicle book driving slots and charging slots. A driving slot
//! must not overlap anything else booked on the vehicle and must fit in the
//! range left since the last full charge; a charging slot must be long enough
//! to count as a full charge. When range runs out, the engine can search
//! backwards for the nearest free charging window.
//!
//! ## Modules
//!
//! - [`interval`]: half-open overlap test shared by every check
//! - [`energy`]: seasonal range, qualifying charges, distance left
//! - [`charging`]: backward charging-slot search
//! - [`conflict`]: free-slot test and reservation validation
//! - [`freebusy`]: per-vehicle free/busy calendar
//! - [`repository`]: the store abstraction, with [`memory`] as an in-process store
//! - [`service`]: membership checks and per-vehicle validate-and-commit
//! - [`config`]: engine tunables
//! - [`error`]: error types

pub mod availability;
pub mod charging;
pub mod config;
pub mod conflict;
pub mod energy;
pub mod error;
pub mod freebusy;
pub mod interval;
pub mod memory;
pub mod model;
pub mod repository;
pub mod service;

pub use availability::Availability;
pub use charging::SlotSearch;
pub use config::EngineConfig;
pub use energy::seasonal_range;
pub use error::{FleetError, RepositoryError};
pub use interval::{overlaps, TimeSpan};
pub use memory::InMemoryRepository;
pub use model::{
    ChargingReservation, ChargingReservationId, DrivingReservation, FleetSnapshot,
    NewChargingReservation, NewDrivingReservation, Priority, ReservationId, Vehicle, VehicleId,
};
pub use repository::ReservationRepository;
pub use service::{Booking, ReservationService};
