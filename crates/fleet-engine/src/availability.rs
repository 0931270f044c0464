//! Read-only view over a vehicle's reservations.
//!
//! [`Availability`] pairs a repository with the engine configuration. Its
//! operations are spread over the modules that own each concern:
//!
//! - [`energy`](crate::energy): seasonal range, qualifying charges, distance left
//! - [`charging`](crate::charging): backward search for a charging slot
//! - [`conflict`](crate::conflict): free-slot test and reservation validation
//!
//! Nothing reached through an `Availability` writes to the store.

use crate::config::EngineConfig;
use crate::repository::ReservationRepository;

pub struct Availability<'a, R: ?Sized> {
    pub(crate) repo: &'a R,
    pub(crate) config: &'a EngineConfig,
}

impl<'a, R: ReservationRepository + ?Sized> Availability<'a, R> {
    pub fn new(repo: &'a R, config: &'a EngineConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    pub fn repository(&self) -> &R {
        self.repo
    }
}
