//! Business logic services

pub mod catalog;
pub mod loans;
pub mod members;
pub mod reservations;
pub mod stats;

use std::sync::Arc;

use crate::{
    clock::SharedClock,
    config::CirculationConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub loans: Arc<loans::LoansService>,
    pub reservations: reservations::ReservationsService,
    pub stats: stats::StatsService,
    repository: Repository,
}

impl Services {
    /// Create all services over `repository`.
    ///
    /// Circulation and the reservation queue call each other: the queue is built
    /// first, then handed a weak reference to circulation.
    pub fn new(
        repository: Repository,
        circulation: CirculationConfig,
        clock: SharedClock,
    ) -> AppResult<Self> {
        let reservations = reservations::ReservationsService::new(repository.clone(), clock.clone());
        let loans = Arc::new(loans::LoansService::new(
            repository.clone(),
            circulation,
            clock.clone(),
            reservations.clone(),
        ));
        reservations.attach_circulation(&loans);
        if !reservations.has_circulation() {
            return Err(AppError::Internal(
                "reservation queue has no circulation service attached".to_string(),
            ));
        }

        Ok(Self {
            catalog: catalog::CatalogService::new(repository.clone(), clock.clone(), reservations.clone()),
            members: members::MembersService::new(repository.clone(), clock.clone()),
            stats: stats::StatsService::new(repository.clone(), clock),
            loans,
            reservations,
            repository,
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Write failures since the last call, oldest first
    pub fn take_warnings(&self) -> Vec<AppError> {
        self.repository.warnings.take()
    }

    /// Re-read every store from the data directory
    pub fn reload(&self) {
        self.repository.reload();
        tracing::info!(actor = "system", action = "reload", "Stores reloaded from disk");
    }
}
