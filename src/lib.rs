//! Elidune Desk library circulation system
//!
//! Catalog, members, loans and reservation queues for a small library, kept in
//! JSON files and driven from a text console.

use std::sync::Arc;

pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod ids;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use clock::SharedClock;
use repository::Repository;
use services::Services;

/// Application state shared by the console and its handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    /// Load the stores under `config.storage.data_dir` and wire the services
    pub fn open(config: AppConfig, clock: SharedClock) -> AppResult<Self> {
        let repository = Repository::open(&config.storage.data_dir)?;
        let services = Services::new(repository, config.circulation.clone(), clock)?;
        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }
}
