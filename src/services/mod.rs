//! Business logic services

pub mod accounts;
pub mod catalog;
pub mod copies;
pub mod geocoding;
pub mod libraries;
pub mod sessions;
pub mod users;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountsService,
    pub users: users::UsersService,
    pub libraries: libraries::LibrariesService,
    pub copies: copies::CopiesService,
    pub catalog: catalog::CatalogService,
    pub geocoding: geocoding::GeocodingService,
    pub sessions: sessions::SessionStore,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        sessions: sessions::SessionStore,
    ) -> AppResult<Self> {
        let accounts = accounts::AccountsService::new(repository.clone(), sessions.clone());
        let catalog = catalog::CatalogService::new(repository.clone(), config.catalog.clone())?;
        let geocoding = geocoding::GeocodingService::new(&config.geocoding)?;

        Ok(Self {
            users: users::UsersService::new(repository.clone(), accounts.clone()),
            libraries: libraries::LibrariesService::new(
                repository.clone(),
                catalog.clone(),
                geocoding.clone(),
            ),
            copies: copies::CopiesService::new(repository.clone(), &config.loans),
            accounts,
            catalog,
            geocoding,
            sessions,
            repository,
        })
    }

    /// Check that the database answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
