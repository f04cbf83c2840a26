// SPDX-License-Identifier: AGPL-3.0
// Roster CLI - Application State

use roster_core::{ApiClient, AppError, FavoritesStore, FileStorage, SettingsStore};
use std::sync::Arc;

/// Everything a command needs, built once at startup
pub struct AppState {
    pub settings: SettingsStore,
    pub favorites: FavoritesStore,
    pub client: ApiClient,
}

impl AppState {
    /// Create application state with all stores initialized
    pub async fn new() -> Result<Self, AppError> {
        let settings = SettingsStore::new()?;
        let config = settings.get();

        let client = ApiClient::from_settings(&config)?;
        let storage = Arc::new(FileStorage::new(&config.data_dir));
        let favorites = FavoritesStore::load(storage).await;

        Ok(Self {
            settings,
            favorites,
            client,
        })
    }

    /// Wait for pending favorites writes before the process exits
    pub async fn shutdown(&self) {
        self.favorites.flush().await;
    }
}
