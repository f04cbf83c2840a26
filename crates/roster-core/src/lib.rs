// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Shared logic for all frontends
//
// This crate provides:
// - AppSettings and AppError types
// - SettingsStore for persistent settings
// - FavoritesStore, the shared and persisted list of favorite users
// - ListController for paginated, searchable users/posts/tasks lists
// - ApiClient for the remote REST service
//
// Frontend-specific code lives in separate crates.

pub mod api;
pub mod debounce;
pub mod favorites;
pub mod favorites_view;
pub mod list;
pub mod models;
pub mod search;
pub mod settings;
pub mod storage;
pub mod types;

// Re-export commonly used items
pub use api::ApiClient;
pub use debounce::Debouncer;
pub use favorites::{FavoritesSnapshot, FavoritesStore, FavoritesSubscription, FAVORITES_KEY};
pub use favorites_view::FavoritesView;
pub use list::{FetchOutcome, ListController, PageRequest, PageSource, PaginatedList};
pub use models::{
    Address, Comment, Company, FavoriteUser, Geo, Post, PostDetail, Searchable, Task, User,
};
pub use search::{filter_items, ListView, SearchState};
pub use settings::SettingsStore;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use types::{AppError, AppSettings};
