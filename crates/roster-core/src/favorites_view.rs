// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Favorites screen state

use crate::favorites::{FavoritesSnapshot, FavoritesStore, FavoritesSubscription};
use crate::models::FavoriteUser;
use crate::search::{ListView, SearchState};
use std::time::Duration;

/// Favorites screen: a searchable copy of the store's list.
///
/// The copy is refreshed whenever the screen regains focus, since favorites
/// may have been toggled on other screens in the meantime.
pub struct FavoritesView {
    store: FavoritesStore,
    subscription: FavoritesSubscription,
    users: Vec<FavoriteUser>,
    revision: u64,
    search: SearchState<FavoriteUser>,
}

impl FavoritesView {
    pub fn new(store: FavoritesStore, debounce: Duration) -> Self {
        let mut subscription = store.subscribe();
        let snapshot = subscription.current();
        let mut view = Self {
            store,
            subscription,
            users: Vec::new(),
            revision: 0,
            search: SearchState::new(debounce),
        };
        view.replace(snapshot);
        view
    }

    /// Re-read the store; call every time the screen becomes visible
    pub fn on_focus(&mut self) {
        let snapshot = self.subscription.current();
        self.replace(snapshot);
    }

    /// Re-read the store only if it changed since the last read
    pub fn sync(&mut self) -> bool {
        if self.subscription.has_changed() {
            self.on_focus();
            true
        } else {
            false
        }
    }

    pub fn users(&self) -> &[FavoriteUser] {
        &self.users
    }

    /// Store revision the screen currently shows
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_favorite(&self, id: u64) -> bool {
        self.store.is_favorite(id)
    }

    /// Un-favorite from a card on this screen
    pub fn remove(&mut self, id: u64) -> bool {
        let changed = self.store.remove_favorite(id);
        self.sync();
        changed
    }

    pub fn search(&self) -> &SearchState<FavoriteUser> {
        &self.search
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search.set_search_text(text);
    }

    pub async fn settle_search(&mut self) -> bool {
        self.search.settle(&self.users).await
    }

    pub fn apply_pending_search(&mut self) -> bool {
        self.search.apply_pending(&self.users)
    }

    pub fn apply_search_now(&mut self) {
        self.search.apply_now(&self.users);
    }

    /// `Empty` while there are no favorites at all, whatever the search text
    pub fn view(&self) -> ListView<'_, FavoriteUser> {
        if self.users.is_empty() {
            ListView::Empty
        } else {
            self.search.view(&self.users)
        }
    }

    fn replace(&mut self, snapshot: FavoritesSnapshot) {
        self.users = snapshot.users().to_vec();
        self.revision = snapshot.revision();
        self.search.refilter(&self.users);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{favorite, user};
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    async fn store() -> FavoritesStore {
        FavoritesStore::load(Arc::new(MemoryStorage::new())).await
    }

    #[tokio::test]
    async fn test_empty_store_renders_empty_state() {
        let mut view = FavoritesView::new(store().await, Duration::from_millis(5));
        assert_eq!(view.view(), ListView::Empty);

        view.set_search_text("ann");
        view.apply_search_now();
        assert_eq!(view.view(), ListView::Empty);
    }

    #[tokio::test]
    async fn test_focus_picks_up_changes_from_other_screens() {
        let store = store().await;
        store.add_favorite(favorite(1, "Ann"));
        let mut view = FavoritesView::new(store.clone(), Duration::from_millis(5));
        assert_eq!(view.users().len(), 1);

        // Toggled from the user list while this screen was in the background
        store.toggle_favorite(&user(2, "Bob"));
        store.remove_favorite(1);
        assert_eq!(view.users()[0].id, 1);

        view.on_focus();
        let ids: Vec<u64> = view.users().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(view.revision(), store.snapshot().revision());
        assert!(!view.sync());
    }

    #[tokio::test]
    async fn test_search_over_favorites() {
        let store = store().await;
        for (id, name) in [(1, "Ann"), (2, "Bob"), (3, "Joanna")] {
            store.add_favorite(favorite(id, name));
        }
        let mut view = FavoritesView::new(store.clone(), Duration::from_millis(5));

        view.set_search_text("ANN");
        view.apply_search_now();
        let names: Vec<&str> = view.view().items().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Joanna"]);

        // Removing from a card refreshes the filtered list as well
        assert!(view.remove(1));
        assert!(!view.is_favorite(1));
        assert_eq!(view.view().items().len(), 1);

        view.set_search_text("xyz");
        view.apply_search_now();
        assert_eq!(view.view(), ListView::NoMatches { query: "xyz" });
    }

    #[tokio::test]
    async fn test_sync_only_refreshes_after_a_change() {
        let store = store().await;
        let mut view = FavoritesView::new(store.clone(), Duration::from_millis(5));
        assert!(!view.sync());

        store.add_favorite(favorite(4, "Dora"));
        assert!(view.sync());
        assert_eq!(view.users().len(), 1);
        assert!(!view.sync());
    }
}
