// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Favorite users store
//
// The favorites list is shared by every screen that shows a favorite glyph.
// It lives in memory as the source of truth and is mirrored to durable
// storage under a single key by a background writer task.

use crate::models::{FavoriteUser, User};
use crate::storage::KeyValueStorage;
use crate::types::AppError;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Storage key holding the serialized favorites list
pub const FAVORITES_KEY: &str = "FavoritesStore";

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoritesFile {
    favorite_users: Vec<FavoriteUser>,
}

/// Immutable view of the favorites at one revision
#[derive(Debug, Clone, Default)]
pub struct FavoritesSnapshot {
    revision: u64,
    users: Arc<Vec<FavoriteUser>>,
    ids: Arc<HashSet<u64>>,
}

impl FavoritesSnapshot {
    fn from_users(users: Vec<FavoriteUser>) -> Self {
        let mut ids = HashSet::with_capacity(users.len());
        let users: Vec<FavoriteUser> = users
            .into_iter()
            .filter(|user| ids.insert(user.id))
            .collect();

        Self {
            revision: 0,
            users: Arc::new(users),
            ids: Arc::new(ids),
        }
    }

    /// Bumped once per mutation that changed the list
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Favorites in the order they were added
    pub fn users(&self) -> &[FavoriteUser] {
        &self.users
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

struct Inner {
    state: watch::Sender<FavoritesSnapshot>,
    persisted: watch::Receiver<u64>,
}

/// Shared, persisted set of favorite users.
///
/// Cloning yields another handle on the same store. Mutations are meant to
/// come from the UI event loop; each one publishes a complete new snapshot,
/// so readers never see a half-applied change.
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<Inner>,
}

impl FavoritesStore {
    /// Restore favorites from `storage` and start the background writer.
    ///
    /// A missing entry yields an empty store. An unreadable or undecodable
    /// entry is logged and also yields an empty store.
    pub async fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let users = match storage.get(FAVORITES_KEY).await {
            Ok(Some(bytes)) => match decode(&bytes) {
                Ok(users) => users,
                Err(e) => {
                    tracing::warn!("Failed to parse favorites, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read favorites, starting empty: {}", e);
                Vec::new()
            }
        };

        let snapshot = FavoritesSnapshot::from_users(users);
        tracing::info!("Loaded {} favorite users", snapshot.len());

        let (state, state_rx) = watch::channel(snapshot);
        let (persisted_tx, persisted) = watch::channel(0);
        tokio::spawn(run_writer(storage, state_rx, persisted_tx));

        Self {
            inner: Arc::new(Inner { state, persisted }),
        }
    }

    pub fn is_favorite(&self, id: u64) -> bool {
        self.inner.state.borrow().contains(id)
    }

    /// Add `user` unless a favorite with the same id exists. Returns whether
    /// the list changed; the first snapshot stored for an id wins.
    pub fn add_favorite(&self, user: FavoriteUser) -> bool {
        let id = user.id;
        let changed = self.inner.state.send_if_modified(|snapshot| {
            if snapshot.contains(id) {
                return false;
            }
            insert(snapshot, user);
            true
        });

        if changed {
            tracing::info!("Added favorite user {}", id);
        }
        changed
    }

    /// Remove the favorite with `id`. Returns whether the list changed.
    pub fn remove_favorite(&self, id: u64) -> bool {
        let changed = self.inner.state.send_if_modified(|snapshot| {
            if !snapshot.contains(id) {
                return false;
            }
            remove(snapshot, id);
            true
        });

        if changed {
            tracing::info!("Removed favorite user {}", id);
        }
        changed
    }

    /// Flip membership of `user` in one step. Returns whether the user is a
    /// favorite afterwards.
    pub fn toggle_favorite(&self, user: &User) -> bool {
        let mut now_favorite = false;
        self.inner.state.send_modify(|snapshot| {
            if snapshot.contains(user.id) {
                remove(snapshot, user.id);
            } else {
                insert(snapshot, FavoriteUser::snapshot(user));
                now_favorite = true;
            }
        });

        tracing::info!(
            "Toggled favorite user {} -> {}",
            user.id,
            if now_favorite { "on" } else { "off" }
        );
        now_favorite
    }

    /// Current favorites in insertion order
    pub fn favorite_users(&self) -> Vec<FavoriteUser> {
        self.inner.state.borrow().users().to_vec()
    }

    pub fn snapshot(&self) -> FavoritesSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.borrow().is_empty()
    }

    /// Register for change notifications. The subscription starts at the
    /// current revision.
    pub fn subscribe(&self) -> FavoritesSubscription {
        FavoritesSubscription {
            rx: self.inner.state.subscribe(),
        }
    }

    /// Wait until the writer has handled every mutation made so far
    pub async fn flush(&self) {
        let target = self.inner.state.borrow().revision;
        let mut persisted = self.inner.persisted.clone();
        let stopped = persisted
            .wait_for(|revision| *revision >= target)
            .await
            .is_err();
        if stopped {
            tracing::warn!("Favorites writer stopped before revision {}", target);
        }
    }
}

fn insert(snapshot: &mut FavoritesSnapshot, user: FavoriteUser) {
    Arc::make_mut(&mut snapshot.ids).insert(user.id);
    Arc::make_mut(&mut snapshot.users).push(user);
    snapshot.revision += 1;
}

fn remove(snapshot: &mut FavoritesSnapshot, id: u64) {
    Arc::make_mut(&mut snapshot.ids).remove(&id);
    Arc::make_mut(&mut snapshot.users).retain(|user| user.id != id);
    snapshot.revision += 1;
}

fn decode(bytes: &[u8]) -> Result<Vec<FavoriteUser>, AppError> {
    let file: FavoritesFile = serde_json::from_slice(bytes)?;
    Ok(file.favorite_users)
}

fn encode(snapshot: &FavoritesSnapshot) -> Result<Vec<u8>, AppError> {
    let file = FavoritesFile {
        favorite_users: snapshot.users().to_vec(),
    };
    Ok(serde_json::to_vec_pretty(&file)?)
}

/// Writes the newest snapshot after every change.
///
/// Changes that pile up while a write is in flight collapse into one write of
/// the latest state, so an older list never lands after a newer one.
async fn run_writer(
    storage: Arc<dyn KeyValueStorage>,
    mut state_rx: watch::Receiver<FavoritesSnapshot>,
    persisted_tx: watch::Sender<u64>,
) {
    while state_rx.changed().await.is_ok() {
        let snapshot = state_rx.borrow_and_update().clone();

        let result = match encode(&snapshot) {
            Ok(bytes) => storage.set(FAVORITES_KEY, bytes).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => tracing::debug!("Persisted favorites at revision {}", snapshot.revision),
            Err(e) => tracing::warn!("Failed to persist favorites: {}", e),
        }

        persisted_tx.send_replace(snapshot.revision);
    }
    tracing::debug!("Favorites writer finished");
}

/// Change feed for one consumer of the favorites store
pub struct FavoritesSubscription {
    rx: watch::Receiver<FavoritesSnapshot>,
}

impl FavoritesSubscription {
    /// Wait for the next change. Returns false once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Whether a change arrived since the last `current()`
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Latest snapshot, marking it as seen
    pub fn current(&mut self) -> FavoritesSnapshot {
        self.rx.borrow_and_update().clone()
    }

    pub fn revision(&self) -> u64 {
        self.rx.borrow().revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{favorite, user};
    use crate::storage::{FileStorage, MemoryStorage};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    async fn memory_store() -> (FavoritesStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        let store = FavoritesStore::load(Arc::new(storage.clone())).await;
        (store, storage)
    }

    fn stored_ids(storage: &MemoryStorage) -> Vec<u64> {
        let bytes = storage.get_raw(FAVORITES_KEY).unwrap();
        decode(&bytes).unwrap().iter().map(|u| u.id).collect()
    }

    #[tokio::test]
    async fn test_first_add_wins_and_queries() {
        let (store, _) = memory_store().await;

        assert!(store.add_favorite(favorite(1, "Ann")));
        assert!(!store.add_favorite(favorite(1, "Ann2")));
        assert!(!store.remove_favorite(2));

        let users = store.favorite_users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Ann");
        assert!(store.is_favorite(1));
        assert!(!store.is_favorite(2));
    }

    #[tokio::test]
    async fn test_repeated_ids_stay_unique() {
        let (store, _) = memory_store().await;

        for id in [3, 1, 3, 2, 1, 3] {
            store.add_favorite(favorite(id, "X"));
        }

        let ids: Vec<u64> = store.favorite_users().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_previous_state() {
        let (store, _) = memory_store().await;
        store.add_favorite(favorite(1, "Ann"));
        store.add_favorite(favorite(2, "Bob"));
        let before = store.favorite_users();

        store.add_favorite(favorite(9, "Zed"));
        store.remove_favorite(9);

        assert_eq!(store.favorite_users(), before);
    }

    #[tokio::test]
    async fn test_noop_mutations_do_not_write() {
        let (store, storage) = memory_store().await;
        store.add_favorite(favorite(1, "Ann"));
        store.flush().await;
        assert_eq!(storage.write_count(), 1);

        store.add_favorite(favorite(1, "Ann"));
        store.remove_favorite(42);
        store.flush().await;
        assert_eq!(storage.write_count(), 1);
    }

    #[tokio::test]
    async fn test_restart_restores_same_list() {
        let (store, storage) = memory_store().await;
        for (id, name) in [(5, "Eve"), (2, "Bob"), (8, "Hal")] {
            store.add_favorite(favorite(id, name));
        }
        store.remove_favorite(2);
        store.flush().await;

        let restarted = FavoritesStore::load(Arc::new(storage.clone())).await;
        assert_eq!(restarted.favorite_users(), store.favorite_users());
        assert_eq!(stored_ids(&storage), vec![5, 8]);
    }

    #[tokio::test]
    async fn test_restart_from_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FavoritesStore::load(Arc::new(FileStorage::new(dir.path()))).await;
            store.toggle_favorite(&user(4, "Dora"));
            store.toggle_favorite(&user(6, "Finn"));
            store.flush().await;
        }

        let store = FavoritesStore::load(Arc::new(FileStorage::new(dir.path()))).await;
        let names: Vec<String> = store.favorite_users().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Dora", "Finn"]);
    }

    #[tokio::test]
    async fn test_corrupt_payload_starts_empty() {
        let storage = MemoryStorage::new();
        storage.insert_raw(FAVORITES_KEY, "{\"favoriteUsers\": [oops");

        let store = FavoritesStore::load(Arc::new(storage)).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_in_payload_are_dropped() {
        let storage = MemoryStorage::new();
        let payload = serde_json::json!({
            "favoriteUsers": [
                { "id": 1, "name": "Ann", "email": "a@x", "username": "ann" },
                { "id": 1, "name": "Ann2", "email": "a@x", "username": "ann" },
                { "id": 2, "name": "Bob", "email": "b@x", "username": "bob" }
            ]
        });
        storage.insert_raw(FAVORITES_KEY, payload.to_string());

        let store = FavoritesStore::load(Arc::new(storage)).await;
        let users = store.favorite_users();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Ann");
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_state() {
        let (store, storage) = memory_store().await;
        storage.fail_writes(true);

        store.add_favorite(favorite(1, "Ann"));
        store.flush().await;

        assert!(store.is_favorite(1));
        assert!(storage.get_raw(FAVORITES_KEY).is_none());

        storage.fail_writes(false);
        store.add_favorite(favorite(2, "Bob"));
        store.flush().await;
        assert_eq!(stored_ids(&storage), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_toggle_returns_new_membership() {
        let (store, _) = memory_store().await;
        let ann = user(1, "Ann");

        assert!(store.toggle_favorite(&ann));
        assert!(store.is_favorite(1));
        assert!(!store.toggle_favorite(&ann));
        assert!(!store.is_favorite(1));
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_a_toggle() {
        let (store, _) = memory_store().await;
        let mut first_card = store.subscribe();
        let mut second_card = store.subscribe();

        store.toggle_favorite(&user(3, "Cy"));

        assert!(first_card.changed().await);
        assert!(second_card.has_changed());
        assert!(first_card.current().contains(3));
        assert!(second_card.current().contains(3));
        assert_eq!(first_card.revision(), second_card.revision());
    }

    /// Records each payload and takes a while per write
    #[derive(Default)]
    struct SlowStorage {
        writes: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl KeyValueStorage for SlowStorage {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, AppError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, value: Vec<u8>) -> Result<(), AppError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.writes.lock().unwrap().push(value);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_writes_never_regress() {
        let storage = Arc::new(SlowStorage::default());
        let store = FavoritesStore::load(storage.clone()).await;

        for id in 1..=6 {
            store.add_favorite(favorite(id, "U"));
            tokio::time::sleep(Duration::from_millis(7)).await;
        }
        store.flush().await;

        let lengths: Vec<usize> = storage
            .writes
            .lock()
            .unwrap()
            .iter()
            .map(|bytes| decode(bytes).unwrap().len())
            .collect();

        assert!(lengths.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(lengths.last(), Some(&6));
        // Bursts during a slow write collapse into fewer writes
        assert!(lengths.len() < 6);
    }
}
