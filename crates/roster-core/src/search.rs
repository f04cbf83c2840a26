// SPDX-License-Identifier: AGPL-3.0
// Roster Core - Search-as-you-type over an in-memory list
//
// The text box updates immediately; the filtered list is rebuilt only after
// the debounce quiet period, from scratch, over the current items.

use crate::debounce::Debouncer;
use crate::models::Searchable;
use async_channel::{Receiver, Sender};
use std::time::Duration;

/// Items whose searchable fields contain `text`, ignoring case, in their
/// original order
pub fn filter_items<T: Searchable + Clone>(items: &[T], text: &str) -> Vec<T> {
    let needle = text.to_lowercase();
    items
        .iter()
        .filter(|item| item.matches(&needle))
        .cloned()
        .collect()
}

/// What a list screen should render
#[derive(Debug, PartialEq)]
pub enum ListView<'a, T> {
    /// No search text: the full list
    All(&'a [T]),
    /// Search text with at least one match
    Filtered(&'a [T]),
    /// Search text without matches; never falls back to the full list
    NoMatches { query: &'a str },
    /// Nothing to show and no search text
    Empty,
}

impl<'a, T> ListView<'a, T> {
    pub fn items(&self) -> &'a [T] {
        match *self {
            ListView::All(items) | ListView::Filtered(items) => items,
            ListView::NoMatches { .. } | ListView::Empty => &[],
        }
    }
}

/// Search box state shared by all list screens
#[derive(Debug)]
pub struct SearchState<T> {
    search_text: String,
    applied_query: String,
    filtered: Vec<T>,
    recompute_count: usize,
    debouncer: Debouncer,
    settled_tx: Sender<String>,
    settled_rx: Receiver<String>,
}

impl<T: Searchable + Clone> SearchState<T> {
    pub fn new(debounce: Duration) -> Self {
        let (settled_tx, settled_rx) = async_channel::unbounded();
        Self {
            search_text: String::new(),
            applied_query: String::new(),
            filtered: Vec::new(),
            recompute_count: 0,
            debouncer: Debouncer::new(debounce),
            settled_tx,
            settled_rx,
        }
    }

    /// Text as typed so far
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Text the filtered list was last built from
    pub fn applied_query(&self) -> &str {
        &self.applied_query
    }

    pub fn filtered(&self) -> &[T] {
        &self.filtered
    }

    /// Number of times the filtered list was rebuilt
    pub fn recompute_count(&self) -> usize {
        self.recompute_count
    }

    /// Whether a typed text is still waiting out the quiet period
    pub fn is_settling(&self) -> bool {
        self.debouncer.is_pending() || !self.settled_rx.is_empty()
    }

    /// Record a keystroke and restart the quiet period
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.search_text.clone_from(&text);

        let tx = self.settled_tx.clone();
        self.debouncer.schedule(move || {
            let _ = tx.try_send(text);
        });
    }

    /// Wait for the pending text to settle and apply it to `items`.
    /// Returns false right away when nothing is pending.
    pub async fn settle(&mut self, items: &[T]) -> bool {
        if !self.is_settling() {
            return false;
        }
        let Ok(mut text) = self.settled_rx.recv().await else {
            return false;
        };
        // Several quiet periods may have ended since the last call
        while let Ok(newer) = self.settled_rx.try_recv() {
            text = newer;
        }
        self.apply(items, text);
        true
    }

    /// Apply a text that already settled, without waiting
    pub fn apply_pending(&mut self, items: &[T]) -> bool {
        let mut latest = None;
        while let Ok(text) = self.settled_rx.try_recv() {
            latest = Some(text);
        }

        match latest {
            Some(text) => {
                self.apply(items, text);
                true
            }
            None => false,
        }
    }

    /// Skip the quiet period and filter by the current text now
    pub fn apply_now(&mut self, items: &[T]) {
        self.debouncer.cancel();
        while self.settled_rx.try_recv().is_ok() {}
        let text = self.search_text.clone();
        self.apply(items, text);
    }

    /// Rebuild the filtered list after `items` changed
    pub fn refilter(&mut self, items: &[T]) {
        self.filtered = filter_items(items, &self.applied_query);
        self.recompute_count += 1;
    }

    /// Empty the search box and drop any pending text
    pub fn clear(&mut self, items: &[T]) {
        self.debouncer.cancel();
        while self.settled_rx.try_recv().is_ok() {}
        self.search_text.clear();
        self.applied_query.clear();
        self.refilter(items);
    }

    pub fn view<'a>(&'a self, items: &'a [T]) -> ListView<'a, T> {
        if self.search_text.is_empty() {
            if items.is_empty() {
                ListView::Empty
            } else {
                ListView::All(items)
            }
        } else if self.filtered.is_empty() {
            ListView::NoMatches {
                query: &self.search_text,
            }
        } else {
            ListView::Filtered(&self.filtered)
        }
    }

    fn apply(&mut self, items: &[T], text: String) {
        tracing::debug!("Applying search {:?} to {} items", text, items.len());
        self.applied_query = text;
        self.refilter(items);
    }
}
