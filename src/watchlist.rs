use directories::ProjectDirs;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::media::MediaRef;

/// Membership change, broadcast to observers synchronously with the
/// mutation. Views render membership straight off the store, so by the time
/// any feedback is shown the event has already been seen everywhere.
#[derive(Debug, Clone)]
pub enum WatchlistEvent {
    Added { media: MediaRef },
    Removed { id: u64 },
}

pub trait WatchlistObserver: Send + Sync {
    fn on_event(&self, event: &WatchlistEvent);
}

/// Persisted set of watch-listed items, keyed by TMDB id.
///
/// At most one entry per id; listing preserves insertion order. The entry
/// list is written back to disk after every mutation. Load failures degrade
/// to an empty list and save failures to a warning, neither is fatal: the
/// in-memory set stays authoritative either way.
pub struct Watchlist {
    entries: Vec<MediaRef>,
    ids: HashSet<u64>,
    path: Option<PathBuf>,
    observers: Vec<Box<dyn WatchlistObserver>>,
}

impl Watchlist {
    /// Load the watchlist from its default location under the platform data
    /// directory.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(path),
            None => {
                warn!("no data directory available, watchlist won't persist");
                Self::in_memory()
            }
        }
    }

    /// Load from an explicit path (tests point this at a temp dir).
    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_entries(&path);
        let ids = entries.iter().map(|m| m.id).collect();
        Self {
            entries,
            ids,
            path: Some(path),
            observers: Vec::new(),
        }
    }

    /// A watchlist that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
            path: None,
            observers: Vec::new(),
        }
    }

    fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "flickstream").map(|dirs| dirs.data_dir().join("watchlist.json"))
    }

    fn read_entries(path: &Path) -> Vec<MediaRef> {
        if !path.exists() {
            return Vec::new();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => {
                    debug!("loaded watchlist");
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "watchlist file is corrupt, starting empty");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "failed to read watchlist, starting empty");
                Vec::new()
            }
        }
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(error = %e, "failed to create watchlist directory");
            return;
        }

        match serde_json::to_string_pretty(&self.entries) {
            Ok(contents) => {
                if let Err(e) = std::fs::write(path, contents) {
                    warn!(error = %e, "failed to write watchlist");
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to serialize watchlist");
            }
        }
    }

    /// Register an observer for membership changes.
    pub fn register_observer(&mut self, observer: Box<dyn WatchlistObserver>) {
        self.observers.push(observer);
    }

    fn broadcast(&self, event: WatchlistEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    /// O(1) membership check.
    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Insert an item if absent. Duplicate adds are silent no-ops, never an
    /// error. Returns whether membership changed.
    pub fn add(&mut self, media: MediaRef) -> bool {
        if !self.ids.insert(media.id) {
            return false;
        }

        debug!(id = media.id, title = %media.title, "added to watchlist");
        self.entries.push(media.clone());
        self.save();
        self.broadcast(WatchlistEvent::Added { media });
        true
    }

    /// Delete an item if present; no-op if absent. Returns whether
    /// membership changed.
    pub fn remove(&mut self, id: u64) -> bool {
        if !self.ids.remove(&id) {
            return false;
        }

        debug!(id, "removed from watchlist");
        self.entries.retain(|m| m.id != id);
        self.save();
        self.broadcast(WatchlistEvent::Removed { id });
        true
    }

    /// Flip membership for an item; returns the membership state after the
    /// call.
    pub fn toggle(&mut self, media: MediaRef) -> bool {
        if self.contains(media.id) {
            self.remove(media.id);
            false
        } else {
            self.add(media);
            true
        }
    }

    /// Entries in insertion order, for the watchlist view.
    pub fn entries(&self) -> &[MediaRef] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
