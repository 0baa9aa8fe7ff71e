//! Durable user data store
//!
//! Three independent records live under fixed keys of one `KvStore`. Every
//! mutation reads the whole record, changes it, and writes the whole record
//! back. Read failures fall back to the empty value and write failures are
//! logged, so the UI never has to handle an error from here.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::{GameId, GameSnapshot, HistoryEntry, StartScreen, UserProfile, UserStats};
use crate::storage::{DirStore, KvStore};

/// Default number of recently viewed games kept
pub const DEFAULT_HISTORY_CAP: usize = 50;

const PROFILE_KEY: &str = "user_data";
const FAVORITES_KEY: &str = "favorites";
const HISTORY_KEY: &str = "history";

/// Profile, favorites and history for the local user
pub struct UserStore {
    store: Box<dyn KvStore>,
    history_cap: usize,
}

impl fmt::Debug for UserStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserStore")
            .field("history_cap", &self.history_cap)
            .finish_non_exhaustive()
    }
}

impl UserStore {
    /// Creates a store over any storage medium with the default history cap
    pub fn new(store: impl KvStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }

    /// Creates a store keeping `user_data.json`, `favorites.json` and
    /// `history.json` in `dir`
    pub fn open_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(DirStore::new(dir))
    }

    /// Sets how many history entries are kept
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.get(key) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(record = key, error = %e, "failed to read user data");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(record = key, error = %e, "ignoring corrupt user data");
                None
            }
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_vec(value)
            .map_err(std::io::Error::from)
            .and_then(|json| self.store.put(key, &json));
        if let Err(e) = result {
            warn!(record = key, error = %e, "failed to write user data");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.delete(key) {
            warn!(record = key, error = %e, "failed to delete user data");
        }
    }

    // Profile

    /// Replaces the stored profile
    pub fn save_profile(&self, profile: &UserProfile) {
        self.save(PROFILE_KEY, profile);
    }

    /// The stored profile, if any
    pub fn profile(&self) -> Option<UserProfile> {
        self.load(PROFILE_KEY)
    }

    /// Removes the profile record (logout)
    pub fn delete_profile(&self) {
        debug!("logging out");
        self.remove(PROFILE_KEY);
    }

    /// Whether a profile record exists, readable or not
    ///
    /// Guest sessions count as logged in; check `UserProfile::logged_in` to
    /// tell them apart from a login.
    pub fn is_logged_in(&self) -> bool {
        match self.store.get(PROFILE_KEY) {
            Ok(record) => record.is_some(),
            Err(e) => {
                warn!(record = PROFILE_KEY, error = %e, "failed to read user data");
                false
            }
        }
    }

    /// Saves `profile`, carrying over an already accepted disclaimer
    fn start_session(&self, mut profile: UserProfile) -> UserProfile {
        profile.disclaimer_accepted = self
            .profile()
            .map(|p| p.disclaimer_accepted)
            .unwrap_or(false);
        self.save_profile(&profile);
        profile
    }

    /// Starts a guest session
    pub fn continue_as_guest(&self) -> UserProfile {
        self.start_session(UserProfile::guest())
    }

    /// Starts a local session for `username`
    pub fn login(&self, username: &str, email: &str) -> UserProfile {
        self.start_session(UserProfile::member(username, email))
    }

    /// Records that the disclaimer was accepted, creating a profile if needed
    pub fn accept_disclaimer(&self) {
        let mut profile = self.profile().unwrap_or_default();
        profile.disclaimer_accepted = true;
        self.save_profile(&profile);
    }

    /// Changes name and email of the current profile; `None` without a profile
    pub fn update_profile(&self, username: &str, email: &str) -> Option<UserProfile> {
        let mut profile = self.profile()?;
        profile.username = username.to_string();
        profile.email = email.to_string();
        self.save_profile(&profile);
        Some(profile)
    }

    /// Decides which screen the app opens on
    pub fn start_screen(&self) -> StartScreen {
        match self.profile() {
            Some(profile) if profile.disclaimer_accepted => StartScreen::Home,
            _ => StartScreen::Disclaimer,
        }
    }

    // Favorites

    /// All favorites by game id
    pub fn favorites(&self) -> BTreeMap<GameId, GameSnapshot> {
        self.load(FAVORITES_KEY).unwrap_or_default()
    }

    /// Adds or replaces a favorite
    pub fn add_favorite(&self, id: GameId, snapshot: GameSnapshot) {
        let mut favorites = self.favorites();
        favorites.insert(id, snapshot);
        self.save(FAVORITES_KEY, &favorites);
    }

    /// Removes a favorite; does nothing if `id` is not a favorite
    pub fn remove_favorite(&self, id: GameId) {
        let mut favorites = self.favorites();
        if favorites.remove(&id).is_some() {
            self.save(FAVORITES_KEY, &favorites);
        }
    }

    pub fn is_favorite(&self, id: GameId) -> bool {
        self.favorites().contains_key(&id)
    }

    /// Flips the favorite state of `id` and returns the new state
    pub fn toggle_favorite(&self, id: GameId, snapshot: GameSnapshot) -> bool {
        if self.is_favorite(id) {
            self.remove_favorite(id);
            false
        } else {
            self.add_favorite(id, snapshot);
            true
        }
    }

    // History

    /// Recently viewed games, oldest first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.load(HISTORY_KEY).unwrap_or_default()
    }

    /// Recently viewed games, newest first
    pub fn recent_history(&self) -> Vec<HistoryEntry> {
        let mut history = self.history();
        history.reverse();
        history
    }

    /// Records a view of `id`, moving it to the newest position
    ///
    /// The oldest entries are dropped once the list grows past the cap.
    pub fn record_view(&self, id: GameId, snapshot: GameSnapshot) {
        let mut history = self.history();
        history.retain(|entry| entry.id != id);
        history.push(HistoryEntry { id, snapshot });
        if history.len() > self.history_cap {
            let excess = history.len() - self.history_cap;
            history.drain(..excess);
        }
        self.save(HISTORY_KEY, &history);
    }

    /// Forgets every viewed game
    pub fn clear_history(&self) {
        self.remove(HISTORY_KEY);
    }

    pub fn stats(&self) -> UserStats {
        UserStats {
            favorites: self.favorites().len(),
            viewed: self.history().len(),
        }
    }
}
