//! Local user data: profile, favorites and view history
//!
//! Everything here is stored on the device only. Login is a local profile stub;
//! there is no account system behind it.

mod store;

pub use store::{UserStore, DEFAULT_HISTORY_CAP};

use serde::{Deserialize, Serialize};

/// Stable identifier of a game in the catalog API
pub type GameId = u64;

/// The single local profile
///
/// Every field defaults when missing on disk: accepting the disclaimer before
/// logging in leaves a record holding only `disclaimer_accepted`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    /// `false` for guest sessions
    pub logged_in: bool,
    pub disclaimer_accepted: bool,
}

impl UserProfile {
    /// Username shown for guest sessions
    pub const GUEST_USERNAME: &'static str = "Guest";
    /// Placeholder email for guest sessions
    pub const GUEST_EMAIL: &'static str = "guest@gua.app";

    /// A guest profile, not authenticated
    pub fn guest() -> Self {
        Self {
            username: Self::GUEST_USERNAME.to_string(),
            email: Self::GUEST_EMAIL.to_string(),
            logged_in: false,
            disclaimer_accepted: false,
        }
    }

    /// A profile created by the local login form
    pub fn member(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            logged_in: true,
            disclaimer_accepted: false,
        }
    }
}

/// Display fields of a game, frozen when it was favorited or viewed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub name: String,
    /// Background image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Average rating; absent when the API had none
    #[serde(default)]
    pub rating: Option<f64>,
}

impl GameSnapshot {
    /// Builds a snapshot from a game details payload
    ///
    /// Missing names become "Unknown", matching what the details screen shows.
    pub fn from_details(details: &serde_json::Value) -> Self {
        Self {
            name: details
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown")
                .to_string(),
            image: details
                .get("background_image")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            rating: details.get("rating").and_then(|v| v.as_f64()),
        }
    }
}

/// One game in the recently-viewed list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: GameId,
    #[serde(flatten)]
    pub snapshot: GameSnapshot,
}

/// Counters shown on the profile screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub favorites: usize,
    pub viewed: usize,
}

/// Screen the app should open on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartScreen {
    /// No profile yet, or the disclaimer was not accepted
    Disclaimer,
    Home,
}
