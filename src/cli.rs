//! Command-line interface parsing for gamedex
//!
//! This module defines the `gamedex` command tree using clap: cache maintenance,
//! favorites, history, the local profile, and catalog lookups.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::api::{ApiError, SEARCH_PAGE_SIZE, TRENDING_PAGE_SIZE};
use crate::config::ConfigError;
use crate::user::GameId;

/// Highest rating the catalog uses
const MAX_RATING: f64 = 5.0;

/// Error types for running a command
#[derive(Debug, Error)]
pub enum CliError {
    /// The rating argument is not a number between 0 and 5
    #[error("Invalid rating: '{0}'. Expected a number between 0 and 5")]
    InvalidRating(String),

    /// No home directory and no --data-dir
    #[error("Could not determine where to store data; pass --data-dir")]
    NoStorageLocation,

    /// No profile is stored for a command that needs one
    #[error("Not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// gamedex - Browse the game catalog and manage local favorites and history
#[derive(Parser, Debug)]
#[command(name = "gamedex")]
#[command(about = "Game catalog browser with offline cache, favorites and history")]
#[command(version)]
pub struct Cli {
    /// Store cache and user data under this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Read configuration from this TOML file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Inspect or clear cached API responses
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Manage favorite games
    #[command(subcommand)]
    Favorites(FavoritesCommand),

    /// Show or clear recently viewed games
    #[command(subcommand)]
    History(HistoryCommand),

    /// Manage the local profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Show favorites and history counts
    Stats,

    /// Look up games in the catalog
    #[command(subcommand)]
    Games(GamesCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CacheCommand {
    /// Show entry count, size and expired entries
    Stats,
    /// Delete expired entries
    ClearExpired,
    /// Delete every entry
    Clear,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum FavoritesCommand {
    /// List favorite games
    List,
    /// Add or update a favorite
    Add(FavoriteArgs),
    /// Remove a favorite
    Remove { id: GameId },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct FavoriteArgs {
    /// Game identifier
    pub id: GameId,
    /// Display name
    pub name: String,
    /// Background image URL
    #[arg(long)]
    pub image: Option<String>,
    /// Rating between 0 and 5
    #[arg(long, value_parser = parse_rating_arg)]
    pub rating: Option<f64>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum HistoryCommand {
    /// List recently viewed games, newest first
    List,
    /// Forget all viewed games
    Clear,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ProfileCommand {
    /// Show the stored profile
    Show,
    /// Log in locally
    Login { username: String, email: String },
    /// Continue as a guest
    Guest,
    /// Change name and email of the current profile
    Edit { username: String, email: String },
    /// Log out and remove the profile
    Logout,
    /// Accept the data disclaimer
    AcceptDisclaimer,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum GamesCommand {
    /// Search games by name
    Search {
        query: String,
        #[arg(long, default_value_t = SEARCH_PAGE_SIZE)]
        page_size: u32,
    },
    /// Show one game and record it in the history
    Details { id: GameId },
    /// Highest rated games
    Trending {
        #[arg(long, default_value_t = TRENDING_PAGE_SIZE)]
        page_size: u32,
    },
}

/// Parses a rating argument into a value between 0 and 5.
///
/// # Arguments
/// * `s` - The rating string from the CLI
///
/// # Returns
/// * `Ok(f64)` if the string is a number in range
/// * `Err(CliError::InvalidRating)` otherwise
pub fn parse_rating_arg(s: &str) -> Result<f64, CliError> {
    match s.trim().parse::<f64>() {
        Ok(rating) if (0.0..=MAX_RATING).contains(&rating) => Ok(rating),
        _ => Err(CliError::InvalidRating(s.to_string())),
    }
}
