//! Application state and command execution
//!
//! `App` owns the single response cache, user store and catalog client of the
//! process and hands out references to them; nothing is global.

use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::CatalogClient;
use crate::cache::ResponseCache;
use crate::cli::{
    CacheCommand, CliError, Command, FavoritesCommand, GamesCommand, HistoryCommand,
    ProfileCommand,
};
use crate::config::Config;
use crate::user::{GameId, GameSnapshot, StartScreen, UserStore};

/// Main application state
#[derive(Debug)]
pub struct App {
    pub cache: Arc<ResponseCache>,
    pub users: UserStore,
    pub client: CatalogClient,
}

impl App {
    /// Builds the cache, user store and client described by `config`
    pub fn from_config(config: &Config) -> Result<Self, CliError> {
        let cache_dir = config.cache_dir().ok_or(CliError::NoStorageLocation)?;
        let user_dir = config.user_dir().ok_or(CliError::NoStorageLocation)?;

        let cache = Arc::new(ResponseCache::open_dir(cache_dir, config.cache_ttl()?));
        let users = UserStore::open_dir(user_dir).with_history_cap(config.history_cap);
        if config.api_key.is_none() {
            warn!("no API key configured, catalog requests will likely be rejected");
        }
        let client = CatalogClient::from_config(config).with_cache(cache.clone());

        Ok(Self {
            cache,
            users,
            client,
        })
    }

    /// Runs one command, writing human-readable output to `out`
    pub async fn run<W: Write>(&self, command: Command, out: &mut W) -> Result<(), CliError> {
        match command {
            Command::Cache(cmd) => self.run_cache(cmd, out),
            Command::Favorites(cmd) => self.run_favorites(cmd, out),
            Command::History(cmd) => self.run_history(cmd, out),
            Command::Profile(cmd) => self.run_profile(cmd, out),
            Command::Stats => {
                let stats = self.users.stats();
                writeln!(out, "Viewed: {}", stats.viewed)?;
                writeln!(out, "Favorites: {}", stats.favorites)?;
                Ok(())
            }
            Command::Games(cmd) => self.run_games(cmd, out).await,
        }
    }

    fn run_cache<W: Write>(&self, cmd: CacheCommand, out: &mut W) -> Result<(), CliError> {
        match cmd {
            CacheCommand::Stats => {
                let stats = self.cache.stats();
                writeln!(out, "Cached items: {}", stats.count)?;
                writeln!(out, "Cache size: {} MB", stats.size_mb())?;
                writeln!(out, "Expired items: {}", stats.expired_count)?;
            }
            CacheCommand::ClearExpired => {
                let cleared = self.cache.clear_expired();
                info!(cleared, "cleared expired cache entries");
                writeln!(out, "Cleared {} expired cache items", cleared)?;
            }
            CacheCommand::Clear => {
                let cleared = self.cache.clear_all();
                info!(cleared, "cleared cache");
                writeln!(out, "Cleared {} cache items", cleared)?;
            }
        }
        Ok(())
    }

    fn run_favorites<W: Write>(&self, cmd: FavoritesCommand, out: &mut W) -> Result<(), CliError> {
        match cmd {
            FavoritesCommand::List => {
                let favorites = self.users.favorites();
                if favorites.is_empty() {
                    writeln!(out, "No favorites yet")?;
                }
                for (id, snapshot) in &favorites {
                    writeln!(out, "{}", format_game_line(*id, snapshot))?;
                }
            }
            FavoritesCommand::Add(args) => {
                let snapshot = GameSnapshot {
                    name: args.name,
                    image: args.image,
                    rating: args.rating,
                };
                self.users.add_favorite(args.id, snapshot);
                writeln!(out, "Added {} to favorites", args.id)?;
            }
            FavoritesCommand::Remove { id } => {
                self.users.remove_favorite(id);
                writeln!(out, "Removed {} from favorites", id)?;
            }
        }
        Ok(())
    }

    fn run_history<W: Write>(&self, cmd: HistoryCommand, out: &mut W) -> Result<(), CliError> {
        match cmd {
            HistoryCommand::List => {
                let history = self.users.recent_history();
                if history.is_empty() {
                    writeln!(out, "No history yet")?;
                }
                for entry in &history {
                    writeln!(out, "{}", format_game_line(entry.id, &entry.snapshot))?;
                }
            }
            HistoryCommand::Clear => {
                self.users.clear_history();
                writeln!(out, "History cleared")?;
            }
        }
        Ok(())
    }

    fn run_profile<W: Write>(&self, cmd: ProfileCommand, out: &mut W) -> Result<(), CliError> {
        match cmd {
            ProfileCommand::Show => {
                let profile = self.users.profile().ok_or(CliError::NotLoggedIn)?;
                writeln!(out, "Username: {}", profile.username)?;
                writeln!(out, "Email: {}", profile.email)?;
                writeln!(
                    out,
                    "Session: {}",
                    if profile.logged_in { "member" } else { "guest" }
                )?;
                writeln!(
                    out,
                    "Disclaimer accepted: {}",
                    if profile.disclaimer_accepted { "yes" } else { "no" }
                )?;
            }
            ProfileCommand::Login { username, email } => {
                let profile = self.users.login(&username, &email);
                writeln!(out, "Logged in as {}", profile.username)?;
            }
            ProfileCommand::Guest => {
                self.users.continue_as_guest();
                writeln!(out, "Continuing as guest")?;
            }
            ProfileCommand::Edit { username, email } => {
                let profile = self
                    .users
                    .update_profile(&username, &email)
                    .ok_or(CliError::NotLoggedIn)?;
                writeln!(out, "Profile updated for {}", profile.username)?;
            }
            ProfileCommand::Logout => {
                self.users.delete_profile();
                writeln!(out, "Logged out")?;
            }
            ProfileCommand::AcceptDisclaimer => {
                self.users.accept_disclaimer();
                writeln!(out, "Disclaimer accepted")?;
            }
        }
        Ok(())
    }

    async fn run_games<W: Write>(&self, cmd: GamesCommand, out: &mut W) -> Result<(), CliError> {
        if self.users.start_screen() == StartScreen::Disclaimer {
            warn!("disclaimer not accepted yet, run `gamedex profile accept-disclaimer`");
        }
        match cmd {
            GamesCommand::Search { query, page_size } => {
                let data = self.client.search_games(&query, page_size).await?;
                write_results(&data, out)?;
            }
            GamesCommand::Trending { page_size } => {
                let data = self.client.trending(page_size).await?;
                write_results(&data, out)?;
            }
            GamesCommand::Details { id } => {
                let details = self.client.game_details(id).await?;
                let snapshot = GameSnapshot::from_details(&details);
                self.users.record_view(id, snapshot.clone());
                writeln!(out, "{}", format_game_line(id, &snapshot))?;
                if let Some(released) = details.get("released").and_then(Value::as_str) {
                    writeln!(out, "Released: {}", released)?;
                }
                if self.users.is_favorite(id) {
                    writeln!(out, "In favorites")?;
                }
            }
        }
        Ok(())
    }
}

/// One line per game: id, name and rating
fn format_game_line(id: GameId, snapshot: &GameSnapshot) -> String {
    match snapshot.rating {
        Some(rating) => format!("{:>8}  {} ({:.2})", id, snapshot.name, rating),
        None => format!("{:>8}  {} (N/A)", id, snapshot.name),
    }
}

/// Prints the `results` array of a games listing
fn write_results<W: Write>(data: &Value, out: &mut W) -> std::io::Result<()> {
    let results = data
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if results.is_empty() {
        writeln!(out, "No games found")?;
    }
    for game in results {
        let id = game.get("id").and_then(Value::as_u64).unwrap_or_default();
        writeln!(out, "{}", format_game_line(id, &GameSnapshot::from_details(game)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{params, Params};
    use crate::cli::FavoriteArgs;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_app() -> (App, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config {
            data_dir: Some(temp_dir.path().to_path_buf()),
            api_base_url: "http://127.0.0.1:9/api".to_string(),
            ..Default::default()
        };
        let app = App::from_config(&config).expect("App should build with a data dir");
        (app, temp_dir)
    }

    async fn run(app: &App, command: Command) -> Result<String, CliError> {
        let mut out = Vec::new();
        app.run(command, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_cache_commands_on_empty_cache() {
        let (app, _temp_dir) = create_test_app();

        let output = run(&app, Command::Cache(CacheCommand::Stats)).await.unwrap();
        assert!(output.contains("Cached items: 0"));
        assert!(output.contains("Expired items: 0"));

        let output = run(&app, Command::Cache(CacheCommand::Clear)).await.unwrap();
        assert!(output.contains("Cleared 0 cache items"));
    }

    #[tokio::test]
    async fn test_cache_clear_counts_entries() {
        let (app, temp_dir) = create_test_app();
        app.cache.set("games", &params([("page", "1")]), &json!({"results": []}));
        app.cache.set("games", &params([("page", "2")]), &json!({"results": []}));
        assert!(temp_dir.path().join("cache").is_dir());

        let output = run(&app, Command::Cache(CacheCommand::Stats)).await.unwrap();
        assert!(output.contains("Cached items: 2"));

        let output = run(&app, Command::Cache(CacheCommand::Clear)).await.unwrap();
        assert!(output.contains("Cleared 2 cache items"));
    }

    #[tokio::test]
    async fn test_favorites_commands() {
        let (app, _temp_dir) = create_test_app();

        run(
            &app,
            Command::Favorites(FavoritesCommand::Add(FavoriteArgs {
                id: 3498,
                name: "Grand Theft Auto V".to_string(),
                image: None,
                rating: Some(4.47),
            })),
        )
        .await
        .unwrap();

        let output = run(&app, Command::Favorites(FavoritesCommand::List)).await.unwrap();
        assert!(output.contains("3498"));
        assert!(output.contains("Grand Theft Auto V (4.47)"));

        run(&app, Command::Favorites(FavoritesCommand::Remove { id: 3498 }))
            .await
            .unwrap();
        let output = run(&app, Command::Favorites(FavoritesCommand::List)).await.unwrap();
        assert!(output.contains("No favorites yet"));
    }

    #[tokio::test]
    async fn test_profile_flow() {
        let (app, _temp_dir) = create_test_app();

        let result = run(&app, Command::Profile(ProfileCommand::Show)).await;
        assert!(matches!(result, Err(CliError::NotLoggedIn)));

        run(&app, Command::Profile(ProfileCommand::Guest)).await.unwrap();
        let output = run(&app, Command::Profile(ProfileCommand::Show)).await.unwrap();
        assert!(output.contains("Username: Guest"));
        assert!(output.contains("Session: guest"));

        run(&app, Command::Profile(ProfileCommand::Logout)).await.unwrap();
        assert!(!app.users.is_logged_in());
    }

    #[tokio::test]
    async fn test_details_served_from_cache_records_history() {
        let (app, _temp_dir) = create_test_app();
        app.cache.set(
            "games/42",
            &Params::new(),
            &json!({"id": 42, "name": "Portal 2", "rating": 4.6, "released": "2011-04-18"}),
        );

        let output = run(&app, Command::Games(GamesCommand::Details { id: 42 }))
            .await
            .unwrap();

        assert!(output.contains("Portal 2 (4.60)"));
        assert!(output.contains("Released: 2011-04-18"));
        let history = app.users.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, 42);

        let output = run(&app, Command::History(HistoryCommand::List)).await.unwrap();
        assert!(output.contains("Portal 2"));
    }

    #[tokio::test]
    async fn test_search_renders_cached_results() {
        let (app, _temp_dir) = create_test_app();
        app.cache.set(
            "games",
            &params([("search", "zelda"), ("page_size", "15")]),
            &json!({"results": [
                {"id": 1, "name": "Breath of the Wild", "rating": 4.5},
                {"id": 2, "name": "Ocarina of Time"}
            ]}),
        );

        let output = run(
            &app,
            Command::Games(GamesCommand::Search {
                query: "zelda".to_string(),
                page_size: 15,
            }),
        )
        .await
        .unwrap();

        assert!(output.contains("Breath of the Wild (4.50)"));
        assert!(output.contains("Ocarina of Time (N/A)"));
    }

    #[test]
    fn test_format_game_line() {
        let snapshot = GameSnapshot {
            name: "Hades".to_string(),
            image: None,
            rating: None,
        };
        assert_eq!(format_game_line(7, &snapshot), "       7  Hades (N/A)");
    }
}
