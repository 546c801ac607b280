use crate::prelude::{eprintln, *};
use clap::Parser;
use std::sync::Arc;

use crate::client::ApiClient;
use crate::config::ApiConfig;
use crate::cookie_cache::CookieCache;
use crate::session::SessionStore;

mod articles;
mod auth;
mod books;
mod client;
mod config;
mod cookie_cache;
mod error;
mod favorites;
mod prelude;
mod session;

#[cfg(test)]
mod testing;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Command-line client for the LibraryHub library management API"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Backend API base URL
    #[clap(long, env = "LIBRARYHUB_API_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Cookies to forward to the backend, as "name=value; name2=value2"
    #[clap(long, env = "LIBRARYHUB_COOKIE", global = true, hide_env_values = true)]
    cookie: Option<String>,

    /// Don't load or save the session cookie cache
    #[clap(long, global = true)]
    no_cookie_cache: bool,

    /// Whether to display additional information.
    #[clap(long, env = "LIBRARYHUB_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Login, registration and account management
    #[clap(subcommand)]
    Auth(crate::auth::Commands),

    /// Search, details, borrowing and reviews
    #[clap(subcommand)]
    Books(crate::books::Commands),

    /// Favorite books
    #[clap(subcommand)]
    Favorites(crate::favorites::Commands),

    /// Announcements and image uploads
    #[clap(subcommand)]
    Articles(crate::articles::Commands),
}

fn open_cookie_cache(global: &Global) -> Option<CookieCache> {
    if global.no_cookie_cache {
        return None;
    }
    match CookieCache::default_location() {
        Ok(cache) => Some(cache),
        Err(e) => {
            log::warn!("Cookie cache disabled: {e}");
            None
        }
    }
}

fn build_client(config: &ApiConfig, cache: Option<&CookieCache>) -> Result<ApiClient> {
    let jar = Arc::new(reqwest::cookie::Jar::default());

    if let Some(cache) = cache {
        if let Some(cookies) = cache.load(&config.base_url)? {
            let url = reqwest::Url::parse(&config.base_url)
                .map_err(|e| eyre!("Invalid base URL {}: {e}", config.base_url))?;
            crate::cookie_cache::restore_into(&jar, &url, &cookies);
            log::debug!("Restored cookies from {}", cache.path().display());
        }
    }

    Ok(ApiClient::with_jar(config, SessionStore::new(), jar)?)
}

/// Keep the jar for the next run, or drop it after a successful logout.
fn persist_cookies(cache: &CookieCache, client: &ApiClient, config: &ApiConfig, logged_out: bool) {
    let result = if logged_out {
        cache.clear()
    } else {
        match client.backend_cookies() {
            Some(cookies) => cache.save(&config.base_url, &cookies),
            None => Ok(()),
        }
    };

    if let Err(e) = result {
        log::warn!("Failed to update cookie cache: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    let config = ApiConfig::from_env()
        .with_overrides(app.global.base_url.clone(), app.global.cookie.clone());
    let cache = open_cookie_cache(&app.global);
    let client = build_client(&config, cache.as_ref())?;

    if app.global.verbose {
        eprintln!("Using backend {}", config.base_url);
    }

    let logout = matches!(app.command, SubCommands::Auth(crate::auth::Commands::Logout));

    let result = match app.command {
        SubCommands::Auth(cmd) => crate::auth::run(cmd, &client, &app.global).await,
        SubCommands::Books(cmd) => crate::books::run(cmd, &client, &app.global).await,
        SubCommands::Favorites(cmd) => crate::favorites::run(cmd, &client, &app.global).await,
        SubCommands::Articles(cmd) => crate::articles::run(cmd, &client, &app.global).await,
    };

    if let Some(cache) = &cache {
        persist_cookies(cache, &client, &config, logout && result.is_ok());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestServer;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_login_cookies_survive_restart() {
        let server = TestServer::spawn().await;
        let dir = tempfile::tempdir().unwrap();
        let cache = CookieCache::in_dir(dir.path());
        let config = server.config();

        let first = build_client(&config, Some(&cache)).unwrap();
        crate::auth::login_data(
            &first,
            &crate::auth::LoginRequest {
                username: "reader".into(),
                password: "pw".into(),
            },
        )
        .await
        .unwrap();
        persist_cookies(&cache, &first, &config, false);

        let second = build_client(&config, Some(&cache)).unwrap();
        let _: Option<Value> = second
            .post("/book/collections/add/1", &json!({}), &Default::default())
            .await
            .unwrap();

        let last = server.requests().await.pop().unwrap();
        assert_eq!(last.header("cookie"), Some(crate::testing::SESSION_COOKIE));
    }

    #[tokio::test]
    async fn test_logout_clears_cache() {
        let server = TestServer::spawn().await;
        let dir = tempfile::tempdir().unwrap();
        let cache = CookieCache::in_dir(dir.path());
        let config = server.config();
        cache.save(&config.base_url, "SESSION=old").unwrap();

        let client = build_client(&config, Some(&cache)).unwrap();
        crate::auth::logout_data(&client).await.unwrap();
        persist_cookies(&cache, &client, &config, true);

        assert!(!cache.path().exists());
    }

    #[test]
    fn test_cli_parses_nested_subcommands() {
        let app = App::try_parse_from([
            "libraryhub",
            "--base-url",
            "http://lib.test/api",
            "books",
            "comments",
            "42",
            "--page",
            "2",
        ])
        .unwrap();

        assert_eq!(app.global.base_url.as_deref(), Some("http://lib.test/api"));
        match app.command {
            SubCommands::Books(crate::books::Commands::Comments(options)) => {
                assert_eq!(options.book_id, 42);
                assert_eq!(options.page, 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
