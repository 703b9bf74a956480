//! ULSTU timetable CLI
//!
//! Local entry point for resolving identities and extracting timetables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use timetable::{
    error::{AppError, Result},
    models::{AuthConfig, Config},
    pipeline::{self, Extractor},
    services::{PageVariant, PortalSession},
    utils::http,
};

/// Environment variables overriding the configured credentials.
const LOGIN_ENV: &str = "TIMETABLE_LOGIN";
const PASSWORD_ENV: &str = "TIMETABLE_PASSWORD";

/// ULSTU timetable extractor
#[derive(Parser, Debug)]
#[command(
    name = "timetable",
    version,
    about = "Extracts lesson records from ULSTU timetable pages"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Timetable of a group, by number or name
    Group { query: String },

    /// Timetable of an instructor, by number or surname
    Teacher { query: String },

    /// List groups (or instructors) whose name contains the query
    Search {
        query: String,

        /// Search instructors instead of groups
        #[arg(long)]
        teachers: bool,

        /// Maximum number of hits
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Timetable behind a ready-made page URL
    Url { url: String },

    /// Extract every group in the configured range
    All {
        /// Write the report to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Extract a saved page without touching the network
    Parse {
        file: PathBuf,

        /// Treat the page as an instructor timetable
        #[arg(long)]
        teacher: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging; `--verbose` overrides the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Open a portal session, logging in when credentials are available.
async fn open_session(config: &Config) -> Result<PortalSession> {
    let mut session = PortalSession::new(&config.portal)?;
    let mut auth = config.auth.clone();
    if let Ok(login) = std::env::var(LOGIN_ENV) {
        auth.login = login;
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        auth.password = password;
    }

    require_credentials(&auth, config.portal.require_auth)?;
    if auth.is_empty() {
        return Ok(session);
    }

    if let Err(e) = session.authenticate(&auth).await {
        log::error!("Login failed: {e}");
        return Err(e);
    }
    Ok(session)
}

/// Refuse to go on without credentials when the portal requires a login.
fn require_credentials(auth: &AuthConfig, require_auth: bool) -> Result<()> {
    if require_auth && auth.is_empty() {
        log::error!("No credentials configured; set {LOGIN_ENV} and {PASSWORD_ENV}");
        return Err(AppError::NotAuthenticated);
    }
    Ok(())
}

/// Report a failed name lookup with its near matches.
fn report_not_found(error: &AppError) {
    if let AppError::NotFound { suggestions, .. } = error {
        if suggestions.is_empty() {
            log::warn!("No similar names known");
        } else {
            log::warn!("Did you mean: {}", suggestions.join(", "));
        }
    }
}

async fn read_page(path: &Path, config: &Config) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let encoding = http::encoding_for(&config.portal.encoding)?;
    Ok(http::decode_body(&bytes, encoding))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Config::load(&cli.config);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.as_str())
        .unwrap_or("info");
    init_logging(cli.verbose, level);

    let config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {e}. Using defaults.",
            cli.config.display()
        );
        Config::default()
    });

    log::debug!("Using configuration {}", cli.config.display());
    let extractor = Extractor::new(&config)?;
    let locator = extractor.locator();

    match cli.command {
        Command::Group { query } => {
            let identity = locator.find_group(&query).inspect_err(report_not_found)?;
            let session = open_session(&config).await?;
            print_json(&extractor.extract_identity(&session, &identity).await?)?;
        }

        Command::Teacher { query } => {
            let identity = locator.find_teacher(&query).inspect_err(report_not_found)?;
            let session = open_session(&config).await?;
            print_json(&extractor.extract_identity(&session, &identity).await?)?;
        }

        Command::Search {
            query,
            teachers,
            limit,
        } => {
            let hits = if teachers {
                locator.search_teachers(&query, limit)
            } else {
                locator.search_groups(&query, limit)
            };
            log::info!("{} match(es) for '{query}'", hits.len());
            print_json(&hits)?;
        }

        Command::Url { url } => {
            let session = open_session(&config).await?;
            print_json(&extractor.extract_url(&session, &url).await?)?;
        }

        Command::All { output } => {
            let session = open_session(&config).await?;
            let delay = Duration::from_millis(config.portal.request_delay_ms);
            let report = pipeline::run_bulk(&extractor, &session, delay).await?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, serde_json::to_string_pretty(&report)?).await?;
                    log::info!("Report saved to {}", path.display());
                }
                None => print_json(&report)?,
            }
        }

        Command::Parse { file, teacher } => {
            let html = read_page(&file, &config).await?;
            let variant = if teacher {
                PageVariant::Teacher
            } else {
                PageVariant::Group
            };
            let fallback = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            print_json(&extractor.extract_page(&html, variant, &fallback))?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {e}");
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} part(s), {} group name(s), {} instructor name(s))",
                config.groups.parts.len(),
                config.groups.entries.len(),
                config.teachers.entries.len()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(login: &str, password: &str) -> AuthConfig {
        AuthConfig {
            login: login.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_missing_credentials_stop_when_login_required() {
        let result = require_credentials(&credentials("", ""), true);
        assert!(matches!(result, Err(AppError::NotAuthenticated)));

        let result = require_credentials(&credentials("student", ""), true);
        assert!(matches!(result, Err(AppError::NotAuthenticated)));
    }

    #[test]
    fn test_credentials_present_or_not_required() {
        assert!(require_credentials(&credentials("student", "secret"), true).is_ok());
        assert!(require_credentials(&credentials("", ""), false).is_ok());
    }
}
