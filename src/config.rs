use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Simple Image CRUD API")]
pub struct Args {
    /// Host to bind to (overrides IMAGE_API_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides IMAGE_API_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides IMAGE_API_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    ///
    /// Object-store credentials are environment-only (the names come from the
    /// provider's conventions) and have no defaults: a missing one is a
    /// startup error, not a per-request surprise.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("IMAGE_API_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("IMAGE_API_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing IMAGE_API_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3400,
            Err(err) => return Err(err).context("reading IMAGE_API_PORT"),
        };
        let env_db = env::var("IMAGE_API_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/images.db".into());

        let cloud_name =
            env::var("CLOUDINARY_CLOUD_NAME").context("reading CLOUDINARY_CLOUD_NAME")?;
        let api_key = env::var("CLOUDINARY_API_KEY").context("reading CLOUDINARY_API_KEY")?;
        let api_secret =
            env::var("CLOUDINARY_API_SECRET").context("reading CLOUDINARY_API_SECRET")?;

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            cloud_name,
            api_key,
            api_secret,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Keep credentials out of startup logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
