//! Process settings from environment variables (a `.env` file is loaded by the binary first).

use crate::error::ConfigError;
use sqlx::postgres::PgConnectOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_RESOURCE_ROOT: &str = "resources";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, Default)]
pub struct DatabaseSettings {
    /// `DATABASE_URL`; takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        if let Some(url) = &self.url {
            return url
                .parse::<PgConnectOptions>()
                .map_err(|e| ConfigError::Settings(format!("DATABASE_URL: {}", e)));
        }
        let mut options = PgConnectOptions::new().host(&self.host).port(self.port);
        if let Some(name) = &self.name {
            options = options.database(name);
        }
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        Ok(options)
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    /// Include fault detail in error responses. Off in production.
    pub display_error_details: bool,
    /// Answer `OPTIONS` preflight on any path with permissive CORS headers.
    pub cors: bool,
    pub listen_addr: String,
    pub resource_root: PathBuf,
    pub body_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database: DatabaseSettings {
                host: "127.0.0.1".into(),
                port: 5432,
                ..Default::default()
            },
            display_error_details: false,
            cors: false,
            listen_addr: DEFAULT_LISTEN_ADDR.into(),
            resource_root: PathBuf::from(DEFAULT_RESOURCE_ROOT),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

fn parse_flag(value: Option<String>) -> bool {
    matches!(value.as_deref().map(str::trim), Some("true") | Some("TRUE"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let port = match non_empty(lookup("DB_PORT")) {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(p) if p > 0 => p,
                _ => return Err(ConfigError::Settings(format!("DB_PORT must be 1-65535, got '{}'", raw))),
            },
            None => defaults.database.port,
        };
        let body_limit = match non_empty(lookup("BODY_LIMIT")) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Settings(format!("BODY_LIMIT must be a byte count, got '{}'", raw)))?,
            None => defaults.body_limit,
        };

        Ok(Settings {
            database: DatabaseSettings {
                url: non_empty(lookup("DATABASE_URL")),
                host: non_empty(lookup("DB_HOST")).unwrap_or(defaults.database.host),
                port,
                name: non_empty(lookup("DB_NAME")),
                user: non_empty(lookup("DB_USER")),
                password: non_empty(lookup("DB_PASSWORD")),
            },
            display_error_details: parse_flag(lookup("DISPLAY_ERROR_DETAILS")),
            cors: parse_flag(lookup("CORS")),
            listen_addr: non_empty(lookup("LISTEN_ADDR")).unwrap_or(defaults.listen_addr),
            resource_root: non_empty(lookup("RESOURCE_ROOT"))
                .map(PathBuf::from)
                .unwrap_or(defaults.resource_root),
            body_limit,
        })
    }
}

/// Single-quote a value so dotenv reads it literally: no `$` expansion, no ` #` comments.
/// An embedded `'` closes the quote, is escaped, and reopens it.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Contents of a `.env` file produced by `resource-forge init`.
#[derive(Clone, Debug)]
pub struct EnvFile {
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub display_error_details: bool,
    pub cors: bool,
}

impl EnvFile {
    pub fn render(&self) -> String {
        self.lines(&self.db_password)
    }

    /// Same as `render` with the password masked, for confirmation prompts.
    pub fn preview(&self) -> String {
        self.lines("********")
    }

    fn lines(&self, password: &str) -> String {
        format!(
            "DB_HOST={}\nDB_PORT={}\nDB_NAME={}\nDB_USER={}\nDB_PASSWORD={}\nDISPLAY_ERROR_DETAILS={}\nCORS={}\n",
            quote(&self.db_host),
            self.db_port,
            quote(&self.db_name),
            quote(&self.db_user),
            quote(password),
            self.display_error_details,
            self.cors
        )
    }

    /// Write the file. Unless `overwrite`, an existing file is left alone and
    /// the error kind is `AlreadyExists`.
    pub fn write_to(&self, path: &Path, overwrite: bool) -> std::io::Result<()> {
        let mut options = std::fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut file = options.open(path)?;
        file.write_all(self.render().as_bytes())?;
        file.sync_all()
    }
}
