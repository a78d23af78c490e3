use std::{env, path::PathBuf};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
    pub upload_folder: PathBuf,
    pub max_file_size: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to defaults
    /// for everything except the database URL and the JWT secret.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("APP_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3333);
        let jwt_expires_hours = lookup("JWT_EXPIRES_HOURS")
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24 * 7);
        let upload_folder = lookup("UPLOAD_FOLDER")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("uploads"));
        let max_file_size = lookup("MAX_FILE_SIZE")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(5 * 1024 * 1024);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            jwt_expires_hours,
            upload_folder,
            max_file_size,
        })
    }
}
