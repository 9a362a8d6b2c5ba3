use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expires_in_days: i64,
    pub cloudinary: Option<CloudinaryConfig>,
    pub uploads_dir: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let server_address = match env::var("SERVER_ADDRESS") {
            Ok(addr) => addr,
            Err(_) => format!("0.0.0.0:{}", get_env_or("PORT", "5000")),
        };

        Ok(Self {
            server_address,
            database_url: get_optional_env("DATABASE_URL"),
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_expires_in_days: get_env_parse_or("JWT_EXPIRES_IN_DAYS", 30)?,
            cloudinary: cloudinary_from_env(),
            uploads_dir: get_env_or("UPLOADS_DIR", "uploads"),
            public_base_url: get_env_or("PUBLIC_BASE_URL", "")
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

fn cloudinary_from_env() -> Option<CloudinaryConfig> {
    Some(CloudinaryConfig {
        cloud_name: get_optional_env("CLOUDINARY_CLOUD_NAME")?,
        api_key: get_optional_env("CLOUDINARY_API_KEY")?,
        api_secret: get_optional_env("CLOUDINARY_API_SECRET")?,
    })
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_optional_env(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
