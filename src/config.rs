//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development on the display device.

use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Redirect URI registered with Google for the OAuth callback
    pub google_redirect_uri: String,
    /// Frontend URL allowed by CORS and targeted by the popup `postMessage`
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// JSON file holding the persisted OAuth tokens
    pub token_store_path: PathBuf,
    /// Timezone used for "today" and for HH:MM rain period labels
    pub display_timezone: Tz,
    /// City used when a weather request carries no location
    pub default_city: String,
    /// OpenWeatherMap unit system (`metric`, `imperial` or `standard`)
    pub weather_units: String,

    // --- Secrets ---
    /// OpenWeatherMap API key
    pub openweather_api_key: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// HMAC key for signing the OAuth state parameter (raw bytes)
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id".to_string(),
            google_redirect_uri: "http://localhost:8080/auth/google/callback".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            token_store_path: PathBuf::from("data/test-tokens.json"),
            display_timezone: Tz::UTC,
            default_city: "London".to_string(),
            weather_units: "metric".to_string(),
            openweather_api_key: "test_weather_key".to_string(),
            google_client_secret: "test_secret".to_string(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let display_timezone = match env::var("DISPLAY_TIMEZONE") {
            Ok(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::Invalid("DISPLAY_TIMEZONE", name))?,
            Err(_) => Tz::UTC,
        };

        let weather_units = env::var("WEATHER_UNITS").unwrap_or_else(|_| "metric".to_string());
        if !matches!(weather_units.as_str(), "metric" | "imperial" | "standard") {
            return Err(ConfigError::Invalid("WEATHER_UNITS", weather_units));
        }

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            google_redirect_uri: env::var("GOOGLE_REDIRECT_URI").unwrap_or_else(|_| {
                format!("http://localhost:{}/auth/google/callback", port)
            }),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port,
            token_store_path: env::var("TOKEN_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/tokens.json")),
            display_timezone,
            default_city: env::var("DEFAULT_CITY").unwrap_or_else(|_| "London".to_string()),
            weather_units,

            openweather_api_key: env::var("OPENWEATHER_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("OPENWEATHER_API_KEY"))?,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
