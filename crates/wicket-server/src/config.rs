use std::net::SocketAddr;

/// Secrets that ship in sample `.env` files and must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("WICKET_TOKEN_SECRET is a placeholder value; generate a random secret")]
    PlaceholderSecret,
    #[error("WICKET_TOKEN_SECRET must be at least 16 characters")]
    WeakSecret,
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub token_secret: String,
    pub host: String,
    pub port: u16,
    pub cookie_secure: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("token_secret", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let database_url = required("WICKET_DATABASE_URL")?;

        let token_secret = required("WICKET_TOKEN_SECRET")?;
        if PLACEHOLDER_SECRETS.contains(&token_secret.as_str()) {
            return Err(ConfigError::PlaceholderSecret);
        }
        if token_secret.chars().count() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let host = lookup("WICKET_HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port = match lookup("WICKET_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "WICKET_PORT",
                value: raw,
            })?,
            None => 3000,
        };

        let cookie_secure = match lookup("WICKET_COOKIE_SECURE") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "WICKET_COOKIE_SECURE",
                        value: raw,
                    });
                }
            },
            None => true,
        };

        Ok(Self {
            database_url,
            token_secret,
            host,
            port,
            cookie_secure,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            var: "WICKET_HOST",
            value: raw,
        })
    }
}
