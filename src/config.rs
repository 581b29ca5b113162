use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStore {
    Mongo,
    Memory,
}

impl FromStr for DataStore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(DataStore::Mongo),
            "memory" => Ok(DataStore::Memory),
            other => Err(format!("Unknown DATA_STORE '{}'", other)),
        }
    }
}

/// Bearer token settings shared by the auth middleware and token minting
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Copy)]
pub struct FeedConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_store: DataStore,
    pub mongodb_uri: String,
    pub database_name: String,
    pub redis_url: Option<String>,
    pub auth: AuthConfig,
    pub feed: FeedConfig,
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} has an invalid value '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables (after `.env`)
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET is required")?;

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            default_limit: parsed("FEED_DEFAULT_LIMIT", defaults.default_limit)?,
            max_limit: parsed("FEED_MAX_LIMIT", defaults.max_limit)?,
        };
        if feed.default_limit < 1 || feed.max_limit < 1 {
            return Err("Feed limits must be positive".to_string());
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: parsed("PORT", 8000)?,
            data_store: parsed("DATA_STORE", DataStore::Mongo)?,
            mongodb_uri: env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "social_feed".to_string()),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            auth: AuthConfig { jwt_secret },
            feed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_store_names() {
        assert_eq!("mongo".parse::<DataStore>().unwrap(), DataStore::Mongo);
        assert_eq!(" Memory ".parse::<DataStore>().unwrap(), DataStore::Memory);
        assert!("postgres".parse::<DataStore>().is_err());
    }
}
