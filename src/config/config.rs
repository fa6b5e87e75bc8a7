use ::config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::quiz::service::DEFAULT_MAX_PLAYERS;

pub static CONFIG: Lazy<AppConfig> =
    Lazy::new(|| AppConfig::load().unwrap_or_else(|e| panic!("Failed to load config: {}", e)));

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub quiz: QuizConfig,
    pub pokeapi: PokeApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub ttl_secs: i64,
    pub lock_timeout_ms: u64,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuizConfig {
    pub max_players: usize,
    pub base_points: u32,
    pub max_bonus: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PokeApiConfig {
    pub base_url: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Defaults, then `quiz.toml` if present, then `QUIZ__SECTION__KEY` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.address", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("store.ttl_secs", 3600)?
            .set_default("store.lock_timeout_ms", 2000)?
            .set_default("store.cleanup_interval_secs", 300)?
            .set_default("quiz.max_players", DEFAULT_MAX_PLAYERS as u64)?
            .set_default("quiz.base_points", 200)?
            .set_default("quiz.max_bonus", 200)?
            .set_default("pokeapi.base_url", "https://pokeapi.co/api/v2")?
            .set_default("pokeapi.batch_size", 20)?
            .set_default("pokeapi.timeout_secs", 10)?
            .add_source(File::with_name("quiz").required(false))
            .add_source(
                Environment::with_prefix("QUIZ")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use crate::quiz::service::DEFAULT_MAX_PLAYERS;

    #[test]
    fn defaults_load_without_any_source() {
        let config = AppConfig::load().unwrap();

        assert_eq!(config.quiz.max_players, DEFAULT_MAX_PLAYERS);
        assert_eq!(config.quiz.base_points, 200);
        assert_eq!(config.quiz.max_bonus, 200);
        assert_eq!(config.store.ttl_secs, 3600);
        assert!(config.pokeapi.batch_size > 0);
    }
}
