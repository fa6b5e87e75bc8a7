use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::level_filters::LevelFilter;

use crate::{
    config::config::{AppConfig, PokeApiConfig, QuizConfig, ServerConfig, StoreConfig},
    key_vault::key_vault::KeyVault,
    pokemon::models::{PokemonProvider, PokemonRecord, ProviderError},
    quiz::{
        generator::QuestionGenerator,
        models::{GameSession, GameSettings},
        scoring::ScoringRules,
        service::{DEFAULT_MAX_PLAYERS, QuizService},
    },
    session::store::SessionStore,
};

pub const TYPES: [&str; 3] = ["fire", "water", "grass"];

pub fn setup_logging() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn record(id: u32, name: &str) -> PokemonRecord {
    PokemonRecord {
        id,
        name: name.to_string(),
        image_url: format!("https://img.test/{}.png", id),
        types: vec![TYPES[id as usize % TYPES.len()].to_string()],
    }
}

/// In-memory provider. Ids missing from `records` behave like Pokémon
/// without artwork.
pub struct FakeProvider {
    records: HashMap<u32, PokemonRecord>,
    total: u32,
    failing_ids: Vec<u32>,
    fail_count: bool,
    fetched: AtomicUsize,
}

impl FakeProvider {
    pub fn with_species(count: u32) -> Self {
        let records = (1..=count).map(|id| record(id, &format!("Species{}", id)));
        Self::from_records(count, records)
    }

    pub fn from_records(total: u32, records: impl IntoIterator<Item = PokemonRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id, r)).collect(),
            total,
            failing_ids: vec![],
            fail_count: false,
            fetched: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, ids: Vec<u32>) -> Self {
        self.failing_ids = ids;
        self
    }

    pub fn unreachable() -> Self {
        let mut provider = Self::with_species(0);
        provider.fail_count = true;
        provider
    }

    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }

    pub fn lookup(&self, name: &str) -> Option<&PokemonRecord> {
        self.records.values().find(|r| r.name == name)
    }
}

#[async_trait]
impl PokemonProvider for FakeProvider {
    async fn total_count(&self) -> Result<u32, ProviderError> {
        if self.fail_count {
            return Err(ProviderError::ApiError(
                StatusCode::SERVICE_UNAVAILABLE,
                "down".into(),
            ));
        }
        Ok(self.total)
    }

    async fn fetch(&self, id: u32) -> Result<Option<PokemonRecord>, ProviderError> {
        self.fetched.fetch_add(1, Ordering::SeqCst);
        if self.failing_ids.contains(&id) {
            return Err(ProviderError::ApiError(
                StatusCode::INTERNAL_SERVER_ERROR,
                "boom".into(),
            ));
        }
        Ok(self.records.get(&id).cloned())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            address: "127.0.0.1".into(),
            port: 0,
        },
        store: StoreConfig {
            ttl_secs: 3600,
            lock_timeout_ms: 2000,
            cleanup_interval_secs: 300,
        },
        quiz: QuizConfig {
            max_players: DEFAULT_MAX_PLAYERS,
            base_points: 200,
            max_bonus: 200,
        },
        pokeapi: PokeApiConfig {
            base_url: "http://pokeapi.invalid".into(),
            batch_size: 20,
            timeout_secs: 1,
        },
    }
}

pub fn test_store() -> SessionStore {
    SessionStore::new(chrono::Duration::hours(1), Duration::from_secs(2))
}

pub fn service_with(provider: Arc<FakeProvider>) -> QuizService {
    build_service(provider, test_store())
}

pub fn service_with_store(store: SessionStore) -> QuizService {
    build_service(Arc::new(FakeProvider::with_species(200)), store)
}

fn build_service(provider: Arc<FakeProvider>, store: SessionStore) -> QuizService {
    let generator = QuestionGenerator::new(provider, 20).with_seed(7);
    QuizService::new(
        store,
        KeyVault::new(),
        generator,
        ScoringRules::default(),
        DEFAULT_MAX_PLAYERS,
    )
}

pub fn test_service() -> QuizService {
    service_with(Arc::new(FakeProvider::with_species(200)))
}

pub fn settings(question_count: u8) -> GameSettings {
    GameSettings {
        question_count,
        time_per_question: 15,
        hard_mode: false,
    }
}

pub async fn load(service: &QuizService, session_id: &str) -> GameSession {
    service
        .store()
        .get(session_id)
        .await
        .unwrap()
        .expect("session should exist")
}

/// An option index that is not the correct one.
pub fn wrong_index(correct_index: usize) -> i8 {
    ((correct_index + 1) % 4) as i8
}
