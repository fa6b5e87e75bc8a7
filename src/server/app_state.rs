use std::{sync::Arc, time::Duration};

use crate::{
    config::config::AppConfig,
    key_vault::key_vault::KeyVault,
    pokemon::{client::PokeApiClient, models::PokemonProvider},
    quiz::{generator::QuestionGenerator, scoring::ScoringRules, service::QuizService},
    server::error::ServerError,
    session::store::SessionStore,
};

pub struct AppState {
    quiz_service: QuizService,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Arc<Self>, ServerError> {
        let client = PokeApiClient::from_config(&config.pokeapi)
            .map_err(|e| ServerError::Internal(format!("Failed to build PokeAPI client: {}", e)))?;

        let state = Self::with_provider(config, Arc::new(client));
        state.spawn_cleanup(config);

        Ok(state)
    }

    /// Builds the state around any provider, without background tasks.
    pub fn with_provider(config: &AppConfig, provider: Arc<dyn PokemonProvider>) -> Arc<Self> {
        let store = SessionStore::from_config(&config.store);
        let vault = KeyVault::new();
        let generator = QuestionGenerator::new(provider, config.pokeapi.batch_size);
        let rules = ScoringRules::from(&config.quiz);

        let quiz_service =
            QuizService::new(store, vault, generator, rules, config.quiz.max_players);

        Arc::new(Self { quiz_service })
    }

    fn spawn_cleanup(&self, config: &AppConfig) {
        let every = Duration::from_secs(config.store.cleanup_interval_secs);
        self.quiz_service.spawn_cleanup(every);
    }

    pub fn get_quiz_service(&self) -> &QuizService {
        &self.quiz_service
    }
}
