use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PokemonRecord {
    pub id: u32,
    /// Display name, already normalized.
    pub name: String,
    pub image_url: String,
    pub types: Vec<String>,
}

impl PokemonRecord {
    #[cfg(test)]
    pub fn shares_type(&self, other: &PokemonRecord) -> bool {
        self.types.iter().any(|t| other.types.contains(t))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Api error: {0} - {1}")]
    ApiError(StatusCode, String),
}

/// Source of Pokémon records. Records without artwork come back as `None`.
#[async_trait]
pub trait PokemonProvider: Send + Sync {
    async fn total_count(&self) -> Result<u32, ProviderError>;

    async fn fetch(&self, id: u32) -> Result<Option<PokemonRecord>, ProviderError>;
}
