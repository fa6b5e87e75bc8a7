use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::{
    config::config::PokeApiConfig,
    pokemon::{
        models::{PokemonProvider, PokemonRecord, ProviderError},
        names::display_name,
    },
};

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u32,
}

#[derive(Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    species: NamedResource,
    sprites: Sprites,
    types: Vec<TypeSlot>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Sprites {
    other: Option<OtherSprites>,
}

#[derive(Debug, Deserialize)]
struct OtherSprites {
    #[serde(rename = "official-artwork")]
    official_artwork: Option<Artwork>,
}

#[derive(Debug, Deserialize)]
struct Artwork {
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    #[serde(rename = "type")]
    kind: NamedResource,
}

impl PokemonResponse {
    fn into_record(self) -> Option<PokemonRecord> {
        let image_url = self
            .sprites
            .other
            .and_then(|other| other.official_artwork)
            .and_then(|artwork| artwork.front_default)
            .filter(|url| !url.is_empty())?;

        let raw_name = if self.species.name.is_empty() {
            self.name
        } else {
            self.species.name
        };

        Some(PokemonRecord {
            id: self.id,
            name: display_name(&raw_name),
            image_url,
            types: self.types.into_iter().map(|slot| slot.kind.name).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PokeApiClient {
    client: Client,
    base_url: String,
}

impl PokeApiClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    pub fn from_config(config: &PokeApiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::new(client, &config.base_url))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        uri: &str,
    ) -> Result<Option<T>, ProviderError> {
        let url = format!("{}/{}", self.base_url, uri);
        debug!("PokeApiClient sending request to: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or("No body".into());
            error!("PokeApiClient request failed: {} - {}", status, body);
            return Err(ProviderError::ApiError(status, body));
        }

        Ok(Some(response.json::<T>().await?))
    }
}

#[async_trait]
impl PokemonProvider for PokeApiClient {
    async fn total_count(&self) -> Result<u32, ProviderError> {
        let Some(response) = self
            .get_json::<CountResponse>("pokemon-species?limit=1")
            .await?
        else {
            return Err(ProviderError::ApiError(
                StatusCode::NOT_FOUND,
                "Species listing is missing".into(),
            ));
        };

        info!("PokeAPI reports {} species", response.count);
        Ok(response.count)
    }

    async fn fetch(&self, id: u32) -> Result<Option<PokemonRecord>, ProviderError> {
        let response = self
            .get_json::<PokemonResponse>(&format!("pokemon/{}", id))
            .await?;

        Ok(response.and_then(PokemonResponse::into_record))
    }
}
