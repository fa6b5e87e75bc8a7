use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use futures::future::join_all;
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    pokemon::models::{PokemonProvider, PokemonRecord, ProviderError},
    quiz::models::{GameSettings, OPTION_COUNT, Question},
};

pub const MIN_POOL_SIZE: usize = 80;
pub const POOL_MULTIPLIER: usize = 8;
pub const REQUIRED_MULTIPLIER: usize = 4;
pub const MAX_RETRY_ROUNDS: usize = 5;

const DISTRACTORS_PER_QUESTION: usize = OPTION_COUNT - 1;
const TYPED_DISTRACTORS: usize = 2;
const TYPED_DISTRACTORS_HARD: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Not enough distinct Pokémon with artwork: found {found}, need {required}")]
    InsufficientData { found: usize, required: usize },

    #[error("Pokémon provider failed: {0}")]
    Provider(#[from] ProviderError),
}

pub struct QuestionGenerator {
    provider: Arc<dyn PokemonProvider>,
    batch_size: usize,
    seed: Option<u64>,
}

impl QuestionGenerator {
    pub fn new(provider: Arc<dyn PokemonProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            seed: None,
        }
    }

    /// Fixed RNG seed, used by tests for reproducible question sets.
    #[cfg(test)]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn provider(&self) -> &Arc<dyn PokemonProvider> {
        &self.provider
    }

    pub async fn generate(&self, settings: &GameSettings) -> Result<Vec<Question>, GeneratorError> {
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let count = settings.question_count as usize;
        let pool = self.fetch_pool(count, &mut rng).await?;
        let questions = build_questions(pool, count, settings.hard_mode, &mut rng);

        info!(
            "Generated {} questions (hard mode: {})",
            questions.len(),
            settings.hard_mode
        );
        Ok(questions)
    }

    async fn fetch_pool(
        &self,
        count: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<PokemonRecord>, GeneratorError> {
        let required = count * REQUIRED_MULTIPLIER;
        let target = (count * POOL_MULTIPLIER).max(MIN_POOL_SIZE);
        let total = self.provider.total_count().await?;

        let mut tried: HashSet<u32> = HashSet::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut pool: Vec<PokemonRecord> = Vec::new();

        for round in 0..=MAX_RETRY_ROUNDS {
            if round > 0 {
                if pool.len() >= required {
                    break;
                }
                debug!(
                    "Pool has {} of {} required Pokémon, fetching round {}",
                    pool.len(),
                    required,
                    round
                );
            }

            let ids = untried_ids(total, &tried, target, rng);
            if ids.is_empty() {
                break;
            }
            tried.extend(ids.iter().copied());

            for batch in ids.chunks(self.batch_size) {
                let results = join_all(batch.iter().map(|id| self.provider.fetch(*id))).await;

                for (id, result) in batch.iter().zip(results) {
                    match result {
                        Ok(Some(record)) => {
                            if seen_names.insert(record.name.clone()) {
                                pool.push(record);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!("Skipping Pokémon {}: {}", id, e),
                    }
                }
            }
        }

        if pool.len() < required {
            return Err(GeneratorError::InsufficientData {
                found: pool.len(),
                required,
            });
        }

        Ok(pool)
    }
}

fn untried_ids(total: u32, tried: &HashSet<u32>, amount: usize, rng: &mut ChaCha8Rng) -> Vec<u32> {
    let mut candidates: Vec<u32> = (1..=total).filter(|id| !tried.contains(id)).collect();
    candidates.shuffle(rng);
    candidates.truncate(amount);
    candidates
}

/// Turns a deduplicated pool into `count` questions. The pool must hold at
/// least `count` records.
pub fn build_questions(
    mut pool: Vec<PokemonRecord>,
    count: usize,
    hard_mode: bool,
    rng: &mut ChaCha8Rng,
) -> Vec<Question> {
    pool.shuffle(rng);
    let distractors = pool.split_off(count.min(pool.len()));
    let answers = pool;

    let mut by_type: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, record) in distractors.iter().enumerate() {
        for kind in &record.types {
            by_type.entry(kind.as_str()).or_default().push(idx);
        }
    }

    let typed_quota = if hard_mode {
        TYPED_DISTRACTORS_HARD
    } else {
        TYPED_DISTRACTORS
    };

    let mut used: HashSet<String> = answers.iter().map(|a| a.name.clone()).collect();
    let mut questions = Vec::with_capacity(answers.len());

    for answer in &answers {
        let mut picked: Vec<String> = Vec::with_capacity(DISTRACTORS_PER_QUESTION);

        let mut typed: Vec<usize> = answer
            .types
            .iter()
            .filter_map(|kind| by_type.get(kind.as_str()))
            .flatten()
            .copied()
            .collect();
        typed.sort_unstable();
        typed.dedup();
        typed.shuffle(rng);

        pick_into(&mut picked, typed_quota, &typed, &distractors, answer, Some(&mut used));

        let mut general: Vec<usize> = (0..distractors.len()).collect();
        general.shuffle(rng);

        pick_into(
            &mut picked,
            DISTRACTORS_PER_QUESTION,
            &general,
            &distractors,
            answer,
            Some(&mut used),
        );

        if picked.len() < DISTRACTORS_PER_QUESTION {
            warn!(
                "Reusing distractors for {}, pool is nearly exhausted",
                answer.name
            );
            pick_into(
                &mut picked,
                DISTRACTORS_PER_QUESTION,
                &general,
                &distractors,
                answer,
                None,
            );
        }

        if picked.len() < DISTRACTORS_PER_QUESTION {
            let mut others: Vec<&PokemonRecord> =
                answers.iter().filter(|a| a.name != answer.name).collect();
            others.shuffle(rng);
            for other in others {
                if picked.len() >= DISTRACTORS_PER_QUESTION {
                    break;
                }
                if !picked.contains(&other.name) {
                    picked.push(other.name.clone());
                }
            }
        }

        let mut options = Vec::with_capacity(OPTION_COUNT);
        options.push(answer.name.clone());
        options.extend(picked);
        options.shuffle(rng);

        let correct_index = options
            .iter()
            .position(|option| *option == answer.name)
            .unwrap_or_default();

        questions.push(Question {
            question_id: Uuid::new_v4().to_string(),
            image_url: answer.image_url.clone(),
            options,
            correct_index,
            correct_name: answer.name.clone(),
            pokemon_id: answer.id,
        });
    }

    questions
}

/// Appends candidate names to `picked` until it holds `limit` entries.
/// With `used` set, names already taken in this pass are skipped and the
/// chosen ones are recorded.
fn pick_into(
    picked: &mut Vec<String>,
    limit: usize,
    candidates: &[usize],
    distractors: &[PokemonRecord],
    answer: &PokemonRecord,
    mut used: Option<&mut HashSet<String>>,
) {
    for &idx in candidates {
        if picked.len() >= limit {
            return;
        }

        let name = &distractors[idx].name;
        if *name == answer.name || picked.contains(name) {
            continue;
        }

        if let Some(used) = used.as_deref_mut() {
            if !used.insert(name.clone()) {
                continue;
            }
        }

        picked.push(name.clone());
    }
}
