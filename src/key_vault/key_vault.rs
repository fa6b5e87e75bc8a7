use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, warn};

/// 0/O and 1/I/L are left out so codes survive being read aloud. That leaves
/// 26 + 10 - 5 = 31 symbols.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LENGTH: usize = 4;
pub const MAX_ATTEMPTS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum KeyVaultError {
    #[error("No more available room codes")]
    FullCapacity,
}

/// Hands out room codes and maps them back to their session.
#[derive(Debug, Clone)]
pub struct KeyVault {
    /// Room code to session id.
    active_keys: Arc<DashMap<String, String>>,
}

impl KeyVault {
    pub fn new() -> Self {
        Self {
            active_keys: Arc::new(DashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn key_active(&self, code: &str) -> bool {
        self.active_keys.contains_key(&normalize(code))
    }

    pub fn active_count(&self) -> usize {
        self.active_keys.len()
    }

    pub fn lookup(&self, code: &str) -> Option<String> {
        self.active_keys
            .get(&normalize(code))
            .map(|entry| entry.value().clone())
    }

    /// Releases `code` only while it is still bound to `session_id`, so a
    /// stale release never unbinds a code handed to a newer session.
    pub fn remove_key(&self, code: &str, session_id: &str) {
        let removed = self
            .active_keys
            .remove_if(&normalize(code), |_, bound| bound == session_id);

        if removed.is_some() {
            debug!("Released room code {}", code);
        }
    }

    /// Allocates a code and binds it to `session_id` in one step.
    pub fn create_key(&self, session_id: &str) -> Result<String, KeyVaultError> {
        let mut rng = ChaCha8Rng::from_os_rng();
        let result = allocate(&mut rng, |code| match self.active_keys.entry(code.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(session_id.to_string());
                true
            }
        });

        if result.is_err() {
            error!(
                "KeyVault failed to allocate a room code with {} active codes",
                self.active_keys.len()
            );
        }

        result
    }

    /// Drops every code whose session `is_live` no longer reports.
    pub fn release_orphans<F>(&self, is_live: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let keys_before = self.active_keys.len();
        self.active_keys.retain(|_, session_id| is_live(session_id));
        let removed_keys = keys_before.saturating_sub(self.active_keys.len());

        if removed_keys > 0 {
            warn!(
                "Released {} room codes whose sessions expired before finishing",
                removed_keys
            );
        }

        removed_keys
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn random_code<R: Rng>(rng: &mut R) -> String {
    (0..ROOM_CODE_LENGTH)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Rejection samples codes until `claim` accepts one, for at most
/// `MAX_ATTEMPTS` draws.
pub fn allocate<R, F>(rng: &mut R, mut claim: F) -> Result<String, KeyVaultError>
where
    R: Rng,
    F: FnMut(&str) -> bool,
{
    for _ in 0..MAX_ATTEMPTS {
        let code = random_code(rng);
        if claim(&code) {
            return Ok(code);
        }
    }

    Err(KeyVaultError::FullCapacity)
}

impl Default for KeyVault {
    fn default() -> Self {
        Self::new()
    }
}
