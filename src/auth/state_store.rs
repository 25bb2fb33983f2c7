//! Anti-forgery state values for the OAuth login flow
//!
//! Each login attempt gets a fresh unpredictable value, held server-side with
//! a short TTL and consumed exactly once on callback. A constant or reused
//! state would let the callback be forged cross-site.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const STATE_LENGTH: usize = 32;

/// Unconsumed states older than this are discarded; the login attempt has to
/// start over.
const STATE_TTL: Duration = Duration::from_secs(600);

const STATE_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZabcdefghjkmnpqrstvwxyz";

#[derive(Clone)]
pub struct StateStore {
    pending: Arc<RwLock<HashMap<String, Instant>>>,
    ttl: Duration,
}

impl StateStore {
    pub fn new() -> Self {
        Self::with_ttl(STATE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Generate and record a fresh state value for one login attempt.
    pub async fn issue(&self) -> String {
        let state = random_state();

        let mut pending = self.pending.write().await;
        // Opportunistic cleanup keeps abandoned attempts from accumulating
        let ttl = self.ttl;
        pending.retain(|_, issued_at| issued_at.elapsed() <= ttl);
        pending.insert(state.clone(), Instant::now());

        state
    }

    /// Consume a state value, returning whether it was previously issued and
    /// still fresh. A state can be consumed at most once.
    pub async fn consume(&self, state: &str) -> bool {
        let mut pending = self.pending.write().await;
        match pending.remove(state) {
            Some(issued_at) => issued_at.elapsed() <= self.ttl,
            None => false,
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn random_state() -> String {
    let mut rng = rand::thread_rng();
    (0..STATE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..STATE_ALPHABET.len());
            STATE_ALPHABET[idx] as char
        })
        .collect()
}
