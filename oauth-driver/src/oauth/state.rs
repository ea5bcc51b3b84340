//! CSRF state management for OAuth flows.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

/// Opaque random value tying a callback to the redirect that started it.
#[derive(Clone, PartialEq, Eq)]
pub struct StateToken(String);

impl StateToken {
    /// Generate a new state token from 32 bytes of OS randomness.
    pub fn issue() -> Self {
        let mut random_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut random_bytes);
        Self(URL_SAFE_NO_PAD.encode(random_bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateToken([REDACTED])")
    }
}

/// Compare the state presented on callback with the stored one.
///
/// Runs in constant time with respect to the contents. Absent or empty values
/// on either side never validate.
pub fn validate(presented: Option<&str>, stored: Option<&str>) -> bool {
    match (presented, stored) {
        (Some(presented), Some(stored)) if !presented.is_empty() && !stored.is_empty() => {
            presented.as_bytes().ct_eq(stored.as_bytes()).into()
        }
        _ => false,
    }
}

/// Per-attempt storage for the state value, usually a signed cookie or session.
pub trait StateStore: Send + Sync {
    /// Store a value under `key`, replacing any previous value.
    fn store(&self, key: &str, value: &str);

    /// Read the value stored under `key`.
    fn read(&self, key: &str) -> Option<String>;

    /// Remove the value stored under `key`.
    fn clear(&self, key: &str);
}

/// Read and clear the stored state, then compare it with the presented one.
///
/// The stored value is removed whether or not validation passes, so each state
/// can be used once.
pub fn consume(store: &dyn StateStore, key: &str, presented: Option<&str>) -> bool {
    let stored = store.read(key);
    store.clear(key);
    validate(presented, stored.as_deref())
}

#[derive(Debug, Clone)]
struct StoredState {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory [`StateStore`] with expiration.
///
/// Entries older than the TTL read as absent. Clones share the same storage.
#[derive(Clone)]
pub struct MemoryStateStore {
    states: Arc<Mutex<HashMap<String, StoredState>>>,
    ttl: Duration,
}

impl MemoryStateStore {
    /// Create a new store with default TTL of 10 minutes.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    /// Create a new store with custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Clean up expired states.
    ///
    /// Should be called periodically to prevent memory leaks.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.lock().retain(|_, state| state.expires_at > now);
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredState>> {
        // A poisoned map is still consistent: every write is a single insert or remove.
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStateStore {
    fn store(&self, key: &str, value: &str) {
        let state = StoredState {
            value: value.to_string(),
            expires_at: Utc::now()
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.lock().insert(key.to_string(), state);
    }

    fn read(&self, key: &str) -> Option<String> {
        let states = self.lock();
        states
            .get(key)
            .filter(|state| Utc::now() <= state.expires_at)
            .map(|state| state.value.clone())
    }

    fn clear(&self, key: &str) {
        self.lock().remove(key);
    }
}
