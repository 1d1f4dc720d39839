//! short-lived per-session key cache
//!
//! deriving a key needs a wallet signature, which means a user prompt. a
//! session keeps derived keys for a bounded time so repeated balance reads
//! don't ask again. the cache is an owned value; there is no global state.

use std::collections::hash_map::{Entry, HashMap};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::keys::{registration_message, KeyPair};
use crate::Error;

/// default lifetime of a cached key
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

struct CachedKeys {
    keys: KeyPair,
    expires_at: Instant,
}

impl CachedKeys {
    fn is_live(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// key pairs cached by lowercase address
pub struct KeySession {
    ttl: Duration,
    entries: HashMap<String, CachedKeys>,
}

impl KeySession {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// cached keys for `address`, if present and not expired
    pub fn get(&self, address: &str) -> Option<&KeyPair> {
        self.entries
            .get(&address.to_lowercase())
            .filter(|e| e.is_live())
            .map(|e| &e.keys)
    }

    pub fn insert(&mut self, address: &str, keys: KeyPair) {
        self.entries.insert(
            address.to_lowercase(),
            CachedKeys {
                keys,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// drop the keys for `address`; true if any were cached
    pub fn forget(&mut self, address: &str) -> bool {
        self.entries.remove(&address.to_lowercase()).is_some()
    }

    /// drop every expired entry, returning how many were removed
    pub fn evict_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before - self.entries.len()
    }

    /// number of entries, expired ones included until evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// cached keys, or ask `sign` for a registration signature and derive
    pub fn get_or_derive<F, E>(&mut self, address: &str, sign: F) -> core::result::Result<&KeyPair, E>
    where
        F: FnOnce(&str) -> core::result::Result<String, E>,
        E: From<Error>,
    {
        let ttl = self.ttl;
        let cached = match self.entries.entry(address.to_lowercase()) {
            Entry::Occupied(slot) if slot.get().is_live() => slot.into_mut(),
            slot => {
                debug!(address = %slot.key(), "deriving session keys");
                let signature = sign(&registration_message(slot.key()))?;
                let fresh = CachedKeys {
                    keys: KeyPair::from_signature(&signature)?,
                    expires_at: Instant::now() + ttl,
                };
                match slot {
                    Entry::Occupied(mut slot) => {
                        slot.insert(fresh);
                        slot.into_mut()
                    }
                    Entry::Vacant(slot) => slot.insert(fresh),
                }
            }
        };
        Ok(&cached.keys)
    }
}

impl Default for KeySession {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
