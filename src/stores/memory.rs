use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt::Display;

use crate::{ChallengeRecord, ChallengeStore, SetOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Default upper bound on pending challenges.
pub const DEFAULT_MAX_TOKENS: usize = 10_000;

/// What [MemoryChallengeStore::set] does once `max_tokens` records are held.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Write anyway and report [SetOutcome::StoredOverCapacity].
    ///
    /// A token posted while the registry is flooded with junk still gets
    /// served; the caller only sees a warning.
    #[default]
    Advisory,
    /// Refuse writes for new domains with [SetOutcome::Rejected]. Overwrites
    /// of a domain that is already present are accepted.
    Strict,
}

/// Volatile token registry keyed by domain.
///
/// Every operation takes the same lock, so concurrent `set`, `get` and
/// `delete` calls for a domain apply in a single order.
pub struct MemoryChallengeStore {
    records: Mutex<HashMap<String, ChallengeRecord>>,
    max_tokens: usize,
    policy: CapacityPolicy,
}

impl Default for MemoryChallengeStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_TOKENS, CapacityPolicy::default())
    }
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_tokens: usize, policy: CapacityPolicy) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            max_tokens,
            policy,
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for MemoryChallengeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MemoryChallengeStore(max_tokens: {}, policy: {:?})",
            self.max_tokens, self.policy
        )
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    type EC = Infallible;

    async fn set(&self, record: ChallengeRecord) -> Result<SetOutcome, Self::EC> {
        let mut records = self.records.lock();
        let full = records.len() >= self.max_tokens;
        let outcome = match (full, self.policy) {
            (false, _) => SetOutcome::Stored,
            (true, CapacityPolicy::Advisory) => SetOutcome::StoredOverCapacity,
            (true, CapacityPolicy::Strict) if records.contains_key(&record.domain) => {
                SetOutcome::Stored
            }
            (true, CapacityPolicy::Strict) => SetOutcome::Rejected,
        };
        if outcome.is_stored() {
            records.insert(record.domain.clone(), record);
        }
        Ok(outcome)
    }

    async fn get(&self, domain: &str) -> Result<Option<ChallengeRecord>, Self::EC> {
        Ok(self.records.lock().get(domain).cloned())
    }

    async fn delete(&self, domain: &str) -> Result<(), Self::EC> {
        self.records.lock().remove(domain);
        Ok(())
    }
}
