//! Pairs an in-memory registry with an on-disk upload area.
//!
//! The relay's handlers are generic over one [crate::Store]. Token records and
//! uploaded artifacts rarely share a backend, so this type lets each half be
//! swapped on its own, e.g. a shared registry in front of the default
//! [super::DirUploadStore].

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::{ChallengeRecord, ChallengeStore, SetOutcome, UploadError, UploadStore};

/// A [crate::Store] answering token calls from `C` and file writes from `U`.
pub struct CompositeStore<C, U> {
    pub challenge_store: C,
    pub upload_store: U,
}

impl<C, U> CompositeStore<C, U> {
    pub fn new(challenge_store: C, upload_store: U) -> Self {
        Self {
            challenge_store,
            upload_store,
        }
    }

    /// Splits the pair back into its registry and upload halves.
    pub fn into_inner(self) -> (C, U) {
        (self.challenge_store, self.upload_store)
    }
}

impl<C: fmt::Display, U: fmt::Display> fmt::Display for CompositeStore<C, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tokens in {}, uploads in {}",
            self.challenge_store, self.upload_store
        )
    }
}

#[async_trait]
impl<C, U> ChallengeStore for CompositeStore<C, U>
where
    C: ChallengeStore,
    U: Send + Sync + fmt::Display,
{
    type EC = C::EC;

    async fn set(&self, record: ChallengeRecord) -> Result<SetOutcome, Self::EC> {
        self.challenge_store.set(record).await
    }

    async fn get(&self, domain: &str) -> Result<Option<ChallengeRecord>, Self::EC> {
        self.challenge_store.get(domain).await
    }

    async fn delete(&self, domain: &str) -> Result<(), Self::EC> {
        self.challenge_store.delete(domain).await
    }
}

#[async_trait]
impl<C, U> UploadStore for CompositeStore<C, U>
where
    C: Send + Sync + fmt::Display,
    U: UploadStore,
{
    async fn store_file(
        &self,
        domain: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<PathBuf, UploadError> {
        self.upload_store
            .store_file(domain, file_name, content)
            .await
    }
}
