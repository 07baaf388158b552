use crate::destination::DestinationHandle;
use std::sync::Arc;
use std::time::Instant;

/// Opaque authorization material. The expiry instant lives in the cache
/// slot, not here; the authority does not return one and the TTL is
/// applied locally.
#[derive(Clone, Debug, PartialEq)]
pub struct Credential {
    pub token: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CacheError {
    #[error("credential cache read before first refresh")]
    NotInitialized,
}

struct CachedPair {
    credential: Credential,
    handle: Arc<DestinationHandle>,
    expire_time: Instant,
}

/// Holds the current (Credential, DestinationHandle) pair and its
/// expiry. Owned exclusively by the dispatch worker; replaced wholesale
/// on refresh, so readers never observe a half-updated pair.
#[derive(Default)]
pub struct CredentialCache {
    slot: Option<CachedPair>,
}

impl CredentialCache {
    pub fn new() -> Self {
        CredentialCache { slot: None }
    }

    pub fn is_valid(&self, now: Instant) -> bool {
        match &self.slot {
            Some(pair) => now < pair.expire_time,
            None => false,
        }
    }

    pub fn set(
        &mut self,
        credential: Credential,
        handle: Arc<DestinationHandle>,
        expire_time: Instant,
    ) {
        self.slot = Some(CachedPair {
            credential,
            handle,
            expire_time,
        });
    }

    pub fn get(&self) -> Result<(Credential, Arc<DestinationHandle>), CacheError> {
        match &self.slot {
            Some(pair) => Ok((pair.credential.clone(), pair.handle.clone())),
            None => Err(CacheError::NotInitialized),
        }
    }
}
