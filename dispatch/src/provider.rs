use crate::authority::CredentialAuthority;
use crate::credential::{Credential, CredentialCache};
use crate::destination::{DestinationBinder, DestinationHandle};
use crate::errors::DispatchError;
use crate::metrics_defs::{CREDENTIAL_CACHE_HIT, CREDENTIAL_REFRESH};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Resolves a valid (Credential, DestinationHandle) pair, refreshing
/// through the authority when the cache is empty or expired.
///
/// Not safe for concurrent callers: two overlapping ensure_valid calls
/// on an expired cache would both hit the authority. The dispatch
/// worker's concurrency-1 loop is what serializes refreshes; reuse
/// from multiple workers would need a refresh-in-progress lock first.
pub struct CredentialProvider {
    authority: Arc<dyn CredentialAuthority>,
    binder: Arc<dyn DestinationBinder>,
    application_id: String,
    ttl: Duration,
}

impl CredentialProvider {
    pub fn new(
        authority: Arc<dyn CredentialAuthority>,
        binder: Arc<dyn DestinationBinder>,
        application_id: &str,
        ttl: Duration,
    ) -> Self {
        CredentialProvider {
            authority,
            binder,
            application_id: application_id.to_string(),
            ttl,
        }
    }

    pub async fn ensure_valid(
        &self,
        cache: &mut CredentialCache,
    ) -> Result<(Credential, Arc<DestinationHandle>), DispatchError> {
        let now = Instant::now();

        // Fast path, hit on every dispatch while the credential lives.
        if cache.is_valid(now) {
            metrics::counter!(CREDENTIAL_CACHE_HIT.name).increment(1);
            return Ok(cache.get()?);
        }

        let grant = self.authority.fetch(&self.application_id).await?;

        let handle = self.binder.bind(&grant);
        let credential = Credential { token: grant.token };

        cache.set(credential.clone(), handle.clone(), now + self.ttl);
        metrics::counter!(CREDENTIAL_REFRESH.name).increment(1);

        tracing::debug!(
            stream = %handle.stream_name(),
            ttl_secs = self.ttl.as_secs(),
            "Refreshed stream credential"
        );

        Ok((credential, handle))
    }
}
