/*
[INPUT]:  Identity endpoint responses and invalidation requests
[OUTPUT]: Last-known authenticated identity with loading/error state
[POS]:    Session layer - client-side session state, single source of truth
[UPDATE]: When session state shape or refresh semantics change
*/

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{Result, SiweApiClient};

/// The authenticated user as seen by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub address: String,
}

/// Tri-state session state; exactly one holds at any observation point.
/// `Loading` is transient and always resolves to one of the other two.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Loading,
    Authenticated(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    state: SessionState,
    epoch: u64,
    in_flight: bool,
}

/// Client-side cache of the server session
///
/// Clones share state. Mutated only by a completed refresh or an explicit
/// invalidation. The epoch counter makes last-writer-wins ordering follow
/// refresh completion time: `invalidate` advances it, and a refresh that
/// started before the invalidation discards its own write, so a forced
/// logout always overrides an in-flight login's eventual refresh.
#[derive(Debug, Clone)]
pub struct SessionCache {
    client: Arc<SiweApiClient>,
    inner: Arc<RwLock<CacheInner>>,
}

impl SessionCache {
    pub fn new(client: Arc<SiweApiClient>) -> Self {
        Self {
            client,
            inner: Arc::new(RwLock::new(CacheInner::default())),
        }
    }

    /// Synchronous snapshot of the last-fetched state
    pub fn current_identity(&self) -> SessionState {
        self.inner.read().unwrap().state.clone()
    }

    /// Drop the session locally without a network call
    pub fn invalidate(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.epoch += 1;
        inner.state = SessionState::Unauthenticated;
    }

    /// Re-query the identity endpoint and update the cached state
    ///
    /// Without `force`, an in-flight refresh short-circuits to the current
    /// snapshot; `force` always issues the request so a just-completed login
    /// is reflected instead of a stale in-flight fetch. Never auto-retries:
    /// a 4xx from the identity endpoint is the normal signed-out answer, and
    /// retrying it would only delay a signed-out UI.
    pub async fn refresh(&self, force: bool) -> Result<Option<Identity>> {
        let started_epoch = {
            let mut inner = self.inner.write().unwrap();
            if inner.in_flight && !force {
                debug!("identity refresh already in flight, returning snapshot");
                return Ok(inner.state.identity().cloned());
            }
            inner.in_flight = true;
            if inner.state == SessionState::Unauthenticated {
                inner.state = SessionState::Loading;
            }
            inner.epoch
        };

        let fetched = self.client.fetch_identity().await;

        let mut inner = self.inner.write().unwrap();
        inner.in_flight = false;

        if inner.epoch != started_epoch {
            // An invalidation won the race; this result no longer applies.
            debug!("discarding identity refresh superseded by invalidation");
            if inner.state == SessionState::Loading {
                inner.state = SessionState::Unauthenticated;
            }
            return Ok(None);
        }

        match fetched {
            Ok(Some(identity)) => {
                inner.state = SessionState::Authenticated(identity.clone());
                Ok(Some(identity))
            }
            Ok(None) => {
                inner.state = SessionState::Unauthenticated;
                Ok(None)
            }
            Err(err) => {
                inner.state = SessionState::Unauthenticated;
                Err(err)
            }
        }
    }
}
