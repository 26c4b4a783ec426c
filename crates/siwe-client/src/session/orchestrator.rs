/*
[INPUT]:  Wallet gateway, API client, and site identity
[OUTPUT]: Login/logout flows keeping the session cache consistent with the wallet
[POS]:    Session layer - authentication state machine
[UPDATE]: When the login flow steps or forced-logout policy change
*/

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::http::{AuthError, Result, SiweApiClient};
use crate::session::{Identity, SessionCache};
use crate::siwe::{SiteConfig, SiweMessage};
use crate::wallet::{ProviderKind, SubscriptionId, WalletGateway};

/// How a login attempt ended when no flow error occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Verified and the session cache now reflects the server-side session
    Authenticated(Identity),
    /// The server rejected the signature; user-correctable, not an error
    VerificationRejected,
    /// Verified, but the follow-up identity refresh failed or came back
    /// empty; the cache stays unauthenticated until the next refresh
    SessionUnavailable,
}

/// Sequences wallet connection, challenge, signing, verification, and
/// session refresh
///
/// Holds the only mutable resource (the session cache) and is the single
/// writer besides wallet-event forced logout.
pub struct AuthOrchestrator {
    client: Arc<SiweApiClient>,
    gateway: Arc<dyn WalletGateway>,
    site: SiteConfig,
    cache: SessionCache,
}

impl AuthOrchestrator {
    pub fn new(
        client: Arc<SiweApiClient>,
        gateway: Arc<dyn WalletGateway>,
        site: SiteConfig,
    ) -> Self {
        let cache = SessionCache::new(Arc::clone(&client));
        Self {
            client,
            gateway,
            site,
            cache,
        }
    }

    /// The session cache, for presentation code to observe
    pub fn session(&self) -> &SessionCache {
        &self.cache
    }

    pub fn is_authenticated(&self) -> bool {
        self.cache.current_identity().is_authenticated()
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.cache.current_identity().identity().cloned()
    }

    /// Authenticate the connected wallet with the server
    ///
    /// Steps, strictly sequential: resolve provider, ensure connected, fetch
    /// nonce, build challenge, sign, verify, forced identity refresh. On any
    /// error the session state is unauthenticated, never left loading.
    pub async fn login(&self, provider: ProviderKind) -> Result<LoginOutcome> {
        if !self.gateway.available_providers().contains(&provider) {
            return Err(AuthError::WalletConnection(format!(
                "Unknown provider: {provider}"
            )));
        }

        let connection = self.gateway.ensure_connected(provider).await?;
        debug!(address = %connection.address, chain_id = connection.chain_id, "wallet connected");

        let nonce = self.client.fetch_nonce().await?;
        let message = SiweMessage::new(&connection.address, connection.chain_id, &self.site, &nonce);

        let signature = self
            .gateway
            .request_signature(provider, &message.prepare())
            .await?;

        // Transport errors and server rejection stay one outcome: the single
        // most common expected failure path, surfaced as a notice, not a crash.
        let verified = match self.client.verify(&message, &signature).await {
            Ok(verified) => verified,
            Err(err) => {
                warn!(error = %err, "verification request failed");
                false
            }
        };
        if !verified {
            info!(address = %connection.address, "signature verification rejected");
            return Ok(LoginOutcome::VerificationRejected);
        }

        // Re-derive identity from the server rather than trusting the
        // locally captured address; force past any stale in-flight fetch.
        match self.cache.refresh(true).await {
            Ok(Some(identity)) => {
                info!(address = %identity.address, "login complete");
                Ok(LoginOutcome::Authenticated(identity))
            }
            Ok(None) => {
                warn!("verification succeeded but no session identity came back");
                Ok(LoginOutcome::SessionUnavailable)
            }
            Err(err) => {
                warn!(error = %err, "post-verification identity refresh failed");
                Ok(LoginOutcome::SessionUnavailable)
            }
        }
    }

    /// End the session
    ///
    /// The server call is best-effort: a user must always be able to leave an
    /// account, so local state clears even when the network fails. Idempotent.
    pub async fn logout(&self) {
        if let Err(err) = self.client.logout().await {
            warn!(error = %err, "server logout failed, clearing local session anyway");
        }
        self.cache.invalidate();
        info!("logged out");
    }

    /// Forced logout on a wallet account switch or disconnect
    ///
    /// The server session is keyed to the previous address and no longer
    /// valid in intent, so this is a full session clear, not a partial
    /// update. The invalidation lands before the server round-trip so an
    /// in-flight login's refresh cannot resurrect the old identity.
    pub async fn on_wallet_account_changed(&self) {
        debug!("wallet account changed, forcing logout");
        self.cache.invalidate();
        self.logout().await;
    }

    /// Subscribe to wallet account-change events for the lifetime of the
    /// returned watch
    ///
    /// The gateway callback invalidates the cache synchronously and queues
    /// the full logout onto a background task. Dropping the watch removes
    /// the listener and stops the task; nothing leaks across lifecycles.
    pub fn watch_wallet(self: &Arc<Self>) -> WalletWatch {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<()>();

        let cache = self.cache.clone();
        let subscription = self.gateway.on_accounts_changed(Arc::new(move || {
            cache.invalidate();
            let _ = events_tx.send(());
        }));

        let orchestrator = Arc::clone(self);
        let task = tokio::spawn(async move {
            while events_rx.recv().await.is_some() {
                orchestrator.on_wallet_account_changed().await;
            }
        });

        WalletWatch {
            gateway: Arc::clone(&self.gateway),
            subscription,
            task,
        }
    }
}

/// Active wallet-event subscription; unsubscribes on drop
pub struct WalletWatch {
    gateway: Arc<dyn WalletGateway>,
    subscription: SubscriptionId,
    task: JoinHandle<()>,
}

impl WalletWatch {
    /// Detach explicitly (equivalent to dropping)
    pub fn stop(self) {}
}

impl Drop for WalletWatch {
    fn drop(&mut self) {
        self.gateway.remove_listener(self.subscription);
        self.task.abort();
    }
}
