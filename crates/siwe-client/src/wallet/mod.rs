/*
[INPUT]:  Wallet provider selection and signing requests
[OUTPUT]: Wallet connections, signatures, and account-change notifications
[POS]:    Wallet layer - gateway abstraction over external wallets
[UPDATE]: When adding new wallet kinds or changing the gateway contract
*/

pub mod local;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::http::{AuthError, Result};

pub use local::LocalWalletGateway;

/// Wallet providers the application can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    MetaMask,
    WalletConnect,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::MetaMask => write!(f, "MetaMask"),
            ProviderKind::WalletConnect => write!(f, "WalletConnect"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MetaMask" => Ok(ProviderKind::MetaMask),
            "WalletConnect" => Ok(ProviderKind::WalletConnect),
            other => Err(AuthError::WalletConnection(format!(
                "Unknown provider: {other}"
            ))),
        }
    }
}

/// Snapshot of the wallet's connection state
///
/// Owned by the gateway and authoritative for who currently holds the wallet.
/// The core never caches it beyond a single login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    pub address: String,
    pub chain_id: u64,
    pub is_connected: bool,
    pub provider_kind: ProviderKind,
}

/// Callback fired when the wallet's controlling account set changes
/// (including disconnect)
pub type AccountsChangedListener = Arc<dyn Fn() + Send + Sync>;

/// Handle for removing a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Capability contract required from a wallet integration
///
/// Implementations wrap whatever actually holds the keys: a browser
/// extension bridge, a WalletConnect session, or an in-process signer.
/// Signing waits on human interaction and has no timeout.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// Providers this gateway can resolve
    fn available_providers(&self) -> Vec<ProviderKind>;

    /// Whether a wallet is currently connected
    fn is_connected(&self) -> bool;

    /// The active connection, if any
    fn active_connection(&self) -> Option<WalletConnection>;

    /// Resolve the provider and return its connection, driving the connect
    /// step only when not already connected
    async fn ensure_connected(&self, provider: ProviderKind) -> Result<WalletConnection>;

    /// Ask the wallet to sign the canonical challenge text
    async fn request_signature(&self, provider: ProviderKind, message: &str) -> Result<String>;

    /// Register an accounts-changed listener; fired at most once per change
    fn on_accounts_changed(&self, listener: AccountsChangedListener) -> SubscriptionId;

    /// Remove a previously registered listener
    fn remove_listener(&self, id: SubscriptionId);
}

/// Listener bookkeeping shared by gateway implementations
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: RwLock<HashMap<u64, AccountsChangedListener>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, listener: AccountsChangedListener) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().unwrap().insert(id, listener);
        SubscriptionId(id)
    }

    pub(crate) fn remove(&self, id: SubscriptionId) {
        self.listeners.write().unwrap().remove(&id.0);
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.read().unwrap().len()
    }

    /// Fire every registered listener once
    pub(crate) fn notify(&self) {
        let listeners: Vec<AccountsChangedListener> =
            self.listeners.read().unwrap().values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }
}

/// Scriptable gateway for testing
///
/// Returns a predetermined signature (or a scripted rejection) and lets tests
/// fire account-change events by hand.
pub struct MockWalletGateway {
    providers: Vec<ProviderKind>,
    address: String,
    chain_id: u64,
    connection: RwLock<Option<WalletConnection>>,
    signature: String,
    reject_signing: bool,
    registry: ListenerRegistry,
}

impl MockWalletGateway {
    /// Create a mock gateway that connects as `address` on `chain_id` and
    /// signs everything with `signature`
    pub fn new(address: &str, chain_id: u64, signature: &str) -> Self {
        Self {
            providers: vec![ProviderKind::MetaMask, ProviderKind::WalletConnect],
            address: address.to_string(),
            chain_id,
            connection: RwLock::new(None),
            signature: signature.to_string(),
            reject_signing: false,
            registry: ListenerRegistry::new(),
        }
    }

    /// Restrict the set of providers the mock resolves
    pub fn with_providers(mut self, providers: Vec<ProviderKind>) -> Self {
        self.providers = providers;
        self
    }

    /// Make every signing request fail as a user rejection
    pub fn rejecting_signatures(mut self) -> Self {
        self.reject_signing = true;
        self
    }

    /// Simulate the wallet switching accounts or disconnecting
    pub fn emit_accounts_changed(&self) {
        *self.connection.write().unwrap() = None;
        self.registry.notify();
    }

    /// Number of registered listeners (for teardown assertions)
    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }
}

#[async_trait]
impl WalletGateway for MockWalletGateway {
    fn available_providers(&self) -> Vec<ProviderKind> {
        self.providers.clone()
    }

    fn is_connected(&self) -> bool {
        self.connection.read().unwrap().is_some()
    }

    fn active_connection(&self) -> Option<WalletConnection> {
        self.connection.read().unwrap().clone()
    }

    async fn ensure_connected(&self, provider: ProviderKind) -> Result<WalletConnection> {
        if !self.providers.contains(&provider) {
            return Err(AuthError::WalletConnection(format!(
                "Unknown provider: {provider}"
            )));
        }

        if let Some(connection) = self.active_connection() {
            return Ok(connection);
        }

        let connection = WalletConnection {
            address: self.address.clone(),
            chain_id: self.chain_id,
            is_connected: true,
            provider_kind: provider,
        };
        *self.connection.write().unwrap() = Some(connection.clone());
        Ok(connection)
    }

    async fn request_signature(&self, _provider: ProviderKind, _message: &str) -> Result<String> {
        if self.reject_signing {
            return Err(AuthError::SigningRejected(
                "user declined the signing prompt".to_string(),
            ));
        }
        Ok(self.signature.clone())
    }

    fn on_accounts_changed(&self, listener: AccountsChangedListener) -> SubscriptionId {
        self.registry.add(listener)
    }

    fn remove_listener(&self, id: SubscriptionId) {
        self.registry.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_connects_on_demand() {
        let gateway = MockWalletGateway::new("0xA", 1, "0xmock_signature");
        assert!(!gateway.is_connected());

        let connection = gateway
            .ensure_connected(ProviderKind::MetaMask)
            .await
            .unwrap();
        assert_eq!(connection.address, "0xA");
        assert_eq!(connection.chain_id, 1);
        assert!(connection.is_connected);
        assert!(gateway.is_connected());

        // Already connected: same connection comes back without a new prompt
        let again = gateway
            .ensure_connected(ProviderKind::MetaMask)
            .await
            .unwrap();
        assert_eq!(again, connection);
    }

    #[tokio::test]
    async fn test_mock_gateway_unknown_provider() {
        let gateway = MockWalletGateway::new("0xA", 1, "0xmock_signature")
            .with_providers(vec![ProviderKind::MetaMask]);

        let err = gateway
            .ensure_connected(ProviderKind::WalletConnect)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WalletConnection(_)));
    }

    #[tokio::test]
    async fn test_mock_gateway_signature() {
        let gateway = MockWalletGateway::new("0xA", 1, "0xmock_signature");
        let signature = gateway
            .request_signature(ProviderKind::MetaMask, "message")
            .await
            .unwrap();
        assert_eq!(signature, "0xmock_signature");
    }

    #[tokio::test]
    async fn test_mock_gateway_rejects_when_scripted() {
        let gateway = MockWalletGateway::new("0xA", 1, "0xmock_signature").rejecting_signatures();
        let err = gateway
            .request_signature(ProviderKind::MetaMask, "message")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SigningRejected(_)));
    }

    #[test]
    fn test_listener_registration_and_removal() {
        let gateway = MockWalletGateway::new("0xA", 1, "0xmock_signature");
        let fired = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&fired);
        let id = gateway.on_accounts_changed(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(gateway.listener_count(), 1);

        gateway.emit_accounts_changed();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!gateway.is_connected());

        gateway.remove_listener(id);
        assert_eq!(gateway.listener_count(), 0);
        gateway.emit_accounts_changed();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_provider_kind_round_trip() {
        assert_eq!(
            "MetaMask".parse::<ProviderKind>().unwrap(),
            ProviderKind::MetaMask
        );
        assert_eq!(
            "WalletConnect".parse::<ProviderKind>().unwrap(),
            ProviderKind::WalletConnect
        );
        assert!("Ledger".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::MetaMask.to_string(), "MetaMask");
    }
}
