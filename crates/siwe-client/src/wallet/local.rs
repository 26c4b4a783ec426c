/*
[INPUT]:  EVM private key (hex string) and target chain id
[OUTPUT]: In-process wallet gateway producing real EIP-191 signatures
[POS]:    Wallet layer - local signer implementation
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::str::FromStr;
use std::sync::RwLock;

use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::http::{AuthError, Result};

use super::{
    AccountsChangedListener, ListenerRegistry, ProviderKind, SubscriptionId, WalletConnection,
    WalletGateway,
};

/// Gateway backed by an in-process private key
///
/// Useful for demos and service accounts where no human-held wallet exists.
/// Signs challenges with EIP-191 personal-sign, the same scheme a browser
/// wallet uses for SIWE.
pub struct LocalWalletGateway {
    signer: PrivateKeySigner,
    address: String,
    chain_id: u64,
    provider_kind: ProviderKind,
    connection: RwLock<Option<WalletConnection>>,
    registry: ListenerRegistry,
}

impl std::fmt::Debug for LocalWalletGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWalletGateway")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("provider_kind", &self.provider_kind)
            .finish_non_exhaustive()
    }
}

impl LocalWalletGateway {
    /// Create a gateway from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    pub fn new(private_key_hex: &str, chain_id: u64) -> Result<Self> {
        let private_key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| AuthError::Config(format!("Invalid EVM private key: {e}")))?;

        let address = signer.address().to_checksum(None);

        Ok(Self {
            signer,
            address,
            chain_id,
            provider_kind: ProviderKind::MetaMask,
            connection: RwLock::new(None),
            registry: ListenerRegistry::new(),
        })
    }

    /// Checksummed address derived from the private key
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Drop the connection and notify listeners, as an extension wallet does
    /// when the user disconnects the site
    pub fn disconnect(&self) {
        *self.connection.write().unwrap() = None;
        self.registry.notify();
    }
}

#[async_trait]
impl WalletGateway for LocalWalletGateway {
    fn available_providers(&self) -> Vec<ProviderKind> {
        vec![self.provider_kind]
    }

    fn is_connected(&self) -> bool {
        self.connection.read().unwrap().is_some()
    }

    fn active_connection(&self) -> Option<WalletConnection> {
        self.connection.read().unwrap().clone()
    }

    async fn ensure_connected(&self, provider: ProviderKind) -> Result<WalletConnection> {
        if provider != self.provider_kind {
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

    async fn request_signature(&self, _provider: ProviderKind, message: &str) -> Result<String> {
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| AuthError::SigningRejected(format!("Failed to sign message: {e}")))?;

        // alloy's Signature as_bytes() returns [r, s, v]
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
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

    // A well-known test private key
    const TEST_PK: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[tokio::test]
    async fn test_local_gateway_signs_messages() {
        let gateway = LocalWalletGateway::new(TEST_PK, 1).unwrap();
        assert_eq!(gateway.address(), TEST_ADDRESS);

        let connection = gateway
            .ensure_connected(ProviderKind::MetaMask)
            .await
            .unwrap();
        assert_eq!(connection.address, TEST_ADDRESS);
        assert_eq!(connection.chain_id, 1);

        let signature = gateway
            .request_signature(ProviderKind::MetaMask, "hello")
            .await
            .unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 132); // 0x + 65 bytes * 2 = 132
    }

    #[test]
    fn test_local_gateway_no_prefix() {
        let pk = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let gateway = LocalWalletGateway::new(pk, 1).unwrap();
        assert_eq!(gateway.address(), TEST_ADDRESS);
    }

    #[test]
    fn test_local_gateway_invalid_key() {
        let err = LocalWalletGateway::new("zz", 1).unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[tokio::test]
    async fn test_local_gateway_unknown_provider() {
        let gateway = LocalWalletGateway::new(TEST_PK, 1).unwrap();
        let err = gateway
            .ensure_connected(ProviderKind::WalletConnect)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WalletConnection(_)));
    }

    #[tokio::test]
    async fn test_disconnect_notifies_listeners() {
        let gateway = LocalWalletGateway::new(TEST_PK, 1).unwrap();
        gateway
            .ensure_connected(ProviderKind::MetaMask)
            .await
            .unwrap();

        let fired = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let counter = std::sync::Arc::clone(&fired);
        gateway.on_accounts_changed(std::sync::Arc::new(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));

        gateway.disconnect();
        assert!(!gateway.is_connected());
        assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
