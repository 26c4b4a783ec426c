/*
[INPUT]:  Authentication server URL and a local wallet private key
[OUTPUT]: Authenticated session against the server
[POS]:    Examples - sign-in flow demonstration
[UPDATE]: When the login flow changes
*/

use std::sync::Arc;

use siwe_client::*;

/// Example: Sign-In with Ethereum flow
///
/// This example demonstrates the complete flow:
/// 1. Create the API client for the authentication server
/// 2. Wire up a wallet gateway (a local signer here; a real app bridges
///    MetaMask or WalletConnect)
/// 3. Login: nonce -> challenge -> signature -> verify -> session refresh
/// 4. Observe the session cache and logout
#[tokio::main]
async fn main() {
    println!("=== SIWE Login Example ===\n");

    let base_url =
        std::env::var("SIWE_API_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());

    // Step 1: Create the API client
    let client = match SiweApiClient::new(&base_url) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ API client created for {}", base_url);

    // Step 2: Wallet gateway backed by an in-process key
    // (a well-known test key; never use it for anything real)
    let pk = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    let gateway = match LocalWalletGateway::new(pk, 1) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            eprintln!("Failed to create wallet gateway: {}", e);
            return;
        }
    };
    println!("✓ Wallet gateway ready for {}", gateway.address());

    let auth = Arc::new(AuthOrchestrator::new(
        client,
        gateway,
        SiteConfig::new("localhost:3000", "http://localhost:3000"),
    ));

    // Keep the session consistent with the wallet for the demo's lifetime
    let _watch = auth.watch_wallet();

    // Step 3: Login
    match auth.login(ProviderKind::MetaMask).await {
        Ok(LoginOutcome::Authenticated(identity)) => {
            println!("✓ Logged in as {}", identity.address);
        }
        Ok(LoginOutcome::VerificationRejected) => {
            println!("✗ Signature verification failed");
            return;
        }
        Ok(LoginOutcome::SessionUnavailable) => {
            println!("✗ Verified, but the session could not be confirmed");
            return;
        }
        Err(e) => {
            eprintln!("Login failed: {}", e);
            return;
        }
    }

    // Step 4: Observe and logout
    println!("  is_authenticated: {}", auth.is_authenticated());
    auth.logout().await;
    println!("✓ Logged out, is_authenticated: {}", auth.is_authenticated());
}
