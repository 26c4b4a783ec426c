/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public SIWE client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod session;
pub mod siwe;
pub mod wallet;

// Re-export commonly used types from session
pub use session::{
    AuthOrchestrator,
    Identity,
    LoginOutcome,
    SessionCache,
    SessionState,
    WalletWatch,
};

// Re-export commonly used types from http
pub use http::{
    AuthError,
    ClientConfig,
    Result,
    SiweApiClient,
};

// Re-export commonly used types from siwe
pub use siwe::{SiteConfig, SiweMessage, SIGN_IN_STATEMENT, SIWE_VERSION};

// Re-export commonly used types from wallet
pub use wallet::{
    LocalWalletGateway,
    MockWalletGateway,
    ProviderKind,
    WalletConnection,
    WalletGateway,
};
