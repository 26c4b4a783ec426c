/*
[INPUT]:  Failure sources (wallet, challenge fetch, signing, verification, session)
[OUTPUT]: Structured error types with a closed taxonomy for the login flow
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the SIWE client
///
/// The five flow variants (`WalletConnection`, `ChallengeFetch`,
/// `SigningRejected`, `Verification`, `SessionRefresh`) are the only errors
/// the login/logout flow surfaces; transport and parse failures are folded
/// into them at the call site so callers never see a raw reqwest error.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wallet provider could not be resolved or connection failed
    #[error("Wallet connection failed: {0}")]
    WalletConnection(String),

    /// Nonce retrieval from the server failed
    #[error("Challenge fetch failed: {0}")]
    ChallengeFetch(String),

    /// The wallet holder declined to sign, or signing failed
    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    /// The server rejected the signed challenge, or the verify call failed
    #[error("Signature verification failed: {0}")]
    Verification(String),

    /// Identity refresh from the session endpoint failed
    #[error("Session refresh failed: {0}")]
    SessionRefresh(String),

    /// HTTP request failed outside the login flow (logout is best-effort)
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl AuthError {
    /// Check if the error is an expected, user-correctable outcome
    /// (wrong wallet, stale nonce, cancelled prompt)
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            AuthError::Verification(_) | AuthError::SigningRejected(_)
        )
    }

    /// Check if the error originated on the wallet side
    pub fn is_wallet_error(&self) -> bool {
        matches!(
            self,
            AuthError::WalletConnection(_) | AuthError::SigningRejected(_)
        )
    }
}

/// Result type alias for SIWE client operations
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_correctable() {
        assert!(AuthError::Verification("bad signature".into()).is_user_correctable());
        assert!(AuthError::SigningRejected("user declined".into()).is_user_correctable());
        assert!(!AuthError::ChallengeFetch("HTTP 500".into()).is_user_correctable());
    }

    #[test]
    fn test_error_wallet_side() {
        assert!(AuthError::WalletConnection("no provider".into()).is_wallet_error());
        assert!(AuthError::SigningRejected("user declined".into()).is_wallet_error());
        assert!(!AuthError::SessionRefresh("HTTP 502".into()).is_wallet_error());
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let err: AuthError = "not a url".parse::<url::Url>().unwrap_err().into();
        assert!(matches!(err, AuthError::UrlParse(_)));
    }
}
