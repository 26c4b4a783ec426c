/*
[INPUT]:  Server-issued nonce and signed challenge messages
[OUTPUT]: Nonce text and verification verdicts
[POS]:    HTTP layer - challenge/verification endpoints
[UPDATE]: When the nonce or verify endpoints change shape
*/

use reqwest::Method;

use crate::http::{AuthError, Result, SiweApiClient};
use crate::siwe::SiweMessage;

impl SiweApiClient {
    /// Fetch a single-use nonce for a fresh challenge
    ///
    /// GET /nonce
    ///
    /// One-shot, no retry: a failed nonce fetch surfaces immediately instead
    /// of being masked as latency by a silent retry with a new nonce.
    pub async fn fetch_nonce(&self) -> Result<String> {
        let builder = self.request(Method::GET, "/nonce")?;
        let response = builder
            .send()
            .await
            .map_err(|e| AuthError::ChallengeFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::ChallengeFetch(format!("HTTP {status}")));
        }

        let nonce = response
            .text()
            .await
            .map_err(|e| AuthError::ChallengeFetch(e.to_string()))?;
        let nonce = nonce.trim().to_string();
        if nonce.is_empty() {
            return Err(AuthError::ChallengeFetch("empty nonce body".to_string()));
        }

        Ok(nonce)
    }

    /// Submit a signed challenge for verification
    ///
    /// POST /verify with JSON `{message, signature}`; on success the server
    /// establishes the cookie session picked up by the client's cookie jar.
    ///
    /// The server answers with a boolean or a claims object. `true` or an
    /// object counts as verified, `false`/`null` as rejected. Transport and
    /// parse failures map to `Verification` so the orchestrator's error
    /// taxonomy stays closed.
    pub async fn verify(&self, message: &SiweMessage, signature: &str) -> Result<bool> {
        let body = serde_json::json!({
            "message": message,
            "signature": signature,
        });

        let builder = self.request(Method::POST, "/verify")?;
        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Verification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Verification(format!("HTTP {status}")));
        }

        let verdict: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::Verification(e.to_string()))?;

        Ok(match verdict {
            serde_json::Value::Bool(verified) => verified,
            serde_json::Value::Object(_) => true,
            _ => false,
        })
    }
}
