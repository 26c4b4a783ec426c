/*
[INPUT]:  Cookie-based session credentials
[OUTPUT]: Current session identity and server-side session teardown
[POS]:    HTTP layer - identity/session endpoints
[UPDATE]: When the me or logout endpoints change shape
*/

use reqwest::Method;

use crate::http::{AuthError, Result, SiweApiClient};
use crate::session::Identity;

impl SiweApiClient {
    /// Fetch the identity the server currently considers authenticated
    ///
    /// GET /me with cookie credentials
    ///
    /// A 4xx answer means no session cookie is held, which is the normal
    /// signed-out case, so it maps to `Ok(None)` and is never retried.
    pub async fn fetch_identity(&self) -> Result<Option<Identity>> {
        let builder = self.request(Method::GET, "/me")?;
        let response = builder
            .send()
            .await
            .map_err(|e| AuthError::SessionRefresh(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthError::SessionRefresh(format!("HTTP {status}")));
        }

        let identity: Identity = response
            .json()
            .await
            .map_err(|e| AuthError::SessionRefresh(e.to_string()))?;

        Ok(Some(identity))
    }

    /// Invalidate the server-side session
    ///
    /// POST /logout with cookie credentials; 2xx expected, body ignored.
    /// Callers treat failure as best-effort (the orchestrator clears local
    /// state regardless).
    pub async fn logout(&self) -> Result<()> {
        let builder = self.request(Method::POST, "/logout")?;
        let response = builder
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Transport(format!("HTTP {status}")));
        }

        Ok(())
    }
}
