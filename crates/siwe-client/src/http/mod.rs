/*
[INPUT]:  HTTP client configuration and authentication server endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod challenge;
pub mod client;
pub mod error;
pub mod identity;

pub use client::{ClientConfig, SiweApiClient};
pub use error::{AuthError, Result};
