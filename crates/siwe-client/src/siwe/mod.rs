/*
[INPUT]:  Site identity and challenge field definitions
[OUTPUT]: Canonical challenge messages bound to this site
[POS]:    Challenge layer - EIP-4361 message construction
[UPDATE]: When challenge construction or site identity changes
*/

pub mod message;

pub use message::{MessageParseError, SiweMessage, SIGN_IN_STATEMENT, SIWE_VERSION};

/// Identity of the site the user signs in to
///
/// The challenge binds the signature to this origin; in a browser these come
/// from `window.location`, here the embedding application supplies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Current page host, e.g. `app.test`
    pub domain: String,
    /// Current page origin, e.g. `https://app.test`
    pub uri: String,
}

impl SiteConfig {
    pub fn new(domain: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            uri: uri.into(),
        }
    }
}
