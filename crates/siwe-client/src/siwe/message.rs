/*
[INPUT]:  Wallet identity, network, site identity, and a server-issued nonce
[OUTPUT]: Canonical EIP-4361 challenge text and its parsed form
[POS]:    Challenge layer - deterministic message construction
[UPDATE]: When the challenge field set or canonical layout changes
*/

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SiteConfig;

/// Statement shown to the wallet holder inside the signing prompt.
/// Fixed text; the server re-derives the same message, so any drift here
/// makes `/verify` reject.
pub const SIGN_IN_STATEMENT: &str = "Sign in with Ethereum to the app.";

/// EIP-4361 message version
pub const SIWE_VERSION: &str = "1";

/// Canonical sign-in challenge
///
/// Ephemeral: built fresh per login attempt and never persisted. The nonce is
/// single-use and supplied by the server. Serializes in camelCase because the
/// verify endpoint receives the structured form, not the prepared text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiweMessage {
    pub address: String,
    pub chain_id: u64,
    pub domain: String,
    pub nonce: String,
    pub statement: String,
    pub uri: String,
    pub version: String,
    pub issued_at: String,
}

/// Error parsing a prepared challenge back into its fields
#[derive(Error, Debug)]
pub enum MessageParseError {
    #[error("Missing preamble line '{{domain}} wants you to sign in with your Ethereum account:'")]
    MissingPreamble,

    #[error("Missing address line")]
    MissingAddress,

    #[error("Missing statement block")]
    MissingStatement,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),
}

const PREAMBLE_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

impl SiweMessage {
    /// Build a challenge for the given wallet identity and site
    ///
    /// Fills the fixed statement and version and stamps `issued_at` with the
    /// current UTC time.
    pub fn new(address: &str, chain_id: u64, site: &SiteConfig, nonce: &str) -> Self {
        let issued_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Self::with_issued_at(address, chain_id, site, nonce, &issued_at)
    }

    /// Build a challenge with an explicit `issued_at` timestamp
    pub fn with_issued_at(
        address: &str,
        chain_id: u64,
        site: &SiteConfig,
        nonce: &str,
        issued_at: &str,
    ) -> Self {
        Self {
            address: address.to_string(),
            chain_id,
            domain: site.domain.clone(),
            nonce: nonce.to_string(),
            statement: SIGN_IN_STATEMENT.to_string(),
            uri: site.uri.clone(),
            version: SIWE_VERSION.to_string(),
            issued_at: issued_at.to_string(),
        }
    }

    /// Serialize to the canonical human-readable signing text
    ///
    /// Layout matches EIP-4361 `prepareMessage` for this field subset.
    /// Deterministic and injective: two distinct field sets never produce
    /// the same text.
    pub fn prepare(&self) -> String {
        format!(
            "{domain}{suffix}\n\
             {address}\n\
             \n\
             {statement}\n\
             \n\
             URI: {uri}\n\
             Version: {version}\n\
             Chain ID: {chain_id}\n\
             Nonce: {nonce}\n\
             Issued At: {issued_at}",
            domain = self.domain,
            suffix = PREAMBLE_SUFFIX,
            address = self.address,
            statement = self.statement,
            uri = self.uri,
            version = self.version,
            chain_id = self.chain_id,
            nonce = self.nonce,
            issued_at = self.issued_at,
        )
    }

    /// Parse a prepared challenge text back into its fields
    pub fn parse(text: &str) -> Result<Self, MessageParseError> {
        let mut lines = text.lines();

        let preamble = lines.next().ok_or(MessageParseError::MissingPreamble)?;
        let domain = preamble
            .strip_suffix(PREAMBLE_SUFFIX)
            .ok_or(MessageParseError::MissingPreamble)?
            .to_string();

        let address = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or(MessageParseError::MissingAddress)?
            .to_string();

        // Blank separator, statement, blank separator
        match lines.next() {
            Some("") => {}
            _ => return Err(MessageParseError::MissingStatement),
        }
        let statement = lines
            .next()
            .filter(|line| !line.is_empty())
            .ok_or(MessageParseError::MissingStatement)?
            .to_string();
        match lines.next() {
            Some("") => {}
            _ => return Err(MessageParseError::MissingStatement),
        }

        let mut uri = None;
        let mut version = None;
        let mut chain_id = None;
        let mut nonce = None;
        let mut issued_at = None;
        for line in lines {
            if let Some(value) = line.strip_prefix("URI: ") {
                uri = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Version: ") {
                version = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Chain ID: ") {
                chain_id = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| MessageParseError::InvalidChainId(value.to_string()))?,
                );
            } else if let Some(value) = line.strip_prefix("Nonce: ") {
                nonce = Some(value.to_string());
            } else if let Some(value) = line.strip_prefix("Issued At: ") {
                issued_at = Some(value.to_string());
            }
        }

        Ok(Self {
            address,
            chain_id: chain_id.ok_or(MessageParseError::MissingField("Chain ID"))?,
            domain,
            nonce: nonce.ok_or(MessageParseError::MissingField("Nonce"))?,
            statement,
            uri: uri.ok_or(MessageParseError::MissingField("URI"))?,
            version: version.ok_or(MessageParseError::MissingField("Version"))?,
            issued_at: issued_at.ok_or(MessageParseError::MissingField("Issued At"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn test_message() -> SiweMessage {
        let site = SiteConfig::new("app.test", "https://app.test");
        SiweMessage::with_issued_at("0xA", 1, &site, "n1", "2026-01-01T00:00:00.000Z")
    }

    #[test]
    fn test_prepare_layout() {
        let text = test_message().prepare();
        assert_eq!(
            text,
            "app.test wants you to sign in with your Ethereum account:\n\
             0xA\n\
             \n\
             Sign in with Ethereum to the app.\n\
             \n\
             URI: https://app.test\n\
             Version: 1\n\
             Chain ID: 1\n\
             Nonce: n1\n\
             Issued At: 2026-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn test_round_trip() {
        let message = test_message();
        let parsed = SiweMessage::parse(&message.prepare()).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_prepare_is_deterministic() {
        let message = test_message();
        assert_eq!(message.prepare(), message.prepare());
    }

    #[rstest]
    #[case::address(|m: &mut SiweMessage| m.address = "0xB".to_string())]
    #[case::chain_id(|m: &mut SiweMessage| m.chain_id = 5)]
    #[case::domain(|m: &mut SiweMessage| m.domain = "other.test".to_string())]
    #[case::nonce(|m: &mut SiweMessage| m.nonce = "n2".to_string())]
    #[case::statement(|m: &mut SiweMessage| m.statement = "Another statement.".to_string())]
    #[case::uri(|m: &mut SiweMessage| m.uri = "https://other.test".to_string())]
    #[case::version(|m: &mut SiweMessage| m.version = "2".to_string())]
    #[case::issued_at(|m: &mut SiweMessage| m.issued_at = "2026-02-02T00:00:00.000Z".to_string())]
    fn test_changing_any_field_changes_the_text(#[case] mutate: fn(&mut SiweMessage)) {
        let original = test_message();
        let mut changed = original.clone();
        mutate(&mut changed);
        assert_ne!(original.prepare(), changed.prepare());
    }

    #[test]
    fn test_serializes_in_camel_case() {
        let value = serde_json::to_value(test_message()).unwrap();
        assert_eq!(value["chainId"], 1);
        assert_eq!(value["issuedAt"], "2026-01-01T00:00:00.000Z");
        assert_eq!(value["nonce"], "n1");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            SiweMessage::parse("hello"),
            Err(MessageParseError::MissingPreamble)
        ));
    }

    #[test]
    fn test_parse_rejects_bad_chain_id() {
        let text = test_message().prepare().replace("Chain ID: 1", "Chain ID: x");
        assert!(matches!(
            SiweMessage::parse(&text),
            Err(MessageParseError::InvalidChainId(_))
        ));
    }
}
