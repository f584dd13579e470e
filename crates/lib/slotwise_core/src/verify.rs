//! Email-domain verification boundary.
//!
//! The subscribe gate only needs one bit: does this domain accept mail?
//! Resolution mechanics are an external concern; the production
//! implementation asks a DNS-over-HTTPS resolver for MX records. A lookup
//! failure is an upstream error, never an implicit "invalid domain".

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// DNS record type code for MX.
const MX_TYPE: u16 = 15;

/// DNS rcode for NXDOMAIN.
const RCODE_NXDOMAIN: u32 = 3;

/// Domain-verification errors.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("domain lookup failed: {0}")]
    Lookup(String),
}

/// Answers "does this domain accept mail".
#[async_trait]
pub trait DomainVerifier: Send + Sync {
    async fn has_mail_exchanger(&self, domain: &str) -> Result<bool, VerifyError>;
}

/// Verifier that accepts every domain. For local development where no
/// resolver is reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllVerifier;

#[async_trait]
impl DomainVerifier for AllowAllVerifier {
    async fn has_mail_exchanger(&self, _domain: &str) -> Result<bool, VerifyError> {
        Ok(true)
    }
}

#[derive(Debug, Deserialize)]
struct DnsJsonResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DnsJsonAnswer>,
}

#[derive(Debug, Deserialize)]
struct DnsJsonAnswer {
    #[serde(rename = "type")]
    record_type: u16,
}

/// MX lookup via a DNS-over-HTTPS JSON resolver (RFC 8484-adjacent
/// `application/dns-json` endpoints, e.g. Cloudflare's).
pub struct DohDomainVerifier {
    client: Client,
    endpoint: Url,
}

impl DohDomainVerifier {
    pub const DEFAULT_ENDPOINT: &'static str = "https://cloudflare-dns.com/dns-query";

    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl DomainVerifier for DohDomainVerifier {
    async fn has_mail_exchanger(&self, domain: &str) -> Result<bool, VerifyError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("name", domain), ("type", "MX")])
            .header("accept", "application/dns-json")
            .send()
            .await
            .map_err(|e| VerifyError::Lookup(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::Lookup(format!("resolver status {status}")));
        }

        let dns: DnsJsonResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::Lookup(format!("malformed resolver reply: {e}")))?;

        if dns.status == RCODE_NXDOMAIN {
            debug!(domain, "NXDOMAIN");
            return Ok(false);
        }
        if dns.status != 0 {
            return Err(VerifyError::Lookup(format!("resolver rcode {}", dns.status)));
        }

        Ok(dns.answer.iter().any(|a| a.record_type == MX_TYPE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_json_with_mx_answer_parses() {
        let json = r#"{"Status":0,"Answer":[{"name":"example.com","type":15,"TTL":300,"data":"10 mail.example.com."}]}"#;
        let parsed: DnsJsonResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, 0);
        assert!(parsed.answer.iter().any(|a| a.record_type == MX_TYPE));
    }

    #[test]
    fn dns_json_without_answer_section_parses_as_empty() {
        let parsed: DnsJsonResponse = serde_json::from_str(r#"{"Status":3}"#).unwrap();
        assert_eq!(parsed.status, RCODE_NXDOMAIN);
        assert!(parsed.answer.is_empty());
    }

    #[tokio::test]
    async fn allow_all_verifier_accepts_anything() {
        assert!(AllowAllVerifier.has_mail_exchanger("whatever.invalid").await.unwrap());
    }
}
