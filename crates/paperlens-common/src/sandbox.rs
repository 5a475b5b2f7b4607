use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::error::CommonError;

const USER_AGENT: &str = "PaperLens/0.1 (paper analysis)";

/// HTTP client that only issues requests to approved hosts.
/// Paper downloads and metadata lookups go through this so a crafted
/// arXiv link cannot make the service fetch arbitrary URLs.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client that may reach the arXiv hosts only.
    pub fn new() -> Result<Self, CommonError> {
        Self::with_timeout(Duration::from_secs(60))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, CommonError> {
        let domains = [
            "arxiv.org",                         // abs/pdf pages
            "export.arxiv.org",                  // Atom metadata API
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CommonError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    /// Subdomains of an allowed host are accepted.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else { return false };
        let Some(host) = parsed.host_str() else { return false };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, CommonError> {
        self.check(url)?;
        Ok(self.client.get(url))
    }

    fn check(&self, url: &str) -> Result<(), CommonError> {
        if self.is_allowed(url) {
            Ok(())
        } else {
            tracing::warn!(url, "Blocked request to host outside the allowlist");
            Err(CommonError::Security(format!("domain not in allowlist for URL {}", url)))
        }
    }
}
