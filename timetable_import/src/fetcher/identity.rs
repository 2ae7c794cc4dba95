use rand::seq::IndexedRandom;
use reqwest::header::HeaderMap;
use shared_kernel::http_client::{HeadersMapGenerator, HttpClientError};
use std::collections::HashMap;
use url::Url;

const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:107.0) Gecko/20100101 Firefox/107.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
];

/// The browser a request pretends to come from. Drawn fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_agent: &'static str,
    referer: String,
}

impl Identity {
    pub fn user_agent(&self) -> &str {
        self.user_agent
    }

    /// Enough of the user agent to tell identities apart in logs.
    pub fn short_user_agent(&self) -> &str {
        let end = self
            .user_agent
            .char_indices()
            .nth(30)
            .map_or(self.user_agent.len(), |(index, _)| index);
        &self.user_agent[..end]
    }

    pub fn headers(&self) -> HashMap<&'static str, String> {
        HashMap::from([
            (
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            ),
            ("accept-language", "en-US,en;q=0.5".to_string()),
            ("referer", self.referer.clone()),
            ("dnt", "1".to_string()),
            ("user-agent", self.user_agent.to_string()),
        ])
    }

    pub fn header_map(&self) -> Result<HeaderMap, HttpClientError> {
        HeadersMapGenerator::try_from(self.headers()).map(HeadersMapGenerator::into_inner)
    }
}

/// Hands out identities for one site.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    referer: String,
}

impl IdentityPool {
    /// Identities refer back to the root of the site serving `base_url`.
    pub fn for_site(base_url: &Url) -> Self {
        Self {
            referer: format!("{}/", base_url.origin().ascii_serialization()),
        }
    }

    pub fn draw(&self) -> Identity {
        let user_agent = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);
        Identity {
            user_agent,
            referer: self.referer.clone(),
        }
    }
}
