use crate::errors::AttemptError;
use crate::fetcher::challenge::is_challenge;
use crate::fetcher::identity::Identity;
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Connection state (cookies, pooled connections) shared by consecutive attempts.
#[async_trait]
pub trait Session: Send + Sync {
    async fn get_text(
        &self,
        url: &Url,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<String, AttemptError>;
}

/// Builds brand-new sessions; used once up front and again after every challenge.
pub trait SessionFactory: Send + Sync {
    type Session: Session;

    fn create(&self) -> anyhow::Result<Self::Session>;
}

pub struct ReqwestSession {
    client: reqwest::Client,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestSessionFactory;

impl SessionFactory for ReqwestSessionFactory {
    type Session = ReqwestSession;

    fn create(&self) -> anyhow::Result<ReqwestSession> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .context("Failed to build http client")?;
        Ok(ReqwestSession { client })
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> AttemptError {
    if err.is_timeout() {
        AttemptError::Timeout(timeout)
    } else {
        AttemptError::Transport(err.to_string())
    }
}

#[async_trait]
impl Session for ReqwestSession {
    async fn get_text(
        &self,
        url: &Url,
        identity: &Identity,
        timeout: Duration,
    ) -> Result<String, AttemptError> {
        let headers = identity
            .header_map()
            .map_err(|err| AttemptError::Transport(err.to_string()))?;
        let response = self
            .client
            .get(url.clone())
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| classify(err, timeout))?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|err| classify(err, timeout))?;

        if is_challenge(status, &response_headers, &body) {
            return Err(AttemptError::Challenge {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(AttemptError::Status {
                status: status.as_u16(),
            });
        }
        Ok(body)
    }
}
