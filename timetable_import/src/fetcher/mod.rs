mod challenge;
mod identity;
mod pacing;
mod session;
mod state;

pub use challenge::is_challenge;
pub use identity::{Identity, IdentityPool};
pub use pacing::{DelayRange, Pacing};
pub use session::{ReqwestSession, ReqwestSessionFactory, Session, SessionFactory};
pub use state::{FetchEvent, FetchState};

use crate::errors::{AttemptError, FetchError};
use anyhow::{anyhow, Context};
use pacing::pause;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Fetches pages one at a time, retrying with backoff and starting over with a brand-new
/// session whenever the site answers with an anti-bot challenge.
pub struct Fetcher<F: SessionFactory> {
    factory: F,
    session: F::Session,
    identities: IdentityPool,
    pacing: Pacing,
}

impl<F: SessionFactory> Fetcher<F> {
    pub fn new(factory: F, identities: IdentityPool, pacing: Pacing) -> Result<Self, FetchError> {
        let session = factory.create().map_err(FetchError::Session)?;
        Ok(Self {
            factory,
            session,
            identities,
            pacing,
        })
    }

    fn replace_session(&mut self, cause: Option<&AttemptError>) -> Result<(), FetchError> {
        let created = self.factory.create();
        let created = match cause {
            Some(cause) => created.with_context(|| format!("while recovering from: {cause}")),
            None => created,
        };
        self.session = created.map_err(FetchError::Session)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, url), fields(url = %url), level = "info")]
    pub async fn fetch(
        &mut self,
        url: &Url,
        max_attempts: u32,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let mut state = FetchState::Idle;
        let mut last_error: Option<AttemptError> = None;
        let mut page: Option<String> = None;

        loop {
            state = match state {
                FetchState::Idle => state.next(FetchEvent::Start, max_attempts),
                FetchState::Attempting { attempt } => {
                    let identity = self.identities.draw();
                    info!(
                        attempt,
                        max_attempts,
                        user_agent = identity.short_user_agent(),
                        "Requesting page"
                    );
                    match self.session.get_text(url, &identity, timeout).await {
                        Ok(text) => {
                            page = Some(text);
                            state.next(FetchEvent::Fetched, max_attempts)
                        }
                        Err(err) => {
                            warn!(attempt, error = %err, "Attempt failed");
                            let event = match err {
                                AttemptError::Challenge { .. } => FetchEvent::Challenged,
                                _ => FetchEvent::Failed,
                            };
                            last_error = Some(err);
                            state.next(event, max_attempts)
                        }
                    }
                }
                FetchState::ChallengeRecovery { attempt } => {
                    self.replace_session(last_error.as_ref())?;
                    if state.has_attempts_left(max_attempts) {
                        let wait = self.pacing.after_challenge.sample();
                        info!(
                            attempt,
                            wait_secs = wait.as_secs_f64(),
                            "Recreated the session after a challenge, waiting before retrying"
                        );
                        pause(wait).await;
                    }
                    state.next(FetchEvent::Waited, max_attempts)
                }
                FetchState::Backoff { attempt } => {
                    let wait = self.pacing.backoff_for(attempt);
                    info!(attempt, wait_secs = wait.as_secs_f64(), "Waiting before retrying");
                    pause(wait).await;
                    state.next(FetchEvent::Waited, max_attempts)
                }
                FetchState::Succeeded { attempt } => {
                    info!(attempt, "Fetched page");
                    pause(self.pacing.after_success.sample()).await;
                    return page.take().ok_or_else(|| {
                        FetchError::Session(anyhow!("attempt {attempt} succeeded without a page"))
                    });
                }
                FetchState::Exhausted { attempts } => {
                    warn!(attempts, "Max attempts reached");
                    return Err(match last_error.take() {
                        Some(last) => FetchError::Exhausted {
                            url: url.clone(),
                            attempts,
                            last,
                        },
                        None => FetchError::NoAttempts { url: url.clone() },
                    });
                }
            };
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedSessions;
    use super::{DelayRange, Fetcher, IdentityPool, Pacing};
    use crate::errors::{AttemptError, FetchError};
    use std::time::Duration;
    use tokio::time::Instant;
    use url::Url;

    const PAGE: &str = "https://timetable.example/viewer";
    const TIMEOUT: Duration = Duration::from_secs(45);

    fn fetcher(sessions: &ScriptedSessions) -> Fetcher<ScriptedSessions> {
        let url = Url::parse(PAGE).unwrap();
        Fetcher::new(
            sessions.clone(),
            IdentityPool::for_site(&url),
            Pacing::immediate(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_that_a_late_success_is_returned_after_exactly_that_many_attempts() {
        let sessions = ScriptedSessions::default();
        sessions
            .respond(PAGE, Err(AttemptError::Status { status: 500 }))
            .respond(PAGE, Err(AttemptError::Timeout(TIMEOUT)))
            .respond(PAGE, Err(AttemptError::Transport("reset".to_string())))
            .respond(PAGE, Ok("<html>viewer</html>"));

        let mut fetcher = fetcher(&sessions);
        let page = fetcher
            .fetch(&Url::parse(PAGE).unwrap(), 5, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(page, "<html>viewer</html>");
        assert_eq!(sessions.requests(), 4);
        assert_eq!(sessions.sessions_created(), 1);
    }

    #[tokio::test]
    async fn test_that_exhaustion_reports_the_last_failure() {
        let sessions = ScriptedSessions::default();
        sessions
            .respond(PAGE, Err(AttemptError::Timeout(TIMEOUT)))
            .respond(PAGE, Err(AttemptError::Status { status: 500 }))
            .respond(PAGE, Err(AttemptError::Status { status: 502 }))
            .respond(PAGE, Ok("never reached"));

        let mut fetcher = fetcher(&sessions);
        let error = fetcher
            .fetch(&Url::parse(PAGE).unwrap(), 3, TIMEOUT)
            .await
            .unwrap_err();

        assert_eq!(sessions.requests(), 3);
        match error {
            FetchError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 3);
                assert_eq!(last, AttemptError::Status { status: 502 });
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_that_a_challenge_replaces_the_whole_session() {
        let sessions = ScriptedSessions::default();
        sessions
            .respond(PAGE, Err(AttemptError::Challenge { status: 403 }))
            .respond(PAGE, Ok("<html>viewer</html>"));

        let mut fetcher = fetcher(&sessions);
        let page = fetcher
            .fetch(&Url::parse(PAGE).unwrap(), 5, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(page, "<html>viewer</html>");
        assert_eq!(sessions.requests(), 2);
        assert_eq!(sessions.sessions_created(), 2);
    }

    #[tokio::test]
    async fn test_that_every_attempt_draws_an_identity() {
        let sessions = ScriptedSessions::default();
        sessions
            .respond(PAGE, Err(AttemptError::Status { status: 503 }))
            .respond(PAGE, Ok("ok"));

        let mut fetcher = fetcher(&sessions);
        fetcher
            .fetch(&Url::parse(PAGE).unwrap(), 2, TIMEOUT)
            .await
            .unwrap();

        assert_eq!(sessions.user_agents.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_that_zero_attempts_makes_no_request() {
        let sessions = ScriptedSessions::default();
        let mut fetcher = fetcher(&sessions);
        let error = fetcher
            .fetch(&Url::parse(PAGE).unwrap(), 0, TIMEOUT)
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::NoAttempts { .. }));
        assert_eq!(sessions.requests(), 0);
    }

    #[tokio::test]
    async fn test_that_a_failed_session_rebuild_keeps_the_challenge() {
        let sessions = ScriptedSessions::default();
        sessions
            .refuse_sessions_after(1)
            .respond(PAGE, Err(AttemptError::Challenge { status: 403 }));

        let mut fetcher = fetcher(&sessions);
        let error = fetcher
            .fetch(&Url::parse(PAGE).unwrap(), 3, TIMEOUT)
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::Session(_)));
        assert!(error
            .to_string()
            .contains("anti-bot challenge served (status 403)"));
        assert_eq!(sessions.requests(), 1);
    }

    fn fixed_pacing() -> Pacing {
        Pacing {
            after_success: DelayRange::new(1.0, 1.0),
            after_challenge: DelayRange::new(20.0, 20.0),
            backoff: DelayRange::new(5.0, 5.0),
        }
    }

    fn paced_fetcher(sessions: &ScriptedSessions) -> Fetcher<ScriptedSessions> {
        Fetcher::new(
            sessions.clone(),
            IdentityPool::for_site(&Url::parse(PAGE).unwrap()),
            fixed_pacing(),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_that_a_challenge_waits_the_recovery_delay_and_failures_scale_the_backoff() {
        let sessions = ScriptedSessions::default();
        sessions
            .respond(PAGE, Err(AttemptError::Challenge { status: 403 }))
            .respond(PAGE, Err(AttemptError::Status { status: 500 }))
            .respond(PAGE, Ok("<html>viewer</html>"));

        let started = Instant::now();
        paced_fetcher(&sessions)
            .fetch(&Url::parse(PAGE).unwrap(), 5, TIMEOUT)
            .await
            .unwrap();

        // 20s recovery, 5s x attempt 2, 1s after the success
        assert_eq!(started.elapsed().as_secs(), 31);
        assert_eq!(sessions.sessions_created(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_that_nothing_is_waited_after_the_final_attempt() {
        let sessions = ScriptedSessions::default();
        sessions
            .respond(PAGE, Err(AttemptError::Status { status: 500 }))
            .respond(PAGE, Err(AttemptError::Status { status: 502 }))
            .respond(PAGE, Err(AttemptError::Challenge { status: 503 }));

        let started = Instant::now();
        let error = paced_fetcher(&sessions)
            .fetch(&Url::parse(PAGE).unwrap(), 3, TIMEOUT)
            .await
            .unwrap_err();

        assert_eq!(started.elapsed().as_secs(), 15);
        assert!(matches!(error, FetchError::Exhausted { attempts: 3, .. }));
        assert_eq!(sessions.sessions_created(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_that_the_final_failure_is_not_followed_by_a_backoff() {
        let sessions = ScriptedSessions::default();
        sessions
            .respond(PAGE, Err(AttemptError::Status { status: 500 }))
            .respond(PAGE, Err(AttemptError::Status { status: 500 }));

        let started = Instant::now();
        paced_fetcher(&sessions)
            .fetch(&Url::parse(PAGE).unwrap(), 2, TIMEOUT)
            .await
            .unwrap_err();

        assert_eq!(started.elapsed().as_secs(), 5);
    }
}
