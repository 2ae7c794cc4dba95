/// Where a single `fetch` call is in its retry cycle. Attempts are counted from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Attempting { attempt: u32 },
    Backoff { attempt: u32 },
    ChallengeRecovery { attempt: u32 },
    Succeeded { attempt: u32 },
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchEvent {
    Start,
    Fetched,
    Challenged,
    Failed,
    Waited,
}

impl FetchState {
    /// Events that make no sense in the current state leave it unchanged.
    pub fn next(self, event: FetchEvent, max_attempts: u32) -> FetchState {
        use FetchEvent::*;
        use FetchState::*;

        match (self, event) {
            (Idle, Start) if max_attempts == 0 => Exhausted { attempts: 0 },
            (Idle, Start) => Attempting { attempt: 1 },
            (Attempting { attempt }, Fetched) => Succeeded { attempt },
            // the session is replaced even when no attempt is left
            (Attempting { attempt }, Challenged) => ChallengeRecovery { attempt },
            (Attempting { attempt }, Failed) if attempt < max_attempts => Backoff { attempt },
            (Attempting { attempt }, Failed) => Exhausted { attempts: attempt },
            (Backoff { attempt } | ChallengeRecovery { attempt }, Waited)
                if attempt < max_attempts =>
            {
                Attempting {
                    attempt: attempt + 1,
                }
            }
            (Backoff { attempt } | ChallengeRecovery { attempt }, Waited) => {
                Exhausted { attempts: attempt }
            }
            (state, _) => state,
        }
    }

    pub fn has_attempts_left(&self, max_attempts: u32) -> bool {
        match self {
            FetchState::Idle => max_attempts > 0,
            FetchState::Attempting { attempt }
            | FetchState::Backoff { attempt }
            | FetchState::ChallengeRecovery { attempt }
            | FetchState::Succeeded { attempt } => *attempt < max_attempts,
            FetchState::Exhausted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchEvent, FetchState};

    fn run(events: &[FetchEvent], max_attempts: u32) -> FetchState {
        events
            .iter()
            .fold(FetchState::Idle, |state, event| state.next(*event, max_attempts))
    }

    #[test]
    fn test_that_a_first_try_success_succeeds_on_attempt_one() {
        let state = run(&[FetchEvent::Start, FetchEvent::Fetched], 5);
        assert_eq!(state, FetchState::Succeeded { attempt: 1 });
    }

    #[test]
    fn test_that_failures_back_off_before_the_next_attempt() {
        use FetchEvent::*;
        let state = run(&[Start, Failed], 3);
        assert_eq!(state, FetchState::Backoff { attempt: 1 });
        let state = run(&[Start, Failed, Waited, Failed, Waited, Fetched], 3);
        assert_eq!(state, FetchState::Succeeded { attempt: 3 });
    }

    #[test]
    fn test_that_the_last_failure_exhausts_without_backoff() {
        use FetchEvent::*;
        let state = run(&[Start, Failed, Waited, Failed], 2);
        assert_eq!(state, FetchState::Exhausted { attempts: 2 });
    }

    #[test]
    fn test_that_a_challenge_goes_through_recovery() {
        use FetchEvent::*;
        assert_eq!(
            run(&[Start, Challenged], 2),
            FetchState::ChallengeRecovery { attempt: 1 }
        );
        assert_eq!(
            run(&[Start, Challenged, Waited], 2),
            FetchState::Attempting { attempt: 2 }
        );
        assert_eq!(
            run(&[Start, Challenged, Waited, Challenged, Waited], 2),
            FetchState::Exhausted { attempts: 2 }
        );
    }

    #[test]
    fn test_that_zero_attempts_exhausts_immediately() {
        assert_eq!(
            run(&[FetchEvent::Start], 0),
            FetchState::Exhausted { attempts: 0 }
        );
    }

    #[test]
    fn test_that_terminal_states_ignore_events() {
        let done = FetchState::Succeeded { attempt: 2 };
        assert_eq!(done.next(FetchEvent::Failed, 5), done);
        let exhausted = FetchState::Exhausted { attempts: 5 };
        assert_eq!(exhausted.next(FetchEvent::Start, 5), exhausted);
    }
}
