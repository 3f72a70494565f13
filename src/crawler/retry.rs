//! Retry policy for a single download.
//!
//! Each failed attempt is classified into a [`FailureKind`]; the policy then
//! decides whether to try again, how long to wait and whether the session
//! must be refreshed first.

use std::fmt;
use std::time::Duration;

/// Why one attempt did not produce a usable answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Non-2xx status
    Http(u16),
    Timeout,
    /// Connection reset, DNS, body read errors
    Transport(String),
    /// 2xx but neither a spreadsheet nor a known error envelope
    Unrecognized(String),
    /// Could not persist the file
    Io(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Http(status) => write!(f, "HTTP {}", status),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Transport(msg) => write!(f, "transport error: {}", msg),
            FailureKind::Unrecognized(msg) => write!(f, "unrecognized response: {}", msg),
            FailureKind::Io(msg) => write!(f, "write error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    Retry {
        delay: Duration,
        /// Reload the landing page before the next attempt
        refresh_session: bool,
    },
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub failure_backoff: Duration,
    pub timeout_backoff: Duration,
    pub unrecognized_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            failure_backoff: Duration::from_secs(5),
            timeout_backoff: Duration::from_secs(10),
            unrecognized_backoff: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            failure_backoff: Duration::ZERO,
            timeout_backoff: Duration::ZERO,
            unrecognized_backoff: Duration::ZERO,
        }
    }

    /// Decide what follows failed attempt number `attempt` (1-based)
    pub fn next_step(&self, attempt: u32, failure: &FailureKind) -> RetryStep {
        if attempt >= self.max_attempts {
            return RetryStep::GiveUp;
        }

        match failure {
            FailureKind::Timeout => RetryStep::Retry {
                delay: self.timeout_backoff,
                refresh_session: false,
            },
            FailureKind::Unrecognized(_) => RetryStep::Retry {
                delay: self.unrecognized_backoff,
                refresh_session: true,
            },
            FailureKind::Http(_) | FailureKind::Transport(_) | FailureKind::Io(_) => {
                RetryStep::Retry {
                    delay: self.failure_backoff,
                    refresh_session: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_waits_longest() {
        let policy = RetryPolicy::default();
        let timeout = policy.next_step(1, &FailureKind::Timeout);
        let http = policy.next_step(1, &FailureKind::Http(503));

        assert_eq!(
            timeout,
            RetryStep::Retry { delay: Duration::from_secs(10), refresh_session: false }
        );
        assert_eq!(
            http,
            RetryStep::Retry { delay: Duration::from_secs(5), refresh_session: false }
        );
    }

    #[test]
    fn test_only_unrecognized_refreshes_session() {
        let policy = RetryPolicy::default();
        let failures = [
            FailureKind::Http(500),
            FailureKind::Timeout,
            FailureKind::Transport("reset".into()),
            FailureKind::Io("disk full".into()),
        ];
        for failure in &failures {
            match policy.next_step(1, failure) {
                RetryStep::Retry { refresh_session, .. } => assert!(!refresh_session),
                RetryStep::GiveUp => panic!("expected retry for {}", failure),
            }
        }

        assert_eq!(
            policy.next_step(2, &FailureKind::Unrecognized("html".into())),
            RetryStep::Retry { delay: Duration::from_secs(3), refresh_session: true }
        );
    }

    #[test]
    fn test_gives_up_on_last_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_step(3, &FailureKind::Timeout), RetryStep::GiveUp);
        assert_eq!(
            policy.next_step(3, &FailureKind::Unrecognized("x".into())),
            RetryStep::GiveUp
        );

        let single = RetryPolicy::immediate(1);
        assert_eq!(single.next_step(1, &FailureKind::Http(502)), RetryStep::GiveUp);
    }
}
