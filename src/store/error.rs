use std::time::Duration;

use rand::Rng;
use thiserror::Error;

/// Classification of a failed store operation, independent of the
/// underlying driver. Only [`StoreError::other`] wraps a real `postgres`
/// error; the other two variants are recognised from its SQLSTATE code so
/// callers never have to match on driver internals.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {detail}")]
    UniqueViolation { detail: String },
    #[error("deadlock detected: {detail}")]
    Deadlock { detail: String },
    #[error("store error: {source}")]
    Other {
        #[source]
        source: postgres::Error,
    },
    #[error("could not check out a pooled connection: {0}")]
    PoolExhausted(#[from] r2d2::Error),
}

impl StoreError {
    /// SQLSTATE `23505`.
    const UNIQUE_VIOLATION_CODE: &'static str = "23505";
    /// SQLSTATE `40P01`.
    const DEADLOCK_CODE: &'static str = "40P01";

    pub fn from_postgres(source: postgres::Error) -> Self {
        if let Some(db_error) = source.as_db_error() {
            if db_error.code().code() == Self::UNIQUE_VIOLATION_CODE {
                return Self::UniqueViolation {
                    detail: db_error.message().to_string(),
                };
            }
            if db_error.code().code() == Self::DEADLOCK_CODE {
                return Self::Deadlock {
                    detail: db_error.message().to_string(),
                };
            }
        }
        Self::Other { source }
    }

    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::UniqueViolation { .. } => StoreErrorKind::UniqueViolation,
            Self::Deadlock { .. } => StoreErrorKind::Deadlock,
            Self::Other { .. } | Self::PoolExhausted(_) => StoreErrorKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    UniqueViolation,
    Deadlock,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryDecision {
    RetryImmediately,
    RetryAfter(Duration),
    RetryOnceThenFail,
    Fatal,
}

/// Maps a [`StoreErrorKind`] plus a running soft-error counter onto a retry
/// decision. A worker keeps one counter per protein attempt and stops
/// retrying once it crosses `fatal_threshold`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub fatal_threshold: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { fatal_threshold: 2.0 }
    }
}

impl RetryPolicy {
    /// `counter` is updated in place; `retried_other` tracks whether the
    /// single allowed retry of a non-unique/non-deadlock error has already
    /// been spent for this attempt.
    pub fn classify(&self, kind: StoreErrorKind, counter: &mut f64, retried_other: &mut bool) -> RetryDecision {
        match kind {
            StoreErrorKind::UniqueViolation => {
                *counter += 0.2;
                if *counter >= self.fatal_threshold {
                    RetryDecision::Fatal
                } else {
                    RetryDecision::RetryImmediately
                }
            }
            StoreErrorKind::Deadlock => {
                *counter += 1.0;
                if *counter >= self.fatal_threshold {
                    RetryDecision::Fatal
                } else {
                    let jitter = rand::thread_rng().gen_range(0.0..5.0);
                    RetryDecision::RetryAfter(Duration::from_secs_f64(5.0 * *counter + jitter))
                }
            }
            StoreErrorKind::Other => {
                *counter += 2.0;
                if *retried_other || *counter >= self.fatal_threshold {
                    RetryDecision::Fatal
                } else {
                    *retried_other = true;
                    RetryDecision::RetryOnceThenFail
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_stays_soft_until_threshold() {
        let policy = RetryPolicy::default();
        let mut counter = 0.0;
        let mut retried_other = false;
        for _ in 0..9 {
            let decision = policy.classify(StoreErrorKind::UniqueViolation, &mut counter, &mut retried_other);
            assert_eq!(decision, RetryDecision::RetryImmediately);
        }
        let decision = policy.classify(StoreErrorKind::UniqueViolation, &mut counter, &mut retried_other);
        assert_eq!(decision, RetryDecision::Fatal);
    }

    #[test]
    fn other_error_retries_once_then_is_fatal() {
        let policy = RetryPolicy::default();
        let mut counter = 0.0;
        let mut retried_other = false;
        let first = policy.classify(StoreErrorKind::Other, &mut counter, &mut retried_other);
        assert_eq!(first, RetryDecision::RetryOnceThenFail);
        let second = policy.classify(StoreErrorKind::Other, &mut counter, &mut retried_other);
        assert_eq!(second, RetryDecision::Fatal);
    }

    #[test]
    fn deadlock_backs_off_before_going_fatal() {
        let policy = RetryPolicy::default();
        let mut counter = 0.0;
        let mut retried_other = false;
        let first = policy.classify(StoreErrorKind::Deadlock, &mut counter, &mut retried_other);
        assert!(matches!(first, RetryDecision::RetryAfter(_)));
        let second = policy.classify(StoreErrorKind::Deadlock, &mut counter, &mut retried_other);
        assert_eq!(second, RetryDecision::Fatal);
    }
}
