//! Bounded retry with exponential (or fixed) waits between attempts.
//!
//! Exhausting the attempt budget is not an error: callers receive a
//! [`RetryOutcome`] and decide whether to degrade or abort.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Wait `unit * 2^attempt` after the failed attempt number `attempt` (zero-based).
    Exponential { unit: Duration },
    Fixed(Duration),
}

impl Schedule {
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Schedule::Exponential { unit } => 2u32
                .checked_pow(attempt)
                .and_then(|factor| unit.checked_mul(factor))
                .unwrap_or(Duration::MAX),
            Schedule::Fixed(interval) => *interval,
        }
    }
}

#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded {
        value: T,
        attempts: u32,
        waited: Duration,
    },
    /// Every attempt failed with a transient error.
    Exhausted {
        attempts: u32,
        waited: Duration,
        last_error: E,
    },
    /// An attempt failed with an error the classifier marked as permanent.
    Aborted {
        attempts: u32,
        waited: Duration,
        error: E,
    },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. }
            | RetryOutcome::Exhausted { attempts, .. }
            | RetryOutcome::Aborted { attempts, .. } => *attempts,
        }
    }

    /// Total time spent sleeping between attempts.
    pub fn waited(&self) -> Duration {
        match self {
            RetryOutcome::Succeeded { waited, .. }
            | RetryOutcome::Exhausted { waited, .. }
            | RetryOutcome::Aborted { waited, .. } => *waited,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            RetryOutcome::Succeeded { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    max_attempts: u32,
    schedule: Schedule,
}

impl Backoff {
    /// A budget of zero attempts is treated as one.
    pub fn new(max_attempts: u32, schedule: Schedule) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            schedule,
        }
    }

    pub fn exponential(max_attempts: u32, unit: Duration) -> Self {
        Self::new(max_attempts, Schedule::Exponential { unit })
    }

    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self::new(max_attempts, Schedule::Fixed(interval))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Retry `operation` on every error.
    pub async fn run<T, E, F, Fut>(&self, label: &str, operation: F) -> RetryOutcome<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_classified(label, operation, |_| true).await
    }

    /// Retry `operation` while `is_transient` accepts the error; stop at the
    /// first permanent one. The operation receives the zero-based attempt index.
    pub async fn run_classified<T, E, F, Fut, C>(
        &self,
        label: &str,
        mut operation: F,
        is_transient: C,
    ) -> RetryOutcome<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
    {
        let mut waited = Duration::ZERO;
        let mut attempt = 0;

        loop {
            info!(
                "{}: attempt {}/{}",
                label,
                attempt + 1,
                self.max_attempts
            );

            let error = match operation(attempt).await {
                Ok(value) => {
                    debug!("{} succeeded after {} attempt(s)", label, attempt + 1);
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt + 1,
                        waited,
                    };
                }
                Err(error) => error,
            };

            if !is_transient(&error) {
                warn!("{} failed permanently: {}", label, error);
                return RetryOutcome::Aborted {
                    attempts: attempt + 1,
                    waited,
                    error,
                };
            }

            if attempt + 1 >= self.max_attempts {
                warn!(
                    "{} gave up after {} attempts: {}",
                    label, self.max_attempts, error
                );
                return RetryOutcome::Exhausted {
                    attempts: attempt + 1,
                    waited,
                    last_error: error,
                };
            }

            let delay = self.schedule.delay(attempt);
            warn!(
                "{} attempt {} failed: {}; retrying in {:?}",
                label,
                attempt + 1,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
            waited += delay;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: Duration = Duration::from_secs(1);

    /// Calls fail `failures` times, then succeed.
    async fn run_flaky(backoff: Backoff, failures: u32) -> (RetryOutcome<u32, String>, u32) {
        let mut calls = 0;
        let outcome = backoff
            .run("flaky", |_| {
                calls += 1;
                let call = calls;
                async move {
                    if call <= failures {
                        Err(format!("failure {}", call))
                    } else {
                        Ok(call)
                    }
                }
            })
            .await;
        (outcome, calls)
    }

    #[test]
    fn test_exponential_delays() {
        let schedule = Schedule::Exponential { unit: UNIT };
        assert_eq!(schedule.delay(0), Duration::from_secs(1));
        assert_eq!(schedule.delay(1), Duration::from_secs(2));
        assert_eq!(schedule.delay(5), Duration::from_secs(32));
        assert_eq!(schedule.delay(64), Duration::MAX);
    }

    #[test]
    fn test_fixed_delays() {
        let schedule = Schedule::Fixed(Duration::from_secs(30));
        assert_eq!(schedule.delay(0), Duration::from_secs(30));
        assert_eq!(schedule.delay(7), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_wait() {
        let (outcome, calls) = run_flaky(Backoff::exponential(5, UNIT), 0).await;

        assert!(outcome.is_success());
        assert_eq!(calls, 1);
        assert_eq!(outcome.waited(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_k_failures_then_success() {
        for k in 1..=4u32 {
            let start = tokio::time::Instant::now();
            let (outcome, calls) = run_flaky(Backoff::exponential(k + 1, UNIT), k).await;

            let expected: u64 = (0..k).map(|i| 2u64.pow(i)).sum();
            assert_eq!(calls, k + 1);
            assert_eq!(outcome.attempts(), k + 1);
            assert_eq!(outcome.waited(), Duration::from_secs(expected));
            assert!(start.elapsed() >= Duration::from_secs(expected));
            assert_eq!(outcome.ok(), Some(k + 1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_attempts() {
        let start = tokio::time::Instant::now();
        let (outcome, calls) = run_flaky(Backoff::exponential(3, UNIT), 10).await;

        assert_eq!(calls, 3);
        match outcome {
            RetryOutcome::Exhausted {
                attempts,
                waited,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                // No sleep after the final attempt.
                assert_eq!(waited, Duration::from_secs(1 + 2));
                assert_eq!(last_error, "failure 3");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_equal_to_budget_is_exhausted() {
        let (outcome, calls) = run_flaky(Backoff::exponential(4, UNIT), 4).await;

        assert!(!outcome.is_success());
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_stops_immediately() {
        let mut calls = 0;
        let outcome: RetryOutcome<(), String> = Backoff::exponential(6, UNIT)
            .run_classified(
                "classified",
                |_| {
                    calls += 1;
                    let call = calls;
                    async move {
                        if call == 1 {
                            Err("not found".to_string())
                        } else {
                            Err("forbidden".to_string())
                        }
                    }
                },
                |e| e == "not found",
            )
            .await;

        assert_eq!(calls, 2);
        assert!(matches!(
            outcome,
            RetryOutcome::Aborted { attempts: 2, ref error, .. } if error == "forbidden"
        ));
        assert_eq!(outcome.waited(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_receives_attempt_index() {
        let mut seen = Vec::new();
        let _: RetryOutcome<(), String> = Backoff::fixed(3, Duration::from_secs(30))
            .run("indexed", |attempt| {
                seen.push(attempt);
                async { Err("nope".to_string()) }
            })
            .await;

        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_zero_budget_runs_once() {
        assert_eq!(Backoff::exponential(0, UNIT).max_attempts(), 1);
    }
}
