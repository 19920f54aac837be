use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use capture_logging::capture_warn;
use rand::Rng;

/// Bounded retries with linear backoff: `base_delay * attempt + jitter`,
/// where jitter is uniform in `[0, max_jitter]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            max_jitter: Duration::from_secs(2),
        }
    }
}

/// All attempts failed; carries the last error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    /// Delay before the attempt following failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };
        self.base_delay.saturating_mul(attempt) + jitter
    }

    /// Run `op` until it succeeds or `max_attempts` is reached. `on_retry`
    /// runs after each failed attempt that will be retried, before sleeping.
    pub async fn run<T, E, Op, Fut, R, RFut>(
        &self,
        label: &str,
        mut op: Op,
        mut on_retry: R,
    ) -> Result<T, Exhausted<E>>
    where
        E: Display,
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnMut(u32) -> RFut,
        RFut: Future<Output = ()>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max_attempts => {
                    capture_warn!("{}: attempt {}/{} failed: {}", label, attempt, max_attempts, err);
                    return Err(Exhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
                Err(err) => {
                    let delay = self.backoff(attempt);
                    capture_warn!(
                        "{}: attempt {}/{} failed: {}; retrying in {:.1}s",
                        label,
                        attempt,
                        max_attempts,
                        err,
                        delay.as_secs_f64()
                    );
                    on_retry(attempt).await;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            max_jitter: Duration::ZERO,
        }
    }

    #[test]
    fn backoff_grows_linearly_with_attempt() {
        let policy = policy(3);
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(3), Duration::from_millis(30));
    }

    #[test]
    fn jitter_stays_within_bound() {
        let policy = RetryPolicy {
            max_jitter: Duration::from_millis(5),
            ..policy(3)
        };
        for _ in 0..50 {
            let delay = policy.backoff(2);
            assert!(delay >= Duration::from_millis(20) && delay <= Duration::from_millis(25));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let retried = Cell::new(0);
        let result = policy(3)
            .run(
                "test",
                |attempt| {
                    calls.set(calls.get() + 1);
                    async move {
                        if attempt < 3 {
                            Err("flaky")
                        } else {
                            Ok(attempt)
                        }
                    }
                },
                |_| {
                    retried.set(retried.get() + 1);
                    async {}
                },
            )
            .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
        assert_eq!(retried.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_attempt_ceiling() {
        let result: Result<(), _> = policy(2)
            .run("test", |_| async { Err("down") }, |_| async {})
            .await;
        assert_eq!(
            result,
            Err(Exhausted {
                attempts: 2,
                last_error: "down"
            })
        );
    }
}
