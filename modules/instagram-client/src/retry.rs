//! Bounded-retry policy with randomized backoff.
//!
//! The pacer is a trait so tests can record pauses instead of sleeping —
//! the 30-60s enrichment pacing would make real sleeps unusable in CI.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use crate::error::Result;

/// Fixed retry count with a flat randomized backoff range. No exponential
/// growth.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_min: Duration::from_secs(2),
            backoff_max: Duration::from_secs(4),
        }
    }
}

/// Injectable sleep. Production uses [`TokioPacer`]; tests record the
/// requested ranges and return immediately.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, min: Duration, max: Duration);
}

pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, min: Duration, max: Duration) {
        tokio::time::sleep(jittered(min, max)).await;
    }
}

/// Uniform duration in `[min, max)`; collapses to `min` when the range is empty.
pub fn jittered(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let secs = rand::rng().random_range(min.as_secs_f64()..max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

/// Run `op` up to `policy.max_attempts` times, pausing a randomized backoff
/// between attempts. Exhaustion yields `None`, never an error — a failing
/// unit of work must not abort the run.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    pacer: &dyn Pacer,
    subject: &str,
    mut op: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 1..=policy.max_attempts {
        match op().await {
            Ok(value) => return Some(value),
            Err(err) => {
                warn!(subject, attempt, error = %err, "Request failed");
            }
        }
        if attempt < policy.max_attempts {
            pacer.pause(policy.backoff_min, policy.backoff_max).await;
        }
    }
    warn!(
        subject,
        attempts = policy.max_attempts,
        "Retries exhausted, giving up"
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstagramError;
    use std::sync::Mutex;

    struct RecordingPacer {
        pauses: Mutex<Vec<(Duration, Duration)>>,
    }

    impl RecordingPacer {
        fn new() -> Self {
            Self {
                pauses: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Pacer for RecordingPacer {
        async fn pause(&self, min: Duration, max: Duration) {
            self.pauses.lock().unwrap().push((min, max));
        }
    }

    #[tokio::test]
    async fn exhausts_exactly_three_attempts_with_backoff_between() {
        let policy = RetryPolicy::default();
        let pacer = RecordingPacer::new();
        let attempts = Mutex::new(0u32);

        let result: Option<()> = with_retry(&policy, &pacer, "some_user", || {
            *attempts.lock().unwrap() += 1;
            async {
                Err(InstagramError::Api {
                    status: 429,
                    message: "rate limited".into(),
                })
            }
        })
        .await;

        assert!(result.is_none());
        assert_eq!(*attempts.lock().unwrap(), 3);

        let pauses = pacer.pauses.lock().unwrap();
        assert_eq!(pauses.len(), 2, "backoff separates attempts only");
        for (min, max) in pauses.iter() {
            assert_eq!(*min, Duration::from_secs(2));
            assert_eq!(*max, Duration::from_secs(4));
        }
    }

    #[tokio::test]
    async fn returns_first_success_without_further_attempts() {
        let policy = RetryPolicy::default();
        let pacer = RecordingPacer::new();
        let attempts = Mutex::new(0u32);

        let result = with_retry(&policy, &pacer, "some_user", || {
            let n = {
                let mut guard = attempts.lock().unwrap();
                *guard += 1;
                *guard
            };
            async move {
                if n < 2 {
                    Err(InstagramError::Network("connection reset".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Some(42));
        assert_eq!(*attempts.lock().unwrap(), 2);
        assert_eq!(pacer.pauses.lock().unwrap().len(), 1);
    }

    #[test]
    fn jittered_stays_within_range() {
        let min = Duration::from_secs(2);
        let max = Duration::from_secs(4);
        for _ in 0..100 {
            let d = jittered(min, max);
            assert!(d >= min && d < max);
        }
    }

    #[test]
    fn jittered_collapses_empty_range() {
        let d = jittered(Duration::from_secs(2), Duration::from_secs(2));
        assert_eq!(d, Duration::from_secs(2));
    }
}
