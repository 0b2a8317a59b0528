//! Poll-until-ready utility
//!
//! Generic "probe until it succeeds or the budget runs out" loop with a
//! constant delay between attempts. Used by the provisioning workflow to
//! wait for Grafana to come up, and reusable anywhere a dependency needs
//! the same treatment.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Retry budget: how many probes, and how long between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollBudget {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(2),
        }
    }
}

/// The probe never succeeded within the budget
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last}")]
pub struct BudgetExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `probe` up to `budget.max_attempts` times, sleeping `budget.interval`
/// between attempts (constant, not exponential). Returns the first success,
/// or the last error once the budget is exhausted.
pub async fn poll_until<T, E, F, Fut>(budget: PollBudget, mut probe: F) -> Result<T, BudgetExhausted<E>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    // A zero budget still probes once.
    let max_attempts = budget.max_attempts.max(1);

    let mut attempt = 1;
    loop {
        match probe().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("probe attempt {}/{} failed: {}", attempt, max_attempts, e);
                if attempt >= max_attempts {
                    return Err(BudgetExhausted {
                        attempts: max_attempts,
                        last: e,
                    });
                }
            }
        }
        tokio::time::sleep(budget.interval).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant_budget(max_attempts: u32) -> PollBudget {
        PollBudget::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = Cell::new(0u32);
        let result = poll_until(instant_budget(10), || {
            calls.set(calls.get() + 1);
            async move { Ok::<_, &str>("ready") }
        })
        .await;

        assert_eq!(result.unwrap(), "ready");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn succeeds_mid_budget_without_further_probes() {
        let calls = Cell::new(0u32);
        let result = poll_until(instant_budget(10), || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n >= 3 {
                    Ok(n)
                } else {
                    Err("not yet")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn fails_after_exactly_max_attempts() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = poll_until(instant_budget(4), || {
            calls.set(calls.get() + 1);
            async { Err("still down") }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(calls.get(), 4);
        assert_eq!(err.to_string(), "gave up after 4 attempts: still down");
    }
}
