//! The settlement circuit breaker: a closed/open/half_open state machine
//! guarding calls to the router bridge over a sliding window of call
//! outcomes.

pub mod config;
pub mod error;

pub use config::CircuitBreakerArgs;
pub use error::Error;

use std::{
    collections::VecDeque,
    future::Future,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    at: Instant,
    success: bool,
    slow: bool,
}

struct Inner {
    state: State,
    window: VecDeque<Outcome>,
    opened_at: Option<Instant>,
    half_open_calls_in_flight: u32,
    half_open_successes: u32,
}

/// Guards a fallible, possibly slow operation (a venue call, a coordinator
/// round) behind a closed/open/half_open state machine.
///
/// - `Closed`: calls pass through; failures and slow calls accumulate in a
///   sliding window. Once `failure_threshold` consecutive failures, or
///   `error_percentage_threshold` over at least `volume_threshold` samples, is
///   reached, the breaker opens.
/// - `Open`: calls are rejected immediately with [`Error::Open`] until
///   `timeout` has elapsed, at which point the breaker moves to `HalfOpen`.
/// - `HalfOpen`: up to `half_open_max_calls` calls are let through as probes.
///   `recovery_threshold` consecutive successes closes the breaker again; a
///   single failure reopens it.
pub struct CircuitBreaker {
    config: config::CircuitBreakerArgs,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: config::CircuitBreakerArgs) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: State::Closed,
                window: VecDeque::new(),
                opened_at: None,
                half_open_calls_in_flight: 0,
                half_open_successes: 0,
            }),
        }
    }

    pub async fn state(&self) -> State {
        self.inner.lock().await.state
    }

    /// Runs `f`, recording its outcome in the sliding window and advancing
    /// the state machine. Returns [`Error::Open`] without invoking `f` if the
    /// breaker is currently open.
    pub async fn execute<F, Fut, T, E>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.admit().await?;

        let started = Instant::now();
        let result = f().await;
        let elapsed = started.elapsed();
        let success = result.is_ok();
        let slow = elapsed >= self.config.slow_call_threshold;

        self.record(success, slow).await;

        result.map_err(|_| Error::OperationFailed)
    }

    /// Like [`Self::execute`], but when the breaker is open, runs `fallback`
    /// instead of short-circuiting with [`Error::Open`]. A failing fallback
    /// is propagated as [`Error::OperationFailed`].
    pub async fn execute_with_fallback<F, Fut, FB, FbFut, T, E>(&self, f: F, fallback: FB) -> Result<T, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        FB: FnOnce() -> FbFut,
        FbFut: Future<Output = Result<T, E>>,
    {
        match self.execute(f).await {
            Err(Error::Open) => fallback().await.map_err(|_| Error::OperationFailed),
            other => other,
        }
    }

    async fn admit(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            State::Closed => Ok(()),
            State::Open => {
                let opened_at = inner.opened_at.expect("open state always has opened_at");
                if opened_at.elapsed() >= self.config.timeout {
                    inner.state = State::HalfOpen;
                    inner.half_open_calls_in_flight = 1;
                    inner.half_open_successes = 0;
                    Ok(())
                } else {
                    Err(Error::Open)
                }
            }
            State::HalfOpen => {
                if inner.half_open_calls_in_flight < self.config.half_open_max_calls {
                    inner.half_open_calls_in_flight += 1;
                    Ok(())
                } else {
                    Err(Error::Open)
                }
            }
        }
    }

    async fn record(&self, success: bool, slow: bool) {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        match inner.state {
            State::HalfOpen => {
                inner.half_open_calls_in_flight = inner.half_open_calls_in_flight.saturating_sub(1);
                if success && !slow {
                    inner.half_open_successes += 1;
                    if inner.half_open_successes >= self.config.recovery_threshold {
                        inner.state = State::Closed;
                        inner.window.clear();
                        inner.opened_at = None;
                    }
                } else {
                    inner.state = State::Open;
                    inner.opened_at = Some(now);
                    inner.half_open_calls_in_flight = 0;
                }
                return;
            }
            State::Open => return,
            State::Closed => {}
        }

        inner.window.push_back(Outcome { at: now, success, slow });
        while inner.window.len() > self.config.window_size as usize {
            inner.window.pop_front();
        }

        let failure_as_error = |o: &Outcome| !o.success || o.slow;
        let consecutive_failures = inner
            .window
            .iter()
            .rev()
            .take_while(|o| failure_as_error(o))
            .count() as u32;

        if consecutive_failures >= self.config.failure_threshold {
            inner.state = State::Open;
            inner.opened_at = Some(now);
            return;
        }

        if inner.window.len() as u32 >= self.config.volume_threshold {
            let errors = inner.window.iter().filter(|o| failure_as_error(o)).count() as u32;
            let error_percentage = errors * 100 / inner.window.len() as u32;
            if error_percentage >= self.config.error_percentage_threshold {
                inner.state = State::Open;
                inner.opened_at = Some(now);
            }
        }
    }
}

/// Used by tests that need to force the breaker into a given state without
/// running real calls through it.
#[cfg(any(test, feature = "test-util"))]
impl CircuitBreaker {
    pub async fn force_open(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = State::Open;
        inner.opened_at = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> config::CircuitBreakerArgs {
        config::CircuitBreakerArgs {
            failure_threshold: 3,
            error_percentage_threshold: 50,
            volume_threshold: 4,
            slow_call_threshold: Duration::from_millis(500),
            timeout: Duration::from_millis(20),
            recovery_threshold: 2,
            half_open_max_calls: 1,
            window_size: 10,
        }
    }

    async fn fail() -> Result<(), ()> {
        Err(())
    }

    async fn ok() -> Result<(), ()> {
        Ok(())
    }

    #[tokio::test]
    async fn opens_after_consecutive_failures() {
        let breaker = CircuitBreaker::new(config());
        for _ in 0..3 {
            let _ = breaker.execute(fail).await;
        }
        assert_eq!(breaker.state().await, State::Open);
        assert!(matches!(breaker.execute(ok).await, Err(Error::Open)));
    }

    #[tokio::test]
    async fn half_opens_after_timeout_and_closes_on_recovery() {
        let breaker = CircuitBreaker::new(config());
        breaker.force_open().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(breaker.execute(ok).await.is_ok());
        assert_eq!(breaker.state().await, State::HalfOpen);
        // half_open_max_calls is 1, so the next probe must be admitted after
        // the previous one resolved.
        assert!(breaker.execute(ok).await.is_ok());
        assert_eq!(breaker.state().await, State::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens_immediately() {
        let breaker = CircuitBreaker::new(config());
        breaker.force_open().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = breaker.execute(fail).await;
        assert_eq!(breaker.state().await, State::Open);
    }

    #[tokio::test]
    async fn closed_breaker_admits_calls() {
        let breaker = CircuitBreaker::new(config());
        assert!(breaker.execute(ok).await.is_ok());
        assert_eq!(breaker.state().await, State::Closed);
    }
}
