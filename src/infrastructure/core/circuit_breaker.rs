use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,   // Deliveries go through
    Open,     // Too many consecutive failures - reject without trying
    HalfOpen, // Cool-down elapsed - let one trial delivery through
}

/// Guards an outbound delivery path against hammering a dead collector.
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    failure_threshold: usize,
    cool_down: Duration,
    name: String,
}

struct BreakerState {
    state: CircuitState,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    /// # Arguments
    /// * `name` - Identifier for logging
    /// * `failure_threshold` - Consecutive failures before the circuit opens
    /// * `cool_down` - Time spent Open before a trial delivery is allowed
    pub fn new(name: impl Into<String>, failure_threshold: usize, cool_down: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
            failure_threshold: failure_threshold.max(1),
            cool_down,
            name: name.into(),
        }
    }

    /// `Ok(())` when a delivery may be attempted, otherwise the time left until the
    /// next trial delivery.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut state = self.state.lock();
        if state.state != CircuitState::Open {
            return Ok(());
        }

        let elapsed = state.opened_at.map(|t| t.elapsed()).unwrap_or(self.cool_down);
        if elapsed >= self.cool_down {
            info!(
                "CircuitBreaker [{}]: Open -> HalfOpen (cool-down elapsed)",
                self.name
            );
            state.state = CircuitState::HalfOpen;
            Ok(())
        } else {
            Err(self.cool_down - elapsed)
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if state.state != CircuitState::Closed {
            info!("CircuitBreaker [{}]: {:?} -> Closed", self.name, state.state);
        }
        state.state = CircuitState::Closed;
        state.consecutive_failures = 0;
        state.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.consecutive_failures += 1;

        match state.state {
            CircuitState::Closed if state.consecutive_failures >= self.failure_threshold => {
                error!(
                    "CircuitBreaker [{}]: Closed -> Open ({} consecutive failures)",
                    self.name, state.consecutive_failures
                );
                state.state = CircuitState::Open;
                state.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                warn!("CircuitBreaker [{}]: HalfOpen -> Open (trial delivery failed)", self.name);
                state.state = CircuitState::Open;
                state.opened_at = Some(Instant::now());
            }
            _ => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new("push", 3, Duration::from_secs(60));

        for _ in 0..2 {
            breaker.record_failure();
            assert_eq!(breaker.state(), CircuitState::Closed);
        }
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(breaker.try_acquire().is_err());
    }

    #[test]
    fn test_success_resets_failure_streak() {
        let breaker = CircuitBreaker::new("push", 2, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_trial_delivery() {
        let breaker = CircuitBreaker::new("push", 1, Duration::from_millis(20));
        breaker.record_failure();
        assert!(breaker.try_acquire().is_err());

        std::thread::sleep(Duration::from_millis(30));
        assert!(breaker.try_acquire().is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        // Failed trial reopens immediately.
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(30));
        assert!(breaker.try_acquire().is_ok());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
