use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use rand::Rng;
use log::{debug, info};

/// Random duration in `[low, high]`. Degenerate ranges return `low`.
pub fn random_between(low: Duration, high: Duration) -> Duration {
    if high <= low {
        return low;
    }
    let mut rng = rand::thread_rng();
    let millis = rng.gen_range(low.as_millis()..=high.as_millis());
    Duration::from_millis(millis as u64)
}

pub fn random_backoff(range: (Duration, Duration), reason: &str) {
    let delay = random_between(range.0, range.1);
    if !delay.is_zero() {
        info!("Waiting for {:.1} seconds ({})...", delay.as_secs_f64(), reason);
        thread::sleep(delay);
    }
}

pub fn fixed_delay(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Paces requests for one logical session: every caller of `wait_turn` is
/// spaced at least `min_interval` after the previous one, plus random jitter
/// up to `max_interval`. Safe to share between worker threads.
#[derive(Debug)]
pub struct RequestGate {
    min_interval: Duration,
    max_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestGate {
    pub fn new(min_interval: Duration, max_interval: Duration) -> Self {
        RequestGate {
            min_interval,
            max_interval: max_interval.max(min_interval),
            last_request: Mutex::new(None),
        }
    }

    /// Blocks until this caller may issue its request.
    pub fn wait_turn(&self) {
        // Lock is held across the sleep so spacing is global.
        let mut last = self.last_request.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let target = random_between(self.min_interval, self.max_interval);
                let wait = target.saturating_sub(elapsed);
                debug!("Rate limiting: sleeping {:?}", wait);
                thread::sleep(wait);
            }
        }
        *last = Some(Instant::now());
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn random_between_stays_in_range() {
        let low = Duration::from_millis(10);
        let high = Duration::from_millis(20);
        for _ in 0..50 {
            let d = random_between(low, high);
            assert!(d >= low && d <= high);
        }
        assert_eq!(random_between(high, low), high);
    }

    #[test]
    fn gate_spaces_consecutive_requests() {
        let gate = RequestGate::new(Duration::from_millis(40), Duration::from_millis(40));
        let start = Instant::now();
        gate.wait_turn();
        gate.wait_turn();
        gate.wait_turn();
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn gate_is_shared_across_threads() {
        let gate = Arc::new(RequestGate::new(Duration::from_millis(30), Duration::from_millis(30)));
        let start = Instant::now();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.wait_turn())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}
