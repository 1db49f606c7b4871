use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct GateState {
    in_flight: usize,
    peak: usize,
    acquired: usize,
}

#[derive(Debug)]
pub struct Limiter {
    capacity: Option<usize>,
    state: Mutex<GateState>,
    slot_freed: Condvar,
}

#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct Permit<'a> {
    limiter: &'a Limiter,
}

impl Limiter {
    /// A capacity of zero is raised to one.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            state: Mutex::new(GateState::default()),
            slot_freed: Condvar::new(),
        }
    }

    pub fn pass_through() -> Self {
        Self {
            capacity: None,
            state: Mutex::new(GateState::default()),
            slot_freed: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Blocks until a slot is free. Never fails and never times out.
    pub fn acquire(&self) -> Permit<'_> {
        let mut state = self.lock();
        if let Some(capacity) = self.capacity {
            while state.in_flight >= capacity {
                state = self
                    .slot_freed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        state.in_flight += 1;
        state.acquired += 1;
        state.peak = state.peak.max(state.in_flight);
        Permit { limiter: self }
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    pub fn peak(&self) -> usize {
        self.lock().peak
    }

    pub fn acquired(&self) -> usize {
        self.lock().acquired
    }

    fn release(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        drop(state);
        self.slot_freed.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn never_exceeds_capacity() {
        let limiter = Limiter::bounded(3);
        let active = AtomicUsize::new(0);
        let observed_max = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..12 {
                scope.spawn(|| {
                    let _permit = limiter.acquire();
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    observed_max.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(15));
                    active.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert!(observed_max.load(Ordering::SeqCst) <= 3);
        assert!(limiter.peak() <= 3);
        assert_eq!(limiter.acquired(), 12);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[test]
    fn permit_is_released_on_error_path() {
        fn failing_task(limiter: &Limiter) -> Result<(), String> {
            let _permit = limiter.acquire();
            Err("convert failed".to_string())
        }

        let limiter = Limiter::bounded(1);
        assert!(failing_task(&limiter).is_err());
        assert_eq!(limiter.in_flight(), 0);
        // Would block forever if the slot had leaked.
        let _permit = limiter.acquire();
        assert_eq!(limiter.in_flight(), 1);
    }

    #[test]
    fn permit_is_released_on_panic() {
        let limiter = Limiter::bounded(1);
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _permit = limiter.acquire();
            panic!("task blew up");
        }));
        assert!(result.is_err());
        assert_eq!(limiter.in_flight(), 0);
    }

    #[test]
    fn pass_through_never_blocks() {
        let limiter = Limiter::pass_through();
        let a = limiter.acquire();
        let b = limiter.acquire();
        let c = limiter.acquire();
        assert_eq!(limiter.capacity(), None);
        assert_eq!(limiter.in_flight(), 3);
        drop((a, b, c));
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.peak(), 3);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let limiter = Limiter::bounded(0);
        assert_eq!(limiter.capacity(), Some(1));
        let _permit = limiter.acquire();
    }
}
