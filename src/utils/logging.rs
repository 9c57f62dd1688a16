use log::{debug, log_enabled, Level};
use std::time::{Duration, Instant};

/// Scoped timer for the stages of a simulation step.
///
/// Emits `trace!` lines on creation and drop; costs one `Instant::now` when
/// tracing is disabled.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            let elapsed = self.start.elapsed();
            log::trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Reports how much of an iteration budget a resolver pass consumed.
pub fn log_iteration_usage(pass: &str, used: usize, budget: usize) {
    if used >= budget && budget > 0 {
        debug!("{pass}: iteration budget of {budget} exhausted before convergence");
    } else if log_enabled!(Level::Trace) {
        log::trace!("{pass}: converged after {used}/{budget} iterations");
    }
}
