use std::sync::atomic::{AtomicBool, Ordering::Relaxed};
use std::sync::Arc;
use std::thread::{sleep, spawn};
use std::time::{Duration, Instant};

/// Deadline flag shared by the workers. Workers poll `done` at the top
/// of each iteration, never mid-iteration.
#[derive(Clone)]
pub struct Timer {
    start_time: Instant,
    timeout: Arc<AtomicBool>,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            timeout: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(&mut self, deadline: Option<Duration>) {
        self.timeout = match deadline {
            None => Arc::new(AtomicBool::new(false)),
            Some(dur) => timeout_signal(dur),
        };
        self.start_time = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        Instant::now().duration_since(self.start_time)
    }

    pub fn done(&self) -> bool {
        self.timeout.load(Relaxed)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

fn timeout_signal(dur: Duration) -> Arc<AtomicBool> {
    // A sleeper thread is a few lines; not worth an async runtime.
    let signal = Arc::new(AtomicBool::new(false));
    let signal2 = signal.clone();
    spawn(move || {
        sleep(dur);
        signal2.store(true, Relaxed);
    });
    signal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_deadline_never_fires() {
        let mut t = Timer::new();
        t.start(None);
        assert!(!t.done());
    }

    #[test]
    fn deadline_fires() {
        let mut t = Timer::new();
        t.start(Some(Duration::from_millis(10)));
        assert!(!t.done());
        sleep(Duration::from_millis(50));
        assert!(t.done());
    }
}
