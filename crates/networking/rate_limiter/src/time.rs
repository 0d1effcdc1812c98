use std::{
    fmt::Debug,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Source of wall-clock time for trailing windows.
pub trait TimeProvider: Send + Sync + Debug {
    /// Time elapsed since the unix epoch.
    fn now(&self) -> Duration;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Manually advanced clock, used wherever a test needs a window to elapse without sleeping.
#[derive(Debug, Default)]
pub struct StubTimeProvider {
    millis: AtomicU64,
}

impl StubTimeProvider {
    pub fn with_time(time: Duration) -> Self {
        Self {
            millis: AtomicU64::new(time.as_millis() as u64),
        }
    }

    pub fn advance_time_by(&self, duration: Duration) {
        self.millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

impl TimeProvider for StubTimeProvider {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}
