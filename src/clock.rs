use chrono::{DateTime, Utc};

/// Source of "now" for the availability checks. Injected everywhere a
/// future-comparison happens so tests can pin the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
