use time::OffsetDateTime;

/// Source of the current wall-clock time.
///
/// Anything that stamps records takes a `Clock` handle instead of reading the
/// system time directly, so tests can substitute a controllable instance.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let first = clock.now_utc();
        let second = clock.now_utc();
        assert!(second >= first);
    }
}
