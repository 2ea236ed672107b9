use std::time::{Duration, Instant};

const SECOND: Duration = Duration::from_secs(1);

/// A once-per-second countdown armed for a single session.
///
/// Whoever owns the value owns the timer; dropping it disarms it. Deadlines are
/// absolute, so polling late fires every second that was missed.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u64,
    next_deadline: Instant,
}

impl Countdown {
    pub fn arm(seconds: u64, now: Instant) -> Self {
        Self {
            remaining: seconds,
            next_deadline: now + SECOND,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Fires every whole second due by `now`, returns how many fired
    pub fn poll(&mut self, now: Instant) -> u64 {
        let mut fired = 0;
        while self.remaining > 0 && now >= self.next_deadline {
            self.remaining -= 1;
            self.next_deadline += SECOND;
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_fires_before_first_second() {
        let t0 = Instant::now();
        let mut cd = Countdown::arm(5, t0);

        assert_eq!(cd.poll(t0), 0);
        assert_eq!(cd.poll(t0 + Duration::from_millis(999)), 0);
        assert_eq!(cd.remaining(), 5);
    }

    #[test]
    fn fires_once_per_second() {
        let t0 = Instant::now();
        let mut cd = Countdown::arm(5, t0);

        assert_eq!(cd.poll(t0 + Duration::from_millis(1000)), 1);
        assert_eq!(cd.poll(t0 + Duration::from_millis(1500)), 0);
        assert_eq!(cd.poll(t0 + Duration::from_millis(2000)), 1);
        assert_eq!(cd.remaining(), 3);
    }

    #[test]
    fn late_poll_catches_up() {
        let t0 = Instant::now();
        let mut cd = Countdown::arm(10, t0);

        assert_eq!(cd.poll(t0 + Duration::from_secs(4)), 4);
        assert_eq!(cd.remaining(), 6);
    }

    #[test]
    fn stops_at_zero() {
        let t0 = Instant::now();
        let mut cd = Countdown::arm(2, t0);

        assert_eq!(cd.poll(t0 + Duration::from_secs(30)), 2);
        assert!(cd.is_expired());
        assert_eq!(cd.poll(t0 + Duration::from_secs(60)), 0);
    }

    #[test]
    fn zero_second_countdown_is_expired_immediately() {
        let cd = Countdown::arm(0, Instant::now());
        assert!(cd.is_expired());
    }
}
