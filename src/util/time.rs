//! Time utilities for the client simulation

use std::time::Duration;

/// Default simulation rate, in ticks per second
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Highest accepted simulation rate
pub const MAX_TICK_RATE: u32 = 1000;

/// Delta time for one tick (in seconds)
pub fn tick_delta(tick_rate: u32) -> f32 {
    1.0 / tick_rate.max(1) as f32
}

/// Wall-clock length of one tick, never zero
pub fn tick_duration(tick_rate: u32) -> Duration {
    Duration::from_micros((1_000_000 / u64::from(tick_rate.max(1))).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_timing() {
        assert!((tick_delta(60) - 1.0 / 60.0).abs() < f32::EPSILON);
        assert_eq!(tick_duration(50), Duration::from_millis(20));
        assert_eq!(tick_duration(0), Duration::from_secs(1));
        assert_eq!(tick_duration(MAX_TICK_RATE), Duration::from_millis(1));
        assert_eq!(tick_duration(u32::MAX), Duration::from_micros(1));
    }
}
