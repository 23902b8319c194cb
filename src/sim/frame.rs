//! Fixed timestep frame driver
//!
//! Turns the host's irregular render callback into a sequence of
//! constant-duration logic ticks.

use std::time::Duration;

/// Elapsed times above this are treated as a stall (backgrounded tab, debugger)
pub const DEFAULT_STALL_THRESHOLD: Duration = Duration::from_secs(1);

/// Accumulates wall-clock time and drains it in fixed steps.
///
/// After every [`FrameDriver::on_host_callback`] the leftover lag is strictly
/// less than one step. A single callback longer than the stall threshold is
/// counted as exactly one step, so a long suspension produces one tick
/// instead of a burst of catch-up ticks.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    fixed_step: Duration,
    stall_threshold: Duration,
    accumulated_lag: Duration,
    ticks: u64,
}

impl FrameDriver {
    /// Create a driver ticking `tick_rate_hz` times per second.
    ///
    /// A zero rate is bumped to 1 Hz.
    pub fn new(tick_rate_hz: u32, stall_threshold: Duration) -> Self {
        let rate = u64::from(tick_rate_hz.max(1));
        Self::with_step(Duration::from_nanos(1_000_000_000 / rate), stall_threshold)
    }

    pub fn with_step(fixed_step: Duration, stall_threshold: Duration) -> Self {
        let fixed_step = fixed_step.max(Duration::from_nanos(1));
        Self {
            fixed_step,
            stall_threshold,
            accumulated_lag: Duration::ZERO,
            ticks: 0,
        }
    }

    pub fn fixed_step(&self) -> Duration {
        self.fixed_step
    }

    pub fn stall_threshold(&self) -> Duration {
        self.stall_threshold
    }

    pub fn accumulated_lag(&self) -> Duration {
        self.accumulated_lag
    }

    /// Total ticks produced since creation
    pub fn total_ticks(&self) -> u64 {
        self.ticks
    }

    /// Fraction of a step waiting in the accumulator (0.0..1.0), for interpolation
    pub fn alpha(&self) -> f64 {
        self.accumulated_lag.as_secs_f64() / self.fixed_step.as_secs_f64()
    }

    /// Feed one host callback and run every tick that is now due.
    ///
    /// Returns the number of ticks run.
    pub fn on_host_callback<F>(&mut self, elapsed: Duration, mut tick: F) -> u32
    where
        F: FnMut(Duration),
    {
        let elapsed = if elapsed > self.stall_threshold {
            log::debug!(
                "Frame stall of {:?} clamped to one step ({:?})",
                elapsed,
                self.fixed_step
            );
            self.fixed_step
        } else {
            elapsed
        };

        self.accumulated_lag += elapsed;

        let mut ran = 0;
        while self.accumulated_lag >= self.fixed_step {
            tick(self.fixed_step);
            self.accumulated_lag -= self.fixed_step;
            self.ticks += 1;
            ran += 1;
        }
        ran
    }

    /// Same as [`FrameDriver::on_host_callback`] with a millisecond float
    /// from the host (`requestAnimationFrame` delta). Negative, NaN and
    /// infinite values count as zero.
    pub fn on_host_callback_ms<F>(&mut self, elapsed_ms: f64, tick: F) -> u32
    where
        F: FnMut(Duration),
    {
        self.on_host_callback(duration_from_ms(elapsed_ms), tick)
    }
}

/// Convert a host millisecond value into a `Duration`, mapping garbage to zero
pub fn duration_from_ms(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        // whole nanoseconds, so integral millisecond deltas stay exact
        Duration::from_nanos((ms * 1_000_000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver_25ms() -> FrameDriver {
        FrameDriver::new(40, DEFAULT_STALL_THRESHOLD)
    }

    #[test]
    fn test_split_independent_tick_count() {
        let mut one = driver_25ms();
        let ticks = one.on_host_callback(Duration::from_millis(100), |_| {});
        assert_eq!(ticks, 4);

        let mut ten = driver_25ms();
        let ticks: u32 = (0..10)
            .map(|_| ten.on_host_callback(Duration::from_millis(10), |_| {}))
            .sum();
        assert_eq!(ticks, 4);
        assert_eq!(one.total_ticks(), ten.total_ticks());
    }

    #[test]
    fn test_stall_yields_single_tick() {
        let mut driver = driver_25ms();
        let ticks = driver.on_host_callback(Duration::from_millis(5000), |_| {});
        assert_eq!(ticks, 1);
        assert_eq!(driver.accumulated_lag(), Duration::ZERO);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // Exactly one second is not a stall
        let mut driver = driver_25ms();
        let ticks = driver.on_host_callback(Duration::from_secs(1), |_| {});
        assert_eq!(ticks, 40);
    }

    #[test]
    fn test_stall_keeps_existing_lag() {
        let mut driver = driver_25ms();
        driver.on_host_callback(Duration::from_millis(20), |_| {});
        let ticks = driver.on_host_callback(Duration::from_millis(3000), |_| {});
        assert_eq!(ticks, 1);
        assert_eq!(driver.accumulated_lag(), Duration::from_millis(20));
    }

    #[test]
    fn test_tick_receives_fixed_step() {
        let mut driver = driver_25ms();
        let mut steps = Vec::new();
        driver.on_host_callback(Duration::from_millis(60), |dt| steps.push(dt));
        assert_eq!(steps, vec![Duration::from_millis(25); 2]);
        assert_eq!(driver.accumulated_lag(), Duration::from_millis(10));
    }

    #[test]
    fn test_garbage_elapsed_is_zero() {
        let mut driver = driver_25ms();
        assert_eq!(driver.on_host_callback_ms(f64::NAN, |_| {}), 0);
        assert_eq!(driver.on_host_callback_ms(-16.0, |_| {}), 0);
        assert_eq!(driver.on_host_callback_ms(f64::INFINITY, |_| {}), 0);
        assert_eq!(driver.accumulated_lag(), Duration::ZERO);
    }

    #[test]
    fn test_alpha() {
        let mut driver = driver_25ms();
        driver.on_host_callback(Duration::from_millis(35), |_| {});
        assert!((driver.alpha() - 0.4).abs() < 1e-9);
    }
}
