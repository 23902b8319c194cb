use std::time::Duration;

use games2d::sim::{DEFAULT_STALL_THRESHOLD, FrameDriver};
use proptest::prelude::*;

const STEP_US: u64 = 25_000;

fn driver() -> FrameDriver {
    FrameDriver::new(40, DEFAULT_STALL_THRESHOLD)
}

proptest! {
    #[test]
    fn tick_count_ignores_how_time_is_split(splits in prop::collection::vec(0u64..=1_000_000, 1..60)) {
        let total: u64 = splits.iter().sum();
        let mut d = driver();
        let ticks: u64 = splits
            .iter()
            .map(|us| u64::from(d.on_host_callback(Duration::from_micros(*us), |_| {})))
            .sum();
        prop_assert_eq!(ticks, total / STEP_US);
        prop_assert_eq!(d.total_ticks(), ticks);
    }

    #[test]
    fn leftover_lag_stays_below_one_step(splits in prop::collection::vec(0u64..=5_000_000, 1..60)) {
        let mut d = driver();
        for us in splits {
            d.on_host_callback(Duration::from_micros(us), |_| {});
            prop_assert!(d.accumulated_lag() < d.fixed_step());
        }
    }

    #[test]
    fn stalls_run_one_tick(ms in 1_001u64..600_000) {
        let mut d = driver();
        prop_assert_eq!(d.on_host_callback(Duration::from_millis(ms), |_| {}), 1);
    }
}

#[test]
fn five_second_stall_is_one_tick() {
    let mut d = driver();
    assert_eq!(d.on_host_callback_ms(5000.0, |_| {}), 1);
    assert_eq!(d.accumulated_lag(), Duration::ZERO);
}

#[test]
fn float_millis_accumulate_exactly() {
    let mut d = driver();
    let ticks: u32 = (0..40).map(|_| d.on_host_callback_ms(12.5, |_| {})).sum();
    assert_eq!(ticks, 20);
    assert_eq!(d.accumulated_lag(), Duration::ZERO);
}
