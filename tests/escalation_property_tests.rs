use detoxr::config::Options;
use detoxr::escalation::{intensity, kelvin_to_rgb, level, plan, progression, refresh_interval_ms};
use detoxr::escalation::color::{overlay_alpha, temperature_for_progression};
use proptest::prelude::*;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

fn interval_strategy() -> impl Strategy<Value = f64> {
    0.1..=240.0
}

fn max_levels_strategy() -> impl Strategy<Value = u32> {
    1u32..=20
}

fn percent_strategy() -> impl Strategy<Value = f64> {
    0.0..=100.0
}

proptest! {
    #[test]
    fn test_level_is_within_bounds(
        elapsed in 0u64..=7 * DAY_MS,
        interval in interval_strategy(),
        max in max_levels_strategy()
    ) {
        let l = level(elapsed, interval, max);
        prop_assert!((1..=max).contains(&l), "level {l} outside 1..={max}");
    }

    #[test]
    fn test_level_never_decreases_with_time(
        a in 0u64..=DAY_MS,
        b in 0u64..=DAY_MS,
        interval in interval_strategy(),
        max in max_levels_strategy()
    ) {
        let (early, late) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(level(early, interval, max) <= level(late, interval, max));
    }

    #[test]
    fn test_intensity_endpoints(
        max_value in 0.0f64..=10_000.0,
        percent in percent_strategy(),
        max in 2u32..=20
    ) {
        prop_assert_eq!(intensity(max_value, percent, 1, max), 0.0);
        let top = intensity(max_value, percent, max, max);
        prop_assert!((top - max_value * percent / 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_intensity_grows_with_level(
        percent in percent_strategy(),
        max in 2u32..=20,
        l in 1u32..20
    ) {
        let l = l.min(max - 1);
        prop_assert!(intensity(8.0, percent, l, max) <= intensity(8.0, percent, l + 1, max));
        prop_assert!((0.0..=1.0).contains(&progression(l, max)));
    }

    #[test]
    fn test_color_temperature_stays_in_range(
        l in 1u32..=20,
        max in max_levels_strategy()
    ) {
        let p = progression(l.min(max), max);
        let kelvin = temperature_for_progression(p);
        prop_assert!((1500.0..=9000.0).contains(&kelvin));
        prop_assert!((0.0..=0.7).contains(&overlay_alpha(p)));
    }

    #[test]
    fn test_kelvin_to_rgb_saturates_one_channel(kelvin in 1000.0f64..=40_000.0) {
        let rgb = kelvin_to_rgb(kelvin);
        if kelvin <= 6600.0 {
            prop_assert_eq!(rgb.r, 255);
        } else {
            prop_assert_eq!(rgb.b, 255);
        }
    }

    #[test]
    fn test_plan_effects_stay_in_range(
        elapsed in 0u64..=DAY_MS,
        interval in interval_strategy(),
        max in max_levels_strategy(),
        blur in percent_strategy(),
        desaturation in percent_strategy(),
        opacity in percent_strategy()
    ) {
        let options = Options {
            level_interval_minutes: interval,
            max_levels: max,
            blur_intensity_percent: blur,
            desaturation_intensity_percent: desaturation,
            opacity_intensity_percent: opacity,
            color_temperature_enabled: true,
            speed_adjust_enabled: true,
            ..Options::default()
        };
        let p = plan(&options, elapsed);

        prop_assert!((0.0..=8.0).contains(&p.visual.blur_px));
        prop_assert!((0.0..=1.0).contains(&p.visual.saturation));
        prop_assert!((0.3 - 1e-9..=1.0).contains(&p.visual.opacity));
        let rate = p.playback_rate.unwrap_or(1.0);
        prop_assert!((0.5..=1.0).contains(&rate));
        if p.level == 1 {
            prop_assert_eq!(p.interaction_delay_ms, None);
        }
    }

    #[test]
    fn test_refresh_interval_is_bounded(interval in interval_strategy()) {
        let ms = refresh_interval_ms(interval);
        prop_assert!((1..=10_000).contains(&ms));
    }
}
