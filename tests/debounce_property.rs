// tests/debounce_property.rs

use std::time::{Duration, Instant};

use proptest::prelude::*;
use rewatch::watch::{DebounceState, WatchTarget};

// Offsets (ms) of a burst, all strictly inside a window of `window_ms`.
fn burst_strategy() -> impl Strategy<Value = (u64, Vec<u64>)> {
    (1u64..5_000).prop_flat_map(|window_ms| {
        let offsets = proptest::collection::vec(0..=window_ms, 1..50).prop_map(|mut v| {
            v.sort_unstable();
            v
        });
        (Just(window_ms), offsets)
    })
}

proptest! {
    #[test]
    fn burst_inside_window_fires_exactly_once((window_ms, offsets) in burst_strategy()) {
        let window = Duration::from_millis(window_ms);
        let start = Instant::now();
        let mut target = WatchTarget::directory("/tmp/watch");

        let accepted = offsets
            .iter()
            .filter(|ms| target.accept_event(start + Duration::from_millis(**ms), window))
            .count();

        prop_assert_eq!(accepted, 1);
    }

    #[test]
    fn events_spaced_beyond_window_all_fire(window_ms in 1u64..2_000, count in 1usize..20) {
        let window = Duration::from_millis(window_ms);
        let start = Instant::now();
        let mut state = DebounceState::default();

        for i in 0..count {
            let at = start + Duration::from_millis((window_ms + 1) * i as u64);
            prop_assert!(state.accept(at, window));
        }
        prop_assert_eq!(state.last_trigger(), Some(start + Duration::from_millis((window_ms + 1) * (count as u64 - 1))));
    }

    #[test]
    fn rejected_events_never_move_the_window(window_ms in 2u64..2_000, extra in 0u64..1_000) {
        let window = Duration::from_millis(window_ms);
        let start = Instant::now();
        let mut state = DebounceState::default();

        prop_assert!(state.accept(start, window));
        // Rejected, and must leave `last_trigger` where it was.
        prop_assert!(!state.accept(start + Duration::from_millis(window_ms / 2), window));
        prop_assert_eq!(state.last_trigger(), Some(start));
        prop_assert!(state.accept(start + window + Duration::from_millis(extra + 1), window));
    }
}
