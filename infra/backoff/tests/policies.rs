use cryptix_backoff::{Backoff, DEFAULT_MILLIS, IncreasePolicy, RandomPolicy};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #[test]
    fn increase_policy_stays_in_jitter_window(attempt in 0usize..64) {
        let policy = IncreasePolicy::standard();
        let step = DEFAULT_MILLIS[attempt.min(DEFAULT_MILLIS.len() - 1)];
        let got = policy.duration(attempt);

        prop_assert!(got >= Duration::from_millis(step / 2));
        if step == 0 {
            prop_assert_eq!(got, Duration::ZERO);
        } else {
            prop_assert!(got < Duration::from_millis(step / 2 + step));
        }
    }

    #[test]
    fn random_policy_stays_below_max(max_ms in 1u64..20_000, attempt in 0usize..16) {
        let policy = RandomPolicy::new(Duration::from_millis(max_ms));
        prop_assert!(policy.duration(attempt) < Duration::from_millis(max_ms));
    }
}

#[test]
fn policies_are_usable_as_trait_objects() {
    let policies: Vec<Box<dyn Backoff>> =
        vec![Box::new(IncreasePolicy::default()), Box::new(RandomPolicy::default())];

    for p in &policies {
        assert!(p.duration(1) < Duration::from_secs(10));
    }
}
