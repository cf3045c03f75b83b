use proptest::prelude::*;

use std::time::Duration;
use vein_types::amount::RAW_PER_TOKEN;
use vein_types::{Amount, Timestamp};

proptest! {
    /// Display -> parse produces the same raw value for every representable amount.
    #[test]
    fn amount_display_parses_back(raw in 0u128..u64::MAX as u128) {
        let a = Amount::new(raw);
        let parsed: Amount = a.to_string().parse().unwrap();
        prop_assert_eq!(parsed, a);
    }

    /// Whole-token construction matches the raw scale.
    #[test]
    fn amount_from_tokens_scales(tokens in 0u64..u64::MAX) {
        prop_assert_eq!(Amount::from_tokens(tokens).raw(), tokens as u128 * RAW_PER_TOKEN);
    }

    /// checked_apply with a negative delta agrees with checked_sub.
    #[test]
    fn amount_checked_apply_negative(a in 0u128..1_000_000_000_000, b in 0u128..1_000_000_000_000) {
        let amount = Amount::new(a);
        let applied = amount.checked_apply(-(b as i128));
        prop_assert_eq!(applied, amount.checked_sub(Amount::new(b)));
    }

    /// checked_apply never yields a value for deltas that would go negative.
    #[test]
    fn amount_checked_apply_never_negative(a in 0u128..1_000_000, excess in 1u128..1_000_000) {
        let amount = Amount::new(a);
        prop_assert!(amount.checked_apply(-((a + excess) as i128)).is_none());
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp elapsed_since saturates to 0 when now < self.
    #[test]
    fn timestamp_elapsed_since_saturates(
        base in 1u64..1_000_000,
        deficit in 1u64..1_000_000,
    ) {
        let later = Timestamp::new(base + deficit);
        let earlier = Timestamp::new(base);
        prop_assert_eq!(later.elapsed_since(earlier), 0);
    }

    /// is_older_than agrees with manual arithmetic.
    #[test]
    fn timestamp_is_older_than(created in 0u64..1_000_000, age in 0u64..1_000_000, now_off in 0u64..2_000_000) {
        let t = Timestamp::new(created);
        let now = Timestamp::new(created + now_off);
        prop_assert_eq!(t.is_older_than(Duration::from_secs(age), now), now_off >= age);
    }
}
