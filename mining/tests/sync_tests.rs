//! Backend sync against nullable sources, and display monotonicity.

use proptest::prelude::*;
use vein_api::BackendBalance;
use vein_mining::{session_earnings, MiningReconciler};
use vein_nullables::NullBalanceSource;
use vein_types::{Amount, Timestamp};

fn amt(s: &str) -> Amount {
    s.parse().unwrap()
}

#[tokio::test]
async fn sync_preserves_unconfirmed_session_earnings() {
    let r = MiningReconciler::new(amt("500"));
    r.start_session(Timestamp::new(0)).unwrap();
    r.record_earnings(amt("12.5")).unwrap();

    let source = NullBalanceSource::sendable(amt("600"));
    let balance = r.sync_with_backend(&source, Timestamp::new(30)).await.unwrap();
    assert_eq!(balance.total_balance, amt("600"));

    let state = r.state();
    assert_eq!(state.base_balance, amt("600"));
    assert_eq!(state.current_session_earnings, amt("12.5"));
    assert_eq!(state.display_balance, amt("612.5"));
    assert_eq!(state.last_sync_time, Some(Timestamp::new(30)));
    assert!(state.sync_error.is_none());
}

#[tokio::test]
async fn failed_sync_keeps_last_known_good_balance() {
    let r = MiningReconciler::new(amt("500"));
    r.start_session(Timestamp::new(0)).unwrap();
    r.record_earnings(amt("2")).unwrap();
    let before = r.state();

    let source = NullBalanceSource::failing("connection refused");
    let err = r.sync_with_backend(&source, Timestamp::new(40)).await.unwrap_err();
    assert!(err.reason.contains("connection refused"));

    let state = r.state();
    assert_eq!(state.base_balance, before.base_balance);
    assert_eq!(state.display_balance, before.display_balance);
    assert_eq!(state.last_sync_time, None);
    assert_eq!(state.sync_error, Some(err));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn next_successful_sync_clears_the_error() {
    let r = MiningReconciler::new(amt("1"));
    let source = NullBalanceSource::failing("timeout");
    r.sync_with_backend(&source, Timestamp::new(1)).await.unwrap_err();
    assert!(r.state().sync_error.is_some());

    source.set_balance(BackendBalance {
        total_balance: amt("9"),
        sendable_balance: amt("9"),
        non_sendable_balance: Amount::ZERO,
        pending_balance: Amount::ZERO,
    });
    r.sync_with_backend(&source, Timestamp::new(2)).await.unwrap();
    let state = r.state();
    assert!(state.sync_error.is_none());
    assert_eq!(state.display_balance, amt("9"));
}

#[tokio::test]
async fn idle_sync_shows_backend_total() {
    let r = MiningReconciler::new(amt("5"));
    let source = NullBalanceSource::sendable(amt("7.25"));
    r.sync_with_backend(&source, Timestamp::new(3)).await.unwrap();
    let state = r.state();
    assert!(!state.is_mining_active);
    assert_eq!(state.current_session_earnings, Amount::ZERO);
    assert_eq!(state.display_balance, amt("7.25"));
}

#[test]
fn ticking_accrual_feeds_the_display() {
    let r = MiningReconciler::new(amt("100"));
    let started = Timestamp::new(1_000);
    r.start_session(started).unwrap();
    let rate = amt("3.6");
    for secs in [0u64, 600, 1800, 3600] {
        let earned = session_earnings(started, Timestamp::new(1_000 + secs), rate);
        r.record_earnings(earned).unwrap();
    }
    assert_eq!(r.display_balance(), amt("103.6"));
}

proptest! {
    /// While a session is active, nondecreasing cumulative earnings never
    /// lower the display balance.
    #[test]
    fn display_never_decreases_while_active(
        base in 0u64..1_000_000,
        mut steps in prop::collection::vec(0u64..1_000_000, 1..40),
    ) {
        steps.sort_unstable();
        let r = MiningReconciler::new(Amount::new(base as u128));
        r.start_session(Timestamp::new(0)).unwrap();
        let mut last = r.display_balance();
        for e in steps {
            let shown = r.record_earnings(Amount::new(e as u128)).unwrap();
            prop_assert!(shown >= last);
            last = shown;
        }
    }

    /// When idle with no pending sync error, no session earnings linger.
    #[test]
    fn idle_state_holds_no_earnings(earned in 0u64..1_000_000, final_balance in 0u64..1_000_000) {
        let r = MiningReconciler::new(Amount::ZERO);
        r.start_session(Timestamp::new(0)).unwrap();
        r.record_earnings(Amount::new(earned as u128)).unwrap();
        r.end_session(Amount::new(final_balance as u128)).unwrap();
        let state = r.state();
        prop_assert!(!state.is_mining_active);
        prop_assert_eq!(state.current_session_earnings, Amount::ZERO);
        prop_assert_eq!(state.display_balance, Amount::new(final_balance as u128));
    }
}
