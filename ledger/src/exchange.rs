//! Moving funds between the sendable and non-sendable buckets.

use vein_types::Amount;

use crate::breakdown::{signed, BalanceBreakdown, BreakdownDelta, Bucket};
use crate::error::LedgerError;
use crate::ledger::BalanceLedger;

/// Pure bucket transfers. The total is the same before and after each call.
#[derive(Clone)]
pub struct ExchangeOperations {
    ledger: BalanceLedger,
}

impl ExchangeOperations {
    pub fn new(ledger: BalanceLedger) -> Self {
        Self { ledger }
    }

    /// Unlock earned funds for transfer.
    pub fn exchange_to_sendable(&self, amount: Amount) -> Result<BalanceBreakdown, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        self.ledger.with_state(|state| {
            let available = state.breakdown().non_sendable();
            if amount > available {
                return Err(LedgerError::InsufficientNonSendableBalance {
                    requested: amount,
                    available,
                    shortfall: amount - available,
                });
            }
            let raw = signed(amount, Bucket::NonSendable)?;
            let after = state.apply_delta(&BreakdownDelta::new().non_sendable(-raw).sendable(raw))?;
            tracing::info!(%amount, "exchanged to sendable");
            Ok(after)
        })
    }

    pub fn exchange_to_non_sendable(&self, amount: Amount) -> Result<BalanceBreakdown, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        self.ledger.with_state(|state| {
            let available = state.breakdown().sendable();
            if amount > available {
                return Err(LedgerError::InsufficientSendableBalance {
                    requested: amount,
                    available,
                    shortfall: amount - available,
                });
            }
            let raw = signed(amount, Bucket::Sendable)?;
            let after = state.apply_delta(&BreakdownDelta::new().sendable(-raw).non_sendable(raw))?;
            tracing::info!(%amount, "exchanged to non-sendable");
            Ok(after)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> Amount {
        Amount::from_tokens(n)
    }

    #[test]
    fn exchange_preserves_total() {
        let ledger = BalanceLedger::with_breakdown(tokens(5), tokens(20), tokens(1)).unwrap();
        let ex = ExchangeOperations::new(ledger.clone());
        let before = ledger.snapshot();

        let after = ex.exchange_to_sendable(tokens(8)).unwrap();
        assert_eq!(after.sendable(), tokens(13));
        assert_eq!(after.non_sendable(), tokens(12));
        assert_eq!(after.pending(), tokens(1));
        assert_eq!(after.total(), before.total());
    }

    #[test]
    fn round_trip_restores_breakdown() {
        let ledger = BalanceLedger::with_breakdown(tokens(5), tokens(20), Amount::ZERO).unwrap();
        let ex = ExchangeOperations::new(ledger.clone());
        let before = ledger.snapshot();
        ex.exchange_to_sendable(tokens(20)).unwrap();
        ex.exchange_to_non_sendable(tokens(20)).unwrap();
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn insufficient_non_sendable_reports_shortfall() {
        let ledger = BalanceLedger::with_breakdown(tokens(5), tokens(2), Amount::ZERO).unwrap();
        let ex = ExchangeOperations::new(ledger.clone());
        let before = ledger.snapshot();
        assert_eq!(
            ex.exchange_to_sendable(tokens(3)),
            Err(LedgerError::InsufficientNonSendableBalance {
                requested: tokens(3),
                available: tokens(2),
                shortfall: tokens(1),
            })
        );
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn amounts_beyond_signed_range_are_not_exchanged() {
        let huge = Amount::new(i128::MAX as u128 + 10);
        let ledger = BalanceLedger::with_breakdown(huge, huge, Amount::ZERO).unwrap();
        let ex = ExchangeOperations::new(ledger.clone());
        let before = ledger.snapshot();

        assert!(matches!(
            ex.exchange_to_non_sendable(huge),
            Err(LedgerError::InvariantViolation { .. })
        ));
        assert!(matches!(
            ex.exchange_to_sendable(huge),
            Err(LedgerError::InvariantViolation { .. })
        ));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn exchange_to_non_sendable_is_guarded_by_sendable() {
        let ledger = BalanceLedger::with_breakdown(tokens(1), Amount::ZERO, Amount::ZERO).unwrap();
        let ex = ExchangeOperations::new(ledger);
        assert!(matches!(
            ex.exchange_to_non_sendable(tokens(2)),
            Err(LedgerError::InsufficientSendableBalance { .. })
        ));
        assert_eq!(ex.exchange_to_non_sendable(Amount::ZERO), Err(LedgerError::InvalidAmount));
    }
}
