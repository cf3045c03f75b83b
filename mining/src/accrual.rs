//! Local session accrual (client-side estimate).

use vein_types::{Amount, Timestamp};

const SECS_PER_HOUR: u128 = 3600;

/// Cumulative earnings of a session mining at a constant hourly rate.
///
/// `earnings = rate_per_hour × (now − started_at) / 3600`, saturating, and
/// zero if `now` is before the session start.
pub fn session_earnings(started_at: Timestamp, now: Timestamp, rate_per_hour: Amount) -> Amount {
    let elapsed = started_at.elapsed_since(now) as u128;
    Amount::new(rate_per_hour.raw().saturating_mul(elapsed) / SECS_PER_HOUR)
}
