//! Upgrade proration.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::types::Tier;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Proration {
    pub remaining_days: i64,
    pub credit: Decimal,
    pub amount_due: Decimal,
}

/// Whole days left until `expires_at`, rounded up and clamped to `[0, duration_days]`.
pub fn remaining_days(expires_at: DateTime<Utc>, now: DateTime<Utc>, duration_days: i32) -> i64 {
    let seconds = (expires_at - now).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    days.clamp(0, i64::from(duration_days.max(0)))
}

/// Credit the unused part of the current tier against `target`.
///
/// `current` is the held tier and its expiry. No tier or an expired one earns no credit.
pub fn prorate(
    current: Option<(&Tier, DateTime<Utc>)>,
    target: &Tier,
    now: DateTime<Utc>,
) -> Proration {
    let (remaining, credit) = match current {
        Some((tier, expires_at)) if expires_at > now && tier.duration_days > 0 => {
            let remaining = remaining_days(expires_at, now, tier.duration_days);
            let credit = (tier.price * Decimal::from(remaining)
                / Decimal::from(tier.duration_days))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            (remaining, credit)
        }
        _ => (0, Decimal::ZERO),
    };
    let amount_due = (target.price - credit).max(Decimal::ZERO);
    Proration {
        remaining_days: remaining,
        credit,
        amount_due,
    }
}
