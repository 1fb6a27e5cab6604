//! Tariff tables, tiered bill calculation and its numeric inverse.

pub mod bill;
pub mod incentive;
pub mod rates;
pub mod solver;

pub use bill::{BillDetails, compute_bill};
pub use incentive::adjust_incentive;
pub use rates::{IncentiveBand, IncentiveBandTable, RateTable, lookup_incentive_rate};
pub use solver::solve_usage;

/// Clamps NaN, infinite and negative inputs to 0.
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Rounds a non-negative RM amount to whole sen, halves rounding up.
pub(crate) fn round_sen(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
