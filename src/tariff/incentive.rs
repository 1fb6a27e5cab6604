//! Incentive claw-back for exported energy.

use super::non_negative;
use super::rates::RateTable;

/// Amount (RM, >= 0) added back to the post-solar bill for `exported_kwh`.
///
/// The rebate rate of the band matching `reference_usage` is clamped to
/// [`RateTable::max_incentive_rate_rm`], applied to the exported energy, and
/// capped at `|reference_incentive_total|` so the claw-back never exceeds the
/// rebate actually granted.
pub fn adjust_incentive(
    rates: &RateTable,
    exported_kwh: f64,
    reference_usage: f64,
    reference_incentive_total: f64,
) -> f64 {
    let band_rate = rates.incentive_bands.rate_for(reference_usage);
    let rate = band_rate.abs().min(rates.max_incentive_rate_rm.abs());
    let raw = non_negative(exported_kwh) * rate;
    let cap = if reference_incentive_total.is_finite() {
        reference_incentive_total.abs()
    } else {
        0.0
    };
    raw.min(cap)
}
