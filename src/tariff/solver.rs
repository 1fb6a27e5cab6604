//! Numeric inverse of [`compute_bill`]: finds the usage that produces a
//! target bill amount.
//!
//! The bill is a step function of usage. Taxes switch on at 300 and 600 kWh,
//! the energy rate jumps at 1500 kWh, and incentive bands only cover whole
//! kWh. Probes are therefore billed at the nearest whole kWh. The search
//! steps its bounds by a fixed `STEP_KWH`, remembers the closest probe it has
//! seen, and finishes by picking the better of the two neighbouring whole kWh.

use tracing::debug;

use super::bill::compute_bill;
use super::rates::RateTable;

/// Lowest usage probed (kWh).
pub const MIN_USAGE_KWH: f64 = 1.0;
/// Highest usage probed (kWh); a realistic domestic maximum.
pub const MAX_USAGE_KWH: f64 = 10_000.0;
/// Iteration cap for the bounded search.
pub const MAX_ITERATIONS: u32 = 50;
/// Residual (RM) below which the search stops early.
pub const TOLERANCE_RM: f64 = 0.05;
/// Bound adjustment applied after each probe (kWh).
const STEP_KWH: f64 = 0.1;

/// Solves for the whole-kWh usage whose bill is closest to `target_bill_rm`.
///
/// Returns 0 for a negative or NaN target. Near tariff discontinuities the
/// answer may miss the exact usage that produced the target; it is always
/// the better of the two integers bracketing the closest probe.
pub fn solve_usage(rates: &RateTable, target_bill_rm: f64, afa_sen_per_kwh: f64) -> u32 {
    if target_bill_rm.is_nan() || target_bill_rm < 0.0 {
        return 0;
    }

    let bill_at = |usage: f64| compute_bill(rates, usage, afa_sen_per_kwh).total_before_solar;

    let mut low = MIN_USAGE_KWH;
    let mut high = MAX_USAGE_KWH;
    let mut iterations = 0;
    let mut best_usage = 0.0_f64;
    let mut best_diff = f64::INFINITY;

    while low <= high && iterations < MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        // Between bands a fractional usage has no rebate; bill whole kWh.
        let bill = bill_at(mid.round());
        let diff = (bill - target_bill_rm).abs();

        if diff < best_diff {
            best_diff = diff;
            best_usage = mid;
        }

        if diff < TOLERANCE_RM {
            break;
        }

        if bill < target_bill_rm {
            low = mid + STEP_KWH;
        } else {
            high = mid - STEP_KWH;
        }
        iterations += 1;
    }

    let floor_usage = best_usage.floor();
    let ceil_usage = best_usage.ceil();
    let floor_diff = (bill_at(floor_usage) - target_bill_rm).abs();
    let ceil_diff = (bill_at(ceil_usage) - target_bill_rm).abs();

    let usage = if floor_diff <= ceil_diff {
        floor_usage
    } else {
        ceil_usage
    };

    debug!(
        target_bill_rm,
        afa_sen_per_kwh,
        iterations,
        best_probe_kwh = best_usage,
        usage_kwh = usage,
        "solved usage from bill"
    );

    // Bounded to [0, MAX_USAGE_KWH] by construction.
    usage as u32
}
