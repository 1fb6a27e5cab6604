//! Shared test fixtures for integration tests.

use solar_atap::savings::SavingsInputs;
use solar_atap::tariff::RateTable;

/// Residential tariff used across integration tests.
pub fn rates() -> RateTable {
    RateTable::domestic()
}

/// Baseline household: 900 kWh/month, 6.5 kWp at 3.4 PSH (663 kWh/month),
/// 30% daytime consumption, no fuel surcharge.
pub fn baseline_inputs() -> SavingsInputs {
    household(900.0, 663.0, 30.0, 0.0)
}

/// Savings inputs from the four household figures.
pub fn household(
    usage_kwh: f64,
    generation_kwh: f64,
    day_percent: f64,
    afa_sen: f64,
) -> SavingsInputs {
    SavingsInputs {
        usage_kwh,
        generation_kwh,
        day_percent,
        afa_sen,
    }
}

/// Asserts two money or energy values agree to within `1e-6`.
pub fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "{what}: expected {expected}, got {actual}"
    );
}
