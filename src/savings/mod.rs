//! Savings scenarios and the system sizing that feeds them.

pub mod scenario;
/// PV array and battery sizing.
pub mod system;

pub use scenario::{
    SavingsInputs, SavingsResult, compute_savings, compute_savings_no_battery,
    compute_savings_with_battery,
};
pub use system::{ChargeProfile, SystemSpec, payback_years, roi_percent};
