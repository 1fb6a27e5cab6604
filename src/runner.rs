//! Config-driven scenario evaluation: resolves the usage, sizes the system
//! and runs the savings engine once.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ScenarioConfig;
use crate::savings::{
    ChargeProfile, SavingsInputs, SavingsResult, compute_savings, payback_years, roi_percent,
};
use crate::tariff::solver::TOLERANCE_RM;
use crate::tariff::{compute_bill, solve_usage};

/// Everything a scenario run produces.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    /// Monthly usage used for the calculation (kWh); solved from the bill in
    /// `"rm"` mode.
    pub monthly_usage_kwh: f64,
    /// Bill the usage maps to (RM), rounded to sen for display.
    pub monthly_bill_rm: f64,
    /// Array size (kWp).
    pub system_size_kwp: f64,
    /// Installed battery capacity (kWh).
    pub battery_capacity_kwh: f64,
    /// Usable battery capacity (kWh).
    pub usable_battery_kwh: f64,
    /// Savings comparison.
    pub savings: SavingsResult,
    /// Annual return on the system price (%), when a price is configured.
    pub roi_percent: Option<f64>,
    /// Years to repay the system price from savings, when a price is
    /// configured.
    pub payback_years: Option<f64>,
    /// Battery charge levels under low, configured and high sun.
    pub charge_profiles: Vec<ChargeProfile>,
}

/// Evaluates a validated scenario.
pub fn run_scenario(cfg: &ScenarioConfig) -> ScenarioOutcome {
    let rates = &cfg.tariff;
    let c = &cfg.customer;

    let usage = if cfg.bill_mode() {
        let solved = f64::from(solve_usage(rates, c.monthly_bill_rm, c.afa_sen));
        info!(
            bill_rm = c.monthly_bill_rm,
            usage_kwh = solved,
            "resolved usage from bill"
        );
        solved
    } else {
        c.monthly_usage_kwh
    };
    let bill = compute_bill(rates, usage, c.afa_sen).total_before_solar;
    if cfg.bill_mode() && (bill - c.monthly_bill_rm).abs() >= TOLERANCE_RM {
        warn!(
            bill_rm = c.monthly_bill_rm,
            closest_rm = bill,
            "no whole-kWh usage reproduces the bill; using the closest"
        );
    }

    let system = cfg.system_spec();
    let inputs = SavingsInputs {
        usage_kwh: usage,
        generation_kwh: system.monthly_generation_kwh(),
        day_percent: c.day_percent,
        afa_sen: c.afa_sen,
    };
    let battery = system
        .battery_enabled
        .then(|| system.monthly_battery_stored_kwh(usage, c.day_percent));

    let savings = compute_savings(rates, &inputs, battery);
    let roi = roi_percent(savings.annual_savings, cfg.finance.system_price_rm);
    let payback = payback_years(savings.annual_savings, cfg.finance.system_price_rm);

    ScenarioOutcome {
        monthly_usage_kwh: usage,
        monthly_bill_rm: (bill * 100.0).round() / 100.0,
        system_size_kwp: system.system_size_kwp(),
        battery_capacity_kwh: system.total_battery_kwh(),
        usable_battery_kwh: system.usable_battery_kwh(),
        charge_profiles: system.sun_scenarios(usage, c.day_percent),
        savings,
        roi_percent: roi,
        payback_years: payback,
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- System ---")?;
        writeln!(f, "Array size:            {:.2} kWp", self.system_size_kwp)?;
        writeln!(
            f,
            "Battery:               {:.2} kWh ({:.2} kWh usable)",
            self.battery_capacity_kwh, self.usable_battery_kwh
        )?;
        writeln!(
            f,
            "Monthly usage:         {:.0} kWh (RM {:.2})",
            self.monthly_usage_kwh, self.monthly_bill_rm
        )?;
        writeln!(f)?;
        writeln!(f, "--- Bill Before Solar ---")?;
        writeln!(f, "{}", self.savings.bill_details)?;
        writeln!(f)?;
        writeln!(f, "--- Bill After Solar ---")?;
        writeln!(f, "{}", self.savings.after_solar_bill_details)?;
        writeln!(f)?;
        writeln!(f, "{}", self.savings)?;
        match self.roi_percent {
            Some(roi) => writeln!(f, "ROI:                   {roi:.1}%")?,
            None => writeln!(f, "ROI:                   -")?,
        }
        match self.payback_years {
            Some(years) => writeln!(f, "Payback period:        {years:.1} years")?,
            None => writeln!(f, "Payback period:        -")?,
        }
        if self.battery_capacity_kwh > 0.0 {
            writeln!(f)?;
            writeln!(f, "--- Battery Charge ---")?;
            for profile in &self.charge_profiles {
                writeln!(f, "{profile}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_runs_without_battery() {
        let outcome = run_scenario(&ScenarioConfig::baseline());
        assert_eq!(outcome.monthly_usage_kwh, 900.0);
        assert_eq!(outcome.monthly_bill_rm, 418.34);
        assert_eq!(outcome.battery_capacity_kwh, 0.0);
        assert_eq!(outcome.savings.battery_storage_kwh, 0.0);
        assert_eq!(outcome.savings.battery_rate, 0.0);
        assert!(outcome.roi_percent.is_none());
        assert!(outcome.payback_years.is_none());
    }

    #[test]
    fn bill_mode_solves_usage() {
        let outcome = run_scenario(&ScenarioConfig::bill_target());
        assert_eq!(outcome.monthly_usage_kwh, 1356.0);
        assert!((outcome.monthly_bill_rm - 650.0).abs() < 0.5);
        assert!(outcome.savings.battery_storage_kwh > 0.0);
        assert!(outcome.roi_percent.is_some());
        let payback = outcome.payback_years.unwrap_or_default();
        let expected = 28_000.0 / outcome.savings.annual_savings;
        assert!((payback - expected).abs() < 1e-9);
    }

    #[test]
    fn high_usage_uses_battery() {
        let outcome = run_scenario(&ScenarioConfig::high_usage());
        assert!(outcome.savings.battery_storage_kwh > 0.0);
        assert!(outcome.savings.battery_savings > 0.0);
        assert_eq!(outcome.charge_profiles.len(), 3);
        assert!(outcome.savings.final_bill >= 0.0);
    }

    #[test]
    fn display_does_not_panic() {
        let s = format!("{}", run_scenario(&ScenarioConfig::high_usage()));
        assert!(s.contains("--- Battery Charge ---"));
        assert!(s.contains("Payback period:"));
    }
}
