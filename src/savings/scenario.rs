//! Before/after savings comparison for a solar installation under ATAP
//! net billing, with or without battery storage.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tariff::{BillDetails, RateTable, adjust_incentive, compute_bill, non_negative};

/// Monthly household and generation figures fed to the savings engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsInputs {
    /// Monthly consumption (kWh).
    pub usage_kwh: f64,
    /// Monthly solar generation (kWh).
    pub generation_kwh: f64,
    /// Share of consumption that happens while the panels generate (0-100).
    pub day_percent: f64,
    /// Fuel surcharge (sen/kWh).
    pub afa_sen: f64,
}

impl SavingsInputs {
    /// Copy with NaN, infinite and negative fields replaced by 0.
    fn normalised(&self) -> Self {
        Self {
            usage_kwh: non_negative(self.usage_kwh),
            generation_kwh: non_negative(self.generation_kwh),
            day_percent: non_negative(self.day_percent),
            afa_sen: non_negative(self.afa_sen),
        }
    }
}

/// Outcome of one savings scenario. Entirely derived from its inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsResult {
    /// Monthly consumption (kWh).
    pub monthly_usage_kwh: f64,
    /// Monthly solar generation (kWh).
    pub monthly_generation_kwh: f64,
    /// Daytime share of consumption (%).
    pub self_consumption_percent: f64,
    /// Solar energy used directly as it is generated (kWh).
    pub self_consumption_kwh: f64,
    /// Solar energy stored and discharged by the battery (kWh).
    pub battery_storage_kwh: f64,
    /// Grid energy drawn after solar and battery, in whole kWh.
    pub net_import_kwh: f64,
    /// Solar energy sent to the grid (kWh).
    pub exported_solar_kwh: f64,
    /// Export credited against the net import (kWh).
    pub atap_offset_kwh: f64,
    /// Export beyond the net import, carried forward uncredited (kWh).
    pub carry_forward_kwh: f64,
    /// Bill for the full consumption (RM).
    pub bill_without_solar: f64,
    /// Bill for the net import (RM).
    pub bill_with_solar: f64,
    /// Bill after export credit and incentive claw-back (RM, >= 0).
    pub final_bill: f64,
    /// Savings attributed to daytime self-consumption (RM).
    pub direct_savings: f64,
    /// Battery and export-credit savings (RM).
    pub nighttime_savings: f64,
    /// Value of battery-discharged energy at the retail tariff (RM).
    pub battery_savings: f64,
    /// Credit for exported energy (RM).
    pub atap_export_credit: f64,
    /// Incentive claw-back added to the bill (RM).
    pub incentive_adjustment: f64,
    /// Monthly savings (RM).
    pub total_savings: f64,
    /// `total_savings * 12` (RM).
    pub annual_savings: f64,
    /// Savings relative to the pre-solar bill (%); 0 when that bill is 0.
    pub savings_percentage: f64,
    /// Export-credit rate (RM/kWh), selected by the net import.
    pub applied_domestic_rate: f64,
    /// Retail tariff (RM/kWh) for self-consumed energy, selected by the net import.
    pub self_consumption_rate: f64,
    /// Retail tariff (RM/kWh) applied to battery energy; 0 without a battery.
    pub battery_rate: f64,
    /// Itemised bill before solar.
    pub bill_details: BillDetails,
    /// Itemised bill for the net import.
    pub after_solar_bill_details: BillDetails,
}

/// Runs the savings pipeline.
///
/// `battery_stored_kwh` is the monthly energy discharged from storage;
/// `None` models an installation without a battery. The battery term is
/// subtracted from both export and net import, and its value is reported
/// separately as [`SavingsResult::battery_savings`].
pub fn compute_savings(
    rates: &RateTable,
    inputs: &SavingsInputs,
    battery_stored_kwh: Option<f64>,
) -> SavingsResult {
    let SavingsInputs {
        usage_kwh: usage,
        generation_kwh: generation,
        day_percent,
        afa_sen,
    } = inputs.normalised();
    let battery = battery_stored_kwh.map(non_negative);
    let stored = battery.unwrap_or(0.0);

    let self_consumption = generation.min(usage * (day_percent / 100.0));
    let exported = (generation - self_consumption - stored).max(0.0);
    // Billing works on whole kWh.
    let net_import = (usage - self_consumption - stored).max(0.0).round();

    let atap_offset = exported.min(net_import);
    let carry_forward = (exported - net_import).max(0.0);

    let before = compute_bill(rates, usage, afa_sen);
    let after = compute_bill(rates, net_import, afa_sen);

    let incentive_adjustment = adjust_incentive(rates, exported, net_import, after.incentive_total);

    let export_rate = rates.domestic_energy_rate(net_import);
    let retail_rate = rates.retail_tariff_rate(net_import);
    let atap_export_credit = atap_offset * export_rate;

    let (battery_rate, battery_savings) = match battery {
        Some(kwh) => (retail_rate, kwh * retail_rate),
        None => (0.0, 0.0),
    };

    let bill_reduction = before.total_before_solar - after.total_before_solar;
    // The post-solar bill already reflects battery discharge; battery
    // savings only re-label part of the total.
    let total_savings = bill_reduction + atap_export_credit;
    let nighttime_savings = battery_savings + atap_export_credit;
    let direct_savings = match battery {
        Some(_) => total_savings - nighttime_savings,
        None => bill_reduction,
    };

    let final_bill =
        (after.total_before_solar - atap_export_credit + incentive_adjustment).max(0.0);
    let savings_percentage = if before.total_before_solar > 0.0 {
        total_savings / before.total_before_solar * 100.0
    } else {
        0.0
    };

    debug!(
        usage_kwh = usage,
        generation_kwh = generation,
        battery_kwh = stored,
        net_import_kwh = net_import,
        exported_kwh = exported,
        final_bill,
        total_savings,
        "computed savings scenario"
    );

    SavingsResult {
        monthly_usage_kwh: usage,
        monthly_generation_kwh: generation,
        self_consumption_percent: day_percent,
        self_consumption_kwh: self_consumption,
        battery_storage_kwh: stored,
        net_import_kwh: net_import,
        exported_solar_kwh: exported,
        atap_offset_kwh: atap_offset,
        carry_forward_kwh: carry_forward,
        bill_without_solar: before.total_before_solar,
        bill_with_solar: after.total_before_solar,
        final_bill,
        direct_savings,
        nighttime_savings,
        battery_savings,
        atap_export_credit,
        incentive_adjustment,
        total_savings,
        annual_savings: total_savings * 12.0,
        savings_percentage,
        applied_domestic_rate: export_rate,
        self_consumption_rate: retail_rate,
        battery_rate,
        bill_details: before,
        after_solar_bill_details: after,
    }
}

/// Savings with `battery_stored_kwh` of monthly battery discharge.
pub fn compute_savings_with_battery(
    rates: &RateTable,
    usage_kwh: f64,
    generation_kwh: f64,
    day_percent: f64,
    afa_sen: f64,
    battery_stored_kwh: f64,
) -> SavingsResult {
    let inputs = SavingsInputs {
        usage_kwh,
        generation_kwh,
        day_percent,
        afa_sen,
    };
    compute_savings(rates, &inputs, Some(battery_stored_kwh))
}

/// Savings for solar alone.
pub fn compute_savings_no_battery(
    rates: &RateTable,
    usage_kwh: f64,
    generation_kwh: f64,
    day_percent: f64,
    afa_sen: f64,
) -> SavingsResult {
    let inputs = SavingsInputs {
        usage_kwh,
        generation_kwh,
        day_percent,
        afa_sen,
    };
    compute_savings(rates, &inputs, None)
}

impl fmt::Display for SavingsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Savings Report ---")?;
        writeln!(
            f,
            "Usage:                 {:.0} kWh",
            self.monthly_usage_kwh
        )?;
        writeln!(
            f,
            "Solar generation:      {:.1} kWh",
            self.monthly_generation_kwh
        )?;
        writeln!(
            f,
            "Self-consumption:      {:.1} kWh ({:.0}% daytime)",
            self.self_consumption_kwh, self.self_consumption_percent
        )?;
        writeln!(
            f,
            "Battery discharge:     {:.1} kWh",
            self.battery_storage_kwh
        )?;
        writeln!(f, "Net import:            {:.0} kWh", self.net_import_kwh)?;
        writeln!(
            f,
            "Export:                {:.1} kWh (offset {:.1}, carried forward {:.1})",
            self.exported_solar_kwh, self.atap_offset_kwh, self.carry_forward_kwh
        )?;
        writeln!(f, "Current bill:          RM {:.2}", self.bill_without_solar)?;
        writeln!(f, "Bill on net import:    RM {:.2}", self.bill_with_solar)?;
        writeln!(
            f,
            "Export credit:         RM {:.2} @ {:.4}/kWh",
            self.atap_export_credit, self.applied_domestic_rate
        )?;
        writeln!(
            f,
            "Incentive adjustment:  RM {:.2}",
            self.incentive_adjustment
        )?;
        writeln!(f, "New bill:              RM {:.2}", self.final_bill)?;
        writeln!(f, "Daytime savings:       RM {:.2}", self.direct_savings)?;
        writeln!(f, "Nighttime savings:     RM {:.2}", self.nighttime_savings)?;
        writeln!(f, "Monthly savings:       RM {:.2}", self.total_savings)?;
        writeln!(f, "Annual savings:        RM {:.2}", self.annual_savings)?;
        write!(f, "Savings:               {:.1}%", self.savings_percentage)
    }
}
