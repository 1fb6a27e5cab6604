//! Tiered domestic bill calculation.

use std::fmt;

use serde::Serialize;

use super::rates::RateTable;
use super::{non_negative, round_sen};

/// Itemised bill for one usage amount.
///
/// Every per-kWh component is split into the block up to the tax boundary
/// (`*_non_service`, exempt from service tax) and the block above it
/// (`*_service`). The split is a tax-allocation boundary only; the energy
/// rate tier is selected separately by [`RateTable::high_usage_threshold_kwh`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillDetails {
    /// Grand total (RM), identical to `total_before_solar`.
    pub bill_amount: f64,
    /// Usage in the service-tax-exempt block (kWh).
    pub usage_non_service: f64,
    /// Usage in the taxed block (kWh).
    pub usage_service: f64,
    /// Billed usage (kWh).
    pub usage_total: f64,
    /// Energy tier applied, e.g. `Energy (27.03 sen/kWh)`.
    pub energy_rate_label: String,
    pub energy_non_service: f64,
    pub energy_service: f64,
    pub energy_total: f64,
    pub afa_non_service: f64,
    pub afa_service: f64,
    pub afa_total: f64,
    pub capacity_non_service: f64,
    pub capacity_service: f64,
    pub capacity_total: f64,
    pub network_non_service: f64,
    pub network_service: f64,
    pub network_total: f64,
    /// Retail fixed charge, present only when the taxed block is used.
    pub retail_service: f64,
    pub incentive_non_service: f64,
    pub incentive_service: f64,
    pub incentive_total: f64,
    /// Sum of the exempt block's components.
    pub usage_charge_non_service: f64,
    /// Sum of the taxed block's components plus the retail charge.
    pub usage_charge_service: f64,
    pub usage_charge_total: f64,
    /// Service tax (SST) on `usage_charge_service`.
    pub service_tax: f64,
    /// Fuel-levy tax (KWTBB).
    pub kwtbb: f64,
    /// Grand total (RM).
    pub total_before_solar: f64,
}

/// A base/excess pair of per-kWh charges at one rate.
#[derive(Debug, Clone, Copy)]
struct Split {
    base: f64,
    excess: f64,
}

impl Split {
    fn at_rate(base_kwh: f64, excess_kwh: f64, rate: f64) -> Self {
        Self {
            base: base_kwh * rate,
            excess: excess_kwh * rate,
        }
    }

    fn total(self) -> f64 {
        self.base + self.excess
    }
}

/// Computes the itemised bill for `usage` kWh at a fuel surcharge of
/// `afa_sen_per_kwh`.
///
/// NaN, infinite and negative inputs are treated as 0.
///
/// # Examples
///
/// ```
/// use solar_atap::tariff::{RateTable, compute_bill};
///
/// let bill = compute_bill(&RateTable::domestic(), 900.0, 0.0);
/// assert!((bill.total_before_solar - 418.34).abs() < 1e-9);
/// ```
pub fn compute_bill(rates: &RateTable, usage: f64, afa_sen_per_kwh: f64) -> BillDetails {
    let usage = non_negative(usage);
    let afa_rate = non_negative(afa_sen_per_kwh) / 100.0;

    let energy_rate = rates.domestic_energy_rate(usage);

    let base = usage.min(rates.tax_split_kwh);
    let excess = (usage - rates.tax_split_kwh).max(0.0);

    let energy = Split::at_rate(base, excess, energy_rate);
    let capacity = Split::at_rate(base, excess, rates.capacity_sen / 100.0);
    let network = Split::at_rate(base, excess, rates.network_sen / 100.0);
    // Band is chosen by the unsplit usage.
    let incentive = Split::at_rate(base, excess, rates.incentive_bands.rate_for(usage));

    let afa = if usage > rates.afa_threshold_kwh {
        Split::at_rate(base, excess, afa_rate)
    } else {
        Split::at_rate(0.0, 0.0, 0.0)
    };

    let retail = if excess > 0.0 { rates.retail_rm } else { 0.0 };

    let non_service = energy.base + capacity.base + network.base + incentive.base + afa.base;
    let service =
        energy.excess + capacity.excess + network.excess + retail + incentive.excess + afa.excess;
    let usage_charge = non_service + service;

    let kwtbb = if usage > rates.kwtbb_threshold_kwh {
        let taxable = energy.total() + capacity.total() + network.total() + incentive.total();
        round_sen(taxable * (rates.kwtbb_percent / 100.0))
    } else {
        0.0
    };

    let service_tax = if excess > 0.0 {
        round_sen(service * (rates.sst_percent / 100.0))
    } else {
        0.0
    };

    let total = usage_charge + kwtbb + service_tax;

    BillDetails {
        bill_amount: total,
        usage_non_service: base,
        usage_service: excess,
        usage_total: usage,
        energy_rate_label: rates.energy_rate_description(usage),
        energy_non_service: energy.base,
        energy_service: energy.excess,
        energy_total: energy.total(),
        afa_non_service: afa.base,
        afa_service: afa.excess,
        afa_total: afa.total(),
        capacity_non_service: capacity.base,
        capacity_service: capacity.excess,
        capacity_total: capacity.total(),
        network_non_service: network.base,
        network_service: network.excess,
        network_total: network.total(),
        retail_service: retail,
        incentive_non_service: incentive.base,
        incentive_service: incentive.excess,
        incentive_total: incentive.total(),
        usage_charge_non_service: non_service,
        usage_charge_service: service,
        usage_charge_total: usage_charge,
        service_tax,
        kwtbb,
        total_before_solar: total,
    }
}

impl BillDetails {
    /// Itemised lines as `(label, non_service, service, total)`.
    ///
    /// Shared by the text report and the CSV export so both list the same
    /// components in the same order.
    pub fn line_items(&self) -> Vec<(&'static str, f64, f64, f64)> {
        vec![
            (
                "usage_kwh",
                self.usage_non_service,
                self.usage_service,
                self.usage_total,
            ),
            (
                "energy",
                self.energy_non_service,
                self.energy_service,
                self.energy_total,
            ),
            (
                "capacity",
                self.capacity_non_service,
                self.capacity_service,
                self.capacity_total,
            ),
            (
                "network",
                self.network_non_service,
                self.network_service,
                self.network_total,
            ),
            ("retail", 0.0, self.retail_service, self.retail_service),
            (
                "incentive",
                self.incentive_non_service,
                self.incentive_service,
                self.incentive_total,
            ),
            (
                "afa",
                self.afa_non_service,
                self.afa_service,
                self.afa_total,
            ),
            (
                "usage_charge",
                self.usage_charge_non_service,
                self.usage_charge_service,
                self.usage_charge_total,
            ),
            ("service_tax", 0.0, self.service_tax, self.service_tax),
            ("kwtbb", 0.0, 0.0, self.kwtbb),
            ("total", 0.0, 0.0, self.total_before_solar),
        ]
    }
}

impl fmt::Display for BillDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.energy_rate_label)?;
        writeln!(
            f,
            "{:<14} {:>12} {:>12} {:>12}",
            "", "Non-SST", "SST", "Total"
        )?;
        for (label, non_service, service, total) in self.line_items() {
            if label == "total" {
                write!(f, "{label:<14} {:>12} {:>12} {total:>12.2}", "", "")?;
            } else {
                writeln!(
                    f,
                    "{label:<14} {non_service:>12.2} {service:>12.2} {total:>12.2}"
                )?;
            }
        }
        Ok(())
    }
}
