//! Domestic tariff rate tables.
//!
//! Every calculation takes a `&RateTable` so alternate tariff regimes can be
//! injected from configuration or tests. [`RateTable::domestic`] holds the
//! published domestic constants.

use serde::{Deserialize, Serialize};

/// One energy-efficiency incentive band: usage in `[min_kwh, max_kwh]`
/// (inclusive) earns `rate_rm_per_kwh` (negative, a rebate).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncentiveBand {
    /// Lower usage bound (kWh, inclusive).
    pub min_kwh: f64,
    /// Upper usage bound (kWh, inclusive).
    pub max_kwh: f64,
    /// Rebate rate (RM/kWh, negative).
    pub rate_rm_per_kwh: f64,
}

impl IncentiveBand {
    const fn new(min_kwh: f64, max_kwh: f64, rate_rm_per_kwh: f64) -> Self {
        Self {
            min_kwh,
            max_kwh,
            rate_rm_per_kwh,
        }
    }

    /// Whether `usage` falls inside this band.
    pub fn contains(&self, usage: f64) -> bool {
        usage >= self.min_kwh && usage <= self.max_kwh
    }
}

const DOMESTIC_BANDS: [IncentiveBand; 16] = [
    IncentiveBand::new(1.0, 200.0, -0.25),
    IncentiveBand::new(201.0, 250.0, -0.245),
    IncentiveBand::new(251.0, 300.0, -0.225),
    IncentiveBand::new(301.0, 350.0, -0.21),
    IncentiveBand::new(351.0, 400.0, -0.17),
    IncentiveBand::new(401.0, 450.0, -0.145),
    IncentiveBand::new(451.0, 500.0, -0.12),
    IncentiveBand::new(501.0, 550.0, -0.105),
    IncentiveBand::new(551.0, 600.0, -0.09),
    IncentiveBand::new(601.0, 650.0, -0.075),
    IncentiveBand::new(651.0, 700.0, -0.055),
    IncentiveBand::new(701.0, 750.0, -0.045),
    IncentiveBand::new(751.0, 800.0, -0.04),
    IncentiveBand::new(801.0, 850.0, -0.025),
    IncentiveBand::new(851.0, 900.0, -0.01),
    IncentiveBand::new(901.0, 1000.0, -0.005),
];

/// Ordered, disjoint incentive bands.
///
/// Usage outside every band (including fractional usage falling in the
/// one-kWh gap between two bands) has rate 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncentiveBandTable {
    bands: Vec<IncentiveBand>,
}

impl IncentiveBandTable {
    /// Builds a table from explicit bands.
    pub fn new(bands: Vec<IncentiveBand>) -> Self {
        Self { bands }
    }

    /// The domestic incentive schedule.
    pub fn domestic() -> Self {
        Self::new(DOMESTIC_BANDS.to_vec())
    }

    /// Rebate rate (RM/kWh, <= 0) for `usage`, or 0 if no band matches.
    pub fn rate_for(&self, usage: f64) -> f64 {
        self.bands
            .iter()
            .find(|band| band.contains(usage))
            .map_or(0.0, |band| band.rate_rm_per_kwh)
    }

    /// Bands in table order.
    pub fn bands(&self) -> &[IncentiveBand] {
        &self.bands
    }
}

impl Default for IncentiveBandTable {
    fn default() -> Self {
        Self::domestic()
    }
}

/// Complete tariff: per-kWh charges, thresholds, taxes and incentive bands.
///
/// Rates suffixed `_sen` are in sen/kWh and are divided by 100 before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateTable {
    /// Energy charge for usage at or below `high_usage_threshold_kwh`.
    pub energy_sen: f64,
    /// Energy charge once usage exceeds `high_usage_threshold_kwh`.
    pub energy_high_sen: f64,
    /// Usage above which the high energy rate applies to every kWh.
    pub high_usage_threshold_kwh: f64,
    /// Usage boundary between the service-tax-exempt and taxed blocks.
    pub tax_split_kwh: f64,
    /// Capacity charge.
    pub capacity_sen: f64,
    /// Network charge.
    pub network_sen: f64,
    /// Retail fixed charge (RM), charged only when the taxed block is used.
    pub retail_rm: f64,
    /// Usage above which the fuel surcharge (AFA) applies.
    pub afa_threshold_kwh: f64,
    /// Fuel-levy tax (KWTBB) percentage.
    pub kwtbb_percent: f64,
    /// Usage above which KWTBB is charged.
    pub kwtbb_threshold_kwh: f64,
    /// Service tax (SST) percentage on the taxed block.
    pub sst_percent: f64,
    /// Flat retail-equivalent tariff (RM/kWh) at or below the high threshold.
    pub retail_tariff_low_rm: f64,
    /// Flat retail-equivalent tariff (RM/kWh) above the high threshold.
    pub retail_tariff_high_rm: f64,
    /// Largest incentive rate magnitude that can be clawed back (RM/kWh).
    pub max_incentive_rate_rm: f64,
    /// Incentive rebate bands.
    pub incentive_bands: IncentiveBandTable,
}

impl RateTable {
    /// The domestic tariff.
    pub fn domestic() -> Self {
        Self {
            energy_sen: 27.03,
            energy_high_sen: 37.03,
            high_usage_threshold_kwh: 1500.0,
            tax_split_kwh: 600.0,
            capacity_sen: 4.55,
            network_sen: 12.85,
            retail_rm: 10.00,
            afa_threshold_kwh: 600.0,
            kwtbb_percent: 1.6,
            kwtbb_threshold_kwh: 300.0,
            sst_percent: 8.0,
            retail_tariff_low_rm: 0.4443,
            retail_tariff_high_rm: 0.5443,
            max_incentive_rate_rm: 0.25,
            incentive_bands: IncentiveBandTable::domestic(),
        }
    }

    /// Whether `usage` is billed at the high energy rate.
    pub fn is_high_usage(&self, usage: f64) -> bool {
        usage > self.high_usage_threshold_kwh
    }

    /// Domestic energy rate (RM/kWh) for the tier selected by `usage`.
    ///
    /// Also the ATAP export-credit rate.
    pub fn domestic_energy_rate(&self, usage: f64) -> f64 {
        if self.is_high_usage(usage) {
            self.energy_high_sen / 100.0
        } else {
            self.energy_sen / 100.0
        }
    }

    /// Flat retail-equivalent tariff (RM/kWh) for the tier selected by `usage`.
    pub fn retail_tariff_rate(&self, usage: f64) -> f64 {
        if self.is_high_usage(usage) {
            self.retail_tariff_high_rm
        } else {
            self.retail_tariff_low_rm
        }
    }

    /// Human-readable label for the energy line of an itemised bill.
    pub fn energy_rate_description(&self, usage: f64) -> String {
        let sen = if self.is_high_usage(usage) {
            self.energy_high_sen
        } else {
            self.energy_sen
        };
        format!("Energy ({sen:.2} sen/kWh)")
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::domestic()
    }
}

/// Incentive rebate rate (RM/kWh) for `usage`; 0 if no band matches.
pub fn lookup_incentive_rate(rates: &RateTable, usage: f64) -> f64 {
    rates.incentive_bands.rate_for(usage)
}
