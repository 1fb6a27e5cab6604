//! PV array and battery sizing: turns panel and battery specifications into
//! the monthly generation and stored-energy figures the savings engine
//! consumes.

use std::fmt;

use serde::Serialize;

use crate::tariff::non_negative;

/// Billing month length used to scale daily figures.
pub const DAYS_PER_MONTH: f64 = 30.0;
/// Share of daily generation assumed to be consumed directly during the day.
pub const DIRECT_USE_GENERATION_SHARE: f64 = 0.3;
/// Charge level (%) at which a battery unit counts as full.
const FULL_CHARGE_PERCENT: f64 = 99.9;

/// Installed PV array and optional battery bank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSpec {
    /// Rated panel power (W).
    pub panel_wattage_w: f64,
    /// Number of panels.
    pub panel_count: u32,
    /// Peak sun hours per day.
    pub peak_sun_hours: f64,
    /// Whether the battery bank is installed.
    pub battery_enabled: bool,
    /// Capacity of one battery unit (kWh).
    pub battery_unit_kwh: f64,
    /// Number of battery units.
    pub battery_units: u32,
    /// Usable share of battery capacity (%).
    pub depth_of_discharge_percent: f64,
}

impl SystemSpec {
    /// Array size (kWp).
    pub fn system_size_kwp(&self) -> f64 {
        non_negative(self.panel_wattage_w) * f64::from(self.panel_count) / 1000.0
    }

    /// Generation on an average day at `peak_sun_hours` (kWh).
    pub fn daily_generation_kwh(&self) -> f64 {
        self.daily_generation_at(self.peak_sun_hours)
    }

    fn daily_generation_at(&self, peak_sun_hours: f64) -> f64 {
        self.system_size_kwp() * non_negative(peak_sun_hours)
    }

    /// Generation over a billing month (kWh).
    pub fn monthly_generation_kwh(&self) -> f64 {
        self.daily_generation_kwh() * DAYS_PER_MONTH
    }

    /// Installed battery capacity (kWh); 0 when the battery is disabled.
    pub fn total_battery_kwh(&self) -> f64 {
        if self.battery_enabled {
            f64::from(self.battery_units) * non_negative(self.battery_unit_kwh)
        } else {
            0.0
        }
    }

    /// Capacity available after depth-of-discharge limits (kWh).
    pub fn usable_battery_kwh(&self) -> f64 {
        self.total_battery_kwh() * non_negative(self.depth_of_discharge_percent) / 100.0
    }

    /// Solar energy the battery stores and discharges over a month (kWh).
    ///
    /// Each day the battery takes what is left after direct daytime use,
    /// limited by usable capacity and by night-time consumption.
    pub fn monthly_battery_stored_kwh(&self, monthly_usage_kwh: f64, day_percent: f64) -> f64 {
        if !self.battery_enabled {
            return 0.0;
        }
        let day_share = non_negative(day_percent) / 100.0;
        let daily_usage = non_negative(monthly_usage_kwh) / DAYS_PER_MONTH;
        let night_usage = daily_usage * (1.0 - day_share);
        let daytime_usage = daily_usage * day_share;

        let daily_generation = self.daily_generation_kwh();
        let direct_use = daytime_usage.min(daily_generation * DIRECT_USE_GENERATION_SHARE);
        let remaining = daily_generation - direct_use;

        let storable = self.usable_battery_kwh().min(night_usage);
        let stored_daily = remaining.min(storable).max(0.0);
        stored_daily * DAYS_PER_MONTH
    }

    /// Per-unit charge levels reached on a day with `peak_sun_hours`.
    ///
    /// Units fill in order from the energy left after direct daytime use.
    pub fn charge_profile(
        &self,
        label: &str,
        peak_sun_hours: f64,
        monthly_usage_kwh: f64,
        day_percent: f64,
    ) -> ChargeProfile {
        let daily_generation = self.daily_generation_at(peak_sun_hours);
        let daytime_usage =
            non_negative(monthly_usage_kwh) / DAYS_PER_MONTH * non_negative(day_percent) / 100.0;
        let direct_use = daytime_usage.min(daily_generation * DIRECT_USE_GENERATION_SHARE);
        let mut available = (daily_generation - direct_use).max(0.0);

        let unit_kwh = non_negative(self.battery_unit_kwh);
        let units = if self.battery_enabled {
            self.battery_units
        } else {
            0
        };

        let mut unit_charge_percent = Vec::with_capacity(units as usize);
        for _ in 0..units {
            let charge = unit_kwh.min(available);
            available -= charge;
            let percent = if unit_kwh > 0.0 {
                charge / unit_kwh * 100.0
            } else {
                0.0
            };
            unit_charge_percent.push(percent);
        }

        ChargeProfile {
            label: label.to_string(),
            peak_sun_hours: non_negative(peak_sun_hours),
            daily_generation_kwh: daily_generation,
            unit_charge_percent,
        }
    }

    /// Charge profiles for low sun (2.0 PSH), the configured PSH, and high
    /// sun (4.5 PSH).
    pub fn sun_scenarios(&self, monthly_usage_kwh: f64, day_percent: f64) -> Vec<ChargeProfile> {
        [
            ("Low Sun", 2.0),
            ("Current Scenario", self.peak_sun_hours),
            ("High Sun", 4.5),
        ]
        .into_iter()
        .map(|(label, psh)| self.charge_profile(label, psh, monthly_usage_kwh, day_percent))
        .collect()
    }
}

/// Battery charge levels for one sun scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeProfile {
    /// Scenario name.
    pub label: String,
    /// Peak sun hours assumed.
    pub peak_sun_hours: f64,
    /// Generation that day (kWh).
    pub daily_generation_kwh: f64,
    /// Charge reached by each unit (%).
    pub unit_charge_percent: Vec<f64>,
}

impl ChargeProfile {
    /// Units charged to (effectively) 100 %.
    pub fn fully_charged(&self) -> usize {
        self.unit_charge_percent
            .iter()
            .filter(|&&p| p >= FULL_CHARGE_PERCENT)
            .count()
    }
}

impl fmt::Display for ChargeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<17} {:>4.1} PSH {:>6.1} kWh/day | ",
            self.label, self.peak_sun_hours, self.daily_generation_kwh
        )?;
        for p in &self.unit_charge_percent {
            write!(f, "{p:>4.0}% ")?;
        }
        write!(
            f,
            "| {}/{} full",
            self.fully_charged(),
            self.unit_charge_percent.len()
        )
    }
}

/// Annual return on the system price (%), or `None` when either the price
/// or the savings is not positive.
pub fn roi_percent(annual_savings: f64, system_price: f64) -> Option<f64> {
    (system_price > 0.0 && annual_savings > 0.0).then(|| annual_savings / system_price * 100.0)
}

/// Years for the annual savings to repay the system price, or `None` when
/// either is not positive.
pub fn payback_years(annual_savings: f64, system_price: f64) -> Option<f64> {
    (system_price > 0.0 && annual_savings > 0.0).then(|| system_price / annual_savings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(battery_enabled: bool) -> SystemSpec {
        SystemSpec {
            panel_wattage_w: 650.0,
            panel_count: 10,
            peak_sun_hours: 3.4,
            battery_enabled,
            battery_unit_kwh: 5.12,
            battery_units: 2,
            depth_of_discharge_percent: 90.0,
        }
    }

    #[test]
    fn generation_from_array_size() {
        let s = spec(false);
        assert!((s.system_size_kwp() - 6.5).abs() < 1e-12);
        assert!((s.daily_generation_kwh() - 22.1).abs() < 1e-9);
        assert!((s.monthly_generation_kwh() - 663.0).abs() < 1e-9);
    }

    #[test]
    fn disabled_battery_stores_nothing() {
        let s = spec(false);
        assert_eq!(s.total_battery_kwh(), 0.0);
        assert_eq!(s.monthly_battery_stored_kwh(900.0, 30.0), 0.0);
        assert!(s.sun_scenarios(900.0, 30.0)[1].unit_charge_percent.is_empty());
    }

    #[test]
    fn stored_energy_limited_by_usable_capacity() {
        // usable = 10.24 * 0.9 = 9.216 kWh; night use = 30 * 0.7 = 21 kWh;
        // remaining solar = 22.1 - min(9, 6.63) = 15.47 kWh
        let s = spec(true);
        let stored = s.monthly_battery_stored_kwh(900.0, 30.0);
        assert!((stored - 9.216 * 30.0).abs() < 1e-9);
    }

    #[test]
    fn stored_energy_limited_by_night_usage() {
        // daily 10 kWh, night 7 kWh
        let s = spec(true);
        let stored = s.monthly_battery_stored_kwh(300.0, 30.0);
        assert!((stored - 7.0 * 30.0).abs() < 1e-9);
    }

    #[test]
    fn stored_energy_never_negative() {
        let mut s = spec(true);
        s.panel_count = 0;
        assert_eq!(s.monthly_battery_stored_kwh(900.0, 30.0), 0.0);
    }

    #[test]
    fn units_fill_in_order() {
        // 2.0 PSH: 13 kWh/day, direct use min(9, 3.9) = 3.9, 9.1 kWh left
        let s = spec(true);
        let low = s.charge_profile("Low Sun", 2.0, 900.0, 30.0);
        assert_eq!(low.unit_charge_percent.len(), 2);
        assert!((low.unit_charge_percent[0] - 100.0).abs() < 1e-9);
        assert!((low.unit_charge_percent[1] - (9.1 - 5.12) / 5.12 * 100.0).abs() < 1e-9);
        assert_eq!(low.fully_charged(), 1);
    }

    #[test]
    fn sun_scenarios_cover_low_current_high() {
        let s = spec(true);
        let labels: Vec<String> = s
            .sun_scenarios(900.0, 30.0)
            .into_iter()
            .map(|p| p.label)
            .collect();
        assert_eq!(labels, ["Low Sun", "Current Scenario", "High Sun"]);
    }

    #[test]
    fn roi_requires_positive_price_and_savings() {
        assert_eq!(roi_percent(1200.0, 0.0), None);
        assert_eq!(roi_percent(0.0, 20_000.0), None);
        let roi = roi_percent(3000.0, 20_000.0);
        assert!(roi.is_some_and(|r| (r - 15.0).abs() < 1e-9));
    }

    #[test]
    fn payback_requires_positive_price_and_savings() {
        assert_eq!(payback_years(1200.0, 0.0), None);
        assert_eq!(payback_years(0.0, 20_000.0), None);
        assert_eq!(payback_years(-50.0, 20_000.0), None);
        assert_eq!(payback_years(f64::NAN, 20_000.0), None);
        let years = payback_years(4000.0, 20_000.0);
        assert!(years.is_some_and(|y| (y - 5.0).abs() < 1e-9));
    }
}
