//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::savings::SystemSpec;
use crate::tariff::RateTable;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Household consumption and tariff inputs.
    #[serde(default)]
    pub customer: CustomerConfig,
    /// PV array parameters.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Battery bank parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Installation cost.
    #[serde(default)]
    pub finance: FinanceConfig,
    /// Tariff override; the domestic tariff when omitted.
    #[serde(default)]
    pub tariff: RateTable,
}

/// Household consumption and tariff inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustomerConfig {
    /// Input mode: `"kwh"` (usage given) or `"rm"` (bill given, usage solved).
    pub mode: String,
    /// Monthly consumption (kWh), used in `"kwh"` mode.
    pub monthly_usage_kwh: f64,
    /// Monthly bill (RM), used in `"rm"` mode.
    pub monthly_bill_rm: f64,
    /// Fuel surcharge (sen/kWh).
    pub afa_sen: f64,
    /// Share of consumption during generating hours (0-100).
    pub day_percent: f64,
}

impl Default for CustomerConfig {
    fn default() -> Self {
        Self {
            mode: "kwh".to_string(),
            monthly_usage_kwh: 900.0,
            monthly_bill_rm: 0.0,
            afa_sen: 0.0,
            day_percent: 30.0,
        }
    }
}

/// PV array parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    /// Rated panel power (W).
    pub panel_wattage_w: f64,
    /// Number of panels.
    pub panel_count: u32,
    /// Peak sun hours per day.
    pub peak_sun_hours: f64,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            panel_wattage_w: 650.0,
            panel_count: 10,
            peak_sun_hours: 3.4,
        }
    }
}

/// Battery bank parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Whether a battery bank is installed.
    pub enabled: bool,
    /// Capacity of one unit (kWh).
    pub unit_kwh: f64,
    /// Number of units.
    pub units: u32,
    /// Usable share of capacity (0-100).
    pub depth_of_discharge_percent: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            unit_kwh: 5.12,
            units: 2,
            depth_of_discharge_percent: 90.0,
        }
    }
}

/// Installation cost.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinanceConfig {
    /// Installed system price (RM); 0 leaves ROI unreported.
    pub system_price_rm: f64,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"customer.day_percent"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} - {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: 900 kWh/month, 6.5 kWp, no battery.
    pub fn baseline() -> Self {
        Self {
            customer: CustomerConfig::default(),
            solar: SolarConfig::default(),
            battery: BatteryConfig::default(),
            finance: FinanceConfig::default(),
            tariff: RateTable::domestic(),
        }
    }

    /// Returns the high-usage preset: 2000 kWh/month in the high energy
    /// tier, a 13 kWp array and four battery units.
    pub fn high_usage() -> Self {
        Self {
            customer: CustomerConfig {
                monthly_usage_kwh: 2000.0,
                afa_sen: 2.0,
                day_percent: 40.0,
                ..CustomerConfig::default()
            },
            solar: SolarConfig {
                panel_count: 20,
                ..SolarConfig::default()
            },
            battery: BatteryConfig {
                enabled: true,
                units: 4,
                ..BatteryConfig::default()
            },
            finance: FinanceConfig {
                system_price_rm: 45_000.0,
            },
            tariff: RateTable::domestic(),
        }
    }

    /// Returns the bill-target preset: usage solved from a RM 650 bill.
    pub fn bill_target() -> Self {
        Self {
            customer: CustomerConfig {
                mode: "rm".to_string(),
                monthly_bill_rm: 650.0,
                ..CustomerConfig::default()
            },
            solar: SolarConfig {
                panel_count: 14,
                ..SolarConfig::default()
            },
            battery: BatteryConfig {
                enabled: true,
                ..BatteryConfig::default()
            },
            finance: FinanceConfig {
                system_price_rm: 28_000.0,
            },
            tariff: RateTable::domestic(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "high_usage", "bill_target"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "high_usage" => Ok(Self::high_usage()),
            "bill_target" => Ok(Self::bill_target()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Whether the monthly bill, not the usage, is the given input.
    pub fn bill_mode(&self) -> bool {
        self.customer.mode == "rm"
    }

    /// PV and battery specification for the sizing helpers.
    pub fn system_spec(&self) -> SystemSpec {
        SystemSpec {
            panel_wattage_w: self.solar.panel_wattage_w,
            panel_count: self.solar.panel_count,
            peak_sun_hours: self.solar.peak_sun_hours,
            battery_enabled: self.battery.enabled,
            battery_unit_kwh: self.battery.unit_kwh,
            battery_units: self.battery.units,
            depth_of_discharge_percent: self.battery.depth_of_discharge_percent,
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let c = &self.customer;

        if c.mode != "kwh" && c.mode != "rm" {
            errors.push(ConfigError::new(
                "customer.mode",
                format!("must be \"kwh\" or \"rm\", got \"{}\"", c.mode),
            ));
        }
        non_negative_field(&mut errors, "customer.monthly_usage_kwh", c.monthly_usage_kwh);
        non_negative_field(&mut errors, "customer.monthly_bill_rm", c.monthly_bill_rm);
        non_negative_field(&mut errors, "customer.afa_sen", c.afa_sen);
        percent_field(&mut errors, "customer.day_percent", c.day_percent);

        let sol = &self.solar;
        non_negative_field(&mut errors, "solar.panel_wattage_w", sol.panel_wattage_w);
        non_negative_field(&mut errors, "solar.peak_sun_hours", sol.peak_sun_hours);
        if sol.peak_sun_hours > 24.0 {
            errors.push(ConfigError::new("solar.peak_sun_hours", "must be <= 24"));
        }

        let bat = &self.battery;
        if bat.enabled && (bat.unit_kwh.is_nan() || bat.unit_kwh <= 0.0) {
            errors.push(ConfigError::new(
                "battery.unit_kwh",
                "must be > 0 when the battery is enabled",
            ));
        }
        percent_field(
            &mut errors,
            "battery.depth_of_discharge_percent",
            bat.depth_of_discharge_percent,
        );

        non_negative_field(
            &mut errors,
            "finance.system_price_rm",
            self.finance.system_price_rm,
        );

        let t = &self.tariff;
        for (field, value) in [
            ("tariff.energy_sen", t.energy_sen),
            ("tariff.energy_high_sen", t.energy_high_sen),
            ("tariff.capacity_sen", t.capacity_sen),
            ("tariff.network_sen", t.network_sen),
            ("tariff.retail_rm", t.retail_rm),
            ("tariff.kwtbb_percent", t.kwtbb_percent),
            ("tariff.sst_percent", t.sst_percent),
            ("tariff.retail_tariff_low_rm", t.retail_tariff_low_rm),
            ("tariff.retail_tariff_high_rm", t.retail_tariff_high_rm),
            ("tariff.max_incentive_rate_rm", t.max_incentive_rate_rm),
            ("tariff.high_usage_threshold_kwh", t.high_usage_threshold_kwh),
            ("tariff.afa_threshold_kwh", t.afa_threshold_kwh),
            ("tariff.kwtbb_threshold_kwh", t.kwtbb_threshold_kwh),
        ] {
            non_negative_field(&mut errors, field, value);
        }
        if t.tax_split_kwh.is_nan() || t.tax_split_kwh <= 0.0 {
            errors.push(ConfigError::new("tariff.tax_split_kwh", "must be > 0"));
        }
        let bands = t.incentive_bands.bands();
        for (i, band) in bands.iter().enumerate() {
            if band.min_kwh > band.max_kwh {
                errors.push(ConfigError::new(
                    &format!("tariff.incentive_bands[{i}]"),
                    "min_kwh must be <= max_kwh",
                ));
            }
            if band.rate_rm_per_kwh > 0.0 {
                errors.push(ConfigError::new(
                    &format!("tariff.incentive_bands[{i}].rate_rm_per_kwh"),
                    "must be <= 0 (a rebate)",
                ));
            }
        }
        for (i, pair) in bands.windows(2).enumerate() {
            if pair[0].max_kwh >= pair[1].min_kwh {
                errors.push(ConfigError::new(
                    &format!("tariff.incentive_bands[{}]", i + 1),
                    "bands must be ordered and disjoint",
                ));
            }
        }

        errors
    }
}

fn non_negative_field(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigError::new(field, "must be a finite number >= 0"));
    }
}

fn percent_field(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(0.0..=100.0).contains(&value) {
        errors.push(ConfigError::new(field, "must be in [0, 100]"));
    }
}
