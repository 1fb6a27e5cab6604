//! API request, query and response types.

use serde::{Deserialize, Serialize};

use crate::savings::SavingsInputs;

/// Query for `GET /bill`.
#[derive(Debug, Deserialize)]
pub struct BillQuery {
    /// Monthly usage (kWh).
    pub usage: f64,
    /// Fuel surcharge (sen/kWh).
    #[serde(default)]
    pub afa: f64,
}

/// Query for `GET /solve`.
#[derive(Debug, Deserialize)]
pub struct SolveQuery {
    /// Target bill (RM).
    pub bill: f64,
    /// Fuel surcharge (sen/kWh).
    #[serde(default)]
    pub afa: f64,
}

/// Response for `GET /solve`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SolveResponse {
    /// Whole-kWh usage whose bill is closest to the target.
    pub usage_kwh: u32,
    /// Bill at that usage (RM).
    pub bill_rm: f64,
}

/// Query for `GET /incentive`.
#[derive(Debug, Deserialize)]
pub struct IncentiveQuery {
    /// Monthly usage (kWh).
    pub usage: f64,
}

/// Response for `GET /incentive`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IncentiveResponse {
    /// Usage looked up (kWh).
    pub usage_kwh: f64,
    /// Rebate rate (RM/kWh, <= 0).
    pub rate_rm_per_kwh: f64,
}

/// Body for `POST /savings`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SavingsRequest {
    /// Monthly usage (kWh).
    pub usage_kwh: f64,
    /// Monthly solar generation (kWh).
    pub generation_kwh: f64,
    /// Daytime share of consumption (0-100).
    pub day_percent: f64,
    /// Fuel surcharge (sen/kWh).
    #[serde(default)]
    pub afa_sen: f64,
    /// Monthly battery discharge (kWh); omit for solar without storage.
    #[serde(default)]
    pub battery_kwh: Option<f64>,
}

impl SavingsRequest {
    /// Engine inputs, excluding the battery term.
    pub fn inputs(&self) -> SavingsInputs {
        SavingsInputs {
            usage_kwh: self.usage_kwh,
            generation_kwh: self.generation_kwh,
            day_percent: self.day_percent,
            afa_sen: self.afa_sen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_request_battery_is_optional() {
        let req: SavingsRequest = serde_json::from_str(
            r#"{"usage_kwh": 900, "generation_kwh": 663, "day_percent": 30}"#,
        )
        .unwrap();
        assert_eq!(req.battery_kwh, None);
        assert_eq!(req.afa_sen, 0.0);
        assert_eq!(req.inputs().usage_kwh, 900.0);
    }
}
