//! Integration tests for billing, usage solving and the savings engine.

mod common;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use solar_atap::savings::{
    compute_savings, compute_savings_no_battery, compute_savings_with_battery,
};
use solar_atap::tariff::{adjust_incentive, compute_bill, solve_usage};

use common::{assert_close, baseline_inputs, household, rates};

#[test]
fn usage_split_sums_to_usage() {
    let rates = rates();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let usage: f64 = rng.random_range(0.0..6000.0);
        let afa: f64 = rng.random_range(0.0..10.0);
        let bill = compute_bill(&rates, usage, afa);
        assert_close(bill.usage_non_service + bill.usage_service, usage, "usage split");
        assert_close(bill.usage_total, usage, "usage total");
        assert!(bill.usage_non_service <= 600.0);
    }
}

#[test]
fn total_is_sum_of_components_and_taxes() {
    let rates = rates();
    for usage in [0.0, 150.0, 300.0, 301.0, 600.0, 601.0, 900.0, 1501.0, 4000.0] {
        let b = compute_bill(&rates, usage, 3.0);
        let components = b.energy_total
            + b.afa_total
            + b.capacity_total
            + b.network_total
            + b.retail_service
            + b.incentive_total;
        assert_close(
            b.total_before_solar,
            components + b.service_tax + b.kwtbb,
            "bill total",
        );
    }
}

#[test]
fn bill_is_deterministic() {
    let rates = rates();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let usage: f64 = rng.random_range(0.0..5000.0);
        let afa: f64 = rng.random_range(0.0..8.0);
        let a = compute_bill(&rates, usage, afa);
        let b = compute_bill(&rates, usage, afa);
        assert_eq!(a.total_before_solar.to_bits(), b.total_before_solar.to_bits());
        assert_eq!(a, b);
    }
}

#[test]
fn bill_900_kwh_matches_hand_computed_total() {
    let b = compute_bill(&rates(), 900.0, 0.0);
    assert_close(b.total_before_solar, 418.34, "total");
    assert_close(b.service_tax, 11.22, "service tax");
    assert_close(b.kwtbb, 6.25, "fuel levy");
}

#[test]
fn solver_round_trips_every_whole_kwh() {
    let rates = rates();
    for afa in [0.0, 3.5] {
        for usage in 1_u32..=10_000 {
            let target = compute_bill(&rates, f64::from(usage), afa).total_before_solar;
            let solved = solve_usage(&rates, target, afa);
            if solved == usage {
                continue;
            }
            let solved_diff =
                (compute_bill(&rates, f64::from(solved), afa).total_before_solar - target).abs();
            assert!(
                solved.abs_diff(usage) <= 1 && solved_diff <= 1e-9,
                "usage {usage} afa {afa}: solved {solved}, RM {solved_diff:.4} off"
            );
        }
    }
}

#[test]
fn solver_recovers_usage_away_from_band_edges() {
    let rates = rates();
    for afa in [0.0, 3.5] {
        for usage in [100_u32, 250, 350, 600, 900, 1200, 1500, 2000, 5000] {
            let target = compute_bill(&rates, f64::from(usage), afa).total_before_solar;
            assert_eq!(solve_usage(&rates, target, afa), usage, "usage {usage} afa {afa}");
        }
    }
}

#[test]
fn solver_650_lands_within_tolerance() {
    let rates = rates();
    let usage = solve_usage(&rates, 650.0, 0.0);
    assert_eq!(usage, 1356);
    let bill = compute_bill(&rates, f64::from(usage), 0.0).total_before_solar;
    assert!((bill - 650.0).abs() < 0.5);
}

#[test]
fn solver_dead_zone_returns_nearest_tier_edge() {
    let rates = rates();
    // No usage bills between RM 719.90 (1500 kWh) and RM 880.09 (1501 kWh).
    assert_eq!(solve_usage(&rates, 720.0, 0.0), 1500);
    assert_eq!(solve_usage(&rates, 880.0, 0.0), 1501);
}

#[test]
fn solver_rejects_invalid_targets() {
    let rates = rates();
    assert_eq!(solve_usage(&rates, -10.0, 0.0), 0);
    assert_eq!(solve_usage(&rates, f64::NAN, 0.0), 0);
}

#[test]
fn incentive_adjustment_stays_within_granted_rebate() {
    let rates = rates();
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..1000 {
        let exported: f64 = rng.random_range(0.0..3000.0);
        let usage: f64 = rng.random_range(0.0..1200.0);
        let total: f64 = rng.random_range(-200.0..0.0);
        let adj = adjust_incentive(&rates, exported, usage, total);
        assert!(adj >= 0.0, "adjustment {adj} negative");
        assert!(adj <= total.abs() + 1e-12, "adjustment {adj} exceeds {total}");
    }
}

#[test]
fn variants_agree_without_battery_energy() {
    let rates = rates();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let usage: f64 = rng.random_range(0.0..3000.0);
        let generation: f64 = rng.random_range(0.0..2000.0);
        let day: f64 = rng.random_range(0.0..100.0);
        let afa: f64 = rng.random_range(0.0..6.0);
        let with = compute_savings_with_battery(&rates, usage, generation, day, afa, 0.0);
        let without = compute_savings_no_battery(&rates, usage, generation, day, afa);
        assert_eq!(with.battery_savings, 0.0);
        assert_eq!(with.net_import_kwh, without.net_import_kwh);
        assert_eq!(with.final_bill, without.final_bill);
        assert_eq!(with.total_savings, without.total_savings);
    }
}

#[test]
fn final_bill_never_negative() {
    let rates = rates();
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..500 {
        let inputs = household(
            rng.random_range(0.0..4000.0),
            rng.random_range(0.0..5000.0),
            rng.random_range(0.0..100.0),
            rng.random_range(0.0..10.0),
        );
        let battery = rng.random_bool(0.5).then(|| rng.random_range(0.0..800.0));
        let r = compute_savings(&rates, &inputs, battery);
        assert!(r.final_bill >= 0.0, "negative final bill for {inputs:?}");
        assert!(r.savings_percentage.is_finite());
        assert_eq!(r.net_import_kwh, r.net_import_kwh.round());
    }
}

#[test]
fn zero_usage_gives_zero_percentage() {
    let r = compute_savings_no_battery(&rates(), 0.0, 500.0, 30.0, 0.0);
    assert_eq!(r.bill_without_solar, 0.0);
    assert_eq!(r.savings_percentage, 0.0);
    assert_eq!(r.final_bill, 0.0);
}

#[test]
fn baseline_household_savings() {
    let r = compute_savings(&rates(), &baseline_inputs(), None);
    assert_close(r.self_consumption_kwh, 270.0, "self consumption");
    assert_close(r.exported_solar_kwh, 393.0, "export");
    assert_eq!(r.net_import_kwh, 630.0);
    assert_close(r.bill_without_solar, 418.34, "bill before");
    assert_close(r.incentive_adjustment, 29.475, "incentive adjustment");
    assert_close(r.final_bill, 171.3161, "final bill");
}

#[test]
fn battery_lowers_baseline_bill() {
    let rates = rates();
    let inputs = baseline_inputs();
    let solar_only = compute_savings(&rates, &inputs, None);
    let with_battery = compute_savings(&rates, &inputs, Some(150.0));
    assert_eq!(with_battery.net_import_kwh, 480.0);
    assert_close(with_battery.exported_solar_kwh, 243.0, "export");
    assert_close(with_battery.battery_savings, 150.0 * 0.4443, "battery savings");
    assert_close(with_battery.final_bill, 121.6311, "final bill");
    assert!(with_battery.final_bill < solar_only.final_bill);
}

#[test]
fn excess_export_is_carried_forward() {
    let r = compute_savings_no_battery(&rates(), 300.0, 2000.0, 30.0, 0.0);
    assert_eq!(r.net_import_kwh, 210.0);
    assert_close(r.atap_offset_kwh, 210.0, "offset");
    assert_close(r.carry_forward_kwh, 1700.0, "carry forward");
}
