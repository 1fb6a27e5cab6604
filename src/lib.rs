//! Residential tiered-tariff billing and ATAP solar savings estimation.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// CSV export of bill breakdowns and savings.
pub mod io;
pub mod runner;
/// Solar savings engine and system sizing.
pub mod savings;
/// Tariff rates, bill computation, usage solving and incentive policy.
pub mod tariff;
