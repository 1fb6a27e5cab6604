//! CSV export of itemised bills and the savings summary.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::savings::SavingsResult;

/// Column header for the bill breakdown export.
const HEADER: &str = "scenario,component,non_service,service,total";

/// Exports both itemised bills and the savings summary to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(result: &SavingsResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(result, buf)
}

/// Writes the savings result as CSV to any writer.
///
/// One row per bill component for the `before` and `after` bills, followed
/// by `summary` rows carrying the savings figures in the `total` column.
/// Output is deterministic for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(result: &SavingsResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for (scenario, bill) in [
        ("before", &result.bill_details),
        ("after", &result.after_solar_bill_details),
    ] {
        for (component, non_service, service, total) in bill.line_items() {
            wtr.write_record([
                scenario.to_string(),
                component.to_string(),
                format!("{non_service:.4}"),
                format!("{service:.4}"),
                format!("{total:.4}"),
            ])?;
        }
    }

    for (name, value) in summary_rows(result) {
        wtr.write_record([
            "summary".to_string(),
            name.to_string(),
            String::new(),
            String::new(),
            format!("{value:.4}"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn summary_rows(r: &SavingsResult) -> [(&'static str, f64); 13] {
    [
        ("generation_kwh", r.monthly_generation_kwh),
        ("self_consumption_kwh", r.self_consumption_kwh),
        ("battery_storage_kwh", r.battery_storage_kwh),
        ("net_import_kwh", r.net_import_kwh),
        ("exported_solar_kwh", r.exported_solar_kwh),
        ("carry_forward_kwh", r.carry_forward_kwh),
        ("atap_export_credit", r.atap_export_credit),
        ("incentive_adjustment", r.incentive_adjustment),
        ("battery_savings", r.battery_savings),
        ("direct_savings", r.direct_savings),
        ("total_savings", r.total_savings),
        ("final_bill", r.final_bill),
        ("savings_percentage", r.savings_percentage),
    ]
}
