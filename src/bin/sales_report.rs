#![cfg(not(tarpaulin_include))]

use dashboard::config::DEFAULT_DATA_PATH;
use dashboard::filter::FilterSelection;
use dashboard::format::{format_currency, format_units};
use dashboard::pipeline::{load_stage, run_sales_pipeline};
use std::env;
use std::process::ExitCode;

// Prints the sales summary for the default selection (every region, all vendors).
fn main() -> ExitCode {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());

    let (table, options) = match load_stage(&path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Load failure: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let selection = FilterSelection::default_for(&options);
    let report = run_sales_pipeline(&table, &selection);

    println!("Rows: {} of {}", report.rows.len(), table.len());
    for metric in &report.metric_displays {
        println!("{:<18} {}", metric.label, metric.value);
    }

    println!();
    println!("{:<24} {:>12} {:>16} {:>16}", "Vendor", "Units", "Total Sales", "Average Sales");
    for group in &report.groups {
        println!(
            "{:<24} {:>12} {:>16} {:>16}",
            group.vendor,
            format_units(group.units_sold),
            format_currency(group.total_sales),
            format_currency(group.average_sales)
        );
    }

    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }

    ExitCode::SUCCESS
}
