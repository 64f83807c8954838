//! The two dashboard pipelines as plain functions over their inputs.
//!
//! Sales: load -> normalize -> filter -> aggregate -> present.
//! Demo: numeric table -> histogram -> dessert table -> favourite lookup.

use crate::aggregate::{SummaryMetrics, VendorGroup, group_by_vendor, group_warnings, summarize};
use crate::demo::{
    DessertTable, Histogram, NumericTable, favorite_dessert, sample_standard_normal,
};
use crate::error::{DashboardWarning, Result};
use crate::filter::{FilterOptions, FilterSelection, apply_filter};
use crate::format::{format_currency, format_units};
use crate::loader::{RecordTable, load_sales_table};
use log::{debug, warn};
use rand::Rng;
use serde::Serialize;
use std::path::Path;

/// One labelled scalar as shown in the metrics row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDisplay {
    pub label: &'static str,
    pub value: String,
}

/// Everything the sales page renders for one selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub headers: Vec<String>,
    /// Raw cells of the filtered rows, in source order
    pub rows: Vec<Vec<String>>,
    pub metrics: SummaryMetrics,
    pub metric_displays: Vec<MetricDisplay>,
    pub groups: Vec<VendorGroup>,
    pub warnings: Vec<DashboardWarning>,
}

/// Loader plus normalizer: the first two stages of the sales pipeline
pub fn load_stage(path: impl AsRef<Path>) -> Result<(RecordTable, FilterOptions)> {
    let table = load_sales_table(path)?;
    let options = FilterOptions::from_table(&table);
    Ok((table, options))
}

/// Outcome of the load stage, kept for the lifetime of the server
#[derive(Debug, Clone)]
pub enum SalesData {
    Loaded {
        table: RecordTable,
        options: FilterOptions,
    },
    /// No sales dashboard is rendered; the message is shown instead
    Failed { message: String },
}

impl SalesData {
    pub fn load(path: impl AsRef<Path>) -> Self {
        match load_stage(path) {
            Ok((table, options)) => SalesData::Loaded { table, options },
            Err(e) => {
                warn!("Sales data unavailable: {}", e);
                SalesData::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    pub fn from_table(table: RecordTable) -> Self {
        let options = FilterOptions::from_table(&table);
        SalesData::Loaded { table, options }
    }

    /// Options offered by the filter widgets; empty when loading failed
    pub fn options(&self) -> FilterOptions {
        match self {
            SalesData::Loaded { options, .. } => options.clone(),
            SalesData::Failed { .. } => FilterOptions {
                regions: Vec::new(),
                vendors: Vec::new(),
            },
        }
    }
}

/// Filter, aggregate and format for one selection
pub fn run_sales_pipeline(table: &RecordTable, selection: &FilterSelection) -> SalesReport {
    let view = apply_filter(table, selection);
    let metrics = summarize(&view);
    let groups = group_by_vendor(&view);
    debug!(
        "Sales pipeline kept {} of {} rows in {} vendor groups",
        view.len(),
        table.len(),
        groups.len()
    );

    let mut warnings = metrics.warnings();
    warnings.extend(group_warnings(&groups));

    SalesReport {
        headers: table.headers().to_vec(),
        rows: view.records().map(|r| r.cells.clone()).collect(),
        metric_displays: metric_displays(&metrics),
        metrics,
        groups,
        warnings,
    }
}

pub fn metric_displays(metrics: &SummaryMetrics) -> Vec<MetricDisplay> {
    vec![
        MetricDisplay {
            label: "Total Units Sold",
            value: format_units(metrics.total_units),
        },
        MetricDisplay {
            label: "Total Sales",
            value: format_currency(metrics.total_sales),
        },
        MetricDisplay {
            label: "Average Sales",
            value: format_currency(metrics.average_sales),
        },
    ]
}

/// Everything the demo page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoReport {
    pub numbers: NumericTable,
    pub histogram: Histogram,
    pub desserts: DessertTable,
    /// Favourite dessert, absent when the lookup failed
    pub favorite: Option<String>,
    /// Why the favourite could not be computed
    pub favorite_error: Option<String>,
}

/// Runs the demo pipeline against the session's dessert table
///
/// A failed favourite lookup is reported in the report; the table and
/// histogram still render.
pub fn run_demo_pipeline<R: Rng + ?Sized>(
    desserts: &DessertTable,
    rng: &mut R,
    samples: usize,
    bins: usize,
) -> DemoReport {
    let values = sample_standard_normal(rng, samples);
    let histogram = Histogram::from_samples(&values, bins);

    let (favorite, favorite_error) = match favorite_dessert(desserts) {
        Ok(name) => (Some(name.to_string()), None),
        Err(e) => (None, Some(e.to_string())),
    };

    DemoReport {
        numbers: NumericTable::sample(),
        histogram,
        desserts: desserts.clone(),
        favorite,
        favorite_error,
    }
}
