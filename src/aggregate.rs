use crate::error::DashboardWarning;
use crate::filter::FilteredView;
use crate::loader::{SALES_AVERAGE, SaleRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// The three scalar aggregates shown above the charts
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryMetrics {
    /// Sum of units sold; 0 for an empty view. Wider than a single cell so
    /// that any number of `i64` counts sums without overflow.
    pub total_units: i128,

    /// Sum of total sales; 0 for an empty view
    pub total_sales: f64,

    /// Mean of the sales-average column; NaN when there is nothing to average
    pub average_sales: f64,
}

impl SummaryMetrics {
    /// Reports a NaN average instead of letting it pass for a number
    pub fn warnings(&self) -> Vec<DashboardWarning> {
        if self.average_sales.is_nan() {
            vec![DashboardWarning::EmptyAggregation {
                metric: SALES_AVERAGE.to_string(),
            }]
        } else {
            Vec::new()
        }
    }
}

/// Per-vendor aggregates backing the three bar charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorGroup {
    pub vendor: String,
    pub units_sold: i128,
    pub total_sales: f64,
    pub average_sales: f64,
}

#[derive(Default)]
struct Accumulator {
    units: i128,
    sales: f64,
    average_sum: f64,
    average_count: usize,
}

impl Accumulator {
    fn add(&mut self, record: &SaleRecord) {
        if let Some(units) = record.units_sold {
            self.units = self.units.saturating_add(i128::from(units));
        }
        self.sales += record.total_sales.unwrap_or(0.0);
        if let Some(avg) = record.sales_average {
            self.average_sum += avg;
            self.average_count += 1;
        }
    }

    fn mean(&self) -> f64 {
        if self.average_count == 0 {
            f64::NAN
        } else {
            self.average_sum / self.average_count as f64
        }
    }
}

/// Computes [`SummaryMetrics`] over a filtered view
///
/// Missing numeric cells are skipped, both in the sums and in the mean.
///
/// # Examples
/// ```
/// use dashboard::aggregate::summarize;
/// use dashboard::filter::{FilterOptions, FilterSelection, apply_filter};
/// use dashboard::loader::{RecordTable, SaleRecord};
///
/// let table = RecordTable::from_records(vec![
///     SaleRecord::new(Some("North"), Some("Acme"), Some(10), Some(100.0), Some(100.0)),
///     SaleRecord::new(Some("North"), Some("Acme"), Some(5), Some(50.0), Some(50.0)),
/// ]);
/// let selection = FilterSelection::default_for(&FilterOptions::from_table(&table));
/// let metrics = summarize(&apply_filter(&table, &selection));
///
/// assert_eq!(metrics.total_units, 15);
/// assert_eq!(metrics.total_sales, 150.0);
/// assert_eq!(metrics.average_sales, 75.0);
/// ```
pub fn summarize(view: &FilteredView<'_>) -> SummaryMetrics {
    let mut acc = Accumulator::default();
    for record in view.records() {
        acc.add(record);
    }

    SummaryMetrics {
        total_units: acc.units,
        total_sales: acc.sales,
        average_sales: acc.mean(),
    }
}

/// Groups the view by vendor name
///
/// Groups come out in lexicographic vendor order, so identical input always
/// yields the same sequence. Rows without a vendor belong to no group.
pub fn group_by_vendor(view: &FilteredView<'_>) -> Vec<VendorGroup> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for record in view.records() {
        if let Some(vendor) = record.vendor.as_deref() {
            groups.entry(vendor).or_default().add(record);
        }
    }

    groups
        .into_iter()
        .map(|(vendor, acc)| VendorGroup {
            vendor: vendor.to_string(),
            units_sold: acc.units,
            total_sales: acc.sales,
            average_sales: acc.mean(),
        })
        .collect()
}

/// Warnings for groups whose mean came out NaN
pub fn group_warnings(groups: &[VendorGroup]) -> Vec<DashboardWarning> {
    groups
        .iter()
        .filter(|g| g.average_sales.is_nan())
        .map(|g| DashboardWarning::EmptyAggregation {
            metric: format!("{} for {}", SALES_AVERAGE, g.vendor),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterSelection, VendorChoice, apply_filter};
    use crate::loader::RecordTable;

    fn all_regions(table: &RecordTable) -> FilterSelection {
        FilterSelection {
            regions: table
                .records()
                .iter()
                .filter_map(|r| r.region.clone())
                .collect(),
            vendor: VendorChoice::All,
        }
    }

    #[test]
    fn sums_and_mean_over_view() {
        let table = RecordTable::from_records(vec![
            SaleRecord::new(Some("N"), Some("A"), Some(10), Some(100.0), Some(100.0)),
            SaleRecord::new(Some("N"), Some("B"), Some(5), Some(50.0), Some(50.0)),
        ]);
        let metrics = summarize(&apply_filter(&table, &all_regions(&table)));
        assert_eq!(metrics.total_units, 15);
        assert_eq!(metrics.total_sales, 150.0);
        assert_eq!(metrics.average_sales, 75.0);
        assert!(metrics.warnings().is_empty());
    }

    #[test]
    fn huge_unit_counts_sum_without_overflow() {
        let text = "REGION,NAME,SOLD UNITS,TOTAL SALES,SALES AVERAGE\n\
                    N,A,9000000000000000000,1,1\n\
                    N,A,9000000000000000000,1,1\n";
        let table = crate::loader::parse_sales_csv(text).unwrap();
        let view = apply_filter(&table, &all_regions(&table));

        assert_eq!(summarize(&view).total_units, 18_000_000_000_000_000_000);
        assert_eq!(group_by_vendor(&view)[0].units_sold, 18_000_000_000_000_000_000);
    }

    #[test]
    fn empty_view_gives_zero_sums_and_nan_mean() {
        let table = RecordTable::from_records(vec![SaleRecord::new(
            Some("N"),
            Some("A"),
            Some(10),
            Some(100.0),
            Some(100.0),
        )]);
        let mut selection = all_regions(&table);
        selection.regions.clear();

        let metrics = summarize(&apply_filter(&table, &selection));
        assert_eq!(metrics.total_units, 0);
        assert_eq!(metrics.total_sales, 0.0);
        assert!(metrics.average_sales.is_nan());
        assert_eq!(metrics.warnings().len(), 1);
    }

    #[test]
    fn missing_values_are_skipped() {
        let table = RecordTable::from_records(vec![
            SaleRecord::new(Some("N"), Some("A"), None, Some(10.0), None),
            SaleRecord::new(Some("N"), Some("A"), Some(3), None, Some(4.0)),
        ]);
        let metrics = summarize(&apply_filter(&table, &all_regions(&table)));
        assert_eq!(metrics.total_units, 3);
        assert_eq!(metrics.total_sales, 10.0);
        assert_eq!(metrics.average_sales, 4.0);
    }

    #[test]
    fn groups_are_sorted_by_vendor_name() {
        let table = RecordTable::from_records(vec![
            SaleRecord::new(Some("N"), Some("Globex"), Some(1), Some(10.0), Some(10.0)),
            SaleRecord::new(Some("N"), Some("Acme"), Some(2), Some(20.0), Some(20.0)),
            SaleRecord::new(Some("S"), Some("Globex"), Some(3), Some(30.0), Some(30.0)),
            SaleRecord::new(Some("S"), None, Some(100), Some(1000.0), Some(1000.0)),
            SaleRecord::new(Some("S"), Some("acme"), Some(4), Some(40.0), None),
        ]);
        let view = apply_filter(&table, &all_regions(&table));
        let groups = group_by_vendor(&view);

        let names: Vec<&str> = groups.iter().map(|g| g.vendor.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Globex", "acme"]);

        let globex = &groups[1];
        assert_eq!(globex.units_sold, 4);
        assert_eq!(globex.total_sales, 40.0);
        assert_eq!(globex.average_sales, 20.0);

        assert!(groups[2].average_sales.is_nan());
        assert_eq!(group_warnings(&groups).len(), 1);
    }

    #[test]
    fn grouping_is_deterministic() {
        let table = RecordTable::from_records(vec![
            SaleRecord::new(Some("N"), Some("Zeta"), Some(1), Some(1.5), Some(1.5)),
            SaleRecord::new(Some("N"), Some("Alpha"), Some(2), Some(2.5), Some(2.5)),
            SaleRecord::new(Some("N"), Some("Mid"), Some(3), Some(3.5), Some(3.5)),
        ]);
        let selection = all_regions(&table);
        let first = group_by_vendor(&apply_filter(&table, &selection));
        let second = group_by_vendor(&apply_filter(&table, &selection));
        assert_eq!(first, second);
    }
}
