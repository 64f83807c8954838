use crate::error::{DashboardError, OptionKind, Result};
use crate::loader::{RecordTable, SaleRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// UI text of the vendor sentinel
pub const ALL_VENDORS: &str = "All";

/// Vendor selection: the "All" sentinel or one exact vendor name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VendorChoice {
    All,
    Vendor(String),
}

impl VendorChoice {
    /// Parses the value a select box sends; the literal "All" is the sentinel
    pub fn parse(value: &str) -> Self {
        if value == ALL_VENDORS {
            VendorChoice::All
        } else {
            VendorChoice::Vendor(value.to_string())
        }
    }

    pub fn matches(&self, vendor: Option<&str>) -> bool {
        match self {
            VendorChoice::All => true,
            VendorChoice::Vendor(name) => vendor == Some(name.as_str()),
        }
    }
}

impl From<String> for VendorChoice {
    fn from(value: String) -> Self {
        VendorChoice::parse(&value)
    }
}

impl From<VendorChoice> for String {
    fn from(choice: VendorChoice) -> Self {
        match choice {
            VendorChoice::All => ALL_VENDORS.to_string(),
            VendorChoice::Vendor(name) => name,
        }
    }
}

/// Values offered by the two filter widgets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Distinct non-null regions in first-appearance order
    pub regions: Vec<String>,

    /// Distinct non-null vendors in first-appearance order
    pub vendors: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &RecordTable) -> Self {
        FilterOptions {
            regions: distinct(table.records().iter().map(|r| r.region.as_deref())),
            vendors: distinct(table.records().iter().map(|r| r.vendor.as_deref())),
        }
    }

    /// Vendor select box entries: the sentinel followed by every vendor
    pub fn vendor_choices(&self) -> Vec<String> {
        std::iter::once(ALL_VENDORS.to_string())
            .chain(self.vendors.iter().cloned())
            .collect()
    }

    /// Checks a region list against the offered options
    pub fn validate_regions(&self, regions: &[String]) -> Result<()> {
        match regions.iter().find(|r| !self.regions.contains(r)) {
            Some(unknown) => Err(DashboardError::UnknownOption {
                kind: OptionKind::Region,
                value: unknown.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Checks a vendor choice against the offered options
    pub fn validate_vendor(&self, vendor: &VendorChoice) -> Result<()> {
        match vendor {
            VendorChoice::Vendor(name) if !self.vendors.contains(name) => {
                Err(DashboardError::UnknownOption {
                    kind: OptionKind::Vendor,
                    value: name.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .flatten()
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Current state of the region multiselect and vendor select box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub regions: BTreeSet<String>,
    pub vendor: VendorChoice,
}

impl FilterSelection {
    /// Initial selection: every region, all vendors
    pub fn default_for(options: &FilterOptions) -> Self {
        FilterSelection {
            regions: options.regions.iter().cloned().collect(),
            vendor: VendorChoice::All,
        }
    }

    pub fn accepts(&self, record: &SaleRecord) -> bool {
        let region_ok = record
            .region
            .as_ref()
            .is_some_and(|region| self.regions.contains(region));
        region_ok && self.vendor.matches(record.vendor.as_deref())
    }
}

/// Rows of a [`RecordTable`] that pass a [`FilterSelection`]; borrows the table
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a RecordTable,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn table(&self) -> &'a RecordTable {
        self.table
    }

    /// Positions of the kept rows in the source table, ascending
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a SaleRecord> + '_ {
        let table = self.table;
        self.indices.iter().filter_map(move |&i| table.get(i))
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Applies the region and vendor predicates to every row
///
/// An empty region set yields an empty view; there is no fallback to "all".
pub fn apply_filter<'a>(table: &'a RecordTable, selection: &FilterSelection) -> FilteredView<'a> {
    let indices = table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| selection.accepts(record))
        .map(|(i, _)| i)
        .collect();

    FilteredView { table, indices }
}
