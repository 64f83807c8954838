use crate::error::{DashboardError, Result};
use crate::normalize::normalize_headers;
use lazy_static::lazy_static;
use log::{debug, info};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const REGION: &str = "REGION";
pub const NAME: &str = "NAME";
pub const SOLD_UNITS: &str = "SOLD UNITS";
pub const TOTAL_SALES: &str = "TOTAL SALES";
pub const SALES_AVERAGE: &str = "SALES AVERAGE";

/// Canonical headers written by [`RecordTable::from_records`]
pub const REQUIRED_COLUMNS: [&str; 5] = [REGION, NAME, SOLD_UNITS, TOTAL_SALES, SALES_AVERAGE];

lazy_static! {
    /// Cell texts treated as missing values, the same set pandas uses by default.
    static ref NULL_TOKENS: HashSet<&'static str> = [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect();
}

/// One sale row: typed fields for the pipeline plus the raw cells for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    pub region: Option<String>,
    pub vendor: Option<String>,
    pub units_sold: Option<i64>,
    pub total_sales: Option<f64>,
    pub sales_average: Option<f64>,
    /// Every cell of the source row, in header order
    pub cells: Vec<String>,
}

impl SaleRecord {
    /// Builds a record whose raw cells mirror the typed values, laid out in
    /// [`REQUIRED_COLUMNS`] order.
    pub fn new(
        region: Option<&str>,
        vendor: Option<&str>,
        units_sold: Option<i64>,
        total_sales: Option<f64>,
        sales_average: Option<f64>,
    ) -> Self {
        let text = |v: Option<String>| v.unwrap_or_default();
        let cells = vec![
            text(region.map(str::to_string)),
            text(vendor.map(str::to_string)),
            text(units_sold.map(|v| v.to_string())),
            text(total_sales.map(|v| v.to_string())),
            text(sales_average.map(|v| v.to_string())),
        ];

        SaleRecord {
            region: region.map(str::to_string),
            vendor: vendor.map(str::to_string),
            units_sold,
            total_sales,
            sales_average,
            cells,
        }
    }
}

/// Positions of the required columns within a normalized header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub region: usize,
    pub vendor: usize,
    pub units_sold: usize,
    pub total_sales: usize,
    pub sales_average: usize,
}

impl Schema {
    /// Resolves every required column against normalized headers
    ///
    /// # Errors
    /// * `MissingColumn` naming the first required column that is absent
    pub fn resolve(headers: &[String]) -> Result<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| DashboardError::MissingColumn {
                    column: column.to_string(),
                })
        };

        Ok(Schema {
            region: find(REGION)?,
            vendor: find(NAME)?,
            units_sold: find(SOLD_UNITS)?,
            total_sales: find(TOTAL_SALES)?,
            sales_average: find(SALES_AVERAGE)?,
        })
    }
}

/// The loaded sales dataset. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordTable {
    headers: Vec<String>,
    records: Vec<SaleRecord>,
}

impl RecordTable {
    /// Builds a table over the canonical required columns only
    pub fn from_records(records: Vec<SaleRecord>) -> Self {
        RecordTable {
            headers: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&SaleRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load the sales table from a latin-1 encoded CSV file
///
/// Reads the whole file, decodes it as ISO-8859-1, parses it, normalizes the
/// header row and validates the typed schema.
///
/// # Arguments
/// * `path` - Path to the CSV file
///
/// # Returns
/// * `Result<RecordTable>` - The loaded table or a load-time error
///
/// # Examples
/// ```no_run
/// use dashboard::loader::load_sales_table;
///
/// match load_sales_table("./sellers.csv") {
///     Ok(table) => println!("Loaded {} sales records", table.len()),
///     Err(e) => eprintln!("Error loading sales data: {}", e),
/// }
/// ```
pub fn load_sales_table(path: impl AsRef<Path>) -> Result<RecordTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| DashboardError::DataLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let text = decode_latin1(&bytes);
    let table = parse_sales_csv(&text).map_err(|e| match e {
        DashboardError::DataLoad { reason, .. } => DashboardError::DataLoad {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })?;

    info!(
        "Loaded {} sales records from {} ({} columns)",
        table.len(),
        path.display(),
        table.headers().len()
    );
    Ok(table)
}

/// Decodes ISO-8859-1 bytes; every byte is the code point of the same value.
///
/// This is strict latin-1, not windows-1252: 0x80..=0x9F stay C1 controls.
pub fn decode_latin1(bytes: &[u8]) -> Cow<'_, str> {
    encoding_rs::mem::decode_latin1(bytes)
}

/// Parse already-decoded CSV text into a [`RecordTable`]
///
/// # Errors
/// * `DataLoad` - Missing header row or inconsistent column counts
/// * `MissingColumn` - A required column is absent after normalization
/// * `InvalidValue` - A non-null numeric cell does not parse
pub fn parse_sales_csv(text: &str) -> Result<RecordTable> {
    let load_error = |reason: String| DashboardError::DataLoad {
        path: "<memory>".to_string(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let raw_headers = reader.headers().map_err(|e| load_error(e.to_string()))?;
    if raw_headers.is_empty() {
        return Err(load_error("no header row".to_string()));
    }

    let headers = normalize_headers(raw_headers.iter());
    let schema = Schema::resolve(&headers)?;
    debug!("Resolved sales schema {:?}", schema);

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| load_error(e.to_string()))?;
        let cells: Vec<String> = row.iter().map(str::to_string).collect();
        records.push(typed_record(index + 1, &headers, &schema, cells)?);
    }

    Ok(RecordTable { headers, records })
}

fn typed_record(
    row: usize,
    headers: &[String],
    schema: &Schema,
    cells: Vec<String>,
) -> Result<SaleRecord> {
    let invalid = |column: usize, value: &str| DashboardError::InvalidValue {
        row,
        column: headers[column].clone(),
        value: value.to_string(),
    };

    let text = |column: usize| {
        let value = cells[column].as_str();
        (!is_null(value)).then(|| value.to_string())
    };

    let units_sold = match numeric_cell(&cells[schema.units_sold]) {
        None => None,
        Some(value) => Some(parse_units(value).ok_or_else(|| invalid(schema.units_sold, value))?),
    };
    let total_sales = match numeric_cell(&cells[schema.total_sales]) {
        None => None,
        Some(value) => Some(
            value
                .parse::<f64>()
                .map_err(|_| invalid(schema.total_sales, value))?,
        ),
    };
    let sales_average = match numeric_cell(&cells[schema.sales_average]) {
        None => None,
        Some(value) => Some(
            value
                .parse::<f64>()
                .map_err(|_| invalid(schema.sales_average, value))?,
        ),
    };

    Ok(SaleRecord {
        region: text(schema.region),
        vendor: text(schema.vendor),
        units_sold,
        total_sales,
        sales_average,
        cells,
    })
}

pub fn is_null(value: &str) -> bool {
    NULL_TOKENS.contains(value)
}

fn numeric_cell(value: &str) -> Option<&str> {
    let value = value.trim();
    (!is_null(value)).then_some(value)
}

// Units are counts; "12.0" is accepted, "12.5" is not.
fn parse_units(value: &str) -> Option<i64> {
    if let Ok(units) = value.parse::<i64>() {
        return Some(units);
    }
    let float = value.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
 Region ,name,Sold Units,total sales, Sales Average
North,Acme,10,100.0,100.0
South,Globex,5,50.5,50.5
";

    #[test]
    fn parses_and_normalizes_headers() {
        let table = parse_sales_csv(SAMPLE).unwrap();
        assert_eq!(
            table.headers(),
            &["REGION", "NAME", "SOLD UNITS", "TOTAL SALES", "SALES AVERAGE"]
        );
        assert_eq!(table.len(), 2);

        let second = table.get(1).unwrap();
        assert_eq!(second.region.as_deref(), Some("South"));
        assert_eq!(second.vendor.as_deref(), Some("Globex"));
        assert_eq!(second.units_sold, Some(5));
        assert_eq!(second.total_sales, Some(50.5));
        assert_eq!(second.cells[4], "50.5");
    }

    #[test]
    fn extra_columns_are_kept_in_order() {
        let text = "ID,REGION,NAME,SOLD UNITS,TOTAL SALES,SALES AVERAGE\n7,East,Acme,1,2,3\n";
        let table = parse_sales_csv(text).unwrap();
        assert_eq!(table.headers()[0], "ID");
        assert_eq!(table.get(0).unwrap().cells[0], "7");
        assert_eq!(table.get(0).unwrap().region.as_deref(), Some("East"));
    }

    #[test]
    fn missing_column_is_reported_by_canonical_name() {
        let text = "REGION,NAME,SOLD UNITS,TOTAL SALES\nNorth,Acme,1,2\n";
        match parse_sales_csv(text) {
            Err(DashboardError::MissingColumn { column }) => assert_eq!(column, "SALES AVERAGE"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn ragged_rows_fail_to_load() {
        let text = "REGION,NAME,SOLD UNITS,TOTAL SALES,SALES AVERAGE\nNorth,Acme,1,2\n";
        let err = parse_sales_csv(text).unwrap_err();
        assert!(matches!(err, DashboardError::DataLoad { .. }), "{err:?}");
    }

    #[test]
    fn empty_input_fails_to_load() {
        let err = parse_sales_csv("").unwrap_err();
        assert!(err.is_load_error());
    }

    #[test]
    fn null_tokens_become_none() {
        let text = "REGION,NAME,SOLD UNITS,TOTAL SALES,SALES AVERAGE\n,NA,,n/a,NaN\n";
        let record = parse_sales_csv(text).unwrap().get(0).cloned().unwrap();
        assert_eq!(record.region, None);
        assert_eq!(record.vendor, None);
        assert_eq!(record.units_sold, None);
        assert_eq!(record.total_sales, None);
        assert_eq!(record.sales_average, None);
    }

    #[test]
    fn integral_floats_are_accepted_as_units() {
        assert_eq!(parse_units("12.0"), Some(12));
        assert_eq!(parse_units("-3"), Some(-3));
        assert_eq!(parse_units("12.5"), None);
        assert_eq!(parse_units("twelve"), None);
    }

    #[test]
    fn non_numeric_sales_are_rejected() {
        let text = "REGION,NAME,SOLD UNITS,TOTAL SALES,SALES AVERAGE\nNorth,Acme,1,lots,3\n";
        match parse_sales_csv(text) {
            Err(DashboardError::InvalidValue { row, column, value }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "TOTAL SALES");
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn latin1_bytes_decode_one_to_one() {
        assert_eq!(decode_latin1(b"Espa\xf1a"), "España");
        assert_eq!(decode_latin1(&[0xC9, 0x41]), "ÉA");
        assert_eq!(decode_latin1(&[0x80, 0x9F]), "\u{80}\u{9f}");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_sales_table("definitely/not/here.csv").unwrap_err();
        match err {
            DashboardError::DataLoad { path, .. } => assert!(path.ends_with("here.csv")),
            other => panic!("expected DataLoad, got {:?}", other),
        }
    }
}
