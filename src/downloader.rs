use crate::error::{DashboardError, Result};
use crate::filter::FilteredView;

/// Convert a filtered view to CSV
///
/// Writes the normalized header row followed by the raw cells of every kept
/// row, quoting as needed.
///
/// # Arguments
/// * `view` - The rows to export
///
/// # Returns
/// * `Result<String>` - CSV content (UTF-8) or an export error
///
/// # Examples
/// ```
/// use dashboard::downloader::to_csv;
/// use dashboard::filter::{FilterOptions, FilterSelection, apply_filter};
/// use dashboard::loader::{RecordTable, SaleRecord};
///
/// let table = RecordTable::from_records(vec![
///     SaleRecord::new(Some("North"), Some("Acme"), Some(3), Some(30.0), Some(10.0)),
/// ]);
/// let selection = FilterSelection::default_for(&FilterOptions::from_table(&table));
/// let csv = to_csv(&apply_filter(&table, &selection)).unwrap();
/// assert!(csv.starts_with("REGION,NAME,SOLD UNITS"));
/// ```
pub fn to_csv(view: &FilteredView<'_>) -> Result<String> {
    let export_error = |e: csv::Error| DashboardError::Export(e.to_string());

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(view.table().headers())
        .map_err(export_error)?;
    for record in view.records() {
        writer.write_record(&record.cells).map_err(export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DashboardError::Export(e.to_string()))
}

/// Convert a filtered view to XLSX format
///
/// Cells that parse as numbers are written as numbers so they stay
/// summable in a spreadsheet; everything else is written as text.
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an export error
#[cfg(feature = "web")]
pub fn to_xlsx(view: &FilteredView<'_>) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let export_error = |e: rust_xlsxwriter::XlsxError| DashboardError::Export(e.to_string());

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (c, header) in view.table().headers().iter().enumerate() {
        worksheet
            .write_string(0, c as u16, header.as_str())
            .map_err(export_error)?;
    }

    for (r, record) in view.records().enumerate() {
        let row = (r + 1) as u32;
        for (c, cell) in record.cells.iter().enumerate() {
            let col = c as u16;
            match cell.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => {
                    worksheet.write_number(row, col, number).map_err(export_error)?;
                }
                _ => {
                    worksheet
                        .write_string(row, col, cell.as_str())
                        .map_err(export_error)?;
                }
            }
        }
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer().map_err(export_error)
}
