#![cfg(feature = "web")]
use crate::aggregate::VendorGroup;
use crate::demo::{Histogram, NumericTable};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use serde::Serialize;

/// Configuration options for chart generation
///
/// This structure contains all the customizable properties shared by the
/// dashboard charts.
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,

    /// Fill colour of the bars
    pub color: RGBColor,
}

impl Default for GraphOptions {
    /// Creates a default configuration
    ///
    /// # Returns
    /// * `GraphOptions` - 600x400 pixels, blue bars, generic labels
    fn default() -> Self {
        Self {
            title: "Graph".to_string(),
            x_label: "X Axis".to_string(),
            y_label: "Y Axis".to_string(),
            width: 600,
            height: 400,
            color: BLUE,
        }
    }
}

pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
pub const SALMON: RGBColor = RGBColor(250, 128, 114);

/// The three side-by-side vendor charts as SVG documents
#[derive(Debug, Clone, Serialize)]
pub struct VendorCharts {
    pub units: String,
    pub total_sales: String,
    pub average_sales: String,
}

/// Renders units, total sales and average sales per vendor
///
/// # Arguments
/// * `groups` - Vendor groups in display order
///
/// # Returns
/// * A Result containing the three SVG charts or an error
pub fn render_vendor_charts(
    groups: &[VendorGroup],
) -> Result<VendorCharts, Box<dyn std::error::Error>> {
    let labels: Vec<String> = groups.iter().map(|g| g.vendor.clone()).collect();
    let chart = |title: &str, y_label: &str, color: RGBColor, values: Vec<f64>| {
        let options = GraphOptions {
            title: title.to_string(),
            x_label: "Vendor".to_string(),
            y_label: y_label.to_string(),
            color,
            ..GraphOptions::default()
        };
        create_bar_graph(&labels, &values, &options)
    };

    Ok(VendorCharts {
        units: chart(
            "Units Sold by Vendor",
            "Units",
            SKY_BLUE,
            groups.iter().map(|g| g.units_sold as f64).collect(),
        )?,
        total_sales: chart(
            "Total Sales by Vendor",
            "Sales ($)",
            LIGHT_GREEN,
            groups.iter().map(|g| g.total_sales).collect(),
        )?,
        average_sales: chart(
            "Average Sales by Vendor",
            "Average ($)",
            SALMON,
            groups.iter().map(|g| g.average_sales).collect(),
        )?,
    })
}

/// Heights actually drawn: NaN and infinite values draw no bar
pub fn bar_heights(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect()
}

// y axis always includes 0 and is never zero-height
fn value_range(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(0.0_f64, f64::min);
    let hi = values.iter().copied().fold(0.0_f64, f64::max);
    if hi - lo <= 0.0 {
        (lo, lo + 1.0)
    } else {
        (lo, hi * 1.05)
    }
}

/// Creates a categorical bar chart
///
/// Each label gets one bar; labels are drawn under the bar centres.
///
/// # Returns
/// * A Result containing the SVG document or an error
pub fn create_bar_graph(
    labels: &[String],
    values: &[f64],
    options: &GraphOptions,
) -> Result<String, Box<dyn std::error::Error>> {
    let heights = bar_heights(values);
    let (lo, hi) = value_range(&heights);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d((0..labels.len()).into_segmented(), lo..hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                    labels.get(*i).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .draw()?;

        chart.draw_series(
            plotters::series::Histogram::vertical(&chart)
                .style(options.color.filled())
                .margin(10)
                .data(heights.iter().enumerate().map(|(i, &h)| (i, h))),
        )?;

        root.present()?;
    }

    Ok(svg)
}

/// Creates a histogram chart with one bar per bucket
///
/// # Returns
/// * A Result containing the SVG document or an error
pub fn render_histogram(hist: &Histogram) -> Result<String, Box<dyn std::error::Error>> {
    let lo = hist.edges.first().copied().unwrap_or(0.0);
    let hi = hist.edges.last().copied().unwrap_or(1.0);
    let max_count = hist.counts.iter().copied().max().unwrap_or(0).max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (600, 400)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Standard normal sample", ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(lo..hi, 0usize..max_count + 1)?;

        chart.configure_mesh().disable_x_mesh().draw()?;

        chart.draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
            Rectangle::new(
                [(hist.edges[i], 0), (hist.edges[i + 1], count)],
                BLUE.mix(0.6).filled(),
            )
        }))?;

        root.present()?;
    }

    Ok(svg)
}

/// Creates a stacked bar chart of the demo table, one bar per row
///
/// # Returns
/// * A Result containing the SVG document or an error
pub fn render_column_bars(table: &NumericTable) -> Result<String, Box<dyn std::error::Error>> {
    let palette = [SKY_BLUE, LIGHT_GREEN, SALMON];
    let max_total = table
        .rows
        .iter()
        .map(|row| row.iter().sum::<i64>())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (600, 400)).into_drawing_area();
        root.fill(&WHITE)?;

        let rows = table.rows.len();
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(-0.5..rows as f64 - 0.5, 0..max_total + 1)?;

        // one tick per row index
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(rows)
            .x_label_formatter(&|x| {
                if (x - x.round()).abs() < 1e-6 {
                    format!("{}", x.round() as i64)
                } else {
                    String::new()
                }
            })
            .draw()?;

        for (c, name) in table.columns.iter().enumerate() {
            let color = palette[c % palette.len()];
            chart
                .draw_series(table.rows.iter().enumerate().map(|(r, row)| {
                    let base: i64 = row[..c.min(row.len())].iter().sum();
                    let value = row.get(c).copied().unwrap_or(0);
                    let x = r as f64;
                    Rectangle::new([(x - 0.4, base), (x + 0.4, base + value)], color.filled())
                }))?
                .label(name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
    }

    Ok(svg)
}
