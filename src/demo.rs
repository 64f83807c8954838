use crate::error::{DashboardError, Result};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Small fixed numeric table shown and bar-charted by the demo page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericTable {
    pub columns: Vec<String>,
    /// Row-major values, one inner vector per row
    pub rows: Vec<Vec<i64>>,
}

impl NumericTable {
    /// The 4x3 table with columns A=1..4, B=5..8, C=9..12
    pub fn sample() -> Self {
        NumericTable {
            columns: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            rows: (0..4).map(|r| vec![1 + r, 5 + r, 9 + r]).collect(),
        }
    }

    pub fn column(&self, index: usize) -> Vec<i64> {
        self.rows.iter().filter_map(|row| row.get(index).copied()).collect()
    }
}

/// Draws `count` values from the standard normal distribution
pub fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<f64> {
    (0..count).map(|_| rng.sample(StandardNormal)).collect()
}

/// Equal-width histogram over a sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` bucket boundaries, ascending
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Buckets `values` into `bins` equal-width bins spanning min..=max
    ///
    /// Every bucket is half-open except the last, which also takes the
    /// maximum. A constant sample spans `v - 0.5 ..= v + 0.5`, an empty one
    /// `0 ..= 1`. Non-finite values are ignored.
    pub fn from_samples(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

        let (mut lo, mut hi) = finite
            .iter()
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 1.0));
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0; bins];
        for v in finite {
            let bucket = (((v - lo) / width) as usize).min(bins - 1);
            counts[bucket] += 1;
        }

        Histogram { edges, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// One row of the editable dessert table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dessert {
    pub name: String,
    pub rating: i64,
    pub is_widget: bool,
}

impl Dessert {
    pub fn new(name: &str, rating: i64, is_widget: bool) -> Self {
        Dessert {
            name: name.to_string(),
            rating,
            is_widget,
        }
    }
}

/// Working copy of the dessert table owned by one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DessertTable {
    pub rows: Vec<Dessert>,
}

impl Default for DessertTable {
    fn default() -> Self {
        DessertTable {
            rows: vec![
                Dessert::new("pastel", 4, true),
                Dessert::new("helado", 5, false),
                Dessert::new("galleta", 3, true),
            ],
        }
    }
}

/// A single change made through the editable grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DessertEdit {
    SetName { row: usize, name: String },
    SetRating { row: usize, rating: i64 },
    SetWidget { row: usize, is_widget: bool },
    AddRow { dessert: Dessert },
    DeleteRow { row: usize },
}

impl DessertTable {
    pub fn new(rows: Vec<Dessert>) -> Self {
        DessertTable { rows }
    }

    /// Returns a copy of the table with `edit` applied
    ///
    /// # Errors
    /// * `RowOutOfRange` - The edit addresses a row that does not exist
    pub fn apply(&self, edit: &DessertEdit) -> Result<DessertTable> {
        let mut next = self.clone();
        let len = next.rows.len();
        let out_of_range = |row: usize| DashboardError::RowOutOfRange { row, len };

        match edit {
            DessertEdit::SetName { row, name } => {
                next.rows.get_mut(*row).ok_or_else(|| out_of_range(*row))?.name = name.clone();
            }
            DessertEdit::SetRating { row, rating } => {
                next.rows.get_mut(*row).ok_or_else(|| out_of_range(*row))?.rating = *rating;
            }
            DessertEdit::SetWidget { row, is_widget } => {
                next.rows.get_mut(*row).ok_or_else(|| out_of_range(*row))?.is_widget = *is_widget;
            }
            DessertEdit::AddRow { dessert } => next.rows.push(dessert.clone()),
            DessertEdit::DeleteRow { row } => {
                if *row >= len {
                    return Err(out_of_range(*row));
                }
                next.rows.remove(*row);
            }
        }

        Ok(next)
    }
}

/// Name of the highest-rated dessert
///
/// Ties go to the earliest row.
///
/// # Errors
/// * `EmptyTable` - The table has no rows
pub fn favorite_dessert(table: &DessertTable) -> Result<&str> {
    let mut best: Option<&Dessert> = None;
    for dessert in &table.rows {
        if best.is_none_or(|b| dessert.rating > b.rating) {
            best = Some(dessert);
        }
    }
    best.map(|d| d.name.as_str()).ok_or(DashboardError::EmptyTable)
}
