use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the dashboard core.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Which filter widget an option belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OptionKind {
    Region,
    Vendor,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Region => write!(f, "region"),
            OptionKind::Vendor => write!(f, "vendor"),
        }
    }
}

/// Errors raised by the dashboard pipelines.
///
/// Load-time variants (`DataLoad`, `MissingColumn`, `InvalidValue`) abort the
/// sales pipeline entirely. The rest are contained to the computation or
/// event that produced them.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to load {path}: {reason}")]
    DataLoad { path: String, reason: String },

    #[error("required column {column:?} not found after normalization")]
    MissingColumn { column: String },

    #[error("row {row}: column {column:?} has non-numeric value {value:?}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("cannot look up a favourite in an empty table")]
    EmptyTable,

    #[error("unknown {kind} option {value:?}")]
    UnknownOption { kind: OptionKind, value: String },

    #[error("row {row} out of range for table with {len} rows")]
    RowOutOfRange { row: usize, len: usize },

    #[error("export failed: {0}")]
    Export(String),
}

impl DashboardError {
    /// True for errors that leave no usable sales data for the run.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            DashboardError::DataLoad { .. }
                | DashboardError::MissingColumn { .. }
                | DashboardError::InvalidValue { .. }
        )
    }
}

/// Non-fatal conditions reported next to a computed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardWarning {
    /// A mean was taken over zero values and is NaN.
    EmptyAggregation { metric: String },
}

impl fmt::Display for DashboardWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardWarning::EmptyAggregation { metric } => {
                write!(f, "{metric} is undefined: no values to average")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_are_classified() {
        let err = DashboardError::MissingColumn {
            column: "REGION".to_string(),
        };
        assert!(err.is_load_error());
        assert!(!DashboardError::EmptyTable.is_load_error());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = DashboardError::UnknownOption {
            kind: OptionKind::Vendor,
            value: "Acme".to_string(),
        };
        assert_eq!(err.to_string(), "unknown vendor option \"Acme\"");

        let warning = DashboardWarning::EmptyAggregation {
            metric: "SALES AVERAGE".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "SALES AVERAGE is undefined: no values to average"
        );
    }
}
