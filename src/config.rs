use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fixed relative location of the sales dataset
pub const DEFAULT_DATA_PATH: &str = "./sellers.csv";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds
pub const HISTOGRAM_SAMPLES: usize = 1000;
pub const HISTOGRAM_BINS: usize = 20;

/// Runtime settings for the dashboard server and pipelines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    /// CSV file read once at startup
    pub data_path: PathBuf,

    /// Address the HTTP server listens on
    pub bind_addr: String,

    /// Seconds before an idle session is dropped
    pub session_ttl_secs: u64,

    /// Number of standard-normal draws for the demo histogram
    pub histogram_samples: usize,

    /// Number of equal-width histogram buckets
    pub histogram_bins: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_ttl_secs: SESSION_DURATION,
            histogram_samples: HISTOGRAM_SAMPLES,
            histogram_bins: HISTOGRAM_BINS,
        }
    }
}

impl DashboardConfig {
    /// Builds a config from positional command line arguments
    ///
    /// # Arguments
    /// * `args` - Arguments after the program name: `[data_path] [bind_addr]`
    ///
    /// # Returns
    /// * `DashboardConfig` - Defaults with any supplied positions overridden
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter().map(Into::into);

        if let Some(path) = args.next() {
            config.data_path = PathBuf::from(path);
        }
        if let Some(addr) = args.next() {
            config.bind_addr = addr;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_locations() {
        let config = DashboardConfig::default();
        assert_eq!(config.data_path, PathBuf::from("./sellers.csv"));
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.histogram_samples, 1000);
        assert_eq!(config.histogram_bins, 20);
    }

    #[test]
    fn positional_args_override_defaults() {
        let config = DashboardConfig::from_args(["data/q3.csv"]);
        assert_eq!(config.data_path, PathBuf::from("data/q3.csv"));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);

        let config = DashboardConfig::from_args(["q3.csv", "0.0.0.0:8080"]);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }
}
