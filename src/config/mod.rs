pub mod cli;
pub mod toml_config;

use crate::analysis::filter::RecordFilter;
use crate::analysis::{AnalysisOptions, DEFAULT_TOP_CUSTOMERS, DEFAULT_TRIP_PREFIX_LEN};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{InsightError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "shipment-insight")]
#[command(about = "Shipment statistics from an uploaded delivery spreadsheet")]
pub struct CliConfig {
    #[arg(long, help = "Input spreadsheet (.csv, .xlsx, .xls, .ods)")]
    pub input: String,

    #[arg(long, help = "Worksheet name (defaults to the first sheet)")]
    pub sheet: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "csv,xlsx,json")]
    pub formats: Vec<String>,

    #[arg(long, help = "Earliest due date to include (YYYY-MM-DD)")]
    pub date_from: Option<NaiveDate>,

    #[arg(long, help = "Latest due date to include (YYYY-MM-DD)")]
    pub date_to: Option<NaiveDate>,

    #[arg(long, value_delimiter = ',')]
    pub ship_types: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    #[arg(long, help = "Keep only customers whose name or id contains this text")]
    pub customer: Option<String>,

    #[arg(long, default_value_t = DEFAULT_TRIP_PREFIX_LEN)]
    pub trip_prefix_len: usize,

    #[arg(long, default_value_t = DEFAULT_TOP_CUSTOMERS)]
    pub top_customers: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_log: bool,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn filter(&self) -> RecordFilter {
        RecordFilter {
            date_from: self.date_from,
            date_to: self.date_to,
            ship_types: self.ship_types.clone(),
            regions: self.regions.clone(),
            customer_keyword: self.customer.clone(),
        }
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_file(&self) -> &str {
        &self.input
    }

    fn sheet_name(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            filter: self.filter(),
            trip_prefix_len: self.trip_prefix_len,
            top_customers: self.top_customers,
            ..Default::default()
        }
    }
}

/// CLI 與 TOML 共用的篩選與分析參數檢查
pub(crate) fn validate_analysis(
    field_prefix: &str,
    filter: &RecordFilter,
    trip_prefix_len: usize,
    top_customers: usize,
) -> Result<()> {
    validation::validate_range(
        &format!("{}trip_prefix_len", field_prefix),
        trip_prefix_len,
        1,
        64,
    )?;
    validation::validate_positive_number(&format!("{}top_customers", field_prefix), top_customers, 1)?;

    if let Some(keyword) = &filter.customer_keyword {
        validation::validate_non_empty_string(&format!("{}customer", field_prefix), keyword)?;
    }

    if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
        if from > to {
            return Err(InsightError::ConfigValidationError {
                field: format!("{}date_from", field_prefix),
                message: format!("date_from {} is after date_to {}", from, to),
            });
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_file_extension(
            "input",
            &self.input,
            validation::SUPPORTED_INPUT_EXTENSIONS,
        )?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_output_formats("formats", &self.formats)?;
        validate_analysis("", &self.filter(), self.trip_prefix_len, self.top_customers)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["shipment-insight"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--input", "出貨.xlsx"]);
        assert_eq!(config.output_path, "./output");
        assert_eq!(config.formats, vec!["csv", "xlsx", "json"]);
        assert_eq!(config.trip_prefix_len, DEFAULT_TRIP_PREFIX_LEN);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_filter_flags() {
        let config = parse(&[
            "--input",
            "a.csv",
            "--date-from",
            "2024-01-01",
            "--date-to",
            "2024-01-31",
            "--ship-types",
            "一般,急件",
            "--regions",
            "臺北市",
        ]);
        let options = config.analysis_options();
        assert_eq!(options.filter.ship_types, vec!["一般", "急件"]);
        assert_eq!(options.filter.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reversed_date_range_is_invalid() {
        let config = parse(&[
            "--input",
            "a.csv",
            "--date-from",
            "2024-02-01",
            "--date-to",
            "2024-01-01",
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_input_and_format() {
        assert!(parse(&["--input", "a.pdf"]).validate().is_err());
        assert!(parse(&["--input", "a.csv", "--formats", "tsv"]).validate().is_err());
        assert!(parse(&["--input", "a.csv", "--trip-prefix-len", "0"]).validate().is_err());
    }
}
