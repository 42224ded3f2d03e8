use crate::analysis::columns::{ColumnRole, ColumnRules, KeywordRule};
use crate::analysis::filter::RecordFilter;
use crate::analysis::{AnalysisOptions, DEFAULT_TOP_CUSTOMERS, DEFAULT_TRIP_PREFIX_LEN};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{InsightError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportConfig,
    pub source: SourceConfig,
    /// 各角色的欄名關鍵字覆寫，例如 `[columns.weight]`
    pub columns: Option<BTreeMap<ColumnRole, KeywordRule>>,
    pub filter: Option<RecordFilter>,
    pub analysis: Option<AnalysisConfig>,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub file: Option<String>,
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub trip_prefix_len: Option<usize>,
    pub top_customers: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_log: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| InsightError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| InsightError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        let file = validation::validate_required_field("source.file", &self.source.file)?;
        validation::validate_path("source.file", file)?;
        validation::validate_file_extension(
            "source.file",
            file,
            validation::SUPPORTED_INPUT_EXTENSIONS,
        )?;

        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_output_formats("load.output_formats", &self.load.output_formats)?;

        if let Some(columns) = &self.columns {
            for (role, rule) in columns {
                if rule.priority.is_empty() && rule.fallback.is_empty() {
                    return Err(InsightError::ConfigValidationError {
                        field: format!("columns.{:?}", role),
                        message: "at least one keyword is required".to_string(),
                    });
                }
            }
        }

        super::validate_analysis(
            "",
            &self.filter.clone().unwrap_or_default(),
            self.trip_prefix_len(),
            self.top_customers(),
        )
    }

    pub fn output_path(&self) -> &str {
        &self.load.output_path
    }

    pub fn trip_prefix_len(&self) -> usize {
        self.analysis
            .as_ref()
            .and_then(|a| a.trip_prefix_len)
            .unwrap_or(DEFAULT_TRIP_PREFIX_LEN)
    }

    pub fn top_customers(&self) -> usize {
        self.analysis
            .as_ref()
            .and_then(|a| a.top_customers)
            .unwrap_or(DEFAULT_TOP_CUSTOMERS)
    }

    pub fn column_rules(&self) -> ColumnRules {
        let mut rules = ColumnRules::default();
        if let Some(columns) = &self.columns {
            for (role, rule) in columns {
                rules = rules.with_override(*role, rule.clone());
            }
        }
        rules
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_log(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_log)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_file(&self) -> &str {
        self.source.file.as_deref().unwrap_or_default()
    }

    fn sheet_name(&self) -> Option<&str> {
        self.source.sheet.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            rules: self.column_rules(),
            filter: self.filter.clone().unwrap_or_default(),
            trip_prefix_len: self.trip_prefix_len(),
            top_customers: self.top_customers(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[report]
name = "monthly-delivery"

[source]
file = "data/出貨明細.xlsx"
sheet = "明細"

[columns.weight]
priority = ["Cu(kg)"]

[filter]
date_from = "2024-01-01"
date_to = "2024-01-31"
regions = ["臺北市", "新北市"]

[analysis]
trip_prefix_len = 8

[load]
output_path = "./output"
output_formats = ["csv", "xlsx"]
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.report.name, "monthly-delivery");
        assert_eq!(config.input_file(), "data/出貨明細.xlsx");
        assert_eq!(config.sheet_name(), Some("明細"));
        assert_eq!(config.trip_prefix_len(), 8);
        assert_eq!(config.top_customers(), DEFAULT_TOP_CUSTOMERS);
        assert!(config.validate().is_ok());

        let options = config.analysis_options();
        assert_eq!(options.filter.date_from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(options.filter.regions.len(), 2);
        assert_eq!(
            options.rules.rule(ColumnRole::Weight).priority,
            vec!["Cu(kg)".to_string()]
        );
        // 未覆寫的角色維持預設
        assert_eq!(
            options.rules.rule(ColumnRole::ShipType),
            ColumnRules::default().rule(ColumnRole::ShipType)
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SHIPMENT_TEST_DATA_DIR", "/srv/uploads");

        let toml_content = r#"
[report]
name = "env"

[source]
file = "${SHIPMENT_TEST_DATA_DIR}/a.csv"

[load]
output_path = "./output"
output_formats = ["csv"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input_file(), "/srv/uploads/a.csv");

        std::env::remove_var("SHIPMENT_TEST_DATA_DIR");
    }

    #[test]
    fn test_missing_source_file_is_invalid() {
        let toml_content = r#"
[report]
name = "no-source"

[source]

[load]
output_path = "./output"
output_formats = ["csv"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(InsightError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_empty_column_override_is_invalid() {
        let toml_content = r#"
[report]
name = "bad-columns"

[source]
file = "a.csv"

[columns.status]
priority = []

[load]
output_path = "./output"
output_formats = ["json"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_role_fails_to_parse() {
        let toml_content = r#"
[report]
name = "x"

[source]
file = "a.csv"

[columns.colour]
priority = ["顏色"]

[load]
output_path = "./output"
output_formats = ["csv"]
"#;

        assert!(TomlConfig::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.report.name, "monthly-delivery");
    }
}
