use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("XLSX write error: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Input file '{path}' is empty or has no data rows")]
    EmptyInputError { path: String },

    #[error("Unsupported input file type: {path}")]
    UnsupportedFileError { path: String },

    #[error("Input file '{path}' is {size} bytes, exceeding the {limit} byte limit")]
    InputTooLargeError { path: String, size: u64, limit: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Processing,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl InsightError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            InsightError::ConfigValidationError { .. }
            | InsightError::MissingConfigError { .. }
            | InsightError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            InsightError::EmptyInputError { .. }
            | InsightError::UnsupportedFileError { .. }
            | InsightError::InputTooLargeError { .. }
            | InsightError::CsvError(_)
            | InsightError::SpreadsheetError(_) => ErrorCategory::Input,
            InsightError::SerializationError(_) => ErrorCategory::Processing,
            InsightError::ZipError(_) | InsightError::XlsxWriteError(_) => ErrorCategory::Output,
            InsightError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Processing | ErrorCategory::Output => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            InsightError::ConfigValidationError { field, .. }
            | InsightError::InvalidConfigValueError { field, .. } => {
                format!("請檢查設定項目 '{}' 的值", field)
            }
            InsightError::MissingConfigError { field } => {
                format!("請在命令列或 TOML 設定中提供 '{}'", field)
            }
            InsightError::EmptyInputError { .. } => {
                "請確認上傳檔案包含標題列與至少一筆資料".to_string()
            }
            InsightError::UnsupportedFileError { .. } => {
                "請使用 .csv、.xlsx、.xls 或 .ods 檔案".to_string()
            }
            InsightError::InputTooLargeError { .. } => {
                "請拆分檔案或只匯出需要的期間後再上傳".to_string()
            }
            InsightError::CsvError(_) | InsightError::SpreadsheetError(_) => {
                "請確認檔案格式正確且未損毀".to_string()
            }
            InsightError::IoError(_) => "請確認檔案路徑存在且具有讀寫權限".to_string(),
            InsightError::ZipError(_) | InsightError::XlsxWriteError(_) => {
                "請確認輸出目錄可寫入且磁碟空間足夠".to_string()
            }
            InsightError::SerializationError(_) => {
                "請以 --verbose 重新執行以取得詳細資訊".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("設定錯誤: {}", self),
            ErrorCategory::Input => format!("檔案讀取失敗: {}", self),
            ErrorCategory::Processing => format!("資料處理失敗: {}", self),
            ErrorCategory::Output => format!("報表輸出失敗: {}", self),
            ErrorCategory::System => format!("系統錯誤: {}", self),
        }
    }

    /// 依嚴重程度對應的程序結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_high_severity() {
        let err = InsightError::EmptyInputError {
            path: "empty.csv".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_friendly_message().contains("empty.csv"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err = InsightError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }
}
