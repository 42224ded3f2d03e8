use crate::analysis::report::ShipmentReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 一筆出貨明細，欄位由上傳檔案決定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.data.get(column).filter(|v| !v.is_null())
    }
}

/// 讀入後的整張明細表，保留原始欄位順序
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
    /// 讀檔時的非致命問題 (例如公式錯誤)
    pub warnings: Vec<String>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// 依欄位順序把一列值放進表格，多出來的值會被忽略
    pub fn push_row<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = serde_json::Value>,
    {
        let data = self
            .headers
            .iter()
            .cloned()
            .zip(values)
            .collect::<HashMap<_, _>>();
        self.records.push(Record { data });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportCell {
    Text(String),
    Number(f64),
    Empty,
}

impl ReportCell {
    pub fn text(value: impl Into<String>) -> Self {
        ReportCell::Text(value.into())
    }

    pub fn optional_number(value: Option<f64>) -> Self {
        value.map(ReportCell::Number).unwrap_or(ReportCell::Empty)
    }

    pub fn to_csv_field(&self) -> String {
        match self {
            ReportCell::Text(s) => s.clone(),
            ReportCell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            ReportCell::Empty => String::new(),
        }
    }
}

/// 匯出用的統計表 (一張表對應一個 CSV 或一個工作表)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    /// 檔名主幹，也作為工作表名稱
    pub name: String,
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<ReportCell>>,
}

impl ReportTable {
    pub fn new(name: &str, title: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub report: ShipmentReport,
    pub tables: Vec<ReportTable>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_row_aligns_with_headers() {
        let mut table = Table::new(vec!["出貨類型".to_string(), "銅重量".to_string()]);
        table.push_row(vec![json!("一般"), json!(1200), json!("extra")]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].get("出貨類型"), Some(&json!("一般")));
        assert_eq!(table.records[0].data.len(), 2);
    }

    #[test]
    fn test_record_get_skips_null() {
        let mut table = Table::new(vec!["狀態".to_string()]);
        table.push_row(vec![serde_json::Value::Null]);
        assert!(table.records[0].get("狀態").is_none());
    }

    #[test]
    fn test_report_cell_csv_field() {
        assert_eq!(ReportCell::Number(3.0).to_csv_field(), "3");
        assert_eq!(ReportCell::Number(1.25).to_csv_field(), "1.25");
        assert_eq!(ReportCell::Empty.to_csv_field(), "");
    }
}
