//! Shipment statistics: column inference, normalization and aggregation.

pub mod columns;
pub mod dates;
pub mod delivery;
pub mod filter;
pub mod numeric;
pub mod region;
pub mod report;
pub mod summary;
pub mod trips;

use crate::domain::model::{Record, Table};
use chrono::NaiveDate;
use columns::{ColumnMapping, ColumnRole, ColumnRules};
use filter::RecordFilter;
use std::collections::HashMap;

pub use report::{analyze, ShipmentReport};

/// 空白分類的顯示名稱
pub const BLANK_LABEL: &str = "(空白)";

pub const DEFAULT_TRIP_PREFIX_LEN: usize = 10;
pub const DEFAULT_TOP_CUSTOMERS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub rules: ColumnRules,
    pub filter: RecordFilter,
    pub trip_prefix_len: usize,
    pub top_customers: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            rules: ColumnRules::default(),
            filter: RecordFilter::default(),
            trip_prefix_len: DEFAULT_TRIP_PREFIX_LEN,
            top_customers: DEFAULT_TOP_CUSTOMERS,
        }
    }
}

/// 依欄位對應整理出的單筆出貨資料 (含衍生欄位)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentRow {
    /// 原始檔案列號 (標題為第 1 列)
    pub source_row: usize,
    pub ship_type: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub sign_date: Option<NaiveDate>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub region: Option<&'static str>,
    pub weight_kg: Option<f64>,
    pub quantity: Option<f64>,
    pub trip_number: Option<String>,
    pub status: Option<String>,
}

impl ShipmentRow {
    pub fn from_record(index: usize, record: &Record, mapping: &ColumnMapping) -> Self {
        let value = |role: ColumnRole| mapping.get(role).and_then(|col| record.get(col));
        let text = |role: ColumnRole| value(role).and_then(numeric::cell_text);
        let number = |role: ColumnRole| value(role).and_then(numeric::to_numeric);
        let date = |role: ColumnRole| value(role).and_then(dates::parse_cell_date);

        Self {
            source_row: index + 2,
            ship_type: text(ColumnRole::ShipType),
            due_date: date(ColumnRole::DueDate),
            sign_date: date(ColumnRole::SignDate),
            customer_id: text(ColumnRole::CustomerId),
            customer_name: text(ColumnRole::CustomerName),
            region: text(ColumnRole::Address).and_then(|a| region::extract_region(&a)),
            weight_kg: number(ColumnRole::Weight),
            quantity: number(ColumnRole::Quantity),
            trip_number: text(ColumnRole::TripNumber),
            status: text(ColumnRole::Status),
        }
    }

    pub fn ship_type_label(&self) -> &str {
        self.ship_type.as_deref().unwrap_or(BLANK_LABEL)
    }

    pub fn region_label(&self) -> &str {
        self.region.unwrap_or(region::UNKNOWN_REGION)
    }

    /// 客戶名稱優先，沒有時使用客戶代號
    pub fn customer(&self) -> Option<&str> {
        self.customer_name
            .as_deref()
            .or(self.customer_id.as_deref())
    }
}

pub fn derive_rows(table: &Table, mapping: &ColumnMapping) -> Vec<ShipmentRow> {
    table
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| ShipmentRow::from_record(i, record, mapping))
        .collect()
}

/// 依 key 分組並保留第一次出現的順序，key 為 `None` 的列不列入
pub(crate) fn group_rows<'a, F>(rows: &'a [ShipmentRow], key: F) -> Vec<(String, Vec<&'a ShipmentRow>)>
where
    F: Fn(&ShipmentRow) -> Option<String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&ShipmentRow>)> = Vec::new();

    for row in rows {
        let Some(k) = key(row) else { continue };
        match index.get(&k) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![row]));
            }
        }
    }
    groups
}

/// 依筆數由多到少排序，同筆數維持原順序
pub(crate) fn sort_by_count_desc<T>(groups: &mut [(String, Vec<T>)]) {
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
}
