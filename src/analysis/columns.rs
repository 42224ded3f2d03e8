//! 依欄位名稱關鍵字推測各邏輯欄位對應到哪一個實際欄位。
//!
//! 每個角色有一組優先關鍵字與一組備用關鍵字，依序比對，回傳第一個
//! 欄名包含該關鍵字的欄位。找不到時回傳 `None`，由呼叫端略過相關統計。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    ShipType,
    DueDate,
    SignDate,
    CustomerId,
    CustomerName,
    Address,
    Weight,
    Quantity,
    TripNumber,
    Status,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 10] = [
        ColumnRole::ShipType,
        ColumnRole::DueDate,
        ColumnRole::SignDate,
        ColumnRole::CustomerId,
        ColumnRole::CustomerName,
        ColumnRole::Address,
        ColumnRole::Weight,
        ColumnRole::Quantity,
        ColumnRole::TripNumber,
        ColumnRole::Status,
    ];

    /// 顯示在警告訊息中的中文名稱
    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::ShipType => "出貨申請類型",
            ColumnRole::DueDate => "指定到貨日",
            ColumnRole::SignDate => "簽收日",
            ColumnRole::CustomerId => "客戶代號",
            ColumnRole::CustomerName => "客戶名稱",
            ColumnRole::Address => "送貨地址",
            ColumnRole::Weight => "銅重量",
            ColumnRole::Quantity => "出貨數量",
            ColumnRole::TripNumber => "出庫單號",
            ColumnRole::Status => "出貨狀態",
        }
    }

    fn default_rule(&self) -> KeywordRule {
        match self {
            ColumnRole::ShipType => KeywordRule::new(&["出貨申請類型"], &["出貨類型", "申請類型", "類型"]),
            ColumnRole::DueDate => KeywordRule::new(
                &["指定到貨日", "預計到貨日", "預定到貨日"],
                &["到貨日", "交期", "需求日"],
            ),
            ColumnRole::SignDate => {
                KeywordRule::new(&["簽收日", "簽收時間"], &["簽收", "實際到貨", "送達"])
            }
            ColumnRole::CustomerId => KeywordRule::new(&["客戶代號", "客戶編號"], &["客代", "客編"]),
            ColumnRole::CustomerName => {
                KeywordRule::new(&["客戶名稱", "客戶簡稱"], &["收貨人", "客戶"])
            }
            ColumnRole::Address => KeywordRule::new(&["送貨地址", "收貨地址"], &["地址"]),
            ColumnRole::Weight => KeywordRule::new(&["銅重量"], &["重量"]),
            ColumnRole::Quantity => KeywordRule::new(&["出貨數量"], &["數量"]),
            ColumnRole::TripNumber => KeywordRule::new(&["出庫單號"], &["派車單號", "單號"]),
            ColumnRole::Status => KeywordRule::new(&["出貨狀態", "狀態"], &["狀況"]),
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeywordRule {
    #[serde(default)]
    pub priority: Vec<String>,
    #[serde(default)]
    pub fallback: Vec<String>,
}

impl KeywordRule {
    pub fn new(priority: &[&str], fallback: &[&str]) -> Self {
        Self {
            priority: priority.iter().map(|s| s.to_string()).collect(),
            fallback: fallback.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn keywords(&self) -> impl Iterator<Item = &str> {
        self.priority
            .iter()
            .chain(self.fallback.iter())
            .map(String::as_str)
            .filter(|k| !k.is_empty())
    }
}

/// 全部角色的關鍵字規則
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRules {
    rules: BTreeMap<ColumnRole, KeywordRule>,
}

impl Default for ColumnRules {
    fn default() -> Self {
        Self {
            rules: ColumnRole::ALL
                .iter()
                .map(|role| (*role, role.default_rule()))
                .collect(),
        }
    }
}

impl ColumnRules {
    pub fn rule(&self, role: ColumnRole) -> &KeywordRule {
        // 所有角色都在 Default 中建立，override 只會取代不會移除
        &self.rules[&role]
    }

    /// 以設定檔內容取代某個角色的規則
    pub fn with_override(mut self, role: ColumnRole, rule: KeywordRule) -> Self {
        self.rules.insert(role, rule);
        self
    }
}

/// 推測結果：角色 -> 實際欄名
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    columns: BTreeMap<ColumnRole, String>,
}

impl ColumnMapping {
    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    pub fn contains(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }

    pub fn missing(&self) -> Vec<ColumnRole> {
        ColumnRole::ALL
            .iter()
            .copied()
            .filter(|role| !self.contains(*role))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnRole, &str)> {
        self.columns.iter().map(|(role, col)| (*role, col.as_str()))
    }
}

pub fn guess_column(headers: &[String], rule: &KeywordRule) -> Option<String> {
    rule.keywords()
        .find_map(|keyword| headers.iter().find(|h| h.contains(keyword)))
        .cloned()
}

pub fn infer_columns(headers: &[String], rules: &ColumnRules) -> ColumnMapping {
    let mut columns = BTreeMap::new();
    for role in ColumnRole::ALL {
        match guess_column(headers, rules.rule(role)) {
            Some(column) => {
                tracing::debug!("Column for {:?}: {}", role, column);
                columns.insert(role, column);
            }
            None => tracing::debug!("No column matched for {:?}", role),
        }
    }
    ColumnMapping { columns }
}
