use crate::analysis::columns::{ColumnMapping, ColumnRole};
use crate::analysis::region::normalize_address;
use crate::analysis::ShipmentRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 分析前的篩選條件，全部為選填；有設定的條件都必須符合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// 指定到貨日起 (含)
    pub date_from: Option<NaiveDate>,
    /// 指定到貨日迄 (含)
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub ship_types: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    pub customer_keyword: Option<String>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.ship_types.is_empty()
            && self.regions.is_empty()
            && self.customer_keyword.as_deref().map_or(true, |k| k.trim().is_empty())
    }

    /// 套用篩選；所需欄位不存在時略過該條件並加入警告
    pub fn apply(
        &self,
        rows: Vec<ShipmentRow>,
        mapping: &ColumnMapping,
        warnings: &mut Vec<String>,
    ) -> Vec<ShipmentRow> {
        if self.is_empty() {
            return rows;
        }

        let by_date = (self.date_from.is_some() || self.date_to.is_some())
            && require(mapping, ColumnRole::DueDate, "到貨日期區間", warnings);
        let by_type = !self.ship_types.is_empty()
            && require(mapping, ColumnRole::ShipType, "出貨類型", warnings);
        let by_region =
            !self.regions.is_empty() && require(mapping, ColumnRole::Address, "縣市", warnings);

        let keyword = self
            .customer_keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        let by_customer = keyword.is_some()
            && (mapping.contains(ColumnRole::CustomerName)
                || require(mapping, ColumnRole::CustomerId, "客戶", warnings));

        let regions: Vec<String> = self.regions.iter().map(|r| normalize_address(r)).collect();

        let before = rows.len();
        let kept: Vec<ShipmentRow> = rows
            .into_iter()
            .filter(|row| !by_date || self.date_matches(row.due_date))
            .filter(|row| {
                !by_type
                    || self
                        .ship_types
                        .iter()
                        .any(|t| t.trim() == row.ship_type_label())
            })
            .filter(|row| {
                !by_region
                    || row
                        .region
                        .map_or(false, |r| regions.iter().any(|wanted| wanted == r))
            })
            .filter(|row| match (by_customer, keyword) {
                (true, Some(k)) => {
                    row.customer_name.as_deref().map_or(false, |n| n.contains(k))
                        || row.customer_id.as_deref().map_or(false, |id| id.contains(k))
                }
                _ => true,
            })
            .collect();

        tracing::info!("🔎 Filter kept {} of {} records", kept.len(), before);
        kept
    }

    fn date_matches(&self, date: Option<NaiveDate>) -> bool {
        let Some(date) = date else { return false };
        self.date_from.map_or(true, |from| date >= from) && self.date_to.map_or(true, |to| date <= to)
    }
}

fn require(
    mapping: &ColumnMapping,
    role: ColumnRole,
    criterion: &str,
    warnings: &mut Vec<String>,
) -> bool {
    if mapping.contains(role) {
        return true;
    }
    let message = format!("找不到『{}』欄位，已略過{}篩選。", role.label(), criterion);
    tracing::warn!("{}", message);
    warnings.push(message);
    false
}
