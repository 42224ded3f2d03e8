use crate::analysis::delivery::OnTimeStats;
use crate::analysis::numeric::{kg_to_ton, round2, NumericSum};
use crate::analysis::{group_rows, sort_by_count_desc, ShipmentRow, BLANK_LABEL};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipTypeRow {
    pub ship_type: String,
    pub count: usize,
    pub weight_ton: Option<f64>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipTypeSummary {
    pub rows: Vec<ShipTypeRow>,
    pub total_records: usize,
    pub total_weight_ton: f64,
}

pub fn ship_type_summary(rows: &[ShipmentRow]) -> ShipTypeSummary {
    let mut groups = group_rows(rows, |r| Some(r.ship_type_label().to_string()));
    sort_by_count_desc(&mut groups);

    let rows: Vec<ShipTypeRow> = groups
        .into_iter()
        .map(|(ship_type, members)| {
            // 空白類型只計筆數，重量不列入合計
            let typed: Vec<&ShipmentRow> = members
                .iter()
                .copied()
                .filter(|r| r.ship_type.is_some())
                .collect();
            ShipTypeRow {
                ship_type,
                count: members.len(),
                weight_ton: weight_ton(&typed),
                quantity: quantity(&members),
            }
        })
        .collect();

    let total_records = rows.iter().map(|r| r.count).sum();
    let total_weight_ton = round2(rows.iter().filter_map(|r| r.weight_ton).sum());

    ShipTypeSummary {
        rows,
        total_records,
        total_weight_ton,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub status: String,
    pub count: usize,
}

pub fn status_summary(rows: &[ShipmentRow]) -> Vec<StatusRow> {
    let mut groups = group_rows(rows, |r| {
        Some(r.status.clone().unwrap_or_else(|| BLANK_LABEL.to_string()))
    });
    sort_by_count_desc(&mut groups);
    groups
        .into_iter()
        .map(|(status, members)| StatusRow {
            status,
            count: members.len(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRow {
    pub customer: String,
    pub count: usize,
    pub weight_ton: Option<f64>,
}

/// 出貨筆數最多的前 `top_n` 位客戶
pub fn customer_summary(rows: &[ShipmentRow], top_n: usize) -> Vec<CustomerRow> {
    let mut groups = group_rows(rows, |r| r.customer().map(str::to_string));
    sort_by_count_desc(&mut groups);
    groups
        .into_iter()
        .take(top_n)
        .map(|(customer, members)| CustomerRow {
            customer,
            count: members.len(),
            weight_ton: weight_ton(&members),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRow {
    pub region: String,
    pub count: usize,
    /// 佔全部筆數的百分比
    pub share_percent: f64,
    pub weight_ton: Option<f64>,
    pub on_time: Option<OnTimeStats>,
}

pub fn region_summary(rows: &[ShipmentRow], with_on_time: bool) -> Vec<RegionRow> {
    let total = rows.len();
    let mut groups = group_rows(rows, |r| Some(r.region_label().to_string()));
    sort_by_count_desc(&mut groups);
    groups
        .into_iter()
        .map(|(region, members)| RegionRow {
            region,
            count: members.len(),
            share_percent: if total == 0 {
                0.0
            } else {
                round2(members.len() as f64 * 100.0 / total as f64)
            },
            weight_ton: weight_ton(&members),
            on_time: with_on_time.then(|| OnTimeStats::from_rows(members.iter().copied())),
        })
        .collect()
}

pub(crate) fn weight_ton(members: &[&ShipmentRow]) -> Option<f64> {
    let mut sum = NumericSum::default();
    for row in members {
        sum.add(row.weight_kg);
    }
    sum.value().map(kg_to_ton)
}

pub(crate) fn quantity(members: &[&ShipmentRow]) -> Option<f64> {
    let mut sum = NumericSum::default();
    for row in members {
        sum.add(row.quantity);
    }
    sum.value()
}
