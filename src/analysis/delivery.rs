use crate::analysis::ShipmentRow;
use chrono::NaiveDate;
use serde::Serialize;

/// 簽收日不晚於指定到貨日即為準時 (同一天算準時)
pub fn is_on_time(due: NaiveDate, signed: NaiveDate) -> bool {
    signed <= due
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OnTimeStats {
    pub total_records: usize,
    /// 兩個日期都能解析的筆數
    pub valid_records: usize,
    pub on_time: usize,
    pub late: usize,
    /// 準時率 (0-1)，沒有有效筆數時為 `None`
    pub rate: Option<f64>,
}

impl OnTimeStats {
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a ShipmentRow>,
    {
        let mut stats = OnTimeStats::default();
        for row in rows {
            stats.total_records += 1;
            if let (Some(due), Some(signed)) = (row.due_date, row.sign_date) {
                stats.valid_records += 1;
                if is_on_time(due, signed) {
                    stats.on_time += 1;
                } else {
                    stats.late += 1;
                }
            }
        }
        stats.rate =
            (stats.valid_records > 0).then(|| stats.on_time as f64 / stats.valid_records as f64);
        stats
    }

    pub fn rate_percent(&self) -> Option<f64> {
        self.rate.map(|r| crate::analysis::numeric::round2(r * 100.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LateDelivery {
    pub source_row: usize,
    pub trip_number: Option<String>,
    pub customer: Option<String>,
    pub due_date: NaiveDate,
    pub sign_date: NaiveDate,
    pub days_late: i64,
}

/// 逾期明細，依逾期天數由多到少
pub fn late_deliveries(rows: &[ShipmentRow]) -> Vec<LateDelivery> {
    let mut late: Vec<LateDelivery> = rows
        .iter()
        .filter_map(|row| {
            let (due, signed) = (row.due_date?, row.sign_date?);
            (!is_on_time(due, signed)).then(|| LateDelivery {
                source_row: row.source_row,
                trip_number: row.trip_number.clone(),
                customer: row.customer().map(str::to_string),
                due_date: due,
                sign_date: signed,
                days_late: (signed - due).num_days(),
            })
        })
        .collect();
    late.sort_by(|a, b| b.days_late.cmp(&a.days_late));
    late
}
