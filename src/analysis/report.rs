use crate::analysis::columns::{infer_columns, ColumnMapping, ColumnRole};
use crate::analysis::delivery::{late_deliveries, LateDelivery, OnTimeStats};
use crate::analysis::summary::{
    customer_summary, region_summary, ship_type_summary, status_summary, CustomerRow, RegionRow,
    ShipTypeSummary, StatusRow,
};
use crate::analysis::trips::{trip_summary, TripRow};
use crate::analysis::{derive_rows, AnalysisOptions};
use crate::domain::model::{ReportCell, ReportTable, Table};
use serde::Serialize;

/// 一次分析的完整結果；缺少欄位的統計為 `None` 並附上警告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentReport {
    pub source_records: usize,
    pub analysed_records: usize,
    pub columns: ColumnMapping,
    pub ship_types: Option<ShipTypeSummary>,
    pub on_time: Option<OnTimeStats>,
    pub late_deliveries: Vec<LateDelivery>,
    pub regions: Option<Vec<RegionRow>>,
    pub trips: Option<Vec<TripRow>>,
    pub statuses: Option<Vec<StatusRow>>,
    pub customers: Option<Vec<CustomerRow>>,
    pub warnings: Vec<String>,
}

fn missing_column_warning(role: ColumnRole, section: &str) -> String {
    format!(
        "找不到『{}』欄位，已略過{}。請確認上傳檔案欄名。",
        role.label(),
        section
    )
}

pub fn analyze(table: &Table, options: &AnalysisOptions) -> ShipmentReport {
    let mapping = infer_columns(&table.headers, &options.rules);
    let mut warnings: Vec<String> = table.warnings.clone();

    let rows = derive_rows(table, &mapping);
    let rows = options.filter.apply(rows, &mapping, &mut warnings);

    let mut require = |roles: &[ColumnRole], section: &str| -> bool {
        let mut ok = true;
        for role in roles {
            if !mapping.contains(*role) {
                let message = missing_column_warning(*role, section);
                tracing::warn!("⚠️ {}", message);
                warnings.push(message);
                ok = false;
            }
        }
        ok
    };

    let ship_types = require(&[ColumnRole::ShipType], "出貨類型統計")
        .then(|| ship_type_summary(&rows));

    let has_dates = require(&[ColumnRole::DueDate, ColumnRole::SignDate], "準時率統計");
    let on_time = has_dates.then(|| OnTimeStats::from_rows(&rows));
    let late = if has_dates {
        late_deliveries(&rows)
    } else {
        Vec::new()
    };

    let regions = require(&[ColumnRole::Address], "縣市分佈統計")
        .then(|| region_summary(&rows, has_dates));

    let trips = require(&[ColumnRole::TripNumber], "車次裝載統計")
        .then(|| trip_summary(&rows, options.trip_prefix_len));

    // 狀態與客戶為補充統計，缺欄位時不提示
    let statuses = mapping
        .contains(ColumnRole::Status)
        .then(|| status_summary(&rows));
    let customers = (mapping.contains(ColumnRole::CustomerName)
        || mapping.contains(ColumnRole::CustomerId))
    .then(|| customer_summary(&rows, options.top_customers));

    if let Some(stats) = &on_time {
        tracing::info!(
            "🚚 On-time: {}/{} valid records ({} late)",
            stats.on_time,
            stats.valid_records,
            stats.late
        );
    }

    ShipmentReport {
        source_records: table.len(),
        analysed_records: rows.len(),
        columns: mapping,
        ship_types,
        on_time,
        late_deliveries: late,
        regions,
        trips,
        statuses,
        customers,
        warnings,
    }
}

fn count(n: usize) -> ReportCell {
    ReportCell::Number(n as f64)
}

fn join_or_empty(values: &[String]) -> ReportCell {
    if values.is_empty() {
        ReportCell::Empty
    } else {
        ReportCell::text(values.join("、"))
    }
}

impl ShipmentReport {
    /// 轉成可匯出的統計表
    pub fn to_tables(&self) -> Vec<ReportTable> {
        let mut tables = vec![self.overview_table()];

        if let Some(summary) = &self.ship_types {
            let mut t = ReportTable::new(
                "ship_type_summary",
                "出貨類型統計",
                &["出貨類型", "筆數", "銅重量(噸)合計", "出貨數量合計"],
            );
            for row in &summary.rows {
                t.rows.push(vec![
                    ReportCell::text(&row.ship_type),
                    count(row.count),
                    ReportCell::optional_number(row.weight_ton),
                    ReportCell::optional_number(row.quantity),
                ]);
            }
            tables.push(t);
        }

        if let Some(regions) = &self.regions {
            let mut t = ReportTable::new(
                "region_summary",
                "縣市分佈",
                &["縣市", "筆數", "占比(%)", "銅重量(噸)合計", "有效筆數", "準時筆數", "準時率(%)"],
            );
            for row in regions {
                let stats = row.on_time.as_ref();
                t.rows.push(vec![
                    ReportCell::text(&row.region),
                    count(row.count),
                    ReportCell::Number(row.share_percent),
                    ReportCell::optional_number(row.weight_ton),
                    ReportCell::optional_number(stats.map(|s| s.valid_records as f64)),
                    ReportCell::optional_number(stats.map(|s| s.on_time as f64)),
                    ReportCell::optional_number(stats.and_then(|s| s.rate_percent())),
                ]);
            }
            tables.push(t);
        }

        if !self.late_deliveries.is_empty() {
            let mut t = ReportTable::new(
                "late_deliveries",
                "逾期明細",
                &["列號", "出庫單號", "客戶", "指定到貨日", "簽收日", "逾期天數"],
            );
            for late in &self.late_deliveries {
                t.rows.push(vec![
                    count(late.source_row),
                    late.trip_number
                        .as_deref()
                        .map(ReportCell::text)
                        .unwrap_or(ReportCell::Empty),
                    late.customer
                        .as_deref()
                        .map(ReportCell::text)
                        .unwrap_or(ReportCell::Empty),
                    ReportCell::text(late.due_date.format("%Y-%m-%d").to_string()),
                    ReportCell::text(late.sign_date.format("%Y-%m-%d").to_string()),
                    ReportCell::Number(late.days_late as f64),
                ]);
            }
            tables.push(t);
        }

        if let Some(trips) = &self.trips {
            let mut t = ReportTable::new(
                "trip_summary",
                "車次裝載",
                &["車次", "明細筆數", "出貨數量合計", "銅重量(噸)合計", "客戶數", "縣市"],
            );
            for trip in trips {
                t.rows.push(vec![
                    ReportCell::text(&trip.trip_code),
                    count(trip.lines),
                    ReportCell::optional_number(trip.quantity),
                    ReportCell::optional_number(trip.weight_ton),
                    count(trip.customers),
                    join_or_empty(&trip.regions),
                ]);
            }
            tables.push(t);
        }

        if let Some(statuses) = &self.statuses {
            let mut t = ReportTable::new("status_summary", "出貨狀態", &["狀態", "筆數"]);
            for row in statuses {
                t.rows.push(vec![ReportCell::text(&row.status), count(row.count)]);
            }
            tables.push(t);
        }

        if let Some(customers) = &self.customers {
            let mut t = ReportTable::new(
                "customer_summary",
                "主要客戶",
                &["客戶", "筆數", "銅重量(噸)合計"],
            );
            for row in customers {
                t.rows.push(vec![
                    ReportCell::text(&row.customer),
                    count(row.count),
                    ReportCell::optional_number(row.weight_ton),
                ]);
            }
            tables.push(t);
        }

        tables
    }

    fn overview_table(&self) -> ReportTable {
        let mut t = ReportTable::new("overview", "總覽", &["項目", "數值"]);
        let mut kpi = |label: &str, value: ReportCell| {
            t.rows.push(vec![ReportCell::text(label), value]);
        };

        kpi("原始資料筆數", count(self.source_records));
        kpi("資料筆數", count(self.analysed_records));
        if let Some(summary) = &self.ship_types {
            kpi("總銅重量(噸)", ReportCell::Number(summary.total_weight_ton));
        }
        if let Some(stats) = &self.on_time {
            kpi("有效筆數", count(stats.valid_records));
            kpi("準時筆數", count(stats.on_time));
            kpi("逾期筆數", count(stats.late));
            kpi("準時率(%)", ReportCell::optional_number(stats.rate_percent()));
        }
        if let Some(trips) = &self.trips {
            kpi("車次數", count(trips.len()));
        }
        for (role, column) in self.columns.iter() {
            kpi(&format!("欄位:{}", role.label()), ReportCell::text(column));
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(headers: &[&str], rows: Vec<Vec<serde_json::Value>>) -> Table {
        let mut t = Table::new(headers.iter().map(|s| s.to_string()).collect());
        for row in rows {
            t.push_row(row);
        }
        t
    }

    #[test]
    fn test_missing_columns_produce_warnings_not_errors() {
        let t = table(&["出貨申請類型"], vec![vec![json!("一般")], vec![json!(null)]]);
        let report = analyze(&t, &AnalysisOptions::default());

        assert!(report.ship_types.is_some());
        assert!(report.on_time.is_none());
        assert!(report.regions.is_none());
        assert!(report.trips.is_none());
        // 日期兩欄 + 地址 + 出庫單號
        assert_eq!(report.warnings.len(), 4);
        assert!(report.warnings[0].contains("指定到貨日"));
    }

    #[test]
    fn test_full_report_tables() {
        let t = table(
            &["出庫單號", "客戶名稱", "送貨地址", "出貨申請類型", "指定到貨日", "簽收日", "銅重量(噸)"],
            vec![
                vec![
                    json!("T001-1"),
                    json!("甲"),
                    json!("臺北市信義區"),
                    json!("一般"),
                    json!("2024/01/05"),
                    json!("2024/01/05"),
                    json!(1200),
                ],
                vec![
                    json!("T001-2"),
                    json!("乙"),
                    json!("新北市板橋區"),
                    json!("急件"),
                    json!("2024/01/05"),
                    json!("2024/01/08"),
                    json!(800),
                ],
            ],
        );
        let options = AnalysisOptions {
            trip_prefix_len: 4,
            ..Default::default()
        };
        let report = analyze(&t, &options);

        assert!(report.warnings.is_empty());
        assert_eq!(report.ship_types.as_ref().unwrap().total_weight_ton, 2.0);
        assert_eq!(report.on_time.unwrap().rate, Some(0.5));
        assert_eq!(report.late_deliveries[0].days_late, 3);
        assert_eq!(report.trips.as_ref().unwrap().len(), 1);

        let names: Vec<String> = report.to_tables().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "overview",
                "ship_type_summary",
                "region_summary",
                "late_deliveries",
                "trip_summary",
                "customer_summary"
            ]
        );
    }
}
