use crate::analysis::summary::{quantity, weight_ton};
use crate::analysis::ShipmentRow;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// 出庫單號取前 `prefix_len` 個字元作為車次代碼
pub fn trip_code(order_number: &str, prefix_len: usize) -> Option<String> {
    let trimmed = order_number.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(prefix_len).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRow {
    pub trip_code: String,
    pub lines: usize,
    pub quantity: Option<f64>,
    pub weight_ton: Option<f64>,
    pub customers: usize,
    pub regions: Vec<String>,
}

pub fn trip_summary(rows: &[ShipmentRow], prefix_len: usize) -> Vec<TripRow> {
    let mut trips: BTreeMap<String, Vec<&ShipmentRow>> = BTreeMap::new();
    for row in rows {
        if let Some(code) = row
            .trip_number
            .as_deref()
            .and_then(|n| trip_code(n, prefix_len))
        {
            trips.entry(code).or_default().push(row);
        }
    }

    trips
        .into_iter()
        .map(|(trip_code, members)| {
            let customers: HashSet<&str> = members.iter().filter_map(|r| r.customer()).collect();
            let mut regions: Vec<String> = Vec::new();
            for region in members.iter().filter_map(|r| r.region) {
                if !regions.iter().any(|r| r == region) {
                    regions.push(region.to_string());
                }
            }

            TripRow {
                trip_code,
                lines: members.len(),
                quantity: quantity(&members),
                weight_ton: weight_ton(&members),
                customers: customers.len(),
                regions,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(order: &str, customer: &str, region: Option<&'static str>, kg: f64, qty: f64) -> ShipmentRow {
        ShipmentRow {
            trip_number: Some(order.to_string()),
            customer_name: Some(customer.to_string()),
            region,
            weight_kg: Some(kg),
            quantity: Some(qty),
            ..Default::default()
        }
    }

    #[test]
    fn test_trip_code_prefix() {
        assert_eq!(trip_code("OUT2024010501-003", 12).as_deref(), Some("OUT202401050"));
        assert_eq!(trip_code(" SHORT ", 10).as_deref(), Some("SHORT"));
        assert_eq!(trip_code("出庫二四一", 2).as_deref(), Some("出庫"));
        assert_eq!(trip_code("  ", 10), None);
    }

    #[test]
    fn test_trip_summary_groups_line_items() {
        let rows = vec![
            line("T240105A-01", "甲", Some("台北市"), 500.0, 2.0),
            line("T240105A-02", "乙", Some("新北市"), 700.0, 1.0),
            line("T240105B-01", "甲", Some("桃園市"), 100.0, 5.0),
            line("T240105A-03", "甲", Some("台北市"), 300.0, 1.0),
            ShipmentRow::default(),
        ];

        let trips = trip_summary(&rows, 8);
        assert_eq!(trips.len(), 2);

        let a = &trips[0];
        assert_eq!(a.trip_code, "T240105A");
        assert_eq!(a.lines, 3);
        assert_eq!(a.quantity, Some(4.0));
        assert_eq!(a.weight_ton, Some(1.5));
        assert_eq!(a.customers, 2);
        assert_eq!(a.regions, vec!["台北市".to_string(), "新北市".to_string()]);

        assert_eq!(trips[1].trip_code, "T240105B");
        assert_eq!(trips[1].weight_ton, Some(0.1));
    }
}
