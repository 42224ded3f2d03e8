use serde_json::Value;

/// 等同 `to_numeric(errors="coerce")`：無法轉換就是 `None`
pub fn to_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 欄位實際單位為 kg，報表以噸顯示
pub fn kg_to_ton(kg: f64) -> f64 {
    round2(kg / 1000.0)
}

/// 儲存格顯示文字 (去除前後空白)，空值回傳 `None`
pub fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// 加總時只計算可轉為數值的項目，全部無效時回傳 `None` (同 `sum(min_count=1)`)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericSum {
    total: f64,
    count: usize,
}

impl NumericSum {
    pub fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.total += v;
            self.count += 1;
        }
    }

    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then_some(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_numeric_coerces() {
        assert_eq!(to_numeric(&json!(12.5)), Some(12.5));
        assert_eq!(to_numeric(&json!(" 1,234.5 ")), Some(1234.5));
        assert_eq!(to_numeric(&json!("N/A")), None);
        assert_eq!(to_numeric(&json!("")), None);
        assert_eq!(to_numeric(&json!(null)), None);
    }

    #[test]
    fn test_kg_to_ton_rounds_to_two_places() {
        assert_eq!(kg_to_ton(1234.0), 1.23);
        assert_eq!(kg_to_ton(1236.0), 1.24);
        assert_eq!(kg_to_ton(0.0), 0.0);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!(" A01 ")), Some("A01".to_string()));
        assert_eq!(cell_text(&json!(1001.0)), Some("1001".to_string()));
        assert_eq!(cell_text(&json!("  ")), None);
        assert_eq!(cell_text(&json!(null)), None);
    }

    #[test]
    fn test_numeric_sum_min_count() {
        let mut sum = NumericSum::default();
        assert_eq!(sum.value(), None);
        sum.add(None);
        assert_eq!(sum.value(), None);
        sum.add(Some(2.0));
        sum.add(Some(3.5));
        assert_eq!(sum.value(), Some(5.5));
    }
}
