use chrono::{DateTime, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// 可選的時間部分，例如 ` 14:20`、`T08:00:00`
const TIME_SUFFIX: &str = r"(?:[ T]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?)?";

/// 年/月/日 以 - / . 分隔；3 位數年份視為民國年
static YMD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(\d{{3,4}})[-/.](\d{{1,2}})[-/.](\d{{1,2}}){}$", TIME_SUFFIX))
        .expect("valid date regex")
});

/// 月/日/年，月份不合理時改以日/月/年解讀
static MDY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(\d{{1,2}})[-/.](\d{{1,2}})[-/.](\d{{4}}){}$", TIME_SUFFIX))
        .expect("valid month-first date regex")
});

/// 2024年1月5日、113年1月5日
static CJK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{3,4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日(?:\s*\d{1,2}:\d{2}(?::\d{2})?)?$")
        .expect("valid CJK date regex")
});

static COMPACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").expect("valid compact date regex"));

const ROC_YEAR_OFFSET: i32 = 1911;

/// Excel 序號日期上限 (9999-12-31)
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

/// 文字形式的序號至少要到 1927 年，避免把一般小數字當成日期
const MIN_TEXT_SERIAL: f64 = 10_000.0;

/// 盡力把文字轉成日期，時間部分捨棄；無法解析時回傳 `None`
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    if let Some(caps) = YMD_RE.captures(s).or_else(|| CJK_RE.captures(s)) {
        return ymd_from_captures(&caps[1], &caps[2], &caps[3]);
    }

    if let Some(caps) = MDY_RE.captures(s) {
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, first, second)
            .or_else(|| NaiveDate::from_ymd_opt(year, second, first));
    }

    if let Some(caps) = COMPACT_RE.captures(s) {
        return ymd_from_captures(&caps[1], &caps[2], &caps[3]);
    }

    s.parse::<f64>()
        .ok()
        .filter(|serial| *serial >= MIN_TEXT_SERIAL)
        .and_then(from_excel_serial)
}

fn ymd_from_captures(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let mut y: i32 = year.parse().ok()?;
    if year.len() == 3 {
        y += ROC_YEAR_OFFSET;
    }
    NaiveDate::from_ymd_opt(y, month.parse().ok()?, day.parse().ok()?)
}

/// Excel 以 1899-12-30 為第 0 天
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > EXCEL_MAX_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

pub fn parse_cell_date(value: &serde_json::Value) -> Option<NaiveDate> {
    match value {
        serde_json::Value::String(s) => parse_date(s),
        serde_json::Value::Number(n) => n.as_f64().and_then(from_excel_serial),
        _ => None,
    }
}
