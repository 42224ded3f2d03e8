use crate::domain::model::Table;
use crate::utils::error::{InsightError, Result};
use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 部分寫入器把公式錯誤存成快取字串
const EXCEL_ERROR_LITERALS: &[&str] = &[
    "#DIV/0!", "#N/A", "#NAME?", "#NULL!", "#NUM!", "#REF!", "#VALUE!",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Excel,
}

impl InputFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = std::path::Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") | Some("txt") => Ok(InputFormat::Csv),
            Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => Ok(InputFormat::Excel),
            _ => Err(InsightError::UnsupportedFileError {
                path: path.to_string(),
            }),
        }
    }
}

/// 依副檔名讀入整張表；第一列為欄名
pub fn read_table(path: &str, bytes: Vec<u8>, sheet: Option<&str>) -> Result<Table> {
    let table = match InputFormat::from_path(path)? {
        InputFormat::Csv => read_csv(&bytes)?,
        InputFormat::Excel => read_excel(bytes, sheet)?,
    };

    if table.headers.is_empty() || table.is_empty() {
        return Err(InsightError::EmptyInputError {
            path: path.to_string(),
        });
    }

    tracing::info!(
        "📄 Loaded {} records with {} columns from {}",
        table.len(),
        table.headers.len(),
        path
    );
    Ok(table)
}

/// 非 UTF-8 的檔案視為 Big5 (Excel 另存 CSV 的預設編碼)
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, had_errors) = encoding_rs::BIG5.decode(bytes);
            if had_errors {
                tracing::warn!("CSV is neither valid UTF-8 nor Big5; some characters were replaced");
            } else {
                tracing::debug!("CSV decoded as Big5");
            }
            text.into_owned()
        }
    }
}

pub fn read_csv(bytes: &[u8]) -> Result<Table> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = normalize_headers(reader.headers()?.iter().map(str::to_string));
    let mut table = Table::new(headers);

    for result in reader.records() {
        let record = result?;
        let values: Vec<Value> = record.iter().map(text_value).collect();
        if values.iter().all(Value::is_null) {
            continue;
        }
        table.push_row(values);
    }

    Ok(table)
}

pub fn read_excel(bytes: Vec<u8>, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let range = match sheet {
        Some(name) => workbook.worksheet_range(name)?,
        None => match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => {
                return Err(InsightError::EmptyInputError {
                    path: "(workbook without sheets)".to_string(),
                })
            }
        },
    };

    Ok(table_from_range(&range))
}

/// 第一列為欄名；公式錯誤的儲存格視為空白並加入警告
fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Table::default();
    };
    let headers = normalize_headers(header_row.iter().map(|cell| {
        cell.as_string().unwrap_or_else(|| cell.to_string())
    }));
    let mut table = Table::new(headers);

    let mut error_cells = 0usize;
    for row in rows {
        let values: Vec<Value> = row.iter().map(|cell| excel_value(cell, &mut error_cells)).collect();
        if values.iter().all(Value::is_null) {
            continue;
        }
        table.push_row(values);
    }

    if error_cells > 0 {
        let message = format!("有 {} 個儲存格的公式無法計算，已視為空白。", error_cells);
        tracing::warn!("⚠️ {}", message);
        table.warnings.push(message);
    }

    table
}

fn text_value(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

fn excel_value(cell: &Data, error_cells: &mut usize) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if EXCEL_ERROR_LITERALS.contains(&s.trim()) => {
            *error_cells += 1;
            Value::Null
        }
        Data::String(s) => text_value(s),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(e) => {
            tracing::debug!("Formula error cell: {:?}", e);
            *error_cells += 1;
            Value::Null
        }
        other => match other.as_datetime() {
            Some(dt) => Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => other
                .as_string()
                .map(|s| text_value(&s))
                .unwrap_or(Value::Null),
        },
    }
}

/// 去除 BOM 與前後空白；空白欄名補上序號，重複欄名加上 .1、.2
fn normalize_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.trim_start_matches('\u{feff}').trim().to_string();
            let name = if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            };
            let n = seen.entry(name.clone()).or_insert(0);
            let unique = if *n == 0 {
                name
            } else {
                format!("{}.{}", name, n)
            };
            *n += 1;
            unique
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_format_from_path() {
        assert_eq!(InputFormat::from_path("a.CSV").unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::from_path("出貨.xlsx").unwrap(), InputFormat::Excel);
        assert!(InputFormat::from_path("a.pdf").is_err());
    }

    #[test]
    fn test_read_csv_with_bom_and_blank_cells() {
        let data = "\u{feff} 出貨申請類型 ,銅重量(噸)\n一般,1200\n,\n急件, \n";
        let table = read_csv(data.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["出貨申請類型", "銅重量(噸)"]);
        // 全空白列被略過
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].get("銅重量(噸)"), Some(&json!("1200")));
        assert!(table.records[1].get("銅重量(噸)").is_none());
    }

    #[test]
    fn test_read_csv_big5() {
        let (encoded, _, _) = encoding_rs::BIG5.encode("客戶名稱\n台灣電力\n");
        let table = read_csv(&encoded).unwrap();
        assert_eq!(table.headers, vec!["客戶名稱"]);
        assert_eq!(table.records[0].get("客戶名稱"), Some(&json!("台灣電力")));
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let headers = normalize_headers(
            ["狀態", "", "狀態"].iter().map(|s| s.to_string()),
        );
        assert_eq!(headers, vec!["狀態", "Unnamed: 1", "狀態.1"]);
    }

    #[test]
    fn test_read_table_rejects_header_only_file() {
        let err = read_table("empty.csv", b"a,b\n".to_vec(), None).unwrap_err();
        assert!(matches!(err, InsightError::EmptyInputError { .. }));
    }

    #[test]
    fn test_read_excel_roundtrip_from_writer() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "出庫單號").unwrap();
        sheet.write_string(0, 1, "出貨數量").unwrap();
        sheet.write_string(1, 0, "T001").unwrap();
        sheet.write_number(1, 1, 12.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = read_table("report.xlsx", bytes, None).unwrap();
        assert_eq!(table.headers, vec!["出庫單號", "出貨數量"]);
        assert_eq!(table.records[0].get("出庫單號"), Some(&json!("T001")));
        assert_eq!(
            table.records[0]
                .get("出貨數量")
                .and_then(crate::analysis::numeric::to_numeric),
            Some(12.0)
        );
    }

    fn sheet(cells: &[((u32, u32), Data)]) -> Range<Data> {
        let mut range = Range::new((0, 0), (2, 2));
        for (pos, value) in cells {
            range.set_value(*pos, value.clone());
        }
        range
    }

    #[test]
    fn test_formula_errors_become_blank_with_warning() {
        let range = sheet(&[
            ((0, 0), Data::String("出庫單號".to_string())),
            ((0, 1), Data::String("銅重量(噸)".to_string())),
            ((0, 2), Data::String("簽收日".to_string())),
            ((1, 0), Data::String("T001".to_string())),
            ((1, 1), Data::Error(calamine::CellErrorType::Div0)),
            ((2, 0), Data::String("T002".to_string())),
            ((2, 1), Data::Error(calamine::CellErrorType::Value)),
            ((2, 2), Data::String("#N/A".to_string())),
        ]);

        let table = table_from_range(&range);
        assert_eq!(table.len(), 2);
        assert!(table.records[0].get("銅重量(噸)").is_none());
        assert!(table.records[1].get("簽收日").is_none());
        assert_eq!(table.warnings.len(), 1);
        assert!(table.warnings[0].contains("3 個儲存格"));
    }

    #[test]
    fn test_excel_date_cells_are_rendered_as_text() {
        let range = sheet(&[
            ((0, 0), Data::String("指定到貨日".to_string())),
            ((0, 1), Data::String("簽收日".to_string())),
            (
                (1, 0),
                Data::DateTime(calamine::ExcelDateTime::new(
                    45296.0,
                    calamine::ExcelDateTimeType::DateTime,
                    false,
                )),
            ),
            (
                (1, 1),
                Data::DateTime(calamine::ExcelDateTime::new(
                    45296.5,
                    calamine::ExcelDateTimeType::DateTime,
                    false,
                )),
            ),
            ((2, 0), Data::DateTimeIso("2024-01-08T09:30:00".to_string())),
        ]);

        let table = table_from_range(&range);
        assert!(table.warnings.is_empty());
        assert_eq!(
            table.records[0].get("指定到貨日"),
            Some(&json!("2024-01-05 00:00:00"))
        );
        assert_eq!(
            table.records[0].get("簽收日"),
            Some(&json!("2024-01-05 12:00:00"))
        );
        assert_eq!(
            table.records[1].get("指定到貨日"),
            Some(&json!("2024-01-08 09:30:00"))
        );

        let due = table.records[0]
            .get("指定到貨日")
            .and_then(crate::analysis::dates::parse_cell_date);
        assert_eq!(due, chrono::NaiveDate::from_ymd_opt(2024, 1, 5));
    }
}
