use crate::domain::model::{ReportCell, ReportTable};
use crate::utils::error::{InsightError, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Excel 工作表名稱上限
const MAX_SHEET_NAME_CHARS: usize = 31;

/// 帶 BOM 的 UTF-8 CSV，Excel 直接開啟中文不會亂碼
pub fn to_csv_bytes(table: &ReportTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(ReportCell::to_csv_field))?;
    }
    writer
        .into_inner()
        .map_err(|e| InsightError::IoError(e.into_error()))
}

/// 所有統計表寫進同一個活頁簿，每張表一個工作表
pub fn to_xlsx_bytes(tables: &[ReportTable]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for table in tables {
        let sheet = workbook.add_worksheet();
        let name: String = table.title.chars().take(MAX_SHEET_NAME_CHARS).collect();
        sheet.set_name(name)?;

        for (col, header) in table.headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }

        for (r, row) in table.rows.iter().enumerate() {
            let row_num = (r + 1) as u32;
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    ReportCell::Text(s) => {
                        sheet.write_string(row_num, c as u16, s)?;
                    }
                    ReportCell::Number(n) => {
                        sheet.write_number(row_num, c as u16, *n)?;
                    }
                    ReportCell::Empty => {}
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn to_zip_bytes(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(name.as_str(), SimpleFileOptions::default())?;
        zip.write_all(data)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample() -> ReportTable {
        let mut t = ReportTable::new("ship_type_summary", "出貨類型統計", &["出貨類型", "筆數", "銅重量(噸)合計"]);
        t.rows.push(vec![
            ReportCell::text("一般"),
            ReportCell::Number(3.0),
            ReportCell::Number(1.5),
        ]);
        t.rows.push(vec![
            ReportCell::text("(空白)"),
            ReportCell::Number(1.0),
            ReportCell::Empty,
        ]);
        t
    }

    #[test]
    fn test_csv_has_bom_and_rows() {
        let bytes = to_csv_bytes(&sample()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "出貨類型,筆數,銅重量(噸)合計");
        assert_eq!(lines[1], "一般,3,1.5");
        assert_eq!(lines[2], "(空白),1,");
    }

    #[test]
    fn test_xlsx_is_readable() {
        use calamine::{open_workbook_auto_from_rs, Reader};

        let bytes = to_xlsx_bytes(&[sample()]).unwrap();
        let mut workbook = open_workbook_auto_from_rs(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["出貨類型統計".to_string()]);

        let range = workbook.worksheet_range("出貨類型統計").unwrap();
        assert_eq!(range.height(), 3);
    }

    #[test]
    fn test_zip_entries() {
        let entries = vec![
            ("a.csv".to_string(), b"x".to_vec()),
            ("summary.json".to_string(), b"{}".to_vec()),
        ];
        let bytes = to_zip_bytes(&entries).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("summary.json")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "{}");
    }
}
