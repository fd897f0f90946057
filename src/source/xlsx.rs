//! Excel 工作簿适配
//!
//! 读取用 calamine，写回用 rust_xlsxwriter。写回只保留单元格的值，
//! 原有的格式、公式和其他工作表都不会被保留。

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, info};

use crate::error::SourceError;
use crate::source::grid::{CellValue, Grid, MemoryGrid};

/// Excel 序列日期的零点（1899-12-30）
fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Excel 序列日期 → 日期时间
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    excel_epoch().checked_add_signed(Duration::milliseconds(millis))
}

/// 日期时间 → Excel 序列日期
pub fn datetime_to_excel_serial(datetime: &NaiveDateTime) -> f64 {
    (*datetime - excel_epoch()).num_milliseconds() as f64 / 86_400_000.0
}

fn convert(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(dt.as_f64())),
    }
}

/// 基于 Excel 文件的表格，只读写第一个工作表
#[derive(Debug, Clone)]
pub struct XlsxGrid {
    path: PathBuf,
    sheet_name: String,
    cells: MemoryGrid,
}

impl XlsxGrid {
    /// 打开工作簿并把第一个工作表读入内存
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        if !path.exists() {
            return Err(SourceError::NotFound { path: path_str });
        }

        let read_failed = |message: String| SourceError::ReadFailed {
            path: path_str.clone(),
            message,
        };

        let mut workbook = open_workbook_auto(path).map_err(|e| read_failed(e.to_string()))?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SourceError::NoWorksheet {
                path: path_str.clone(),
            })?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| read_failed(e.to_string()))?;

        let mut cells = MemoryGrid::new();
        if let Some((start_row, start_col)) = range.start() {
            for (r, c, data) in range.used_cells() {
                cells.set_cell(
                    start_row + r as u32 + 1,
                    start_col + c as u32 + 1,
                    convert(data),
                );
            }
        }

        info!(
            "✓ 已读取 Excel: {} (工作表: {}, {} 行)",
            path_str,
            sheet_name,
            cells.max_row()
        );

        Ok(Self {
            path: path.to_path_buf(),
            sheet_name,
            cells,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }
}

impl Grid for XlsxGrid {
    fn get_cell(&self, row: u32, col: u32) -> CellValue {
        self.cells.get_cell(row, col)
    }

    fn set_cell(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.set_cell(row, col, value);
    }

    fn max_row(&self) -> u32 {
        self.cells.max_row()
    }

    fn max_column(&self) -> u32 {
        self.cells.max_column()
    }

    fn save(&mut self) -> Result<(), SourceError> {
        let path_str = self.path.display().to_string();
        let write_failed = |e: rust_xlsxwriter::XlsxError| SourceError::WriteFailed {
            path: path_str.clone(),
            message: e.to_string(),
        };

        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name).map_err(write_failed)?;

        for (row, col, value) in self.cells.cells() {
            let (r, c) = (row - 1, (col - 1) as u16);
            match value {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(r, c, s).map_err(write_failed)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(r, c, *n).map_err(write_failed)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b).map_err(write_failed)?;
                }
                CellValue::Date(dt) => {
                    worksheet
                        .write_number_with_format(r, c, datetime_to_excel_serial(dt), &date_format)
                        .map_err(write_failed)?;
                }
            }
        }

        workbook.save(&self.path).map_err(write_failed)?;
        debug!("已保存 Excel: {}", path_str);
        Ok(())
    }
}
