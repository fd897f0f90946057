use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

use crate::error::SourceError;

/// 单元格的值
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// trim 之后的字符串形式；整数值不带小数部分（20019.0 → "20019"）
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(dt) => dt.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// 表格数据源
///
/// 坐标从 1 开始；越界读取返回 `CellValue::Empty`。
pub trait Grid {
    fn get_cell(&self, row: u32, col: u32) -> CellValue;

    fn set_cell(&mut self, row: u32, col: u32, value: CellValue);

    /// 最后一个有值的行号，空表为 0
    fn max_row(&self) -> u32;

    /// 最后一个有值的列号，空表为 0
    fn max_column(&self) -> u32;

    fn save(&mut self) -> Result<(), SourceError>;
}

/// 内存中的表格
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryGrid {
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从二维数组构建，`rows[0]` 是第 1 行
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = CellValue>,
    {
        let mut grid = Self::new();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                grid.set_cell(r as u32 + 1, c as u32 + 1, value);
            }
        }
        grid
    }

    /// 按行写入一串文本，空串视为空单元格
    pub fn set_row(&mut self, row: u32, values: &[&str]) {
        for (c, value) in values.iter().enumerate() {
            self.set_cell(row, c as u32 + 1, CellValue::from(*value));
        }
    }

    /// 所有非空单元格（行优先）
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.cells.iter().map(|((r, c), v)| (*r, *c, v))
    }
}

impl Grid for MemoryGrid {
    fn get_cell(&self, row: u32, col: u32) -> CellValue {
        self.cells.get(&(row, col)).cloned().unwrap_or_default()
    }

    fn set_cell(&mut self, row: u32, col: u32, value: CellValue) {
        if row == 0 || col == 0 {
            return;
        }
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    fn max_row(&self) -> u32 {
        self.cells.keys().map(|(r, _)| *r).max().unwrap_or(0)
    }

    fn max_column(&self) -> u32 {
        self.cells.keys().map(|(_, c)| *c).max().unwrap_or(0)
    }

    fn save(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}
