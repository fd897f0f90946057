use crate::error::WorkflowError;
use crate::source::grid::{CellValue, Grid};
use crate::source::xlsx::excel_serial_to_datetime;

/// 活动日期单元格（A1）
pub const DATE_CELL: (u32, u32) = (1, 1);
/// 活动代码单元格（A2）
pub const ACTIVITY_CELL: (u32, u32) = (2, 1);
/// 活动名称回写单元格（B3）
pub const ACTIVITY_LABEL_CELL: (u32, u32) = (3, 2);

/// 表头中的事件信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInfo {
    /// yyyy-MM-dd
    pub date: String,
    pub activity_code: String,
}

/// 读取 A1 日期与 A2 活动代码，任一为空即预检失败
pub fn read_event_header<G: Grid + ?Sized>(grid: &G) -> Result<EventInfo, WorkflowError> {
    let date_cell = grid.get_cell(DATE_CELL.0, DATE_CELL.1);
    let activity_cell = grid.get_cell(ACTIVITY_CELL.0, ACTIVITY_CELL.1);

    if date_cell.is_empty() || activity_cell.is_empty() {
        return Err(WorkflowError::Preflight("Excel A1 或 A2 为空".to_string()));
    }

    let date = match &date_cell {
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Date(dt) => dt.format("%Y-%m-%d").to_string(),
        CellValue::Number(serial) => excel_serial_to_datetime(*serial)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .ok_or_else(|| WorkflowError::Preflight(format!("日期转换失败: {}", serial)))?,
        other => {
            return Err(WorkflowError::Preflight(format!(
                "日期转换失败: {}",
                other
            )))
        }
    };

    Ok(EventInfo {
        date,
        activity_code: activity_cell.as_text(),
    })
}
