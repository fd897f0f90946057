//! 数据源层
//!
//! - `grid` - 表格读写接口与内存实现
//! - `xlsx` - Excel 工作簿
//! - `settings` - setting.json 侧通道
//! - `event_header` - 表头中的事件信息（A1 日期 / A2 活动代码）

pub mod event_header;
pub mod grid;
pub mod settings;
pub mod xlsx;

pub use event_header::{read_event_header, EventInfo};
pub use grid::{CellValue, Grid, MemoryGrid};
pub use settings::{FieldListSource, SettingsFile};
pub use xlsx::XlsxGrid;

/// 表头所在行
pub const HEADER_ROW: u32 = 4;

/// 学生数据起始行
pub const FIRST_DATA_ROW: u32 = 5;
