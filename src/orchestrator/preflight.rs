use crate::error::WorkflowError;
use crate::models::{FieldMap, GroupedWork};
use crate::services::{DedupGrouper, FieldMappingResolver};
use crate::source::{read_event_header, EventInfo, FieldListSource, Grid};
use crate::utils::logging;

/// 一次运行所需的全部输入，在打开浏览器之前准备好
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub event: EventInfo,
    pub field_map: FieldMap,
    pub work: GroupedWork,
}

/// 预检：读取表头事件信息、解析字段映射、加载学生
///
/// A1 / A2 为空或没有任何学生数据时返回致命错误
pub fn preflight(
    grid: &dyn Grid,
    settings: Option<&dyn FieldListSource>,
) -> Result<RunPlan, WorkflowError> {
    let event = read_event_header(grid)?;
    let field_map = FieldMappingResolver::default().resolve(Some(grid), settings);
    let work = DedupGrouper::default().load(grid, &field_map);

    if work.is_empty() {
        return Err(WorkflowError::Preflight("Excel 中无学生数据".to_string()));
    }

    logging::log_plan(&event, &work);
    Ok(RunPlan {
        event,
        field_map,
        work,
    })
}
