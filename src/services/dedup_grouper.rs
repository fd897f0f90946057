use tracing::{debug, info};

use crate::models::{DedupIndex, FieldMap, GroupedWork, WorkItem};
use crate::source::{Grid, FIRST_DATA_ROW};

/// 学生数据加载服务
///
/// 从数据起始行扫描到最后一行，按班级分组，(班级, 学号) 只保留第一次出现。
#[derive(Debug, Clone)]
pub struct DedupGrouper {
    first_data_row: u32,
}

impl Default for DedupGrouper {
    fn default() -> Self {
        Self {
            first_data_row: FIRST_DATA_ROW,
        }
    }
}

impl DedupGrouper {
    pub fn new(first_data_row: u32) -> Self {
        Self { first_data_row }
    }

    pub fn load<G: Grid + ?Sized>(&self, grid: &G, field_map: &FieldMap) -> GroupedWork {
        let class_col = field_map.class_column();
        let student_id_col = field_map.student_id_column();
        debug!("班级列: {}, 学号列: {}", class_col, student_id_col);

        let mut work = GroupedWork::default();
        let mut index = DedupIndex::default();

        for row in self.first_data_row..=grid.max_row() {
            let student_id = grid.get_cell(row, student_id_col).as_text();
            if student_id.is_empty() {
                continue;
            }
            let class_code = grid.get_cell(row, class_col).as_text();
            if class_code.is_empty() {
                continue;
            }

            let item = WorkItem::new(row, student_id, class_code);
            if !index.insert(&item) {
                debug!(
                    "  [去重] 跳过重复的 {} - {}（第 {} 行）",
                    item.class_code, item.student_id, row
                );
                work.duplicates += 1;
                continue;
            }
            work.push(item);
        }

        info!(
            "✓ 读取到 {} 个班级，共 {} 位学生（跳过重复 {} 行）",
            work.class_count(),
            work.total_students(),
            work.duplicates
        );
        work
    }
}
