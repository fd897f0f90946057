use tracing::{debug, info, warn};

use crate::models::{FieldMap, FieldMapTier};
use crate::source::{FieldListSource, Grid, HEADER_ROW};

/// setting.json 中字段列表的键
pub const STUDENT_FIELDS_KEY: &str = "student_fields";

/// 字段映射解析服务
///
/// 依次尝试：Excel 表头行 → setting.json → 内置默认。
/// 前一层得到至少一个字段才会停止；任何一层失败都只记日志，不报错。
#[derive(Debug, Clone)]
pub struct FieldMappingResolver {
    header_row: u32,
}

impl Default for FieldMappingResolver {
    fn default() -> Self {
        Self {
            header_row: HEADER_ROW,
        }
    }
}

impl FieldMappingResolver {
    pub fn new(header_row: u32) -> Self {
        Self { header_row }
    }

    /// 解析字段映射，返回结果总是包含四个标准字段
    pub fn resolve(
        &self,
        grid: Option<&dyn Grid>,
        settings: Option<&dyn FieldListSource>,
    ) -> FieldMap {
        let mut map = grid
            .and_then(|g| self.from_header(g))
            .or_else(|| settings.and_then(|s| self.from_settings(s)))
            .unwrap_or_else(|| {
                warn!("⚠️ 使用默认字段顺序");
                FieldMap::default_map()
            });

        let filled = map.fill_canonical();
        if !filled.is_empty() {
            warn!("⚠️ 字段映射缺少 {:?}，已用默认列补齐", filled);
        }

        info!("✓ 字段映射 (来源: {}): {}", map.tier(), map);
        map
    }

    fn from_header(&self, grid: &dyn Grid) -> Option<FieldMap> {
        let pairs: Vec<(String, u32)> = (1..=grid.max_column())
            .filter_map(|col| {
                let name = grid.get_cell(self.header_row, col).as_text();
                (!name.is_empty()).then_some((name, col))
            })
            .collect();

        if pairs.is_empty() {
            warn!("⚠️ Excel 第 {} 行为空，尝试 setting.json", self.header_row);
            return None;
        }

        for (name, col) in &pairs {
            debug!("  [字段] 第 {} 列: {}", col, name);
        }
        Some(FieldMap::from_pairs(pairs, FieldMapTier::HeaderRow))
    }

    fn from_settings(&self, settings: &dyn FieldListSource) -> Option<FieldMap> {
        let fields = match settings.read_list(STUDENT_FIELDS_KEY) {
            Ok(fields) => fields,
            Err(e) => {
                warn!("⚠️ 无法读取字段设置: {}", e);
                return None;
            }
        };

        let map = FieldMap::from_pairs(
            fields.iter().zip(1u32..).map(|(name, col)| (name.as_str(), col)),
            FieldMapTier::Settings,
        );
        (!map.is_empty()).then_some(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::MemoryGrid;

    struct StubSettings(Result<Vec<&'static str>, ()>);

    impl FieldListSource for StubSettings {
        fn read_list(&self, _key: &str) -> Result<Vec<String>, SourceError> {
            match &self.0 {
                Ok(items) => Ok(items.iter().map(|s| s.to_string()).collect()),
                Err(()) => Err(SourceError::NotFound {
                    path: "setting.json".into(),
                }),
            }
        }
    }

    fn assert_canonical(map: &FieldMap) {
        for name in crate::models::field_map::CANONICAL_FIELDS {
            assert!(map.contains(name), "缺少字段 {}", name);
        }
    }

    #[test]
    fn test_header_row_wins() {
        let mut grid = MemoryGrid::new();
        grid.set_row(4, &["StudentID", " Class ", "", "Award"]);
        let settings = StubSettings(Ok(vec!["class", "studentid"]));

        let map = FieldMappingResolver::default().resolve(Some(&grid), Some(&settings));

        assert_eq!(map.tier(), FieldMapTier::HeaderRow);
        assert_eq!(map.get("studentid"), Some(1));
        assert_eq!(map.get("class"), Some(2));
        assert_eq!(map.get("award"), Some(4));
        assert_canonical(&map);
    }

    #[test]
    fn test_empty_header_falls_back_to_settings() {
        let mut grid = MemoryGrid::new();
        grid.set_row(5, &["S3B", "20019"]);
        let settings = StubSettings(Ok(vec!["StudentId", "Class", "Name", "Award"]));

        let map = FieldMappingResolver::default().resolve(Some(&grid), Some(&settings));

        assert_eq!(map.tier(), FieldMapTier::Settings);
        assert_eq!(map.get("studentid"), Some(1));
        assert_eq!(map.get("class"), Some(2));
        assert_canonical(&map);
    }

    #[test]
    fn test_nothing_available_uses_default() {
        let settings = StubSettings(Err(()));
        let map = FieldMappingResolver::default().resolve(None, Some(&settings));
        assert_eq!(map, FieldMap::default_map());

        let empty = StubSettings(Ok(vec![]));
        let map = FieldMappingResolver::default().resolve(Some(&MemoryGrid::new()), Some(&empty));
        assert_eq!(map.tier(), FieldMapTier::Default);
        assert_canonical(&map);
    }

    #[test]
    fn test_partial_header_is_filled() {
        let mut grid = MemoryGrid::new();
        grid.set_row(4, &["", "", "", "", "studentid"]);

        let map = FieldMappingResolver::default().resolve(Some(&grid), None);

        assert_eq!(map.tier(), FieldMapTier::HeaderRow);
        assert_eq!(map.student_id_column(), 5);
        assert_eq!(map.class_column(), 1);
        assert_canonical(&map);
    }

    #[test]
    fn test_student_id_header_alias_survives_fill() {
        let mut grid = MemoryGrid::new();
        grid.set_row(4, &["Name", "Class", "Award", "Student_ID"]);
        grid.set_row(5, &["Tan Mei Ling", "S3B", "Champion", "20019"]);

        let map = FieldMappingResolver::default().resolve(Some(&grid), None);
        assert_eq!(map.student_id_column(), 4);
        assert_eq!(map.class_column(), 2);
        assert_eq!(map.award_column(), 3);

        let work = crate::services::DedupGrouper::default().load(&grid, &map);
        let items = &work.get("S3B").unwrap().items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].student_id, "20019");
    }

    #[test]
    fn test_repeated_header_keeps_last_column() {
        let mut grid = MemoryGrid::new();
        grid.set_row(4, &["class", "studentid", "award", "award"]);

        let map = FieldMappingResolver::default().resolve(Some(&grid), None);

        assert_eq!(map.get("award"), Some(4));
        assert_eq!(map.award_column(), 4);
    }
}
