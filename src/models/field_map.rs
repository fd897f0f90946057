use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 四个标准字段名
pub const CANONICAL_FIELDS: [&str; 4] = ["class", "studentid", "name", "award"];

/// 字段映射来自哪一层
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMapTier {
    /// Excel 表头行
    HeaderRow,
    /// setting.json 的 student_fields
    Settings,
    /// 内置默认映射
    Default,
}

impl fmt::Display for FieldMapTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldMapTier::HeaderRow => write!(f, "Excel 表头"),
            FieldMapTier::Settings => write!(f, "setting.json"),
            FieldMapTier::Default => write!(f, "默认映射"),
        }
    }
}

/// 字段名（小写）→ 列号（从 1 开始）
///
/// 每次运行只构建一次，之后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    columns: BTreeMap<String, u32>,
    /// 由 `fill_canonical` 补上的字段，别名查找时排在真实字段之后
    filled: BTreeSet<String>,
    tier: FieldMapTier,
}

impl FieldMap {
    /// 由 (字段名, 列号) 构建；字段名统一 trim + 小写，重复字段以最后一次出现为准
    pub fn from_pairs<I, S>(pairs: I, tier: FieldMapTier) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut columns = BTreeMap::new();
        for (name, column) in pairs {
            let key = name.as_ref().trim().to_lowercase();
            if !key.is_empty() {
                columns.insert(key, column);
            }
        }
        Self {
            columns,
            filled: BTreeSet::new(),
            tier,
        }
    }

    /// 内置默认映射：class=1, studentid=2, name=3, award=4
    pub fn default_map() -> Self {
        Self::from_pairs(
            CANONICAL_FIELDS.iter().zip(1u32..).map(|(name, col)| (*name, col)),
            FieldMapTier::Default,
        )
    }

    /// 用默认映射补齐缺失的标准字段，返回被补齐的字段名
    pub fn fill_canonical(&mut self) -> Vec<&'static str> {
        let mut filled = Vec::new();
        for (name, column) in CANONICAL_FIELDS.iter().zip(1u32..) {
            if !self.columns.contains_key(*name) {
                self.columns.insert(name.to_string(), column);
                self.filled.insert(name.to_string());
                filled.push(*name);
            }
        }
        filled
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.columns.get(name).copied()
    }

    /// 依次尝试多个别名，全部缺失时使用默认列
    ///
    /// 补齐的字段不参与别名查找，表头里的 `student_id` 优先于补上的 `studentid`
    pub fn column_or(&self, aliases: &[&str], default: u32) -> u32 {
        aliases
            .iter()
            .filter(|alias| !self.filled.contains(**alias))
            .find_map(|alias| self.get(alias))
            .unwrap_or(default)
    }

    /// 该字段是否由默认映射补齐
    pub fn is_filled(&self, name: &str) -> bool {
        self.filled.contains(name)
    }

    pub fn class_column(&self) -> u32 {
        self.column_or(&["class", "Class"], 1)
    }

    pub fn student_id_column(&self) -> u32 {
        self.column_or(&["studentid", "studentId", "student_id"], 2)
    }

    pub fn award_column(&self) -> u32 {
        self.column_or(&["award", "Award"], 4)
    }

    pub fn tier(&self) -> FieldMapTier {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl fmt::Display for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .columns
            .iter()
            .map(|(name, col)| format!("{}={}", name, col))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
