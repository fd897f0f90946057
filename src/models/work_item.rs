use std::collections::{BTreeMap, HashSet};

/// 一条待处理的学生记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Excel 行号（从 1 开始）
    pub source_row: u32,
    pub student_id: String,
    pub class_code: String,
}

impl WorkItem {
    pub fn new(source_row: u32, student_id: impl Into<String>, class_code: impl Into<String>) -> Self {
        Self {
            source_row,
            student_id: student_id.into(),
            class_code: class_code.into(),
        }
    }

    /// 去重键：(班级, 学号)
    pub fn key(&self) -> (String, String) {
        (self.class_code.clone(), self.student_id.clone())
    }
}

/// 同一班级的学生，按首次出现顺序排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassGroup {
    pub class_code: String,
    pub items: Vec<WorkItem>,
}

impl ClassGroup {
    pub fn new(class_code: impl Into<String>) -> Self {
        Self {
            class_code: class_code.into(),
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 已见过的 (班级, 学号) 集合
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: HashSet<(String, String)>,
}

impl DedupIndex {
    /// 首次出现返回 true；重复出现返回 false 且不改变已有记录
    pub fn insert(&mut self, item: &WorkItem) -> bool {
        self.seen.insert(item.key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// 分组后的全部工作
///
/// 班级按班级代码排序遍历（BTreeMap），组内保持插入顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedWork {
    pub groups: BTreeMap<String, ClassGroup>,
    /// 被丢弃的重复行数
    pub duplicates: usize,
}

impl GroupedWork {
    pub fn push(&mut self, item: WorkItem) {
        self.groups
            .entry(item.class_code.clone())
            .or_insert_with(|| ClassGroup::new(item.class_code.clone()))
            .items
            .push(item);
    }

    pub fn class_count(&self) -> usize {
        self.groups.len()
    }

    pub fn total_students(&self) -> usize {
        self.groups.values().map(ClassGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassGroup> {
        self.groups.values()
    }

    pub fn get(&self, class_code: &str) -> Option<&ClassGroup> {
        self.groups.get(class_code)
    }
}
