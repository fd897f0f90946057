use std::collections::BTreeSet;

use crate::infrastructure::ControlRef;

/// 在表格中匹配到的学生
///
/// `action` 指向行内的「添加」按钮，只在下一次表格变化之前有效。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub student_no: String,
    pub display_name: String,
    pub action: ControlRef,
}

/// 本次运行的统计
///
/// 只增不减，运行期间不会被重置。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunCounters {
    found: usize,
    missing: usize,
    succeeded: BTreeSet<String>,
}

impl RunCounters {
    /// 记录一名成功添加的学生
    pub fn record_found(&mut self, student_id: &str) {
        self.found += 1;
        self.succeeded.insert(student_id.to_string());
    }

    /// 记录 `count` 名未能添加的学生
    pub fn record_missing(&mut self, count: usize) {
        self.missing += count;
    }

    pub fn found(&self) -> usize {
        self.found
    }

    pub fn missing(&self) -> usize {
        self.missing
    }

    /// 本次成功添加的学号
    pub fn succeeded(&self) -> &BTreeSet<String> {
        &self.succeeded
    }
}
