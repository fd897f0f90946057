//! 各阶段的结果值
//!
//! 软失败不走错误通道，而是以这些值的形式留在阶段内部，由控制器汇总。

use std::fmt;

use serde::Serialize;

/// 尽力而为阶段的结果（表单预填、关闭名单、回填、提交）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub ok: bool,
    pub detail: String,
}

impl StageOutcome {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.ok { "✓" } else { "⚠️" };
        write!(f, "{} {}", mark, self.detail)
    }
}

/// 单个学生的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// 已点击「添加」
    Found {
        student_id: String,
        display_name: String,
    },
    /// 表格中没有这名学生
    RowMissing { student_id: String },
    /// 找到了行，但行内没有「添加」按钮
    ActionMissing { student_id: String },
    /// 点击「添加」失败
    ActionFailed { student_id: String, detail: String },
}

impl ItemOutcome {
    pub fn student_id(&self) -> &str {
        match self {
            ItemOutcome::Found { student_id, .. }
            | ItemOutcome::RowMissing { student_id }
            | ItemOutcome::ActionMissing { student_id }
            | ItemOutcome::ActionFailed { student_id, .. } => student_id,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ItemOutcome::Found { .. })
    }
}

/// 单个班级的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GroupOutcome {
    /// 班级已选中，逐个学生处理完毕
    Processed {
        class_code: String,
        items: Vec<ItemOutcome>,
    },
    /// 班级下拉中没有匹配的选项，整组计为未找到
    ClassNotFound { class_code: String, size: usize },
    /// 选中班级后表格始终没有出现，整组计为未找到
    TableTimeout { class_code: String, size: usize },
}

impl GroupOutcome {
    pub fn class_code(&self) -> &str {
        match self {
            GroupOutcome::Processed { class_code, .. }
            | GroupOutcome::ClassNotFound { class_code, .. }
            | GroupOutcome::TableTimeout { class_code, .. } => class_code,
        }
    }

    pub fn found(&self) -> usize {
        match self {
            GroupOutcome::Processed { items, .. } => items.iter().filter(|i| i.is_found()).count(),
            _ => 0,
        }
    }

    pub fn missing(&self) -> usize {
        match self {
            GroupOutcome::Processed { items, .. } => {
                items.iter().filter(|i| !i.is_found()).count()
            }
            GroupOutcome::ClassNotFound { size, .. } | GroupOutcome::TableTimeout { size, .. } => {
                *size
            }
        }
    }
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub found: usize,
    pub missing: usize,
    pub duplicates: usize,
    /// 活动名称；未找到时为 "not found"
    pub activity_label: Option<String>,
    pub groups: Vec<GroupOutcome>,
    pub reconciled: usize,
    pub submitted: bool,
    pub interrupted: bool,
    /// 致命错误的描述
    pub aborted: Option<String>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && !self.interrupted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_counts() {
        let processed = GroupOutcome::Processed {
            class_code: "S3B".into(),
            items: vec![
                ItemOutcome::Found {
                    student_id: "1".into(),
                    display_name: "A".into(),
                },
                ItemOutcome::RowMissing {
                    student_id: "2".into(),
                },
                ItemOutcome::ActionFailed {
                    student_id: "3".into(),
                    detail: "boom".into(),
                },
            ],
        };
        assert_eq!(processed.found(), 1);
        assert_eq!(processed.missing(), 2);

        let skipped = GroupOutcome::ClassNotFound {
            class_code: "S9Z".into(),
            size: 4,
        };
        assert_eq!(skipped.found(), 0);
        assert_eq!(skipped.missing(), 4);
        assert_eq!(skipped.class_code(), "S9Z");
    }

    #[test]
    fn test_stage_outcome_display() {
        assert_eq!(StageOutcome::ok("已提交").to_string(), "✓ 已提交");
        assert!(!StageOutcome::failed("x").ok);
    }

    #[test]
    fn test_report_serializes_tagged_outcomes() {
        let report = RunReport {
            found: 0,
            missing: 2,
            groups: vec![GroupOutcome::TableTimeout {
                class_code: "S1A".into(),
                size: 2,
            }],
            ..Default::default()
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["missing"], 2);
        assert_eq!(json["groups"][0]["outcome"], "table_timeout");
        assert_eq!(json["groups"][0]["class_code"], "S1A");
        assert!(json["aborted"].is_null());
    }
}
