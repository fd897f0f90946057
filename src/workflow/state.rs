use std::fmt;

use tracing::debug;

use crate::error::WorkflowError;

/// 单次运行的状态
///
/// 严格向前推进；唯一的循环是班级循环（选班 → 匹配学生）。
/// 任何状态都可以直接进入 `Closed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    LoggedOut,
    LoggingIn,
    FormSetup,
    ListOpening,
    SelectingClass,
    MatchingStudents,
    ListClosing,
    Reconciling,
    Submitting,
    AwaitingManualConfirmation,
    Closed,
}

impl WorkflowState {
    /// 是否允许从 `self` 迁移到 `next`
    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;

        if next == Closed {
            return self != Closed;
        }
        matches!(
            (self, next),
            (LoggedOut, LoggingIn)
                | (LoggingIn, FormSetup)
                | (FormSetup, ListOpening)
                | (ListOpening, SelectingClass)
                | (ListOpening, ListClosing)
                // 班级被跳过时直接进入下一个班级或结束循环
                | (SelectingClass, SelectingClass)
                | (SelectingClass, MatchingStudents)
                | (SelectingClass, ListClosing)
                | (MatchingStudents, SelectingClass)
                | (MatchingStudents, ListClosing)
                | (ListClosing, Reconciling)
                | (Reconciling, Submitting)
                | (Submitting, AwaitingManualConfirmation)
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::LoggedOut => "未登录",
            WorkflowState::LoggingIn => "登录中",
            WorkflowState::FormSetup => "填写基本资料",
            WorkflowState::ListOpening => "打开学生名单",
            WorkflowState::SelectingClass => "选择班级",
            WorkflowState::MatchingStudents => "匹配学生",
            WorkflowState::ListClosing => "关闭学生名单",
            WorkflowState::Reconciling => "回填类型与备注",
            WorkflowState::Submitting => "提交",
            WorkflowState::AwaitingManualConfirmation => "等待人工确认",
            WorkflowState::Closed => "已关闭",
        };
        write!(f, "{}", name)
    }
}

/// 状态机，记录经过的全部状态
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: WorkflowState,
    history: Vec<WorkflowState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            state: WorkflowState::LoggedOut,
            history: vec![WorkflowState::LoggedOut],
        }
    }
}

impl StateMachine {
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    pub fn advance(&mut self, next: WorkflowState) -> Result<(), WorkflowError> {
        if !self.state.can_transition_to(next) {
            return Err(WorkflowError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!("状态: {} → {}", self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// 进入 `Closed`；已经关闭时返回 false
    pub fn close(&mut self) -> bool {
        self.advance(WorkflowState::Closed).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.state == WorkflowState::Closed
    }
}
