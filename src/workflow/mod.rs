//! 流程层
//!
//! - `state` - 单次运行的状态机
//! - `outcome` - 各阶段的结果值（软失败不走错误通道）

pub mod outcome;
pub mod state;

pub use outcome::{GroupOutcome, ItemOutcome, RunReport, StageOutcome};
pub use state::{StateMachine, WorkflowState};
