//! # Performance Upload
//!
//! 将 Excel 名单中的学生批量登记到 SMS 学生表现表单的自动化工具
//!
//! ## 架构设计
//!
//! 本系统沿用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器会话），只暴露能力
//! - `UiDriver` - 远程 UI 的最小操作集合（定位、点击、输入、读取……）
//! - `ChromeDriver` - 基于 chromiumoxide 的唯一 page owner
//! - `wait` - 统一的轮询等待原语
//!
//! ### ② 数据源层（Source）
//! - `source/` - Excel 表格读写、setting.json 侧通道、表头事件信息
//!
//! ### ③ 业务能力层（Services）
//! - `FieldMappingResolver` - 字段映射（表头 → setting.json → 默认）
//! - `DedupGrouper` - 按班级分组并去重
//! - `SelectionResolver` - Select2 选择（搜索 → 直接设值）
//! - `ClassMatcher` - 逐班级匹配学生并点击「添加」
//! - `Reconciler` - 回填奖励类型与备注
//! - `FormService` - 登录、表单填写、名单开关、提交
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 状态机与每个阶段的结果类型
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/controller` - 单次运行的状态机驱动，持有会话并保证释放
//! - `orchestrator/app` - 应用入口：预检、启动浏览器、汇总统计
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod layout;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod source;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, DriverError, SourceError, WorkflowError};
pub use infrastructure::{ChromeDriver, ControlRef, Locator, Signal, UiDriver};
pub use layout::PageLayout;
pub use models::{ClassGroup, FieldMap, GroupedWork, RunCounters, WorkItem};
pub use orchestrator::{App, WorkflowController};
pub use source::{CellValue, Grid, MemoryGrid, XlsxGrid};
pub use workflow::{RunReport, WorkflowState};
