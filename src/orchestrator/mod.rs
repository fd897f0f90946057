//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 预检（Excel、表头、字段映射、学生数据）
//! - 启动或连接浏览器，创建 `ChromeDriver`
//!
//! ### `controller` - 工作流控制器
//! - 按状态机顺序驱动一次运行
//! - 独占浏览器会话，并保证在任何退出路径上恰好释放一次
//!
//! ### `preflight` - 打开浏览器之前的全部准备
//!
//! ## 层次关系
//!
//! ```text
//! app (预检 + 会话)
//!     ↓
//! controller (状态机)
//!     ↓
//! services (能力层：表单 / 选择 / 匹配 / 回填)
//!     ↓
//! infrastructure (基础设施：UiDriver)
//! ```

pub mod app;
pub mod controller;
pub mod preflight;

// 重新导出主要类型
pub use app::App;
pub use controller::WorkflowController;
pub use preflight::{preflight, RunPlan};
