use thiserror::Error;

/// 应用程序错误类型
///
/// 只有致命错误会以 `AppError` 的形式向上传播；
/// 班级级 / 学生级的软失败都以结果值的形式留在各自的阶段内。
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器 / 远程 UI 相关错误
    #[error("浏览器错误: {0}")]
    Driver(#[from] DriverError),
    /// Excel / setting.json 相关错误
    #[error("数据源错误: {0}")]
    Source(#[from] SourceError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 流程中止
    #[error("流程错误: {0}")]
    Workflow(#[from] WorkflowError),
}

/// 远程 UI 驱动错误
#[derive(Debug, Error)]
pub enum DriverError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {message}")]
    ConnectionFailed { port: u16, message: String },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 导航失败
    #[error("导航到 {url} 失败: {message}")]
    NavigationFailed { url: String, message: String },
    /// 控件操作失败
    #[error("控件操作失败 ({action}): {message}")]
    ActionFailed {
        action: &'static str,
        message: String,
    },
    /// 控件句柄已经失效（表格重载 / 页面跳转之后）
    #[error("控件句柄已失效: #{id} (第 {generation} 代)")]
    StaleControl { id: u64, generation: u64 },
    /// 等待超时
    #[error("等待 {what} 超时 ({timeout_ms}ms)")]
    Timeout { what: String, timeout_ms: u64 },
    /// 会话已关闭
    #[error("浏览器会话已关闭")]
    SessionClosed,
    /// CDP 协议错误
    #[error("CDP 错误: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// 数据源错误
#[derive(Debug, Error)]
pub enum SourceError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取 Excel 失败
    #[error("读取 Excel 失败 ({path}): {message}")]
    ReadFailed { path: String, message: String },
    /// 写入 Excel 失败
    #[error("写入 Excel 失败 ({path}): {message}")]
    WriteFailed { path: String, message: String },
    /// 工作簿中没有工作表
    #[error("工作簿中没有工作表: {path}")]
    NoWorksheet { path: String },
    /// setting.json 解析失败
    #[error("setting.json 解析失败 ({path}): {source}")]
    SettingsParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

/// 致命的流程错误：中止本次运行，但会话仍会被释放
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// 预检失败（Excel 缺失、A1/A2 为空、没有学生数据）
    #[error("预检失败: {0}")]
    Preflight(String),
    /// 登录被拒绝或超时
    #[error("登录失败: {detail}")]
    LoginRejected { detail: String },
    /// 学生名单按钮不存在，或班级下拉始终没有出现
    #[error("无法打开学生名单: {detail}")]
    ListOpeningFailed { detail: String },
    /// 非法的状态迁移
    #[error("非法的状态迁移: {from} → {to}")]
    InvalidTransition { from: String, to: String },
    /// 被外部中断（Ctrl+C）
    #[error("执行被中断")]
    Interrupted,
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 驱动操作结果类型
pub type DriverResult<T> = Result<T, DriverError>;
