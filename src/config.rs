use std::time::Duration;

use crate::error::ConfigError;
use crate::infrastructure::WaitPolicy;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// SMS 登录账号
    pub username: String,
    /// SMS 登录密码
    pub password: String,
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 浏览器调试端口（设置后改为连接已打开的浏览器）
    pub browser_debug_port: Option<u16>,
    /// 登录页 URL
    pub login_url: String,
    /// 学生表现录入页 URL
    pub activity_url: String,
    /// Excel 文件路径
    pub excel_file: String,
    /// 字段设置文件路径
    pub setting_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 普通等待超时（毫秒）
    pub wait_timeout_ms: u64,
    /// 登录等待超时（毫秒）
    pub login_timeout_ms: u64,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// Select2 搜索结果等待时间（毫秒）
    pub picker_settle_ms: u64,
    /// 点击「添加」后的稳定时间（毫秒）
    pub action_settle_ms: u64,
    /// 是否把活动名称写回 Excel B3
    pub write_activity_label: bool,
    /// 结束前是否保持浏览器打开，等待操作员确认
    pub hold_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            headless: false,
            browser_debug_port: None,
            login_url: "http://sms.chhsban.edu.my/sms/index.php?r=site/login".to_string(),
            activity_url:
                "http://sms.chhsban.edu.my/sms/index.php?r=transaction/studentPerformance/create"
                    .to_string(),
            excel_file: "Upload.xlsx".to_string(),
            setting_file: "setting.json".to_string(),
            output_log_file: "upload.log".to_string(),
            wait_timeout_ms: 8_000,
            login_timeout_ms: 10_000,
            poll_interval_ms: 200,
            picker_settle_ms: 2_000,
            action_settle_ms: 800,
            write_activity_label: false,
            hold_open: true,
        }
    }
}

impl Config {
    /// 从环境变量加载配置，账号密码为必填项
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            username: required_var("SMS_USERNAME")?,
            password: required_var("SMS_PASSWORD")?,
            headless: presence_var("HEADLESS").unwrap_or(default.headless),
            browser_debug_port: parsed_var("BROWSER_DEBUG_PORT", "u16")?,
            login_url: std::env::var("SMS_LOGIN_URL").unwrap_or(default.login_url),
            activity_url: std::env::var("SMS_ACTIVITY_URL").unwrap_or(default.activity_url),
            excel_file: std::env::var("EXCEL_FILE").unwrap_or(default.excel_file),
            setting_file: std::env::var("SETTING_FILE").unwrap_or(default.setting_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            wait_timeout_ms: parsed_var("WAIT_TIMEOUT_MS", "u64")?
                .unwrap_or(default.wait_timeout_ms),
            login_timeout_ms: parsed_var("LOGIN_TIMEOUT_MS", "u64")?
                .unwrap_or(default.login_timeout_ms),
            poll_interval_ms: parsed_var("POLL_INTERVAL_MS", "u64")?
                .unwrap_or(default.poll_interval_ms),
            picker_settle_ms: parsed_var("PICKER_SETTLE_MS", "u64")?
                .unwrap_or(default.picker_settle_ms),
            action_settle_ms: parsed_var("ACTION_SETTLE_MS", "u64")?
                .unwrap_or(default.action_settle_ms),
            write_activity_label: flag_var("WRITE_ACTIVITY_LABEL").unwrap_or(default.write_activity_label),
            hold_open: flag_var("HOLD_OPEN").unwrap_or(default.hold_open),
        })
    }

    /// 普通控件等待策略
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.wait_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// 登录跳转等待策略
    pub fn login_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.login_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// Select2 搜索结果等待策略
    pub fn picker_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.picker_settle_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_millis(self.action_settle_ms)
    }
}

fn required_var(var_name: &str) -> Result<String, ConfigError> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::EnvVarNotFound {
            var_name: var_name.to_string(),
        }),
    }
}

/// 可选的数值变量：未设置为 `None`，无法解析为错误
fn parsed_var<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    let Ok(value) = std::env::var(var_name) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: expected_type.to_string(),
        })
}

/// 存在即开启：任何非空值（包括 `0`）都为真
fn presence_var(var_name: &str) -> Option<bool> {
    std::env::var(var_name).ok().map(|v| !v.trim().is_empty())
}

/// 布尔开关：`0` / `false` / `no` / 空串为假，其余非空值为真
fn flag_var(var_name: &str) -> Option<bool> {
    let value = std::env::var(var_name).ok()?;
    let normalized = value.trim().to_lowercase();
    Some(!matches!(normalized.as_str(), "" | "0" | "false" | "no" | "off"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policies() {
        let config = Config::default();
        assert_eq!(config.wait_policy().timeout, Duration::from_millis(8_000));
        assert_eq!(config.login_policy().timeout, Duration::from_millis(10_000));
        assert_eq!(config.picker_policy().interval, Duration::from_millis(200));
        assert!(config.hold_open);
        assert!(!config.write_activity_label);
    }

    #[test]
    fn test_flag_var_parsing() {
        std::env::set_var("PERF_UPLOAD_TEST_FLAG_ON", "1");
        std::env::set_var("PERF_UPLOAD_TEST_FLAG_OFF", "false");
        assert_eq!(flag_var("PERF_UPLOAD_TEST_FLAG_ON"), Some(true));
        assert_eq!(flag_var("PERF_UPLOAD_TEST_FLAG_OFF"), Some(false));
        assert_eq!(flag_var("PERF_UPLOAD_TEST_FLAG_MISSING"), None);
    }

    #[test]
    fn test_presence_var_treats_any_value_as_on() {
        std::env::set_var("PERF_UPLOAD_TEST_HEADLESS_ZERO", "0");
        std::env::set_var("PERF_UPLOAD_TEST_HEADLESS_EMPTY", "");
        assert_eq!(presence_var("PERF_UPLOAD_TEST_HEADLESS_ZERO"), Some(true));
        assert_eq!(presence_var("PERF_UPLOAD_TEST_HEADLESS_EMPTY"), Some(false));
        assert_eq!(presence_var("PERF_UPLOAD_TEST_HEADLESS_MISSING"), None);
    }

    #[test]
    fn test_parsed_var() {
        std::env::set_var("PERF_UPLOAD_TEST_PORT", "9222");
        std::env::set_var("PERF_UPLOAD_TEST_BAD_PORT", "abc");

        let port: Option<u16> = parsed_var("PERF_UPLOAD_TEST_PORT", "u16").unwrap();
        assert_eq!(port, Some(9222));

        let missing: Option<u16> = parsed_var("PERF_UPLOAD_TEST_NO_PORT", "u16").unwrap();
        assert_eq!(missing, None);

        let err = parsed_var::<u16>("PERF_UPLOAD_TEST_BAD_PORT", "u16").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { .. }));
    }

    #[test]
    fn test_required_var_missing() {
        let err = required_var("PERF_UPLOAD_TEST_NO_SUCH_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { .. }));
    }
}
