use std::sync::OnceLock;

use regex::Regex;

/// 表格行的内部 ID
///
/// 从行的 class 属性中提取，用来拼出该行「奖励分数类型」和「备注」控件的名字。
/// 表格可能在两次扫描之间被重新渲染，所以每次回填都要重新提取，不能缓存。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationHandle(String);

fn handle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("静态正则"))
}

impl CorrelationHandle {
    /// 从行属性值提取；空值或含有无法拼进选择器的字符时返回 `None`
    pub fn from_row_attribute(attribute: Option<&str>) -> Option<Self> {
        let value = attribute?.trim();
        if handle_pattern().is_match(value) {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
