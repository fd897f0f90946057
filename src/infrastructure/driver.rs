//! 远程 UI 驱动接口
//!
//! 编排层只依赖这里的能力，不认识 chromiumoxide，也不认识具体页面

use std::fmt;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::DriverResult;

/// 指向远程 UI 中某个控件的非拥有引用
///
/// 句柄由驱动签发，带有签发时的代数（generation）。
/// 驱动调用 `release_controls()` 后代数递增，旧句柄全部失效，
/// 再使用会得到 `DriverError::StaleControl`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlRef {
    id: u64,
    generation: u64,
}

impl ControlRef {
    pub fn new(id: u64, generation: u64) -> Self {
        Self { id, generation }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 控件定位方式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// 按元素 id 定位
    Id(String),
    /// 按 CSS 选择器定位
    Css(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// 渲染为 CSS 选择器字符串
    ///
    /// id 使用属性选择器形式，避免 id 中的特殊字符破坏选择器
    pub fn to_css(&self) -> String {
        match self {
            Locator::Id(id) => format!("[id=\"{}\"]", id.replace('"', "\\\"")),
            Locator::Css(selector) => selector.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Css(selector) => write!(f, "{}", selector),
        }
    }
}

/// 需要派发给控件的信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Input,
    Change,
    KeyUp,
    /// Escape 按键
    Escape,
}

impl Signal {
    /// DOM 事件名
    pub fn event_name(self) -> &'static str {
        match self {
            Signal::Input => "input",
            Signal::Change => "change",
            Signal::KeyUp => "keyup",
            Signal::Escape => "keydown",
        }
    }
}

/// 远程 UI 驱动
///
/// 职责：
/// - 定位控件并签发 `ControlRef`
/// - 对控件执行点击、输入、读取、派发信号
/// - 执行远程表达式
/// - 不认识学生 / 班级，不处理业务流程
#[async_trait]
pub trait UiDriver: Send + Sync {
    /// 导航到指定 URL（之前签发的句柄全部失效）
    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// 定位第一个匹配的控件
    async fn locate(&self, locator: &Locator) -> DriverResult<Option<ControlRef>>;

    /// 定位全部匹配的控件（按文档顺序）
    async fn locate_all(&self, locator: &Locator) -> DriverResult<Vec<ControlRef>>;

    /// 在某个控件内部定位全部匹配的子控件
    async fn locate_within(
        &self,
        parent: &ControlRef,
        locator: &Locator,
    ) -> DriverResult<Vec<ControlRef>>;

    async fn click(&self, control: &ControlRef) -> DriverResult<()>;

    /// 清空输入控件的值
    async fn clear(&self, control: &ControlRef) -> DriverResult<()>;

    /// 向输入控件追加文本
    async fn type_text(&self, control: &ControlRef, text: &str) -> DriverResult<()>;

    /// 读取控件的可见文本
    async fn read_text(&self, control: &ControlRef) -> DriverResult<String>;

    /// 读取控件属性，不存在时返回 `None`
    async fn read_attribute(&self, control: &ControlRef, name: &str)
        -> DriverResult<Option<String>>;

    /// 直接设置控件的值（不派发任何事件）
    async fn set_value(&self, control: &ControlRef, value: &str) -> DriverResult<()>;

    async fn dispatch_signal(&self, control: &ControlRef, signal: Signal) -> DriverResult<()>;

    /// 在页面上下文中执行表达式
    async fn run_expression(&self, expression: &str) -> DriverResult<JsonValue>;

    /// 当前页面地址
    async fn current_location(&self) -> DriverResult<String>;

    /// 使所有已签发的句柄失效
    async fn release_controls(&self);

    /// 关闭会话；重复调用无副作用
    async fn close(&self) -> DriverResult<()>;
}
