//! 浏览器启动与连接

pub mod connection;
pub mod launch;

use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;

pub use connection::connect_to_browser;
pub use launch::launch_browser;

/// 一次浏览器会话：浏览器、工作页面以及后台事件处理任务
pub struct BrowserSession {
    pub browser: Browser,
    pub page: Page,
    pub handler: JoinHandle<()>,
    /// 是否为连接到已打开的浏览器（而非自己启动）
    pub attached: bool,
}
