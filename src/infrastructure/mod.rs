//! 基础设施层
//!
//! 持有唯一的浏览器会话，对上只暴露 `UiDriver` 能力

pub mod chrome_driver;
pub mod driver;
pub mod wait;

#[cfg(test)]
pub(crate) mod fake_driver;

pub use chrome_driver::ChromeDriver;
pub use driver::{ControlRef, Locator, Signal, UiDriver};
pub use wait::{poll_until, wait_for_any, wait_for_control, wait_until, WaitPolicy};
