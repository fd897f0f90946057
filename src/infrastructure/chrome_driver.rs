//! Chrome 驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，把 `UiDriver` 能力映射到 chromiumoxide

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser::BrowserSession;
use crate::error::{DriverError, DriverResult};
use crate::infrastructure::driver::{ControlRef, Locator, Signal, UiDriver};

/// 已签发句柄的登记表
#[derive(Default)]
struct ControlRegistry {
    generation: u64,
    next_id: u64,
    controls: HashMap<u64, Arc<Element>>,
}

impl ControlRegistry {
    fn issue(&mut self, element: Element) -> ControlRef {
        self.next_id += 1;
        self.controls.insert(self.next_id, Arc::new(element));
        ControlRef::new(self.next_id, self.generation)
    }

    fn get(&self, control: &ControlRef) -> DriverResult<Arc<Element>> {
        let stale = DriverError::StaleControl {
            id: control.id(),
            generation: control.generation(),
        };
        if control.generation() != self.generation {
            return Err(stale);
        }
        self.controls.get(&control.id()).cloned().ok_or(stale)
    }

    fn release(&mut self) {
        self.generation += 1;
        self.controls.clear();
    }
}

/// Chrome 驱动
///
/// 职责：
/// - 持有唯一的 Page 与 Browser
/// - 为元素签发可失效的句柄
/// - 不认识学生 / 班级
pub struct ChromeDriver {
    page: Page,
    browser: tokio::sync::Mutex<Option<Browser>>,
    handler: Mutex<Option<JoinHandle<()>>>,
    attached: bool,
    registry: Mutex<ControlRegistry>,
}

impl ChromeDriver {
    /// 接管一个已经建立的浏览器会话
    pub fn new(session: BrowserSession) -> Self {
        Self {
            page: session.page,
            browser: tokio::sync::Mutex::new(Some(session.browser)),
            handler: Mutex::new(Some(session.handler)),
            attached: session.attached,
            registry: Mutex::new(ControlRegistry::default()),
        }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    fn element(&self, control: &ControlRef) -> DriverResult<Arc<Element>> {
        self.registry
            .lock()
            .map_err(|_| poisoned())?
            .get(control)
    }

    fn issue_all(&self, elements: Vec<Element>) -> DriverResult<Vec<ControlRef>> {
        let mut registry = self.registry.lock().map_err(|_| poisoned())?;
        Ok(elements.into_iter().map(|el| registry.issue(el)).collect())
    }

    /// 在元素上执行一段函数声明（`this` 指向元素）
    async fn call_on(
        &self,
        control: &ControlRef,
        action: &'static str,
        function: String,
    ) -> DriverResult<()> {
        let element = self.element(control)?;
        element
            .call_js_fn(function, false)
            .await
            .map_err(|e| DriverError::ActionFailed {
                action,
                message: e.to_string(),
            })?;
        Ok(())
    }
}

fn poisoned() -> DriverError {
    DriverError::ActionFailed {
        action: "registry",
        message: "句柄登记表锁已中毒".to_string(),
    }
}

fn js_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

#[async_trait]
impl UiDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::NavigationFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        self.release_controls().await;
        Ok(())
    }

    async fn locate(&self, locator: &Locator) -> DriverResult<Option<ControlRef>> {
        let mut elements = self.page.find_elements(locator.to_css()).await?;
        if elements.is_empty() {
            return Ok(None);
        }
        let first = elements.swap_remove(0);
        let mut registry = self.registry.lock().map_err(|_| poisoned())?;
        Ok(Some(registry.issue(first)))
    }

    async fn locate_all(&self, locator: &Locator) -> DriverResult<Vec<ControlRef>> {
        let elements = self.page.find_elements(locator.to_css()).await?;
        self.issue_all(elements)
    }

    async fn locate_within(
        &self,
        parent: &ControlRef,
        locator: &Locator,
    ) -> DriverResult<Vec<ControlRef>> {
        let parent = self.element(parent)?;
        let elements = parent.find_elements(locator.to_css()).await?;
        self.issue_all(elements)
    }

    async fn click(&self, control: &ControlRef) -> DriverResult<()> {
        let element = self.element(control)?;
        element.click().await.map_err(|e| DriverError::ActionFailed {
            action: "click",
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn clear(&self, control: &ControlRef) -> DriverResult<()> {
        self.call_on(
            control,
            "clear",
            "function() { this.value = ''; }".to_string(),
        )
        .await
    }

    async fn type_text(&self, control: &ControlRef, text: &str) -> DriverResult<()> {
        // type_str 只认识键盘布局中的字符，备注里常有中文，所以直接写 value
        let function = format!(
            "function() {{ this.focus(); this.value = (this.value || '') + {}; }}",
            js_string(text)
        );
        self.call_on(control, "type_text", function).await
    }

    async fn read_text(&self, control: &ControlRef) -> DriverResult<String> {
        let element = self.element(control)?;
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    async fn read_attribute(
        &self,
        control: &ControlRef,
        name: &str,
    ) -> DriverResult<Option<String>> {
        let element = self.element(control)?;
        Ok(element.attribute(name).await?)
    }

    async fn set_value(&self, control: &ControlRef, value: &str) -> DriverResult<()> {
        let function = format!("function() {{ this.value = {}; }}", js_string(value));
        self.call_on(control, "set_value", function).await
    }

    async fn dispatch_signal(&self, control: &ControlRef, signal: Signal) -> DriverResult<()> {
        if signal == Signal::Escape {
            let element = self.element(control)?;
            element
                .press_key("Escape")
                .await
                .map_err(|e| DriverError::ActionFailed {
                    action: "press_key",
                    message: e.to_string(),
                })?;
            return Ok(());
        }
        let function = format!(
            "function() {{ this.dispatchEvent(new Event('{}', {{ bubbles: true }})); }}",
            signal.event_name()
        );
        self.call_on(control, "dispatch_signal", function).await
    }

    async fn run_expression(&self, expression: &str) -> DriverResult<JsonValue> {
        let result = self
            .page
            .evaluate(expression.to_string())
            .await
            .map_err(|e| DriverError::ActionFailed {
                action: "run_expression",
                message: e.to_string(),
            })?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }

    async fn current_location(&self) -> DriverResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn release_controls(&self) {
        match self.registry.lock() {
            Ok(mut registry) => registry.release(),
            Err(_) => warn!("句柄登记表锁已中毒，无法释放句柄"),
        }
    }

    async fn close(&self) -> DriverResult<()> {
        self.release_controls().await;

        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        if self.attached {
            debug!("连接模式：保留用户的浏览器，只断开连接");
        } else {
            browser.close().await?;
            if let Err(e) = browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
        }

        if let Ok(mut handler) = self.handler.lock() {
            if let Some(handle) = handler.take() {
                handle.abort();
            }
        }
        Ok(())
    }
}
