//! Select2 选择器
//!
//! 两层策略：
//! - A：展开选择器，在搜索框中输入代码，结果唯一时点击它
//! - B：A 没有结果（或结果不唯一）时，遍历原始 `<select>` 的选项，
//!   取第一个以代码开头的选项，直接设值并通知 Select2

use std::fmt;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::DriverResult;
use crate::infrastructure::{poll_until, wait_for_control, ControlRef, Locator, Signal, UiDriver, WaitPolicy};
use crate::layout::PickerLayout;

/// 两层都没有匹配时使用的活动名称
pub const NOT_FOUND_LABEL: &str = "not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTier {
    /// 搜索
    Search,
    /// 直接设值
    DirectValue,
}

impl fmt::Display for SelectionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionTier::Search => write!(f, "搜索"),
            SelectionTier::DirectValue => write!(f, "直接设值"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected { tier: SelectionTier, label: String },
    NotFound,
}

impl SelectionOutcome {
    pub fn is_selected(&self) -> bool {
        matches!(self, SelectionOutcome::Selected { .. })
    }

    /// 选中项的显示文本，未找到时为 [`NOT_FOUND_LABEL`]
    pub fn label(&self) -> &str {
        match self {
            SelectionOutcome::Selected { label, .. } => label,
            SelectionOutcome::NotFound => NOT_FOUND_LABEL,
        }
    }
}

pub struct SelectionResolver {
    picker: PickerLayout,
    option: Locator,
    policy: WaitPolicy,
}

impl SelectionResolver {
    pub fn new(picker: PickerLayout, option: Locator, policy: WaitPolicy) -> Self {
        Self {
            picker,
            option,
            policy,
        }
    }

    /// 选择与 `code` 对应的项；任何失败都只返回 false
    pub async fn select<D: UiDriver + ?Sized>(&self, driver: &D, code: &str) -> bool {
        self.resolve(driver, code).await.is_selected()
    }

    pub async fn resolve<D: UiDriver + ?Sized>(&self, driver: &D, code: &str) -> SelectionOutcome {
        let code = code.trim();
        if code.is_empty() {
            warn!("⚠️ 选择代码为空");
            return SelectionOutcome::NotFound;
        }

        match self.search(driver, code).await {
            Ok(Some(label)) => {
                info!("✓ 通过搜索选中: {}", label);
                return SelectionOutcome::Selected {
                    tier: SelectionTier::Search,
                    label,
                };
            }
            Ok(None) => debug!("搜索没有唯一结果，改为直接设值"),
            Err(e) => debug!("搜索失败，改为直接设值: {}", e),
        }

        match self.set_directly(driver, code).await {
            Ok(Some(label)) => {
                info!("✓ 通过直接设值选中: {}", label);
                SelectionOutcome::Selected {
                    tier: SelectionTier::DirectValue,
                    label,
                }
            }
            Ok(None) => {
                warn!("⚠️ 找不到 {} 对应的选项", code);
                SelectionOutcome::NotFound
            }
            Err(e) => {
                warn!("⚠️ Select2 操作异常: {}", e);
                SelectionOutcome::NotFound
            }
        }
    }

    /// 搜索结果唯一时点击并返回其文本
    async fn search<D: UiDriver + ?Sized>(&self, driver: &D, code: &str) -> DriverResult<Option<String>> {
        let Some(container) = driver.locate(&self.picker.container).await? else {
            return Ok(None);
        };
        driver.click(&container).await?;

        let input = wait_for_control(driver, &self.picker.search_input, self.policy).await?;
        driver.clear(&input).await?;
        driver.type_text(&input, code).await?;
        for signal in [Signal::Input, Signal::KeyUp, Signal::Change] {
            driver.dispatch_signal(&input, signal).await?;
        }

        let label_locator = &self.picker.result_label;
        let results = poll_until(self.policy, move || async move {
            let labels = non_empty_labels(driver, label_locator).await;
            (!labels.is_empty()).then_some(labels)
        })
        .await
        .unwrap_or_default();

        match results.as_slice() {
            [(control, label)] => {
                driver.click(control).await?;
                Ok(Some(label.clone()))
            }
            [] => Ok(None),
            many => {
                debug!("搜索结果不唯一 ({} 项)", many.len());
                Ok(None)
            }
        }
    }

    /// 取第一个文本以 `code` 开头的选项，直接设值
    async fn set_directly<D: UiDriver + ?Sized>(&self, driver: &D, code: &str) -> DriverResult<Option<String>> {
        let field_locator = self.picker.field();
        let Some(field) = driver.locate(&field_locator).await? else {
            return Ok(None);
        };

        for option in driver.locate_within(&field, &self.option).await? {
            let text = driver.read_text(&option).await?;
            let label = text.trim();
            if !label.starts_with(code) {
                continue;
            }

            let value = driver
                .read_attribute(&option, "value")
                .await?
                .unwrap_or_else(|| label.to_string());
            driver.set_value(&field, &value).await?;
            driver
                .run_expression(&notify_expression(&field_locator, &value, label))
                .await?;
            driver.dispatch_signal(&field, Signal::Change).await?;
            return Ok(Some(label.to_string()));
        }
        Ok(None)
    }
}

async fn non_empty_labels<D: UiDriver + ?Sized>(driver: &D, locator: &Locator) -> Vec<(ControlRef, String)> {
    let mut labels = Vec::new();
    for control in driver.locate_all(locator).await.unwrap_or_default() {
        if let Ok(text) = driver.read_text(&control).await {
            let text = text.trim();
            if !text.is_empty() {
                labels.push((control, text.to_string()));
            }
        }
    }
    labels
}

/// 让 Select2 显示外部设置的值
fn notify_expression(field: &Locator, value: &str, label: &str) -> String {
    let selector = json!(field.to_css());
    let data = json!({ "id": value, "text": label });
    format!(
        "(function() {{ try {{ if (window.jQuery) {{ jQuery({}).select2('data', {}); }} }} catch (e) {{}} return true; }})()",
        selector, data
    )
}
