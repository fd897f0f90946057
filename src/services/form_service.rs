//! 表单服务
//!
//! 负责登录、基本资料预填、打开 / 关闭学生名单以及最终提交。
//! 登录与打开名单失败是致命的，其余步骤都是尽力而为。

use std::fmt::Display;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DriverResult, WorkflowError};
use crate::infrastructure::{wait_for_control, wait_until, Locator, Signal, UiDriver, WaitPolicy};
use crate::layout::PageLayout;
use crate::services::selection_resolver::{SelectionOutcome, SelectionResolver};
use crate::source::EventInfo;
use crate::workflow::outcome::StageOutcome;

pub struct FormService {
    layout: PageLayout,
    wait: WaitPolicy,
    login_wait: WaitPolicy,
    settle: Duration,
    activity: SelectionResolver,
}

impl FormService {
    pub fn new(layout: PageLayout, config: &Config) -> Self {
        let activity = SelectionResolver::new(
            layout.activity_picker.clone(),
            layout.option.clone(),
            config.picker_policy(),
        );
        Self {
            layout,
            wait: config.wait_policy(),
            login_wait: config.login_policy(),
            settle: config.action_settle(),
            activity,
        }
    }

    /// 登录；表单缺失、提交失败或超时后仍停留在登录页都视为登录失败
    pub async fn login<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        username: &str,
        password: &str,
    ) -> Result<(), WorkflowError> {
        info!("🔐 连接登录页面: {}", self.layout.login_url);
        driver
            .navigate(&self.layout.login_url)
            .await
            .map_err(rejected)?;

        info!("  填入账号与密码...");
        self.fill_login_form(driver, username, password)
            .await
            .map_err(rejected)?;

        info!("  等待登录完成...");
        let marker = self.layout.login_marker.to_lowercase();
        let marker = marker.as_str();
        let left_login_page = wait_until(self.login_wait, move || async move {
            driver
                .current_location()
                .await
                .map(|url| !url.to_lowercase().contains(marker))
                .unwrap_or(false)
        })
        .await;

        if !left_login_page {
            return Err(WorkflowError::LoginRejected {
                detail: format!("{}ms 后仍停留在登录页", self.login_wait.timeout_ms()),
            });
        }

        info!("✓ 已登录");
        Ok(())
    }

    async fn fill_login_form<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        username: &str,
        password: &str,
    ) -> DriverResult<()> {
        let username_field = wait_for_control(driver, &self.layout.username_field, self.login_wait).await?;
        driver.clear(&username_field).await?;
        driver.type_text(&username_field, username).await?;

        let password_field = wait_for_control(driver, &self.layout.password_field, self.wait).await?;
        driver.clear(&password_field).await?;
        driver.type_text(&password_field, password).await?;

        let submit = wait_for_control(driver, &self.layout.login_submit, self.wait).await?;
        driver.click(&submit).await
    }

    /// 进入录入页，填写日期并选择活动
    ///
    /// 返回预填结果与活动选择结果；任何失败都不会中止流程
    pub async fn fill_form<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        event: &EventInfo,
    ) -> (StageOutcome, SelectionOutcome) {
        info!("📝 进入活动页面并填写基本资料...");
        if let Err(e) = driver.navigate(&self.layout.activity_url).await {
            warn!("⚠️ 无法打开活动页面: {}", e);
            return (
                StageOutcome::failed(format!("无法打开活动页面: {}", e)),
                SelectionOutcome::NotFound,
            );
        }

        info!("  填写日期: {}", event.date);
        let date_filled = match self.fill_date(driver, &event.date).await {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ 填写日期失败: {}", e);
                false
            }
        };

        info!("  选择活动: {}", event.activity_code);
        let selection = self.activity.resolve(driver, &event.activity_code).await;
        if !selection.is_selected() {
            warn!("⚠️ 活动选择失败，但尝试继续");
        }
        sleep(self.settle).await;

        let outcome = match (date_filled, selection.is_selected()) {
            (true, true) => StageOutcome::ok(format!("基本资料已填写 ({})", selection.label())),
            (false, true) => StageOutcome::failed("日期未填写"),
            (true, false) => StageOutcome::failed("活动未选中"),
            (false, false) => StageOutcome::failed("日期未填写，活动未选中"),
        };
        (outcome, selection)
    }

    async fn fill_date<D: UiDriver + ?Sized>(&self, driver: &D, date: &str) -> DriverResult<()> {
        let field = wait_for_control(driver, &self.layout.date_field, self.wait).await?;
        driver.clear(&field).await?;
        driver.type_text(&field, date).await
    }

    /// 点击「学生名单」并等待班级下拉出现
    pub async fn open_list<D: UiDriver + ?Sized>(&self, driver: &D) -> Result<(), WorkflowError> {
        info!("📋 点击学生名单按钮...");
        let button = wait_for_control(driver, &self.layout.list_button, self.wait)
            .await
            .map_err(list_failed)?;
        driver.click(&button).await.map_err(list_failed)?;

        info!("  等待班级下拉出现...");
        wait_for_control(driver, &self.layout.class_select, self.wait)
            .await
            .map_err(list_failed)?;
        sleep(self.settle).await;

        info!("✓ 学生名单已打开");
        Ok(())
    }

    /// 关闭名单弹窗；关闭按钮不可用时改按 Escape
    pub async fn close_list<D: UiDriver + ?Sized>(&self, driver: &D) -> StageOutcome {
        info!("📕 关闭学生名单...");
        let outcome = match self.click_first(driver, &self.layout.modal_close).await {
            Ok(true) => StageOutcome::ok("弹窗已关闭"),
            primary => {
                match primary {
                    Ok(_) => warn!("⚠️ 找不到关闭按钮，尝试用 Escape 键"),
                    Err(e) => warn!("⚠️ 关闭弹窗失败，尝试用 Escape 键: {}", e),
                }
                match self.press_escape(driver).await {
                    Ok(true) => StageOutcome::ok("已用 Escape 关闭弹窗"),
                    Ok(false) => StageOutcome::failed("关闭按钮与 Escape 都不可用"),
                    Err(e) => StageOutcome::failed(format!("Escape 失败: {}", e)),
                }
            }
        };
        sleep(self.settle).await;

        if outcome.ok {
            info!("{}", outcome);
        } else {
            warn!("{}", outcome);
        }
        outcome
    }

    /// 点击「创建」
    pub async fn submit<D: UiDriver + ?Sized>(&self, driver: &D) -> StageOutcome {
        info!("📤 提交表单...");
        let clicked = async {
            let button = wait_for_control(driver, &self.layout.submit_button, self.wait).await?;
            driver.click(&button).await
        };

        match clicked.await {
            Ok(()) => {
                info!("✓ 已提交");
                StageOutcome::ok("已提交")
            }
            Err(e) => {
                warn!("⚠️ 提交失败: {}", e);
                StageOutcome::failed(format!("提交失败: {}", e))
            }
        }
    }

    async fn click_first<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
    ) -> DriverResult<bool> {
        match driver.locate(locator).await? {
            Some(control) => driver.click(&control).await.map(|_| true),
            None => Ok(false),
        }
    }

    async fn press_escape<D: UiDriver + ?Sized>(&self, driver: &D) -> DriverResult<bool> {
        match driver.locate(&self.layout.page_body).await? {
            Some(body) => driver
                .dispatch_signal(&body, Signal::Escape)
                .await
                .map(|_| true),
            None => Ok(false),
        }
    }
}

fn rejected(e: impl Display) -> WorkflowError {
    WorkflowError::LoginRejected {
        detail: e.to_string(),
    }
}

fn list_failed(e: impl Display) -> WorkflowError {
    WorkflowError::ListOpeningFailed {
        detail: e.to_string(),
    }
}
