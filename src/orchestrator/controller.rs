//! 工作流控制器 - 编排层
//!
//! 按状态机顺序驱动一次完整的运行：
//! 登录 → 预填 → 打开名单 → 逐班级匹配 → 关闭名单 → 回填 → 提交 → 等待确认。
//!
//! 控制器独占浏览器会话，无论正常结束、致命错误还是被中断，
//! 会话都恰好释放一次。

use std::future::Future;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, WorkflowError};
use crate::infrastructure::UiDriver;
use crate::layout::PageLayout;
use crate::models::RunCounters;
use crate::orchestrator::preflight::RunPlan;
use crate::services::{ClassMatcher, FormService, Reconciler};
use crate::source::event_header::ACTIVITY_LABEL_CELL;
use crate::source::{CellValue, Grid};
use crate::utils::logging;
use crate::workflow::{RunReport, StateMachine, WorkflowState};

pub struct WorkflowController<D: UiDriver> {
    driver: D,
    config: Config,
    form: FormService,
    matcher: ClassMatcher,
    reconciler: Reconciler,
    machine: StateMachine,
    counters: RunCounters,
    released: bool,
}

impl<D: UiDriver> WorkflowController<D> {
    pub fn new(driver: D, layout: PageLayout, config: Config) -> Self {
        Self {
            form: FormService::new(layout.clone(), &config),
            matcher: ClassMatcher::new(layout.clone(), config.wait_policy(), config.action_settle()),
            reconciler: Reconciler::new(layout),
            driver,
            config,
            machine: StateMachine::default(),
            counters: RunCounters::default(),
            released: false,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.state()
    }

    pub fn history(&self) -> &[WorkflowState] {
        self.machine.history()
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    /// 执行一次运行，Ctrl+C 视为中断
    pub async fn run<G: Grid + ?Sized>(&mut self, plan: &RunPlan, source: &mut G) -> AppResult<RunReport> {
        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // 无法监听信号时永不触发中断
                std::future::pending::<()>().await;
            }
        };
        self.run_until(plan, source, shutdown).await
    }

    /// 执行一次运行，`shutdown` 完成时中断
    ///
    /// 致命错误和中断都以 `Err` 返回，但返回之前会话一定已经释放。
    /// 流程结束后等待确认期间的中断按正常退出处理。
    pub async fn run_until<G, S>(&mut self, plan: &RunPlan, source: &mut G, shutdown: S) -> AppResult<RunReport>
    where
        G: Grid + ?Sized,
        S: Future<Output = ()>,
    {
        let mut report = RunReport {
            duplicates: plan.work.duplicates,
            ..Default::default()
        };

        tokio::pin!(shutdown);
        let finished = {
            let stages = self.run_stages(plan, source, &mut report);
            tokio::select! {
                result = stages => Some(result),
                _ = &mut shutdown => None,
            }
        };

        let result = match finished {
            Some(Ok(())) => {
                if self.config.hold_open {
                    wait_for_operator(&mut shutdown).await;
                }
                Ok(())
            }
            Some(Err(e)) => {
                error!("✗ 流程中止: {}", e);
                report.aborted = Some(e.to_string());
                self.fill_counts(&mut report);
                logging::print_final_stats(&report, &self.config.output_log_file);
                Err(e)
            }
            None => {
                warn!("\n✗ 中断执行");
                report.interrupted = true;
                self.fill_counts(&mut report);
                logging::print_final_stats(&report, &self.config.output_log_file);
                Err(WorkflowError::Interrupted.into())
            }
        };

        self.release().await;
        result.map(|()| report)
    }

    async fn run_stages<G: Grid + ?Sized>(
        &mut self,
        plan: &RunPlan,
        source: &mut G,
        report: &mut RunReport,
    ) -> Result<(), AppError> {
        // ========== 登录 ==========
        self.machine.advance(WorkflowState::LoggingIn)?;
        info!("[1/6] 登录 SMS...");
        self.form
            .login(&self.driver, &self.config.username, &self.config.password)
            .await?;

        // ========== 基本资料 ==========
        self.machine.advance(WorkflowState::FormSetup)?;
        info!("[2/6] 填写基本资料...");
        let (setup, selection) = self.form.fill_form(&self.driver, &plan.event).await;
        if !setup.ok {
            warn!("{}，继续打开学生名单", setup);
        }
        let label = selection.label().to_string();
        info!("🏷️ 活动名称: {}", label);
        if self.config.write_activity_label {
            write_activity_label(source, &label);
        }
        report.activity_label = Some(label);

        // ========== 学生名单 ==========
        self.machine.advance(WorkflowState::ListOpening)?;
        info!("[3/6] 打开学生名单...");
        self.form.open_list(&self.driver).await?;

        info!("[4/6] 逐班级添加学生...");
        let total = plan.work.class_count();
        for (index, group) in plan.work.iter().enumerate() {
            self.machine.advance(WorkflowState::SelectingClass)?;
            logging::log_group_start(index + 1, total, group);

            let skipped = self
                .matcher
                .open_class(&self.driver, group, &mut self.counters)
                .await;
            let outcome = match skipped {
                Some(skipped) => skipped,
                None => {
                    self.machine.advance(WorkflowState::MatchingStudents)?;
                    self.matcher
                        .match_students(&self.driver, group, &mut self.counters)
                        .await
                }
            };
            report.groups.push(outcome);
        }

        // ========== 关闭名单并回填 ==========
        self.machine.advance(WorkflowState::ListClosing)?;
        info!("[5/6] 关闭学生名单...");
        self.form.close_list(&self.driver).await;

        self.machine.advance(WorkflowState::Reconciling)?;
        info!("[5/6] 填写奖励分数类型和备注...");
        let reconciled = self
            .reconciler
            .reconcile(
                &self.driver,
                &*source,
                &plan.field_map,
                self.counters.succeeded(),
            )
            .await;
        report.reconciled = reconciled.matched_rows;

        // ========== 提交 ==========
        self.machine.advance(WorkflowState::Submitting)?;
        info!("[6/6] 提交表单...");
        report.submitted = self.form.submit(&self.driver).await.ok;

        self.machine.advance(WorkflowState::AwaitingManualConfirmation)?;
        self.fill_counts(report);
        logging::print_final_stats(report, &self.config.output_log_file);
        info!("✓ 流程结束，请在浏览器中检查结果");
        Ok(())
    }

    fn fill_counts(&self, report: &mut RunReport) {
        report.found = self.counters.found();
        report.missing = self.counters.missing();
    }

    /// 进入 Closed 并关闭会话；重复调用无副作用
    async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.machine.close();

        match self.driver.close().await {
            Ok(()) => info!("🔒 浏览器会话已释放"),
            Err(e) => warn!("⚠️ 关闭浏览器失败: {}", e),
        }
    }
}

/// 活动名称写回 B3 并保存（尽力而为）
fn write_activity_label<G: Grid + ?Sized>(source: &mut G, label: &str) {
    let (row, col) = ACTIVITY_LABEL_CELL;
    source.set_cell(row, col, CellValue::from(label));
    match source.save() {
        Ok(()) => info!("✓ 活动名称已写入 B3: {}", label),
        Err(e) => warn!("⚠️ 写入活动名称失败: {}", e),
    }
}

/// 保持浏览器打开，等待操作员按 Enter
///
/// 此时收到中断视为确认。标准输入在独立线程中读取，
/// 未按 Enter 时退出不会被阻塞的读取拖住。
async fn wait_for_operator<S: Future<Output = ()> + Unpin>(shutdown: &mut S) {
    info!("\n浏览器已保持打开。按 Enter 退出...");
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        if let Err(e) = std::io::stdin().read_line(&mut line) {
            warn!("⚠️ 读取标准输入失败: {}", e);
        }
        let _ = tx.send(());
    });

    tokio::select! {
        _ = rx => {}
        _ = shutdown => info!("收到中断，结束等待"),
    }
}
