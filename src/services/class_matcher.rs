//! 逐班级匹配学生
//!
//! 选班 → 等待表格 → 逐个学生扫描表格并点击「添加」。
//! 班级级失败整组计为未找到；学生级失败只计该学生，继续处理后面的学生。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::infrastructure::{wait_for_any, wait_for_control, Signal, UiDriver, WaitPolicy};
use crate::layout::PageLayout;
use crate::models::{ClassGroup, MatchResult, RunCounters};
use crate::workflow::outcome::{GroupOutcome, ItemOutcome};

/// 有效的学生行至少包含的列数
pub const MIN_ROW_CELLS: usize = 5;

/// 班级选项是否对应班级代码：括号内形式 `(S3B)` 或以代码结尾
pub fn match_class_option(text: &str, code: &str) -> bool {
    let text = text.trim();
    let code = code.trim();
    !code.is_empty() && (text.contains(&format!("({})", code)) || text.ends_with(code))
}

/// 在表格中查找一名学生的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentLookup {
    Matched(MatchResult),
    /// 没有学号相同的行
    RowMissing,
    /// 找到了行，但行内没有「添加」按钮
    ActionMissing,
}

pub struct ClassMatcher {
    layout: PageLayout,
    wait: WaitPolicy,
    settle: Duration,
}

impl ClassMatcher {
    pub fn new(layout: PageLayout, wait: WaitPolicy, settle: Duration) -> Self {
        Self {
            layout,
            wait,
            settle,
        }
    }

    /// 处理一个班级，结果同时计入 `counters`
    pub async fn process_group<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        group: &ClassGroup,
        counters: &mut RunCounters,
    ) -> GroupOutcome {
        match self.open_class(driver, group, counters).await {
            Some(skipped) => skipped,
            None => self.match_students(driver, group, counters).await,
        }
    }

    /// 选班并等待表格；失败时整组计为未找到并返回跳过结果
    pub async fn open_class<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        group: &ClassGroup,
        counters: &mut RunCounters,
    ) -> Option<GroupOutcome> {
        let class_code = group.class_code.clone();

        if !self.select_class(driver, &class_code).await {
            warn!("⚠️ 找不到班级 {}，跳过 {} 位学生", class_code, group.len());
            counters.record_missing(group.len());
            driver.release_controls().await;
            return Some(GroupOutcome::ClassNotFound {
                class_code,
                size: group.len(),
            });
        }

        if let Err(e) = wait_for_any(driver, &self.layout.table_rows, self.wait).await {
            warn!("⚠️ 班级 {} 的表格没有载入: {}", class_code, e);
            counters.record_missing(group.len());
            driver.release_controls().await;
            return Some(GroupOutcome::TableTimeout {
                class_code,
                size: group.len(),
            });
        }
        sleep(self.settle).await;
        None
    }

    /// 在已载入的表格中逐个添加学生
    pub async fn match_students<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        group: &ClassGroup,
        counters: &mut RunCounters,
    ) -> GroupOutcome {
        let class_code = group.class_code.clone();
        let mut items = Vec::with_capacity(group.len());
        for item in &group.items {
            let outcome = self.add_student(driver, &item.student_id).await;
            if outcome.is_found() {
                counters.record_found(&item.student_id);
            } else {
                counters.record_missing(1);
            }
            // 点击后表格可能重新渲染
            driver.release_controls().await;
            items.push(outcome);
        }

        GroupOutcome::Processed { class_code, items }
    }

    /// 在班级下拉中选中 `code` 对应的班级
    pub async fn select_class<D: UiDriver + ?Sized>(&self, driver: &D, code: &str) -> bool {
        let select = match wait_for_control(driver, &self.layout.class_select, self.wait).await {
            Ok(select) => select,
            Err(e) => {
                warn!("⚠️ 班级下拉不存在: {}", e);
                return false;
            }
        };

        let options = driver
            .locate_within(&select, &self.layout.option)
            .await
            .unwrap_or_default();
        for option in options {
            let Ok(text) = driver.read_text(&option).await else {
                continue;
            };
            if !match_class_option(&text, code) {
                continue;
            }

            let value = match driver.read_attribute(&option, "value").await {
                Ok(Some(value)) => value,
                _ => text.trim().to_string(),
            };
            let selected = async {
                driver.set_value(&select, &value).await?;
                driver.dispatch_signal(&select, Signal::Change).await
            };
            return match selected.await {
                Ok(()) => {
                    info!("  已选择班级: {} ({})", code, text.trim());
                    true
                }
                Err(e) => {
                    warn!("⚠️ 选班失败 {}: {}", code, e);
                    false
                }
            };
        }
        false
    }

    /// 线性扫描表格，第一行学号相同且结构完整的行胜出
    pub async fn find_student<D: UiDriver + ?Sized>(&self, driver: &D, student_id: &str) -> StudentLookup {
        let rows = match driver.locate_all(&self.layout.table_rows).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("⚠️ 表格查询错误: {}", e);
                return StudentLookup::RowMissing;
            }
        };

        for row in rows {
            let cells = driver
                .locate_within(&row, &self.layout.cell)
                .await
                .unwrap_or_default();
            if cells.len() < MIN_ROW_CELLS {
                continue;
            }
            let student_no = match driver.read_text(&cells[0]).await {
                Ok(text) => text.trim().to_string(),
                Err(_) => continue,
            };
            if student_no != student_id {
                continue;
            }

            let display_name = driver
                .read_text(&cells[1])
                .await
                .map(|t| t.trim().to_string())
                .unwrap_or_default();
            let action = driver
                .locate_within(&row, &self.layout.add_button)
                .await
                .unwrap_or_default()
                .into_iter()
                .next();

            return match action {
                Some(action) => StudentLookup::Matched(MatchResult {
                    student_no,
                    display_name,
                    action,
                }),
                None => StudentLookup::ActionMissing,
            };
        }
        StudentLookup::RowMissing
    }

    async fn add_student<D: UiDriver + ?Sized>(&self, driver: &D, student_id: &str) -> ItemOutcome {
        let student_id = student_id.to_string();
        match self.find_student(driver, &student_id).await {
            StudentLookup::Matched(found) => match driver.click(&found.action).await {
                Ok(()) => {
                    info!("    ✓ {} → {}，已添加到名单", student_id, found.display_name);
                    sleep(self.settle).await;
                    ItemOutcome::Found {
                        student_id,
                        display_name: found.display_name,
                    }
                }
                Err(e) => {
                    warn!("    ⚠️ {} 点击「添加」失败: {}", student_id, e);
                    ItemOutcome::ActionFailed {
                        student_id,
                        detail: e.to_string(),
                    }
                }
            },
            StudentLookup::ActionMissing => {
                warn!("    ⚠️ 找到学生 {}，但找不到「添加」按钮", student_id);
                ItemOutcome::ActionMissing { student_id }
            }
            StudentLookup::RowMissing => {
                debug!("表格中没有学号 {}", student_id);
                warn!("    ⚠️ {} 未找到", student_id);
                ItemOutcome::RowMissing { student_id }
            }
        }
    }
}
