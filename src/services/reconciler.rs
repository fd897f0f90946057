//! 回填奖励分数类型与备注
//!
//! 名单关闭后，表格里已经有本次添加的学生行。重新扫描表格，
//! 对本次成功添加的学号，从行的 class 属性取出内部 ID，
//! 再用它定位该行的「奖励分数类型」下拉和「备注」输入框。

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::error::DriverResult;
use crate::infrastructure::{ControlRef, Signal, UiDriver};
use crate::layout::PageLayout;
use crate::models::{CorrelationHandle, FieldMap};
use crate::services::class_matcher::MIN_ROW_CELLS;
use crate::source::{Grid, FIRST_DATA_ROW};

/// 一次回填的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// 学号属于本次成功集合的行数
    pub matched_rows: usize,
    pub bonus_set: usize,
    pub remarks_set: usize,
    /// 因缺少 Excel 行或内部 ID 而跳过的行
    pub skipped: usize,
}

pub struct Reconciler {
    layout: PageLayout,
    first_data_row: u32,
}

impl Reconciler {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            first_data_row: FIRST_DATA_ROW,
        }
    }

    /// 每一步都是尽力而为：失败只记日志，不影响其他行
    pub async fn reconcile<D, G>(
        &self,
        driver: &D,
        source: &G,
        field_map: &FieldMap,
        succeeded: &BTreeSet<String>,
    ) -> ReconcileReport
    where
        D: UiDriver + ?Sized,
        G: Grid + ?Sized,
    {
        let mut report = ReconcileReport::default();
        driver.release_controls().await;
        debug!("本次添加的学生: {:?}", succeeded);

        let rows = match driver.locate_all(&self.layout.table_rows).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("⚠️ 无法读取表格: {}", e);
                return report;
            }
        };
        info!("  页面表格共 {} 行（包含旧数据）", rows.len());

        for row in rows {
            let Some(student_no) = self.student_no(driver, &row).await else {
                continue;
            };
            if !succeeded.contains(&student_no) {
                continue;
            }
            report.matched_rows += 1;
            info!("  处理学号: {}", student_no);

            let Some(remark) = self.lookup_remark(source, field_map, &student_no) else {
                warn!("    ⚠️ Excel 中没有学号 {}", student_no);
                report.skipped += 1;
                continue;
            };

            let attribute = driver.read_attribute(&row, "class").await.ok().flatten();
            let Some(handle) = CorrelationHandle::from_row_attribute(attribute.as_deref()) else {
                warn!("    ⚠️ 无法获取 {} 的内部 ID", student_no);
                report.skipped += 1;
                continue;
            };

            match self.set_bonus_type(driver, &handle).await {
                Ok(true) => {
                    report.bonus_set += 1;
                    debug!("    ✓ 已设置奖励分数类型");
                }
                Ok(false) => warn!("    ⚠️ 找不到 {} 的奖励分数类型下拉", handle.as_str()),
                Err(e) => warn!("    ⚠️ 设置奖励分数类型失败: {}", e),
            }

            match self.set_remark(driver, &handle, &remark).await {
                Ok(true) => {
                    report.remarks_set += 1;
                    debug!("    ✓ 已填写备注: {}", remark);
                }
                Ok(false) => warn!("    ⚠️ 找不到 {} 的备注输入框", handle.as_str()),
                Err(e) => warn!("    ⚠️ 填写备注失败: {}", e),
            }
        }

        info!(
            "✓ 已回填 {} 位学生（类型 {}，备注 {}）",
            report.matched_rows, report.bonus_set, report.remarks_set
        );
        report
    }

    /// 按学号在 Excel 中查找备注（award 列），单元格为空时为空串
    pub fn lookup_remark<G: Grid + ?Sized>(
        &self,
        source: &G,
        field_map: &FieldMap,
        student_no: &str,
    ) -> Option<String> {
        let student_id_col = field_map.student_id_column();
        let award_col = field_map.award_column();
        (self.first_data_row..=source.max_row())
            .find(|row| source.get_cell(*row, student_id_col).as_text() == student_no)
            .map(|row| source.get_cell(row, award_col).as_text())
    }

    async fn student_no<D: UiDriver + ?Sized>(&self, driver: &D, row: &ControlRef) -> Option<String> {
        let cells = driver.locate_within(row, &self.layout.cell).await.ok()?;
        if cells.len() < MIN_ROW_CELLS {
            return None;
        }
        let text = driver.read_text(&cells[0]).await.ok()?;
        Some(text.trim().to_string())
    }

    async fn set_bonus_type<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        handle: &CorrelationHandle,
    ) -> DriverResult<bool> {
        let Some(select) = driver.locate(&self.layout.bonus_type_select(handle)).await? else {
            return Ok(false);
        };
        driver.set_value(&select, &self.layout.bonus_type_value).await?;
        driver.dispatch_signal(&select, Signal::Change).await?;
        Ok(true)
    }

    async fn set_remark<D: UiDriver + ?Sized>(
        &self,
        driver: &D,
        handle: &CorrelationHandle,
        remark: &str,
    ) -> DriverResult<bool> {
        let Some(field) = driver.locate(&self.layout.remark_field(handle)).await? else {
            return Ok(false);
        };
        driver.clear(&field).await?;
        driver.type_text(&field, remark).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake_driver::{FakeDom, FakeDriver, FakeNode};
    use crate::source::MemoryGrid;

    struct Page {
        dom: FakeDom,
        bonus: usize,
        remark: usize,
    }

    fn source() -> MemoryGrid {
        let mut grid = MemoryGrid::new();
        grid.set_row(4, &["class", "studentid", "name", "award"]);
        grid.set_row(5, &["S3B", "20019", "Tan Mei Ling", "Champion"]);
        grid.set_row(6, &["S3B", "20020", "Lim", ""]);
        grid
    }

    /// 表格中有本次添加的 20019（内部 ID 4821）和旧数据 10001
    fn page(layout: &PageLayout) -> Page {
        let mut dom = FakeDom::default();
        let handle = CorrelationHandle::from_row_attribute(Some("4821")).unwrap();
        let added = dom.add_row(layout, &["20019", "Tan Mei Ling", "陈美玲", "S3B", ""], Some("4821"), false);
        let old = dom.add_row(layout, &["10001", "Old", "", "S1A", ""], Some("77"), false);
        dom.set_roots(&layout.table_rows, vec![added, old]);
        let bonus = dom.add_root(&layout.bonus_type_select(&handle), FakeNode::default());
        let remark = dom.add_root(&layout.remark_field(&handle), FakeNode::default());
        Page { dom, bonus, remark }
    }

    fn succeeded(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fills_bonus_type_and_remark() {
        let layout = PageLayout::default();
        let Page { dom, bonus, remark } = page(&layout);
        let driver = FakeDriver::new(dom);

        let report = Reconciler::new(layout)
            .reconcile(&driver, &source(), &FieldMap::default_map(), &succeeded(&["20019"]))
            .await;

        assert_eq!(
            report,
            ReconcileReport {
                matched_rows: 1,
                bonus_set: 1,
                remarks_set: 1,
                skipped: 0
            }
        );
        let dom = driver.dom();
        assert_eq!(dom.node(bonus).value, "1");
        assert_eq!(dom.node(remark).value, "Champion");
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_idempotent() {
        let layout = PageLayout::default();
        let Page { dom, bonus, remark } = page(&layout);
        let driver = FakeDriver::new(dom);
        let reconciler = Reconciler::new(layout);
        let ids = succeeded(&["20019"]);
        let grid = source();
        let map = FieldMap::default_map();

        let first = reconciler.reconcile(&driver, &grid, &map, &ids).await;
        let values = {
            let dom = driver.dom();
            (dom.node(bonus).value.clone(), dom.node(remark).value.clone())
        };
        let second = reconciler.reconcile(&driver, &grid, &map, &ids).await;

        assert_eq!(first, second);
        let dom = driver.dom();
        assert_eq!((dom.node(bonus).value.clone(), dom.node(remark).value.clone()), values);
        assert_eq!(dom.node(remark).value, "Champion");
    }

    #[tokio::test]
    async fn test_missing_controls_are_best_effort() {
        let layout = PageLayout::default();
        let mut dom = FakeDom::default();
        let no_handle = dom.add_row(&layout, &["20019", "A", "", "S3B", ""], None, false);
        let no_controls = dom.add_row(&layout, &["20020", "B", "", "S3B", ""], Some("900"), false);
        dom.set_roots(&layout.table_rows, vec![no_handle, no_controls]);
        let driver = FakeDriver::new(dom);

        let report = Reconciler::new(layout)
            .reconcile(
                &driver,
                &source(),
                &FieldMap::default_map(),
                &succeeded(&["20019", "20020"]),
            )
            .await;

        assert_eq!(report.matched_rows, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.bonus_set, 0);
        assert_eq!(report.remarks_set, 0);
    }

    #[test]
    fn test_lookup_remark_defaults_to_empty() {
        let reconciler = Reconciler::new(PageLayout::default());
        let grid = source();
        let map = FieldMap::default_map();

        assert_eq!(reconciler.lookup_remark(&grid, &map, "20019").as_deref(), Some("Champion"));
        assert_eq!(reconciler.lookup_remark(&grid, &map, "20020").as_deref(), Some(""));
        assert_eq!(reconciler.lookup_remark(&grid, &map, "99999"), None);
    }
}
