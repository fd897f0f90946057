//! SMS 页面布局
//!
//! 所有 URL 与选择器集中在这里，业务层只通过 `PageLayout` 访问页面结构

use crate::infrastructure::Locator;
use crate::models::CorrelationHandle;

/// Select2 选择器的页面结构
#[derive(Debug, Clone)]
pub struct PickerLayout {
    /// Select2 可见容器（点击后展开）
    pub container: Locator,
    /// 被 Select2 包装的原始 `<select>` 的 id
    pub field_id: String,
    /// 展开后的搜索输入框
    pub search_input: Locator,
    /// 搜索结果标签
    pub result_label: Locator,
}

impl PickerLayout {
    /// 原始 `<select>` 控件
    pub fn field(&self) -> Locator {
        Locator::id(self.field_id.clone())
    }
}

/// 页面布局
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub login_url: String,
    pub activity_url: String,
    pub username_field: Locator,
    pub password_field: Locator,
    pub login_submit: Locator,
    /// 仍停留在登录页时地址中包含的片段（大小写不敏感）
    pub login_marker: String,
    pub date_field: Locator,
    pub activity_picker: PickerLayout,
    /// 「学生名单」按钮
    pub list_button: Locator,
    /// 班级下拉
    pub class_select: Locator,
    pub option: Locator,
    pub table_rows: Locator,
    pub cell: Locator,
    /// 行内的「添加」按钮
    pub add_button: Locator,
    pub modal_close: Locator,
    pub page_body: Locator,
    /// 「创建」按钮
    pub submit_button: Locator,
    /// 奖励分数类型的固定取值（1 = 校外學藝）
    pub bonus_type_value: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            login_url: "http://sms.chhsban.edu.my/sms/index.php?r=site/login".to_string(),
            activity_url:
                "http://sms.chhsban.edu.my/sms/index.php?r=transaction/studentPerformance/create"
                    .to_string(),
            username_field: Locator::id("LoginForm_username"),
            password_field: Locator::id("LoginForm_password"),
            login_submit: Locator::css("button[type='submit']"),
            login_marker: "login".to_string(),
            date_field: Locator::id("StudentPerformanceM_date"),
            activity_picker: PickerLayout {
                container: Locator::id("s2id_StudentPerformanceM_item_id"),
                field_id: "StudentPerformanceM_item_id".to_string(),
                search_input: Locator::css(".select2-input"),
                result_label: Locator::css(".select2-result-label"),
            },
            list_button: Locator::id("yw4"),
            class_select: Locator::id("class_id"),
            option: Locator::css("option"),
            table_rows: Locator::css("table.table tbody tr"),
            cell: Locator::css("td"),
            add_button: Locator::css("a.btn[onclick*=\"addToEkstra\"]"),
            modal_close: Locator::css("#studentModal a.close"),
            page_body: Locator::css("body"),
            submit_button: Locator::id("yw7"),
            bonus_type_value: "1".to_string(),
        }
    }
}

impl PageLayout {
    /// 使用自定义的登录页 / 录入页地址
    pub fn with_urls(mut self, login_url: impl Into<String>, activity_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self.activity_url = activity_url.into();
        self
    }

    /// 某一行的奖励分数类型下拉
    pub fn bonus_type_select(&self, handle: &CorrelationHandle) -> Locator {
        Locator::css(format!(
            "select[name=\"StudentPerformanceM[inputperformance][{}][type_of_bonus]\"]",
            handle.as_str()
        ))
    }

    /// 某一行的备注输入框
    pub fn remark_field(&self, handle: &CorrelationHandle) -> Locator {
        Locator::id(format!(
            "StudentPerformanceM_inputperformance_{}_remark",
            handle.as_str()
        ))
    }
}
