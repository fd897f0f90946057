//! 测试用的内存驱动
//!
//! 用一棵按定位器索引的节点表模拟页面：顶层定位器直接映射到节点列表，
//! 子节点按 (父节点, 定位器) 登记。点击和信号可以挂钩子来模拟页面反应。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::driver::{ControlRef, Locator, Signal, UiDriver};
use crate::layout::PageLayout;

pub(crate) type Hook = Arc<dyn Fn(&mut FakeDom) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FakeEvent {
    Navigate(String),
    Click(usize),
    Clear(usize),
    Type(usize, String),
    SetValue(usize, String),
    Signal(usize, Signal),
    Script(String),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeNode {
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub value: String,
    pub children: HashMap<Locator, Vec<usize>>,
    pub fail_click: bool,
}

impl FakeNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.fail_click = true;
        self
    }
}

#[derive(Default)]
pub(crate) struct FakeDom {
    pub nodes: Vec<FakeNode>,
    pub roots: HashMap<Locator, Vec<usize>>,
    pub location: String,
    pub events: Vec<FakeEvent>,
    pub on_click: HashMap<usize, Hook>,
    pub on_signal: HashMap<(usize, Signal), Hook>,
    pub script_result: JsonValue,
    pub generation: u64,
    pub close_count: usize,
}

impl FakeDom {
    pub fn add_node(&mut self, node: FakeNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// 新建节点并追加到顶层定位器下
    pub fn add_root(&mut self, locator: &Locator, node: FakeNode) -> usize {
        let id = self.add_node(node);
        self.roots.entry(locator.clone()).or_default().push(id);
        id
    }

    pub fn add_child(&mut self, parent: usize, locator: &Locator, node: FakeNode) -> usize {
        let id = self.add_node(node);
        self.nodes[parent]
            .children
            .entry(locator.clone())
            .or_default()
            .push(id);
        id
    }

    pub fn set_roots(&mut self, locator: &Locator, ids: Vec<usize>) {
        self.roots.insert(locator.clone(), ids);
    }

    pub fn node(&self, id: usize) -> &FakeNode {
        &self.nodes[id]
    }

    /// 构造一行表格：每个单元格一个 td，可选的「添加」按钮和 class 属性
    pub fn add_row(
        &mut self,
        layout: &PageLayout,
        cells: &[&str],
        row_class: Option<&str>,
        with_action: bool,
    ) -> usize {
        let mut row = FakeNode::default();
        if let Some(class) = row_class {
            row = row.with_attr("class", class);
        }
        let row_id = self.add_node(row);
        for text in cells {
            self.add_child(row_id, &layout.cell, FakeNode::text(*text));
        }
        if with_action {
            self.add_child(row_id, &layout.add_button, FakeNode::text("添加"));
        }
        row_id
    }

    /// 添加一个 `<select>`，选项为 (value, text)
    pub fn add_select(
        &mut self,
        layout: &PageLayout,
        locator: &Locator,
        options: &[(&str, &str)],
    ) -> usize {
        let select = self.add_root(locator, FakeNode::default());
        for (value, text) in options {
            self.add_child(
                select,
                &layout.option,
                FakeNode::text(*text).with_attr("value", value),
            );
        }
        select
    }

    pub fn on_click(&mut self, id: usize, hook: impl Fn(&mut FakeDom) + Send + Sync + 'static) {
        self.on_click.insert(id, Arc::new(hook));
    }

    pub fn on_signal(
        &mut self,
        id: usize,
        signal: Signal,
        hook: impl Fn(&mut FakeDom) + Send + Sync + 'static,
    ) {
        self.on_signal.insert((id, signal), Arc::new(hook));
    }

    pub fn clicks(&self, id: usize) -> usize {
        self.events
            .iter()
            .filter(|e| **e == FakeEvent::Click(id))
            .count()
    }

    pub fn scripts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                FakeEvent::Script(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    fn check(&self, control: &ControlRef) -> DriverResult<usize> {
        let id = control.id() as usize;
        if control.generation() != self.generation || id >= self.nodes.len() {
            return Err(DriverError::StaleControl {
                id: control.id(),
                generation: control.generation(),
            });
        }
        Ok(id)
    }

    fn issue(&self, ids: &[usize]) -> Vec<ControlRef> {
        ids.iter()
            .map(|id| ControlRef::new(*id as u64, self.generation))
            .collect()
    }
}

pub(crate) struct FakeDriver {
    dom: Mutex<FakeDom>,
}

impl FakeDriver {
    pub fn new(dom: FakeDom) -> Self {
        Self {
            dom: Mutex::new(dom),
        }
    }

    pub fn dom(&self) -> MutexGuard<'_, FakeDom> {
        self.dom.lock().expect("fake dom lock")
    }
}

#[async_trait]
impl UiDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        let mut dom = self.dom();
        dom.events.push(FakeEvent::Navigate(url.to_string()));
        dom.location = url.to_string();
        dom.generation += 1;
        Ok(())
    }

    async fn locate(&self, locator: &Locator) -> DriverResult<Option<ControlRef>> {
        let dom = self.dom();
        let ids = dom.roots.get(locator).cloned().unwrap_or_default();
        Ok(dom.issue(&ids).into_iter().next())
    }

    async fn locate_all(&self, locator: &Locator) -> DriverResult<Vec<ControlRef>> {
        let dom = self.dom();
        let ids = dom.roots.get(locator).cloned().unwrap_or_default();
        Ok(dom.issue(&ids))
    }

    async fn locate_within(
        &self,
        parent: &ControlRef,
        locator: &Locator,
    ) -> DriverResult<Vec<ControlRef>> {
        let dom = self.dom();
        let parent = dom.check(parent)?;
        let ids = dom.nodes[parent]
            .children
            .get(locator)
            .cloned()
            .unwrap_or_default();
        Ok(dom.issue(&ids))
    }

    async fn click(&self, control: &ControlRef) -> DriverResult<()> {
        let mut dom = self.dom();
        let id = dom.check(control)?;
        if dom.nodes[id].fail_click {
            return Err(DriverError::ActionFailed {
                action: "click",
                message: "element is not clickable".to_string(),
            });
        }
        dom.events.push(FakeEvent::Click(id));
        let hook = dom.on_click.get(&id).cloned();
        if let Some(hook) = hook {
            hook(&mut *dom);
        }
        Ok(())
    }

    async fn clear(&self, control: &ControlRef) -> DriverResult<()> {
        let mut dom = self.dom();
        let id = dom.check(control)?;
        dom.events.push(FakeEvent::Clear(id));
        dom.nodes[id].value.clear();
        Ok(())
    }

    async fn type_text(&self, control: &ControlRef, text: &str) -> DriverResult<()> {
        let mut dom = self.dom();
        let id = dom.check(control)?;
        dom.events.push(FakeEvent::Type(id, text.to_string()));
        dom.nodes[id].value.push_str(text);
        Ok(())
    }

    async fn read_text(&self, control: &ControlRef) -> DriverResult<String> {
        let dom = self.dom();
        let id = dom.check(control)?;
        Ok(dom.nodes[id].text.clone())
    }

    async fn read_attribute(
        &self,
        control: &ControlRef,
        name: &str,
    ) -> DriverResult<Option<String>> {
        let dom = self.dom();
        let id = dom.check(control)?;
        Ok(dom.nodes[id].attrs.get(name).cloned())
    }

    async fn set_value(&self, control: &ControlRef, value: &str) -> DriverResult<()> {
        let mut dom = self.dom();
        let id = dom.check(control)?;
        dom.events.push(FakeEvent::SetValue(id, value.to_string()));
        dom.nodes[id].value = value.to_string();
        Ok(())
    }

    async fn dispatch_signal(&self, control: &ControlRef, signal: Signal) -> DriverResult<()> {
        let mut dom = self.dom();
        let id = dom.check(control)?;
        dom.events.push(FakeEvent::Signal(id, signal));
        let hook = dom.on_signal.get(&(id, signal)).cloned();
        if let Some(hook) = hook {
            hook(&mut *dom);
        }
        Ok(())
    }

    async fn run_expression(&self, expression: &str) -> DriverResult<JsonValue> {
        let mut dom = self.dom();
        dom.events.push(FakeEvent::Script(expression.to_string()));
        Ok(dom.script_result.clone())
    }

    async fn current_location(&self) -> DriverResult<String> {
        Ok(self.dom().location.clone())
    }

    async fn release_controls(&self) {
        self.dom().generation += 1;
    }

    async fn close(&self) -> DriverResult<()> {
        self.dom().close_count += 1;
        Ok(())
    }
}
