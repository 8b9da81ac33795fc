//! 查询状态存储模块
//!
//! 只记录用户在界面上的原始选择，不做任何过滤。每次成功修改后通知订阅者，
//! 并通过 [`Trigger`] 告诉宿主是否需要立即执行"合成 → 求值"流程。

use crate::core::catalog::Catalog;
use crate::core::error::StoreError;
use crate::core::models::{FilterValue, QueryState, ALL_FIELDS_KEY};
use std::sync::Arc;

/// 修改后宿主需要做什么
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// 等待显式的搜索/应用
    None,
    /// 立即重新求值
    Evaluate,
}

/// 状态变更事件
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ScopeChanged(String),
    KeywordChanged(String),
    QuickFilterToggled { label: String, active: bool },
    AdvancedValueChanged(String),
    AdvancedValueCleared(String),
    AdvancedReset,
    SortChanged(Option<String>),
    PanelToggled(bool),
    Reset,
    Restored,
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// 查询状态存储
pub struct QueryStore {
    /// 页面目录
    catalog: Arc<Catalog>,
    /// 当前状态
    state: QueryState,
    /// 订阅者
    listeners: Vec<Listener>,
}

impl QueryStore {
    /// 创建新的状态存储
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            state: QueryState::default(),
            listeners: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// 当前状态（只读）
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// 订阅状态变更
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// 设置搜索范围
    pub fn set_scope(&mut self, key: &str) -> Result<Trigger, StoreError> {
        if key != ALL_FIELDS_KEY && self.catalog.search_field(key).is_none() {
            tracing::warn!("拒绝未知的搜索范围: {}", key);
            return Err(StoreError::UnknownScope(key.to_string()));
        }
        self.state.scope_key = key.to_string();
        self.notify(StoreEvent::ScopeChanged(key.to_string()));
        Ok(Trigger::None)
    }

    /// 设置关键词
    pub fn set_keyword(&mut self, text: &str) -> Result<Trigger, StoreError> {
        self.state.keyword = text.to_string();
        self.notify(StoreEvent::KeywordChanged(text.to_string()));
        Ok(Trigger::None)
    }

    /// 切换快捷筛选，第二次切换即取消；快捷筛选无需点击搜索即生效
    pub fn toggle_quick_filter(&mut self, label: &str) -> Result<Trigger, StoreError> {
        if self.catalog.quick_filter(label).is_none() {
            tracing::warn!("拒绝未知的快捷筛选: {}", label);
            return Err(StoreError::UnknownQuickFilter(label.to_string()));
        }

        let active = if self.state.active_quick_filters.remove(label) {
            false
        } else {
            self.state.active_quick_filters.insert(label.to_string());
            true
        };

        self.notify(StoreEvent::QuickFilterToggled {
            label: label.to_string(),
            active,
        });
        Ok(Trigger::Evaluate)
    }

    /// 设置高级筛选值
    pub fn set_advanced_value(
        &mut self,
        key: &str,
        value: FilterValue,
    ) -> Result<Trigger, StoreError> {
        if self.catalog.filter(key).is_none() {
            tracing::warn!("拒绝未知的筛选项: {}", key);
            return Err(StoreError::UnknownFilter(key.to_string()));
        }
        self.state.advanced_values.insert(key.to_string(), value);
        self.notify(StoreEvent::AdvancedValueChanged(key.to_string()));
        Ok(Trigger::None)
    }

    /// 清除单个高级筛选值
    pub fn clear_advanced_value(&mut self, key: &str) -> Result<Trigger, StoreError> {
        if self.catalog.filter(key).is_none() {
            return Err(StoreError::UnknownFilter(key.to_string()));
        }
        if self.state.advanced_values.remove(key).is_some() {
            self.notify(StoreEvent::AdvancedValueCleared(key.to_string()));
        }
        Ok(Trigger::None)
    }

    /// 重置高级筛选表单（同时清除排序）
    pub fn reset_advanced(&mut self) -> Trigger {
        self.state.advanced_values.clear();
        self.state.sort_value = None;
        self.notify(StoreEvent::AdvancedReset);
        Trigger::None
    }

    /// 设置排序；`None` 表示不排序
    pub fn set_sort(&mut self, value: Option<&str>) -> Result<Trigger, StoreError> {
        if let Some(v) = value {
            if self.catalog.sort(v).is_none() {
                tracing::warn!("拒绝未知的排序选项: {}", v);
                return Err(StoreError::UnknownSort(v.to_string()));
            }
        }
        self.state.sort_value = value.map(str::to_string);
        self.notify(StoreEvent::SortChanged(self.state.sort_value.clone()));
        Ok(Trigger::None)
    }

    /// 展开/收起高级筛选面板，返回新的展开状态
    pub fn toggle_advanced_panel(&mut self) -> bool {
        self.state.advanced_panel_open = !self.state.advanced_panel_open;
        let open = self.state.advanced_panel_open;
        self.notify(StoreEvent::PanelToggled(open));
        open
    }

    /// 完全重置（导航离开或点击"重置"）
    pub fn reset(&mut self) -> Trigger {
        self.state = QueryState::default();
        self.notify(StoreEvent::Reset);
        Trigger::Evaluate
    }

    /// 状态快照
    pub fn snapshot(&self) -> QueryState {
        self.state.clone()
    }

    /// 恢复快照；快照中任何引用不在目录中时整体拒绝
    pub fn restore(&mut self, state: QueryState) -> Result<Trigger, StoreError> {
        if state.scope_key != ALL_FIELDS_KEY && self.catalog.search_field(&state.scope_key).is_none()
        {
            return Err(StoreError::UnknownScope(state.scope_key));
        }
        if let Some(label) = state
            .active_quick_filters
            .iter()
            .find(|label| self.catalog.quick_filter(label).is_none())
        {
            return Err(StoreError::UnknownQuickFilter(label.clone()));
        }
        if let Some(key) = state
            .advanced_values
            .keys()
            .find(|key| self.catalog.filter(key).is_none())
        {
            return Err(StoreError::UnknownFilter(key.clone()));
        }
        if let Some(sort) = &state.sort_value {
            if self.catalog.sort(sort).is_none() {
                return Err(StoreError::UnknownSort(sort.clone()));
            }
        }

        self.state = state;
        self.notify(StoreEvent::Restored);
        Ok(Trigger::Evaluate)
    }

    fn notify(&mut self, event: StoreEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{FieldSchema, FieldType, FilterKind, FilterSpec, QuickFilterSpec};
    use crate::core::composer::compose;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> QueryStore {
        let catalog = Catalog::builder("alerts")
            .field(FieldSchema::new("title", "标题", FieldType::Text).searchable())
            .field(FieldSchema::new("level", "级别", FieldType::Text))
            .field(FieldSchema::new("score", "评分", FieldType::Number).sortable())
            .search_field("全部", "all")
            .search_field("标题", "title")
            .filter(FilterSpec::new("title", "标题", FilterKind::Text))
            .filter(FilterSpec::new("score", "评分", FilterKind::NumberRange))
            .quick_filter(QuickFilterSpec::new("高危").patch("level", "high"))
            .sort("评分", "score,desc")
            .build()
            .unwrap();
        QueryStore::new(Arc::new(catalog))
    }

    #[test]
    fn test_quick_filter_toggle_is_idempotent() {
        let mut store = store();
        let before = store.snapshot();
        let query_before = compose(store.state(), store.catalog());

        assert_eq!(store.toggle_quick_filter("高危"), Ok(Trigger::Evaluate));
        assert!(store.state().active_quick_filters.contains("高危"));
        assert_eq!(store.toggle_quick_filter("高危"), Ok(Trigger::Evaluate));

        assert_eq!(store.state(), &before);
        assert_eq!(compose(store.state(), store.catalog()), query_before);
    }

    #[test]
    fn test_unknown_references_are_rejected_without_change() {
        let mut store = store();
        let before = store.snapshot();

        assert_eq!(
            store.set_scope("source"),
            Err(StoreError::UnknownScope("source".into()))
        );
        assert!(store.toggle_quick_filter("低危").is_err());
        assert!(store.set_sort(Some("title,asc")).is_err());
        assert!(store
            .set_advanced_value("owner", FilterValue::Text("bob".into()))
            .is_err());

        assert_eq!(store.state(), &before);
    }

    #[test]
    fn test_reset_advanced_clears_values_and_sort() {
        let mut store = store();
        store
            .set_advanced_value("score", FilterValue::NumberRange(Some(1.0), None))
            .unwrap();
        store.set_sort(Some("score,desc")).unwrap();
        store.set_keyword("pump").unwrap();

        assert_eq!(store.reset_advanced(), Trigger::None);
        assert!(store.state().advanced_values.is_empty());
        assert_eq!(store.state().sort_value, None);
        assert_eq!(store.state().keyword, "pump");
    }

    #[test]
    fn test_panel_toggle_does_not_trigger() {
        let mut store = store();
        assert!(store.toggle_advanced_panel());
        assert!(!store.toggle_advanced_panel());
        assert_eq!(store.set_keyword("x"), Ok(Trigger::None));
    }

    #[test]
    fn test_listeners_receive_events() {
        let mut store = store();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        store.set_scope("title").unwrap();
        store.toggle_quick_filter("高危").unwrap();
        let _ = store.set_scope("nope");

        assert_eq!(
            *events.borrow(),
            vec![
                StoreEvent::ScopeChanged("title".into()),
                StoreEvent::QuickFilterToggled {
                    label: "高危".into(),
                    active: true
                },
            ]
        );
    }

    #[test]
    fn test_restore_round_trips_snapshot() {
        let mut store = store();
        store.set_scope("title").unwrap();
        store.set_keyword("pump").unwrap();
        store.toggle_quick_filter("高危").unwrap();
        let snapshot = store.snapshot();

        store.reset();
        assert_eq!(store.restore(snapshot.clone()), Ok(Trigger::Evaluate));
        assert_eq!(store.state(), &snapshot);

        let mut bad = snapshot;
        bad.sort_value = Some("title,asc".into());
        assert_eq!(
            store.restore(bad),
            Err(StoreError::UnknownSort("title,asc".into()))
        );
    }
}
