//! 查询会话模块
//!
//! 整合目录、状态存储与求值器，代表一个页面的完整搜索/筛选流程。
//! 每次触发都在同一调用内完成"合成 → 求值"，显示的结果总是对应最近一次合成的查询。

use crate::core::catalog::Catalog;
use crate::core::composer::compose;
use crate::core::error::StoreError;
use crate::core::evaluator::Evaluator;
use crate::core::export::{ExportRequest, ExportSink, SavedFilter};
use crate::core::models::{CanonicalQuery, EngineConfig, Record};
use crate::core::state::{QueryStore, Trigger};
use anyhow::Result;
use std::sync::Arc;

/// 一次求值的结果
#[derive(Debug, Clone)]
pub struct QueryOutcome<R> {
    pub query: CanonicalQuery,
    pub digest: String,
    pub records: Vec<R>,
}

/// 页面查询会话
pub struct QuerySession<R> {
    /// 页面目录
    catalog: Arc<Catalog>,
    /// 引擎配置
    config: EngineConfig,
    /// 查询状态
    store: QueryStore,
    /// 页面记录
    records: Vec<R>,
    /// 最近一次求值结果
    latest: Option<QueryOutcome<R>>,
    /// 已保存的筛选
    saved: Vec<SavedFilter>,
}

impl<R: Record + Clone> QuerySession<R> {
    /// 创建新的会话
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig, records: Vec<R>) -> Self {
        Self {
            store: QueryStore::new(Arc::clone(&catalog)),
            catalog,
            config,
            records,
            latest: None,
            saved: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    /// 可变状态存储；修改后把返回的 [`Trigger`] 交给 [`QuerySession::handle`]
    pub fn store_mut(&mut self) -> &mut QueryStore {
        &mut self.store
    }

    /// 页面全部记录
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// 替换页面记录（宿主刷新数据）
    ///
    /// 已有结果时按最近一次合成的查询对新记录重新求值；未提交的状态修改不会提前生效。
    pub fn replace_records(&mut self, records: Vec<R>) {
        self.records = records;
        if let Some(outcome) = self.latest.take() {
            let records = self.evaluate_query(&outcome.query);
            self.latest = Some(QueryOutcome { records, ..outcome });
        }
    }

    /// 按当前状态合成查询
    pub fn compose(&self) -> CanonicalQuery {
        compose(self.store.state(), &self.catalog)
    }

    /// 执行"合成 → 求值"
    pub fn run(&mut self) -> &QueryOutcome<R> {
        let query = self.compose();
        let records = Evaluator::new(&self.catalog, &self.config).evaluate(&self.records, &query);
        let outcome = QueryOutcome {
            digest: query.digest(),
            query,
            records,
        };
        tracing::debug!(
            "页面 {} 查询 {} 命中 {} 条",
            self.catalog.page,
            outcome.digest,
            outcome.records.len()
        );
        self.latest.insert(outcome)
    }

    /// 处理状态修改返回的触发信号
    pub fn handle(&mut self, trigger: Trigger) -> Option<&QueryOutcome<R>> {
        match trigger {
            Trigger::Evaluate => Some(self.run()),
            Trigger::None => None,
        }
    }

    /// 点击搜索或回车
    pub fn search(&mut self) -> &[R] {
        &self.run().records
    }

    /// 应用高级筛选
    pub fn apply_filters(&mut self) -> &[R] {
        &self.run().records
    }

    /// 切换快捷筛选并立即求值
    pub fn toggle_quick_filter(&mut self, label: &str) -> Result<&[R], StoreError> {
        self.store.toggle_quick_filter(label)?;
        Ok(&self.run().records)
    }

    /// 重置高级筛选表单并按剩余条件求值；关键词和快捷筛选保持不变
    pub fn reset_advanced(&mut self) -> &[R] {
        self.store.reset_advanced();
        &self.run().records
    }

    /// 完全重置并显示全部记录
    pub fn reset(&mut self) -> &[R] {
        self.store.reset();
        &self.run().records
    }

    /// 当前应显示的记录；尚未求值时为全部记录
    pub fn results(&self) -> &[R] {
        match &self.latest {
            Some(outcome) => &outcome.records,
            None => &self.records,
        }
    }

    pub fn latest(&self) -> Option<&QueryOutcome<R>> {
        self.latest.as_ref()
    }

    /// 对任意查询求值，不影响当前状态和结果
    pub fn evaluate_query(&self, query: &CanonicalQuery) -> Vec<R> {
        Evaluator::new(&self.catalog, &self.config).evaluate(&self.records, query)
    }

    /// 导出：把当前合成的查询原样交给导出处理方，不做过滤
    pub fn export(&self, sink: &mut dyn ExportSink) -> Result<ExportRequest> {
        let request = ExportRequest::new(&self.catalog, self.compose());
        sink.export(&request)?;
        Ok(request)
    }

    /// 保存当前筛选
    pub fn save_filter(&mut self, name: &str) -> Result<&SavedFilter, StoreError> {
        let saved = SavedFilter::new(name, &self.catalog.page, self.compose())?;
        tracing::info!("已保存筛选「{}」", saved.name);
        self.saved.push(saved);
        Ok(&self.saved[self.saved.len() - 1])
    }

    pub fn saved_filters(&self) -> &[SavedFilter] {
        &self.saved
    }

    /// 删除保存的筛选
    pub fn remove_saved_filter(&mut self, id: &uuid::Uuid) -> bool {
        if let Some(pos) = self.saved.iter().position(|s| &s.id == id) {
            self.saved.remove(pos);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{FieldSchema, FieldType, FilterKind, FilterSpec, QuickFilterSpec};
    use crate::core::export::MemoryExportSink;
    use crate::core::models::{DynamicRecord, FieldValue, FilterValue};

    fn session() -> QuerySession<DynamicRecord> {
        let catalog = Catalog::builder("alerts")
            .field(FieldSchema::new("title", "标题", FieldType::Text).searchable())
            .field(FieldSchema::new("level", "级别", FieldType::Text))
            .search_field("全部", "all")
            .filter(FilterSpec::new("level", "级别", FilterKind::Text))
            .quick_filter(QuickFilterSpec::new("高危").patch("level", "high"))
            .build()
            .unwrap();
        let records = vec![
            DynamicRecord::new().with("title", "Pump failure").with("level", "high"),
            DynamicRecord::new().with("title", "Valve ok").with("level", "low"),
        ];
        QuerySession::new(Arc::new(catalog), EngineConfig::default(), records)
    }

    #[test]
    fn test_results_default_to_all_records() {
        let session = session();
        assert_eq!(session.results().len(), 2);
        assert!(session.latest().is_none());
    }

    #[test]
    fn test_quick_filter_toggle_evaluates_immediately() {
        let mut session = session();
        assert_eq!(session.toggle_quick_filter("高危").unwrap().len(), 1);
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.toggle_quick_filter("高危").unwrap().len(), 2);
        assert!(session.toggle_quick_filter("未知").is_err());
    }

    #[test]
    fn test_keyword_waits_for_search() {
        let mut session = session();
        let trigger = session.store_mut().set_keyword("valve").unwrap();
        assert!(session.handle(trigger).is_none());
        assert_eq!(session.results().len(), 2);

        assert_eq!(session.search().len(), 1);
        assert_eq!(session.reset().len(), 2);
    }

    #[test]
    fn test_export_forwards_query_without_filtering() {
        let mut session = session();
        session.store_mut().set_keyword("pump").unwrap();
        let mut sink = MemoryExportSink::default();

        let request = session.export(&mut sink).unwrap();
        assert_eq!(sink.requests, vec![request.clone()]);
        assert_eq!(request.query, session.compose());
        assert!(session.latest().is_none());
    }

    #[test]
    fn test_reset_advanced_keeps_keyword_and_quick_filters() {
        let mut session = session();
        session.toggle_quick_filter("高危").unwrap();
        session.store_mut().set_keyword("pump").unwrap();
        session.store_mut().toggle_advanced_panel();
        session
            .store_mut()
            .set_advanced_value("level", FilterValue::Literal(FieldValue::text("low")))
            .unwrap();
        assert!(session.apply_filters().is_empty());

        assert_eq!(session.reset_advanced().len(), 1);
        let state = session.store().state();
        assert!(state.advanced_values.is_empty());
        assert_eq!(state.keyword, "pump");
        assert!(state.active_quick_filters.contains("高危"));
        assert!(state.advanced_panel_open);
    }

    #[test]
    fn test_replace_records_keeps_active_query() {
        let mut session = session();
        session.toggle_quick_filter("高危").unwrap();
        assert_eq!(session.results().len(), 1);

        // 未提交的关键词不应在刷新数据时生效
        session.store_mut().set_keyword("valve").unwrap();
        session.replace_records(vec![
            DynamicRecord::new().with("title", "Pump failure").with("level", "high"),
            DynamicRecord::new().with("title", "Valve leak").with("level", "high"),
            DynamicRecord::new().with("title", "Valve ok").with("level", "low"),
        ]);

        assert_eq!(session.results().len(), 2);
        assert!(session
            .results()
            .iter()
            .all(|r| r.get("level") == Some(&FieldValue::text("high"))));
        assert_eq!(session.latest().unwrap().records.len(), 2);
    }

    #[test]
    fn test_replace_records_before_any_query_shows_everything() {
        let mut session = session();
        session.replace_records(vec![DynamicRecord::new().with("title", "Fan noise")]);
        assert!(session.latest().is_none());
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn test_save_filter_snapshots_composed_query() {
        let mut session = session();
        session.toggle_quick_filter("高危").unwrap();
        let id = session.save_filter("只看高危").unwrap().id;

        session.reset();
        let saved = &session.saved_filters()[0];
        assert_eq!(saved.page, "alerts");
        assert_eq!(session.evaluate_query(&saved.query).len(), 1);

        assert!(session.save_filter("").is_err());
        assert!(session.remove_saved_filter(&id));
        assert!(session.saved_filters().is_empty());
    }
}
