//! 导出适配模块
//!
//! 导出时不再过滤：规范化查询原样转交给外部导出处理方，由宿主决定如何序列化或发送。

use crate::core::catalog::Catalog;
use crate::core::error::StoreError;
use crate::core::models::{CanonicalQuery, KeywordScope, ALL_FIELDS_KEY};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

/// 导出请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// 页面标识
    pub page: String,
    /// 当前搜索范围的显示名（仅供调用方展示）
    pub scope_label: Option<String>,
    /// 查询摘要
    pub digest: String,
    /// 原样转交的查询
    pub query: CanonicalQuery,
    /// 请求时间
    pub requested_at: DateTime<Utc>,
}

impl ExportRequest {
    /// 根据目录和查询创建导出请求
    pub fn new(catalog: &Catalog, query: CanonicalQuery) -> Self {
        let scope_key = match &query.keyword_scope {
            KeywordScope::All => ALL_FIELDS_KEY,
            KeywordScope::Field(key) => key.as_str(),
        };
        let scope_label = catalog.search_field(scope_key).map(|s| s.label.clone());

        Self {
            page: catalog.page.clone(),
            scope_label,
            digest: query.digest(),
            query,
            requested_at: Utc::now(),
        }
    }
}

/// 外部导出处理方
pub trait ExportSink {
    fn export(&mut self, request: &ExportRequest) -> Result<()>;
}

/// 以 JSON 写出导出请求
pub struct JsonExportSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonExportSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ExportSink for JsonExportSink<W> {
    fn export(&mut self, request: &ExportRequest) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, request)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        tracing::info!("已导出查询 {} ({})", request.digest, request.page);
        Ok(())
    }
}

/// 在内存中收集导出请求
#[derive(Debug, Default)]
pub struct MemoryExportSink {
    pub requests: Vec<ExportRequest>,
}

impl ExportSink for MemoryExportSink {
    fn export(&mut self, request: &ExportRequest) -> Result<()> {
        self.requests.push(request.clone());
        Ok(())
    }
}

/// 保存的筛选：查询加用户起的名字
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub id: Uuid,
    pub name: String,
    pub page: String,
    pub query: CanonicalQuery,
    pub saved_at: DateTime<Utc>,
}

impl SavedFilter {
    /// 创建保存的筛选，名称去除首尾空白后不能为空
    pub fn new(name: &str, page: &str, query: CanonicalQuery) -> Result<Self, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyFilterName);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            page: page.to_string(),
            query,
            saved_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{FieldSchema, FieldType};

    fn catalog() -> Catalog {
        Catalog::builder("alerts")
            .field(FieldSchema::new("title", "标题", FieldType::Text).searchable())
            .search_field("全部字段", "all")
            .search_field("告警标题", "title")
            .build()
            .unwrap()
    }

    #[test]
    fn test_request_carries_scope_label_and_digest() {
        let mut query = CanonicalQuery::default();
        query.keyword_scope = KeywordScope::Field("title".into());
        query.keyword = "pump".into();

        let request = ExportRequest::new(&catalog(), query.clone());
        assert_eq!(request.scope_label.as_deref(), Some("告警标题"));
        assert_eq!(request.digest, query.digest());
        assert_eq!(request.query, query);
    }

    #[test]
    fn test_json_sink_writes_query_unchanged() {
        let mut query = CanonicalQuery::default();
        query.keyword = "valve".into();
        let request = ExportRequest::new(&catalog(), query);

        let mut sink = JsonExportSink::new(Vec::new());
        sink.export(&request).unwrap();

        let written: ExportRequest = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(written, request);
    }

    #[test]
    fn test_saved_filter_requires_name() {
        assert_eq!(
            SavedFilter::new("  ", "alerts", CanonicalQuery::default()),
            Err(StoreError::EmptyFilterName)
        );
        let saved = SavedFilter::new(" 本周高危 ", "alerts", CanonicalQuery::default()).unwrap();
        assert_eq!(saved.name, "本周高危");
    }
}
