//! 页面数据源模块
//!
//! 从 JSON 文件读取页面目录与记录数组。目录在加载时校验，配置错误直接报告给调用方。

use crate::core::catalog::Catalog;
use crate::core::models::DynamicRecord;
use anyhow::{Context, Result};
use std::path::Path;

/// 读取并校验页面目录
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取目录文件失败: {}", path.display()))?;
    let catalog: Catalog = serde_json::from_str(&content)
        .with_context(|| format!("解析目录文件失败: {}", path.display()))?;
    catalog
        .validate()
        .with_context(|| format!("目录 {} 校验失败", catalog.page))?;

    tracing::info!(
        "已加载页面目录 {}: {} 个字段, {} 个筛选项, {} 个快捷筛选",
        catalog.page,
        catalog.fields.len(),
        catalog.filters.len(),
        catalog.quick_filters.len()
    );
    Ok(catalog)
}

/// 保存页面目录
pub fn save_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(catalog)?)?;
    Ok(())
}

/// 读取记录数组（JSON 对象数组）
pub fn load_records(path: &Path) -> Result<Vec<DynamicRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取记录文件失败: {}", path.display()))?;
    let records: Vec<DynamicRecord> = serde_json::from_str(&content)
        .with_context(|| format!("解析记录文件失败: {}", path.display()))?;
    tracing::info!("已加载 {} 条记录", records.len());
    Ok(records)
}
