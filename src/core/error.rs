//! 错误类型定义
//!
//! 过滤与排序本身从不报错；这里只收录目录配置错误和状态存储拒绝的修改。

use crate::core::catalog::{FieldType, FilterKind};
use thiserror::Error;

/// 目录（Catalog）校验错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("字段重复声明: {0}")]
    DuplicateField(String),

    #[error("筛选项重复声明: {0}")]
    DuplicateFilter(String),

    #[error("搜索范围重复声明: {0}")]
    DuplicateScope(String),

    #[error("快捷筛选标签重复: {0}")]
    DuplicateQuickFilter(String),

    #[error("排序选项重复: {0}")]
    DuplicateSort(String),

    #[error("{context} 引用了未声明的字段: {key}")]
    UndeclaredField { context: String, key: String },

    #[error("筛选项 {0} 是选择类型，但没有提供任何选项")]
    MissingOptions(String),

    #[error("筛选项 {key} 的类型 {kind:?} 不能绑定到 {field_type:?} 字段")]
    KindMismatch {
        key: String,
        kind: FilterKind,
        field_type: FieldType,
    },

    #[error("排序值格式错误（应为 \"字段,asc|desc\"）: {0}")]
    MalformedSort(String),

    #[error("字段 {0} 未声明为可排序")]
    NotSortable(String),
}

/// 查询状态存储拒绝的修改
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("未知的搜索范围: {0}")]
    UnknownScope(String),

    #[error("未知的快捷筛选: {0}")]
    UnknownQuickFilter(String),

    #[error("未知的排序选项: {0}")]
    UnknownSort(String),

    #[error("未知的筛选项: {0}")]
    UnknownFilter(String),

    #[error("筛选名称不能为空")]
    EmptyFilterName,
}
