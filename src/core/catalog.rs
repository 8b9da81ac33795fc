//! 筛选字段目录模块
//!
//! 页面一次性声明的静态描述：记录字段结构、关键词搜索范围、高级筛选项、
//! 快捷筛选和排序选项。引擎只通过这里声明过的字段读取记录。

use crate::core::composer::parse_sort;
use crate::core::error::CatalogError;
use crate::core::models::{FieldValue, ALL_FIELDS_KEY};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Bool,
}

/// 记录字段声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub field_type: FieldType,
    /// 参与"全部字段"关键词搜索
    #[serde(default)]
    pub searchable: bool,
    /// 允许作为排序字段
    #[serde(default)]
    pub sortable: bool,
}

impl FieldSchema {
    pub fn new(key: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            field_type,
            searchable: false,
            sortable: false,
        }
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}

/// 关键词搜索范围
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFieldSpec {
    pub label: String,
    /// 字段键，或哨兵 `"all"`
    pub key: String,
}

impl SearchFieldSpec {
    pub fn is_all_fields(&self) -> bool {
        self.key == ALL_FIELDS_KEY
    }
}

/// 高级筛选控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Text,
    SingleSelect,
    MultiSelect,
    DateRange,
    NumberRange,
}

impl FilterKind {
    /// 选择类控件必须提供选项
    pub fn requires_options(&self) -> bool {
        matches!(self, FilterKind::SingleSelect | FilterKind::MultiSelect)
    }

    /// 区间类控件绑定二元组
    pub fn is_range(&self) -> bool {
        matches!(self, FilterKind::DateRange | FilterKind::NumberRange)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Text => "文本",
            FilterKind::SingleSelect => "单选",
            FilterKind::MultiSelect => "多选",
            FilterKind::DateRange => "日期区间",
            FilterKind::NumberRange => "数值区间",
        }
    }
}

/// 选择项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
    pub label: String,
    pub value: FieldValue,
}

impl OptionItem {
    pub fn new(label: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

fn default_span() -> u8 {
    6
}

/// 高级筛选项声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub key: String,
    pub label: String,
    pub kind: FilterKind,
    #[serde(default)]
    pub options: Vec<OptionItem>,
    /// 栅格宽度（24 栅格）
    #[serde(default = "default_span")]
    pub span: u8,
}

impl FilterSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            options: Vec::new(),
            span: default_span(),
        }
    }

    pub fn with_options(mut self, options: Vec<OptionItem>) -> Self {
        self.options = options;
        self
    }

    pub fn with_span(mut self, span: u8) -> Self {
        self.span = span;
        self
    }
}

/// 快捷筛选颜色提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorHint {
    #[default]
    Default,
    Blue,
    Green,
    Orange,
    Red,
    Purple,
    Gold,
    Cyan,
}

/// 快捷筛选：带名字的预置字段补丁
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickFilterSpec {
    pub label: String,
    pub value_patch: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub color_hint: ColorHint,
}

impl QuickFilterSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value_patch: BTreeMap::new(),
            color_hint: ColorHint::Default,
        }
    }

    pub fn patch(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.value_patch.insert(key.into(), value.into());
        self
    }

    pub fn color(mut self, hint: ColorHint) -> Self {
        self.color_hint = hint;
        self
    }
}

/// 排序选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub label: String,
    /// "字段,asc" 或 "字段,desc"
    pub value: String,
}

/// 页面目录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// 页面标识
    pub page: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub search_fields: Vec<SearchFieldSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub quick_filters: Vec<QuickFilterSpec>,
    #[serde(default)]
    pub sorts: Vec<SortSpec>,
}

impl Catalog {
    /// 创建目录构建器
    pub fn builder(page: impl Into<String>) -> CatalogBuilder {
        CatalogBuilder {
            catalog: Catalog {
                page: page.into(),
                fields: Vec::new(),
                search_fields: Vec::new(),
                filters: Vec::new(),
                quick_filters: Vec::new(),
                sorts: Vec::new(),
            },
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn filter(&self, key: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.key == key)
    }

    pub fn quick_filter(&self, label: &str) -> Option<&QuickFilterSpec> {
        self.quick_filters.iter().find(|q| q.label == label)
    }

    pub fn sort(&self, value: &str) -> Option<&SortSpec> {
        self.sorts.iter().find(|s| s.value == value)
    }

    pub fn search_field(&self, key: &str) -> Option<&SearchFieldSpec> {
        self.search_fields.iter().find(|s| s.key == key)
    }

    /// "全部字段"搜索时参与匹配的字段键
    pub fn searchable_keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.searchable)
            .map(|f| f.key.as_str())
    }

    /// 校验目录
    ///
    /// 所有引用必须指向已声明字段；选择类筛选必须有选项；区间筛选必须绑定到
    /// 对应类型的字段；排序值必须可解析且指向可排序字段。
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.key.as_str()) {
                return Err(CatalogError::DuplicateField(field.key.clone()));
            }
        }

        let mut seen = HashSet::new();
        for scope in &self.search_fields {
            if !seen.insert(scope.key.as_str()) {
                return Err(CatalogError::DuplicateScope(scope.key.clone()));
            }
            if !scope.is_all_fields() {
                self.require_field("搜索范围", &scope.key)?;
            }
        }

        let mut seen = HashSet::new();
        for filter in &self.filters {
            if !seen.insert(filter.key.as_str()) {
                return Err(CatalogError::DuplicateFilter(filter.key.clone()));
            }
            let field = self.require_field("筛选项", &filter.key)?;
            if filter.kind.requires_options() && filter.options.is_empty() {
                return Err(CatalogError::MissingOptions(filter.key.clone()));
            }
            let kind_fits = match filter.kind {
                FilterKind::DateRange => field.field_type == FieldType::Date,
                FilterKind::NumberRange => field.field_type == FieldType::Number,
                _ => true,
            };
            if !kind_fits {
                return Err(CatalogError::KindMismatch {
                    key: filter.key.clone(),
                    kind: filter.kind,
                    field_type: field.field_type,
                });
            }
        }

        let mut seen = HashSet::new();
        for quick in &self.quick_filters {
            if !seen.insert(quick.label.as_str()) {
                return Err(CatalogError::DuplicateQuickFilter(quick.label.clone()));
            }
            for key in quick.value_patch.keys() {
                self.require_field(&format!("快捷筛选「{}」", quick.label), key)?;
            }
        }

        let mut seen = HashSet::new();
        for sort in &self.sorts {
            if !seen.insert(sort.value.as_str()) {
                return Err(CatalogError::DuplicateSort(sort.value.clone()));
            }
            let clause =
                parse_sort(&sort.value).ok_or_else(|| CatalogError::MalformedSort(sort.value.clone()))?;
            let field = self.require_field("排序选项", &clause.field)?;
            if !field.sortable {
                return Err(CatalogError::NotSortable(clause.field));
            }
        }

        Ok(())
    }

    fn require_field(&self, context: &str, key: &str) -> Result<&FieldSchema, CatalogError> {
        self.field(key).ok_or_else(|| CatalogError::UndeclaredField {
            context: context.to_string(),
            key: key.to_string(),
        })
    }
}

/// 目录构建器
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.catalog.fields.push(field);
        self
    }

    /// 声明搜索范围；`key` 为 `"all"` 时表示全部字段
    pub fn search_field(mut self, label: impl Into<String>, key: impl Into<String>) -> Self {
        self.catalog.search_fields.push(SearchFieldSpec {
            label: label.into(),
            key: key.into(),
        });
        self
    }

    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.catalog.filters.push(filter);
        self
    }

    pub fn quick_filter(mut self, quick: QuickFilterSpec) -> Self {
        self.catalog.quick_filters.push(quick);
        self
    }

    pub fn sort(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.catalog.sorts.push(SortSpec {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    /// 构建并校验
    pub fn build(self) -> Result<Catalog, CatalogError> {
        self.catalog.validate()?;
        Ok(self.catalog)
    }

    /// 构建但不校验
    pub fn build_unchecked(self) -> Catalog {
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CatalogBuilder {
        Catalog::builder("alerts")
            .field(FieldSchema::new("title", "标题", FieldType::Text).searchable())
            .field(FieldSchema::new("level", "级别", FieldType::Text))
            .field(FieldSchema::new("score", "评分", FieldType::Number).sortable())
            .field(FieldSchema::new("createTime", "创建时间", FieldType::Date).sortable())
    }

    #[test]
    fn test_valid_catalog_builds() {
        let catalog = base()
            .search_field("全部", "all")
            .search_field("标题", "title")
            .filter(
                FilterSpec::new("level", "级别", FilterKind::SingleSelect)
                    .with_options(vec![OptionItem::new("高", "high")]),
            )
            .filter(FilterSpec::new("score", "评分", FilterKind::NumberRange))
            .quick_filter(QuickFilterSpec::new("高危").patch("level", "high"))
            .sort("评分降序", "score,desc")
            .build()
            .unwrap();

        assert_eq!(catalog.searchable_keys().collect::<Vec<_>>(), vec!["title"]);
        assert!(catalog.quick_filter("高危").is_some());
        assert!(catalog.sort("score,desc").is_some());
    }

    #[test]
    fn test_select_without_options_is_rejected() {
        let err = base()
            .filter(FilterSpec::new("level", "级别", FilterKind::MultiSelect))
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::MissingOptions("level".into()));
    }

    #[test]
    fn test_range_kind_must_match_field_type() {
        let err = base()
            .filter(FilterSpec::new("title", "标题", FilterKind::DateRange))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::KindMismatch { .. }));
    }

    #[test]
    fn test_undeclared_references_are_rejected() {
        let err = base()
            .quick_filter(QuickFilterSpec::new("已关闭").patch("state", "closed"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::UndeclaredField { ref key, .. } if key == "state"));

        let err = base().search_field("来源", "source").build().unwrap_err();
        assert!(matches!(err, CatalogError::UndeclaredField { .. }));
    }

    #[test]
    fn test_sort_values_are_checked() {
        let err = base().sort("标题", "title,asc").build().unwrap_err();
        assert_eq!(err, CatalogError::NotSortable("title".into()));

        let err = base().sort("评分", "score;desc").build().unwrap_err();
        assert_eq!(err, CatalogError::MalformedSort("score;desc".into()));
    }

    #[test]
    fn test_catalog_deserializes_with_defaults() {
        let json = r#"{
            "page": "reports",
            "fields": [{"key": "name", "label": "名称", "searchable": true}],
            "filters": [{"key": "name", "label": "名称", "kind": "text"}]
        }"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();
        catalog.validate().unwrap();
        assert_eq!(catalog.fields[0].field_type, FieldType::Text);
        assert_eq!(catalog.filters[0].span, 6);
        assert!(catalog.sorts.is_empty());
    }
}
