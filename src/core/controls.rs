//! 筛选控件描述模块
//!
//! 从目录生成与界面框架无关的控件描述。控件只能引用目录中声明过的字段。

use crate::core::catalog::{Catalog, ColorHint, FilterKind, OptionItem};
use crate::core::composer::parse_sort;
use crate::core::models::FieldValue;

/// 控件分组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlGroup {
    BasicSearch,
    QuickFilters,
    Advanced,
    Sort,
}

/// 控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    /// 范围选择 + 关键词输入
    SearchBox,
    TextInput,
    Select,
    MultiSelect,
    DateRangePicker,
    NumberRangeInput,
    QuickFilterChip,
    SortSelect,
}

impl From<FilterKind> for WidgetKind {
    fn from(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Text => WidgetKind::TextInput,
            FilterKind::SingleSelect => WidgetKind::Select,
            FilterKind::MultiSelect => WidgetKind::MultiSelect,
            FilterKind::DateRange => WidgetKind::DateRangePicker,
            FilterKind::NumberRange => WidgetKind::NumberRangeInput,
        }
    }
}

/// 控件描述
#[derive(Debug, Clone, PartialEq)]
pub struct ControlDescriptor {
    pub group: ControlGroup,
    pub widget: WidgetKind,
    /// 筛选项键；快捷筛选为标签；搜索框为 "scope"；排序为 "sort"
    pub key: String,
    pub label: String,
    pub options: Vec<OptionItem>,
    pub span: u8,
    pub color_hint: ColorHint,
}

/// 搜索框控件键
pub const SEARCH_CONTROL_KEY: &str = "scope";
/// 排序控件键
pub const SORT_CONTROL_KEY: &str = "sort";

/// 按目录生成控件描述
pub fn build_controls(catalog: &Catalog) -> Vec<ControlDescriptor> {
    let mut controls = Vec::new();

    if !catalog.search_fields.is_empty() {
        controls.push(ControlDescriptor {
            group: ControlGroup::BasicSearch,
            widget: WidgetKind::SearchBox,
            key: SEARCH_CONTROL_KEY.to_string(),
            label: "搜索".to_string(),
            options: catalog
                .search_fields
                .iter()
                .filter(|s| s.is_all_fields() || catalog.field(&s.key).is_some())
                .map(|s| OptionItem::new(s.label.clone(), FieldValue::Text(s.key.clone())))
                .collect(),
            span: 24,
            color_hint: ColorHint::Default,
        });
    }

    for quick in &catalog.quick_filters {
        if let Some(key) = quick.value_patch.keys().find(|k| catalog.field(k).is_none()) {
            tracing::warn!("快捷筛选「{}」引用未声明字段 {}，不渲染", quick.label, key);
            continue;
        }
        controls.push(ControlDescriptor {
            group: ControlGroup::QuickFilters,
            widget: WidgetKind::QuickFilterChip,
            key: quick.label.clone(),
            label: quick.label.clone(),
            options: Vec::new(),
            span: 0,
            color_hint: quick.color_hint,
        });
    }

    for filter in &catalog.filters {
        if catalog.field(&filter.key).is_none() {
            tracing::warn!("筛选项 {} 未绑定已声明字段，不渲染", filter.key);
            continue;
        }
        controls.push(ControlDescriptor {
            group: ControlGroup::Advanced,
            widget: filter.kind.into(),
            key: filter.key.clone(),
            label: filter.label.clone(),
            options: filter.options.clone(),
            span: filter.span,
            color_hint: ColorHint::Default,
        });
    }

    let sort_options: Vec<OptionItem> = catalog
        .sorts
        .iter()
        .filter(|s| {
            let sortable = parse_sort(&s.value)
                .and_then(|clause| catalog.field(&clause.field))
                .map(|field| field.sortable)
                .unwrap_or(false);
            if !sortable {
                tracing::warn!("排序选项 {} 未指向可排序字段，不渲染", s.value);
            }
            sortable
        })
        .map(|s| OptionItem::new(s.label.clone(), FieldValue::Text(s.value.clone())))
        .collect();
    if !sort_options.is_empty() {
        controls.push(ControlDescriptor {
            group: ControlGroup::Sort,
            widget: WidgetKind::SortSelect,
            key: SORT_CONTROL_KEY.to_string(),
            label: "排序".to_string(),
            options: sort_options,
            span: 6,
            color_hint: ColorHint::Default,
        });
    }

    controls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{FieldSchema, FieldType, FilterSpec, QuickFilterSpec};

    #[test]
    fn test_controls_reference_only_declared_fields() {
        let catalog = Catalog::builder("reports")
            .field(FieldSchema::new("name", "名称", FieldType::Text).searchable())
            .field(FieldSchema::new("passRate", "通过率", FieldType::Number).sortable())
            .search_field("全部", "all")
            .search_field("名称", "name")
            .search_field("作者", "author")
            .filter(FilterSpec::new("passRate", "通过率", FilterKind::NumberRange))
            .filter(FilterSpec::new("owner", "负责人", FilterKind::Text))
            .quick_filter(QuickFilterSpec::new("满分").patch("passRate", 100.0).color(ColorHint::Green))
            .quick_filter(QuickFilterSpec::new("我的").patch("owner", "张伟"))
            .sort("通过率降序", "passRate,desc")
            .sort("名称", "name,asc")
            .sort("优先级", "priority,desc")
            .build_unchecked();

        let controls = build_controls(&catalog);

        let search = &controls[0];
        assert_eq!(search.widget, WidgetKind::SearchBox);
        assert_eq!(search.options.len(), 2);

        let advanced: Vec<_> = controls
            .iter()
            .filter(|c| c.group == ControlGroup::Advanced)
            .collect();
        assert_eq!(advanced.len(), 1);
        assert_eq!(advanced[0].widget, WidgetKind::NumberRangeInput);
        assert!(advanced.iter().all(|c| catalog.field(&c.key).is_some()));

        let chips: Vec<_> = controls
            .iter()
            .filter(|c| c.widget == WidgetKind::QuickFilterChip)
            .collect();
        assert_eq!(chips.len(), 1);
        assert_eq!(chips[0].key, "满分");
        assert_eq!(chips[0].color_hint, ColorHint::Green);

        // name 未标记可排序，priority 未声明
        let sort = controls.last().unwrap();
        assert_eq!(sort.key, SORT_CONTROL_KEY);
        assert_eq!(sort.options.len(), 1);
        assert_eq!(sort.options[0].value, FieldValue::text("passRate,desc"));
    }

    #[test]
    fn test_sort_select_omitted_without_valid_options() {
        let catalog = Catalog::builder("reports")
            .field(FieldSchema::new("name", "名称", FieldType::Text))
            .sort("名称", "name,asc")
            .sort("坏值", "name")
            .build_unchecked();

        assert!(build_controls(&catalog)
            .iter()
            .all(|c| c.group != ControlGroup::Sort));
    }
}
