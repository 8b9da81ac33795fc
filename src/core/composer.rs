//! 查询合成模块
//!
//! 把 QueryState 与页面目录合成为一个规范化查询，合并顺序固定：
//! 基础搜索 → 快捷筛选（按目录声明顺序，同键后者覆盖）→ 高级筛选（覆盖快捷筛选）→ 排序。
//! 合成过程不读取任何记录，也不会失败。

use crate::core::catalog::{Catalog, FilterKind};
use crate::core::models::{
    CanonicalQuery, FilterValue, KeywordScope, PatchValue, QueryState, SortClause,
    SortDirection, ALL_FIELDS_KEY,
};

/// 合成规范化查询
pub fn compose(state: &QueryState, catalog: &Catalog) -> CanonicalQuery {
    let mut query = CanonicalQuery::default();

    // 基础搜索：最多贡献一个范围 + 关键词
    let keyword = state.keyword.trim();
    if !keyword.is_empty() {
        if state.scope_key == ALL_FIELDS_KEY {
            query.keyword = keyword.to_string();
        } else if catalog.search_field(&state.scope_key).is_some() {
            query.keyword_scope = KeywordScope::Field(state.scope_key.clone());
            query.keyword = keyword.to_string();
        } else {
            tracing::warn!("搜索范围 {} 未在目录中声明，忽略关键词", state.scope_key);
        }
    }

    // 快捷筛选
    for label in &state.active_quick_filters {
        if catalog.quick_filter(label).is_none() {
            tracing::warn!("快捷筛选 {} 未在目录中声明，已忽略", label);
        }
    }
    for quick in catalog
        .quick_filters
        .iter()
        .filter(|q| state.active_quick_filters.contains(&q.label))
    {
        for (key, value) in &quick.value_patch {
            if catalog.field(key).is_none() {
                tracing::warn!("快捷筛选「{}」引用了未声明的字段 {}", quick.label, key);
                continue;
            }
            query
                .field_patches
                .insert(key.clone(), PatchValue::Equals { value: value.clone() });
        }
    }

    // 高级筛选
    for (key, value) in &state.advanced_values {
        let Some(spec) = catalog.filter(key) else {
            tracing::warn!("高级筛选项 {} 未在目录中声明，已忽略", key);
            continue;
        };
        if value.is_blank() {
            continue;
        }
        match to_patch(spec.kind, value) {
            Some(patch) => {
                query.field_patches.insert(key.clone(), patch);
            }
            None => {
                tracing::warn!("筛选项 {} 的值与类型 {:?} 不匹配，已忽略", key, spec.kind);
            }
        }
    }

    query.sort = state.sort_value.as_deref().and_then(parse_sort);

    query
}

/// 按控件类型把表单值转换成字段约束
fn to_patch(kind: FilterKind, value: &FilterValue) -> Option<PatchValue> {
    match (kind, value) {
        (FilterKind::Text | FilterKind::SingleSelect, FilterValue::Text(s)) => {
            Some(PatchValue::Equals { value: s.clone().into() })
        }
        (FilterKind::Text | FilterKind::SingleSelect, FilterValue::Literal(v)) => {
            Some(PatchValue::Equals { value: v.clone() })
        }
        (FilterKind::SingleSelect, FilterValue::Many(values)) if values.len() == 1 => {
            Some(PatchValue::Equals { value: values[0].clone() })
        }
        (FilterKind::MultiSelect, FilterValue::Many(values)) => {
            Some(PatchValue::OneOf { values: values.clone() })
        }
        (FilterKind::MultiSelect, FilterValue::Literal(v)) => {
            Some(PatchValue::OneOf { values: vec![v.clone()] })
        }
        (FilterKind::MultiSelect, FilterValue::Text(s)) => {
            Some(PatchValue::OneOf { values: vec![s.clone().into()] })
        }
        (FilterKind::DateRange, FilterValue::DateRange(start, end)) => Some(PatchValue::DateRange {
            start: *start,
            end: *end,
        }),
        (FilterKind::NumberRange, FilterValue::NumberRange(min, max)) => {
            Some(PatchValue::NumberRange { min: *min, max: *max })
        }
        _ => None,
    }
}

/// 解析 "字段,方向"；格式错误返回 `None`（不排序）
pub fn parse_sort(value: &str) -> Option<SortClause> {
    let (field, direction) = value.split_once(',')?;
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    Some(SortClause {
        field: field.to_string(),
        direction: SortDirection::parse(direction)?,
    })
}
