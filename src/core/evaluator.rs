//! 谓词/排序求值模块
//!
//! 对内存中的记录数组执行规范化查询：关键词过滤 → 字段约束（AND）→ 稳定排序。
//! 输入数组不会被修改；缺失字段一律视为不匹配；任何数据或筛选形态问题都不会报错。

use crate::core::catalog::{Catalog, FieldType};
use crate::core::models::{
    CanonicalQuery, EngineConfig, FieldValue, KeywordScope, MissingValuePosition, PatchValue,
    Record, SortClause, SortDirection,
};
use std::cmp::Ordering;

/// 查询求值器
pub struct Evaluator<'a> {
    catalog: &'a Catalog,
    config: &'a EngineConfig,
}

impl<'a> Evaluator<'a> {
    /// 创建求值器
    pub fn new(catalog: &'a Catalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// 求值并返回新的记录数组
    pub fn evaluate<R: Record + Clone>(&self, records: &[R], query: &CanonicalQuery) -> Vec<R> {
        self.evaluate_refs(records, query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// 求值并返回记录引用
    pub fn evaluate_refs<'r, R: Record>(
        &self,
        records: &'r [R],
        query: &CanonicalQuery,
    ) -> Vec<&'r R> {
        let keyword = query.keyword.to_lowercase();
        let search_keys = self.keyword_fields(query);
        let patches = self.resolved_patches(query);

        let mut matched: Vec<&R> = records
            .iter()
            .filter(|record| {
                self.matches_keyword(*record, &keyword, search_keys.as_deref())
                    && patches
                        .iter()
                        .all(|(key, patch)| self.matches_patch(*record, key, patch))
            })
            .collect();

        if let Some(sort) = &query.sort {
            self.sort_records(&mut matched, sort);
        }

        tracing::debug!(
            "查询求值完成: {} 条记录中命中 {} 条",
            records.len(),
            matched.len()
        );
        matched
    }

    /// 关键词参与匹配的字段；`None` 表示跳过关键词阶段
    fn keyword_fields(&self, query: &CanonicalQuery) -> Option<Vec<&'a str>> {
        if query.keyword.is_empty() {
            return None;
        }

        let catalog: &'a Catalog = self.catalog;
        match &query.keyword_scope {
            KeywordScope::All => {
                let keys: Vec<&str> = catalog.searchable_keys().collect();
                if keys.is_empty() {
                    tracing::warn!("页面 {} 没有声明可搜索字段，忽略关键词", catalog.page);
                    return None;
                }
                Some(keys)
            }
            KeywordScope::Field(key) => match catalog.field(key) {
                Some(field) => Some(vec![field.key.as_str()]),
                None => {
                    tracing::warn!("搜索字段 {} 未在目录中声明，忽略关键词", key);
                    None
                }
            },
        }
    }

    /// 过滤掉目录中未声明的约束键
    fn resolved_patches<'q>(&self, query: &'q CanonicalQuery) -> Vec<(&'q str, &'q PatchValue)> {
        query
            .field_patches
            .iter()
            .filter(|(key, _)| {
                let declared = self.catalog.field(key).is_some();
                if !declared {
                    tracing::warn!("筛选字段 {} 未在目录中声明，约束已忽略", key);
                }
                declared
            })
            .map(|(key, patch)| (key.as_str(), patch))
            .collect()
    }

    fn matches_keyword<R: Record>(&self, record: &R, keyword: &str, keys: Option<&[&str]>) -> bool {
        let Some(keys) = keys else {
            return true;
        };
        keys.iter().any(|key| {
            record
                .field(key)
                .map(|value| value.to_string().to_lowercase().contains(keyword))
                .unwrap_or(false)
        })
    }

    fn matches_patch<R: Record>(&self, record: &R, key: &str, patch: &PatchValue) -> bool {
        let Some(value) = record.field(key) else {
            return false;
        };

        match patch {
            PatchValue::Equals { value: expected } => value.exact_eq(expected),
            PatchValue::OneOf { values } => values.iter().any(|v| value.exact_eq(v)),
            PatchValue::DateRange { start, end } => {
                match value.as_date(&self.config.date_formats) {
                    Some(date) => {
                        start.map_or(true, |s| s <= date) && end.map_or(true, |e| date <= e)
                    }
                    None => false,
                }
            }
            PatchValue::NumberRange { min, max } => match value.as_number() {
                Some(n) => min.map_or(true, |m| m <= n) && max.map_or(true, |m| n <= m),
                None => false,
            },
        }
    }

    /// 稳定排序；字段未声明或不可排序时保持原顺序
    fn sort_records<R: Record>(&self, records: &mut Vec<&R>, sort: &SortClause) {
        let field_type = match self.catalog.field(&sort.field) {
            Some(field) if field.sortable => field.field_type,
            Some(_) => {
                tracing::warn!("字段 {} 不可排序，保持原顺序", sort.field);
                return;
            }
            None => {
                tracing::warn!("排序字段 {} 未在目录中声明，保持原顺序", sort.field);
                return;
            }
        };

        let mut keyed: Vec<(Option<FieldValue>, &R)> = records
            .iter()
            .map(|record| (self.sort_key(*record, &sort.field, field_type), *record))
            .collect();

        let missing = self.config.missing_values;
        keyed.sort_by(|(a, _), (b, _)| compare_keys(a.as_ref(), b.as_ref(), sort.direction, missing));

        *records = keyed.into_iter().map(|(_, record)| record).collect();
    }

    /// 按声明的字段类型转换排序键；转换失败时保留原值
    fn sort_key<R: Record>(
        &self,
        record: &R,
        key: &str,
        field_type: FieldType,
    ) -> Option<FieldValue> {
        let raw = record.field(key)?;
        let typed = match field_type {
            FieldType::Date => raw
                .as_datetime(&self.config.date_formats)
                .map(FieldValue::DateTime),
            FieldType::Number => raw.as_number().map(FieldValue::Number),
            FieldType::Text | FieldType::Bool => None,
        };
        Some(typed.unwrap_or(raw))
    }
}

/// 排序键比较；缺失值的位置与方向无关
fn compare_keys(
    a: Option<&FieldValue>,
    b: Option<&FieldValue>,
    direction: SortDirection,
    missing: MissingValuePosition,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.natural_cmp(b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
        (None, None) => Ordering::Equal,
        (None, Some(_)) => match missing {
            MissingValuePosition::First => Ordering::Less,
            MissingValuePosition::Last => Ordering::Greater,
        },
        (Some(_), None) => match missing {
            MissingValuePosition::First => Ordering::Greater,
            MissingValuePosition::Last => Ordering::Less,
        },
    }
}
