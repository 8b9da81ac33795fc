//! 核心数据模型定义
//!
//! 包括记录字段值、页面的查询状态（QueryState）、合成后的规范化查询
//! （CanonicalQuery）以及引擎配置。规范化查询与具体页面无关，可以直接交给
//! 求值器或导出处理方。

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// "全部字段"搜索范围的哨兵键
pub const ALL_FIELDS_KEY: &str = "all";

/// 记录中单个字段的值
///
/// 缺失字段统一用 `Option::None` 表示，不在枚举里单独建模。
/// 从 JSON 读取时字符串一律为 `Text`，日期按字段类型在求值时解析。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    /// 文本值快捷构造
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// 数值视图：数字本身，或可以解析成数字的文本
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// 日期视图（按自然日）：日期、日期时间，或按给定格式解析的文本
    pub fn as_date(&self, formats: &[String]) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::DateTime(dt) => Some(dt.date()),
            FieldValue::Text(s) => parse_date_text(s, formats),
            _ => None,
        }
    }

    /// 日期时间视图：纯日期取当天零点，文本按给定格式解析
    pub fn as_datetime(&self, formats: &[String]) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            FieldValue::DateTime(dt) => Some(*dt),
            FieldValue::Text(s) => parse_datetime_text(s, formats),
            _ => None,
        }
    }

    /// 精确相等（区分大小写）
    ///
    /// 同类型直接比较；类型不同时比较字符串化结果，
    /// 因此 `Number(5.0)` 与 `Text("5")` 视为相等。
    pub fn exact_eq(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Date(a), FieldValue::Date(b)) => a == b,
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a == b,
            (FieldValue::DateTime(dt), FieldValue::Text(t))
            | (FieldValue::Text(t), FieldValue::DateTime(dt)) => match t.trim().parse::<NaiveDateTime>() {
                Ok(parsed) => parsed == *dt,
                Err(_) => dt.to_string() == *t,
            },
            _ => self.to_string() == other.to_string(),
        }
    }

    /// 自然顺序比较，用于排序
    ///
    /// 不同类型之间按类型序号排列，保证结果是全序。
    pub fn natural_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => a.cmp(b),
            (FieldValue::Date(a), FieldValue::DateTime(b)) => a.and_time(NaiveTime::MIN).cmp(b),
            (FieldValue::DateTime(a), FieldValue::Date(b)) => a.cmp(&b.and_time(NaiveTime::MIN)),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Bool(_) => 0,
            FieldValue::Number(_) => 1,
            FieldValue::Date(_) | FieldValue::DateTime(_) => 2,
            FieldValue::Text(_) => 3,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        json_to_field(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("字段值必须是字符串、数字或布尔值: {}", value))
        })
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

/// 按配置的格式把文本解析为自然日，RFC3339 始终尝试
pub fn parse_date_text(text: &str, formats: &[String]) -> Option<NaiveDate> {
    parse_datetime_text(text, formats).map(|dt| dt.date())
}

/// 按配置的格式把文本解析为日期时间；只有日期的格式取当天零点
pub fn parse_datetime_text(text: &str, formats: &[String]) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_local())
}

/// 可被引擎读取字段的记录
///
/// 引擎只通过目录中声明的字段键访问记录，宿主可以为自己的结构体实现此 trait。
pub trait Record {
    /// 读取字段值，缺失返回 `None`
    fn field(&self, key: &str) -> Option<FieldValue>;
}

/// 通用的键值记录
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DynamicRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl DynamicRecord {
    /// 创建空记录
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式设置字段
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// 设置字段
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// 读取字段引用
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Record for DynamicRecord {
    fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).cloned()
    }
}

impl<'de> Deserialize<'de> for DynamicRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from(map))
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for DynamicRecord {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let fields = map
            .iter()
            .filter_map(|(k, v)| json_to_field(v).map(|fv| (k.clone(), fv)))
            .collect();
        Self { fields }
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn field(&self, key: &str) -> Option<FieldValue> {
        self.get(key).and_then(json_to_field)
    }
}

/// JSON 值转字段值；null、数组、对象视为缺失
fn json_to_field(value: &serde_json::Value) -> Option<FieldValue> {
    match value {
        serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
        serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number),
        serde_json::Value::Bool(b) => Some(FieldValue::Bool(*b)),
        _ => None,
    }
}

/// 高级筛选表单中的原始值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    /// 文本输入
    Text(String),
    /// 单选值
    Literal(FieldValue),
    /// 多选值
    Many(Vec<FieldValue>),
    /// 日期区间，`None` 表示该端不设限
    DateRange(Option<NaiveDate>, Option<NaiveDate>),
    /// 数值区间，`None` 表示该端不设限
    NumberRange(Option<f64>, Option<f64>),
}

impl FilterValue {
    /// 表单未填写：空白文本、空多选、两端都为空的区间
    pub fn is_blank(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.trim().is_empty(),
            FilterValue::Literal(FieldValue::Text(s)) => s.is_empty(),
            FilterValue::Literal(_) => false,
            FilterValue::Many(values) => values.is_empty(),
            FilterValue::DateRange(start, end) => start.is_none() && end.is_none(),
            FilterValue::NumberRange(min, max) => min.is_none() && max.is_none(),
        }
    }
}

/// 规范化查询中的单个字段约束
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchValue {
    Equals { value: FieldValue },
    OneOf { values: Vec<FieldValue> },
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    NumberRange { min: Option<f64>, max: Option<f64> },
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// 解析 "asc" / "desc"（忽略大小写与空白）
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// 排序子句
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

/// 关键词搜索范围
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeywordScope {
    /// 所有可搜索字段（OR）
    #[default]
    All,
    /// 单个字段
    Field(String),
}

/// 规范化查询
///
/// 每次搜索/筛选触发时重新合成，合成后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CanonicalQuery {
    pub keyword_scope: KeywordScope,
    pub keyword: String,
    pub field_patches: BTreeMap<String, PatchValue>,
    pub sort: Option<SortClause>,
}

impl CanonicalQuery {
    /// 不包含任何约束和排序
    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty() && self.field_patches.is_empty() && self.sort.is_none()
    }

    /// 查询摘要：规范 JSON 的 SHA-256 前 16 字节
    ///
    /// 字段约束用有序映射保存，相同的查询总是得到相同的摘要。
    pub fn digest(&self) -> String {
        use sha2::{Digest, Sha256};

        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        hex::encode(&hasher.finalize()[..16])
    }
}

/// 页面的查询状态
///
/// 页面/会话内唯一可变的查询实体，导航或显式重置时恢复默认。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryState {
    /// 当前搜索范围键
    pub scope_key: String,
    /// 关键词
    pub keyword: String,
    /// 已激活的快捷筛选标签
    pub active_quick_filters: BTreeSet<String>,
    /// 高级筛选表单值
    pub advanced_values: BTreeMap<String, FilterValue>,
    /// 选中的排序值（"字段,方向"）
    pub sort_value: Option<String>,
    /// 高级筛选面板是否展开
    pub advanced_panel_open: bool,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            scope_key: ALL_FIELDS_KEY.to_string(),
            keyword: String::new(),
            active_quick_filters: BTreeSet::new(),
            advanced_values: BTreeMap::new(),
            sort_value: None,
            advanced_panel_open: false,
        }
    }
}

/// 缺少排序字段的记录放在哪一端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePosition {
    First,
    #[default]
    Last,
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 缺失排序字段的位置（与排序方向无关）
    pub missing_values: MissingValuePosition,
    /// 文本字段按日期解析时尝试的格式
    pub date_formats: Vec<String>,
    /// RUST_LOG 未设置时使用的日志过滤
    pub log_filter: String,
    /// 页面目录 JSON 文件
    pub catalog_path: Option<PathBuf>,
    /// 页面记录 JSON 文件
    pub records_path: Option<PathBuf>,
    /// 导出文件默认目录
    pub export_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            missing_values: MissingValuePosition::Last,
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%d %H:%M".to_string(),
                "%Y/%m/%d".to_string(),
            ],
            log_filter: "info".to_string(),
            catalog_path: None,
            records_path: None,
            export_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> Vec<String> {
        EngineConfig::default().date_formats
    }

    #[test]
    fn test_number_display_drops_integral_fraction() {
        assert_eq!(FieldValue::Number(90.0).to_string(), "90");
        assert_eq!(FieldValue::Number(92.5).to_string(), "92.5");
    }

    #[test]
    fn test_exact_eq_is_case_sensitive() {
        assert!(FieldValue::text("high").exact_eq(&FieldValue::text("high")));
        assert!(!FieldValue::text("High").exact_eq(&FieldValue::text("high")));
        assert!(FieldValue::Number(5.0).exact_eq(&FieldValue::text("5")));
    }

    #[test]
    fn test_text_parses_as_date() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(FieldValue::text("2024-03-09").as_date(&formats()), Some(d));
        assert_eq!(FieldValue::text("2024-03-09 18:20:00").as_date(&formats()), Some(d));
        assert_eq!(FieldValue::text("2024-03-09T18:20:00+08:00").as_date(&formats()), Some(d));
        assert_eq!(FieldValue::text("昨天").as_date(&formats()), None);
    }

    #[test]
    fn test_date_like_strings_deserialize_as_text() {
        let values: Vec<FieldValue> =
            serde_json::from_str(r#"["2024-05-01", "2024-05-01T09:00:00", 3, true]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::text("2024-05-01"),
                FieldValue::text("2024-05-01T09:00:00"),
                FieldValue::Number(3.0),
                FieldValue::Bool(true),
            ]
        );
        assert!(serde_json::from_str::<FieldValue>("null").is_err());
    }

    #[test]
    fn test_datetime_equals_iso_text() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert!(FieldValue::DateTime(dt).exact_eq(&FieldValue::text("2024-05-01T09:00:00")));
        assert!(FieldValue::text("2024-05-01 09:00:00").exact_eq(&FieldValue::DateTime(dt)));
        assert!(!FieldValue::DateTime(dt).exact_eq(&FieldValue::text("2024-05-01T09:30:00")));
    }

    #[test]
    fn test_natural_cmp_orders_mixed_types_by_rank() {
        assert_eq!(
            FieldValue::Number(100.0).natural_cmp(&FieldValue::text("a")),
            Ordering::Less
        );
        assert_eq!(
            FieldValue::Number(2.0).natural_cmp(&FieldValue::Number(10.0)),
            Ordering::Less
        );
    }

    #[test]
    fn test_dynamic_record_from_json_skips_nulls() {
        let record: DynamicRecord = serde_json::from_str(
            r#"{"title": "Pump failure", "score": 5, "owner": null, "tags": ["a"]}"#,
        )
        .unwrap();

        assert_eq!(record.field("title"), Some(FieldValue::text("Pump failure")));
        assert_eq!(record.field("score"), Some(FieldValue::Number(5.0)));
        assert_eq!(record.field("owner"), None);
        assert_eq!(record.field("tags"), None);
    }

    #[test]
    fn test_filter_value_blankness() {
        assert!(FilterValue::Text("   ".into()).is_blank());
        assert!(FilterValue::Many(vec![]).is_blank());
        assert!(FilterValue::NumberRange(None, None).is_blank());
        assert!(!FilterValue::NumberRange(Some(90.0), None).is_blank());
    }

    #[test]
    fn test_digest_is_stable_for_equal_queries() {
        let mut a = CanonicalQuery::default();
        a.field_patches.insert(
            "status".into(),
            PatchValue::Equals { value: FieldValue::text("active") },
        );
        let b = a.clone();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), CanonicalQuery::default().digest());
    }
}
