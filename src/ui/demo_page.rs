//! 内置示例页面：告警列表
//!
//! 未配置目录和记录文件时使用。

use crate::core::catalog::{
    Catalog, ColorHint, FieldSchema, FieldType, FilterKind, FilterSpec, OptionItem, QuickFilterSpec,
};
use crate::core::error::CatalogError;
use crate::core::models::DynamicRecord;

/// 告警列表目录
pub fn alert_catalog() -> Result<Catalog, CatalogError> {
    Catalog::builder("alerts")
        .field(FieldSchema::new("id", "编号", FieldType::Number).sortable())
        .field(FieldSchema::new("title", "标题", FieldType::Text).searchable())
        .field(FieldSchema::new("source", "来源", FieldType::Text).searchable())
        .field(FieldSchema::new("level", "级别", FieldType::Text))
        .field(FieldSchema::new("status", "状态", FieldType::Text))
        .field(FieldSchema::new("owner", "负责人", FieldType::Text).searchable())
        .field(FieldSchema::new("score", "风险分", FieldType::Number).sortable())
        .field(FieldSchema::new("createTime", "创建时间", FieldType::Date).sortable())
        .search_field("全部字段", "all")
        .search_field("标题", "title")
        .search_field("来源", "source")
        .search_field("负责人", "owner")
        .filter(
            FilterSpec::new("level", "级别", FilterKind::SingleSelect).with_options(vec![
                OptionItem::new("高危", "high"),
                OptionItem::new("中危", "medium"),
                OptionItem::new("低危", "low"),
            ]),
        )
        .filter(
            FilterSpec::new("status", "状态", FilterKind::MultiSelect).with_options(vec![
                OptionItem::new("待处理", "pending"),
                OptionItem::new("处理中", "processing"),
                OptionItem::new("已关闭", "closed"),
            ]),
        )
        .filter(FilterSpec::new("source", "来源", FilterKind::Text))
        .filter(FilterSpec::new("score", "风险分", FilterKind::NumberRange))
        .filter(FilterSpec::new("createTime", "创建时间", FilterKind::DateRange).with_span(12))
        .quick_filter(
            QuickFilterSpec::new("高危告警")
                .patch("level", "high")
                .color(ColorHint::Red),
        )
        .quick_filter(
            QuickFilterSpec::new("待处理")
                .patch("status", "pending")
                .color(ColorHint::Orange),
        )
        .quick_filter(
            QuickFilterSpec::new("我负责的")
                .patch("owner", "张伟")
                .color(ColorHint::Blue),
        )
        .sort("最新创建", "createTime,desc")
        .sort("最早创建", "createTime,asc")
        .sort("风险分从高到低", "score,desc")
        .sort("风险分从低到高", "score,asc")
        .sort("编号", "id,asc")
        .build()
}

/// 告警示例记录
pub fn alert_records() -> Vec<DynamicRecord> {
    let rows: [(i32, &str, &str, &str, &str, &str, f64, &str); 12] = [
        (1001, "数据库连接池耗尽", "order-db", "high", "pending", "张伟", 92.0, "2024-05-01 09:12:00"),
        (1002, "磁盘使用率超过 85%", "log-server-02", "medium", "processing", "李娜", 71.5, "2024-05-01 11:40:00"),
        (1003, "接口响应时间升高", "api-gateway", "medium", "pending", "王强", 64.0, "2024-05-02 08:05:00"),
        (1004, "证书即将过期", "cdn-edge", "low", "closed", "张伟", 35.0, "2024-05-02 16:30:00"),
        (1005, "登录失败次数异常", "auth-service", "high", "processing", "刘洋", 88.5, "2024-05-03 02:18:00"),
        (1006, "消息队列堆积", "mq-cluster", "high", "pending", "李娜", 81.0, "2024-05-03 10:47:00"),
        (1007, "备份任务失败", "backup-job", "medium", "closed", "王强", 58.0, "2024-05-04 03:00:00"),
        (1008, "CPU 负载持续偏高", "order-db", "medium", "pending", "张伟", 67.5, "2024-05-04 14:22:00"),
        (1009, "配置变更未审批", "config-center", "low", "pending", "陈静", 22.0, "2024-05-05 09:55:00"),
        (1010, "缓存命中率下降", "redis-main", "low", "processing", "刘洋", 41.0, "2024-05-05 18:10:00"),
        (1011, "支付回调超时", "payment-service", "high", "pending", "陈静", 95.5, "2024-05-06 07:33:00"),
        (1012, "节点心跳丢失", "k8s-node-07", "high", "closed", "王强", 77.0, "2024-05-06 21:48:00"),
    ];

    let mut records: Vec<DynamicRecord> = rows
        .iter()
        .map(|(id, title, source, level, status, owner, score, created)| {
            DynamicRecord::new()
                .with("id", *id)
                .with("title", *title)
                .with("source", *source)
                .with("level", *level)
                .with("status", *status)
                .with("owner", *owner)
                .with("score", *score)
                .with("createTime", *created)
        })
        .collect();

    // 缺失负责人的记录
    records.push(
        DynamicRecord::new()
            .with("id", 1013)
            .with("title", "未知来源的端口扫描")
            .with("source", "firewall")
            .with("level", "medium")
            .with("status", "pending")
            .with("score", 60.0)
            .with("createTime", "2024-05-07 12:00:00"),
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::composer::compose;
    use crate::core::evaluator::Evaluator;
    use crate::core::models::{EngineConfig, QueryState};

    #[test]
    fn test_demo_catalog_is_valid() {
        let catalog = alert_catalog().unwrap();
        assert_eq!(catalog.fields.len(), 8);
        assert_eq!(catalog.quick_filters.len(), 3);
    }

    #[test]
    fn test_demo_quick_filters_match_records() {
        let catalog = alert_catalog().unwrap();
        let config = EngineConfig::default();
        let records = alert_records();

        let mut state = QueryState::default();
        state.active_quick_filters.insert("高危告警".to_string());
        state.active_quick_filters.insert("待处理".to_string());

        let query = compose(&state, &catalog);
        let hits = Evaluator::new(&catalog, &config).evaluate(&records, &query);
        let ids: Vec<String> = hits.iter().map(|r| r.get("id").unwrap().to_string()).collect();
        assert_eq!(ids, vec!["1001", "1006", "1011"]);
    }
}
