//! QueryDeck - 查询合成与内存过滤/排序引擎
//!
//! - 页面目录声明字段、搜索范围、筛选项、快捷筛选和排序
//! - 查询状态只通过状态存储修改
//! - 合成器把状态规整为唯一的规范化查询
//! - 求值器对内存记录执行关键词、字段补丁和排序

pub mod core;
pub mod storage;
pub mod ui;
