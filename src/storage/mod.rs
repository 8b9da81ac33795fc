//! 存储模块 - 配置与页面数据源

pub mod config;
pub mod page_source;
