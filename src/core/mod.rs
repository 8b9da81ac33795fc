//! Core模块 - 查询合成与内存过滤/排序引擎

pub mod catalog;
pub mod composer;
pub mod controls;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod models;
pub mod session;
pub mod state;
