//! UI模块 - 查询控制台界面

pub mod app;
pub mod demo_page;
pub mod dialogs;
pub mod filter_bar;
pub mod result_table;
pub mod styles;
