//! QueryDeck 查询控制台

use anyhow::{Context, Result};
use eframe::egui;
use querydeck::core::catalog::Catalog;
use querydeck::core::models::{DynamicRecord, EngineConfig};
use querydeck::core::session::QuerySession;
use querydeck::storage::config::ConfigManager;
use querydeck::storage::page_source;
use querydeck::ui::app::ConsoleApp;
use querydeck::ui::demo_page;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 加载页面目录和记录；未配置时使用内置示例页面
fn load_page(config: &EngineConfig) -> Result<(Catalog, Vec<DynamicRecord>)> {
    match (&config.catalog_path, &config.records_path) {
        (Some(catalog_path), Some(records_path)) => Ok((
            page_source::load_catalog(catalog_path)?,
            page_source::load_records(records_path)?,
        )),
        (None, None) => demo(),
        _ => {
            tracing::warn!("catalog_path 与 records_path 需要同时配置，改用示例页面");
            demo()
        }
    }
}

fn demo() -> Result<(Catalog, Vec<DynamicRecord>)> {
    let catalog = demo_page::alert_catalog().context("示例页面目录无效")?;
    Ok((catalog, demo_page::alert_records()))
}

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(ConfigManager::default_path());
    let loaded = config_manager.load();
    let log_filter = match &loaded {
        Ok(config) => config.log_filter.clone(),
        Err(_) => EngineConfig::default().log_filter,
    };

    // 初始化日志，RUST_LOG 优先
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)))
        .init();

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("加载配置失败，使用默认配置: {}", e);
            EngineConfig::default()
        }
    };

    tracing::info!("启动 QueryDeck, 配置文件: {}", config_manager.path().display());

    let (catalog, records) = load_page(&config)?;
    let session = QuerySession::new(Arc::new(catalog), config, records);

    // 启动GUI
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("QueryDeck - 查询筛选控制台"),
        ..Default::default()
    };

    eframe::run_native(
        "QueryDeck",
        options,
        Box::new(|cc| Ok(Box::new(ConsoleApp::new(cc, session)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI启动失败: {}", e))?;

    Ok(())
}
