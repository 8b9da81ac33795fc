//! 引擎配置文件
//!
//! JSON 格式，字段可缺省。读取后会修正明显无效的值，修正时记录警告。

use crate::core::models::EngineConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// 配置文件位置与读写
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// 平台配置目录下的 config.json，取不到时用当前目录
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "querydeck", "QueryDeck")
            .map(|d| d.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// 读取配置；文件不存在时返回默认配置
    pub fn load(&self) -> Result<EngineConfig> {
        if !self.config_path.exists() {
            tracing::debug!("配置文件 {} 不存在，使用默认配置", self.config_path.display());
            return Ok(EngineConfig::default());
        }

        let content = std::fs::read_to_string(&self.config_path)
            .with_context(|| format!("读取配置文件失败: {}", self.config_path.display()))?;
        let mut config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", self.config_path.display()))?;
        sanitize(&mut config);
        Ok(config)
    }

    pub fn save(&self, config: &EngineConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建配置目录失败: {}", parent.display()))?;
        }
        std::fs::write(&self.config_path, serde_json::to_string_pretty(config)?)
            .with_context(|| format!("写入配置文件失败: {}", self.config_path.display()))?;
        Ok(())
    }

    /// 写回默认配置
    pub fn reset(&self) -> Result<()> {
        self.save(&EngineConfig::default())
    }
}

/// 修正无效的配置项
fn sanitize(config: &mut EngineConfig) {
    let defaults = EngineConfig::default();

    config.date_formats.retain(|f| !f.trim().is_empty());
    if config.date_formats.is_empty() {
        tracing::warn!("date_formats 为空，使用默认日期格式");
        config.date_formats = defaults.date_formats;
    }
    if config.log_filter.trim().is_empty() {
        tracing::warn!("log_filter 为空，使用 {}", defaults.log_filter);
        config.log_filter = defaults.log_filter;
    }
    if let (Some(catalog), Some(records)) = (&config.catalog_path, &config.records_path) {
        if catalog == records {
            tracing::warn!("catalog_path 与 records_path 指向同一文件: {}", catalog.display());
        }
    }
}
