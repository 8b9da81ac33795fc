//! 结果表格组件

use crate::core::catalog::Catalog;
use crate::core::models::Record;
use crate::ui::styles::Theme;
use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

/// 结果表格
pub struct ResultTable {
    /// 单元格最多显示的字符数
    pub max_cell_chars: usize,
    pub row_height: f32,
}

impl Default for ResultTable {
    fn default() -> Self {
        Self {
            max_cell_chars: 48,
            row_height: 22.0,
        }
    }
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 渲染统计行
    pub fn render_stats(&self, ui: &mut Ui, theme: &Theme, shown: usize, total: usize) {
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("共 {} 条", total)).color(theme.secondary));
            ui.label(RichText::new(format!("命中 {} 条", shown)).color(theme.count_color(shown)));
        });
    }

    /// 按目录字段渲染结果记录
    pub fn render<R: Record>(&self, ui: &mut Ui, theme: &Theme, catalog: &Catalog, records: &[R]) {
        if records.is_empty() {
            ui.add_space(20.0);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("没有符合条件的记录").color(theme.secondary));
            });
            return;
        }

        let fields = &catalog.fields;
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(80.0), fields.len())
            .header(26.0, |mut header| {
                for field in fields {
                    header.col(|ui| {
                        ui.strong(&field.label);
                    });
                }
            })
            .body(|body| {
                body.rows(self.row_height, records.len(), |mut row| {
                    let record = &records[row.index()];
                    for field in fields {
                        row.col(|ui| {
                            let text = record
                                .field(&field.key)
                                .map(|v| v.to_string())
                                .unwrap_or_else(|| "-".to_string());
                            let shown = truncate(&text, self.max_cell_chars);
                            if shown != text {
                                ui.label(shown).on_hover_text(text);
                            } else {
                                ui.label(text);
                            }
                        });
                    }
                });
            });
    }
}

/// 按字符截断
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("磁盘告警", 10), "磁盘告警");
        assert_eq!(truncate("数据库连接池耗尽", 5), "数据库连…");
    }
}
