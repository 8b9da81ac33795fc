//! 对话框组件

use crate::core::export::ExportRequest;
use eframe::egui::{self, RichText};

/// 保存筛选对话框
#[derive(Default)]
pub struct SaveFilterDialog {
    /// 是否显示
    pub visible: bool,
    /// 用户输入的名称
    pub name: String,
    /// 上一次保存失败的原因
    pub error: Option<String>,
}

impl SaveFilterDialog {
    /// 显示对话框
    pub fn show(&mut self) {
        self.visible = true;
        self.name.clear();
        self.error = None;
    }

    /// 保存失败时保持对话框打开并提示
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.visible = true;
        self.error = Some(message.into());
    }

    /// 渲染对话框
    pub fn render(&mut self, ctx: &egui::Context) -> SaveFilterResult {
        let mut result = SaveFilterResult::None;

        if !self.visible {
            return result;
        }

        egui::Window::new("💾 保存筛选")
            .collapsible(false)
            .resizable(false)
            .default_width(360.0)
            .show(ctx, |ui| {
                ui.label("为当前的搜索和筛选条件起个名字:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.name)
                        .hint_text("例如：本周高危告警")
                        .desired_width(f32::INFINITY),
                );

                if let Some(error) = &self.error {
                    ui.label(RichText::new(error).small().color(egui::Color32::from_rgb(255, 77, 79)));
                }

                ui.separator();

                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.horizontal(|ui| {
                    if ui.button("✓ 保存").clicked() || submitted {
                        result = SaveFilterResult::Save(self.name.clone());
                        self.visible = false;
                    }
                    if ui.button("✗ 取消").clicked() {
                        result = SaveFilterResult::Cancel;
                        self.visible = false;
                    }
                });
            });

        result
    }
}

/// 保存筛选对话框结果
#[derive(Debug)]
pub enum SaveFilterResult {
    None,
    Save(String),
    Cancel,
}

/// 导出预览对话框
#[derive(Default)]
pub struct ExportPreviewDialog {
    pub visible: bool,
    request: Option<ExportRequest>,
    /// 格式化后的请求内容
    preview: String,
}

impl ExportPreviewDialog {
    /// 显示对话框
    pub fn show(&mut self, request: ExportRequest) {
        self.preview = serde_json::to_string_pretty(&request).unwrap_or_else(|e| {
            tracing::warn!("导出请求格式化失败: {}", e);
            String::new()
        });
        self.request = Some(request);
        self.visible = true;
    }

    /// 渲染对话框
    pub fn render(&mut self, ctx: &egui::Context) -> ExportDialogResult {
        let mut result = ExportDialogResult::None;

        if !self.visible {
            return result;
        }

        egui::Window::new("📤 导出")
            .collapsible(false)
            .resizable(true)
            .default_width(520.0)
            .show(ctx, |ui| {
                if let Some(request) = &self.request {
                    ui.horizontal(|ui| {
                        ui.label("页面:");
                        ui.strong(&request.page);
                    });
                    if let Some(scope) = &request.scope_label {
                        ui.horizontal(|ui| {
                            ui.label("搜索范围:");
                            ui.label(scope);
                        });
                    }
                    ui.horizontal(|ui| {
                        ui.label("查询摘要:");
                        ui.monospace(&request.digest);
                    });
                }

                ui.separator();

                egui::ScrollArea::vertical()
                    .max_height(300.0)
                    .show(ui, |ui| {
                        ui.monospace(&self.preview);
                    });

                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("💾 保存为文件").clicked() {
                        if let Some(request) = self.request.take() {
                            result = ExportDialogResult::SaveToFile(request);
                        }
                        self.visible = false;
                    }
                    if ui.button("✗ 关闭").clicked() {
                        result = ExportDialogResult::Cancel;
                        self.visible = false;
                    }
                });
            });

        result
    }
}

/// 导出对话框结果
#[derive(Debug)]
pub enum ExportDialogResult {
    None,
    SaveToFile(ExportRequest),
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_dialog_show_resets_input() {
        let mut dialog = SaveFilterDialog::default();
        dialog.name = "旧名字".to_string();
        dialog.error = Some("名称不能为空".to_string());

        dialog.show();
        assert!(dialog.visible);
        assert!(dialog.name.is_empty());
        assert!(dialog.error.is_none());
    }
}
