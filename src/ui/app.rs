//! 主应用程序
//!
//! 查询控制台：筛选栏、结果表格和已保存筛选面板。

use crate::core::controls::{build_controls, ControlDescriptor};
use crate::core::export::{ExportRequest, ExportSink, JsonExportSink, MemoryExportSink};
use crate::core::models::DynamicRecord;
use crate::core::session::QuerySession;
use crate::ui::dialogs::{
    ExportDialogResult, ExportPreviewDialog, SaveFilterDialog, SaveFilterResult,
};
use crate::ui::filter_bar::{FilterBar, FilterBarAction};
use crate::ui::result_table::ResultTable;
use crate::ui::styles::{button_style, install_cjk_fonts, panel_stroke, Theme};
use anyhow::Result;
use eframe::egui::{self, RichText};
use std::path::PathBuf;
use uuid::Uuid;

/// 正在查看的已保存筛选
struct SavedView {
    name: String,
    records: Vec<DynamicRecord>,
}

/// 查询控制台
pub struct ConsoleApp {
    /// 页面会话
    session: QuerySession<DynamicRecord>,
    /// 按目录生成的控件
    controls: Vec<ControlDescriptor>,
    theme: Theme,
    filter_bar: FilterBar,
    result_table: ResultTable,
    save_dialog: SaveFilterDialog,
    export_dialog: ExportPreviewDialog,
    /// 状态消息
    status_message: String,
    show_saved_panel: bool,
    saved_view: Option<SavedView>,
}

impl ConsoleApp {
    /// 创建新的应用实例
    pub fn new(cc: &eframe::CreationContext<'_>, session: QuerySession<DynamicRecord>) -> Self {
        install_cjk_fonts(&cc.egui_ctx);
        cc.egui_ctx.style_mut(|style| button_style(&mut style.visuals));

        let controls = build_controls(session.catalog());
        let status_message = format!(
            "页面 {} 已就绪，共 {} 条记录",
            session.catalog().page,
            session.records().len()
        );

        Self {
            session,
            controls,
            theme: Theme::default(),
            filter_bar: FilterBar::new(),
            result_table: ResultTable::new(),
            save_dialog: SaveFilterDialog::default(),
            export_dialog: ExportPreviewDialog::default(),
            status_message,
            show_saved_panel: true,
            saved_view: None,
        }
    }

    /// 处理筛选栏动作
    fn handle_action(&mut self, action: FilterBarAction) {
        match action {
            FilterBarAction::None => {}
            FilterBarAction::Search | FilterBarAction::Evaluate | FilterBarAction::Apply => {
                self.saved_view = None;
                let outcome = self.session.run();
                self.status_message = format!(
                    "命中 {} 条（查询 {}）",
                    outcome.records.len(),
                    short_digest(&outcome.digest)
                );
            }
            FilterBarAction::ResetAdvanced => {
                self.saved_view = None;
                self.filter_bar.clear_buffers();
                let shown = self.session.reset_advanced().len();
                self.status_message = format!("已重置高级筛选，命中 {} 条", shown);
            }
            FilterBarAction::Reset => {
                self.saved_view = None;
                self.filter_bar.clear_buffers();
                let shown = self.session.reset().len();
                self.status_message = format!("已重置，显示全部 {} 条", shown);
            }
            FilterBarAction::Export => {
                let mut sink = MemoryExportSink::default();
                match self.session.export(&mut sink) {
                    Ok(request) => self.export_dialog.show(request),
                    Err(e) => self.status_message = format!("导出失败: {}", e),
                }
            }
            FilterBarAction::SaveFilter => self.save_dialog.show(),
        }
    }

    /// 保存当前筛选
    fn save_current_filter(&mut self, name: &str) {
        match self.session.save_filter(name) {
            Ok(saved) => {
                self.status_message = format!("已保存筛选「{}」", saved.name);
            }
            Err(e) => self.save_dialog.show_error(e.to_string()),
        }
    }

    /// 把导出请求写入用户选择的文件
    fn export_to_file(&self, request: &ExportRequest) -> Result<Option<PathBuf>> {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name(format!("{}-{}.json", request.page, short_digest(&request.digest)));
        if let Some(dir) = &self.session.config().export_dir {
            dialog = dialog.set_directory(dir);
        }

        let Some(path) = dialog.save_file() else {
            return Ok(None);
        };
        let file = std::fs::File::create(&path)?;
        JsonExportSink::new(std::io::BufWriter::new(file)).export(request)?;
        tracing::info!("导出请求已写入 {}", path.display());
        Ok(Some(path))
    }

    /// 已保存筛选面板
    fn render_saved_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("已保存的筛选");
        ui.separator();

        if self.session.saved_filters().is_empty() {
            ui.label(RichText::new("暂无保存的筛选").color(self.theme.secondary));
            return;
        }

        let mut view: Option<Uuid> = None;
        let mut export: Option<Uuid> = None;
        let mut remove: Option<Uuid> = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            for saved in self.session.saved_filters() {
                egui::Frame::none()
                    .stroke(panel_stroke())
                    .inner_margin(egui::Margin::same(6.0))
                    .show(ui, |ui| {
                        ui.strong(&saved.name);
                        ui.label(
                            RichText::new(saved.saved_at.format("%Y-%m-%d %H:%M").to_string())
                                .small()
                                .color(self.theme.secondary),
                        );
                        ui.horizontal(|ui| {
                            if ui.small_button("查看").clicked() {
                                view = Some(saved.id);
                            }
                            if ui.small_button("导出").clicked() {
                                export = Some(saved.id);
                            }
                            if ui.small_button("删除").clicked() {
                                remove = Some(saved.id);
                            }
                        });
                    });
                ui.add_space(4.0);
            }
        });

        if let Some(id) = view {
            if let Some(saved) = self.session.saved_filters().iter().find(|s| s.id == id) {
                let records = self.session.evaluate_query(&saved.query);
                self.status_message = format!("筛选「{}」命中 {} 条", saved.name, records.len());
                self.saved_view = Some(SavedView {
                    name: saved.name.clone(),
                    records,
                });
            }
        }
        if let Some(id) = export {
            if let Some(saved) = self.session.saved_filters().iter().find(|s| s.id == id) {
                let request = ExportRequest::new(self.session.catalog(), saved.query.clone());
                self.export_dialog.show(request);
            }
        }
        if let Some(id) = remove {
            if self.session.remove_saved_filter(&id) {
                self.status_message = "已删除保存的筛选".to_string();
            }
        }
    }

    /// 渲染结果区域
    fn render_results(&mut self, ui: &mut egui::Ui) {
        let total = self.session.records().len();

        if let Some(view) = &self.saved_view {
            let mut close = false;
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("正在查看已保存的筛选「{}」", view.name))
                        .color(self.theme.primary),
                );
                if ui.small_button("返回当前查询").clicked() {
                    close = true;
                }
            });
            self.result_table
                .render_stats(ui, &self.theme, view.records.len(), total);
            ui.separator();
            self.result_table
                .render(ui, &self.theme, self.session.catalog(), &view.records);
            if close {
                self.saved_view = None;
            }
            return;
        }

        let results = self.session.results();
        self.result_table
            .render_stats(ui, &self.theme, results.len(), total);
        ui.separator();
        self.result_table
            .render(ui, &self.theme, self.session.catalog(), results);
    }

    /// 渲染对话框
    fn render_dialogs(&mut self, ctx: &egui::Context) {
        match self.save_dialog.render(ctx) {
            SaveFilterResult::Save(name) => self.save_current_filter(&name),
            SaveFilterResult::Cancel | SaveFilterResult::None => {}
        }

        match self.export_dialog.render(ctx) {
            ExportDialogResult::SaveToFile(request) => match self.export_to_file(&request) {
                Ok(Some(path)) => {
                    self.status_message = format!("已导出到 {}", path.display());
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("导出文件失败: {:#}", e);
                    self.status_message = format!("导出失败: {}", e);
                }
            },
            ExportDialogResult::Cancel | ExportDialogResult::None => {}
        }
    }
}

impl eframe::App for ConsoleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 顶部菜单栏
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("文件", |ui| {
                    if ui.button("📤 导出当前查询").clicked() {
                        self.handle_action(FilterBarAction::Export);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("❌ 退出").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("视图", |ui| {
                    if ui.checkbox(&mut self.show_saved_panel, "已保存的筛选").clicked() {
                        ui.close_menu();
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(&self.session.catalog().page).color(self.theme.secondary));
                });
            });
        });

        // 底部状态栏
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(outcome) = self.session.latest() {
                        ui.label(
                            RichText::new(format!("查询 {}", short_digest(&outcome.digest)))
                                .small()
                                .color(self.theme.secondary),
                        );
                    }
                });
            });
        });

        if self.show_saved_panel {
            egui::SidePanel::left("saved_panel")
                .default_width(240.0)
                .show(ctx, |ui| {
                    self.render_saved_panel(ui);
                });
        }

        // 主内容区域
        egui::CentralPanel::default().show(ctx, |ui| {
            let action = self.filter_bar.render(
                ui,
                &self.theme,
                &self.controls,
                self.session.store_mut(),
            );
            self.handle_action(action);

            ui.separator();
            self.render_results(ui);
        });

        self.render_dialogs(ctx);
    }
}

/// 摘要前 8 位，用于界面显示和文件名
fn short_digest(digest: &str) -> &str {
    digest.get(..8).unwrap_or(digest)
}
