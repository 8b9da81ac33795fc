//! 筛选栏组件
//!
//! 按控件描述渲染基础搜索、快捷筛选、排序和高级筛选面板，并把用户输入写入查询状态存储。
//! 只渲染目录里声明过的控件。

use crate::core::controls::{ControlDescriptor, ControlGroup, WidgetKind};
use crate::core::error::StoreError;
use crate::core::models::{FieldValue, FilterValue};
use crate::core::state::{QueryStore, Trigger};
use crate::ui::styles::Theme;
use chrono::NaiveDate;
use eframe::egui::{self, RichText, Ui};
use std::collections::HashMap;

/// 筛选栏产生的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterBarAction {
    None,
    /// 点击搜索或回车
    Search,
    /// 状态修改要求立即求值（快捷筛选）
    Evaluate,
    /// 应用高级筛选
    Apply,
    /// 重置高级筛选表单
    ResetAdvanced,
    /// 全部重置
    Reset,
    Export,
    SaveFilter,
}

/// 筛选栏
#[derive(Default)]
pub struct FilterBar {
    /// 文本输入缓冲
    text_inputs: HashMap<String, String>,
    /// 区间输入缓冲（起, 止）
    range_inputs: HashMap<String, (String, String)>,
}

impl FilterBar {
    /// 创建新的筛选栏
    pub fn new() -> Self {
        Self::default()
    }

    /// 清空输入缓冲（重置表单后调用）
    pub fn clear_buffers(&mut self) {
        self.text_inputs.clear();
        self.range_inputs.clear();
    }

    /// 渲染筛选栏
    pub fn render(
        &mut self,
        ui: &mut Ui,
        theme: &Theme,
        controls: &[ControlDescriptor],
        store: &mut QueryStore,
    ) -> FilterBarAction {
        let mut action = FilterBarAction::None;

        ui.horizontal(|ui| {
            for control in controls.iter().filter(|c| c.group == ControlGroup::BasicSearch) {
                Self::render_search_box(ui, control, store, &mut action);
            }

            ui.separator();

            for control in controls.iter().filter(|c| c.group == ControlGroup::Sort) {
                Self::render_sort_select(ui, control, store);
            }

            let panel_label = if store.state().advanced_panel_open {
                "▲ 收起筛选"
            } else {
                "▼ 高级筛选"
            };
            if ui.button(panel_label).clicked() {
                store.toggle_advanced_panel();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("📤 导出").clicked() {
                    action = FilterBarAction::Export;
                }
                if ui.button("💾 保存筛选").clicked() {
                    action = FilterBarAction::SaveFilter;
                }
                if ui.button("⟲ 全部重置").clicked() {
                    action = FilterBarAction::Reset;
                }
            });
        });

        let chips: Vec<&ControlDescriptor> = controls
            .iter()
            .filter(|c| c.group == ControlGroup::QuickFilters)
            .collect();
        if !chips.is_empty() {
            ui.horizontal_wrapped(|ui| {
                ui.label("快捷筛选:");
                for chip in chips {
                    let active = store.state().active_quick_filters.contains(&chip.key);
                    let text = RichText::new(&chip.label).color(theme.hint_color(chip.color_hint));
                    if ui.selectable_label(active, text).clicked()
                        && report(store.toggle_quick_filter(&chip.key)) == Trigger::Evaluate
                    {
                        action = FilterBarAction::Evaluate;
                    }
                }
            });
        }

        if store.state().advanced_panel_open {
            ui.group(|ui| {
                egui::Grid::new("advanced_filters")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        for control in controls.iter().filter(|c| c.group == ControlGroup::Advanced) {
                            ui.label(&control.label);
                            self.render_advanced(ui, theme, control, store);
                            ui.end_row();
                        }
                    });

                ui.horizontal(|ui| {
                    if ui.button("✓ 应用筛选").clicked() {
                        action = FilterBarAction::Apply;
                    }
                    if ui.button("↺ 重置表单").clicked() {
                        action = FilterBarAction::ResetAdvanced;
                    }
                });
            });
        }

        action
    }

    /// 搜索范围 + 关键词
    fn render_search_box(
        ui: &mut Ui,
        control: &ControlDescriptor,
        store: &mut QueryStore,
        action: &mut FilterBarAction,
    ) {
        let current = store.state().scope_key.clone();
        let selected = control
            .options
            .iter()
            .find(|o| o.value.to_string() == current)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| current.clone());

        egui::ComboBox::from_id_salt("search_scope")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for option in &control.options {
                    let key = option.value.to_string();
                    if ui.selectable_label(key == current, &option.label).clicked() {
                        report(store.set_scope(&key));
                    }
                }
            });

        let mut keyword = store.state().keyword.clone();
        let response = ui.add(
            egui::TextEdit::singleline(&mut keyword)
                .hint_text("输入关键词...")
                .desired_width(220.0),
        );
        if response.changed() {
            report(store.set_keyword(&keyword));
        }
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            *action = FilterBarAction::Search;
        }
        if ui.button("🔍 搜索").clicked() {
            *action = FilterBarAction::Search;
        }
    }

    fn render_sort_select(ui: &mut Ui, control: &ControlDescriptor, store: &mut QueryStore) {
        let current = store.state().sort_value.clone();
        let selected = current
            .as_ref()
            .and_then(|v| control.options.iter().find(|o| &o.value.to_string() == v))
            .map(|o| o.label.clone())
            .unwrap_or_else(|| "默认排序".to_string());

        egui::ComboBox::from_id_salt("sort_select")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                if ui.selectable_label(current.is_none(), "默认排序").clicked() {
                    report(store.set_sort(None));
                }
                for option in &control.options {
                    let value = option.value.to_string();
                    let is_current = current.as_deref() == Some(value.as_str());
                    if ui.selectable_label(is_current, &option.label).clicked() {
                        report(store.set_sort(Some(&value)));
                    }
                }
            });
    }

    fn render_advanced(
        &mut self,
        ui: &mut Ui,
        theme: &Theme,
        control: &ControlDescriptor,
        store: &mut QueryStore,
    ) {
        let key = control.key.as_str();
        let current = store.state().advanced_values.get(key).cloned();

        match control.widget {
            WidgetKind::TextInput => {
                let buffer = self.text_inputs.entry(key.to_string()).or_insert_with(|| {
                    match &current {
                        Some(FilterValue::Text(s)) => s.clone(),
                        Some(FilterValue::Literal(v)) => v.to_string(),
                        _ => String::new(),
                    }
                });
                if ui.text_edit_singleline(buffer).changed() {
                    if buffer.trim().is_empty() {
                        report(store.clear_advanced_value(key));
                    } else {
                        report(store.set_advanced_value(key, FilterValue::Text(buffer.clone())));
                    }
                }
            }
            WidgetKind::Select => {
                let selected_value = match &current {
                    Some(FilterValue::Literal(v)) => Some(v.clone()),
                    _ => None,
                };
                let selected_text = selected_value
                    .as_ref()
                    .and_then(|v| control.options.iter().find(|o| o.value.exact_eq(v)))
                    .map(|o| o.label.clone())
                    .unwrap_or_else(|| "全部".to_string());

                egui::ComboBox::from_id_salt(("filter_select", key))
                    .selected_text(selected_text)
                    .show_ui(ui, |ui| {
                        if ui.selectable_label(selected_value.is_none(), "全部").clicked() {
                            report(store.clear_advanced_value(key));
                        }
                        for option in &control.options {
                            let is_current = selected_value
                                .as_ref()
                                .map(|v| v.exact_eq(&option.value))
                                .unwrap_or(false);
                            if ui.selectable_label(is_current, &option.label).clicked() {
                                report(store.set_advanced_value(
                                    key,
                                    FilterValue::Literal(option.value.clone()),
                                ));
                            }
                        }
                    });
            }
            WidgetKind::MultiSelect => {
                let selected: Vec<FieldValue> = match &current {
                    Some(FilterValue::Many(values)) => values.clone(),
                    Some(FilterValue::Literal(v)) => vec![v.clone()],
                    _ => Vec::new(),
                };
                ui.horizontal_wrapped(|ui| {
                    for option in &control.options {
                        let mut checked = selected.iter().any(|v| v.exact_eq(&option.value));
                        if ui.checkbox(&mut checked, &option.label).changed() {
                            let mut next: Vec<FieldValue> = selected
                                .iter()
                                .filter(|v| !v.exact_eq(&option.value))
                                .cloned()
                                .collect();
                            if checked {
                                next.push(option.value.clone());
                            }
                            if next.is_empty() {
                                report(store.clear_advanced_value(key));
                            } else {
                                report(store.set_advanced_value(key, FilterValue::Many(next)));
                            }
                        }
                    }
                });
            }
            WidgetKind::DateRangePicker => {
                let buffer = self.range_inputs.entry(key.to_string()).or_insert_with(|| {
                    match &current {
                        Some(FilterValue::DateRange(start, end)) => (
                            start.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                            end.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                        ),
                        _ => (String::new(), String::new()),
                    }
                });
                if range_inputs(ui, theme, buffer, "YYYY-MM-DD", parse_day) {
                    let value = FilterValue::DateRange(parse_day(&buffer.0), parse_day(&buffer.1));
                    commit_range(store, key, value);
                }
            }
            WidgetKind::NumberRangeInput => {
                let buffer = self.range_inputs.entry(key.to_string()).or_insert_with(|| {
                    match &current {
                        Some(FilterValue::NumberRange(min, max)) => (
                            min.map(|n| n.to_string()).unwrap_or_default(),
                            max.map(|n| n.to_string()).unwrap_or_default(),
                        ),
                        _ => (String::new(), String::new()),
                    }
                });
                if range_inputs(ui, theme, buffer, "数值", parse_number) {
                    let value =
                        FilterValue::NumberRange(parse_number(&buffer.0), parse_number(&buffer.1));
                    commit_range(store, key, value);
                }
            }
            // 不属于高级筛选分组
            WidgetKind::SearchBox | WidgetKind::QuickFilterChip | WidgetKind::SortSelect => {}
        }
    }
}

/// 渲染一对区间输入框，返回是否有修改
fn range_inputs<T>(
    ui: &mut Ui,
    theme: &Theme,
    buffer: &mut (String, String),
    hint: &str,
    parse: fn(&str) -> Option<T>,
) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        changed |= ui
            .add(egui::TextEdit::singleline(&mut buffer.0).hint_text(hint).desired_width(100.0))
            .changed();
        ui.label("~");
        changed |= ui
            .add(egui::TextEdit::singleline(&mut buffer.1).hint_text(hint).desired_width(100.0))
            .changed();

        let invalid = [&buffer.0, &buffer.1]
            .iter()
            .any(|s| !s.trim().is_empty() && parse(s).is_none());
        if invalid {
            ui.label(RichText::new("格式错误").small().color(theme.error));
        }
    });
    changed
}

fn commit_range(store: &mut QueryStore, key: &str, value: FilterValue) {
    if value.is_blank() {
        report(store.clear_advanced_value(key));
    } else {
        report(store.set_advanced_value(key, value));
    }
}

fn parse_day(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// 记录被拒绝的修改；界面上不因此中断
fn report(result: Result<Trigger, StoreError>) -> Trigger {
    match result {
        Ok(trigger) => trigger,
        Err(e) => {
            tracing::warn!("筛选栏修改被拒绝: {}", e);
            Trigger::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_day(" 2024-05-01 "), NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(parse_day("2024/05/01"), None);
        assert_eq!(parse_number("92.5"), Some(92.5));
        assert_eq!(parse_number("九十"), None);
    }

    #[test]
    fn test_report_swallows_rejections() {
        assert_eq!(report(Ok(Trigger::Evaluate)), Trigger::Evaluate);
        assert_eq!(
            report(Err(StoreError::UnknownQuickFilter("x".into()))),
            Trigger::None
        );
    }
}
