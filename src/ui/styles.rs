//! 样式定义

use crate::core::catalog::ColorHint;
use eframe::egui::{self, Color32, FontData, FontDefinitions, FontFamily, Rounding, Stroke};

/// 颜色主题
pub struct Theme {
    pub primary: Color32,
    pub secondary: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(22, 119, 255),    // 蓝色
            secondary: Color32::from_rgb(140, 140, 140), // 灰色
            success: Color32::from_rgb(82, 196, 26),     // 绿色
            warning: Color32::from_rgb(250, 173, 20),    // 黄色
            error: Color32::from_rgb(255, 77, 79),       // 红色
        }
    }
}

impl Theme {
    /// 快捷筛选颜色提示对应的颜色
    pub fn hint_color(&self, hint: ColorHint) -> Color32 {
        match hint {
            ColorHint::Default => self.secondary,
            ColorHint::Blue => self.primary,
            ColorHint::Green => self.success,
            ColorHint::Orange => Color32::from_rgb(250, 140, 22),
            ColorHint::Red => self.error,
            ColorHint::Purple => Color32::from_rgb(114, 46, 209),
            ColorHint::Gold => self.warning,
            ColorHint::Cyan => Color32::from_rgb(19, 194, 194),
        }
    }

    /// 结果数量提示颜色：空结果用警告色
    pub fn count_color(&self, count: usize) -> Color32 {
        if count == 0 {
            self.warning
        } else {
            self.success
        }
    }
}

/// 圆角设置
pub fn default_rounding() -> Rounding {
    Rounding::same(4.0)
}

/// 按钮样式
pub fn button_style(visuals: &mut egui::Visuals) {
    visuals.widgets.inactive.rounding = default_rounding();
    visuals.widgets.hovered.rounding = default_rounding();
    visuals.widgets.active.rounding = default_rounding();
}

/// 面板边框
pub fn panel_stroke() -> Stroke {
    Stroke::new(1.0, Color32::from_gray(200))
}

/// 常见系统的中文字体位置
const CJK_FONT_CANDIDATES: &[&str] = &[
    "C:/Windows/Fonts/msyh.ttc",
    "C:/Windows/Fonts/simhei.ttf",
    "/System/Library/Fonts/PingFang.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
];

/// 安装第一个可用的中文字体，返回是否成功
pub fn install_cjk_fonts(ctx: &egui::Context) -> bool {
    let Some((path, bytes)) = CJK_FONT_CANDIDATES
        .iter()
        .find_map(|path| std::fs::read(path).ok().map(|bytes| (*path, bytes)))
    else {
        tracing::warn!("未能加载中文字体，界面可能显示乱码");
        return false;
    };

    let mut fonts = FontDefinitions::default();
    fonts
        .font_data
        .insert("cjk".to_owned(), FontData::from_owned(bytes).into());
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .insert(0, "cjk".to_owned());
    }
    ctx.set_fonts(fonts);

    tracing::info!("已加载中文字体: {}", path);
    true
}
