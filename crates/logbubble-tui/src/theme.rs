//! Panel theme - centralized color management

use logbubble_core::LogKind;
use ratatui::style::palette::tailwind;
use ratatui::style::Color;

/// Colors for the log panel and its chrome.
#[derive(Debug, Clone)]
pub struct Theme {
    // Backgrounds
    pub bg_panel: Color,
    pub bg_header: Color,

    // Text
    pub text_primary: Color,
    pub text_muted: Color,

    // Chrome
    pub accent: Color,
    pub filter_active: Color,
    pub badge: Color,

    // Per-origin row colors
    pub kind_console: Color,
    pub kind_fetch: Color,
    pub kind_xhr: Color,
    pub kind_dom: Color,
    pub kind_plugin: Color,

    // Status
    pub critical: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            bg_panel: tailwind::SLATE.c900,
            bg_header: tailwind::SLATE.c800,

            text_primary: tailwind::SLATE.c100,
            text_muted: tailwind::SLATE.c400,

            accent: tailwind::CYAN.c400,
            filter_active: tailwind::CYAN.c300,
            badge: tailwind::AMBER.c400,

            kind_console: tailwind::SLATE.c200,
            kind_fetch: tailwind::EMERALD.c300,
            kind_xhr: tailwind::TEAL.c300,
            kind_dom: tailwind::INDIGO.c300,
            kind_plugin: tailwind::FUCHSIA.c300,

            critical: tailwind::RED.c400,
        }
    }

    pub fn kind_color(&self, kind: LogKind) -> Color {
        match kind {
            LogKind::Console => self.kind_console,
            LogKind::Fetch => self.kind_fetch,
            LogKind::Xhr => self.kind_xhr,
            LogKind::Dom => self.kind_dom,
            LogKind::Plugin => self.kind_plugin,
        }
    }
}
