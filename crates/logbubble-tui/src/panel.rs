//! Log panel widget
//!
//! Draws the floating log window: header with filter state, the windowed
//! slice of rows the scroller computed, and the optional entry detail
//! overlay. Only rows inside the viewport are materialized; overscan rows
//! are clipped away here.

use crate::filter::LogFilter;
use crate::scroller::RenderWindow;
use crate::theme::Theme;
use crate::view_model::{detail_body, detail_title, LogRowViewModel};
use logbubble_core::LogEntry;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

/// Everything the panel needs for one draw, borrowed from the orchestrator.
pub struct PanelContext<'a> {
    pub window: Option<&'a RenderWindow>,
    pub logs: &'a [LogEntry],
    pub filter: LogFilter,
    pub total_count: usize,
    pub cursor: usize,
    /// Clamped scroll offset the window was computed for; maps absolute row
    /// offsets back onto screen rows.
    pub scroll_offset: u32,
    pub detail: Option<&'a LogEntry>,
}

/// Render the open log panel over the given area.
pub fn render_panel(frame: &mut Frame, area: Rect, ctx: &PanelContext, theme: &Theme) {
    frame.render_widget(Clear, area);
    let background = Block::default().style(Style::default().bg(theme.bg_panel));
    frame.render_widget(background, area);

    let title = format!(
        " Dev Logs [{}/{}] filter:{} │ c/n filter · j/k scroll · ⏎ detail · x clear ",
        ctx.logs.len(),
        ctx.total_count,
        ctx.filter,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .style(Style::default().bg(theme.bg_panel));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(window) = ctx.window else {
        return;
    };

    if ctx.logs.is_empty() {
        let empty = Paragraph::new("no logs yet")
            .style(Style::default().fg(theme.text_muted).bg(theme.bg_panel));
        frame.render_widget(empty, inner);
        if ctx.detail.is_some() {
            render_detail(frame, area, ctx, theme);
        }
        return;
    }

    // Window offsets are absolute content positions.
    for row in &window.rows {
        let Some(screen_y) = row.offset.checked_sub(ctx.scroll_offset) else {
            continue; // overscan row above the viewport
        };
        if screen_y >= u32::from(inner.height) {
            continue; // overscan row below the viewport
        }
        let Some(entry) = ctx.logs.get(row.index) else {
            continue;
        };

        let row_area = Rect {
            x: inner.x,
            y: inner.y + screen_y as u16,
            width: inner.width,
            height: 1,
        };
        let line = row_line(entry, row.index == ctx.cursor, theme);
        frame.render_widget(Paragraph::new(line), row_area);
    }

    if ctx.detail.is_some() {
        render_detail(frame, area, ctx, theme);
    }
}

/// The collapsed state: a one-line bubble with the unread badge, rendered in
/// the bottom-right corner of the host area.
pub fn render_bubble(frame: &mut Frame, area: Rect, unread_badge: Option<&str>, theme: &Theme) {
    let label = match unread_badge {
        Some(badge) => format!(" logs ({badge}) "),
        None => " logs ".to_string(),
    };
    let width = label.chars().count() as u16;
    if area.width < width + 1 || area.height < 1 {
        return;
    }
    let bubble_area = Rect {
        x: area.right().saturating_sub(width + 1),
        y: area.bottom().saturating_sub(1),
        width,
        height: 1,
    };

    let style = if unread_badge.is_some() {
        Style::default().fg(theme.badge).bg(theme.bg_header)
    } else {
        Style::default().fg(theme.text_muted).bg(theme.bg_header)
    };
    frame.render_widget(Clear, bubble_area);
    frame.render_widget(Paragraph::new(label).style(style), bubble_area);
}

fn row_line<'a>(entry: &'a LogEntry, is_cursor: bool, theme: &Theme) -> Line<'a> {
    let vm = LogRowViewModel::from_entry(entry, theme);

    let mut style = Style::default().fg(vm.color).bg(theme.bg_panel);
    if is_cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }

    let mut spans = vec![
        Span::styled(vm.time_text, Style::default().fg(theme.text_muted)),
        Span::raw(" "),
        Span::styled(
            format!("{:7}", vm.kind_text),
            Style::default().fg(theme.accent),
        ),
        Span::styled(vm.message, style),
    ];
    if !vm.count_badge.is_empty() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            vm.count_badge,
            Style::default()
                .fg(theme.badge)
                .add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

fn render_detail(frame: &mut Frame, area: Rect, ctx: &PanelContext, theme: &Theme) {
    let Some(entry) = ctx.detail else { return };

    let width = area.width.saturating_sub(8).min(100).max(20);
    let height = area.height.saturating_sub(4).min(16).max(5);
    let detail_area = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
    .intersection(area);
    if detail_area.is_empty() {
        return;
    }

    frame.render_widget(Clear, detail_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", detail_title(entry)))
        .border_style(Style::default().fg(theme.accent))
        .style(Style::default().bg(theme.bg_header));

    let body_style = if entry.is_critical {
        Style::default().fg(theme.critical)
    } else {
        Style::default().fg(theme.text_primary)
    };
    let body = Paragraph::new(detail_body(entry))
        .style(body_style)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(body, detail_area);
}
