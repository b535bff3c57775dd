//! Reusable UI component helpers

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::form::{FieldState, SubmitControl};
use crate::theme::Theme;

/// Rows taken by one field: bordered input plus the error line under it
pub const FIELD_HEIGHT: u16 = 4;
pub const SUBMIT_HEIGHT: u16 = 3;
pub const BANNER_HEIGHT: u16 = 3;

/// Bordered input box for a field. Errors turn the border red.
pub fn field_input<'a>(field: &'a FieldState, focused: bool, theme: &Theme) -> Paragraph<'a> {
    let border = if field.has_error() {
        theme.error
    } else if focused {
        theme.accent
    } else {
        theme.inactive
    };

    let mut title = vec![Span::styled(
        format!(" {} ", field.label),
        Style::default().fg(if focused { theme.accent } else { theme.text_dim }),
    )];
    if field.required {
        title.push(Span::styled("* ", Style::default().fg(theme.error)));
    }

    let mut value = vec![Span::styled(field.value.as_str(), Style::default().fg(theme.text))];
    if focused {
        value.push(Span::styled("▏", Style::default().fg(theme.accent)));
    }

    Paragraph::new(Line::from(value)).block(
        Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    )
}

/// Inline error line rendered under a field, empty when valid
pub fn field_error<'a>(field: &FieldState, theme: &Theme) -> Paragraph<'a> {
    let line = match field.error {
        Some(e) => Line::from(Span::styled(format!("  {}", e), Style::default().fg(theme.error))),
        None => Line::default(),
    };
    Paragraph::new(line)
}

pub fn banner<'a>(message: &'a str, theme: &Theme) -> Paragraph<'a> {
    Paragraph::new(Line::from(Span::styled(
        message,
        Style::default().fg(theme.banner).add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.banner_border)),
    )
}

pub fn submit_button<'a>(control: &'a SubmitControl, focused: bool, theme: &Theme) -> Paragraph<'a> {
    let (fg, border) = if control.is_disabled() {
        (theme.text_dim, theme.inactive)
    } else if focused {
        (theme.accent, theme.accent)
    } else {
        (theme.text, theme.inactive)
    };

    let mut style = Style::default().fg(fg);
    if focused && !control.is_disabled() {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }

    Paragraph::new(Line::from(Span::styled(format!(" {} ", control.label), style)))
        .alignment(ratatui::layout::Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
}

/// Centered popup area, `percent_x` wide and `height` rows tall
pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(r.height)),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
