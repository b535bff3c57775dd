mod components;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use std::time::Duration;

use crate::app::{App, View};
use crate::motion;
use crate::theme::Theme;
use components::{
    banner, centered_rect, field_error, field_input, submit_button, BANNER_HEIGHT, FIELD_HEIGHT,
    SUBMIT_HEIGHT,
};

/// Shown under the confirmation details, revealed one by one
const NEXT_STEPS: &[&str] = &[
    "We review your message",
    "A specialist replies by email within one business day",
    "Together we plan the details",
];
const STEP_DELAY: Duration = Duration::from_millis(1000);
const STEP_STAGGER: Duration = Duration::from_millis(200);

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Scroll progress
            Constraint::Length(1), // Info line
            Constraint::Min(6),    // Form / confirmation
            Constraint::Length(1), // Footer
        ])
        .split(area);

    let scroll = match app.view {
        View::Form => form_scroll(app, chunks[2].height.saturating_sub(2)),
        View::Confirmation => FormScroll::default(),
    };

    draw_progress(f, &app.theme, scroll.percent(), chunks[0]);
    draw_info_line(f, app, chunks[1]);
    match app.view {
        View::Form => draw_form(f, app, scroll.offset, chunks[2]),
        View::Confirmation => draw_confirmation(f, app, chunks[2]),
    }
    draw_footer(f, app, chunks[3]);

    if app.show_help {
        draw_help_popup(f, &app.theme);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FormScroll {
    offset: u16,
    content: u16,
    viewport: u16,
}

impl FormScroll {
    fn percent(&self) -> f64 {
        motion::scroll_percent(self.offset as usize, self.content as usize, self.viewport as usize)
    }
}

/// Scroll the form so the focused stop (field or submit control) is fully visible
fn form_scroll(app: &App, viewport: u16) -> FormScroll {
    scroll_for(app.focus, app.form.fields.len(), app.form.banner.is_some(), viewport)
}

fn scroll_for(focus: usize, fields: usize, has_banner: bool, viewport: u16) -> FormScroll {
    let banner_h = if has_banner { BANNER_HEIGHT } else { 0 };
    let content = banner_h + fields as u16 * FIELD_HEIGHT + SUBMIT_HEIGHT;

    let focus_bottom = if focus >= fields {
        content
    } else {
        banner_h + (focus as u16 + 1) * FIELD_HEIGHT
    };

    FormScroll {
        offset: focus_bottom.saturating_sub(viewport),
        content,
        viewport,
    }
}

fn draw_progress(f: &mut Frame, theme: &Theme, percent: f64, area: Rect) {
    let filled = ((area.width as f64) * percent / 100.0).round() as u16;
    let spans: Vec<Span> = (0..filled)
        .map(|x| {
            let t = x as f64 / area.width.max(1) as f64;
            Span::styled("━", Style::default().fg(theme.progress_color(t)))
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    // Priority: in-flight submission > status message > ready
    let line = if let Some(started) = app.submit_started {
        Line::from(vec![
            Span::styled("󰔟 ", Style::default().fg(theme.accent)),
            Span::styled(
                format!("Sending your message... {:.1}s", started.elapsed().as_secs_f64()),
                Style::default().fg(theme.text),
            ),
        ])
    } else if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(theme.accent)))
    } else {
        Line::from(Span::styled("Ready", Style::default().fg(theme.text_dim)))
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_form(f: &mut Frame, app: &App, offset: u16, area: Rect) {
    let theme = &app.theme;
    let mut title = vec![Span::styled(
        " Contact Us ",
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
    )];
    let invalid = app.form.invalid_count();
    if invalid > 0 {
        title.push(Span::styled(format!("({} to fix) ", invalid), Style::default().fg(theme.error)));
    }
    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.inactive));
    let inner = block.inner(area);
    f.render_widget(block, area);

    // Content coordinates -> screen rect, None if not fully on screen
    let place = |y: u16, h: u16| -> Option<Rect> {
        if y < offset || y + h > offset + inner.height {
            return None;
        }
        Some(Rect::new(inner.x, inner.y + (y - offset), inner.width, h))
    };

    let mut y = 0;
    if let Some(ref message) = app.form.banner {
        if let Some(rect) = place(y, BANNER_HEIGHT) {
            f.render_widget(banner(message, theme), rect);
        }
        y += BANNER_HEIGHT;
    }

    for (i, field) in app.form.fields.iter().enumerate() {
        if let Some(rect) = place(y, FIELD_HEIGHT) {
            let input = Rect { height: FIELD_HEIGHT - 1, ..rect };
            let error = Rect { y: rect.y + FIELD_HEIGHT - 1, height: 1, ..rect };
            f.render_widget(field_input(field, i == app.focus, theme), input);
            f.render_widget(field_error(field, theme), error);
        }
        y += FIELD_HEIGHT;
    }

    if let Some(rect) = place(y, SUBMIT_HEIGHT) {
        let button = centered_rect(40, SUBMIT_HEIGHT, rect);
        f.render_widget(submit_button(&app.form.submit, app.on_submit_control(), theme), button);
    }
}

fn draw_confirmation(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let block = Block::default()
        .title(Span::styled(
            " Thank You! ",
            Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.success));

    let mut lines = vec![
        Line::from(Span::styled(
            "✓ Your message has been sent",
            Style::default().fg(theme.success).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if let Some(ref confirmation) = app.confirmation {
        for row in &confirmation.rows {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<14}", format!("{}:", row.label)), Style::default().fg(theme.text_dim)),
                Span::styled(row.value.as_str(), Style::default().fg(theme.text)),
            ]));
        }
    }

    let elapsed = app.confirmation_opened.map(|t| t.elapsed()).unwrap_or_default();
    let shown = motion::revealed(elapsed, STEP_DELAY, STEP_STAGGER, NEXT_STEPS.len());
    if shown > 0 {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("What happens next", Style::default().fg(theme.accent))));
        for (i, step) in NEXT_STEPS.iter().take(shown).enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}. ", i + 1), Style::default().fg(theme.accent)),
                Span::styled(*step, Style::default().fg(theme.text)),
            ]));
        }
    }

    let content = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(content, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.view {
        View::Form if app.is_submitting() => vec![("Ctrl+C", "Quit")],
        View::Form => vec![
            ("Tab/↓", "Next"),
            ("S-Tab/↑", "Prev"),
            ("Enter", "Next/Send"),
            ("Ctrl+S", "Send"),
            ("F1", "Help"),
            ("Ctrl+C", "Quit"),
        ],
        View::Confirmation => vec![("Esc/n", "New message"), ("?", "Help"), ("q", "Quit")],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 3 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(app.theme.accent)),
                Span::styled(format!(" {} │ ", action), Style::default().fg(app.theme.text_dim)),
            ]
        })
        .collect();

    f.render_widget(Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center), area);
}

fn draw_help_popup(f: &mut Frame, theme: &Theme) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 80 { 95 } else { 70 }, 18, area);

    f.render_widget(Clear, popup_area);

    let heading = Style::default().fg(theme.banner).add_modifier(Modifier::BOLD);
    let key = Style::default().fg(theme.accent);

    let help_text = vec![
        Line::from(Span::styled("═══ Form ═══", heading)),
        Line::from(vec![Span::styled("  Tab / ↓     ", key), Span::raw("Next field (checks the one you leave)")]),
        Line::from(vec![Span::styled("  S-Tab / ↑   ", key), Span::raw("Previous field")]),
        Line::from(vec![Span::styled("  Enter       ", key), Span::raw("Next field, or send on the button")]),
        Line::from(vec![Span::styled("  Ctrl+S      ", key), Span::raw("Send from anywhere")]),
        Line::from(vec![Span::raw("              Fields marked * are required")]),
        Line::from(""),
        Line::from(Span::styled("═══ After Sending ═══", heading)),
        Line::from(vec![Span::styled("  Esc / n     ", key), Span::raw("Start a new message")]),
        Line::from(vec![Span::styled("  q           ", key), Span::raw("Quit")]),
        Line::from(""),
        Line::from(Span::styled("═══ CLI ═══", heading)),
        Line::from(vec![Span::styled("  formgate --confirmation  ", key), Span::raw("Show and clear the last submission")]),
        Line::from(vec![Span::styled("  formgate --peek          ", key), Span::raw("Print it without clearing")]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Help (F1 / Esc to close) ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}
