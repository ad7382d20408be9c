use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::message::Role;

use super::view::{ChatView, LoaderView, OnboardingView, View, APP_TITLE};

const ACCENT: Color = Color::Cyan;
const MUTED: Color = Color::DarkGray;

pub fn ui(f: &mut Frame, view: &View) {
    match view {
        View::Onboarding(onboarding) => draw_onboarding(f, onboarding),
        View::Loader(loader) => draw_loader(f, loader),
        View::Chat(chat) => draw_chat(f, chat),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_onboarding(f: &mut Frame, view: &OnboardingView) {
    let area = centered(f.area(), 72, 16);
    let mut lines = vec![
        Line::from(Span::styled(
            view.heading,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for paragraph in &view.paragraphs {
        lines.push(Line::from(*paragraph));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(view.hint, Style::default().fg(MUTED))));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(APP_TITLE))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_loader(f: &mut Frame, view: &LoaderView) {
    let area = centered(f.area(), 64, 11);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} • {}", view.title, view.model_id));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    f.render_widget(
        Paragraph::new(view.status.as_str()).style(Style::default().add_modifier(Modifier::BOLD)),
        rows[0],
    );
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(ACCENT))
            .percent(u16::from(view.percent))
            .label(format!("{}%", view.percent)),
        rows[1],
    );
    f.render_widget(
        Paragraph::new(view.detail.as_str()).style(Style::default().fg(MUTED)),
        rows[2],
    );

    let footer = match view.cancel_prompt {
        Some(prompt) => Line::from(Span::styled(prompt, Style::default().fg(Color::Yellow))),
        None => Line::from(Span::styled(view.hint, Style::default().fg(MUTED))),
    };
    f.render_widget(Paragraph::new(footer), rows[4]);
}

fn message_lines(view: &ChatView) -> Vec<Line<'_>> {
    let mut lines = Vec::new();

    if let Some(welcome) = &view.welcome {
        lines.push(Line::from(Span::styled(
            welcome.heading.as_str(),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            welcome.text,
            Style::default().fg(MUTED),
        )));
        lines.push(Line::from(""));
    }

    for message in &view.messages {
        let color = match message.role {
            Role::User => ACCENT,
            _ => Color::White,
        };
        lines.push(Line::from(vec![
            Span::styled(
                message.author.as_str(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", message.time), Style::default().fg(MUTED)),
        ]));
        for content_line in message.content.lines() {
            lines.push(Line::from(Span::styled(
                content_line,
                Style::default().fg(color),
            )));
        }
        lines.push(Line::from(""));
    }

    if view.typing_indicator {
        lines.push(Line::from(Span::styled(
            "NeoAI schreibt …",
            Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

/// Rows `lines` occupy once wrapped to `width` columns.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn draw_chat(f: &mut Frame, view: &ChatView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    let lines = message_lines(view);
    let available_height = chunks[0].height.saturating_sub(1);
    let total_lines = wrapped_height(&lines, chunks[0].width);
    let max_offset = total_lines.saturating_sub(available_height);
    let top = max_offset.saturating_sub(view.scroll_offset.min(max_offset));

    let title = format!("{APP_TITLE} • {} • {}", view.model_id, view.model_status);
    let messages = Paragraph::new(lines)
        .block(Block::default().title(title))
        .wrap(Wrap { trim: false })
        .scroll((top, 0));
    f.render_widget(messages, chunks[0]);

    let status = match &view.status {
        Some(note) if note.is_error => Line::from(Span::styled(
            note.text.as_str(),
            Style::default().fg(Color::Red),
        )),
        Some(note) => Line::from(Span::styled(note.text.as_str(), Style::default().fg(MUTED))),
        None => Line::from(Span::styled(
            "/help für Befehle",
            Style::default().fg(MUTED),
        )),
    };
    f.render_widget(Paragraph::new(status), chunks[1]);

    let input_title = if view.can_send {
        "Nachricht (Enter zum Senden)"
    } else {
        "Nachricht"
    };
    let input_style = if view.model_busy {
        Style::default().fg(MUTED)
    } else {
        Style::default().fg(ACCENT)
    };
    let input = Paragraph::new(view.input.as_str())
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title(input_title));
    f.render_widget(input, chunks[2]);

    let inner_width = chunks[2].width.saturating_sub(2);
    let cursor_x = (view.input.width() as u16).min(inner_width.saturating_sub(1));
    f.set_cursor_position((chunks[2].x + 1 + cursor_x, chunks[2].y + 1));

    if let Some(help) = &view.help {
        draw_help(f, help);
    }
}

fn draw_help(f: &mut Frame, entries: &[(String, &'static str)]) {
    let height = entries.len() as u16 + 2;
    let area = centered(f.area(), 64, height);
    let key_width = entries
        .iter()
        .map(|(key, _)| key.width())
        .max()
        .unwrap_or(0);
    let lines: Vec<Line> = entries
        .iter()
        .map(|(key, description)| {
            Line::from(vec![
                Span::styled(
                    format!("{key:<key_width$}  "),
                    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
                ),
                Span::raw(*description),
            ])
        })
        .collect();

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Hilfe"))
            .wrap(Wrap { trim: true }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::{apply_action, AppAction, AppCommand};
    use crate::ui::view::project;
    use crate::utils::test_utils::create_test_app;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(view: &View) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|f| ui(f, view)).expect("draw");
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn wrapped_height_counts_soft_wraps() {
        let lines = vec![Line::from("a".repeat(25)), Line::from(""), Line::from("kurz")];
        assert_eq!(wrapped_height(&lines, 10), 5);
    }

    #[test]
    fn renders_onboarding_heading() {
        let app = create_test_app();
        let screen = render(&project(&app.get_state(), &app.ui, None));
        assert!(screen.contains("Willkommen bei NeoAI"));
    }

    #[test]
    fn renders_loader_status_and_percent() {
        let mut app = create_test_app();
        let load_id = match apply_action(&mut app, AppAction::ConfirmOnboarding) {
            Some(AppCommand::Provision { load_id, .. }) => load_id,
            _ => panic!("expected provision command"),
        };
        apply_action(
            &mut app,
            AppAction::ProvisionProgress {
                load_id,
                event: crate::core::provision::ProgressEvent::progress(42.0, None),
            },
        );

        let screen = render(&project(&app.get_state(), &app.ui, None));
        assert!(screen.contains("42%"));
        assert!(screen.contains("test-model"));
    }
}
