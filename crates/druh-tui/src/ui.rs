use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use druh_core::{ChatRole, Entry, LoaderStyle};
use druh_core::history::EMPTY_STATE;
use unicode_width::UnicodeWidthChar;

use crate::app::{App, MAX_INPUT_ROWS};

const HISTORY_WIDTH: u16 = 30;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some((_, c)) = chars.next() {
                if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Word-wrap a styled line into rows no wider than `width`, keeping span
/// styles. Spaces at a break are dropped; words longer than a row are split.
/// Every returned line is exactly one terminal row.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line];
    }

    let line_style = line.style;
    let chars: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |c| (c, span.style)))
        .collect();

    let mut rows: Vec<Vec<(char, Style)>> = Vec::new();
    let mut current: Vec<(char, Style)> = Vec::new();
    let mut current_width = 0;

    // Close the current row; trailing spaces at a break are not drawn
    let break_row = |rows: &mut Vec<Vec<(char, Style)>>, current: &mut Vec<(char, Style)>| {
        while current.last().is_some_and(|(c, _)| *c == ' ') {
            current.pop();
        }
        if !current.is_empty() {
            rows.push(std::mem::take(current));
        }
    };

    for token in chars.chunk_by(|a, b| (a.0 == ' ') == (b.0 == ' ')) {
        let token_width: usize = token.iter().map(|(c, _)| c.width().unwrap_or(0)).sum();

        if current_width + token_width <= width {
            current.extend_from_slice(token);
            current_width += token_width;
            continue;
        }

        if token[0].0 == ' ' {
            if current_width == 0 {
                // Indentation wider than a row
                current.extend_from_slice(&token[..width]);
                current_width = width;
            } else {
                // Break here and swallow the run
                break_row(&mut rows, &mut current);
                current_width = 0;
            }
            continue;
        }

        if token_width <= width {
            // Word doesn't fit, start new row
            break_row(&mut rows, &mut current);
            current.extend_from_slice(token);
            current_width = token_width;
            continue;
        }

        // Longer than a whole row: fill rows char by char
        for &(c, style) in token {
            let char_width = c.width().unwrap_or(0);
            if current_width + char_width > width && current_width > 0 {
                break_row(&mut rows, &mut current);
                current_width = 0;
            }
            current.push((c, style));
            current_width += char_width;
        }
    }

    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }

    rows.into_iter()
        .map(|row| {
            let spans: Vec<Span<'static>> = row
                .chunk_by(|a, b| a.1 == b.1)
                .map(|run| Span::styled(run.iter().map(|(c, _)| *c).collect::<String>(), run[0].1))
                .collect();
            Line::from(spans).style(line_style)
        })
        .collect()
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [history_area, chat_column] = Layout::horizontal([
        Constraint::Length(HISTORY_WIDTH.min(body_area.width / 3)),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_history(app, frame, history_area);
    render_chat_column(app, frame, chat_column);
    render_footer(app, frame, footer_area);

    if app.alert.is_some() {
        render_alert(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" AI Друг ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    if app.chat.is_gated() {
        spans.push(Span::raw("  "));
        match app.chat.user() {
            Some(user) => {
                spans.push(Span::styled(
                    format!("● {}", user.display_name),
                    Style::default().fg(Color::Green).bold(),
                ));
                if !user.avatar_url.is_empty() {
                    spans.push(Span::styled(
                        format!(" ({})", user.avatar_url),
                        Style::default().fg(Color::Gray),
                    ));
                }
            }
            None => spans.push(Span::styled(
                "○ Вхід не виконано",
                Style::default().fg(Color::Gray),
            )),
        }
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let send_style = if app.chat.composer().can_send() {
        Style::default().bg(Color::Cyan).fg(Color::Black).bold()
    } else {
        Style::default().bg(Color::Black).fg(Color::DarkGray)
    };

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" надіслати ", send_style),
        Span::styled(" Shift+Enter ", key_style),
        Span::styled(" новий рядок ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" гортати ", label_style),
    ];

    if app.chat.is_gated() {
        if app.chat.user().is_some() {
            hints.push(Span::styled(" Ctrl+O ", key_style));
            hints.push(Span::styled(" вийти ", label_style));
        } else {
            hints.push(Span::styled(" Ctrl+L ", key_style));
            hints.push(Span::styled(" увійти ", label_style));
        }
    }

    hints.push(Span::styled(" Ctrl+C ", key_style));
    hints.push(Span::styled(" закрити ", label_style));

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_history(app: &mut App, frame: &mut Frame, area: Rect) {
    app.history_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Історія ");

    let history = app.chat.history();
    if history.is_empty() {
        let empty = Paragraph::new(Span::styled(
            EMPTY_STATE,
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Keep the scroll offset within the list
    let max_scroll = history.len().saturating_sub(1) as u16;
    app.history_scroll = app.history_scroll.min(max_scroll);

    let inner_width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .chat
        .history()
        .entries()
        .skip(app.history_scroll as usize)
        .map(|prompt| {
            // First line only, cut to the panel width
            let first = prompt.lines().next().unwrap_or_default();
            let mut label: String = first.chars().take(inner_width.saturating_sub(2)).collect();
            if label.chars().count() < prompt.chars().count() {
                label.push('…');
            }
            ListItem::new(format!(" {}", label))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_chat_column(app: &mut App, frame: &mut Frame, area: Rect) {
    // Input grows with its content up to MAX_INPUT_ROWS
    let input_inner_width = area.width.saturating_sub(2) as usize;
    let input_rows = app
        .chat
        .composer()
        .visual_lines(input_inner_width)
        .len()
        .clamp(1, MAX_INPUT_ROWS) as u16;

    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(input_rows + 2),
    ])
    .areas(area);

    render_transcript(app, frame, transcript_area);
    render_input(app, frame, input_area);
}

fn loader_line(style: LoaderStyle, frame_idx: u8) -> Line<'static> {
    match style {
        LoaderStyle::Dots => {
            let dots: Vec<Span> = (0..3)
                .map(|i| {
                    if i == frame_idx {
                        Span::styled("● ", Style::default().fg(Color::Yellow))
                    } else {
                        Span::styled("● ", Style::default().fg(Color::DarkGray))
                    }
                })
                .collect();
            Line::from(dots)
        }
        LoaderStyle::Text => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((frame_idx as usize) + 1);
            Line::from(Span::styled(
                format!("Думаю{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ))
        }
    }
}

fn welcome_text(app: &App) -> Text<'static> {
    let hint = if app.chat.is_gated() && app.chat.user().is_none() {
        "Увійдіть (Ctrl+L), щоб почати спілкування."
    } else {
        "Напишіть повідомлення, щоб почати розмову."
    };

    Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            "Вітаю! Я — AI Друг.",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    ])
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let user_label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let ai_label = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let ai_heading = format!("{}:", ChatRole::Ai.label());

    let mut lines: Vec<Line> = Vec::new();

    for entry in app.chat.transcript().entries() {
        match entry {
            Entry::Message(msg) => match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        format!("{}:", ChatRole::User.label()),
                        user_label,
                    )));
                    for line in msg.content.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                ChatRole::Ai => {
                    lines.push(Line::from(Span::styled(ai_heading.clone(), ai_label)));
                    // Split response into lines and parse markdown
                    for line in msg.content.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
            },
            Entry::Error(text) => {
                lines.push(Line::from(Span::styled(ai_heading.clone(), ai_label)));
                lines.push(Line::from(Span::styled(
                    text.clone(),
                    Style::default().fg(Color::Red),
                )));
            }
            Entry::Loading(_) => {
                lines.push(Line::from(Span::styled(ai_heading.clone(), ai_label)));
                lines.push(loader_line(app.chat.loader(), app.animation_frame));
            }
        }
        lines.push(Line::default());
    }

    lines
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Чат ");

    if app.chat.transcript().is_welcome() {
        let welcome = Paragraph::new(welcome_text(app))
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(welcome, area);
        return;
    }

    // Wrap up front so the row count used for scrolling is the drawn one
    let inner_width = area.width.saturating_sub(2) as usize;
    let lines: Vec<Line<'static>> = transcript_lines(app)
        .into_iter()
        .flat_map(|line| wrap_line(line, inner_width))
        .collect();

    // Pin to the newest entry unless the user scrolled away
    let total = lines.len().min(u16::MAX as usize) as u16;
    let max_scroll = total.saturating_sub(app.chat_height);
    app.chat.transcript_mut().sync_scroll(max_scroll);

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.chat.transcript().scroll(), 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let composer = app.chat.composer();
    let enabled = composer.is_enabled();

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if enabled { Color::Yellow } else { Color::DarkGray }))
        .title(" Повідомлення ");

    if composer.text().is_empty() {
        let placeholder = Paragraph::new(Span::styled(
            composer.placeholder(),
            Style::default().fg(Color::DarkGray),
        ))
        .block(input_block);
        frame.render_widget(placeholder, area);
    } else {
        let inner_width = area.width.saturating_sub(2) as usize;
        let inner_height = area.height.saturating_sub(2) as usize;
        let rows = composer.visual_lines(inner_width);
        let (cursor_row, _) = composer.cursor_position(inner_width);

        // Scroll so the cursor row stays visible
        let offset = (cursor_row + 1).saturating_sub(inner_height.max(1));

        let visible: Vec<Line> = rows
            .into_iter()
            .skip(offset)
            .take(inner_height)
            .map(Line::from)
            .collect();

        // Use cyan text to match the "Ви:" style - visible in both light and dark terminals
        let input = Paragraph::new(Text::from(visible))
            .style(Style::default().fg(Color::Cyan))
            .block(input_block);
        frame.render_widget(input, area);
    }

    // Show cursor while the field is usable
    if enabled && app.alert.is_none() {
        let inner_width = area.width.saturating_sub(2) as usize;
        let inner_height = area.height.saturating_sub(2) as usize;
        let (row, col) = composer.cursor_position(inner_width);
        let offset = (row + 1).saturating_sub(inner_height.max(1));
        frame.set_cursor_position((
            area.x + 1 + col as u16,
            area.y + 1 + (row - offset) as u16,
        ));
    }
}

fn render_alert(app: &App, frame: &mut Frame, area: Rect) {
    let message = app.alert.as_deref().unwrap_or_default();

    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Увага ");

    let text = Text::from(vec![
        Line::from(message.to_string()),
        Line::default(),
        Line::from(Span::styled(
            "Enter або Esc — закрити",
            Style::default().fg(Color::DarkGray),
        )),
    ]);

    let popup = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(popup, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use druh_core::{ChatController, CompletionClient, CompletionError};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct SilentClient;

    #[async_trait]
    impl CompletionClient for SilentClient {
        async fn complete(&self, _user_text: &str) -> Result<String, CompletionError> {
            Err(CompletionError::MalformedResponse)
        }
    }

    fn screen_text(buffer: &Buffer) -> String {
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        screen_text(terminal.backend().buffer())
    }

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let chat = ChatController::new(Arc::new(SilentClient), false, LoaderStyle::Text);
        App::new(chat, None, tx)
    }

    #[test]
    fn test_bold_markdown_becomes_styled_span() {
        let line = parse_markdown_line("Це **важливо** знати");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "важливо");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let line = parse_markdown_line("**незакрите");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "**незакрите");
    }

    fn row_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_line_breaks_between_words() {
        let rows = wrap_line(Line::from("один два три чотири"), 9);
        let texts: Vec<String> = rows.iter().map(row_text).collect();
        assert_eq!(texts, vec!["один два", "три", "чотири"]);
    }

    #[test]
    fn test_wrap_line_splits_overlong_words_and_keeps_empty_lines() {
        let rows = wrap_line(Line::from("abcdefghij xy"), 4);
        let texts: Vec<String> = rows.iter().map(row_text).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij", "xy"]);

        assert_eq!(wrap_line(Line::default(), 4).len(), 1);
    }

    #[test]
    fn test_wrap_line_keeps_bold_span_style() {
        let rows = wrap_line(parse_markdown_line("дуже **важливо** знати"), 10);
        let texts: Vec<String> = rows.iter().map(row_text).collect();
        assert_eq!(texts, vec!["дуже", "важливо", "знати"]);

        let bold = &rows[1].spans[0];
        assert_eq!(bold.content, "важливо");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        assert!(!rows[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_long_reply_tail_stays_reachable() {
        let mut app = app();
        let words = vec!["абвгдеєжзиійк"; 10].join(" ");
        app.chat
            .transcript_mut()
            .append(ChatRole::Ai, format!("{} КІНЕЦЬ", words));

        let mut terminal = Terminal::new(TestBackend::new(40, 14)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let screen = screen_text(terminal.backend().buffer());
        assert!(screen.contains("КІНЕЦЬ"), "{}", screen);

        // Scrolling to the very bottom by hand lands on the same tail
        app.chat.transcript_mut().scroll_up(u16::MAX);
        app.chat.transcript_mut().scroll_down(u16::MAX);
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let screen = screen_text(terminal.backend().buffer());
        assert!(screen.contains("КІНЕЦЬ"), "{}", screen);
    }

    #[test]
    fn test_welcome_and_empty_history_render() {
        let mut app = app();
        let screen = draw(&mut app);
        assert!(screen.contains("Вітаю! Я — AI Друг."));
        assert!(screen.contains(EMPTY_STATE));
        assert!(screen.contains("Напишіть повідомлення..."));
    }

    #[test]
    fn test_submitted_prompt_renders_with_loader() {
        let mut app = app();
        let pending = app.chat.submit("Привіт");
        assert!(pending.is_some());

        let screen = draw(&mut app);
        assert!(!screen.contains("Вітаю! Я — AI Друг."));
        assert!(screen.contains("Ви:"));
        assert!(screen.contains("Привіт"));
        assert!(screen.contains("Думаю."));
    }
}
