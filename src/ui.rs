use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
};
use crate::app::{App, InputMode, card_line_count};
use crate::chat::ChatRole;
use crate::news::Article;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, search box, feed, footer
    let [header_area, search_area, feed_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_search(app, frame, search_area);
    render_feed(app, frame, feed_area);
    render_footer(app, frame, footer_area);

    // Chat panel floats over the feed, anchored bottom-right
    if app.chat.visible {
        let popup = chat_popup_area(area);
        app.chat_area = Some(popup);
        render_chat(app, frame, popup);
    } else {
        app.chat_area = None;
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let loading_indicator = if app.feed_loading { " [loading]" } else { "" };

    let title = Line::from(vec![
        Span::styled(" newsdesk ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(loading_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_search(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && !app.chat.visible;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Search (empty = top headlines) ");

    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) =
        input_window(&app.search_input, app.search_cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_feed(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ({}) ", app.feed_title(), app.articles.len()));

    let inner_area = block.inner(area);
    app.feed_area = Some(area);
    app.feed_height = inner_area.height;
    app.feed_width = inner_area.width;

    if let Some(error) = &app.feed_error {
        let error_line = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(error_line, area);
        app.total_feed_lines = 0;
        return;
    }

    if app.articles.is_empty() {
        let placeholder = if app.feed_loading {
            "Loading news..."
        } else {
            "No articles yet. Press / to search."
        };
        let placeholder = Paragraph::new(placeholder)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        app.total_feed_lines = 0;
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for (idx, article) in app.articles.iter().enumerate() {
        let selected = app.selected_article == Some(idx);
        lines.extend(article_card(article, selected));
    }

    // Total uses the same wrap estimate as selection scrolling
    let wrap_width = (app.feed_width as usize).max(1);
    app.total_feed_lines = app
        .articles
        .iter()
        .map(|a| card_line_count(a, wrap_width))
        .sum();

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.feed_scroll, 0));
    frame.render_widget(paragraph, area);

    if app.total_feed_lines > app.feed_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(app.total_feed_lines as usize)
            .position(app.feed_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

/// One article as rendered lines: title, meta, description, image, link, blank.
pub(crate) fn article_card(article: &Article, selected: bool) -> Vec<Line<'_>> {
    let title_style = if selected {
        Style::default().fg(Color::Black).bg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::Yellow).bold()
    };

    vec![
        Line::from(Span::styled(article.title.as_str(), title_style)),
        Line::from(Span::styled(
            format!("{}  {}", article.published_label(), article.source),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(article.description.as_str()),
        Line::from(vec![
            Span::styled("img ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                article.image_url.as_str(),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::UNDERLINED),
            ),
        ]),
        Line::from(Span::styled(
            article.url.as_str(),
            Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        )),
        Line::default(),
    ]
}

fn chat_popup_area(area: Rect) -> Rect {
    let width = area.width.saturating_sub(4).min(46);
    let height = area.height.saturating_sub(4).min(20);
    Rect {
        x: area.width.saturating_sub(width + 2),
        y: area.height.saturating_sub(height + 2),
        width,
        height,
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Support Chat (Esc closes) ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [messages_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(inner);

    // Record dimensions for the widget's scroll math
    app.chat.area_height = messages_area.height;
    app.chat.area_width = messages_area.width;

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.chat.messages {
        let (label, label_color) = match msg.role {
            ChatRole::User => ("You:", Color::Cyan),
            ChatRole::Assistant => ("AI:", Color::Yellow),
            ChatRole::System => ("System:", Color::Red),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(label_color).add_modifier(Modifier::BOLD),
        )));
        for line in msg.content.lines() {
            if msg.role == ChatRole::System {
                lines.push(Line::from(Span::styled(
                    line,
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            } else {
                lines.push(Line::from(line));
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_waiting() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.chat.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let messages = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: true })
        .scroll((app.chat.scroll, 0));
    frame.render_widget(messages, messages_area);

    // Input box
    let editing = app.input_mode == InputMode::Editing;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(" Ask something ");

    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_window(&app.chat.input, app.chat.cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    if editing {
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

/// Horizontal window over an input line so the cursor stays visible.
fn input_window(input: &str, cursor: usize, inner_width: usize) -> (String, u16) {
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor >= inner_width {
        cursor - inner_width + 1
    } else {
        0
    };

    let visible: String = input.chars().skip(scroll_offset).take(inner_width).collect();
    (visible, (cursor - scroll_offset) as u16)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = if app.chat.visible { " CHAT " } else { " NEWS " };

    let hints = if app.chat.visible {
        match app.input_mode {
            InputMode::Editing => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
            InputMode::Normal => vec![
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" close ", label_style),
            ],
        }
    } else {
        match app.input_mode {
            InputMode::Editing => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" fetch ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" cancel ", label_style),
            ],
            InputMode::Normal => vec![
                Span::styled(" j/k ", key_style),
                Span::styled(" articles ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" open ", label_style),
                Span::styled(" y ", key_style),
                Span::styled(" copy link ", label_style),
                Span::styled(" r ", key_style),
                Span::styled(" refresh ", label_style),
                Span::styled(" / ", key_style),
                Span::styled(" search ", label_style),
                Span::styled(" c ", key_style),
                Span::styled(" chat ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::styled(" ", label_style)];
    spans.extend(hints);

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
