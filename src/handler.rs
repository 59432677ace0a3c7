use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::info;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global quit, works in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The open chat panel captures all input
    if app.chat.visible {
        handle_chat_key(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_feed_normal(app, key),
        InputMode::Editing => handle_search_editing(app, key),
    }
}

fn handle_feed_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Article navigation
        KeyCode::Char('j') | KeyCode::Down => app.select_next_article(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev_article(),
        KeyCode::Char('g') => app.select_first_article(),
        KeyCode::Char('G') => app.select_last_article(),

        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        // Article actions
        KeyCode::Enter | KeyCode::Char('o') => {
            if let Some(article) = app.current_article() {
                open_in_browser(&article.url);
            }
        }
        KeyCode::Char('y') => {
            if let Some(article) = app.current_article() {
                copy_to_clipboard(&article.url);
            }
        }
        KeyCode::Char('r') => {
            let query = app.query.clone();
            dispatch_fetch(app, query);
        }

        // Search editing
        KeyCode::Char('/') | KeyCode::Char('s') => {
            app.input_mode = InputMode::Editing;
            app.search_cursor = app.search_input.chars().count();
        }

        // Chat panel opens straight into typing
        KeyCode::Char('c') => {
            app.chat.show();
            app.input_mode = InputMode::Editing;
        }

        _ => {}
    }
}

fn handle_search_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            let query = app.search_input.trim().to_string();
            app.input_mode = InputMode::Normal;
            dispatch_fetch(app, query);
        }
        KeyCode::Backspace => {
            if app.search_cursor > 0 {
                app.search_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.search_input, app.search_cursor);
                app.search_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.search_input.chars().count();
            if app.search_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.search_input, app.search_cursor);
                app.search_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.search_cursor = app.search_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.search_input.chars().count();
            app.search_cursor = (app.search_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.search_cursor = 0;
        }
        KeyCode::End => {
            app.search_cursor = app.search_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.search_input, app.search_cursor);
            app.search_input.insert(byte_pos, c);
            app.search_cursor += 1;
        }
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match app.input_mode {
        InputMode::Editing => match key.code {
            KeyCode::Esc => {
                app.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                send_chat(app);
            }
            KeyCode::Backspace => {
                if app.chat.cursor > 0 {
                    app.chat.cursor -= 1;
                    let byte_pos = char_to_byte_index(&app.chat.input, app.chat.cursor);
                    app.chat.input.remove(byte_pos);
                }
            }
            KeyCode::Delete => {
                let char_count = app.chat.input.chars().count();
                if app.chat.cursor < char_count {
                    let byte_pos = char_to_byte_index(&app.chat.input, app.chat.cursor);
                    app.chat.input.remove(byte_pos);
                }
            }
            KeyCode::Left => {
                app.chat.cursor = app.chat.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                let char_count = app.chat.input.chars().count();
                app.chat.cursor = (app.chat.cursor + 1).min(char_count);
            }
            KeyCode::Home => {
                app.chat.cursor = 0;
            }
            KeyCode::End => {
                app.chat.cursor = app.chat.input.chars().count();
            }
            KeyCode::Char(c) => {
                let byte_pos = char_to_byte_index(&app.chat.input, app.chat.cursor);
                app.chat.input.insert(byte_pos, c);
                app.chat.cursor += 1;
            }
            _ => {}
        },
        InputMode::Normal => match key.code {
            KeyCode::Esc | KeyCode::Char('c') => {
                app.chat.hide();
            }
            KeyCode::Char('i') => {
                app.input_mode = InputMode::Editing;
                app.chat.cursor = app.chat.input.chars().count();
            }
            KeyCode::Char('j') | KeyCode::Down => app.chat.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => app.chat.scroll_up(1),
            _ => {}
        },
    }
}

/// Spawn the relay call for whatever the chat input holds.
fn send_chat(app: &mut App) {
    if let Some(text) = app.chat.begin_send() {
        if let Some(relay) = app.relay.clone() {
            info!("relaying chat message ({} chars)", text.chars().count());
            let task = tokio::spawn(async move { relay.send(&text).await });
            app.chat.dispatch(task);
        }
    }
}

/// Spawn a feed fetch tagged with its sequence number.
pub fn dispatch_fetch(app: &mut App, query: String) {
    if let Some((seq, client)) = app.request_fetch(query) {
        info!(seq, query = %app.query, "fetching news");
        let q = app.query.clone();
        let task = tokio::spawn(async move { client.fetch(&q).await });
        app.track_fetch(seq, task);
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat.visible
        && app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_feed = app.feed_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.chat.scroll_down(3);
            } else if in_feed {
                app.scroll_feed_down();
                app.scroll_feed_down();
                app.scroll_feed_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.chat.scroll_up(3);
            } else if in_feed {
                app.scroll_feed_up();
                app.scroll_feed_up();
                app.scroll_feed_up();
            }
        }
        _ => {}
    }
}

fn open_in_browser(url: &str) {
    use std::process::{Command, Stdio};

    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(not(target_os = "macos"))]
    let opener = "xdg-open";

    let _ = Command::new(opener)
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
}

fn copy_to_clipboard(text: &str) {
    use std::process::{Command, Stdio};
    use std::io::Write;

    #[cfg(target_os = "macos")]
    let mut command = Command::new("pbcopy");
    #[cfg(not(target_os = "macos"))]
    let mut command = {
        let mut c = Command::new("xclip");
        c.args(["-selection", "clipboard"]);
        c
    };

    if let Ok(mut child) = command.stdin(Stdio::piped()).spawn() {
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(text.as_bytes());
        }
    }
}
