use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{error, warn};

pub const GREETING: &str = "Hello! How can I help you today?";
const UNCONFIGURED_NOTICE: &str = "Chat relay URL is not configured.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Floating chat panel. Owns its transcript, input buffer, visibility, and
/// the handle of the in-flight relay call; the rest of the app only sees
/// show/hide and the begin/resolve send cycle.
pub struct ChatWidget {
    pub visible: bool,
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub cursor: usize,
    pub scroll: u16,
    // Panel dimensions recorded during render, used for scroll math.
    pub area_height: u16,
    pub area_width: u16,
    pub animation_frame: u8,
    configured: bool,
    pending: Option<JoinHandle<Result<String>>>,
}

impl ChatWidget {
    pub fn new(configured: bool) -> Self {
        Self {
            visible: false,
            messages: vec![ChatMessage {
                role: ChatRole::Assistant,
                content: GREETING.to_string(),
            }],
            input: String::new(),
            cursor: 0,
            scroll: 0,
            area_height: 0,
            area_width: 0,
            animation_frame: 0,
            configured,
            pending: None,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Closing the panel discards any reply still in flight.
    pub fn hide(&mut self) {
        self.visible = false;
        self.abort_pending();
    }

    pub fn toggle(&mut self) {
        if self.visible {
            self.hide();
        } else {
            self.show();
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the current input as an outgoing message. The input clears
    /// immediately no matter how the send later resolves. Returns the text
    /// to dispatch, or `None` when there is nothing to send (blank input,
    /// or the relay is unconfigured and only a System notice was appended).
    pub fn begin_send(&mut self) -> Option<String> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.input.clear();
        self.cursor = 0;

        if !self.configured {
            warn!("chat send refused: relay URL still holds its placeholder");
            self.messages.push(ChatMessage {
                role: ChatRole::System,
                content: UNCONFIGURED_NOTICE.to_string(),
            });
            self.scroll_to_bottom();
            return None;
        }

        // A new send supersedes whatever is still in flight.
        self.abort_pending();

        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: text.clone(),
        });
        self.scroll_to_bottom();
        Some(text)
    }

    pub fn dispatch(&mut self, task: JoinHandle<Result<String>>) {
        self.pending = Some(task);
    }

    /// Hand back the in-flight task once it has finished, so the event loop
    /// can await it without blocking.
    pub fn take_finished(&mut self) -> Option<JoinHandle<Result<String>>> {
        if self.pending.as_ref().is_some_and(|task| task.is_finished()) {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn resolve(&mut self, result: Result<String>) {
        let message = match result {
            Ok(reply) => ChatMessage {
                role: ChatRole::Assistant,
                content: reply,
            },
            Err(e) => {
                error!("chat relay call failed: {e:#}");
                ChatMessage {
                    role: ChatRole::System,
                    content: format!("Error: Could not connect to AI service. {e:#}"),
                }
            }
        };
        self.messages.push(message);
        self.scroll_to_bottom();
    }

    fn abort_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    /// Cycle the thinking-indicator ellipsis while a reply is pending.
    pub fn tick_animation(&mut self) {
        if self.pending.is_some() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max_scroll = self.total_lines().saturating_sub(self.area_height);
        self.scroll = self.scroll.saturating_add(lines).min(max_scroll);
    }

    /// Keep the latest entry (and the thinking indicator) in view.
    pub fn scroll_to_bottom(&mut self) {
        let total = self.total_lines();
        let visible = if self.area_height > 0 { self.area_height } else { 20 };
        self.scroll = total.saturating_sub(visible);
    }

    fn total_lines(&self) -> u16 {
        let wrap_width = if self.area_width > 0 {
            self.area_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.messages {
            total += 1; // Role line ("You:" / "AI:" / "System:")
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8 content
                let char_count = line.chars().count();
                if char_count == 0 {
                    total += 1;
                } else {
                    total += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total += 1; // Blank line after each message
        }

        if self.pending.is_some() {
            total += 2; // Role line + "Thinking..."
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn count_role(widget: &ChatWidget, role: ChatRole) -> usize {
        widget.messages.iter().filter(|m| m.role == role).count()
    }

    #[test]
    fn test_widget_starts_hidden_with_greeting() {
        let widget = ChatWidget::new(true);
        assert!(!widget.visible);
        assert_eq!(widget.messages.len(), 1);
        assert_eq!(widget.messages[0].role, ChatRole::Assistant);
        assert_eq!(widget.messages[0].content, GREETING);
    }

    #[test]
    fn test_unconfigured_send_appends_one_system_entry_and_nothing_else() {
        let mut widget = ChatWidget::new(false);
        widget.input = "hello there".to_string();

        assert!(widget.begin_send().is_none());
        assert_eq!(count_role(&widget, ChatRole::System), 1);
        assert_eq!(count_role(&widget, ChatRole::User), 0);
        assert!(!widget.is_waiting());
        // Input still clears on a refused send
        assert!(widget.input.is_empty());
    }

    #[test]
    fn test_blank_input_sends_nothing() {
        let mut widget = ChatWidget::new(true);
        widget.input = "   ".to_string();
        assert!(widget.begin_send().is_none());
        assert_eq!(widget.messages.len(), 1); // greeting only
    }

    #[test]
    fn test_send_appends_user_entry_and_clears_input() {
        let mut widget = ChatWidget::new(true);
        widget.input = "what happened today?".to_string();
        widget.cursor = widget.input.chars().count();

        let dispatched = widget.begin_send();
        assert_eq!(dispatched.as_deref(), Some("what happened today?"));
        assert!(widget.input.is_empty());
        assert_eq!(widget.cursor, 0);

        let last = widget.messages.last().unwrap();
        assert_eq!(last.role, ChatRole::User);
        assert_eq!(last.content, "what happened today?");
    }

    #[test]
    fn test_resolve_success_appends_assistant_reply() {
        let mut widget = ChatWidget::new(true);
        widget.input = "question".to_string();
        widget.begin_send();

        widget.resolve(Ok("the answer".to_string()));

        let last = widget.messages.last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "the answer");
        // User entry precedes the reply
        let roles: Vec<ChatRole> = widget.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]);
    }

    #[test]
    fn test_resolve_failure_appends_system_entry() {
        let mut widget = ChatWidget::new(true);
        widget.input = "question".to_string();
        widget.begin_send();

        widget.resolve(Err(anyhow!("connection refused")));

        let last = widget.messages.last().unwrap();
        assert_eq!(last.role, ChatRole::System);
        assert!(last.content.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_hide_aborts_pending_reply() {
        let mut widget = ChatWidget::new(true);
        widget.input = "question".to_string();
        widget.begin_send();

        widget.dispatch(tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }));
        assert!(widget.is_waiting());

        widget.hide();
        assert!(!widget.is_waiting());
    }

    #[tokio::test]
    async fn test_new_send_aborts_previous_task() {
        let mut widget = ChatWidget::new(true);
        widget.input = "first".to_string();
        widget.begin_send();
        let first = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok("first reply".to_string())
        });
        let first_aborter = first.abort_handle();
        widget.dispatch(first);

        widget.input = "second".to_string();
        assert!(widget.begin_send().is_some());

        // Let the abort propagate before checking
        for _ in 0..100 {
            if first_aborter.is_finished() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        panic!("superseded task was never aborted");
    }

    #[tokio::test]
    async fn test_take_finished_returns_only_completed_tasks() {
        let mut widget = ChatWidget::new(true);
        widget.input = "question".to_string();
        widget.begin_send();

        widget.dispatch(tokio::spawn(async { Ok("done".to_string()) }));

        // Wait for the trivial task to complete
        for _ in 0..100 {
            if widget.take_finished().is_some() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        panic!("finished task was never handed back");
    }

    #[test]
    fn test_thinking_indicator_never_lands_in_transcript() {
        let mut widget = ChatWidget::new(true);
        widget.input = "question".to_string();
        widget.begin_send();
        widget.resolve(Ok("reply".to_string()));

        assert!(widget.messages.iter().all(|m| !m.content.contains("Thinking")));
    }

    #[test]
    fn test_animation_only_advances_while_waiting() {
        let mut widget = ChatWidget::new(true);
        widget.tick_animation();
        assert_eq!(widget.animation_frame, 0);
    }
}
