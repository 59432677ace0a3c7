use anyhow::Result;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::chat::ChatWidget;
use crate::config::{self, Config};
use crate::news::{Article, NewsClient};
use crate::relay::RelayClient;

pub const MISSING_KEY_NOTICE: &str = "News API key is missing.";
pub const FEED_ERROR_NOTICE: &str = "Failed to load news. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Search state
    pub search_input: String,
    pub search_cursor: usize,
    /// Query behind the current feed; empty means top headlines.
    pub query: String,

    // Feed state
    pub articles: Vec<Article>,
    pub selected_article: Option<usize>,
    pub feed_error: Option<String>,
    pub feed_loading: bool,
    pub feed_scroll: u16,
    pub feed_height: u16,
    pub feed_width: u16,
    pub total_feed_lines: u16,

    // Chat panel
    pub chat: ChatWidget,

    // Panel areas for mouse hit-testing (updated during render)
    pub feed_area: Option<Rect>,
    pub chat_area: Option<Rect>,

    // Clients
    pub news: Option<NewsClient>,
    pub relay: Option<RelayClient>,

    // Fetch bookkeeping: responses carrying a stale sequence number are
    // discarded, so response order can never override request order.
    latest_fetch_seq: u64,
    fetch_tasks: Vec<(u64, JoinHandle<Result<Vec<Article>>>)>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        // Env vars win over the config file
        let api_key = std::env::var("NEWS_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| config.news_api_key.clone());

        let base_url = config
            .news_base_url
            .clone()
            .unwrap_or_else(|| config::DEFAULT_NEWS_BASE_URL.to_string());

        let news = api_key.as_ref().map(|key| NewsClient::new(&base_url, key));
        if news.is_none() {
            warn!("no news API key in NEWS_API_KEY or the config file");
        }

        let relay_url = std::env::var("NEWS_RELAY_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| config.relay_url.clone());
        let configured = config::relay_is_configured(relay_url.as_deref());
        let relay = relay_url
            .as_deref()
            .filter(|_| configured)
            .map(RelayClient::new);

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            search_input: String::new(),
            search_cursor: 0,
            query: String::new(),

            articles: Vec::new(),
            selected_article: None,
            feed_error: None,
            feed_loading: false,
            feed_scroll: 0,
            feed_height: 0,
            feed_width: 0,
            total_feed_lines: 0,

            chat: ChatWidget::new(configured),

            feed_area: None,
            chat_area: None,

            news,
            relay,

            latest_fetch_seq: 0,
            fetch_tasks: Vec::new(),
        }
    }

    /// Start a fetch for `query` (empty means top headlines). Returns the
    /// sequence number and a client for the caller to spawn with, or `None`
    /// when the API key is missing and the feed shows the notice instead.
    pub fn request_fetch(&mut self, query: String) -> Option<(u64, NewsClient)> {
        let Some(news) = self.news.clone() else {
            warn!("fetch refused: news API key missing");
            self.articles.clear();
            self.selected_article = None;
            self.feed_loading = false;
            self.feed_error = Some(MISSING_KEY_NOTICE.to_string());
            return None;
        };

        self.latest_fetch_seq += 1;
        self.query = query;
        self.feed_loading = true;
        Some((self.latest_fetch_seq, news))
    }

    pub fn track_fetch(&mut self, seq: u64, task: JoinHandle<Result<Vec<Article>>>) {
        self.fetch_tasks.push((seq, task));
    }

    /// Hand back every fetch task that has finished, for the event loop to
    /// await and feed into `apply_fetch`.
    pub fn take_finished_fetches(&mut self) -> Vec<(u64, JoinHandle<Result<Vec<Article>>>)> {
        let mut finished = Vec::new();
        let mut i = 0;
        while i < self.fetch_tasks.len() {
            if self.fetch_tasks[i].1.is_finished() {
                finished.push(self.fetch_tasks.remove(i));
            } else {
                i += 1;
            }
        }
        finished
    }

    /// Publish a completed fetch into the feed. Results from superseded
    /// requests are dropped on the floor.
    pub fn apply_fetch(&mut self, seq: u64, result: Result<Vec<Article>>) {
        if seq != self.latest_fetch_seq {
            debug!(seq, latest = self.latest_fetch_seq, "discarding stale fetch response");
            return;
        }

        self.feed_loading = false;
        match result {
            Ok(articles) => {
                debug!(count = articles.len(), query = %self.query, "feed updated");
                self.feed_error = None;
                self.selected_article = if articles.is_empty() { None } else { Some(0) };
                self.articles = articles;
                self.feed_scroll = 0;
            }
            Err(e) => {
                error!("fetch failed for query {:?}: {e:#}", self.query);
                self.articles.clear();
                self.selected_article = None;
                self.feed_scroll = 0;
                self.feed_error = Some(FEED_ERROR_NOTICE.to_string());
            }
        }
    }

    pub fn current_article(&self) -> Option<&Article> {
        self.selected_article.and_then(|i| self.articles.get(i))
    }

    // Feed navigation
    pub fn select_next_article(&mut self) {
        let len = self.articles.len();
        if len > 0 {
            let i = self.selected_article.unwrap_or(0);
            self.selected_article = Some((i + 1).min(len - 1));
            self.scroll_to_selected_article();
        }
    }

    pub fn select_prev_article(&mut self) {
        if let Some(i) = self.selected_article {
            self.selected_article = Some(i.saturating_sub(1));
            self.scroll_to_selected_article();
        } else if !self.articles.is_empty() {
            self.selected_article = Some(0);
        }
    }

    pub fn select_first_article(&mut self) {
        if !self.articles.is_empty() {
            self.selected_article = Some(0);
            self.feed_scroll = 0;
        }
    }

    pub fn select_last_article(&mut self) {
        if !self.articles.is_empty() {
            self.selected_article = Some(self.articles.len() - 1);
            self.feed_scroll = self.total_feed_lines.saturating_sub(self.feed_height);
        }
    }

    // Raw feed scrolling (mouse wheel)
    pub fn scroll_feed_down(&mut self) {
        if self.feed_scroll < self.total_feed_lines.saturating_sub(self.feed_height) {
            self.feed_scroll = self.feed_scroll.saturating_add(1);
        }
    }

    pub fn scroll_feed_up(&mut self) {
        self.feed_scroll = self.feed_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.feed_height / 2;
        let max_scroll = self.total_feed_lines.saturating_sub(self.feed_height);
        self.feed_scroll = (self.feed_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.feed_height / 2;
        self.feed_scroll = self.feed_scroll.saturating_sub(half_page);
    }

    pub fn feed_title(&self) -> String {
        if self.query.is_empty() {
            "Top Headlines".to_string()
        } else {
            format!("Results for \"{}\"", self.query)
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        self.chat.tick_animation();
    }

    fn scroll_to_selected_article(&mut self) {
        if let Some(idx) = self.selected_article {
            let wrap_width = if self.feed_width > 0 {
                self.feed_width as usize
            } else {
                60
            };
            let mut card_start_line = 0u16;

            for (i, article) in self.articles.iter().enumerate() {
                let card_lines = card_line_count(article, wrap_width);
                let card_end_line = card_start_line + card_lines;

                if i == idx {
                    if card_start_line < self.feed_scroll {
                        self.feed_scroll = card_start_line;
                    } else if card_end_line > self.feed_scroll + self.feed_height {
                        self.feed_scroll = card_end_line.saturating_sub(self.feed_height);
                    }
                    break;
                }

                card_start_line = card_end_line;
            }
        }
    }
}

/// Estimated rendered height of one article card: title and description wrap,
/// the meta, image, link, and trailing blank lines do not.
pub fn card_line_count(article: &Article, wrap_width: usize) -> u16 {
    let wrap_width = wrap_width.max(1);
    let wrapped = |s: &str| ((s.chars().count() / wrap_width) + 1) as u16;
    wrapped(&article.title) + 1 + wrapped(&article.description) + 1 + 1 + 1
}
