//! Application State and main controller module for iaseek.
//!
//! This module defines the overall [AppState] struct, which holds all major application
//! information and passes it to relevant UI/Terminal functions
//! - Configuration (loaded from config files) and the keymap built from it
//! - The browse [Session] with its current view
//! - Action context for prompt input
//! - The highlighted row of the current window
//! - Notification and message handling
//!
//! Keypresses are translated here (see handlers.rs) into [Command]s. Commands that may start
//! a download are handed back to the terminal loop as [KeypressResult::Command] because only
//! the loop owns a terminal to show download progress on.

use crate::app::actions::ActionContext;
use crate::app::command::Command;
use crate::app::keymap::{KeyContext, Keymap};
use crate::app::session::{Flow, Notice, NoticeLevel, Session, View};
use crate::config::Config;
use crate::core::download::{DownloadMonitor, Keystroke};
use crate::ui::overlays::{Overlay, OverlayStack};

use crossterm::event::KeyEvent;
use std::time::Instant;

/// Enumeration for each individual keypress result processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeypressResult {
    Continue,
    Consumed,
    Quit,
    /// A command for the session, to be dispatched by the terminal loop.
    Command(Command),
}

/// Monitor for commands that never download.
pub(crate) struct Inert;

impl DownloadMonitor for Inert {
    fn poll_interrupt(&mut self) -> Option<Keystroke> {
        None
    }

    fn emit(&mut self, _line: &str) {}
}

/// Main struct which holds the central application state of iaseek.
pub struct AppState<'a> {
    pub(super) config: &'a Config,
    pub(super) keymap: Keymap,

    pub(super) session: Session,
    pub(super) actions: ActionContext,
    pub(super) cursor: usize,

    pub(super) notification_time: Option<Instant>,
    pub(super) overlays: OverlayStack,
    pub(super) redraw: bool,
}

impl<'a> AppState<'a> {
    pub fn new(config: &'a Config, session: Session) -> Self {
        let mut app = Self {
            config,
            keymap: Keymap::from_config(config),
            session,
            actions: ActionContext::default(),
            cursor: 0,
            notification_time: None,
            overlays: OverlayStack::new(),
            redraw: true,
        };
        app.collect_notices();
        app
    }

    // Getters/ accessors

    #[inline]
    pub fn config(&self) -> &Config {
        self.config
    }

    #[inline]
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn actions(&self) -> &ActionContext {
        &self.actions
    }

    /// 0-based highlighted row of the current window.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn notification_time(&self) -> Option<Instant> {
        self.notification_time
    }

    #[inline]
    pub fn overlays(&self) -> &OverlayStack {
        &self.overlays
    }

    /// Length of the window the cursor moves in. The file action view has none.
    pub fn window_len(&self) -> usize {
        match self.session.view() {
            View::Results => self.session.results_window().len(),
            View::ItemFiles(_) => self
                .session
                .files_window()
                .map(|w| w.len())
                .unwrap_or_default(),
            View::FileAction(..) => 0,
        }
    }

    // Redraw signal

    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Returns whether a redraw was requested since the last call, and clears the request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    /// Updates timed state. Returns true when the screen needs a redraw.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;

        if let Some(expiry) = self.notification_time
            && Instant::now() >= expiry
        {
            self.notification_time = None;
            self.overlays
                .retain(|o| !matches!(o, Overlay::Message { .. }));
            changed = true;
        }

        changed
    }

    /// Central key handler
    ///
    /// Coordinates the keymap and the handler module functions.
    pub fn handle_keypress(&mut self, key: KeyEvent) -> KeypressResult {
        self.request_redraw();

        if self.actions.is_input_mode() {
            return self.handle_input_mode(key);
        }

        if let Some(res) = self.handle_raw_detail_keys(&key) {
            return res;
        }

        if let Some(res) = self.handle_esc_close_overlays(&key) {
            return res;
        }

        if let Some(res) = self.handle_digit_select(&key) {
            return res;
        }

        let context = self.key_context();
        match self.keymap.lookup(context, key) {
            Some(action) => self.handle_action(action),
            None if context == KeyContext::File => self.handle_unknown_file_key(&key),
            None => KeypressResult::Continue,
        }
    }

    /// Runs one command against the session and collects what it reported.
    pub fn dispatch(&mut self, cmd: Command, monitor: &mut dyn DownloadMonitor) -> Flow {
        let before = self.position();
        let flow = self.session.dispatch(cmd, monitor);

        if self.position() != before {
            self.cursor = 0;
        }
        self.clamp_cursor();
        self.collect_notices();
        if let Some(raw) = self.session.take_raw_detail() {
            self.overlays
                .retain(|o| !matches!(o, Overlay::RawDetail { .. }));
            self.overlays.push(Overlay::RawDetail {
                title: raw.identifier,
                text: raw.text,
                scroll: 0,
            });
        }
        self.request_redraw();
        flow
    }

    /// Dispatches a command that cannot start a download.
    pub(super) fn dispatch_local(&mut self, cmd: Command) -> Flow {
        self.dispatch(cmd, &mut Inert)
    }

    /// Moves every queued session notice into one timed message overlay.
    fn collect_notices(&mut self) {
        let notices = self.session.take_notices();
        if notices.is_empty() {
            return;
        }
        let level = notices
            .iter()
            .map(Notice::level)
            .max()
            .unwrap_or(NoticeLevel::Info);
        let text = notices
            .iter()
            .map(Notice::text)
            .collect::<Vec<_>>()
            .join("\n");
        self.push_overlay_message(text, level);
    }

    /// Identifies the current view and page, to reset the highlight when either changes.
    fn position(&self) -> (&'static str, usize, Option<String>) {
        let page = match self.session.view() {
            View::Results => self.session.query().page(),
            View::ItemFiles(ctx) | View::FileAction(ctx, _) => ctx.files().current_page(),
        };
        (
            self.session.view().name(),
            page,
            self.session.active_filter().map(str::to_string),
        )
    }

    fn clamp_cursor(&mut self) {
        let len = self.window_len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }
}

// AppState tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::router::{ActionRouter, RouterSettings};
    use crate::app::session::SessionSettings;
    use crate::core::catalog::{CatalogClient, QuerySpec, SearchPage};
    use crate::core::download::{DownloadOrchestrator, DownloadSettings};
    use crate::core::error::CatalogError;
    use crate::core::launch::ProviderChain;
    use crate::core::lookup::{DigestLookup, LookupHit};
    use crate::core::model::{FileRecord, ItemDetail, ItemMeta, ResultRecord};
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::time::Duration;

    struct Catalog;

    impl CatalogClient for Catalog {
        fn search(&self, query: &QuerySpec) -> Result<SearchPage, CatalogError> {
            let records = (1..=3)
                .map(|i| ResultRecord::new(format!("item-{}-{}", query.page(), i)))
                .collect();
            Ok(SearchPage {
                records,
                total: Some(6),
            })
        }

        fn detail(&self, identifier: &str) -> Result<ItemDetail, CatalogError> {
            Ok(ItemDetail {
                meta: ItemMeta {
                    identifier: identifier.to_string(),
                    ..ItemMeta::default()
                },
                files: vec![
                    FileRecord::new("disc1.iso"),
                    FileRecord::new("disc2.iso"),
                    FileRecord::new("readme.txt"),
                ],
            })
        }

        fn raw_detail(&self, identifier: &str) -> Result<serde_json::Value, CatalogError> {
            let lines: Vec<String> = (0..40).map(|i| format!("line {}", i)).collect();
            Ok(serde_json::json!({ "metadata": { "identifier": identifier }, "notes": lines }))
        }
    }

    struct NoLookup;

    impl DigestLookup for NoLookup {
        fn lookup(&self, _digest: &str) -> Result<Option<LookupHit>, CatalogError> {
            Ok(None)
        }
    }

    fn session() -> Result<Session, CatalogError> {
        session_with(SessionSettings::default())
    }

    fn session_with(settings: SessionSettings) -> Result<Session, CatalogError> {
        let router = ActionRouter::new(
            Box::new(NoLookup),
            ProviderChain::new("clipboard", Vec::new()),
            ProviderChain::new("open", Vec::new()),
            DownloadOrchestrator::new(DownloadSettings::default()),
            RouterSettings {
                download_dir: std::env::temp_dir(),
                dry_run: true,
            },
        );
        Session::start(
            QuerySpec::new("doom").with_rows(3),
            Box::new(Catalog),
            router,
            settings,
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn run(app: &mut AppState, code: KeyCode) -> KeypressResult {
        match app.handle_keypress(press(code)) {
            KeypressResult::Command(cmd) => {
                app.dispatch(cmd, &mut Inert);
                KeypressResult::Consumed
            }
            other => other,
        }
    }

    #[test]
    fn handle_keypress_continue_if_no_action() -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::default();
        let mut app = AppState::new(&config, session()?);
        let result = app.handle_keypress(press(KeyCode::Null));
        assert_eq!(result, KeypressResult::Continue);
        Ok(())
    }

    #[test]
    fn cursor_moves_and_enter_opens_the_highlighted_item() -> Result<(), Box<dyn std::error::Error>>
    {
        let config = Config::default();
        let mut app = AppState::new(&config, session()?);

        run(&mut app, KeyCode::Down);
        run(&mut app, KeyCode::Down);
        run(&mut app, KeyCode::Down);
        assert_eq!(app.cursor(), 2);

        let result = app.handle_keypress(press(KeyCode::Enter));
        assert_eq!(result, KeypressResult::Command(Command::Select(3)));
        app.dispatch(Command::Select(3), &mut Inert);

        match app.session().view() {
            View::ItemFiles(ctx) => assert_eq!(ctx.meta().identifier, "item-1-3"),
            _ => panic!("expected the item files view"),
        }
        assert_eq!(app.cursor(), 0);
        Ok(())
    }

    #[test]
    fn digits_open_the_select_prompt() -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::default();
        let mut app = AppState::new(&config, session()?);

        assert_eq!(run(&mut app, KeyCode::Char('2')), KeypressResult::Consumed);
        assert!(app.actions().is_input_mode());
        assert_eq!(app.actions().input_buffer(), "2");

        let result = app.handle_keypress(press(KeyCode::Enter));
        assert_eq!(result, KeypressResult::Command(Command::Select(2)));
        assert!(!app.actions().is_input_mode());
        Ok(())
    }

    #[test]
    fn live_filter_applies_while_typing_and_esc_restores() -> Result<(), Box<dyn std::error::Error>>
    {
        let config = Config::default();
        let mut app = AppState::new(&config, session()?);
        app.dispatch(Command::Select(1), &mut Inert);

        run(&mut app, KeyCode::Char('f'));
        for c in "iso".chars() {
            run(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.session().active_filter(), Some("iso"));
        assert_eq!(app.window_len(), 2);

        run(&mut app, KeyCode::Esc);
        assert_eq!(app.session().active_filter(), None);
        assert_eq!(app.window_len(), 3);
        Ok(())
    }

    #[test]
    fn command_line_errors_become_messages() -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::default();
        let mut app = AppState::new(&config, session()?);

        run(&mut app, KeyCode::Char(':'));
        for c in "1,2".chars() {
            run(&mut app, KeyCode::Char(c));
        }
        assert_eq!(run(&mut app, KeyCode::Enter), KeypressResult::Consumed);
        assert!(
            app.overlays()
                .contains(|o| matches!(o, Overlay::Message { .. }))
        );
        Ok(())
    }

    #[test]
    fn tick_clears_expired_notification_message() -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::default();
        let mut app = AppState::new(&config, session()?);
        app.dispatch(Command::Open, &mut Inert);
        assert!(app.notification_time().is_some());

        app.notification_time = Some(Instant::now() - Duration::from_secs(1));
        assert!(app.tick());
        assert!(app.notification_time().is_none());
        assert!(app.overlays().is_empty());
        Ok(())
    }

    #[test]
    fn unbound_key_in_file_view_is_reported_and_ignored() -> Result<(), Box<dyn std::error::Error>>
    {
        let config = Config::default();
        let mut app = AppState::new(&config, session()?);
        app.dispatch(Command::Select(1), &mut Inert);
        app.dispatch(Command::Select(1), &mut Inert);
        assert!(matches!(app.session().view(), View::FileAction(..)));
        app.overlays.retain(|_| false);

        let result = app.handle_keypress(press(KeyCode::Char('z')));
        assert_eq!(result, KeypressResult::Consumed);
        assert!(matches!(app.session().view(), View::FileAction(..)));
        assert!(app.overlays().contains(|o| matches!(
            o,
            Overlay::Message { text, level: NoticeLevel::Warn } if text == "Unknown action 'z'"
        )));

        // Browsing keeps ignoring unbound keys silently.
        app.dispatch(Command::Back, &mut Inert);
        app.overlays.retain(|_| false);
        assert_eq!(
            app.handle_keypress(press(KeyCode::Char('z'))),
            KeypressResult::Continue
        );
        assert!(app.overlays().is_empty());
        Ok(())
    }

    #[test]
    fn raw_json_item_opens_a_scrollable_overlay() -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::default();
        let settings = SessionSettings {
            raw_json: true,
            ..SessionSettings::default()
        };
        let mut app = AppState::new(&config, session_with(settings)?);
        app.dispatch(Command::Select(2), &mut Inert);
        assert!(matches!(app.session().view(), View::Results));

        let (title, text) = match app.overlays().top() {
            Some(Overlay::RawDetail {
                title,
                text,
                scroll: 0,
            }) => (title.clone(), text.clone()),
            other => return Err(format!("expected raw detail, got {:?}", other).into()),
        };
        assert_eq!(title, "item-1-2");
        assert!(text.contains("\"identifier\": \"item-1-2\""));
        let last = text.lines().count() - 1;

        run(&mut app, KeyCode::Down);
        run(&mut app, KeyCode::Char('j'));
        assert!(matches!(
            app.overlays().top(),
            Some(Overlay::RawDetail { scroll: 2, .. })
        ));
        // The results cursor does not move underneath.
        assert_eq!(app.cursor(), 0);

        run(&mut app, KeyCode::End);
        assert!(matches!(
            app.overlays().top(),
            Some(Overlay::RawDetail { scroll, .. }) if *scroll == last
        ));
        run(&mut app, KeyCode::PageDown);
        assert!(matches!(
            app.overlays().top(),
            Some(Overlay::RawDetail { scroll, .. }) if *scroll == last
        ));
        run(&mut app, KeyCode::Home);
        run(&mut app, KeyCode::Up);
        assert!(matches!(
            app.overlays().top(),
            Some(Overlay::RawDetail { scroll: 0, .. })
        ));

        // 'q' closes the view instead of quitting.
        assert_eq!(
            app.handle_keypress(press(KeyCode::Char('q'))),
            KeypressResult::Consumed
        );
        assert!(app.overlays().is_empty());
        assert!(matches!(app.session().view(), View::Results));
        Ok(())
    }

    #[test]
    fn redraw_request_is_taken_once() -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::default();
        let mut app = AppState::new(&config, session()?);
        assert!(app.take_redraw());
        assert!(!app.take_redraw());
        app.request_redraw();
        assert!(app.take_redraw());
        Ok(())
    }
}
