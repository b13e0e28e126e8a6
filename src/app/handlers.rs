//! Input action handler methods for iaseek.
//!
//! This module implements [AppState] methods that process key events for the browse views,
//! the file action view and the prompt input modes.

use crate::app::actions::{ActionMode, InputMode};
use crate::app::command::{Command, parse_index};
use crate::app::keymap::{Action, BrowseAction, KeyContext, SystemAction};
use crate::app::router::{ActionRouter, FileActionKey};
use crate::app::session::{NoticeLevel, View};
use crate::app::state::{AppState, KeypressResult};
use crate::ui::overlays::Overlay;

use crossterm::event::{KeyCode::*, KeyEvent, KeyModifiers};
use std::time::Instant;

/// Lines moved by PageUp/PageDown in the raw JSON view.
const RAW_PAGE: isize = 10;

/// AppState input and action handlers
impl<'a> AppState<'a> {
    // AppState core handlers

    /// Handles key events when in an input mode (filter, search, etc).
    ///
    /// Consumes keys related to input editing and mode confirmation/cancellation.
    pub(super) fn handle_input_mode(&mut self, key: KeyEvent) -> KeypressResult {
        let Some(mode) = self.actions.input_mode() else {
            return KeypressResult::Continue;
        };

        match key.code {
            Enter => self.confirm_input(mode),

            Esc => {
                if mode == InputMode::Filter {
                    let previous = self.actions.filter_before().map(str::to_string);
                    self.dispatch_local(Command::Filter(previous));
                }
                self.actions.exit_mode();
                KeypressResult::Consumed
            }

            Left => {
                self.actions.action_move_cursor_left();
                KeypressResult::Consumed
            }

            Right => {
                self.actions.action_move_cursor_right();
                KeypressResult::Consumed
            }

            Home => {
                self.actions.action_cursor_home();
                KeypressResult::Consumed
            }

            End => {
                self.actions.action_cursor_end();
                KeypressResult::Consumed
            }

            Backspace => {
                self.actions.action_backspace_at_cursor();
                if mode == InputMode::Filter {
                    self.apply_filter();
                }
                KeypressResult::Consumed
            }

            Delete => {
                self.actions.action_delete_at_cursor();
                if mode == InputMode::Filter {
                    self.apply_filter();
                }
                KeypressResult::Consumed
            }

            Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if mode == InputMode::Select && !c.is_ascii_digit() {
                    return KeypressResult::Consumed;
                }
                self.actions.action_insert_at_cursor(c);
                if mode == InputMode::Filter {
                    self.apply_filter();
                }
                KeypressResult::Consumed
            }

            _ => KeypressResult::Consumed,
        }
    }

    /// Enter in a prompt: turns the buffer into a command.
    fn confirm_input(&mut self, mode: InputMode) -> KeypressResult {
        let input = self.actions.take_input();
        match mode {
            // Already applied while typing.
            InputMode::Filter => KeypressResult::Consumed,
            InputMode::Search => KeypressResult::Command(Command::Search(input)),
            InputMode::Select => match parse_index(&input) {
                Ok(k) => KeypressResult::Command(Command::Select(k)),
                Err(e) => {
                    self.push_overlay_message(e.to_string(), NoticeLevel::Warn);
                    KeypressResult::Consumed
                }
            },
            InputMode::CommandLine => match input.parse::<Command>() {
                Ok(cmd) => KeypressResult::Command(cmd),
                Err(e) => {
                    self.push_overlay_message(e.to_string(), NoticeLevel::Warn);
                    KeypressResult::Consumed
                }
            },
        }
    }

    pub(super) fn key_context(&self) -> KeyContext {
        match self.session.view() {
            View::FileAction(..) => KeyContext::File,
            View::Results | View::ItemFiles(_) => KeyContext::Browse,
        }
    }

    pub(super) fn handle_action(&mut self, action: Action) -> KeypressResult {
        match action {
            Action::Browse(act) => self.handle_browse_action(act),
            Action::File(act) => self.handle_file_action(act),
            Action::System(act) => self.handle_sys_action(act),
        }
    }

    /// Handles the Results and ItemFiles keys.
    fn handle_browse_action(&mut self, action: BrowseAction) -> KeypressResult {
        let in_results = matches!(self.session.view(), View::Results);
        match action {
            BrowseAction::GoUp => {
                self.cursor = self.cursor.saturating_sub(1);
                KeypressResult::Consumed
            }
            BrowseAction::GoDown => {
                if self.cursor + 1 < self.window_len() {
                    self.cursor += 1;
                }
                KeypressResult::Consumed
            }
            BrowseAction::Select => {
                if self.window_len() == 0 {
                    return KeypressResult::Consumed;
                }
                KeypressResult::Command(Command::Select(self.cursor + 1))
            }
            BrowseAction::Filter => {
                let current = self.session.active_filter().map(str::to_string);
                self.actions.enter_filter(current.as_deref());
                KeypressResult::Consumed
            }
            BrowseAction::Search if in_results => {
                let current = self.session.query().query().to_string();
                self.enter_input_mode(InputMode::Search, Some(&current));
                KeypressResult::Consumed
            }
            BrowseAction::Search => KeypressResult::Command(Command::Search(String::new())),
            BrowseAction::Next => KeypressResult::Command(Command::Next),
            BrowseAction::Prev => KeypressResult::Command(Command::Prev),
            BrowseAction::Reset => KeypressResult::Command(Command::Reset),
            BrowseAction::Back => KeypressResult::Command(Command::Back),
            BrowseAction::Open => KeypressResult::Command(Command::Open),
            BrowseAction::Copy => KeypressResult::Command(Command::Copy),
        }
    }

    fn handle_file_action(&mut self, action: FileActionKey) -> KeypressResult {
        let cmd = match action {
            FileActionKey::Download => Command::Download,
            FileActionKey::Hash => Command::Hash,
            FileActionKey::Open => Command::Open,
            FileActionKey::Copy => Command::Copy,
            FileActionKey::Back => Command::Back,
            FileActionKey::Quit => Command::Quit,
        };
        KeypressResult::Command(cmd)
    }

    fn handle_sys_action(&mut self, action: SystemAction) -> KeypressResult {
        match action {
            SystemAction::Quit => KeypressResult::Quit,
            SystemAction::KeyBindHelp => {
                self.toggle_keybind_help();
                KeypressResult::Consumed
            }
            SystemAction::CommandLine => {
                self.enter_input_mode(InputMode::CommandLine, None);
                KeypressResult::Consumed
            }
        }
    }

    /// Digits in a browse view start the selection prompt.
    pub(super) fn handle_digit_select(&mut self, key: &KeyEvent) -> Option<KeypressResult> {
        let Char(c) = key.code else {
            return None;
        };
        if !c.is_ascii_digit() || self.key_context() != KeyContext::Browse {
            return None;
        }
        self.enter_input_mode(InputMode::Select, Some(&c.to_string()));
        Some(KeypressResult::Consumed)
    }

    /// Scrolls or closes the raw JSON view. While it is on top it swallows every key.
    pub(super) fn handle_raw_detail_keys(&mut self, key: &KeyEvent) -> Option<KeypressResult> {
        if !matches!(self.overlays.top(), Some(Overlay::RawDetail { .. })) {
            return None;
        }

        let action = self.keymap.lookup(KeyContext::Browse, *key);
        let delta = match (key.code, action) {
            (Esc | Enter | Backspace, _)
            | (_, Some(Action::Browse(BrowseAction::Back)))
            | (_, Some(Action::System(SystemAction::Quit))) => None,
            (PageUp, _) => Some(-RAW_PAGE),
            (PageDown, _) => Some(RAW_PAGE),
            (Home, _) => Some(isize::MIN),
            (End, _) => Some(isize::MAX),
            (_, Some(Action::Browse(BrowseAction::GoUp))) => Some(-1),
            (_, Some(Action::Browse(BrowseAction::GoDown))) => Some(1),
            _ => Some(0),
        };

        let Some(delta) = delta else {
            self.overlays.pop();
            return Some(KeypressResult::Consumed);
        };
        if let Some(Overlay::RawDetail { text, scroll, .. }) = self.overlays.top_mut() {
            let last = text.lines().count().saturating_sub(1);
            *scroll = scroll.saturating_add_signed(delta).min(last);
        }
        Some(KeypressResult::Consumed)
    }

    pub(super) fn handle_esc_close_overlays(&mut self, key: &KeyEvent) -> Option<KeypressResult> {
        if key.code != Esc {
            return None;
        }

        if self.overlays.contains(|o| matches!(o, Overlay::KeybindHelp)) {
            self.overlays.retain(|o| !matches!(o, Overlay::KeybindHelp));
            return Some(KeypressResult::Consumed);
        }

        None
    }

    /// Enters an input mode with its default prompt.
    pub(crate) fn enter_input_mode(&mut self, mode: InputMode, initial: Option<&str>) {
        let buffer = initial.unwrap_or_default().to_string();
        self.actions.enter_mode(
            ActionMode::Input {
                mode,
                prompt: mode.prompt().to_string(),
            },
            buffer,
        );
    }

    // Handlers

    /// Applies the filter prompt's buffer to the current list.
    fn apply_filter(&mut self) {
        let term = self.actions.input_buffer().to_string();
        self.dispatch_local(Command::Filter(Some(term)));
    }

    /// A plain character with no binding in the file action view is reported and ignored.
    pub(super) fn handle_unknown_file_key(&mut self, key: &KeyEvent) -> KeypressResult {
        match key.code {
            Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                let notice = ActionRouter::unknown_action(c);
                self.push_overlay_message(notice.text().to_string(), notice.level());
                KeypressResult::Consumed
            }
            _ => KeypressResult::Continue,
        }
    }

    fn toggle_keybind_help(&mut self) {
        if self.overlays.contains(|o| matches!(o, Overlay::KeybindHelp)) {
            self.overlays.retain(|o| !matches!(o, Overlay::KeybindHelp));
        } else {
            self.overlays.push(Overlay::KeybindHelp);
        }
    }

    /// Shows `text` as a timed message, replacing a message that is still on top.
    pub(crate) fn push_overlay_message(&mut self, text: String, level: NoticeLevel) {
        let duration = self.config.general().notice_duration();
        self.notification_time = Some(Instant::now() + duration);

        if matches!(self.overlays.top(), Some(Overlay::Message { .. })) {
            self.overlays.pop();
        }
        self.overlays.push(Overlay::Message { text, level });
    }
}
