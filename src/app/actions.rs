//! Action context and input mode logic for iaseek.
//!
//! Contains the [ActionContext] struct, tracking the prompt the user is typing into, the
//! input buffer and its cursor.

/// Describes the current mode for action handling/input.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionMode {
    Normal,
    Input { mode: InputMode, prompt: String },
}

/// Enumerates all the available input field modes
///
/// Variants:
/// * `Filter` - live substring filter of the current list.
/// * `Search` - new catalog query.
/// * `Select` - 1-based index into the current window, started by typing a digit.
/// * `CommandLine` - any command line, e.g. `f disc` or `3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Filter,
    Search,
    Select,
    CommandLine,
}

impl InputMode {
    /// Default prompt title for the mode.
    pub fn prompt(self) -> &'static str {
        match self {
            InputMode::Filter => "Filter",
            InputMode::Search => "Search archive.org",
            InputMode::Select => "Select #",
            InputMode::CommandLine => "Command",
        }
    }
}

/// Tracks the current prompt and input buffer state.
///
/// The filter prompt applies every edit immediately; `filter_before` keeps the filter that
/// was active when the prompt opened so cancelling can restore it.
#[derive(Debug, Clone)]
pub struct ActionContext {
    mode: ActionMode,
    input_buffer: String,
    input_cursor_pos: usize,
    filter_before: Option<String>,
}

impl ActionContext {
    // Getters / accessors

    pub fn mode(&self) -> &ActionMode {
        &self.mode
    }

    pub fn input_mode(&self) -> Option<InputMode> {
        match &self.mode {
            ActionMode::Input { mode, .. } => Some(*mode),
            ActionMode::Normal => None,
        }
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn input_cursor_pos(&self) -> usize {
        self.input_cursor_pos
    }

    pub fn filter_before(&self) -> Option<&str> {
        self.filter_before.as_deref()
    }

    // Mode functions

    pub fn is_input_mode(&self) -> bool {
        matches!(self.mode, ActionMode::Input { .. })
    }

    pub fn enter_mode(&mut self, mode: ActionMode, initial_value: String) {
        self.mode = mode;
        self.input_buffer = initial_value;
        self.input_cursor_pos = self.input_buffer.len();
    }

    /// Opens the filter prompt, remembering `current` for a cancel.
    pub fn enter_filter(&mut self, current: Option<&str>) {
        self.filter_before = current.map(str::to_string);
        self.enter_mode(
            ActionMode::Input {
                mode: InputMode::Filter,
                prompt: InputMode::Filter.prompt().to_string(),
            },
            current.unwrap_or_default().to_string(),
        );
    }

    pub fn exit_mode(&mut self) {
        self.mode = ActionMode::Normal;
        self.input_buffer.clear();
        self.input_cursor_pos = 0;
        self.filter_before = None;
    }

    /// Leaves input mode and hands back what was typed.
    pub fn take_input(&mut self) -> String {
        let input = std::mem::take(&mut self.input_buffer);
        self.exit_mode();
        input
    }

    // Cursor actions

    /// Moves the input cursor one character to the left, if possible.
    pub fn action_move_cursor_left(&mut self) {
        if let Some((previous, _)) = self.input_buffer[..self.input_cursor_pos]
            .char_indices()
            .next_back()
        {
            self.input_cursor_pos = previous;
        }
    }

    /// Moves the input cursor one character to the right, if possible.
    pub fn action_move_cursor_right(&mut self) {
        if let Some(ch) = self.input_buffer[self.input_cursor_pos..].chars().next() {
            self.input_cursor_pos += ch.len_utf8();
        }
    }

    pub fn action_insert_at_cursor(&mut self, ch: char) {
        self.input_buffer.insert(self.input_cursor_pos, ch);
        self.input_cursor_pos += ch.len_utf8();
    }

    /// Deletes the character before the cursor and moves the cursor back.
    pub fn action_backspace_at_cursor(&mut self) {
        if self.input_cursor_pos > 0
            && let Some((previous, _)) = self.input_buffer[..self.input_cursor_pos]
                .char_indices()
                .next_back()
        {
            self.input_buffer.remove(previous);
            self.input_cursor_pos = previous;
        }
    }

    pub fn action_delete_at_cursor(&mut self) {
        if self.input_cursor_pos < self.input_buffer.len() {
            self.input_buffer.remove(self.input_cursor_pos);
        }
    }

    pub fn action_cursor_home(&mut self) {
        self.input_cursor_pos = 0;
    }

    pub fn action_cursor_end(&mut self) {
        self.input_cursor_pos = self.input_buffer.len();
    }
}

impl Default for ActionContext {
    fn default() -> Self {
        Self {
            mode: ActionMode::Normal,
            input_buffer: String::new(),
            input_cursor_pos: 0,
            filter_before: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(ctx: &mut ActionContext, text: &str) {
        for c in text.chars() {
            ctx.action_insert_at_cursor(c);
        }
    }

    #[test]
    fn editing_respects_multibyte_characters() {
        let mut ctx = ActionContext::default();
        ctx.enter_mode(
            ActionMode::Input {
                mode: InputMode::Search,
                prompt: "Search".into(),
            },
            String::new(),
        );
        typed(&mut ctx, "héllo");
        ctx.action_move_cursor_left();
        ctx.action_move_cursor_left();
        ctx.action_move_cursor_left();
        ctx.action_backspace_at_cursor();
        assert_eq!(ctx.input_buffer(), "hllo");

        ctx.action_cursor_home();
        ctx.action_delete_at_cursor();
        assert_eq!(ctx.input_buffer(), "llo");

        ctx.action_cursor_end();
        ctx.action_move_cursor_right();
        assert_eq!(ctx.input_cursor_pos(), 3);
    }

    #[test]
    fn filter_prompt_remembers_previous_filter() {
        let mut ctx = ActionContext::default();
        ctx.enter_filter(Some("iso"));
        assert_eq!(ctx.input_mode(), Some(InputMode::Filter));
        assert_eq!(ctx.input_buffer(), "iso");
        assert_eq!(ctx.filter_before(), Some("iso"));

        typed(&mut ctx, " disc");
        assert_eq!(ctx.take_input(), "iso disc");
        assert!(!ctx.is_input_mode());
        assert_eq!(ctx.filter_before(), None);
    }
}
