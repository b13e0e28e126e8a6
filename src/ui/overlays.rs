//! Overlay module to stack widgets and dialogs on top of the current view.
//!
//! Holds timed notice messages, the keybind help and the raw item JSON view. Used by the
//! ui modules and in handlers.rs.

use crate::app::NoticeLevel;
use std::slice;

#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    Message { text: String, level: NoticeLevel },
    KeybindHelp,
    /// Pretty-printed item payload; `scroll` is the first visible line.
    RawDetail {
        title: String,
        text: String,
        scroll: usize,
    },
}

#[derive(Debug, Default)]
pub struct OverlayStack {
    overlays: Vec<Overlay>,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self {
            overlays: Vec::new(),
        }
    }

    pub fn push(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    pub fn pop(&mut self) -> Option<Overlay> {
        self.overlays.pop()
    }

    pub fn top(&self) -> Option<&Overlay> {
        self.overlays.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Overlay> {
        self.overlays.last_mut()
    }

    pub fn iter(&self) -> slice::Iter<'_, Overlay> {
        self.overlays.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&Overlay) -> bool,
    {
        self.overlays.retain(f);
    }

    pub fn contains<F>(&self, f: F) -> bool
    where
        F: FnMut(&Overlay) -> bool,
    {
        self.overlays.iter().any(f)
    }
}
