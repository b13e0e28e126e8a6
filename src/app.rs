//! Application layer for iaseek.
//!
//! - [session]: the Results / ItemFiles / FileAction state machine.
//! - [router]: per-file action dispatch.
//! - [command]: the command vocabulary every input ends up as.
//! - [keymap], [actions], [state], [handlers]: keypress to command translation for the TUI.

pub mod actions;
pub mod command;
mod handlers;
pub mod keymap;
pub mod router;
pub mod session;
pub mod state;

pub use command::{Command, CommandError};
pub use router::{ActionRouter, FileActionKey, RouterSettings};
pub use session::{Flow, Notice, NoticeLevel, RawDetail, Session, SessionSettings, View};
pub use state::{AppState, KeypressResult};
