//! Input configuration options for iaseek
//!
//! Key bindings read from the `[keys]` table of iaseek.toml. Every binding is a list of key
//! strings such as `"n"`, `"Right"` or `"Ctrl+c"`, parsed by [crate::app::keymap].

use serde::Deserialize;

/// Key bindings of all views.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Keys {
    next: Vec<String>,
    prev: Vec<String>,
    filter: Vec<String>,
    reset: Vec<String>,
    search: Vec<String>,
    back: Vec<String>,
    open: Vec<String>,
    copy: Vec<String>,
    go_up: Vec<String>,
    go_down: Vec<String>,
    select: Vec<String>,
    command: Vec<String>,
    quit: Vec<String>,
    download: Vec<String>,
    hash: Vec<String>,
    cancel: Vec<String>,
    keybind_help: Vec<String>,
}

macro_rules! accessor {
    ($($name:ident),+ $(,)?) => {
        impl Keys {
            $(
                #[inline]
                pub fn $name(&self) -> &[String] {
                    &self.$name
                }
            )+
        }
    };
}

accessor!(
    next,
    prev,
    filter,
    reset,
    search,
    back,
    open,
    copy,
    go_up,
    go_down,
    select,
    command,
    quit,
    download,
    hash,
    cancel,
    keybind_help,
);

/// Default input configuration options
impl Default for Keys {
    fn default() -> Self {
        Keys {
            next: vec!["n".into(), "Right".into()],
            prev: vec!["p".into(), "Left".into()],
            filter: vec!["f".into()],
            reset: vec!["r".into()],
            search: vec!["s".into()],
            back: vec!["b".into(), "Backspace".into(), "Esc".into()],
            open: vec!["o".into()],
            copy: vec!["c".into()],
            go_up: vec!["k".into(), "Up".into()],
            go_down: vec!["j".into(), "Down".into()],
            select: vec!["Enter".into()],
            command: vec![":".into()],
            quit: vec!["q".into()],
            download: vec!["d".into()],
            hash: vec!["h".into()],
            cancel: vec!["c".into(), "Esc".into()],
            keybind_help: vec!["?".into()],
        }
    }
}
