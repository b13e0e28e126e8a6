//! Key mapping for iaseek
//!
//! Binds the key strings of the `[keys]` config table to actions. There are three maps, one
//! per input context: the browse views (Results and ItemFiles), the file action view and a
//! running download.

use crate::app::router::FileActionKey;
use crate::core::download::Keystroke;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Represents any action of a view: browsing, a file action or a system action.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Action {
    Browse(BrowseAction),
    File(FileActionKey),
    System(SystemAction),
}

/// Actions of the Results and ItemFiles views.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BrowseAction {
    Next,
    Prev,
    Filter,
    Reset,
    Search,
    Back,
    Open,
    Copy,
    GoUp,
    GoDown,
    Select,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SystemAction {
    Quit,
    KeyBindHelp,
    CommandLine,
}

/// Which map a key is looked up in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyContext {
    Browse,
    File,
}

/// Key + modifiers as used in keybind/keymap
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

/// Stores the mapping from Key to action, which is built from the config
pub struct Keymap {
    browse: HashMap<Key, Action>,
    file: HashMap<Key, Action>,
    download: DownloadKeys,
}

/// Interrupt keys of a running download, handed to the terminal monitor.
#[derive(Debug, Clone, Default)]
pub struct DownloadKeys {
    map: HashMap<Key, Keystroke>,
}

impl DownloadKeys {
    pub fn lookup(&self, key: KeyEvent) -> Option<Keystroke> {
        lookup_in(&self.map, key)
    }
}

impl Keymap {
    /// Builds the keymap from the config
    #[rustfmt::skip]
    pub fn from_config(config: &crate::config::Config) -> Self {
        let mut browse = HashMap::new();
        let mut file = HashMap::new();
        let mut download = HashMap::new();
        let keys = config.keys();

        macro_rules! bind {
            ($map:ident, $keys:expr, $action:expr) => {
                bind($keys, $action, &mut $map);
            };
        }

        use BrowseAction as B;
        use FileActionKey as F;
        use SystemAction as S;

        // Browse views
        bind!(browse, keys.next(),          Action::Browse(B::Next));
        bind!(browse, keys.prev(),          Action::Browse(B::Prev));
        bind!(browse, keys.filter(),        Action::Browse(B::Filter));
        bind!(browse, keys.reset(),         Action::Browse(B::Reset));
        bind!(browse, keys.search(),        Action::Browse(B::Search));
        bind!(browse, keys.back(),          Action::Browse(B::Back));
        bind!(browse, keys.open(),          Action::Browse(B::Open));
        bind!(browse, keys.copy(),          Action::Browse(B::Copy));
        bind!(browse, keys.go_up(),         Action::Browse(B::GoUp));
        bind!(browse, keys.go_down(),       Action::Browse(B::GoDown));
        bind!(browse, keys.select(),        Action::Browse(B::Select));
        bind!(browse, keys.command(),       Action::System(S::CommandLine));
        bind!(browse, keys.keybind_help(),  Action::System(S::KeyBindHelp));
        bind!(browse, keys.quit(),          Action::System(S::Quit));

        // File action view
        bind!(file, keys.download(),        Action::File(F::Download));
        bind!(file, keys.hash(),            Action::File(F::Hash));
        bind!(file, keys.open(),            Action::File(F::Open));
        bind!(file, keys.copy(),            Action::File(F::Copy));
        bind!(file, keys.back(),            Action::File(F::Back));
        bind!(file, keys.quit(),            Action::File(F::Quit));
        bind!(file, keys.command(),         Action::System(S::CommandLine));
        bind!(file, keys.keybind_help(),    Action::System(S::KeyBindHelp));

        // Running download
        bind!(download, keys.cancel(),      Keystroke::Cancel);
        bind!(download, keys.quit(),        Keystroke::Quit);

        Keymap {
            browse,
            file,
            download: DownloadKeys { map: download },
        }
    }

    /// Looks up the action for a given key event
    pub fn lookup(&self, context: KeyContext, key: KeyEvent) -> Option<Action> {
        let map = match context {
            KeyContext::Browse => &self.browse,
            KeyContext::File => &self.file,
        };
        lookup_in(map, key)
    }

    #[inline]
    pub fn download_keys(&self) -> &DownloadKeys {
        &self.download
    }
}

fn lookup_in<V: Copy>(map: &HashMap<Key, V>, key: KeyEvent) -> Option<V> {
    let k = Key {
        code: key.code,
        modifiers: key.modifiers,
    };

    if let Some(action) = map.get(&k).copied() {
        return Some(action);
    }

    if matches!(key.code, KeyCode::Char(_)) && key.modifiers.contains(KeyModifiers::SHIFT) {
        let k2 = Key {
            code: key.code,
            modifiers: key.modifiers - KeyModifiers::SHIFT,
        };
        return map.get(&k2).copied();
    }
    None
}

pub fn parse_key(s: &str) -> Option<Key> {
    let mut modifiers = KeyModifiers::NONE;
    let mut code: Option<KeyCode> = None;

    let is_bracketed = s.starts_with('<') && s.ends_with('>');
    let mut input = s.trim_start_matches('<').trim_end_matches('>').to_string();

    if is_bracketed && input.contains('-') {
        let parts: Vec<&str> = input.split('-').collect();

        for &prefix in parts.iter().take(parts.len().saturating_sub(1)) {
            match prefix.to_lowercase().as_str() {
                "c" | "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "a" | "m" | "alt" => modifiers |= KeyModifiers::ALT,
                "s" | "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }
        input = parts.last()?.to_string();
    }

    // A lone separator is a key of its own.
    if input == "+" || input == "-" {
        return Some(Key {
            code: KeyCode::Char(input.chars().next()?),
            modifiers,
        });
    }

    let normalized = input.replace('-', "+");
    for part in normalized.split('+') {
        let p_low = part.to_lowercase();
        match p_low.as_str() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "alt" | "meta" => modifiers |= KeyModifiers::ALT,
            "shift" => modifiers |= KeyModifiers::SHIFT,

            "up" => code = Some(KeyCode::Up),
            "down" => code = Some(KeyCode::Down),
            "left" => code = Some(KeyCode::Left),
            "right" => code = Some(KeyCode::Right),
            "enter" => code = Some(KeyCode::Enter),
            "esc" => code = Some(KeyCode::Esc),
            "backspace" | "back" => code = Some(KeyCode::Backspace),
            "tab" => code = Some(KeyCode::Tab),
            "pageup" | "pgup" => code = Some(KeyCode::PageUp),
            "pagedown" | "pgdn" => code = Some(KeyCode::PageDown),
            "space" | "spc" => code = Some(KeyCode::Char(' ')),

            _ => {
                if part.chars().count() == 1 {
                    let mut c = part.chars().next()?;
                    if modifiers.contains(KeyModifiers::SHIFT) {
                        c = c.to_ascii_uppercase();
                    }
                    code = Some(KeyCode::Char(c));
                } else if p_low.starts_with('f')
                    && p_low.len() > 1
                    && p_low[1..].chars().all(|c| c.is_ascii_digit())
                {
                    let n = p_low[1..].parse().ok()?;
                    code = Some(KeyCode::F(n));
                } else if part.is_empty() {
                    continue;
                } else {
                    return None;
                }
            }
        }
    }

    Some(Key {
        code: code?,
        modifiers,
    })
}

fn bind<V: Copy>(key_list: &[String], action: V, map: &mut HashMap<Key, V>) {
    for k in key_list {
        match parse_key(k) {
            Some(key) => {
                map.insert(key, action);
            }
            None => tracing::warn!(key = %k, "ignoring unparsable key binding"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn parses_named_and_modified_keys() {
        assert_eq!(
            parse_key("Right"),
            Some(Key {
                code: KeyCode::Right,
                modifiers: KeyModifiers::NONE
            })
        );
        assert_eq!(
            parse_key("Ctrl+c"),
            Some(Key {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL
            })
        );
        assert_eq!(
            parse_key("<C-d>"),
            Some(Key {
                code: KeyCode::Char('d'),
                modifiers: KeyModifiers::CONTROL
            })
        );
        assert_eq!(parse_key(":").map(|k| k.code), Some(KeyCode::Char(':')));
        assert_eq!(parse_key("F5").map(|k| k.code), Some(KeyCode::F(5)));
        assert_eq!(parse_key("Hyper+x"), None);
    }

    #[test]
    fn default_bindings_differ_per_context() {
        let config = Config::default();
        let keymap = Keymap::from_config(&config);

        assert_eq!(
            keymap.lookup(KeyContext::Browse, press(KeyCode::Char('n'))),
            Some(Action::Browse(BrowseAction::Next))
        );
        assert_eq!(
            keymap.lookup(KeyContext::Browse, press(KeyCode::Char('d'))),
            None
        );
        assert_eq!(
            keymap.lookup(KeyContext::File, press(KeyCode::Char('d'))),
            Some(Action::File(FileActionKey::Download))
        );
        assert_eq!(
            keymap.lookup(KeyContext::File, press(KeyCode::Esc)),
            Some(Action::File(FileActionKey::Back))
        );
        assert_eq!(
            keymap.download_keys().lookup(press(KeyCode::Char('c'))),
            Some(Keystroke::Cancel)
        );
        assert_eq!(
            keymap.download_keys().lookup(press(KeyCode::Char('q'))),
            Some(Keystroke::Quit)
        );
        assert_eq!(keymap.download_keys().lookup(press(KeyCode::Char('x'))), None);

        for context in [KeyContext::Browse, KeyContext::File] {
            assert_eq!(
                keymap.lookup(context, press(KeyCode::Char('?'))),
                Some(Action::System(SystemAction::KeyBindHelp))
            );
        }
    }

    #[test]
    fn shifted_chars_fall_back_to_plain_binding() {
        let config = Config::default();
        let keymap = Keymap::from_config(&config);
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::SHIFT);
        assert_eq!(
            keymap.lookup(KeyContext::Browse, key),
            Some(Action::System(SystemAction::Quit))
        );
    }
}
