//! Keybinding definitions for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextView,
    PrevView,
    SwitchView(usize),
    NextDevice,
    PrevDevice,
    Refresh,
    EditSettings,
    PurgeDeviceCache,
    Confirm,
    Cancel,
}

/// Keys while the settings form is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Input(char),
    Backspace,
    NextField,
    PrevField,
    Submit,
    Cancel,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('e') => Some(Action::EditSettings),
        KeyCode::Char('p') => Some(Action::PurgeDeviceCache),
        KeyCode::Char(']') => Some(Action::NextDevice),
        KeyCode::Char('[') => Some(Action::PrevDevice),
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Tab => Some(Action::NextView),
        KeyCode::BackTab => Some(Action::PrevView),
        KeyCode::Char(c) if c.is_ascii_digit() => {
            let idx = match c {
                '1' => 0,
                '2' => 1,
                '3' => 2,
                '4' => 3,
                _ => return None,
            };
            Some(Action::SwitchView(idx))
        }
        _ => None,
    }
}

pub fn map_form_key(event: KeyEvent) -> Option<FormAction> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(FormAction::Cancel),
            _ => None,
        };
    }

    match code {
        KeyCode::Enter => Some(FormAction::Submit),
        KeyCode::Esc => Some(FormAction::Cancel),
        KeyCode::Backspace => Some(FormAction::Backspace),
        KeyCode::Tab | KeyCode::Down => Some(FormAction::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(FormAction::PrevField),
        KeyCode::Char(c) => Some(FormAction::Input(c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_refresh_bindings() {
        assert_eq!(map_key(key(KeyCode::Char('r'))), Some(Action::Refresh));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(Action::Refresh)
        );
    }

    #[test]
    fn test_digits_switch_views() {
        assert_eq!(map_key(key(KeyCode::Char('1'))), Some(Action::SwitchView(0)));
        assert_eq!(map_key(key(KeyCode::Char('4'))), Some(Action::SwitchView(3)));
        assert_eq!(map_key(key(KeyCode::Char('9'))), None);
    }

    #[test]
    fn test_form_keys_capture_text() {
        assert_eq!(
            map_form_key(key(KeyCode::Char('q'))),
            Some(FormAction::Input('q'))
        );
        assert_eq!(map_form_key(key(KeyCode::Enter)), Some(FormAction::Submit));
        assert_eq!(map_form_key(key(KeyCode::Esc)), Some(FormAction::Cancel));
    }
}
