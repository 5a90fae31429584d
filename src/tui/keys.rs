use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::navigation::Action;

/// Maps a key press to a navigation action.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    let action = match key.code {
        KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('u') if ctrl => Action::PageUp,
        KeyCode::Char('d') if ctrl => Action::PageDown,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc | KeyCode::Backspace => Action::Back,
        KeyCode::Enter => Action::Enter,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char(' ') => Action::ToggleAutoRefresh,
        KeyCode::Char('l') => Action::Follow,
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Home | KeyCode::Char('g') => Action::First,
        KeyCode::End | KeyCode::Char('G') => Action::Last,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(map_key(press(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(map_key(ctrl('c')), Some(Action::Quit));
        assert_eq!(map_key(press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_vim_and_arrow_keys_agree() {
        assert_eq!(map_key(press(KeyCode::Up)), map_key(press(KeyCode::Char('k'))));
        assert_eq!(map_key(press(KeyCode::Down)), map_key(press(KeyCode::Char('j'))));
        assert_eq!(map_key(press(KeyCode::PageUp)), map_key(ctrl('u')));
        assert_eq!(map_key(press(KeyCode::PageDown)), map_key(ctrl('d')));
        assert_eq!(map_key(press(KeyCode::Home)), Some(Action::First));
        assert_eq!(map_key(press(KeyCode::Char('G'))), Some(Action::Last));
    }

    #[test]
    fn test_view_keys() {
        assert_eq!(map_key(press(KeyCode::Enter)), Some(Action::Enter));
        assert_eq!(map_key(press(KeyCode::Esc)), Some(Action::Back));
        assert_eq!(map_key(press(KeyCode::Char('r'))), Some(Action::Refresh));
        assert_eq!(map_key(press(KeyCode::Char(' '))), Some(Action::ToggleAutoRefresh));
        assert_eq!(map_key(press(KeyCode::Char('l'))), Some(Action::Follow));
    }

    #[test]
    fn test_key_release_is_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(release), None);
    }
}
