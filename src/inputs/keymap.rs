//! Concrete key bindings for the viewer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::overlay::NavKey;

/// Navigation binding for `key`, if it has one
pub fn nav_key_for(key: &KeyEvent) -> Option<NavKey> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    // Leave Ctrl/Alt chords to the host
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }

    match key.code {
        KeyCode::Down | KeyCode::Right | KeyCode::Tab | KeyCode::Char('j') => Some(NavKey::Next),
        KeyCode::Up | KeyCode::Left | KeyCode::BackTab | KeyCode::Char('k') => {
            Some(NavKey::Previous)
        }
        KeyCode::Home | KeyCode::Char('g') => Some(NavKey::First),
        KeyCode::End | KeyCode::Char('G') => Some(NavKey::Last),
        KeyCode::Enter | KeyCode::Char(' ') => Some(NavKey::Activate),
        KeyCode::Esc => Some(NavKey::Clear),
        _ => None,
    }
}

/// Viewer commands outside region navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppKey {
    Quit,
    NextPage,
    PreviousPage,
    /// Copy a link to the active chunk into the status line
    ShareLink,
}

pub fn app_key_for(key: &KeyEvent) -> Option<AppKey> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppKey::Quit),
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => Some(AppKey::Quit),
        (KeyCode::PageDown, _) | (KeyCode::Char('n'), KeyModifiers::NONE) => {
            Some(AppKey::NextPage)
        }
        (KeyCode::PageUp, _) | (KeyCode::Char('p'), KeyModifiers::NONE) => {
            Some(AppKey::PreviousPage)
        }
        (KeyCode::Char('y'), KeyModifiers::NONE) => Some(AppKey::ShareLink),
        _ => None,
    }
}
