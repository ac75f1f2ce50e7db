use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Enter,
    Space,
    /// Ctrl+K or Cmd+K.
    FocusSearch,
}

impl Key {
    pub fn parse(name: &str) -> Option<Key> {
        match name.trim().to_ascii_lowercase().as_str() {
            "up" | "arrowup" => Some(Key::Up),
            "down" | "arrowdown" => Some(Key::Down),
            "left" | "arrowleft" => Some(Key::Left),
            "right" | "arrowright" => Some(Key::Right),
            "home" => Some(Key::Home),
            "end" => Some(Key::End),
            "enter" => Some(Key::Enter),
            "space" => Some(Key::Space),
            "ctrl-k" | "cmd-k" | "meta-k" => Some(Key::FocusSearch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    None,
    Search,
    Card(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEffect {
    Moved(Focus),
    Activate(usize),
    Ignored,
}

/// Apply `key` to the current focus over `cards` cards. Arrow keys wrap at
/// both ends; Enter and Space on a card activate it.
pub fn handle_key(focus: Focus, key: Key, cards: usize) -> NavEffect {
    if key == Key::FocusSearch {
        return NavEffect::Moved(Focus::Search);
    }
    let Focus::Card(current) = focus else {
        return NavEffect::Ignored;
    };
    if cards == 0 {
        return NavEffect::Ignored;
    }
    let current = current.min(cards - 1);

    let next = match key {
        Key::Down | Key::Right => (current + 1) % cards,
        Key::Up | Key::Left => {
            if current == 0 {
                cards - 1
            } else {
                current - 1
            }
        }
        Key::Home => 0,
        Key::End => cards - 1,
        Key::Enter | Key::Space => return NavEffect::Activate(current),
        Key::FocusSearch => return NavEffect::Moved(Focus::Search),
    };

    if next == current {
        NavEffect::Ignored
    } else {
        NavEffect::Moved(Focus::Card(next))
    }
}

/// Holds the latest value until the input has been quiet for `window`.
pub struct Debounce<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(window: Duration) -> Self {
        Debounce { window, pending: None }
    }

    /// Replace any pending value and restart the quiet period.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.window));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// The pending value once its quiet period has elapsed.
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|at| at <= now) {
            self.cancel()
        } else {
            None
        }
    }

    /// Drop the pending value, e.g. when a submit supersedes it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_wrap_at_both_ends() {
        assert_eq!(handle_key(Focus::Card(2), Key::Down, 3), NavEffect::Moved(Focus::Card(0)));
        assert_eq!(handle_key(Focus::Card(0), Key::Up, 3), NavEffect::Moved(Focus::Card(2)));
        assert_eq!(handle_key(Focus::Card(0), Key::Left, 3), NavEffect::Moved(Focus::Card(2)));
        assert_eq!(handle_key(Focus::Card(1), Key::Right, 3), NavEffect::Moved(Focus::Card(2)));
    }

    #[test]
    fn home_end_and_activation() {
        assert_eq!(handle_key(Focus::Card(1), Key::Home, 5), NavEffect::Moved(Focus::Card(0)));
        assert_eq!(handle_key(Focus::Card(1), Key::End, 5), NavEffect::Moved(Focus::Card(4)));
        assert_eq!(handle_key(Focus::Card(0), Key::Home, 5), NavEffect::Ignored);
        assert_eq!(handle_key(Focus::Card(3), Key::Enter, 5), NavEffect::Activate(3));
        assert_eq!(handle_key(Focus::Card(3), Key::Space, 5), NavEffect::Activate(3));
    }

    #[test]
    fn shortcut_focuses_search_from_anywhere() {
        for focus in [Focus::None, Focus::Search, Focus::Card(4)] {
            assert_eq!(handle_key(focus, Key::FocusSearch, 0), NavEffect::Moved(Focus::Search));
        }
    }

    #[test]
    fn card_keys_ignored_off_card_or_empty() {
        assert_eq!(handle_key(Focus::Search, Key::Down, 3), NavEffect::Ignored);
        assert_eq!(handle_key(Focus::Card(0), Key::Down, 0), NavEffect::Ignored);
        assert_eq!(handle_key(Focus::Card(0), Key::Down, 1), NavEffect::Ignored);
    }

    #[test]
    fn stale_focus_is_clamped() {
        assert_eq!(handle_key(Focus::Card(9), Key::Up, 3), NavEffect::Moved(Focus::Card(1)));
    }

    #[test]
    fn key_names() {
        assert_eq!(Key::parse("ArrowDown"), Some(Key::Down));
        assert_eq!(Key::parse("ctrl-k"), Some(Key::FocusSearch));
        assert_eq!(Key::parse("tab"), None);
    }

    #[test]
    fn debounce_keeps_latest_after_quiet_period() {
        let mut d = Debounce::new(Duration::from_millis(300));
        let t0 = Instant::now();
        d.push("l", t0);
        d.push("le", t0 + Duration::from_millis(100));
        assert_eq!(d.take_ready(t0 + Duration::from_millis(350)), None);
        assert_eq!(d.deadline(), Some(t0 + Duration::from_millis(400)));
        assert_eq!(d.take_ready(t0 + Duration::from_millis(400)), Some("le"));
        assert_eq!(d.take_ready(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn debounce_cancel() {
        let mut d = Debounce::new(Duration::from_millis(300));
        d.push(1, Instant::now());
        assert_eq!(d.cancel(), Some(1));
        assert!(d.deadline().is_none());
    }
}
