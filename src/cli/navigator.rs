//! Terminal navigation target

use std::sync::{Arc, Mutex};

use crate::application::ports::Navigator;

/// Remembers the note to open once the upload flow hands over
#[derive(Clone, Default)]
pub struct TerminalNavigator {
    target: Arc<Mutex<Option<String>>>,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the pending note, if navigation was requested
    pub fn take(&self) -> Option<String> {
        self.target.lock().ok().and_then(|mut t| t.take())
    }
}

impl Navigator for TerminalNavigator {
    fn open_note(&self, note_id: &str) {
        if let Ok(mut target) = self.target.lock() {
            *target = Some(note_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears_target() {
        let navigator = TerminalNavigator::new();
        navigator.open_note("n-1");
        assert_eq!(navigator.clone().take().as_deref(), Some("n-1"));
        assert_eq!(navigator.take(), None);
    }
}
