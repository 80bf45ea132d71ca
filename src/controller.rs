use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, TVConfig, TVError};
use crate::filter::FilterField;
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// A finished fetch wins over input; otherwise waits up to the poll time
    /// for a key press.
    pub fn handle_event(&self, model: &mut Model) -> Result<Option<Message>, TVError> {
        if let Some(message) = model.poll_loader() {
            return Ok(Some(message));
        }
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            if model.raw_keyevents() {
                return Ok(Some(Message::RawKey(key)));
            }
            return Ok(self.handle_key(key));
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::PageDown, _) | (KeyCode::Char('n'), _) => Some(Message::NextPage),
            (KeyCode::PageUp, _) | (KeyCode::Char('p'), _) => Some(Message::PrevPage),
            (KeyCode::Home, _) | (KeyCode::Char('g'), _) => Some(Message::FirstPage),
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => Some(Message::LastPage),
            (KeyCode::Char('+'), _) => Some(Message::CyclePageSize),
            (KeyCode::Char('s'), _) => Some(Message::ToggleSort),
            (KeyCode::Char('/'), _) => Some(Message::EditFilter(FilterField::Global)),
            (KeyCode::Char('o'), _) => Some(Message::EditFilter(FilterField::Organization)),
            (KeyCode::Char('d'), _) => Some(Message::EditFilter(FilterField::Department)),
            (KeyCode::Char('c'), _) => Some(Message::EditFilter(FilterField::Contragent)),
            (KeyCode::Char('O'), _) => Some(Message::PickFacet(FilterField::Organization)),
            (KeyCode::Char('D'), _) => Some(Message::PickFacet(FilterField::Department)),
            (KeyCode::Char('C'), _) => Some(Message::PickFacet(FilterField::Contragent)),
            (KeyCode::Char('x'), _) => Some(Message::ClearFilters),
            (KeyCode::Char('y'), _) => Some(Message::CopyRow),
            (KeyCode::Char('Y'), _) => Some(Message::CopyCell),
            (KeyCode::Char('r'), _) => Some(Message::Reload),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn map(code: KeyCode, modifiers: KeyModifiers) -> Option<Message> {
        Controller::new(&TVConfig::default()).handle_key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn maps_filter_keys() {
        assert!(matches!(
            map(KeyCode::Char('/'), KeyModifiers::NONE),
            Some(Message::EditFilter(FilterField::Global))
        ));
        assert!(matches!(
            map(KeyCode::Char('C'), KeyModifiers::SHIFT),
            Some(Message::PickFacet(FilterField::Contragent))
        ));
        assert!(matches!(
            map(KeyCode::Char('c'), KeyModifiers::NONE),
            Some(Message::EditFilter(FilterField::Contragent))
        ));
    }

    #[test]
    fn control_c_quits() {
        assert!(matches!(
            map(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Message::Quit)
        ));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert!(map(KeyCode::Char('z'), KeyModifiers::NONE).is_none());
        assert!(map(KeyCode::F(5), KeyModifiers::NONE).is_none());
    }
}
