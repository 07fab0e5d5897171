use crate::components::Toggle;
use crate::save::{SaveAdapter, SaveError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleState {
    pub is_on: bool,
}

/// Saves a toggle's on/off value
///
/// Restore always fires the toggle's change listeners, even when the value
/// is unchanged: puzzle logic reacts to the event, not the field.
pub struct ToggleAdapter {
    toggle: Weak<RefCell<Toggle>>,
}

impl ToggleAdapter {
    pub fn new(toggle: &Rc<RefCell<Toggle>>) -> Self {
        ToggleAdapter {
            toggle: Rc::downgrade(toggle),
        }
    }
}

impl SaveAdapter for ToggleAdapter {
    type State = ToggleState;
    const TYPE_TAG: &'static str = "puzzle_save::adapters::ToggleAdapter";

    fn capture_state(&self) -> Option<ToggleState> {
        let toggle = self.toggle.upgrade()?;
        let is_on = toggle.borrow().is_on();
        Some(ToggleState { is_on })
    }

    fn restore_state(&mut self, state: ToggleState) -> Result<(), SaveError> {
        if let Some(toggle) = self.toggle.upgrade() {
            toggle.borrow_mut().set_without_notify(state.is_on);
            Toggle::notify_shared(&toggle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_restore_refires_change_event() {
        let toggle = Rc::new(RefCell::new(Toggle::new(true)));
        let last = Rc::new(Cell::new(None));
        let seen = last.clone();
        toggle.borrow_mut().on_value_changed(move |v| seen.set(Some(v)));
        let mut adapter = ToggleAdapter::new(&toggle);

        // Same value as live: the listener must still hear about it
        adapter.restore_state(ToggleState { is_on: true }).unwrap();

        assert_eq!(last.get(), Some(true));
    }

    #[test]
    fn test_listener_reading_toggle_sees_restored_value() {
        let toggle = Rc::new(RefCell::new(Toggle::new(false)));
        let last = Rc::new(Cell::new(None));
        let weak = Rc::downgrade(&toggle);
        let seen = last.clone();
        toggle.borrow_mut().on_value_changed(move |_| {
            let toggle = weak.upgrade().unwrap();
            seen.set(Some(toggle.borrow().is_on()));
        });
        let mut adapter = ToggleAdapter::new(&toggle);

        adapter.restore_state(ToggleState { is_on: true }).unwrap();

        assert_eq!(last.get(), Some(true));
    }

    #[test]
    fn test_restore_after_drop_is_noop() {
        let toggle = Rc::new(RefCell::new(Toggle::new(false)));
        let mut adapter = ToggleAdapter::new(&toggle);
        drop(toggle);

        assert!(adapter.restore_state(ToggleState { is_on: true }).is_ok());
        assert_eq!(adapter.capture_state(), None);
    }
}
