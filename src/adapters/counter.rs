use crate::components::ButtonStats;
use crate::save::{SaveAdapter, SaveError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterState {
    pub button_value: i32,
}

/// Saves a puzzle button's numeric value
pub struct CounterAdapter {
    stats: Weak<RefCell<ButtonStats>>,
}

impl CounterAdapter {
    pub fn new(stats: &Rc<RefCell<ButtonStats>>) -> Self {
        CounterAdapter {
            stats: Rc::downgrade(stats),
        }
    }
}

impl SaveAdapter for CounterAdapter {
    type State = CounterState;
    const TYPE_TAG: &'static str = "puzzle_save::adapters::CounterAdapter";

    fn capture_state(&self) -> Option<CounterState> {
        let stats = self.stats.upgrade()?;
        let button_value = stats.borrow().button_value;
        Some(CounterState { button_value })
    }

    fn restore_state(&mut self, state: CounterState) -> Result<(), SaveError> {
        if let Some(stats) = self.stats.upgrade() {
            stats.borrow_mut().button_value = state.button_value;
        }
        Ok(())
    }
}
