use super::ensure_finite;
use crate::components::DrawerPullout;
use crate::math::Vec3;
use crate::save::{SaveAdapter, SaveError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawerState {
    pub pullout_amount: f32,
    pub pulling_out: bool,
    pub target_pull: f32,
    pub target_range: f32,
    pub position: Vec3,
}

/// Saves how far a drawer is pulled out, and where its body sits
pub struct DrawerAdapter {
    drawer: Weak<RefCell<DrawerPullout>>,
}

impl DrawerAdapter {
    pub fn new(drawer: &Rc<RefCell<DrawerPullout>>) -> Self {
        DrawerAdapter {
            drawer: Rc::downgrade(drawer),
        }
    }
}

impl SaveAdapter for DrawerAdapter {
    type State = DrawerState;
    const TYPE_TAG: &'static str = "puzzle_save::adapters::DrawerAdapter";

    fn capture_state(&self) -> Option<DrawerState> {
        let drawer = self.drawer.upgrade()?;
        let d = drawer.borrow();
        let position = d.transform().borrow().position();

        Some(DrawerState {
            pullout_amount: d.pullout_amount,
            pulling_out: d.pulling_out,
            target_pull: d.target_pull,
            target_range: d.target_range,
            position,
        })
    }

    fn restore_state(&mut self, state: DrawerState) -> Result<(), SaveError> {
        ensure_finite(
            Self::TYPE_TAG,
            "pulloutAmount",
            &[state.pullout_amount, state.target_pull, state.target_range],
        )?;

        let Some(drawer) = self.drawer.upgrade() else {
            return Ok(());
        };
        let mut d = drawer.borrow_mut();
        d.pullout_amount = state.pullout_amount;
        d.pulling_out = state.pulling_out;
        d.target_pull = state.target_pull;
        d.target_range = state.target_range;
        d.transform().borrow_mut().set_position(state.position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;

    #[test]
    fn test_drawer_restores_pull_and_position() {
        let transform = Rc::new(RefCell::new(Transform::new(Vec3::new(0.0, 1.0, 0.0))));
        let drawer = Rc::new(RefCell::new(DrawerPullout::new(transform.clone())));
        drawer.borrow_mut().pull(0.6);
        let mut adapter = DrawerAdapter::new(&drawer);
        let saved = adapter.capture_state().unwrap();

        drawer.borrow_mut().pull(-1.0);
        assert!(!drawer.borrow().is_open());

        adapter.restore_state(saved).unwrap();
        assert!(drawer.borrow().is_open());
        assert_eq!(transform.borrow().position(), saved.position);
    }
}
