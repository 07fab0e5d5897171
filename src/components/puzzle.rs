use super::transform::Transform;
use std::cell::RefCell;
use std::rc::Rc;

/// Value carried by a puzzle button (e.g. the digit it contributes to a code)
#[derive(Debug, Clone, Default)]
pub struct ButtonStats {
    pub button_value: i32,
}

impl ButtonStats {
    pub fn new(button_value: i32) -> Self {
        ButtonStats { button_value }
    }
}

/// Maximum travel of a drawer along its local Z axis
const MAX_PULLOUT: f32 = 0.8;

/// A drawer the player pulls out to reveal a clue
#[derive(Debug, Clone)]
pub struct DrawerPullout {
    pub pullout_amount: f32,
    pub pulling_out: bool,
    pub target_pull: f32,
    pub target_range: f32,
    transform: Rc<RefCell<Transform>>,
}

impl DrawerPullout {
    pub fn new(transform: Rc<RefCell<Transform>>) -> Self {
        DrawerPullout {
            pullout_amount: 0.0,
            pulling_out: false,
            target_pull: 0.5,
            target_range: 0.1,
            transform,
        }
    }

    pub fn transform(&self) -> &Rc<RefCell<Transform>> {
        &self.transform
    }

    /// True once the drawer is pulled at least to its target
    pub fn is_open(&self) -> bool {
        self.pullout_amount >= self.target_pull
    }

    /// Pulls by `amount`, clamped to `[0, 1]`, and moves the drawer body
    pub fn pull(&mut self, amount: f32) {
        let before = self.pullout_amount.clamp(0.0, MAX_PULLOUT);
        self.pullout_amount = (self.pullout_amount + amount).clamp(0.0, 1.0);
        let after = self.pullout_amount.clamp(0.0, MAX_PULLOUT);

        let mut transform = self.transform.borrow_mut();
        transform.local_position.z += after - before;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_pull_clamps_travel() {
        let transform = Rc::new(RefCell::new(Transform::new(Vec3::ZERO)));
        let mut drawer = DrawerPullout::new(transform.clone());

        drawer.pull(2.0);

        assert_eq!(drawer.pullout_amount, 1.0);
        assert!(drawer.is_open());
        assert!((transform.borrow().local_position.z - MAX_PULLOUT).abs() < 1e-6);
    }
}
