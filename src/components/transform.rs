use crate::math::{Quat, Vec3};
use std::cell::RefCell;
use std::rc::Rc;

/// Position, rotation and scale of an object, optionally relative to a parent
///
/// Local values are stored; world values are derived through the parent
/// chain. Only the immediate parent's scale is applied to the local position.
#[derive(Debug, Clone)]
pub struct Transform {
    pub local_position: Vec3,
    pub local_rotation: Quat,
    pub local_scale: Vec3,
    parent: Option<Rc<RefCell<Transform>>>,
}

impl Transform {
    pub fn new(position: Vec3) -> Self {
        Transform {
            local_position: position,
            local_rotation: Quat::IDENTITY,
            local_scale: Vec3::ONE,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: Rc<RefCell<Transform>>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// World-space position
    pub fn position(&self) -> Vec3 {
        match &self.parent {
            None => self.local_position,
            Some(parent) => {
                let parent = parent.borrow();
                parent.position()
                    + parent
                        .rotation()
                        .rotate(self.local_position.scale(parent.local_scale))
            }
        }
    }

    /// World-space rotation
    pub fn rotation(&self) -> Quat {
        match &self.parent {
            None => self.local_rotation,
            Some(parent) => parent.borrow().rotation() * self.local_rotation,
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.local_position = match &self.parent {
            None => position,
            Some(parent) => {
                let parent = parent.borrow();
                parent
                    .rotation()
                    .conjugate()
                    .rotate(position - parent.position())
                    .unscale(parent.local_scale)
            }
        };
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.local_rotation = match &self.parent {
            None => rotation,
            Some(parent) => parent.borrow().rotation().conjugate() * rotation,
        };
    }

    pub fn set_position_and_rotation(&mut self, position: Vec3, rotation: Quat) {
        self.set_position(position);
        self.set_rotation(rotation);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Physics body state relevant to teleporting
#[derive(Debug, Clone, Default)]
pub struct Rigidbody {
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub is_kinematic: bool,
}

/// Capsule movement controller
///
/// While enabled it owns collision response for the object, so poses must only
/// be written while it is disabled.
#[derive(Debug, Clone)]
pub struct CharacterController {
    pub radius: f32,
    pub height: f32,
    enabled: bool,
    toggles: u32,
}

impl CharacterController {
    pub fn new(radius: f32, height: f32) -> Self {
        CharacterController {
            radius,
            height,
            enabled: true,
            toggles: 0,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.toggles += 1;
        }
        self.enabled = enabled;
    }

    /// Number of enable/disable transitions so far
    pub fn toggle_count(&self) -> u32 {
        self.toggles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_position_through_parent() {
        let parent = Rc::new(RefCell::new(Transform::new(Vec3::new(10.0, 0.0, 0.0))));
        let child = Transform::new(Vec3::new(1.0, 0.0, 0.0)).with_parent(parent.clone());

        assert_eq!(child.position(), Vec3::new(11.0, 0.0, 0.0));
    }

    #[test]
    fn test_set_world_position_under_rotated_parent() {
        let parent = Rc::new(RefCell::new(Transform::new(Vec3::new(5.0, 0.0, 5.0))));
        parent.borrow_mut().local_rotation = Quat::from_yaw(90.0);
        let mut child = Transform::default().with_parent(parent.clone());

        child.set_position(Vec3::new(1.0, 2.0, 3.0));

        assert!(child.position().distance(Vec3::new(1.0, 2.0, 3.0)) < 1e-4);
    }

    #[test]
    fn test_controller_counts_transitions() {
        let mut cc = CharacterController::new(0.5, 2.0);
        cc.set_enabled(true);
        cc.set_enabled(false);
        cc.set_enabled(true);
        assert_eq!(cc.toggle_count(), 2);
    }
}
