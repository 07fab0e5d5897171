use super::ensure_finite;
use crate::components::{CharacterController, Rigidbody, Transform};
use crate::math::{Quat, Vec3};
use crate::save::{SaveAdapter, SaveError};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformState {
    pub position: Vec3,
    pub rotation: Quat,
    pub local_scale: Vec3,
}

/// Saves an object's pose
///
/// Restoring is teleport-safe: a character controller is disabled while the
/// pose is written, a rigidbody is made kinematic for the write and has its
/// velocities zeroed so it doesn't carry momentum it never built up.
pub struct TransformAdapter {
    transform: Weak<RefCell<Transform>>,
    rigidbody: Option<Weak<RefCell<Rigidbody>>>,
    controller: Option<Weak<RefCell<CharacterController>>>,
    /// Save local instead of world position/rotation
    pub use_local_space: bool,
    /// Hold the restore until the next tick so other components settle first
    pub apply_next_frame: bool,
    pub zero_velocity: bool,
    pub controller_safe_teleport: bool,
    pending: Option<TransformState>,
}

impl TransformAdapter {
    pub fn new(transform: &Rc<RefCell<Transform>>) -> Self {
        TransformAdapter {
            transform: Rc::downgrade(transform),
            rigidbody: None,
            controller: None,
            use_local_space: false,
            apply_next_frame: true,
            zero_velocity: true,
            controller_safe_teleport: true,
            pending: None,
        }
    }

    pub fn with_rigidbody(mut self, rigidbody: &Rc<RefCell<Rigidbody>>) -> Self {
        self.rigidbody = Some(Rc::downgrade(rigidbody));
        self
    }

    pub fn with_controller(mut self, controller: &Rc<RefCell<CharacterController>>) -> Self {
        self.controller = Some(Rc::downgrade(controller));
        self
    }

    pub fn local_space(mut self, use_local_space: bool) -> Self {
        self.use_local_space = use_local_space;
        self
    }

    pub fn immediate(mut self) -> Self {
        self.apply_next_frame = false;
        self
    }

    /// True while a deferred restore is waiting for the next tick
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn apply_now(&self, state: TransformState) {
        let Some(transform) = self.transform.upgrade() else {
            return;
        };

        let controller = self.controller.as_ref().and_then(Weak::upgrade);
        let mut controller_was_enabled = false;
        if self.controller_safe_teleport {
            if let Some(cc) = &controller {
                let mut cc = cc.borrow_mut();
                controller_was_enabled = cc.enabled();
                cc.set_enabled(false);
            }
        }

        let rigidbody = self.rigidbody.as_ref().and_then(Weak::upgrade);
        let was_kinematic = rigidbody.as_ref().map(|rb| {
            let mut rb = rb.borrow_mut();
            let was = rb.is_kinematic;
            rb.is_kinematic = true;
            was
        });

        {
            let mut t = transform.borrow_mut();
            if self.use_local_space {
                t.local_position = state.position;
                t.local_rotation = state.rotation;
            } else {
                t.set_position_and_rotation(state.position, state.rotation);
            }
            t.local_scale = state.local_scale;
        }

        if let (Some(rb), Some(was_kinematic)) = (&rigidbody, was_kinematic) {
            let mut rb = rb.borrow_mut();
            if self.zero_velocity {
                rb.linear_velocity = Vec3::ZERO;
                rb.angular_velocity = Vec3::ZERO;
            }
            rb.is_kinematic = was_kinematic;
        }

        if controller_was_enabled {
            if let Some(cc) = &controller {
                cc.borrow_mut().set_enabled(true);
            }
        }

        debug!(
            space = if self.use_local_space { "local" } else { "world" },
            position = ?state.position,
            "Restored transform"
        );
    }
}

impl SaveAdapter for TransformAdapter {
    type State = TransformState;
    const TYPE_TAG: &'static str = "puzzle_save::adapters::TransformAdapter";

    fn capture_state(&self) -> Option<TransformState> {
        let transform = self.transform.upgrade()?;
        let t = transform.borrow();

        Some(if self.use_local_space {
            TransformState {
                position: t.local_position,
                rotation: t.local_rotation,
                local_scale: t.local_scale,
            }
        } else {
            TransformState {
                position: t.position(),
                rotation: t.rotation(),
                local_scale: t.local_scale,
            }
        })
    }

    fn restore_state(&mut self, state: TransformState) -> Result<(), SaveError> {
        let p = state.position;
        let r = state.rotation;
        let s = state.local_scale;
        ensure_finite(Self::TYPE_TAG, "position", &[p.x, p.y, p.z])?;
        ensure_finite(Self::TYPE_TAG, "rotation", &[r.x, r.y, r.z, r.w])?;
        ensure_finite(Self::TYPE_TAG, "localScale", &[s.x, s.y, s.z])?;

        if self.apply_next_frame {
            // A second restore before the tick replaces the first
            self.pending = Some(state);
        } else {
            self.apply_now(state);
        }
        Ok(())
    }

    fn tick(&mut self) {
        if let Some(state) = self.pending.take() {
            self.apply_now(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(x: f32, y: f32, z: f32) -> TransformState {
        TransformState {
            position: Vec3::new(x, y, z),
            rotation: Quat::IDENTITY,
            local_scale: Vec3::ONE,
        }
    }

    #[test]
    fn test_capture_world_pose() {
        let transform = Rc::new(RefCell::new(Transform::new(Vec3::new(1.0, 2.0, 3.0))));
        let adapter = TransformAdapter::new(&transform);

        assert_eq!(adapter.capture_state(), Some(pose(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_capture_none_when_transform_dropped() {
        let transform = Rc::new(RefCell::new(Transform::default()));
        let adapter = TransformAdapter::new(&transform);
        drop(transform);

        assert_eq!(adapter.capture_state(), None);
    }

    #[test]
    fn test_deferred_restore_applies_on_tick() {
        let transform = Rc::new(RefCell::new(Transform::default()));
        let mut adapter = TransformAdapter::new(&transform);

        adapter.restore_state(pose(4.0, 0.0, 0.0)).unwrap();
        adapter.restore_state(pose(5.0, 0.0, 0.0)).unwrap();
        assert_eq!(transform.borrow().position(), Vec3::ZERO);
        assert!(adapter.has_pending());

        SaveAdapter::tick(&mut adapter);
        assert_eq!(transform.borrow().position(), Vec3::new(5.0, 0.0, 0.0));
        assert!(!adapter.has_pending());
    }

    #[test]
    fn test_teleport_zeroes_velocity_and_reenables_controller() {
        let transform = Rc::new(RefCell::new(Transform::default()));
        let rigidbody = Rc::new(RefCell::new(Rigidbody {
            linear_velocity: Vec3::new(3.0, 0.0, 0.0),
            angular_velocity: Vec3::new(0.0, 1.0, 0.0),
            is_kinematic: false,
        }));
        let controller = Rc::new(RefCell::new(CharacterController::new(0.4, 1.8)));
        let mut adapter = TransformAdapter::new(&transform)
            .with_rigidbody(&rigidbody)
            .with_controller(&controller)
            .immediate();

        adapter.restore_state(pose(7.0, 1.0, 7.0)).unwrap();

        assert_eq!(transform.borrow().position(), Vec3::new(7.0, 1.0, 7.0));
        let rb = rigidbody.borrow();
        assert_eq!(rb.linear_velocity, Vec3::ZERO);
        assert_eq!(rb.angular_velocity, Vec3::ZERO);
        assert!(!rb.is_kinematic);
        let cc = controller.borrow();
        assert!(cc.enabled());
        // Disabled for the write, then enabled again
        assert_eq!(cc.toggle_count(), 2);
    }

    #[test]
    fn test_disabled_controller_stays_disabled() {
        let transform = Rc::new(RefCell::new(Transform::default()));
        let controller = Rc::new(RefCell::new(CharacterController::new(0.4, 1.8)));
        controller.borrow_mut().set_enabled(false);
        let mut adapter = TransformAdapter::new(&transform)
            .with_controller(&controller)
            .immediate();

        adapter.restore_state(pose(1.0, 1.0, 1.0)).unwrap();

        assert!(!controller.borrow().enabled());
    }

    #[test]
    fn test_local_space_round_trip() {
        let parent = Rc::new(RefCell::new(Transform::new(Vec3::new(10.0, 0.0, 0.0))));
        let child = Rc::new(RefCell::new(
            Transform::new(Vec3::new(1.0, 0.0, 0.0)).with_parent(parent.clone()),
        ));
        let mut adapter = TransformAdapter::new(&child).local_space(true).immediate();

        let saved = adapter.capture_state().unwrap();
        assert_eq!(saved.position, Vec3::new(1.0, 0.0, 0.0));

        child.borrow_mut().local_position = Vec3::new(9.0, 9.0, 9.0);
        adapter.restore_state(saved).unwrap();
        assert_eq!(child.borrow().position(), Vec3::new(11.0, 0.0, 0.0));
    }

    #[test]
    fn test_rejects_non_finite_pose() {
        let transform = Rc::new(RefCell::new(Transform::default()));
        let mut adapter = TransformAdapter::new(&transform).immediate();

        let result = adapter.restore_state(pose(f32::NAN, 0.0, 0.0));

        assert!(matches!(result, Err(SaveError::AdapterApply { .. })));
        assert_eq!(transform.borrow().position(), Vec3::ZERO);
    }
}
