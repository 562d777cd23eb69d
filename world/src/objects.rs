//! Tracked game objects and their change detection.

use anchor_defence_core::{ObjectId, ObjectKind, Vec3};

use crate::ordinal;

/// Game object reported by the presentation layer.
#[derive(Clone, Debug)]
pub(crate) struct TrackedObject {
    pub(crate) id: ObjectId,
    pub(crate) kind: ObjectKind,
    pub(crate) position: Vec3,
    pub(crate) yaw: f32,
    observed: Option<Vec3>,
}

impl TrackedObject {
    fn changed(&self) -> bool {
        self.observed != Some(self.position)
    }
}

/// Registry of tracked objects in placement order.
#[derive(Debug, Default)]
pub(crate) struct ObjectTracker {
    objects: Vec<TrackedObject>,
    orientation: f32,
}

impl ObjectTracker {
    pub(crate) fn track(&mut self, kind: ObjectKind, position: Vec3) -> ObjectId {
        let id = ObjectId::new(ordinal(self.objects.len()));
        self.objects.push(TrackedObject {
            id,
            kind,
            position,
            yaw: self.orientation,
            observed: None,
        });
        id
    }

    /// Records a new position; returns `false` for unknown objects.
    pub(crate) fn move_to(&mut self, id: ObjectId, position: Vec3) -> bool {
        let index = usize::try_from(id.get()).ok();
        match index.and_then(|index| self.objects.get_mut(index)) {
            Some(object) => {
                object.position = position;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_orientation(&mut self, yaw: f32) {
        self.orientation = yaw;
    }

    /// Copies the shared orientation onto every object.
    pub(crate) fn link_orientations(&mut self) {
        for object in &mut self.objects {
            object.yaw = self.orientation;
        }
    }

    /// Reports whether any object moved since the last observation.
    pub(crate) fn changed(&self) -> bool {
        self.objects.iter().any(TrackedObject::changed)
    }

    pub(crate) fn observe_all(&mut self) {
        for object in &mut self.objects {
            object.observed = Some(object.position);
        }
    }

    pub(crate) fn forget_observations(&mut self) {
        for object in &mut self.objects {
            object.observed = None;
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.iter()
    }

    pub(crate) fn placements(&self) -> impl Iterator<Item = (ObjectKind, Vec3)> + '_ {
        self.objects.iter().map(|object| (object.kind, object.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_objects_count_as_changed() {
        let mut tracker = ObjectTracker::default();
        assert!(!tracker.changed());

        let _ = tracker.track(ObjectKind::Wall, Vec3::ZERO);
        assert!(tracker.changed());

        tracker.observe_all();
        assert!(!tracker.changed());
    }

    #[test]
    fn moving_an_object_marks_it_changed() {
        let mut tracker = ObjectTracker::default();
        let id = tracker.track(ObjectKind::Tower, Vec3::ZERO);
        tracker.observe_all();

        assert!(tracker.move_to(id, Vec3::X));
        assert!(tracker.changed());
        assert!(!tracker.move_to(ObjectId::new(9), Vec3::X));
    }

    #[test]
    fn orientation_is_linked_on_demand() {
        let mut tracker = ObjectTracker::default();
        let _ = tracker.track(ObjectKind::Base, Vec3::ZERO);
        tracker.set_orientation(1.25);
        assert_eq!(tracker.iter().next().map(|object| object.yaw), Some(0.0));

        tracker.link_orientations();
        assert_eq!(tracker.iter().next().map(|object| object.yaw), Some(1.25));
    }

    #[test]
    fn forgetting_observations_forces_a_refresh() {
        let mut tracker = ObjectTracker::default();
        let _ = tracker.track(ObjectKind::Spawn, Vec3::ZERO);
        tracker.observe_all();
        tracker.forget_observations();
        assert!(tracker.changed());
    }
}
