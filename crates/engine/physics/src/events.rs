//! Contact notifications drained after every step
//!
//! Collision response is left to the caller: the clock forwards every drained
//! event to a [`ContactHook`]. The default hook only logs.

use rapier3d::prelude::*;
use std::sync::Mutex;

/// Contact notification produced by one simulation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    /// Two colliders started touching
    Started {
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    },
    /// Two colliders stopped touching
    Stopped {
        collider1: ColliderHandle,
        collider2: ColliderHandle,
    },
    /// Contact force above the colliders' reporting threshold
    Force {
        collider1: ColliderHandle,
        collider2: ColliderHandle,
        total_force_magnitude: f32,
    },
}

/// Extension point receiving drained contact events
pub trait ContactHook {
    fn on_contact(&mut self, event: &ContactEvent);
}

impl<F: FnMut(&ContactEvent)> ContactHook for F {
    fn on_contact(&mut self, event: &ContactEvent) {
        self(event)
    }
}

/// Logs each event at debug level and discards it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogContacts;

impl ContactHook for LogContacts {
    fn on_contact(&mut self, event: &ContactEvent) {
        tracing::debug!(?event, "contact");
    }
}

/// Event handler handed to the pipeline for one step
#[derive(Default)]
pub(crate) struct ContactCollector {
    events: Mutex<Vec<ContactEvent>>,
}

impl ContactCollector {
    fn push(&self, event: ContactEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }

    pub(crate) fn drain(&mut self) -> Vec<ContactEvent> {
        match self.events.get_mut() {
            Ok(events) => std::mem::take(events),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        }
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let (collider1, collider2) = (event.collider1(), event.collider2());
        self.push(if event.started() {
            ContactEvent::Started {
                collider1,
                collider2,
            }
        } else {
            ContactEvent::Stopped {
                collider1,
                collider2,
            }
        });
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        contact_pair: &ContactPair,
        total_force_magnitude: Real,
    ) {
        self.push(ContactEvent::Force {
            collider1: contact_pair.collider1,
            collider2: contact_pair.collider2,
            total_force_magnitude,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_hook() {
        let mut seen = Vec::new();
        {
            let mut hook = |event: &ContactEvent| seen.push(*event);
            let event = ContactEvent::Started {
                collider1: ColliderHandle::from_raw_parts(0, 0),
                collider2: ColliderHandle::from_raw_parts(1, 0),
            };
            hook.on_contact(&event);
        }
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_collector_drain_empties() {
        let mut collector = ContactCollector::default();
        collector.push(ContactEvent::Force {
            collider1: ColliderHandle::from_raw_parts(0, 0),
            collider2: ColliderHandle::from_raw_parts(1, 0),
            total_force_magnitude: 2.0,
        });

        assert_eq!(collector.drain().len(), 1);
        assert!(collector.drain().is_empty());
    }
}
