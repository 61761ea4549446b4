//! Stable identifiers for externally sensed surfaces

use crate::sensing::ExternalHandle;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Identifier of a tracked surface, stable for as long as it is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Maps opaque sensing handles to [`SurfaceId`]s
///
/// Ids start at 1 and are never handed out twice, so a handle that comes
/// back after release gets a fresh id.
#[derive(Debug, Default)]
pub struct HandleIds {
    ids: HashMap<ExternalHandle, SurfaceId>,
    released: HashSet<ExternalHandle>,
    next: u64,
}

impl HandleIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: ExternalHandle) -> Option<SurfaceId> {
        self.ids.get(&handle).copied()
    }

    /// Id of `handle`, allocating one if it has none
    pub fn assign(&mut self, handle: ExternalHandle) -> SurfaceId {
        if let Some(id) = self.get(handle) {
            return id;
        }
        self.released.remove(&handle);
        self.next += 1;
        let id = SurfaceId(self.next);
        self.ids.insert(handle, id);
        id
    }

    /// Drop `handle` without remembering it as released
    pub fn forget(&mut self, handle: ExternalHandle) -> Option<SurfaceId> {
        self.ids.remove(&handle)
    }

    pub fn release(&mut self, handle: ExternalHandle) -> Option<SurfaceId> {
        let id = self.ids.remove(&handle)?;
        self.released.insert(handle);
        Some(id)
    }

    /// Whether `handle` was released and has not been assigned again
    pub fn was_released(&self, handle: ExternalHandle) -> bool {
        self.released.contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one_and_are_stable() {
        let mut ids = HandleIds::new();
        let a = ids.assign(ExternalHandle(40));
        let b = ids.assign(ExternalHandle(7));
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_eq!(ids.assign(ExternalHandle(40)), a);
        assert_eq!(ids.len(), 2);
        assert_eq!(a.to_string(), "surface#1");
    }

    #[test]
    fn test_released_handle_gets_fresh_id() {
        let mut ids = HandleIds::new();
        let first = ids.assign(ExternalHandle(1));
        assert_eq!(ids.release(ExternalHandle(1)), Some(first));
        assert!(ids.get(ExternalHandle(1)).is_none());
        assert!(ids.was_released(ExternalHandle(1)));

        let second = ids.assign(ExternalHandle(1));
        assert_ne!(first, second);
        assert!(!ids.was_released(ExternalHandle(1)));
        assert_eq!(ids.release(ExternalHandle(99)), None);
    }

    #[test]
    fn test_churning_handles_keep_bookkeeping_bounded() {
        let mut ids = HandleIds::new();
        for _ in 0..100 {
            for raw in 0..4 {
                ids.assign(ExternalHandle(raw));
            }
            for raw in 0..4 {
                ids.release(ExternalHandle(raw));
            }
        }
        assert!(ids.is_empty());
        assert_eq!(ids.released.len(), 4);

        ids.assign(ExternalHandle(0));
        assert_eq!(ids.released.len(), 3);
    }

    #[test]
    fn test_forgotten_handle_is_not_released() {
        let mut ids = HandleIds::new();
        let id = ids.assign(ExternalHandle(5));
        assert_eq!(ids.forget(ExternalHandle(5)), Some(id));
        assert!(ids.get(ExternalHandle(5)).is_none());
        assert!(!ids.was_released(ExternalHandle(5)));
    }
}
