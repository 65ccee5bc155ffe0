pub mod waypoint;

use geo_types::Coord;
use thiserror::Error;

pub use crate::waypoints::waypoint::{checked_lat_lon, lat_lon, Waypoint, WaypointId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaypointError {
    #[error("no stop at index {index} (have {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Ordered stops in visiting order. Position in the sequence is the stop's
/// display index minus one.
#[derive(Debug, Default)]
pub struct WaypointStore {
    waypoints: Vec<Waypoint>,
    next_id: u64,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stop; its display index is the new length.
    pub fn add(&mut self, position: Coord<f64>) -> WaypointId {
        let id = WaypointId::new(self.next_id);
        self.next_id += 1;
        self.waypoints.push(Waypoint::new(id, position));
        id
    }

    pub fn update_position(
        &mut self,
        index: usize,
        position: Coord<f64>,
    ) -> Result<(), WaypointError> {
        let len = self.waypoints.len();
        let waypoint = self
            .waypoints
            .get_mut(index)
            .ok_or(WaypointError::OutOfRange { index, len })?;
        waypoint.position = position;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn index_of(&self, id: WaypointId) -> Option<usize> {
        self.waypoints.iter().position(|w| w.id == id)
    }

    /// 1-based index shown to the user as `Stop N`.
    pub fn display_index(&self, id: WaypointId) -> Option<usize> {
        self.index_of(id).map(|i| i + 1)
    }

    pub fn coordinates(&self) -> Vec<Coord<f64>> {
        self.waypoints.iter().map(|w| w.position).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(i: usize) -> Coord<f64> {
        lat_lon(-6.2 + i as f64 * 0.01, 106.8 + i as f64 * 0.01)
    }

    #[test]
    fn clearing_empties_the_store_for_any_count() {
        for n in 0..6 {
            let mut store = WaypointStore::new();
            (0..n).for_each(|i| {
                store.add(point(i));
            });
            assert_eq!(store.len(), n);

            store.clear();
            assert!(store.is_empty());
            assert_eq!(store.iter().count(), 0);
        }
    }

    #[test]
    fn display_index_follows_insertion_order() {
        let mut store = WaypointStore::new();
        let ids: Vec<_> = (0..4).map(|i| store.add(point(i))).collect();

        for (k, id) in ids.iter().enumerate() {
            assert_eq!(store.display_index(*id), Some(k + 1));
        }
    }

    #[test]
    fn dragging_one_stop_leaves_other_indices_alone() {
        let mut store = WaypointStore::new();
        let first = store.add(point(0));
        let second = store.add(point(1));
        let third = store.add(point(2));

        store.update_position(1, lat_lon(1.0, 2.0)).unwrap();

        assert_eq!(store.display_index(first), Some(1));
        assert_eq!(store.display_index(second), Some(2));
        assert_eq!(store.display_index(third), Some(3));
        let moved = store.get(1).unwrap();
        assert_eq!(moved.latitude(), 1.0);
        assert_eq!(moved.longitude(), 2.0);
    }

    #[test]
    fn update_out_of_range_is_rejected() {
        let mut store = WaypointStore::new();
        store.add(point(0));

        let err = store.update_position(3, point(1)).unwrap_err();
        assert_eq!(err, WaypointError::OutOfRange { index: 3, len: 1 });
        assert_eq!(store.get(0).unwrap().position, point(0));
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut store = WaypointStore::new();
        let before = store.add(point(0));
        store.clear();
        let after = store.add(point(0));

        assert_ne!(before, after);
        assert_eq!(store.display_index(after), Some(1));
        assert_eq!(store.display_index(before), None);
    }
}
