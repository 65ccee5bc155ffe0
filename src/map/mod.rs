//! The map widget seam. The controller never holds widget handles; a
//! [`MapBinding`] keeps the waypoint-to-marker association and replays the
//! session onto any [`MapAdapter`].

pub mod scene;

use std::collections::HashMap;

use geo::BoundingRect;
use geo_types::{Coord, LineString, Rect};

use crate::{app::Session, waypoints::WaypointId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

impl MarkerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

pub trait MapAdapter {
    /// Places a draggable marker labelled with `number`.
    fn add_marker(&mut self, position: Coord<f64>, number: usize) -> MarkerId;
    fn update_marker(&mut self, marker: MarkerId, position: Coord<f64>, number: usize);
    fn remove_marker(&mut self, marker: MarkerId);
    fn draw_route(&mut self, route: &LineString<f64>);
    /// Removes the route and any pending viewport fit for it.
    fn clear_route(&mut self);
    fn fit_bounds(&mut self, bounds: Rect<f64>);
}

#[derive(Debug, Default)]
pub struct MapBinding {
    markers: HashMap<WaypointId, MarkerId>,
    drawn_trip: Option<u64>,
}

impl MapBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_for(&self, waypoint: WaypointId) -> Option<MarkerId> {
        self.markers.get(&waypoint).copied()
    }

    /// Resolves a drag notification from the widget.
    pub fn waypoint_for(&self, marker: MarkerId) -> Option<WaypointId> {
        self.markers
            .iter()
            .find(|(_, m)| **m == marker)
            .map(|(w, _)| *w)
    }

    /// Brings the widget in line with the session: one marker per stop
    /// labelled with its current position, and the trip geometry if any.
    pub fn sync<M: MapAdapter>(&mut self, session: &Session, map: &mut M) {
        let store = session.waypoints();

        let stale: Vec<WaypointId> = self
            .markers
            .keys()
            .filter(|id| store.index_of(**id).is_none())
            .copied()
            .collect();
        for id in stale {
            if let Some(marker) = self.markers.remove(&id) {
                map.remove_marker(marker);
            }
        }

        for (idx, waypoint) in store.iter().enumerate() {
            match self.markers.get(&waypoint.id) {
                Some(marker) => map.update_marker(*marker, waypoint.position, idx + 1),
                None => {
                    let marker = map.add_marker(waypoint.position, idx + 1);
                    self.markers.insert(waypoint.id, marker);
                }
            }
        }

        match session.trip() {
            Some(trip) => {
                let generation = session.trip_generation();
                if self.drawn_trip != Some(generation) {
                    map.draw_route(&trip.geometry);
                    if let Some(bounds) = trip.geometry.bounding_rect() {
                        map.fit_bounds(bounds);
                    }
                    self.drawn_trip = Some(generation);
                }
            }
            None => {
                if self.drawn_trip.take().is_some() {
                    map.clear_route();
                }
            }
        }
    }
}
