//! In-memory [`MapAdapter`] mirrored by the browser page. Layers are published
//! as GeoJSON feature collections.

use std::collections::BTreeMap;

use anyhow::Context;
use geo_types::{Coord, LineString, Point, Rect};
use serde::Serialize;

use crate::map::{MapAdapter, MarkerId};

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLayer {
    pub position: Coord<f64>,
    pub number: usize,
}

/// A pending fit request. `sequence` increases with every request so the page
/// can tell a new fit from one it already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub sequence: u64,
    pub bounds: Rect<f64>,
}

#[derive(Debug, Default)]
pub struct MapScene {
    markers: BTreeMap<MarkerId, MarkerLayer>,
    next_marker: u64,
    route: Option<LineString<f64>>,
    viewport: Option<Viewport>,
    fits: u64,
}

#[derive(Serialize)]
struct MarkerFeature {
    marker: u64,
    number: usize,
    popup: String,
    #[serde(serialize_with = "geojson::ser::serialize_geometry")]
    geometry: Point<f64>,
}

#[derive(Serialize)]
struct RouteFeature {
    #[serde(serialize_with = "geojson::ser::serialize_geometry")]
    geometry: LineString<f64>,
}

impl MapScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &MarkerLayer)> {
        self.markers.iter().map(|(id, m)| (*id, m))
    }

    pub fn marker(&self, id: MarkerId) -> Option<&MarkerLayer> {
        self.markers.get(&id)
    }

    pub fn route(&self) -> Option<&LineString<f64>> {
        self.route.as_ref()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn markers_geojson(&self) -> anyhow::Result<String> {
        let features: Vec<MarkerFeature> = self
            .markers
            .iter()
            .map(|(id, m)| MarkerFeature {
                marker: id.get(),
                number: m.number,
                popup: format!("Stop {}", m.number),
                geometry: Point::from(m.position),
            })
            .collect();

        geojson::ser::to_feature_collection_string(&features)
            .context("Failed to serialize markers")
    }

    pub fn route_geojson(&self) -> anyhow::Result<String> {
        let features: Vec<RouteFeature> = self
            .route
            .iter()
            .map(|line| RouteFeature {
                geometry: line.clone(),
            })
            .collect();

        geojson::ser::to_feature_collection_string(&features).context("Failed to serialize route")
    }
}

impl MapAdapter for MapScene {
    fn add_marker(&mut self, position: Coord<f64>, number: usize) -> MarkerId {
        let id = MarkerId::new(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(id, MarkerLayer { position, number });
        id
    }

    fn update_marker(&mut self, marker: MarkerId, position: Coord<f64>, number: usize) {
        if let Some(layer) = self.markers.get_mut(&marker) {
            layer.position = position;
            layer.number = number;
        }
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.markers.remove(&marker);
    }

    fn draw_route(&mut self, route: &LineString<f64>) {
        self.route = Some(route.clone());
    }

    fn clear_route(&mut self) {
        self.route = None;
        self.viewport = None;
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>) {
        self.fits += 1;
        self.viewport = Some(Viewport {
            sequence: self.fits,
            bounds,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoints::lat_lon;

    #[test]
    fn markers_serialize_as_point_features() {
        let mut scene = MapScene::new();
        scene.add_marker(lat_lon(-6.2, 106.8), 1);

        let json: serde_json::Value =
            serde_json::from_str(&scene.markers_geojson().unwrap()).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        let feature = &json["features"][0];
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"][0], 106.8);
        assert_eq!(feature["geometry"]["coordinates"][1], -6.2);
        assert_eq!(feature["properties"]["popup"], "Stop 1");
        assert_eq!(feature["properties"]["marker"], 0);
    }

    #[test]
    fn empty_route_is_an_empty_collection() {
        let scene = MapScene::new();

        let json: serde_json::Value =
            serde_json::from_str(&scene.route_geojson().unwrap()).unwrap();

        assert_eq!(json["features"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn clearing_the_route_drops_the_fit_but_not_its_sequence() {
        let mut scene = MapScene::new();
        let bounds = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        scene.draw_route(&LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
        scene.fit_bounds(bounds);

        scene.clear_route();
        assert!(scene.route().is_none());
        assert!(scene.viewport().is_none());

        scene.fit_bounds(bounds);
        assert_eq!(scene.viewport().unwrap().sequence, 2);
    }

    #[test]
    fn removing_unknown_markers_is_harmless() {
        let mut scene = MapScene::new();
        let kept = scene.add_marker(lat_lon(0.0, 0.0), 1);

        scene.remove_marker(MarkerId::new(42));
        scene.update_marker(MarkerId::new(42), lat_lon(1.0, 1.0), 9);

        assert_eq!(scene.markers().count(), 1);
        assert_eq!(scene.marker(kept).unwrap().number, 1);
    }
}
