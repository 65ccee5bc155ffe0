//! OSRM `table` and `trip` response bodies. Error bodies share the `code` and
//! `message` fields and omit the payload, so payload fields are optional.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct TableResponse {
    pub(super) code: String,
    pub(super) message: Option<String>,
    pub(super) durations: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TripResponse {
    pub(super) code: String,
    pub(super) message: Option<String>,
    #[serde(default)]
    pub(super) trips: Vec<OsrmTrip>,
    #[serde(default)]
    pub(super) waypoints: Vec<OsrmTripWaypoint>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OsrmTrip {
    pub(super) distance: f64,
    pub(super) duration: f64,
    pub(super) geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
pub(super) struct OsrmGeometry {
    pub(super) coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OsrmTripWaypoint {
    pub(super) waypoint_index: usize,
    /// `[lon, lat]`
    pub(super) location: [f64; 2],
}
