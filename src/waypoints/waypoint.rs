use geo_types::Coord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WaypointId(u64);

impl WaypointId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// A user-placed stop. `position` is stored as `x = longitude, y = latitude`.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub id: WaypointId,
    pub position: Coord<f64>,
}

impl Waypoint {
    pub fn new(id: WaypointId, position: Coord<f64>) -> Self {
        Self { id, position }
    }

    pub fn latitude(&self) -> f64 {
        self.position.y
    }

    pub fn longitude(&self) -> f64 {
        self.position.x
    }
}

/// Builds a coordinate from latitude/longitude order as users type it.
pub fn lat_lon(latitude: f64, longitude: f64) -> Coord<f64> {
    Coord {
        x: longitude,
        y: latitude,
    }
}

/// Like [`lat_lon`] but rejects values outside the WGS84 range.
pub fn checked_lat_lon(latitude: f64, longitude: f64) -> Option<Coord<f64>> {
    let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
    valid.then(|| lat_lon(latitude, longitude))
}
