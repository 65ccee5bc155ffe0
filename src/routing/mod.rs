pub mod transport;
mod types;

use std::{fmt, time::Duration};

use geo_types::{Coord, LineString};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::{
    transport::{HttpTransport, Transport},
    types::{TableResponse, TripResponse},
};

pub const MATRIX_MIN_POINTS: usize = 2;
pub const TRIP_MIN_POINTS: usize = 3;

/// Travel mode passed through to the routing service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Driving, Profile::Walking, Profile::Cycling];

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Driving => "driving",
            Profile::Walking => "walking",
            Profile::Cycling => "cycling",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    #[error("at least {required} stops are required, have {actual}")]
    InsufficientPoints { required: usize, actual: usize },
    /// The service answered but reported a non-`Ok` code.
    #[error("routing service error: {0}")]
    Upstream(String),
    /// Transport failure or an unreadable body.
    #[error("request failed: {0}")]
    Network(String),
}

impl From<reqwest::Error> for RoutingError {
    fn from(value: reqwest::Error) -> Self {
        RoutingError::Network(value.to_string())
    }
}

impl From<serde_json::Error> for RoutingError {
    fn from(value: serde_json::Error) -> Self {
        RoutingError::Network(format!("malformed response: {value}"))
    }
}

/// Durations in seconds, `durations[i][j]` from stop `i` to stop `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixResult {
    pub durations: Vec<Vec<Option<f64>>>,
}

impl MatrixResult {
    pub fn size(&self) -> usize {
        self.durations.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripStop {
    pub original_index: usize,
    /// `x = longitude, y = latitude`
    pub location: Coord<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripResult {
    /// Sorted by `original_index` ascending.
    pub stops: Vec<TripStop>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: LineString<f64>,
}

pub struct RoutingClient<T = HttpTransport> {
    transport: T,
    base: String,
}

impl RoutingClient<HttpTransport> {
    pub fn connect(base: &str, timeout: Duration) -> anyhow::Result<Self> {
        reqwest::Url::parse(base)
            .map_err(|e| anyhow::anyhow!("{} is not a valid url: {}", base, e))?;

        Ok(Self::new(base, HttpTransport::new(timeout)?))
    }
}

impl<T: Transport> RoutingClient<T> {
    pub fn new(base: &str, transport: T) -> Self {
        Self {
            transport,
            base: base.trim_end_matches('/').to_owned(),
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub fn matrix_url(&self, points: &[Coord<f64>], profile: Profile) -> String {
        format!(
            "{}/table/v1/{}/{}?annotations=duration",
            self.base,
            profile,
            coordinate_list(points)
        )
    }

    pub fn trip_url(&self, points: &[Coord<f64>], profile: Profile) -> String {
        format!(
            "{}/trip/v1/{}/{}?roundtrip=true&source=first&destination=last&geometries=geojson",
            self.base,
            profile,
            coordinate_list(points)
        )
    }

    pub async fn compute_matrix(
        &self,
        points: &[Coord<f64>],
        profile: Profile,
    ) -> Result<MatrixResult, RoutingError> {
        require_points(points, MATRIX_MIN_POINTS)?;

        let url = self.matrix_url(points, profile);
        log::debug!("GET {url}");
        let body = self.transport.get(&url).await?;

        let response: TableResponse = serde_json::from_str(&body)?;
        check_code(&response.code, response.message)?;

        let durations = response
            .durations
            .ok_or_else(|| RoutingError::Network("response has no durations".to_owned()))?;

        let n = points.len();
        if durations.len() != n || durations.iter().any(|row| row.len() != n) {
            return Err(RoutingError::Network(format!(
                "expected a {n}x{n} duration table"
            )));
        }

        Ok(MatrixResult { durations })
    }

    pub async fn compute_trip(
        &self,
        points: &[Coord<f64>],
        profile: Profile,
    ) -> Result<TripResult, RoutingError> {
        require_points(points, TRIP_MIN_POINTS)?;

        let url = self.trip_url(points, profile);
        log::debug!("GET {url}");
        let body = self.transport.get(&url).await?;

        let response: TripResponse = serde_json::from_str(&body)?;
        check_code(&response.code, response.message)?;

        let trip = response
            .trips
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::Network("response has no trips".to_owned()))?;

        let stops = response
            .waypoints
            .into_iter()
            .map(|w| TripStop {
                original_index: w.waypoint_index,
                location: Coord {
                    x: w.location[0],
                    y: w.location[1],
                },
            })
            .sorted_by_key(|s| s.original_index)
            .collect();

        let geometry = trip
            .geometry
            .coordinates
            .into_iter()
            .map(|[lon, lat]| Coord { x: lon, y: lat })
            .collect::<LineString<f64>>();

        Ok(TripResult {
            stops,
            distance_m: trip.distance,
            duration_s: trip.duration,
            geometry,
        })
    }
}

/// `lon,lat;lon,lat;...` in sequence order.
fn coordinate_list(points: &[Coord<f64>]) -> String {
    points
        .iter()
        .map(|c| format!("{},{}", c.x, c.y))
        .join(";")
}

fn require_points(points: &[Coord<f64>], required: usize) -> Result<(), RoutingError> {
    if points.len() < required {
        return Err(RoutingError::InsufficientPoints {
            required,
            actual: points.len(),
        });
    }
    Ok(())
}

fn check_code(code: &str, message: Option<String>) -> Result<(), RoutingError> {
    if code == "Ok" {
        return Ok(());
    }
    Err(RoutingError::Upstream(
        message.unwrap_or_else(|| code.to_owned()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::transport::canned::CannedTransport;
    use crate::waypoints::lat_lon;

    const BASE: &str = "https://router.example.org/";

    const TABLE_OK: &str = r#"{"code":"Ok","durations":[[0,null],[300,0]]}"#;

    const TRIP_OK: &str = r#"{
        "code": "Ok",
        "trips": [{
            "distance": 12345.6,
            "duration": 1800.0,
            "geometry": {"type": "LineString", "coordinates": [[106.8, -6.2], [106.9, -6.25], [106.8, -6.2]]}
        }],
        "waypoints": [
            {"waypoint_index": 2, "location": [106.95, -6.3], "name": ""},
            {"waypoint_index": 0, "location": [106.8, -6.2], "name": ""},
            {"waypoint_index": 1, "location": [106.9, -6.25], "name": ""}
        ]
    }"#;

    fn stops(n: usize) -> Vec<Coord<f64>> {
        [
            lat_lon(-6.2, 106.8),
            lat_lon(-6.25, 106.9),
            lat_lon(-6.3, 106.95),
            lat_lon(-6.35, 107.0),
        ][..n]
            .to_vec()
    }

    #[test]
    fn matrix_url_lists_lon_lat_pairs_in_order() {
        let client = RoutingClient::new(BASE, CannedTransport::ok(TABLE_OK));
        let url = client.matrix_url(&stops(2), Profile::Walking);

        assert_eq!(
            url,
            "https://router.example.org/table/v1/walking/106.8,-6.2;106.9,-6.25?annotations=duration"
        );
    }

    #[test]
    fn trip_url_requests_anchored_round_trip() {
        let client = RoutingClient::new(BASE, CannedTransport::ok(TRIP_OK));
        let url = client.trip_url(&stops(3), Profile::Driving);

        assert!(url.starts_with("https://router.example.org/trip/v1/driving/106.8,-6.2;"));
        assert!(url.ends_with("?roundtrip=true&source=first&destination=last&geometries=geojson"));
    }

    #[actix_web::test]
    async fn matrix_with_one_point_never_hits_the_network() {
        let client = RoutingClient::new(BASE, CannedTransport::ok(TABLE_OK));

        let err = client
            .compute_matrix(&stops(1), Profile::Driving)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RoutingError::InsufficientPoints {
                required: 2,
                actual: 1
            }
        );
        assert!(client.transport.requests().is_empty());
    }

    #[actix_web::test]
    async fn matrix_with_two_points_issues_one_request() {
        let client = RoutingClient::new(BASE, CannedTransport::ok(TABLE_OK));

        let matrix = client
            .compute_matrix(&stops(2), Profile::Driving)
            .await
            .unwrap();

        assert_eq!(client.transport.requests().len(), 1);
        assert_eq!(matrix.size(), 2);
        assert_eq!(matrix.durations[0][1], None);
        assert_eq!(matrix.durations[1][0], Some(300.0));
    }

    #[actix_web::test]
    async fn matrix_of_wrong_shape_is_rejected() {
        let client = RoutingClient::new(
            BASE,
            CannedTransport::ok(r#"{"code":"Ok","durations":[[0,1]]}"#),
        );

        let err = client
            .compute_matrix(&stops(2), Profile::Driving)
            .await
            .unwrap_err();

        assert!(matches!(err, RoutingError::Network(_)));
    }

    #[actix_web::test]
    async fn trip_with_two_points_is_insufficient() {
        let client = RoutingClient::new(BASE, CannedTransport::ok(TRIP_OK));

        let err = client
            .compute_trip(&stops(2), Profile::Driving)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RoutingError::InsufficientPoints { required: 3, .. }
        ));
        assert!(client.transport.requests().is_empty());
    }

    #[actix_web::test]
    async fn trip_with_three_points_sorts_by_waypoint_index() {
        let client = RoutingClient::new(BASE, CannedTransport::ok(TRIP_OK));

        let trip = client
            .compute_trip(&stops(3), Profile::Cycling)
            .await
            .unwrap();

        assert_eq!(client.transport.requests().len(), 1);
        let order: Vec<_> = trip.stops.iter().map(|s| s.original_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(trip.stops[2].location, Coord { x: 106.95, y: -6.3 });
        assert_eq!(trip.distance_m, 12345.6);
        assert_eq!(trip.duration_s, 1800.0);
        assert_eq!(trip.geometry.0.len(), 3);
    }

    #[actix_web::test]
    async fn non_ok_code_surfaces_service_message() {
        let client = RoutingClient::new(
            BASE,
            CannedTransport::ok(r#"{"code":"InvalidQuery","message":"Query string malformed"}"#),
        );

        let err = client
            .compute_trip(&stops(3), Profile::Driving)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RoutingError::Upstream("Query string malformed".to_owned())
        );
    }

    #[actix_web::test]
    async fn non_ok_code_without_message_falls_back_to_code() {
        let client = RoutingClient::new(BASE, CannedTransport::ok(r#"{"code":"NoTable"}"#));

        let err = client
            .compute_matrix(&stops(2), Profile::Driving)
            .await
            .unwrap_err();

        assert_eq!(err, RoutingError::Upstream("NoTable".to_owned()));
    }

    #[actix_web::test]
    async fn transport_and_parse_failures_are_network_errors() {
        let unreachable = RoutingClient::new(BASE, CannedTransport::unreachable());
        let garbage = RoutingClient::new(BASE, CannedTransport::ok("<html>502</html>"));

        let a = unreachable
            .compute_matrix(&stops(2), Profile::Driving)
            .await
            .unwrap_err();
        let b = garbage
            .compute_matrix(&stops(2), Profile::Driving)
            .await
            .unwrap_err();

        assert!(matches!(a, RoutingError::Network(_)));
        assert!(matches!(b, RoutingError::Network(_)));
    }
}
