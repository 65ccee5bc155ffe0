use std::{str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use geo_types::Coord;

use crate::{routing::Profile, waypoints::checked_lat_lon};

/// A `LAT,LON` pair as typed on the command line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon(pub Coord<f64>);

impl FromStr for LatLon {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("expected LAT,LON, got {s:?}"))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid latitude {lat:?}"))?;
        let lon = lon
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid longitude {lon:?}"))?;

        checked_lat_lon(lat, lon)
            .map(Self)
            .ok_or_else(|| anyhow!("{lat},{lon} is outside the valid coordinate range"))
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct RoutingConfig {
    /// Base URL of the OSRM-compatible routing service
    #[arg(
        long = "routing-url",
        env = "ROUTING_URL",
        default_value = "https://router.project-osrm.org",
        global = true
    )]
    pub base_url: String,
    /// Travel profile used for requests
    #[arg(
        long,
        env = "ROUTING_PROFILE",
        value_enum,
        default_value_t = Profile::Driving,
        global = true
    )]
    pub profile: Profile,
    /// Upstream request timeout in seconds
    #[arg(
        long = "timeout-secs",
        env = "ROUTING_TIMEOUT_SECS",
        default_value_t = 30,
        global = true
    )]
    pub timeout_secs: u64,
}

impl RoutingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn log(&self) {
        log::info!(
            "Routing service {} (profile {}, timeout {}s)",
            self.base_url,
            self.profile,
            self.timeout_secs
        );
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeConfig {
    /// Address the map page is served on
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen: String,
    /// Tile URL template handed to the map page
    #[arg(
        long = "tile-url",
        env = "TILE_URL",
        default_value = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"
    )]
    pub tile_url: String,
    /// Initial map centre as LAT,LON
    #[arg(long, default_value = "-6.2,106.8", allow_hyphen_values = true)]
    pub center: LatLon,
    /// Initial zoom level
    #[arg(long, default_value_t = 12)]
    pub zoom: u8,
}

impl ServeConfig {
    pub fn log(&self) {
        log::info!(
            "Map page on {} centred at ({}, {}) zoom {}",
            self.listen,
            self.center.0.y,
            self.center.0.x,
            self.zoom
        );
    }
}
