pub mod app;
pub mod config;
pub mod html;
pub mod map;
pub mod render;
pub mod routing;
pub mod server;
pub mod waypoints;
