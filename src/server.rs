//! Actix Web front-end. The page at `/` is the widget side of the map; every
//! user action is a small JSON call that runs through the [`Session`] and
//! answers with the rendered view.

use std::sync::{Mutex, MutexGuard};

use actix_web::{error::ErrorInternalServerError, web, App, HttpResponse, HttpServer};
use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::{
    app::{self, Action, Effect, Operation, Session},
    config::ServeConfig,
    html,
    map::{scene::MapScene, MapBinding, MarkerId},
    render,
    routing::{
        transport::{HttpTransport, Transport},
        Profile, RoutingClient,
    },
    waypoints::checked_lat_lon,
};

pub struct MapSettings {
    pub tile_url: String,
    pub center: Coord<f64>,
    pub zoom: u8,
}

impl From<&ServeConfig> for MapSettings {
    fn from(config: &ServeConfig) -> Self {
        Self {
            tile_url: config.tile_url.clone(),
            center: config.center.0,
            zoom: config.zoom,
        }
    }
}

/// Session plus the map it is mirrored onto.
struct Workspace {
    session: Session,
    binding: MapBinding,
    scene: MapScene,
}

impl Workspace {
    fn new(profile: Profile) -> Self {
        Self {
            session: Session::new(profile),
            binding: MapBinding::new(),
            scene: MapScene::new(),
        }
    }

    fn apply(&mut self, action: Action) -> Effect {
        let effect = self.session.update(action);
        self.binding.sync(&self.session, &mut self.scene);
        effect
    }

    fn view(&self) -> View {
        View {
            profile: self.session.profile(),
            status: render::status_text(self.session.status()),
            stops: render::stops_list_html(self.session.waypoints()),
            matrix: self
                .session
                .matrix()
                .map(render::matrix_table_html)
                .unwrap_or_default(),
            trip: self
                .session
                .trip()
                .map(render::trip_order_html)
                .unwrap_or_default(),
            viewport: self.scene.viewport().map(|v| ViewportView {
                sequence: v.sequence,
                south_west: [v.bounds.min().y, v.bounds.min().x],
                north_east: [v.bounds.max().y, v.bounds.max().x],
            }),
        }
    }
}

pub struct ServerState<T> {
    workspace: Mutex<Workspace>,
    client: RoutingClient<T>,
    settings: MapSettings,
}

impl<T: Transport> ServerState<T> {
    pub fn new(client: RoutingClient<T>, profile: Profile, settings: MapSettings) -> Self {
        Self {
            workspace: Mutex::new(Workspace::new(profile)),
            client,
            settings,
        }
    }

    fn workspace(&self) -> actix_web::Result<MutexGuard<'_, Workspace>> {
        self.workspace
            .lock()
            .map_err(|_| ErrorInternalServerError("workspace lock poisoned"))
    }
}

#[derive(Serialize)]
struct View {
    profile: Profile,
    status: String,
    stops: String,
    matrix: String,
    trip: String,
    viewport: Option<ViewportView>,
}

/// Corners in Leaflet's `[lat, lng]` order.
#[derive(Serialize)]
struct ViewportView {
    sequence: u64,
    south_west: [f64; 2],
    north_east: [f64; 2],
}

#[derive(Serialize)]
struct SettingsView<'a> {
    tile_url: &'a str,
    center: [f64; 2],
    zoom: u8,
    profiles: &'static [Profile],
}

#[derive(Deserialize)]
struct PointBody {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct ProfileBody {
    profile: Profile,
}

pub fn routes<T: Transport + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index_route))
        .route("/settings", web::get().to(settings_handler::<T>))
        .route("/state", web::get().to(state_handler::<T>))
        .route("/stops", web::post().to(add_stop_handler::<T>))
        .route("/stops", web::delete().to(clear_handler::<T>))
        .route("/markers/{id}/moved", web::post().to(move_marker_handler::<T>))
        .route("/profile", web::put().to(profile_handler::<T>))
        .route("/matrix", web::post().to(matrix_handler::<T>))
        .route("/trip", web::post().to(trip_handler::<T>))
        .route("/markers.geojson", web::get().to(markers_handler::<T>))
        .route("/route.geojson", web::get().to(route_handler::<T>));
}

pub async fn serve(
    client: RoutingClient<HttpTransport>,
    profile: Profile,
    config: &ServeConfig,
) -> anyhow::Result<()> {
    let state = web::Data::new(ServerState::new(
        client,
        profile,
        MapSettings::from(config),
    ));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::<HttpTransport>)
    })
    .bind(config.listen.as_str())?
    .run();

    log::info!("Listening on {}", config.listen);
    server.await?;

    Ok(())
}

fn view_response<T: Transport>(state: &ServerState<T>) -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.workspace()?.view()))
}

async fn index_route() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html::INDEX_HTML)
}

async fn settings_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
) -> HttpResponse {
    let settings = &state.settings;
    HttpResponse::Ok().json(SettingsView {
        tile_url: &settings.tile_url,
        center: [settings.center.y, settings.center.x],
        zoom: settings.zoom,
        profiles: &Profile::ALL,
    })
}

async fn state_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
) -> actix_web::Result<HttpResponse> {
    view_response(&state)
}

async fn add_stop_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
    body: web::Json<PointBody>,
) -> actix_web::Result<HttpResponse> {
    let Some(position) = checked_lat_lon(body.lat, body.lon) else {
        return Ok(HttpResponse::BadRequest().body("coordinate out of range"));
    };

    state.workspace()?.apply(Action::AddStop(position));
    view_response(&state)
}

async fn clear_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
) -> actix_web::Result<HttpResponse> {
    state.workspace()?.apply(Action::Clear);
    view_response(&state)
}

async fn move_marker_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
    path: web::Path<u64>,
    body: web::Json<PointBody>,
) -> actix_web::Result<HttpResponse> {
    let Some(position) = checked_lat_lon(body.lat, body.lon) else {
        return Ok(HttpResponse::BadRequest().body("coordinate out of range"));
    };

    {
        let mut workspace = state.workspace()?;
        let marker = MarkerId::new(path.into_inner());
        let Some(id) = workspace.binding.waypoint_for(marker) else {
            return Ok(HttpResponse::NotFound().body("unknown marker"));
        };
        workspace.apply(Action::MoveStop { id, to: position });
    }

    view_response(&state)
}

async fn profile_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
    body: web::Json<ProfileBody>,
) -> actix_web::Result<HttpResponse> {
    state
        .workspace()?
        .apply(Action::SelectProfile(body.profile));
    view_response(&state)
}

async fn matrix_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
) -> actix_web::Result<HttpResponse> {
    run_request(&state, Operation::Matrix).await
}

async fn trip_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
) -> actix_web::Result<HttpResponse> {
    run_request(&state, Operation::Trip).await
}

/// The workspace lock is released while the upstream request is in flight.
async fn run_request<T: Transport>(
    state: &ServerState<T>,
    operation: Operation,
) -> actix_web::Result<HttpResponse> {
    let effect = state.workspace()?.apply(Action::Request(operation));

    if let Effect::Fetch(request) = effect {
        let arrived = app::fetch(&state.client, request).await;
        state.workspace()?.apply(arrived);
    }

    view_response(state)
}

async fn markers_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
) -> actix_web::Result<HttpResponse> {
    let body = state
        .workspace()?
        .scene
        .markers_geojson()
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok()
        .content_type("application/geo+json")
        .body(body))
}

async fn route_handler<T: Transport + 'static>(
    state: web::Data<ServerState<T>>,
) -> actix_web::Result<HttpResponse> {
    let body = state
        .workspace()?
        .scene
        .route_geojson()
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok()
        .content_type("application/geo+json")
        .body(body))
}
