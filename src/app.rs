//! Application state and its transition function. Nothing here touches the
//! network or the map widget: `update` returns an [`Effect`] describing the
//! request to run, and the arrival is fed back in as another [`Action`].

use std::time::Instant;

use geo_types::Coord;

use crate::{
    routing::{
        transport::Transport, MatrixResult, Profile, RoutingClient, RoutingError, TripResult,
        MATRIX_MIN_POINTS, TRIP_MIN_POINTS,
    },
    render,
    waypoints::{WaypointId, WaypointStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Matrix,
    Trip,
}

impl Operation {
    pub fn min_points(self) -> usize {
        match self {
            Operation::Matrix => MATRIX_MIN_POINTS,
            Operation::Trip => TRIP_MIN_POINTS,
        }
    }
}

/// Identifies the request a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    InsufficientPoints { required: usize },
    Upstream(String),
    Network,
}

impl From<RoutingError> for Failure {
    fn from(value: RoutingError) -> Self {
        match value {
            RoutingError::InsufficientPoints { required, .. } => {
                Failure::InsufficientPoints { required }
            }
            RoutingError::Upstream(message) => Failure::Upstream(message),
            RoutingError::Network(_) => Failure::Network,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    Requesting(Operation),
    MatrixReady,
    TripReady { distance_m: f64, duration_s: f64 },
    Failed {
        operation: Operation,
        failure: Failure,
    },
}

#[derive(Debug)]
pub enum Action {
    AddStop(Coord<f64>),
    MoveStop { id: WaypointId, to: Coord<f64> },
    Clear,
    SelectProfile(Profile),
    Request(Operation),
    MatrixArrived {
        ticket: Ticket,
        result: Result<MatrixResult, RoutingError>,
    },
    TripArrived {
        ticket: Ticket,
        result: Result<TripResult, RoutingError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub operation: Operation,
    pub points: Vec<Coord<f64>>,
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Fetch(FetchRequest),
}

pub struct Session {
    waypoints: WaypointStore,
    profile: Profile,
    status: Status,
    matrix: Option<MatrixResult>,
    trip: Option<TripResult>,
    generation: u64,
}

impl Session {
    pub fn new(profile: Profile) -> Self {
        Self {
            waypoints: WaypointStore::new(),
            profile,
            status: Status::Idle,
            matrix: None,
            trip: None,
            generation: 0,
        }
    }

    pub fn waypoints(&self) -> &WaypointStore {
        &self.waypoints
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn matrix(&self) -> Option<&MatrixResult> {
        self.matrix.as_ref()
    }

    pub fn trip(&self) -> Option<&TripResult> {
        self.trip.as_ref()
    }

    /// Changes whenever a request starts or the session is cleared, so a
    /// displayed trip can be told apart from an earlier one.
    pub fn trip_generation(&self) -> u64 {
        self.generation
    }

    pub fn update(&mut self, action: Action) -> Effect {
        match action {
            Action::AddStop(position) => {
                self.waypoints.add(position);
            }
            Action::MoveStop { id, to } => match self.waypoints.index_of(id) {
                Some(index) => {
                    if let Err(e) = self.waypoints.update_position(index, to) {
                        log::warn!("Ignoring move: {e}");
                    }
                }
                None => log::debug!("Ignoring move of removed stop {id:?}"),
            },
            Action::Clear => {
                self.waypoints.clear();
                self.clear_panels();
                self.status = Status::Idle;
                self.generation += 1;
            }
            Action::SelectProfile(profile) => {
                self.profile = profile;
            }
            Action::Request(operation) => return self.request(operation),
            Action::MatrixArrived { ticket, result } => {
                if self.is_current(ticket) {
                    self.status = match result {
                        Ok(matrix) => {
                            self.matrix = Some(matrix);
                            Status::MatrixReady
                        }
                        Err(e) => self.failed(Operation::Matrix, e),
                    };
                }
            }
            Action::TripArrived { ticket, result } => {
                if self.is_current(ticket) {
                    self.status = match result {
                        Ok(trip) => {
                            let status = Status::TripReady {
                                distance_m: trip.distance_m,
                                duration_s: trip.duration_s,
                            };
                            self.trip = Some(trip);
                            status
                        }
                        Err(e) => self.failed(Operation::Trip, e),
                    };
                }
            }
        }

        Effect::None
    }

    fn request(&mut self, operation: Operation) -> Effect {
        let required = operation.min_points();
        if self.waypoints.len() < required {
            self.status = Status::Failed {
                operation,
                failure: Failure::InsufficientPoints { required },
            };
            return Effect::None;
        }

        self.clear_panels();
        self.status = Status::Requesting(operation);
        self.generation += 1;

        Effect::Fetch(FetchRequest {
            ticket: Ticket(self.generation),
            operation,
            points: self.waypoints.coordinates(),
            profile: self.profile,
        })
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        let current = ticket.0 == self.generation;
        if !current {
            log::debug!(
                "Dropping stale response {} (current {})",
                ticket.0,
                self.generation
            );
        }
        current
    }

    fn failed(&self, operation: Operation, error: RoutingError) -> Status {
        log::warn!("{operation:?} request failed: {error}");
        Status::Failed {
            operation,
            failure: error.into(),
        }
    }

    fn clear_panels(&mut self) {
        self.matrix = None;
        self.trip = None;
    }
}

/// Runs the request described by an [`Effect::Fetch`] and returns the action
/// that reports its outcome.
pub async fn fetch<T: Transport>(client: &RoutingClient<T>, request: FetchRequest) -> Action {
    let FetchRequest {
        ticket,
        operation,
        points,
        profile,
    } = request;

    match operation {
        Operation::Matrix => Action::MatrixArrived {
            ticket,
            result: client.compute_matrix(&points, profile).await,
        },
        Operation::Trip => Action::TripArrived {
            ticket,
            result: client.compute_trip(&points, profile).await,
        },
    }
}

/// Runs a single request for `stops` and returns the printable outcome.
/// A failed request is an error carrying the status text.
pub async fn run_once<T: Transport>(
    client: &RoutingClient<T>,
    profile: Profile,
    stops: &[Coord<f64>],
    operation: Operation,
) -> anyhow::Result<String> {
    let mut session = Session::new(profile);
    for stop in stops {
        session.update(Action::AddStop(*stop));
    }

    let now = Instant::now();
    if let Effect::Fetch(request) = session.update(Action::Request(operation)) {
        let arrived = fetch(client, request).await;
        session.update(arrived);
        log::info!("Routing service answered in {:?}", now.elapsed());
    }

    let status = render::status_text(session.status());
    if let Status::Failed { .. } = session.status() {
        anyhow::bail!(status);
    }

    let mut lines = vec![status];
    if let Some(matrix) = session.matrix() {
        lines.push(render::matrix_table_text(matrix));
    }
    if let Some(trip) = session.trip() {
        lines.push(render::trip_order_text(trip));
    }

    Ok(lines.join("\n"))
}
