//! Presentation of the session: HTML fragments for the page panels and
//! plain-text forms for the command line.

use itertools::Itertools;

use crate::{
    app::{Failure, Operation, Status},
    routing::{MatrixResult, TripResult},
    waypoints::WaypointStore,
};

const MISSING: &str = "-";

pub fn format_duration_minutes(seconds: f64) -> String {
    format!("{:.1}", seconds / 60.0)
}

pub fn format_duration_hours(seconds: f64) -> String {
    format!("{:.2}", seconds / 3600.0)
}

pub fn format_distance_km(meters: f64) -> String {
    format!("{:.2}", meters / 1000.0)
}

/// Zero (the diagonal) and unreachable pairs both show as a dash.
fn matrix_cell(value: Option<f64>) -> String {
    match value {
        Some(seconds) if seconds != 0.0 => format_duration_minutes(seconds),
        _ => MISSING.to_owned(),
    }
}

pub fn status_text(status: &Status) -> String {
    match status {
        Status::Idle => String::new(),
        Status::Requesting(Operation::Matrix) => "Computing OD matrix...".to_owned(),
        Status::Requesting(Operation::Trip) => "Processing trip...".to_owned(),
        Status::MatrixReady => "OD matrix computed.".to_owned(),
        Status::TripReady {
            distance_m,
            duration_s,
        } => format!(
            "Trip computed. Total distance: {} km. Total duration: {} h.",
            format_distance_km(*distance_m),
            format_duration_hours(*duration_s)
        ),
        Status::Failed { operation, failure } => failure_text(*operation, failure),
    }
}

fn failure_text(operation: Operation, failure: &Failure) -> String {
    let noun = match operation {
        Operation::Matrix => "matrix",
        Operation::Trip => "trip",
    };

    match failure {
        Failure::InsufficientPoints { required } => {
            format!("At least {required} stops are needed for the {noun}.")
        }
        Failure::Upstream(message) => format!("Routing error ({noun}): {message}"),
        Failure::Network => format!("Failed to fetch the {noun}."),
    }
}

pub fn stops_list_html(store: &WaypointStore) -> String {
    store
        .iter()
        .enumerate()
        .map(|(idx, w)| {
            format!(
                "<li class=\"stop-item\">Stop {}: ({:.5}, {:.5})</li>",
                idx + 1,
                w.latitude(),
                w.longitude()
            )
        })
        .join("")
}

pub fn matrix_table_html(matrix: &MatrixResult) -> String {
    let header = (1..=matrix.size())
        .map(|j| format!("<th>{j}</th>"))
        .join("");
    let rows = matrix
        .durations
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cells = row
                .iter()
                .map(|v| format!("<td>{}</td>", matrix_cell(*v)))
                .join("");
            format!("<tr><th>{}</th>{cells}</tr>", i + 1)
        })
        .join("");

    format!("<table class=\"matrix-table\"><tr><th></th>{header}</tr>{rows}</table>")
}

fn trip_lines(trip: &TripResult) -> impl Iterator<Item = String> + '_ {
    trip.stops.iter().map(|s| {
        format!(
            "Visit Stop {} ({:.5}, {:.5})",
            s.original_index + 1,
            s.location.y,
            s.location.x
        )
    })
}

pub fn trip_order_html(trip: &TripResult) -> String {
    trip_lines(trip).map(|l| format!("<li>{l}</li>")).join("")
}

pub fn trip_order_text(trip: &TripResult) -> String {
    trip_lines(trip).join("\n")
}

pub fn matrix_table_text(matrix: &MatrixResult) -> String {
    let header = (1..=matrix.size()).map(|j| format!("{j:>8}")).join("");
    let rows = matrix.durations.iter().enumerate().map(|(i, row)| {
        let cells = row
            .iter()
            .map(|v| format!("{:>8}", matrix_cell(*v)))
            .join("");
        format!("{:>4}{cells}", i + 1)
    });

    std::iter::once(format!("{:>4}{header}", ""))
        .chain(rows)
        .join("\n")
}
