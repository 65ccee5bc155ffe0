use clap::{Parser, Subcommand};

use stop_planner::{
    app::{self, Operation},
    config::{LatLon, RoutingConfig, ServeConfig},
    routing::{Profile, RoutingClient},
    server,
};

#[derive(Parser)]
#[command(version, about = "Place stops on a map and query an OSRM routing service")]
struct Args {
    #[command(flatten)]
    routing: RoutingConfig,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the interactive map page
    Serve(ServeConfig),
    /// Print the travel-time matrix between the given stops
    Matrix {
        /// Stop as LAT,LON; repeat in visiting order
        #[arg(long = "stop", required = true, allow_hyphen_values = true)]
        stops: Vec<LatLon>,
    },
    /// Print the optimized round-trip visiting order
    Trip {
        /// Stop as LAT,LON; repeat in visiting order
        #[arg(long = "stop", required = true, allow_hyphen_values = true)]
        stops: Vec<LatLon>,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    args.routing.log();

    let client = RoutingClient::connect(&args.routing.base_url, args.routing.timeout())?;
    let profile = args.routing.profile;

    match args.command {
        Command::Serve(config) => {
            config.log();
            server::serve(client, profile, &config).await
        }
        Command::Matrix { stops } => one_shot(&client, profile, stops, Operation::Matrix).await,
        Command::Trip { stops } => one_shot(&client, profile, stops, Operation::Trip).await,
    }
}

async fn one_shot(
    client: &RoutingClient,
    profile: Profile,
    stops: Vec<LatLon>,
    operation: Operation,
) -> anyhow::Result<()> {
    let stops: Vec<_> = stops.into_iter().map(|s| s.0).collect();
    let output = app::run_once(client, profile, &stops, operation).await?;
    println!("{output}");

    Ok(())
}
