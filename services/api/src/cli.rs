use crate::demo::{run_nearby, run_seed, NearbyArgs, SeedArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use valuation_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Valuation Desk",
    about = "Run the valuation desk API or inspect its seeded data from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Seed the default roles and permissions and print the resulting catalogue
    Seed(SeedArgs),
    /// Search the demo dataset for valuations around a coordinate
    Nearby(NearbyArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Start with an empty store even when demo seeding is configured
    #[arg(long)]
    pub(crate) no_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed(args) => run_seed(args),
        Command::Nearby(args) => run_nearby(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["valuation-desk"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn nearby_accepts_coordinates_and_radius() {
        let cli = Cli::try_parse_from([
            "valuation-desk",
            "nearby",
            "--latitude",
            "24.7136",
            "--longitude",
            "46.6753",
            "--radius",
            "500",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Nearby(args)) => {
                assert_eq!(args.radius, Some(500));
                assert!((args.latitude - 24.7136).abs() < f64::EPSILON);
            }
            other => panic!("expected nearby command, got {other:?}"),
        }
    }
}
