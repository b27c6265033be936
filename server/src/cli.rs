use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::coordinates::CoordinateSource;
use crate::repos::readings::Bucket;
use crate::tomtom::TOMTOM_BASE_URL;

#[derive(Debug, Parser)]
#[command(about = "Traffic congestion collector.")]
pub struct Cli {
    #[arg(env = "TRAFFIC_DATABASE_PATH", short, long, default_value = "traffic_data.db")]
    pub database_path: PathBuf,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the flow API for every coordinate, store and publish the readings.
    Collect(CollectArgs),
    /// Fetch a single point and print the resulting reading.
    Probe(ProbeArgs),
    /// Print mean congestion per time bucket from the stored readings.
    History {
        #[arg(long, default_value = "minute")]
        bucket: Bucket,
    },
    /// Print the most recent stored readings.
    Recent {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Print every stored reading as JSON lines.
    Export,
    Db(DbCommand),
}

#[derive(Debug, Parser)]
pub struct ApiArgs {
    #[arg(env = "TRAFFIC_TOMTOM_API_KEY", long, hide_env_values = true)]
    pub api_key: String,
    #[arg(env = "TRAFFIC_TOMTOM_BASE_URL", long, default_value = TOMTOM_BASE_URL)]
    pub api_base_url: String,
    /// Upper bound for a single request, in seconds
    #[arg(
        env = "TRAFFIC_FETCH_TIMEOUT_SECS",
        long,
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Parser)]
pub struct CollectArgs {
    #[command(flatten)]
    pub api: ApiArgs,
    /// `grid`, `landmarks`, or the path of a JSON coordinates file
    #[arg(env = "TRAFFIC_COORDINATES", long, default_value = "grid")]
    pub coordinates: CoordinateSource,
    /// Number of cycles to run, 0 to run until interrupted
    #[arg(env = "TRAFFIC_ITERATIONS", long, default_value_t = 20)]
    pub iterations: u32,
    /// Pause between two cycles, in seconds
    #[arg(env = "TRAFFIC_INTERVAL_SECS", long, default_value_t = 10)]
    pub interval_secs: u64,
    /// Number of batches kept in memory for trends
    #[arg(env = "TRAFFIC_HISTORY_WINDOW", long, default_value_t = 60)]
    pub history_window: usize,
    /// Serve the dashboard API on this address
    #[arg(env = "TRAFFIC_SERVER_ADDRESS", long)]
    pub serve: Option<SocketAddr>,
}

#[derive(Debug, Parser)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub api: ApiArgs,
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: f64,
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Debug, Parser)]
pub struct DbCommand {
    #[command(subcommand)]
    pub cmd: DbSubCommand,
}

#[derive(Debug, Subcommand)]
pub enum DbSubCommand {
    /// Create the readings table if it does not exist
    Init,
    /// Drop every stored reading
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_defaults() {
        let cli = Cli::try_parse_from(["trafficpulse", "collect", "--api-key", "k"]).unwrap();
        let Command::Collect(args) = cli.cmd else {
            panic!("expected collect");
        };
        assert_eq!(args.api.api_key, "k");
        assert_eq!(args.api.api_base_url, TOMTOM_BASE_URL);
        assert_eq!(args.coordinates, CoordinateSource::Grid);
        assert_eq!(args.api.fetch_timeout_secs, 5);
        assert_eq!(args.iterations, 20);
        assert_eq!(args.interval_secs, 10);
        assert_eq!(args.serve, None);
    }

    #[test]
    fn test_collect_options() {
        let cli = Cli::try_parse_from([
            "trafficpulse",
            "--database-path",
            "/tmp/t.db",
            "collect",
            "--api-key",
            "k",
            "--coordinates",
            "points.json",
            "--iterations",
            "0",
            "--serve",
            "127.0.0.1:8080",
        ])
        .unwrap();
        assert_eq!(cli.database_path, PathBuf::from("/tmp/t.db"));
        let Command::Collect(args) = cli.cmd else {
            panic!("expected collect");
        };
        assert_eq!(
            args.coordinates,
            CoordinateSource::File(PathBuf::from("points.json"))
        );
        assert_eq!(args.iterations, 0);
        assert_eq!(args.serve, Some("127.0.0.1:8080".parse().unwrap()));
    }

    #[test]
    fn test_zero_fetch_timeout_is_rejected() {
        let parse = |timeout: &str| {
            Cli::try_parse_from([
                "trafficpulse",
                "probe",
                "--api-key",
                "k",
                "--latitude",
                "19.0",
                "--longitude",
                "72.8",
                "--fetch-timeout-secs",
                timeout,
            ])
        };
        assert!(parse("0").is_err());
        let Command::Probe(args) = parse("1").unwrap().cmd else {
            panic!("expected probe");
        };
        assert_eq!(args.api.fetch_timeout_secs, 1);
    }

    #[test]
    fn test_history_bucket() {
        let cli = Cli::try_parse_from(["trafficpulse", "history", "--bucket", "hour"]).unwrap();
        assert!(matches!(cli.cmd, Command::History { bucket: Bucket::Hour }));
        assert!(Cli::try_parse_from(["trafficpulse", "history", "--bucket", "week"]).is_err());
    }
}
