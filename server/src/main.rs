use clap::Parser;
use cli::{Cli, Command, DbSubCommand};
use config::Config;

mod cli;
mod collector;
mod config;
mod congestion;
mod coordinates;
mod db;
mod error;
mod history;
mod repos;
mod retry;
mod server;
mod store;
mod tomtom;
mod tools;
mod weather;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    run(Cli::parse()).await
}

/// Store and weather settings are only read by the commands that use them.
async fn run(args: Cli) -> anyhow::Result<()> {
    match args.cmd {
        Command::Collect(collect_args) => {
            let config = Config::from_env()?;
            tools::collect::exec(&args.database_path, &config, collect_args).await
        }
        Command::Probe(probe_args) => {
            let config = Config::from_env()?;
            tools::probe::exec(&config, probe_args).await
        }
        Command::History { bucket } => tools::history::trend(&args.database_path, bucket),
        Command::Recent { limit } => tools::history::recent(&args.database_path, limit),
        Command::Export => tools::history::export(&args.database_path),
        Command::Db(db_cmd) => {
            let config = Config::from_env()?;
            let store = store::ReadingStore::open(&args.database_path, &config.store)?;
            match db_cmd.cmd {
                DbSubCommand::Init => {
                    println!("Database ready at {}", args.database_path.display());
                }
                DbSubCommand::Reset => {
                    store.reset()?;
                    println!("Database reset at {}", args.database_path.display());
                }
            }
            store.close()
        }
    }
}
