use std::{env, io, num::ParseIntError, sync::Arc};

use colored::Colorize;
use log::{error, info, warn};
use songvote_collab::{Collab, Database, DatabaseError, MemoryDatabase, PgDatabase};
use songvote_core::{Config, ConfigError};
use songvote_server::{run_server, server_port};
use thiserror::Error;
use tokio::runtime;

mod logging;

#[derive(Debug, Error)]
enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("SONGVOTE_SERVER_PORT is not a valid port: {0}")]
    Port(#[from] ParseIntError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Server stopped: {0}")]
    Server(#[from] io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl StartupError {
    fn hint(&self) -> String {
        match self {
            StartupError::Config(_) => "Check the SONGVOTE_* environment variables. Numbers must be whole and positive.".to_string(),
            StartupError::Port(_) => "SONGVOTE_SERVER_PORT must be a number between 1 and 65535, or unset to use the default.".to_string(),
            StartupError::Database(_) => "This is a database error. Make sure SONGVOTE_DATABASE_URL points to a running PostgreSQL instance the user can create tables in, then try again.".to_string(),
            StartupError::Server(_) => "The server could not listen or stopped unexpectedly. Make sure the port is not already in use.".to_string(),
            StartupError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn start() -> Result<(), StartupError> {
    let config = Config::from_env()?;
    let port = server_port()?;

    if config.youtube_api_key.is_none() {
        warn!("SONGVOTE_YOUTUBE_API_KEY is not set, video search is unavailable");
    }

    info!("Building async runtime...");
    let main_runtime = runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("songvote-async")
        .build()
        .map_err(|e| StartupError::Fatal(e.to_string()))?;

    main_runtime.block_on(async move {
        let database = connect().await?;
        let collab = Arc::new(Collab::new(config, database));

        collab.spawn_refresh();
        info!("Initialized successfully.");

        run_server(collab, port).await?;
        Ok(())
    })
}

async fn connect() -> Result<Arc<dyn Database>, StartupError> {
    match env::var("SONGVOTE_DATABASE_URL") {
        Ok(url) => {
            info!("Connecting to database...");
            Ok(Arc::new(PgDatabase::new(&url).await?))
        }
        Err(_) => {
            warn!("SONGVOTE_DATABASE_URL is not set, songs and votes are only kept in memory");
            Ok(Arc::new(MemoryDatabase::new()))
        }
    }
}

fn main() {
    logging::init_logger();

    if let Err(error) = start() {
        error!("{} Read the error below to troubleshoot the issue. If you think this might be a bug, please report it by making a GitHub issue.", "songvote failed to start!".bold().red());
        error!("{}", error);
        error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());
    }
}
