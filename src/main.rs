//! zonal-sim entry point: CLI wiring, logging and server startup.

use std::process;
use std::sync::Arc;

use log::{error, info};
use tokio_util::sync::CancellationToken;

use zonal_sim::api::{self, AppState};
use zonal_sim::cli::{parse_args, print_usage};
use zonal_sim::config::AppConfig;

fn init_logger(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn load_config() -> AppConfig {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            print_usage();
            process::exit(1);
        }
    };
    if cli.help {
        print_usage();
        process::exit(0);
    }

    // --config takes priority, then built-in defaults
    let mut cfg = match cli.config.as_deref() {
        Some(path) => match AppConfig::from_toml_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => AppConfig::default(),
    };
    cli.apply(&mut cfg);

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    cfg
}

#[tokio::main]
async fn main() {
    let cfg = load_config();
    init_logger(&cfg.logging.level);
    info!("starting zonal controller simulator");

    let shutdown = CancellationToken::new();
    let state = match AppState::from_config(&cfg, shutdown.clone()) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("failed to initialize services: {e}");
            process::exit(1);
        }
    };
    let addr = match cfg.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received shutdown signal, shutting down gracefully"),
            Err(e) => {
                error!("failed to listen for shutdown signal: {e}");
                return;
            }
        }
        signal_token.cancel();
    });

    if let Err(e) = api::serve(state, addr, shutdown).await {
        error!("server error: {e}");
        process::exit(1);
    }
    info!("zonal controller simulator stopped");
}
