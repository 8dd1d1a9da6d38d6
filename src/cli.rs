use std::env;
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Debug, Default)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub seed: Option<u64>,
    pub help: bool,
}

impl CliOptions {
    /// Applies command-line overrides on top of a loaded configuration.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(address) = &self.address {
            cfg.server.address = address.clone();
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(seed) = self.seed {
            cfg.fuel.seed = Some(seed);
        }
    }
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --config (expected a TOML file path)",
                )?;
                if opts.config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--address" => {
                i += 1;
                let address = args.next_or_err(
                    i,
                    "missing value for --address (expected an IP address)",
                )?;
                opts.address = Some(address.to_string());
            }
            "--port" => {
                i += 1;
                let value = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                let port = value
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{value}\" is not a valid u16"))?;
                opts.port = Some(port);
            }
            "--seed" => {
                i += 1;
                let value = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{value}\" is not a valid u64"))?;
                opts.seed = Some(seed);
            }
            "--help" | "-h" => {
                opts.help = true;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("zonal-sim: zonal controller fuel level and headlight simulator");
    eprintln!();
    eprintln!("Usage: zonal-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>    Load configuration from a TOML file");
    eprintln!("  --address <ip>     Override server.address");
    eprintln!("  --port <u16>       Override server.port (default: 50051)");
    eprintln!("  --seed <u64>       Seed the fuel level noise generator");
    eprintln!("  --help             Show this help message");
}
