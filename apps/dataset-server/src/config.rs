use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;

pub const DEFAULT_SEED_RECORDS: usize = 100_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub seed_records: usize,
    pub log_filter: String,
}

#[derive(Debug, Parser)]
#[command(
    name = "dataset-server",
    author,
    version,
    about = "Paginated dataset service backed by an in-memory table"
)]
pub struct Cli {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "DATASET_LISTEN_ADDR", default_value = "127.0.0.1:8000")]
    pub listen_addr: String,

    /// Rows generated at startup and on every `init_db` call.
    #[arg(long, env = "DATASET_SEED_RECORDS", default_value_t = DEFAULT_SEED_RECORDS)]
    pub seed_records: usize,

    /// Tracing filter directive.
    #[arg(long, env = "DATASET_LOG", default_value = "info")]
    pub log: String,
}

impl TryFrom<Cli> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let listen_addr: SocketAddr = cli
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address: {}", cli.listen_addr))?;
        Ok(ServerConfig {
            listen_addr,
            seed_records: cli.seed_records,
            log_filter: cli.log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "dataset-server",
            "--listen-addr",
            "0.0.0.0:9000",
            "--seed-records",
            "50",
        ])
        .unwrap();
        let config = ServerConfig::try_from(cli).unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.seed_records, 50);
    }

    #[test]
    fn rejects_bad_listen_addr() {
        let cli = Cli::try_parse_from(["dataset-server", "--listen-addr", "nowhere"]).unwrap();
        let err = ServerConfig::try_from(cli).unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }
}
