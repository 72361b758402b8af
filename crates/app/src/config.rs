use clap::{Args, Parser, Subcommand};
use neuromesh_engine::ServiceKind;

#[derive(Parser)]
#[command(name = "neuromesh")]
#[command(version, about = "NeuroMesh - envelope-driven domain services", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start one service host
    Start(Box<StartConfig>),
    /// List the services this binary can host
    List,
    /// Display version information
    Version,
}

#[derive(Args)]
pub struct StartConfig {
    /// Service to host (treasury, organization, development, market, sales)
    #[arg(long = "service", env = "NEUROMESH_SERVICE")]
    pub service: ServiceKind,

    /// RPC server address
    #[arg(long = "rpc.addr", env = "NEUROMESH_RPC_ADDR", default_value = "0.0.0.0:3000")]
    pub rpc_addr: String,

    /// Enable debug logging
    #[arg(long = "log.debug")]
    pub debug: bool,

    /// Seed for the service's random source (reproducible runs)
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Disable the Prometheus endpoint
    #[arg(long = "metrics.disable")]
    pub metrics_disable: bool,
}
