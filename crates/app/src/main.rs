mod config;
mod init;
mod server;

use clap::Parser;
use config::{Cli, Commands};
use neuromesh_engine::ServiceKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Commands::Start(config) => {
            server::init_tracing(config.debug);
            server::start_server(&config).await
        }
        Commands::List => {
            for kind in ServiceKind::ALL {
                println!("{:<14} {}", kind.name(), kind.description());
            }
            Ok(())
        }
        Commands::Version => {
            println!("NeuroMesh v{}", env!("CARGO_PKG_VERSION"));
            println!("Envelope-driven domain services");
            Ok(())
        }
    }
}
