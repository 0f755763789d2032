//! roost-demo: every kind of roost parameter in one small application.
//!
//! ```text
//! roost-demo foo 1 -f toto --tags a b --meta '{"k": 1}'
//! roost-demo derived --pg-host db.internal
//! roost-demo -q sub --test bar x
//! ROOST_FORMATTER=plain roost-demo --help
//! ```
//!
//! Set `RUST_LOG=debug` to see dispatch decisions on stderr.

mod commands;

use roost::{Cli, CliConfig};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let tree = commands::tree()?;
    let cli = Cli::builder(tree).config(CliConfig::from_env()).build();
    std::process::exit(cli.run());
}
