//! depstrap binary entry point.

#![allow(clippy::print_stderr)]

use depstrap::cli::{self, Commands, EXIT_FAILURE, EXIT_OK};
use depstrap::provision::Provisioner;

fn main() {
    // Tracing may be corrupted during a panic; eprintln is the reliable path.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.level.as_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: failed to create tokio runtime: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    // `setup` is the only subcommand and the default.
    let Commands::Setup = cli.command.unwrap_or(Commands::Setup);

    let exit_code = match rt.block_on(run(&cli.config)) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            let code = cli::exit_code_for(&err);
            cli::render_error(err);
            code
        }
    };
    std::process::exit(exit_code);
}

async fn run(config: &std::path::Path) -> depstrap::Result<()> {
    let provisioner = Provisioner::new(config)?;
    provisioner.run().await?;
    Ok(())
}
