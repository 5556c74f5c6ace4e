use clap::Parser;
use pluginwatch::Settings;
use pluginwatch::cli::commands::{config, list, serve};
use pluginwatch::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    });

    pluginwatch::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Serve {
            dirs,
            bind,
            watch_interval,
        } => {
            let args = serve::ServeArgs {
                dirs,
                bind,
                watch_interval,
            };
            serve::run(args, settings).await;
        }
        Commands::List { dirs } => list::run(dirs, settings),
        Commands::Config => config::run(&settings),
    }
}
