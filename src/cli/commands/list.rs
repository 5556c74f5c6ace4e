//! List command - one discovery pass, printed as a JSON array.

use crate::config::Settings;

use crate::cli::args::PluginDirArgs;

/// Discover plugins with the given overrides and render the JSON output.
pub fn render(dirs: &PluginDirArgs, mut config: Settings) -> anyhow::Result<String> {
    dirs.apply(&mut config);
    let urls = config.discovery_config().discover()?;
    Ok(serde_json::to_string_pretty(&urls)?)
}

/// Run the list command.
pub fn run(dirs: PluginDirArgs, config: Settings) {
    match render(&dirs, config) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
