use std::fs::File;

use tracing_subscriber::EnvFilter;

use flickstream::config::Config;
use flickstream::tmdb::TmdbClient;
use flickstream::tui;

#[tokio::main]
async fn main() {
    // Initialize tracing - log to file to not interfere with TUI
    let log_file = File::create("/tmp/flickstream.log").ok();

    if let Some(file) = log_file {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_ansi(false)
            .with_writer(file)
            .init();
    } else {
        // Fallback to stderr if can't create log file
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_target(false)
            .init();
    }

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            if let Ok(path) = Config::config_path() {
                eprintln!("\nConfig file location: {}", path.display());
                eprintln!("\nExample config.toml:");
                eprintln!(
                    r#"
[tmdb]
apikey = "your-api-key"

[browser]
command = "firefox"
"#
                );
            }
            std::process::exit(1);
        }
    };

    let tmdb = match TmdbClient::new(config.tmdb_apikey()) {
        Some(client) => client,
        None => {
            eprintln!("No TMDB API key available.");
            eprintln!("Add one to your config file:");
            eprintln!("\n[tmdb]\napikey = \"your-api-key\"");
            std::process::exit(1);
        }
    };

    if let Err(e) = tui::run(config, tmdb).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
