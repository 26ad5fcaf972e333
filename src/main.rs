mod actions;
mod api;
mod backend;
mod cli;
mod compose;
mod config;
mod logging;
mod page;
mod session;
mod tracker;

use api::client::ApiClient;
use compose::ReplyComposer;
use config::Config;
use log::{error, info};
use page::HeadlessPage;
use session::PageSession;
use std::path::PathBuf;

fn default_config_path() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("inkorg").join("config.toml")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home)
            .join(".config")
            .join("inkorg")
            .join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}

fn print_help_config() {
    println!("Config file: {}", default_config_path().display());
    println!();
    println!("[server]");
    println!("  base_url = \"https://mail.example.se\"   # Required: webmail server serving /api/...");
    println!();
    println!("[reply]");
    println!("  excerpt_chars = 500     # Characters of the original quoted in a reply (default: 500)");
    println!("  attribution = \"skrev\"   # Verb in the quote header \"--- NAME skrev ---\" (default: \"skrev\")");
    println!();
    println!("[frame]");
    println!("  min_content_height = 20 # Content heights at or below this are ignored (default: 20)");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: inkorg [OPTIONS]");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --config=PATH    Use config file at PATH instead of default");
        eprintln!("  --cli            Run in JSON-over-stdin/stdout CLI mode");
        eprintln!("  --help-cli       Print CLI mode protocol documentation");
        eprintln!("  --help-config    Print default config path and all options");
        eprintln!("  --help           Show this help");
        std::process::exit(0);
    }

    if args.iter().any(|a| a == "--help-cli") {
        cli::print_help_cli();
        std::process::exit(0);
    }

    if args.iter().any(|a| a == "--help-config") {
        print_help_config();
        std::process::exit(0);
    }

    logging::init();

    let config_path = args
        .iter()
        .find(|a| a.starts_with("--config="))
        .map(|a| PathBuf::from(&a["--config=".len()..]))
        .unwrap_or_else(default_config_path);

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Error loading config from {}: {}", config_path.display(), e);
            eprintln!("Create a config file with:");
            eprintln!();
            eprintln!("  [server]");
            eprintln!("  base_url = \"https://your-webmail-server\"");
            std::process::exit(1);
        }
    };

    if !args.iter().any(|a| a == "--cli") {
        eprintln!("Nothing to do; pass --cli to start the JSON-lines host (see --help).");
        std::process::exit(2);
    }

    info!("Using server {}", config.server.base_url);
    let client = ApiClient::new(&config.server.base_url);
    let (cmd_tx, resp_rx) = backend::spawn(client);
    let session = PageSession::new(
        HeadlessPage::new(),
        cmd_tx,
        resp_rx,
        ReplyComposer::new(config.reply.excerpt_chars, &config.reply.attribution),
        config.frame.min_content_height,
    );

    cli::run_cli(session);
}
