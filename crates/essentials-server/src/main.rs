mod config;
mod plugin_manager;
mod sandbox;

use std::time::Duration;

use config::ServerConfig;
use essentials_plugin::EssentialsPlugin;
use sandbox::Sandbox;
use tokio::io::AsyncBufReadExt;
use tracing::info;

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

#[tokio::main]
async fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "server.toml".into());
    let config = match ServerConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "{} (essentials-server v{}) starting",
        config.server.name,
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "Worlds: {} (default {})",
        config.world.worlds.join(", "),
        config.world.default_world
    );

    let mut sandbox = Sandbox::new(&config);
    sandbox.register_plugin(Box::new(EssentialsPlugin::new()));
    print_lines(sandbox.start());
    info!("Type help for console commands");

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut tick_interval = tokio::time::interval(Duration::from_millis(50));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                print_lines(sandbox.tick());
            }
            Some(line) = console_rx.recv() => {
                print_lines(sandbox.handle_console_line(&line));
                if sandbox.is_stopping() {
                    break;
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Saving data before shutdown...");
    sandbox.shutdown();
    info!("Server shut down.");
}
