use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::runtime::Builder;
use tokio::sync::{broadcast, mpsc};

use sdn_forwarding::network::WeightTable;
use sdn_forwarding::{ChannelDevice, Controller, ControllerConfig, Event};

#[derive(Parser)]
#[command(name = "sdn_forwarding")]
struct Cli {
    /// JSON controller configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Link weight file (`switch_a switch_b weight` per line).
    #[arg(long)]
    weights: Option<PathBuf>,

    #[arg(long)]
    l3_matching: bool,

    #[arg(long)]
    idle_timeout: Option<u16>,

    /// JSON-lines event stream; stdin when omitted.
    #[arg(long)]
    events: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level.as_str()),
    )
    .init();

    let mut config = match &cli.config {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(weights) = cli.weights {
        config.weights_file = Some(weights);
    }
    if cli.l3_matching {
        config.l3_matching = true;
    }
    if let Some(idle_timeout) = cli.idle_timeout {
        config.idle_timeout_secs = idle_timeout;
    }

    let weights = config.load_weights()?;
    info!(
        "Forwarding coming up (idle timeout {}s, l3 matching {})",
        config.idle_timeout_secs, config.l3_matching
    );

    let rt = Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(run(config, weights, cli.events))
}

async fn run(config: ControllerConfig, weights: WeightTable, events: Option<PathBuf>) -> Result<()> {
    let (device, mut commands) = ChannelDevice::new();
    let mut controller = Controller::new(&config, weights, device);
    let mut notifications = controller.subscribe();
    let (tx, mut rx) = mpsc::channel::<Event>(1024);

    // One worker owns every piece of controller state; events are applied in order.
    let worker = tokio::spawn(async move {
        let mut handled = 0u64;
        while let Some(event) = rx.recv().await {
            controller.handle(event);
            handled += 1;
        }
        info!("Event stream closed after {} events", handled);
    });

    let printer = tokio::spawn(async move {
        let mut commands_open = true;
        let mut notifications_open = true;

        while commands_open || notifications_open {
            tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(command) => emit(&command),
                    None => commands_open = false,
                },
                notification = notifications.recv(), if notifications_open => match notification {
                    Ok(notification) => emit(&notification),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Notification output lagging, skipped {}", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => notifications_open = false,
                },
            }
        }
    });

    let input: Box<dyn AsyncRead + Unpin + Send> = match &events {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };
    let mut lines = BufReader::new(input).lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match serde_json::from_str::<Event>(line) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    error!("Event worker stopped, abandoning input");
                    break;
                }
            }
            Err(e) => warn!("Skipping malformed event on line {}: {}", line_no, e),
        }
    }

    drop(tx);
    worker.await?;
    printer.await?;
    Ok(())
}

fn emit<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => error!("Failed to serialize output: {}", e),
    }
}
