use clap::Parser;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsrooms::event::{CLOSE, ERROR, JOINED, LEFT, OPEN};
use wsrooms::{connect_with, ClientConfig, ClientError, RoomHandle};

/// Join rooms on a wsrooms peer and log everything that happens in them
#[derive(Parser, Debug)]
#[command(name = "wsrooms", version)]
struct Args {
    /// Peer URL; defaults to WSROOMS_URL
    #[arg(long)]
    url: Option<String>,

    /// Room to join once connected (repeatable)
    #[arg(long = "room")]
    rooms: Vec<String>,

    /// Message sent to every room once it opens
    #[arg(long)]
    message: Option<String>,

    /// How long to wait for each handshake, in milliseconds
    #[arg(long)]
    open_timeout_ms: Option<u64>,
}

fn load_config(args: &Args) -> Result<ClientConfig, ClientError> {
    let mut config = match &args.url {
        Some(url) => ClientConfig::new(url.clone()),
        None => ClientConfig::from_env()?,
    };
    if let Some(millis) = args.open_timeout_ms {
        config = config.with_open_timeout(Duration::from_millis(millis));
    }
    Ok(config)
}

fn log_room_events(room: &RoomHandle) {
    let name = room.name().to_string();
    room.on(JOINED, {
        let name = name.clone();
        move |peer| info!(room = %name, peer = %peer, "Peer joined")
    });
    room.on(LEFT, {
        let name = name.clone();
        move |peer| info!(room = %name, peer = %peer, "Peer left")
    });
    room.on(CLOSE, move |_| info!(room = %name, "Room closed"));
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wsrooms=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };

    let connection = match connect_with(&config).await {
        Ok(connection) => connection,
        Err(e) => {
            error!(error = %e, "Could not connect");
            std::process::exit(1);
        }
    };

    connection.on(ERROR, |e| warn!(error = %e, "Transport error"));
    connection.on(OPEN, |_| info!("Connection open"));

    if let Err(e) = connection.wait_open(config.open_timeout).await {
        error!(error = %e, "Root handshake did not complete");
        connection.close();
        std::process::exit(1);
    }
    info!(self_id = ?connection.self_id(), "Connected");

    for name in &args.rooms {
        let Some(room) = connection.join(name) else {
            warn!(room = %name, "Join refused");
            continue;
        };
        log_room_events(&room);

        match room.wait_open(config.open_timeout).await {
            Ok(()) => {
                info!(room = %name, room_id = ?room.id(), "Room open");
                if let Some(message) = &args.message {
                    room.send("message", Value::String(message.clone()));
                }
            }
            Err(e) => warn!(room = %name, error = %e, "Room did not open"),
        }
    }

    let (closed_tx, closed_rx) = tokio::sync::oneshot::channel::<()>();
    let closed_tx = std::sync::Mutex::new(Some(closed_tx));
    connection.once(CLOSE, move |_| {
        if let Some(tx) = closed_tx.lock().ok().and_then(|mut tx| tx.take()) {
            let _ = tx.send(());
        }
    });
    if !connection.is_open() {
        info!("Connection closed by peer");
        return;
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, closing connection");
            connection.close();
        }
        _ = closed_rx => info!("Connection closed by peer"),
    }
}
