//! voicecast - Main entry point
//!
//! Streams one audio file, or an .m3u playlist of files, into a voice-chat
//! session as mono 48 kHz 16-bit PCM.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voicecast::config::{effective_volume, SessionParams, StreamSettings};
use voicecast::playback::Player;
use voicecast::sink::{DeviceSink, DiscardSink, OutgoingSink};
use voicecast::Playlist;

/// Command-line arguments for voicecast
#[derive(Parser, Debug)]
#[command(name = "voicecast")]
#[command(about = "Stream audio files into a voice-chat session")]
#[command(version)]
struct Args {
    /// Audio file or .m3u playlist to stream
    #[arg(short, long, env = "VOICECAST_FILE")]
    file: PathBuf,

    /// Server address to connect to
    #[arg(short, long, default_value = "localhost", env = "VOICECAST_ADDRESS")]
    address: String,

    /// Server port
    #[arg(short = 'P', long, default_value = "64738", env = "VOICECAST_PORT")]
    port: u16,

    /// Username to join as
    #[arg(short, long, default_value = "voicecast", env = "VOICECAST_USERNAME")]
    username: String,

    /// Server password
    #[arg(short, long, env = "VOICECAST_PASSWORD")]
    password: Option<String>,

    /// Client certificate file (PEM)
    #[arg(short = 'e', long, env = "VOICECAST_CERTFILE")]
    certfile: Option<PathBuf>,

    /// Client certificate key file (PEM)
    #[arg(short = 'k', long, env = "VOICECAST_KEYFILE")]
    keyfile: Option<PathBuf>,

    /// Channel to stream into
    #[arg(short, long, env = "VOICECAST_CHANNEL")]
    channel: String,

    /// Volume factor, clamped to 0.01..=2.0
    #[arg(short, long, default_value = "1.0", env = "VOICECAST_VOLUME")]
    volume: f32,

    /// Outgoing bandwidth in bits per second
    #[arg(short, long, default_value = "128000", env = "VOICECAST_BANDWIDTH")]
    bandwidth: u32,

    /// Repeat the playlist until interrupted
    #[arg(short = 'l', long = "loop")]
    loop_playlist: bool,

    /// Shuffle the playlist before each pass
    #[arg(short, long)]
    shuffle: bool,

    /// Run the pipeline without an audio device, discarding output
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voicecast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let volume = effective_volume(args.volume);

    let session = SessionParams {
        server: args.address,
        port: args.port,
        username: args.username,
        password: args.password,
        cert_file: args.certfile,
        key_file: args.keyfile,
        channel: args.channel,
        bandwidth: args.bandwidth,
    };
    session
        .validate()
        .context("Invalid session configuration")?;

    if !args.file.exists() {
        anyhow::bail!("File {} does not exist", args.file.display());
    }

    info!(
        "Starting voicecast as {}@{}:{}, channel '{}'",
        session.username, session.server, session.port, session.channel
    );
    info!(
        "Volume {}, bandwidth {} bps, loop: {}, shuffle: {}",
        volume, session.bandwidth, args.loop_playlist, args.shuffle
    );
    if let Some(cert) = &session.cert_file {
        info!("Using client certificate {}", cert.display());
    }

    // A .m3u file is a playlist; anything else is a single track
    let mut playlist = if args
        .file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("m3u"))
    {
        let playlist = Playlist::load_from_file(&args.file)
            .with_context(|| format!("Failed to load playlist {}", args.file.display()))?;
        info!("Playlist loaded with {} items", playlist.len());
        playlist
    } else {
        let mut playlist = Playlist::new();
        playlist.add_file(args.file);
        playlist
    };

    let sink: Arc<dyn OutgoingSink> = if args.dry_run {
        info!("Dry run: output will be discarded");
        Arc::new(DiscardSink::default())
    } else {
        Arc::new(DeviceSink::new().context("Failed to open audio output")?)
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    tokio::spawn(async move {
        shutdown_signal().await;
        flag.store(true, Ordering::Relaxed);
    });

    let settings = StreamSettings {
        gain: Some(volume),
        ..StreamSettings::default()
    };

    let player = Player::new(
        sink,
        settings,
        args.loop_playlist,
        args.shuffle,
        shutdown,
    );
    player.run(&mut playlist).await?;

    info!("Playback complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
