//! Playback orchestration tests: playlist sequencing, missing-entry
//! skipping, interruption, and looping against an in-memory sink.

mod helpers;

use helpers::{generate_sine_wav_mono_48k, CollectSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use voicecast::config::StreamSettings;
use voicecast::playback::Player;
use voicecast::Playlist;

#[tokio::test]
async fn test_playlist_run_skips_missing_entries() {
    let dir = TempDir::new().unwrap();
    generate_sine_wav_mono_48k(dir.path().join("first.wav"), 250, 440.0, 0.5).unwrap();
    generate_sine_wav_mono_48k(dir.path().join("third.wav"), 250, 880.0, 0.5).unwrap();

    // Comments, blank lines, and a vanished entry in the middle
    let m3u = dir.path().join("list.m3u");
    std::fs::write(
        &m3u,
        "# session playlist\r\nfirst.wav\n\n   \nmissing.wav\nthird.wav\n",
    )
    .unwrap();

    let mut playlist = Playlist::load_from_file(&m3u).unwrap();
    assert_eq!(playlist.len(), 3);

    let sink = Arc::new(CollectSink::default());
    let player = Player::new(
        Arc::clone(&sink),
        StreamSettings::default(),
        false,
        false,
        Arc::new(AtomicBool::new(false)),
    );

    player.run(&mut playlist).await.unwrap();

    // Both real tracks played in full; the missing one was skipped without
    // ending the run. Mono 48 kHz input passes through sample-exact.
    assert_eq!(sink.total_samples(), 24_000);
}

#[tokio::test]
async fn test_preset_shutdown_plays_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("track.wav");
    generate_sine_wav_mono_48k(&path, 500, 440.0, 0.5).unwrap();

    let mut playlist = Playlist::new();
    playlist.add_file(path);

    let shutdown = Arc::new(AtomicBool::new(true));
    let sink = Arc::new(CollectSink::default());
    let player = Player::new(
        Arc::clone(&sink),
        StreamSettings::default(),
        false,
        false,
        shutdown,
    );

    player.run(&mut playlist).await.unwrap();
    assert_eq!(sink.total_samples(), 0);
}

#[tokio::test]
async fn test_loop_replays_until_interrupted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.wav");
    generate_sine_wav_mono_48k(&path, 100, 440.0, 0.5).unwrap();

    let mut playlist = Playlist::new();
    playlist.add_file(path);

    let shutdown = Arc::new(AtomicBool::new(false));
    let sink = Arc::new(CollectSink::default());
    let player = Player::new(
        Arc::clone(&sink),
        StreamSettings::default(),
        true,
        false,
        Arc::clone(&shutdown),
    );

    let handle = tokio::spawn(async move { player.run(&mut playlist).await });

    // One pass is 4800 samples; wait for at least two passes, then interrupt
    let deadline = Instant::now() + Duration::from_secs(10);
    while sink.total_samples() < 9_600 {
        assert!(Instant::now() < deadline, "looping made no progress");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    shutdown.store(true, Ordering::Relaxed);

    handle.await.unwrap().unwrap();
    assert!(sink.total_samples() >= 9_600);
}

#[tokio::test]
async fn test_empty_playlist_returns_immediately() {
    let sink = Arc::new(CollectSink::default());
    let player = Player::new(
        Arc::clone(&sink),
        StreamSettings::default(),
        true,
        true,
        Arc::new(AtomicBool::new(false)),
    );

    let mut playlist = Playlist::new();
    player.run(&mut playlist).await.unwrap();
    assert_eq!(sink.total_samples(), 0);
}
