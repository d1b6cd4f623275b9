//! Local audio device monitor
//!
//! Plays the canonical stream on the default output device, so the operator
//! hears exactly what a transport implementation would send. Samples queue
//! through a lock-free ring between the submitting task and the device
//! callback. The cpal stream is not `Send`, so it lives on a dedicated
//! thread for the sink's lifetime.

use crate::audio::{PcmChunk, CANONICAL_SAMPLE_RATE};
use crate::error::{Error, Result};
use crate::sink::OutgoingSink;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, StreamConfig};
use ringbuf::{traits::*, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Ring capacity in samples: 4 seconds at the canonical rate, above the
/// gate watermark so admitted submissions fit.
const RING_CAPACITY: usize = CANONICAL_SAMPLE_RATE as usize * 4;

/// Monitor sink backed by the default output device.
pub struct DeviceSink {
    producer: Mutex<ringbuf::HeapProd<i16>>,
    error_flag: Arc<AtomicBool>,
    overruns: AtomicU64,
    shutdown_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl DeviceSink {
    /// Open the default output device at the canonical rate.
    ///
    /// # Errors
    /// - No output device available
    /// - Device does not support 48 kHz
    /// - Stream construction or start failure
    pub fn new() -> Result<Self> {
        let ring = HeapRb::<i16>::new(RING_CAPACITY);
        let (producer, consumer) = ring.split();

        let error_flag = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let flag = Arc::clone(&error_flag);
        let handle = thread::spawn(move || {
            stream_owner(consumer, flag, ready_tx, shutdown_rx);
        });

        // The owner thread reports whether the stream came up
        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(Error::AudioOutput(
                    "Audio monitor thread exited before starting".to_string(),
                ));
            }
        }

        Ok(Self {
            producer: Mutex::new(producer),
            error_flag,
            overruns: AtomicU64::new(0),
            shutdown_tx: Some(shutdown_tx),
            thread: Some(handle),
        })
    }
}

impl OutgoingSink for DeviceSink {
    fn buffered_duration(&self) -> f64 {
        let producer = self.producer.lock().unwrap();
        producer.occupied_len() as f64 / CANONICAL_SAMPLE_RATE as f64
    }

    fn submit(&self, chunk: PcmChunk) -> Result<()> {
        if self.error_flag.load(Ordering::SeqCst) {
            return Err(Error::AudioOutput(
                "Audio stream reported an error".to_string(),
            ));
        }

        let mut producer = self.producer.lock().unwrap();
        let pushed = producer.push_slice(&chunk.samples);

        // The gate keeps occupancy below the watermark, so a full ring means
        // something upstream is misconfigured; drop the excess and say so
        if pushed < chunk.samples.len() {
            let dropped = (chunk.samples.len() - pushed) as u64;
            let total = self.overruns.fetch_add(dropped, Ordering::Relaxed) + dropped;
            warn!(
                "Audio monitor ring overrun, dropped {} samples (total: {})",
                dropped, total
            );
        }

        Ok(())
    }
}

impl Drop for DeviceSink {
    fn drop(&mut self) {
        // Closing the channel wakes the owner thread, which drops the stream
        self.shutdown_tx.take();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("Audio monitor thread panicked");
            }
        }
    }
}

/// Body of the dedicated audio thread; owns the cpal stream until shutdown.
fn stream_owner(
    consumer: ringbuf::HeapCons<i16>,
    error_flag: Arc<AtomicBool>,
    ready_tx: mpsc::Sender<Result<()>>,
    shutdown_rx: mpsc::Receiver<()>,
) {
    let stream = match build_device_stream(consumer, error_flag) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(Error::AudioOutput(format!(
            "Failed to start stream: {}",
            e
        ))));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    // Park until the sink is dropped; the stream dies with this thread
    let _ = shutdown_rx.recv();
    debug!("Audio monitor thread shutting down");
}

fn build_device_stream(
    consumer: ringbuf::HeapCons<i16>,
    error_flag: Arc<AtomicBool>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();

    let device = host
        .default_output_device()
        .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;

    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("Using default audio device: {}", name);

    let (config, sample_format) = monitor_config(&device)?;
    info!(
        "Audio monitor: {} Hz, {} channels, {:?} samples",
        config.sample_rate.0, config.channels, sample_format
    );

    match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, consumer, error_flag),
        SampleFormat::I16 => build_stream::<i16>(&device, &config, consumer, error_flag),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, consumer, error_flag),
        sample_format => Err(Error::AudioOutput(format!(
            "Unsupported sample format: {:?}",
            sample_format
        ))),
    }
}

/// Pick a device configuration running at the canonical rate.
fn monitor_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
    let mut supported = device
        .supported_output_configs()
        .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

    let usable = supported.find(|config| {
        config.min_sample_rate().0 <= CANONICAL_SAMPLE_RATE
            && config.max_sample_rate().0 >= CANONICAL_SAMPLE_RATE
    });

    match usable {
        Some(config) => {
            let sample_format = config.sample_format();
            let config = config
                .with_sample_rate(cpal::SampleRate(CANONICAL_SAMPLE_RATE))
                .config();
            Ok((config, sample_format))
        }
        // The monitor plays the canonical stream as-is; no second
        // resample stage behind the sink
        None => Err(Error::AudioOutput(format!(
            "Output device does not support {} Hz",
            CANONICAL_SAMPLE_RATE
        ))),
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut consumer: ringbuf::HeapCons<i16>,
    error_flag: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    // Underrun fills silence
                    let sample = consumer.try_pop().unwrap_or(0);
                    let value = T::from_sample(sample as f32 / 32768.0);
                    for slot in frame.iter_mut() {
                        *slot = value;
                    }
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                error_flag.store(true, Ordering::SeqCst);
            },
            None, // No timeout
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

    Ok(stream)
}
