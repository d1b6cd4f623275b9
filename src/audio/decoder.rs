//! Audio decoding using symphonia
//!
//! Opens a single audio file (MP3, FLAC, AAC, Vorbis, WAV, ...) and yields
//! its default track as a lazy, finite sequence of interleaved f32 chunks.
//! The sequence is not restartable; dropping the decoder releases the file.

use crate::audio::types::{DecodedChunk, SourceSpec};
use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Streaming decoder for one audio file.
pub struct FileDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    spec: SourceSpec,
}

impl FileDecoder {
    /// Open an audio file and prepare to decode its default track.
    ///
    /// # Errors
    /// - Failed to open file
    /// - Unsupported or unrecognized container/codec
    /// - Stream missing sample rate or channel count
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening audio file: {}", path.display());

        let file = std::fs::File::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Hint the format registry with the file extension
        let mut hint = Hint::new();
        if let Some(extension) = path.extension() {
            if let Some(ext_str) = extension.to_str() {
                hint.with_extension(ext_str);
            }
        }

        let format_opts = FormatOptions::default();
        let metadata_opts = MetadataOptions::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let format = probed.format;

        // Use the first track with a recognized codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let channels = codec_params
            .channels
            .map(|c| c.count())
            .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

        // Duration is known only when the container declares a frame count
        let duration_ms = codec_params
            .n_frames
            .map(|frames| frames * 1000 / sample_rate as u64);

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        debug!(
            "Audio format: sample_rate={}, channels={}, duration_ms={:?}",
            sample_rate, channels, duration_ms
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            spec: SourceSpec {
                channels,
                sample_rate,
                duration_ms,
            },
        })
    }

    /// Stream parameters of the opened track.
    pub fn spec(&self) -> SourceSpec {
        self.spec
    }

    /// Decode the next packet into interleaved f32 samples.
    ///
    /// Returns `Ok(None)` at end of stream. Packets that fail to decode are
    /// logged and skipped; packets belonging to other tracks are ignored.
    pub fn next_chunk(&mut self) -> Result<Option<DecodedChunk>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of stream");
                    return Ok(None);
                }
                Err(e) => {
                    // Truncated or corrupt remainder; end the track here
                    warn!("Error reading packet, ending stream: {}", e);
                    return Ok(None);
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let frames = decoded.frames();
                    if frames == 0 {
                        continue;
                    }

                    let mut sample_buf = SampleBuffer::<f32>::new(frames as u64, *decoded.spec());
                    sample_buf.copy_interleaved_ref(decoded);

                    return Ok(Some(DecodedChunk {
                        samples: sample_buf.samples().to_vec(),
                        frames,
                    }));
                }
                Err(e) => {
                    warn!("Decode error, skipping packet: {}", e);
                    continue;
                }
            }
        }
    }
}
