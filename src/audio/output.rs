use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use log::{debug, warn};

use crate::error::AudioError;
use crate::models::PlayableBuffer;

/// Capability seam over the platform audio output.
///
/// The controller enforces the single-live-session rule; an output only knows
/// how to turn one buffer into sound.
pub trait AudioOutput: Send + Sync {
    /// Start producing audio from the buffer and return a handle to the
    /// running source.
    fn begin(&self, buffer: Arc<PlayableBuffer>) -> Result<Box<dyn SourceHandle>, AudioError>;
}

/// Handle to one running audio source
pub trait SourceHandle: Send {
    /// Halt output immediately. Idempotent.
    fn stop(&mut self);

    /// True once the source has played the whole buffer or was stopped
    fn is_finished(&self) -> bool;
}

/// Real audio output backed by cpal's default host device.
///
/// Each `begin` spawns a dedicated thread that owns the cpal stream (streams
/// are not `Send`) and tears it down when the source drains or is stopped.
pub struct CpalOutput;

impl CpalOutput {
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        host.default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        Ok(Self)
    }
}

impl Default for CpalOutput {
    fn default() -> Self {
        Self
    }
}

struct CpalSourceHandle {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl SourceHandle for CpalSourceHandle {
    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl AudioOutput for CpalOutput {
    fn begin(&self, buffer: Arc<PlayableBuffer>) -> Result<Box<dyn SourceHandle>, AudioError> {
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), AudioError>>();

        let thread_stop = Arc::clone(&stop);
        let thread_finished = Arc::clone(&finished);

        thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                run_output_thread(buffer, thread_stop, thread_finished, ready_tx);
            })
            .map_err(|e| {
                AudioError::InitializationFailed(format!("Failed to create audio thread: {}", e))
            })?;

        // Wait for the stream to start (or fail) before handing out the handle
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalSourceHandle { stop, finished })),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AudioError::InitializationFailed(
                "Audio thread exited before reporting readiness".to_string(),
            )),
        }
    }
}

fn run_output_thread(
    buffer: Arc<PlayableBuffer>,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    ready_tx: mpsc::Sender<Result<(), AudioError>>,
) {
    let host = cpal::default_host();
    let device = match host.default_output_device() {
        Some(device) => device,
        None => {
            let _ = ready_tx.send(Err(AudioError::NoOutputDevice));
            return;
        }
    };

    let out_channels = device
        .default_output_config()
        .map(|c| c.channels())
        .unwrap_or(2)
        .max(1);

    let config = StreamConfig {
        channels: out_channels,
        sample_rate: SampleRate(buffer.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let cursor = Arc::new(AtomicUsize::new(0));
    let drained = Arc::new(AtomicBool::new(false));
    let cb_buffer = Arc::clone(&buffer);
    let cb_cursor = Arc::clone(&cursor);
    let cb_drained = Arc::clone(&drained);
    let channels = out_channels as usize;

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let src_channels = cb_buffer.channel_data.len();
            for frame in data.chunks_mut(channels) {
                let idx = cb_cursor.fetch_add(1, Ordering::Relaxed);
                if idx >= cb_buffer.frames || src_channels == 0 {
                    cb_drained.store(true, Ordering::SeqCst);
                    for sample in frame.iter_mut() {
                        *sample = 0.0;
                    }
                    continue;
                }
                // Mono fans out to every device channel; extra source
                // channels wrap around
                for (ch, sample) in frame.iter_mut().enumerate() {
                    *sample = cb_buffer.channel_data[ch % src_channels][idx];
                }
            }
        },
        |err| warn!("Audio stream error: {}", err),
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(cpal::BuildStreamError::StreamConfigNotSupported) => {
            let _ = ready_tx.send(Err(AudioError::UnsupportedSampleRate {
                rate: buffer.sample_rate,
            }));
            return;
        }
        Err(e) => {
            let _ = ready_tx.send(Err(AudioError::StreamError(e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(AudioError::StreamError(e.to_string())));
        return;
    }
    let _ = ready_tx.send(Ok(()));
    debug!(
        "Audio source started: {} frames at {} Hz",
        buffer.frames, buffer.sample_rate
    );

    while !stop.load(Ordering::SeqCst) && !drained.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(5));
    }

    if drained.load(Ordering::SeqCst) && !stop.load(Ordering::SeqCst) {
        // Let the device play out its last buffered frames
        thread::sleep(Duration::from_millis(50));
    }

    finished.store(true, Ordering::SeqCst);
    drop(stream);
    debug!("Audio source stopped");
}
