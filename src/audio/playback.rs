use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{debug, info};
use tokio::task::JoinHandle;

use crate::audio::output::{AudioOutput, SourceHandle};
use crate::audio::wav::{self, DownloadSlot, WavBlob};
use crate::audio::{pcm, OUTPUT_CHANNELS, OUTPUT_SAMPLE_RATE};
use crate::error::DecodeError;
use crate::models::{PlayableBuffer, PlaybackState, PlayerStatus};

/// Position sampling cadence, roughly one tick per display refresh
const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// One live playback session: the running source, its start reference and the
/// position-sampling task
struct PlaybackSession {
    source: Box<dyn SourceHandle>,
    started_at: Instant,
    poll_task: Option<JoinHandle<()>>,
}

struct ControllerInner {
    state: PlaybackState,
    buffer: Option<Arc<PlayableBuffer>>,
    download: DownloadSlot,
    session: Option<PlaybackSession>,
    elapsed: Duration,
}

impl ControllerInner {
    fn new() -> Self {
        Self {
            state: PlaybackState::Idle,
            buffer: None,
            download: DownloadSlot::new(),
            session: None,
            elapsed: Duration::from_secs(0),
        }
    }

    /// Tear down the live session: halt the source, cancel the sampling task,
    /// reset the position. Safe to call when idle and safe to call twice.
    fn cleanup_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.source.stop();
            if let Some(task) = session.poll_task.take() {
                task.abort();
            }
            debug!("Playback session torn down");
        }
        self.elapsed = Duration::from_secs(0);
        self.state = PlaybackState::Idle;
    }

    fn duration(&self) -> Duration {
        self.buffer
            .as_ref()
            .map(|b| b.duration())
            .unwrap_or(Duration::from_secs(0))
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        self.cleanup_session();
        self.download.revoke();
    }
}

/// Owns the single live playback session and all audio state derived from one
/// generation result.
///
/// Cheap to clone; clones share the same state. `load_audio` calls are not
/// queued - the newest call supersedes any in-flight decode, whose result is
/// then discarded via the generation token.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Mutex<ControllerInner>>,
    output: Arc<dyn AudioOutput>,
    generation: Arc<AtomicU64>,
}

impl PlaybackController {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ControllerInner::new())),
            output,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the loaded audio with a freshly decoded payload, or clear it.
    ///
    /// Any live session is torn down first. The decode runs off-thread; if a
    /// newer `load_audio` supersedes this one before it completes, the result
    /// is dropped. A decode failure leaves the controller with no audio.
    pub async fn load_audio(&self, payload: Option<String>) -> Result<(), DecodeError> {
        let token = self.begin_load();

        let Some(payload) = payload else {
            self.clear_audio(token);
            return Ok(());
        };

        let decoded = tokio::task::spawn_blocking(move || decode_payload(&payload))
            .await
            .map_err(|e| DecodeError::DecodeFailed(format!("Decode task failed: {}", e)))?;

        if !self.is_current(token) {
            debug!("Discarding superseded decode result (token {})", token);
            return Ok(());
        }

        match decoded {
            Ok((buffer, blob)) => {
                self.install(token, buffer, blob);
                Ok(())
            }
            Err(e) => {
                self.clear_audio(token);
                Err(e)
            }
        }
    }

    /// Start playback of the loaded buffer.
    ///
    /// A no-op when nothing is loaded or a session is already live; those are
    /// guard conditions, not errors.
    pub fn play(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == PlaybackState::Playing {
            return;
        }
        let Some(buffer) = inner.buffer.clone() else {
            return;
        };
        if buffer.is_empty() {
            return;
        }

        let source = match self.output.begin(Arc::clone(&buffer)) {
            Ok(source) => source,
            Err(e) => {
                info!("Could not start playback: {}", e);
                return;
            }
        };

        let started_at = Instant::now();
        inner.session = Some(PlaybackSession {
            source,
            started_at,
            poll_task: None,
        });
        inner.elapsed = Duration::from_secs(0);
        inner.state = PlaybackState::Playing;
        drop(inner);

        let task = self.spawn_poll_task(started_at, buffer.duration());
        if let Some(session) = self.inner.lock().unwrap().session.as_mut() {
            session.poll_task = Some(task);
        } else {
            // Session was torn down before the task could be registered
            task.abort();
        }
        info!("Playback started");
    }

    /// Stop playback and reset the position. Safe to call when idle.
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.session.is_some() {
            info!("Playback stopped");
        }
        inner.cleanup_session();
    }

    /// Current state and position snapshot
    pub fn status(&self) -> PlayerStatus {
        let inner = self.inner.lock().unwrap();
        PlayerStatus {
            state: inner.state,
            elapsed: inner.elapsed,
            duration: inner.duration(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.lock().unwrap().state
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Whether a decoded buffer is currently installed
    pub fn has_audio(&self) -> bool {
        self.inner.lock().unwrap().buffer.is_some()
    }

    /// Duration of the loaded audio, zero when nothing is loaded
    pub fn duration(&self) -> Duration {
        self.inner.lock().unwrap().duration()
    }

    /// Clone of the downloadable WAV blob, if one is installed
    pub fn download_blob(&self) -> Option<WavBlob> {
        self.inner.lock().unwrap().download.current().cloned()
    }

    /// Begin a new load: bump the generation token and tear down the session.
    /// Results carrying an older token must be discarded.
    pub(crate) fn begin_load(&self) -> u64 {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.lock().unwrap().cleanup_session();
        token
    }

    pub(crate) fn is_current(&self, token: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == token
    }

    /// Install a decoded buffer and its blob unless the token went stale.
    /// The previously held blob is revoked before the new one is installed.
    pub(crate) fn install(&self, token: u64, buffer: PlayableBuffer, blob: WavBlob) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !self.is_current(token) {
            return false;
        }
        inner.download.install(blob);
        inner.buffer = Some(Arc::new(buffer));
        debug!("Installed audio: {:.2}s", inner.duration().as_secs_f64());
        true
    }

    /// Drop all derived audio state unless the token went stale
    pub(crate) fn clear_audio(&self, token: u64) {
        let mut inner = self.inner.lock().unwrap();
        if !self.is_current(token) {
            return;
        }
        inner.cleanup_session();
        inner.buffer = None;
        inner.download.revoke();
    }

    fn spawn_poll_task(&self, started_at: Instant, duration: Duration) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            loop {
                ticker.tick().await;
                let mut guard = inner.lock().unwrap();
                if guard.state != PlaybackState::Playing {
                    break;
                }
                guard.elapsed = started_at.elapsed().min(duration);
                let finished = guard
                    .session
                    .as_ref()
                    .map(|s| s.source.is_finished())
                    .unwrap_or(true);
                if finished {
                    // Natural end runs the same cleanup as an explicit stop
                    guard.cleanup_session();
                    debug!("Playback finished");
                    break;
                }
            }
        })
    }
}

fn decode_payload(payload: &str) -> Result<(PlayableBuffer, WavBlob), DecodeError> {
    let bytes = pcm::decode_base64(payload)?;
    let buffer = pcm::build_playable_buffer(&bytes, OUTPUT_SAMPLE_RATE, OUTPUT_CHANNELS)?;
    let blob = wav::build_wav_blob(&bytes);
    Ok((buffer, blob))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::AtomicUsize;

    /// Shared state of one mock source, visible to the test after `begin`
    struct MockSource {
        stopped: AtomicBool,
        finished: AtomicBool,
    }

    struct MockHandle {
        state: Arc<MockSource>,
    }

    impl SourceHandle for MockHandle {
        fn stop(&mut self) {
            self.state.stopped.store(true, Ordering::SeqCst);
            self.state.finished.store(true, Ordering::SeqCst);
        }

        fn is_finished(&self) -> bool {
            self.state.finished.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct MockOutput {
        begun: AtomicUsize,
        last: Mutex<Option<Arc<MockSource>>>,
    }

    impl MockOutput {
        fn last_source(&self) -> Arc<MockSource> {
            self.last.lock().unwrap().clone().expect("no source begun")
        }
    }

    impl AudioOutput for MockOutput {
        fn begin(
            &self,
            _buffer: Arc<PlayableBuffer>,
        ) -> Result<Box<dyn SourceHandle>, crate::error::AudioError> {
            self.begun.fetch_add(1, Ordering::SeqCst);
            let state = Arc::new(MockSource {
                stopped: AtomicBool::new(false),
                finished: AtomicBool::new(false),
            });
            *self.last.lock().unwrap() = Some(Arc::clone(&state));
            Ok(Box::new(MockHandle { state }))
        }
    }

    fn controller() -> (PlaybackController, Arc<MockOutput>) {
        let output = Arc::new(MockOutput::default());
        (PlaybackController::new(output.clone()), output)
    }

    /// One second of silence, base64-encoded
    fn silence_payload() -> String {
        STANDARD.encode(vec![0u8; 48000])
    }

    #[tokio::test]
    async fn test_load_and_play() {
        let (ctrl, output) = controller();
        ctrl.load_audio(Some(silence_payload())).await.unwrap();

        assert!(ctrl.has_audio());
        assert!((ctrl.duration().as_secs_f64() - 1.0).abs() < 1e-9);
        assert!(ctrl.download_blob().is_some());

        ctrl.play();
        assert!(ctrl.is_playing());
        assert_eq!(output.begun.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_play_without_audio_is_noop() {
        let (ctrl, output) = controller();
        ctrl.play();
        assert_eq!(ctrl.state(), PlaybackState::Idle);
        assert_eq!(output.begun.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_double_play_is_noop() {
        let (ctrl, output) = controller();
        ctrl.load_audio(Some(silence_payload())).await.unwrap();

        ctrl.play();
        ctrl.play();
        assert_eq!(output.begun.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let (ctrl, _) = controller();
        ctrl.stop();
        ctrl.stop();
        assert_eq!(ctrl.state(), PlaybackState::Idle);
        assert_eq!(ctrl.status().elapsed, Duration::from_secs(0));
    }

    #[tokio::test]
    async fn test_stop_halts_source_and_resets_position() {
        let (ctrl, output) = controller();
        ctrl.load_audio(Some(silence_payload())).await.unwrap();
        ctrl.play();
        let source = output.last_source();

        ctrl.stop();
        assert!(source.stopped.load(Ordering::SeqCst));
        assert_eq!(ctrl.state(), PlaybackState::Idle);
        assert_eq!(ctrl.status().elapsed, Duration::from_secs(0));
        // Buffer survives a stop, only the session is discarded
        assert!(ctrl.has_audio());
    }

    #[tokio::test]
    async fn test_natural_end_matches_explicit_stop() {
        let (ctrl, output) = controller();
        ctrl.load_audio(Some(silence_payload())).await.unwrap();
        ctrl.play();

        // Simulate the source signalling its own completion
        output
            .last_source()
            .finished
            .store(true, Ordering::SeqCst);

        // Give the sampling task a few ticks to observe it
        for _ in 0..50 {
            if !ctrl.is_playing() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let status = ctrl.status();
        assert_eq!(status.state, PlaybackState::Idle);
        assert_eq!(status.elapsed, Duration::from_secs(0));
        assert!(ctrl.has_audio());

        // A stop racing the natural end is tolerated
        ctrl.stop();
        assert_eq!(ctrl.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_load_none_clears_everything() {
        let (ctrl, output) = controller();
        ctrl.load_audio(Some(silence_payload())).await.unwrap();
        ctrl.play();
        let source = output.last_source();

        ctrl.load_audio(None).await.unwrap();
        assert!(source.stopped.load(Ordering::SeqCst));
        assert!(!ctrl.has_audio());
        assert!(ctrl.download_blob().is_none());
        assert_eq!(ctrl.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_new_load_supersedes_live_session() {
        let (ctrl, output) = controller();
        ctrl.load_audio(Some(silence_payload())).await.unwrap();
        ctrl.play();
        let first_source = output.last_source();

        ctrl.load_audio(Some(silence_payload())).await.unwrap();
        assert!(first_source.stopped.load(Ordering::SeqCst));
        assert_eq!(ctrl.state(), PlaybackState::Idle);
        assert!(ctrl.has_audio());
    }

    #[tokio::test]
    async fn test_decode_failure_clears_state() {
        let (ctrl, _) = controller();
        ctrl.load_audio(Some(silence_payload())).await.unwrap();
        assert!(ctrl.has_audio());

        let result = ctrl.load_audio(Some("***not base64***".to_string())).await;
        assert!(matches!(result, Err(DecodeError::InvalidBase64(_))));
        assert!(!ctrl.has_audio());
        assert!(ctrl.download_blob().is_none());
    }

    #[tokio::test]
    async fn test_stale_decode_result_is_discarded() {
        let (ctrl, _) = controller();

        // Two overlapping loads: the first decode completes after the second
        // load already claimed the token
        let token_a = ctrl.begin_load();
        let token_b = ctrl.begin_load();

        let (buffer_a, blob_a) = decode_payload(&STANDARD.encode(vec![0u8; 2])).unwrap();
        assert!(!ctrl.install(token_a, buffer_a, blob_a));
        assert!(!ctrl.has_audio());

        let (buffer_b, blob_b) = decode_payload(&silence_payload()).unwrap();
        assert!(ctrl.install(token_b, buffer_b, blob_b));
        assert!(ctrl.has_audio());
        assert!((ctrl.duration().as_secs_f64() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_stale_clear_is_ignored() {
        let (ctrl, _) = controller();
        let stale = ctrl.begin_load();
        let current = ctrl.begin_load();
        let (buffer, blob) = decode_payload(&silence_payload()).unwrap();
        ctrl.install(current, buffer, blob);

        ctrl.clear_audio(stale);
        assert!(ctrl.has_audio());
    }

    #[tokio::test]
    async fn test_elapsed_advances_and_clamps() {
        let (ctrl, _) = controller();
        // Tiny clip: ~10ms of audio
        ctrl.load_audio(Some(STANDARD.encode(vec![0u8; 480])))
            .await
            .unwrap();
        let duration = ctrl.duration();
        ctrl.play();

        tokio::time::sleep(Duration::from_millis(60)).await;
        // Elapsed never exceeds the clip duration even while the mock source
        // keeps "playing"
        assert!(ctrl.status().elapsed <= duration);
    }
}
