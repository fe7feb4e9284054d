use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use crate::api::models::OutgoingAttachment;
use crate::error::{AppError, AppResult};

use super::device::{Microphone, MicrophoneGuard};

pub const VOICE_FILE_NAME: &str = "voice-message.webm";

const DEFAULT_MIME_TYPE: &str = "audio/webm";

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Recording,
    Ready,
    Playing,
}

/// A finished recording: the audio, a local reference a player can open,
/// and the length in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceRecording {
    pub data: Bytes,
    pub mime_type: String,
    pub local_ref: String,
    pub duration_secs: u64,
}

impl VoiceRecording {
    pub fn as_attachment(&self) -> OutgoingAttachment {
        OutgoingAttachment::PendingBinary {
            data: self.data.clone(),
            filename: VOICE_FILE_NAME.to_string(),
            mime_type: self.mime_type.clone(),
        }
    }
}

struct ActiveRecording {
    microphone: Option<MicrophoneGuard>,
    elapsed: Arc<AtomicU64>,
    ticker: JoinHandle<()>,
    chunks: Vec<Bytes>,
}

impl Drop for ActiveRecording {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

enum Phase {
    Idle,
    Recording(ActiveRecording),
    Ready(VoiceRecording),
    Playing(VoiceRecording),
}

/// Voice message capture for one compose session.
///
/// `Idle -> Recording -> Ready -> Idle`, with `Ready <-> Playing` for
/// playback. A second recording needs `delete` first.
pub struct VoiceRecorder {
    microphone: Microphone,
    phase: Phase,
}

impl VoiceRecorder {
    pub fn new(microphone: Microphone) -> Self {
        Self {
            microphone,
            phase: Phase::Idle,
        }
    }

    pub fn state(&self) -> VoiceState {
        match self.phase {
            Phase::Idle => VoiceState::Idle,
            Phase::Recording(_) => VoiceState::Recording,
            Phase::Ready(_) => VoiceState::Ready,
            Phase::Playing(_) => VoiceState::Playing,
        }
    }

    /// Seconds elapsed in the running recording, zero otherwise.
    pub fn elapsed_secs(&self) -> u64 {
        match &self.phase {
            Phase::Recording(active) => active.elapsed.load(Ordering::SeqCst),
            _ => 0,
        }
    }

    pub fn recording(&self) -> Option<&VoiceRecording> {
        match &self.phase {
            Phase::Ready(recording) | Phase::Playing(recording) => Some(recording),
            _ => None,
        }
    }

    pub async fn start(&mut self) -> AppResult<()> {
        match self.phase {
            Phase::Idle => {}
            Phase::Recording(_) => {
                return Err(AppError::Validation(
                    "a recording is already in progress".to_string(),
                ));
            }
            Phase::Ready(_) | Phase::Playing(_) => {
                return Err(AppError::Validation(
                    "delete the current voice message before recording a new one".to_string(),
                ));
            }
        }

        let microphone = self.microphone.acquire().await.inspect_err(|err| {
            tracing::warn!(error = %err, "microphone unavailable");
        })?;

        let elapsed = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&elapsed);
        let ticker = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            loop {
                interval.tick().await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tracing::debug!("voice recording started");
        self.phase = Phase::Recording(ActiveRecording {
            microphone: Some(microphone),
            elapsed,
            ticker,
            chunks: Vec::new(),
        });
        Ok(())
    }

    /// Moves chunks captured so far into the recording buffer.
    pub fn collect(&mut self) {
        if let Phase::Recording(active) = &mut self.phase {
            if let Some(microphone) = active.microphone.as_mut() {
                microphone.drain_into(&mut active.chunks);
            }
        }
    }

    /// Finalizes the capture into a recording. Waits for the device to flush
    /// what it still buffers, bounded by `FLUSH_TIMEOUT`.
    pub async fn stop(&mut self) -> AppResult<&VoiceRecording> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let mut active = match phase {
            Phase::Recording(active) => active,
            other => {
                self.phase = other;
                return Err(AppError::Validation("not recording".to_string()));
            }
        };

        active.ticker.abort();
        let duration_secs = active.elapsed.load(Ordering::SeqCst);
        let mut chunks = std::mem::take(&mut active.chunks);
        let mut mime_type = DEFAULT_MIME_TYPE.to_string();
        if let Some(microphone) = active.microphone.take() {
            mime_type = microphone.mime_type().to_string();
            microphone.finish(&mut chunks).await;
        }

        let mut data = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
        for chunk in &chunks {
            data.extend_from_slice(chunk);
        }

        tracing::debug!(duration_secs, bytes = data.len(), "voice recording finished");
        self.phase = Phase::Ready(VoiceRecording {
            data: data.freeze(),
            mime_type,
            local_ref: local_ref(),
            duration_secs,
        });

        self.recording()
            .ok_or_else(|| AppError::Validation("recording was not kept".to_string()))
    }

    pub fn delete(&mut self) -> AppResult<()> {
        match self.phase {
            Phase::Ready(_) | Phase::Playing(_) => {
                self.phase = Phase::Idle;
                Ok(())
            }
            Phase::Recording(_) => Err(AppError::Validation(
                "stop the recording before deleting it".to_string(),
            )),
            Phase::Idle => Err(AppError::Validation("there is no voice message".to_string())),
        }
    }

    pub fn play(&mut self) -> AppResult<()> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Ready(recording) => {
                self.phase = Phase::Playing(recording);
                Ok(())
            }
            other => {
                self.phase = other;
                Err(AppError::Validation("nothing to play".to_string()))
            }
        }
    }

    pub fn pause(&mut self) -> AppResult<()> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Playing(recording) => {
                self.phase = Phase::Ready(recording);
                Ok(())
            }
            other => {
                self.phase = other;
                Err(AppError::Validation("voice message is not playing".to_string()))
            }
        }
    }

    /// The player reached the end of the recording.
    pub fn playback_ended(&mut self) {
        if let Phase::Playing(_) = self.phase {
            let _ = self.pause();
        }
    }

    /// Drops whatever exists: a live capture (freeing the microphone and the
    /// tick) or a finished recording.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }
}

fn local_ref() -> String {
    let mut bytes = [0_u8; 8];
    rand::thread_rng().fill(&mut bytes);
    let token = bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    format!("blob:voice/{token}")
}
