use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

use crate::error::{AppError, AppResult};

/// Upper bound on waiting for the final chunks once a capture is stopped.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// A live capture from an audio input. Once `stop` fires (or is dropped) the
/// device sends its last chunks and then closes `chunks`.
#[derive(Debug)]
pub struct CaptureStream {
    pub mime_type: String,
    pub chunks: mpsc::UnboundedReceiver<Bytes>,
    pub stop: oneshot::Sender<()>,
}

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Opens the input. Fails when permission is denied or no device exists.
    async fn open(&self) -> AppResult<CaptureStream>;
}

/// The one audio input of this client. Clones share the same exclusivity
/// flag, so a second acquire while a capture is live fails instead of
/// waiting.
#[derive(Clone)]
pub struct Microphone {
    device: Arc<dyn CaptureDevice>,
    held: Arc<AtomicBool>,
}

impl Microphone {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        Self {
            device,
            held: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    pub async fn acquire(&self) -> AppResult<MicrophoneGuard> {
        if self
            .held
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AppError::Device("microphone is already in use".to_string()));
        }

        // Owns the flag while `open` is pending, so a dropped acquire frees it.
        let mut guard = MicrophoneGuard {
            stream: None,
            held: Arc::clone(&self.held),
        };
        match self.device.open().await {
            Ok(stream) => {
                guard.stream = Some(stream);
                Ok(guard)
            }
            Err(AppError::Device(message)) => Err(AppError::Device(message)),
            Err(other) => Err(AppError::Device(other.reason())),
        }
    }
}

/// Exclusive hold on the microphone. Dropping it stops the capture and
/// frees the device.
#[derive(Debug)]
pub struct MicrophoneGuard {
    stream: Option<CaptureStream>,
    held: Arc<AtomicBool>,
}

impl MicrophoneGuard {
    pub fn mime_type(&self) -> &str {
        self.stream
            .as_ref()
            .map(|stream| stream.mime_type.as_str())
            .unwrap_or_default()
    }

    /// Pulls whatever chunks have arrived so far without waiting.
    pub fn drain_into(&mut self, buffer: &mut Vec<Bytes>) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        while let Ok(chunk) = stream.chunks.try_recv() {
            if !chunk.is_empty() {
                buffer.push(chunk);
            }
        }
    }

    /// Stops the capture and collects every chunk the device flushes until it
    /// closes the stream. A device that never closes is cut off after
    /// `FLUSH_TIMEOUT`.
    pub async fn finish(mut self, buffer: &mut Vec<Bytes>) {
        let Some(CaptureStream {
            mut chunks, stop, ..
        }) = self.stream.take()
        else {
            return;
        };
        let _ = stop.send(());

        let flushed = timeout(FLUSH_TIMEOUT, async {
            while let Some(chunk) = chunks.recv().await {
                if !chunk.is_empty() {
                    buffer.push(chunk);
                }
            }
        })
        .await;
        if flushed.is_err() {
            tracing::warn!("capture device did not close its stream after stop");
        }
    }
}

impl Drop for MicrophoneGuard {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.stop.send(());
        }
        self.held.store(false, Ordering::SeqCst);
    }
}

/// Stand-in for hosts without an audio input; every open fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCaptureDevice;

#[async_trait]
impl CaptureDevice for NoCaptureDevice {
    async fn open(&self) -> AppResult<CaptureStream> {
        Err(AppError::Device("no audio input available".to_string()))
    }
}
