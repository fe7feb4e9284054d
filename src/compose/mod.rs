pub mod device;
pub mod inline;
pub mod session;
pub mod uploads;
pub mod voice;

pub use device::{
    CaptureDevice, CaptureStream, FLUSH_TIMEOUT, Microphone, MicrophoneGuard, NoCaptureDevice,
};
pub use session::ComposeSession;
pub use uploads::{
    AttachmentTracker, BatchReport, MAX_ATTACHMENT_BYTES, MAX_ATTACHMENTS, UploadFailure,
};
pub use voice::{VOICE_FILE_NAME, VoiceRecorder, VoiceRecording, VoiceState};
