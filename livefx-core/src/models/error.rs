use thiserror::Error;

/// Errors surfaced by capture sessions and the audio engine boundary.
///
/// None of these are fatal: capture and playback failures are logged and
/// reported to the delegate, and the session keeps its Idle/Capturing
/// lifecycle regardless.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The user or platform refused the display/tab audio capture request.
    #[error("capture permission denied")]
    CaptureDenied,

    /// No display/tab audio capture capability exists on this host.
    #[error("capture capability unavailable")]
    CaptureUnavailable,

    /// The playback element failed to start replaying the processed stream.
    #[error("playback failed: {0}")]
    PlaybackFailure(String),

    /// The audio engine rejected a node or graph operation.
    #[error("audio engine error: {0}")]
    EngineFailure(String),
}
