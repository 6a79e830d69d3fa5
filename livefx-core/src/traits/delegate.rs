use crate::models::error::CaptureError;
use crate::models::state::SessionPhase;

/// Event delegate for capture session notifications.
///
/// All methods fire on the thread driving the session; acquisition errors
/// arrive from the capture completion callback on that same thread. Errors
/// are diagnostic only; the session's phase never reflects them.
pub trait SessionDelegate {
    /// Called when the session transitions between idle and capturing.
    fn on_state_changed(&self, phase: SessionPhase);

    /// Called when capture acquisition or a graph operation fails.
    fn on_error(&self, error: &CaptureError);
}
