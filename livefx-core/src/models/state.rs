use serde::{Deserialize, Serialize};

/// Capture session lifecycle phase.
///
/// ```text
/// idle → capturing   (start; capture acquisition still pending)
/// capturing → idle   (stop)
/// ```
///
/// There is no error phase: a failed acquisition leaves the session
/// capturing with a silent, unconnected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Capturing,
}

impl SessionPhase {
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_capturing(self) -> bool {
        matches!(self, Self::Capturing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_helpers() {
        assert!(SessionPhase::Idle.is_idle());
        assert!(!SessionPhase::Idle.is_capturing());
        assert!(SessionPhase::Capturing.is_capturing());
        assert!(!SessionPhase::Capturing.is_idle());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionPhase::Capturing).unwrap(),
            "\"capturing\""
        );
    }
}
