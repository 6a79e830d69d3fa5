use serde::{Deserialize, Serialize};

use super::params::CompressorParam;

/// Configuration for a capture session.
///
/// The options enumerate the union of the shipped UI revisions: one revision
/// replayed the processed chain through a playback element, one exposed only
/// the threshold slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Route the processed chain into a secondary stream sink bound to a
    /// playback element, in addition to the default destination.
    pub enable_output_routing: bool,

    /// Expose ratio/attack/release controls in addition to threshold.
    /// When false, the hidden parameters are inert through the panel.
    pub expose_all_compressor_controls: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enable_output_routing: false,
            expose_all_compressor_controls: true,
        }
    }
}

impl SessionConfig {
    /// Compressor parameters the control surface exposes under this config.
    pub fn exposed_compressor_params(&self) -> &'static [CompressorParam] {
        if self.expose_all_compressor_controls {
            &CompressorParam::ALL
        } else {
            &[CompressorParam::Threshold]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert!(!config.enable_output_routing);
        assert!(config.expose_all_compressor_controls);
        assert_eq!(config.exposed_compressor_params().len(), 4);
    }

    #[test]
    fn threshold_only_when_not_exposing_all() {
        let config = SessionConfig {
            expose_all_compressor_controls: false,
            ..Default::default()
        };
        assert_eq!(
            config.exposed_compressor_params(),
            &[CompressorParam::Threshold]
        );
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"enableOutputRouting": true}"#).unwrap();
        assert!(config.enable_output_routing);
        assert!(config.expose_all_compressor_controls);

        let round_trip: SessionConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }
}
